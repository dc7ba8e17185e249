//! services/api/src/adapters/assets.rs
//!
//! Local-disk storage for uploaded manuscript files. The store returns
//! relative references (`/assets/<file>`); absolute URLs are composed by
//! the web layer at read time.

use std::path::PathBuf;

use chrono::Utc;

use crate::error::ApiError;

#[derive(Clone)]
pub struct AssetStore {
    dir: PathBuf,
}

impl AssetStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    /// Creates the asset directory if it does not exist yet.
    pub async fn ensure_dir(&self) -> Result<(), ApiError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Persists one uploaded file and returns its relative reference.
    ///
    /// The stored name is the sanitized original name prefixed with a
    /// millisecond timestamp to avoid collisions.
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<String, ApiError> {
        let stored = format!(
            "{}-{}",
            Utc::now().timestamp_millis(),
            sanitize_file_name(original_name)
        );
        tokio::fs::write(self.dir.join(&stored), bytes).await?;
        Ok(format!("/assets/{stored}"))
    }
}

/// Keeps alphanumerics, dots, dashes and underscores; everything else
/// becomes an underscore. Guards against path traversal in client names.
fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.trim_matches(['.', '_']).is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_hostile_names() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_file_name("paper final.pdf"), "paper_final.pdf");
        assert_eq!(sanitize_file_name("..."), "upload");
    }
}
