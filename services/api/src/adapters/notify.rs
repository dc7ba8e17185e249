//! services/api/src/adapters/notify.rs
//!
//! Notification adapter. Outbound email delivery is an external
//! collaborator; this adapter records the would-be delivery in the log so
//! the workflow's notification points stay observable without an SMTP
//! dependency.

use async_trait::async_trait;
use tracing::info;

use peer_review_core::domain::{Paper, User};
use peer_review_core::ports::{Notifier, WorkflowResult};

pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn assignment_created(&self, section_head: &User, paper: &Paper) -> WorkflowResult<()> {
        info!(
            section_head = %section_head.email,
            paper_id = paper.id,
            title = %paper.manu_script_title,
            "review assignment notification"
        );
        Ok(())
    }
}
