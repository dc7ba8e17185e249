//! crates/peer_review_core/src/assignment.rs
//!
//! The Reviewer Assignment Manager: creates ReviewAssignment records tied to
//! a paper + section-head pair and serves filtered assignment scans.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::domain::{
    EntityId, Page, PageMeta, Paper, ReviewAssignment, ReviewStatus, Role, StatusEntry,
};
use crate::ports::{AssignmentFilter, Notifier, WorkflowError, WorkflowResult, WorkflowStore};

/// One page of raw assignment records plus pagination metadata.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentPage {
    pub assignments: Vec<ReviewAssignment>,
    pub pagination: PageMeta,
}

#[derive(Clone)]
pub struct AssignmentManager {
    store: Arc<dyn WorkflowStore>,
    notifier: Arc<dyn Notifier>,
}

impl AssignmentManager {
    pub fn new(store: Arc<dyn WorkflowStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// Creates one assignment for `section_head_id` on `paper`.
    ///
    /// Fails with `NotFound` if the user does not exist or is not a section
    /// head. Idempotency is NOT enforced: calling twice for the same pair
    /// produces two records (see DESIGN.md).
    pub async fn create_for_section_head(
        &self,
        paper: &Paper,
        section_head_id: EntityId,
        date: Option<DateTime<Utc>>,
    ) -> WorkflowResult<ReviewAssignment> {
        let section_head = self
            .store
            .get_user(section_head_id)
            .await?
            .filter(|u| u.role == Role::SectionHead)
            .ok_or_else(|| {
                WorkflowError::NotFound(format!("Section head {} not found", section_head_id))
            })?;

        let seed = StatusEntry {
            status: ReviewStatus::Assigned,
            comment: Some(format!(
                "Assigned to section head: {}",
                section_head.display_name()
            )),
            date: date.unwrap_or_else(Utc::now),
        };

        let assignment = self
            .store
            .create_assignment(paper.id, section_head_id, seed)
            .await?;

        // Notification is best-effort; a delivery failure never fails the
        // assignment itself.
        if let Err(e) = self
            .notifier
            .assignment_created(&section_head, paper)
            .await
        {
            warn!(
                section_head_id,
                paper_id = paper.id,
                "assignment notification failed: {e}"
            );
        }

        Ok(assignment)
    }

    /// Filtered, offset/limit paginated assignment scan.
    pub async fn list(
        &self,
        filter: AssignmentFilter,
        page: Page,
    ) -> WorkflowResult<AssignmentPage> {
        let (assignments, total) = self.store.list_assignments(filter, page).await?;
        Ok(AssignmentPage {
            assignments,
            pagination: PageMeta::new(total, page),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::ports::NullNotifier;

    fn manager(store: Arc<MemoryStore>) -> AssignmentManager {
        AssignmentManager::new(store, Arc::new(NullNotifier))
    }

    #[tokio::test]
    async fn seeds_ledger_with_section_head_name() {
        let store = Arc::new(MemoryStore::new());
        let head = store.add_section_head("Rosa", Some("Klein"));
        let paper = store.add_paper(store.add_author("Ada").id);

        let assignment = manager(store.clone())
            .create_for_section_head(&paper, head.id, None)
            .await
            .unwrap();

        assert_eq!(assignment.status, ReviewStatus::Assigned);
        assert_eq!(assignment.status_history.len(), 1);
        assert_eq!(
            assignment.status_history[0].comment.as_deref(),
            Some("Assigned to section head: Rosa Klein")
        );
    }

    #[tokio::test]
    async fn rejects_missing_or_wrong_role_user() {
        let store = Arc::new(MemoryStore::new());
        let author = store.add_author("Ada");
        let paper = store.add_paper(author.id);
        let mgr = manager(store.clone());

        let err = mgr
            .create_for_section_head(&paper, 999, None)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::NotFound(_)));

        // An existing user with the wrong role is equally "not found".
        let err = mgr
            .create_for_section_head(&paper, author.id, None)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::NotFound(_)));
    }

    #[tokio::test]
    async fn duplicate_assignment_for_same_pair_is_preserved() {
        // Repeated assignment of the same section head produces two rows.
        // This reproduces the original behavior; deduplication would be a
        // deliberate, visible change.
        let store = Arc::new(MemoryStore::new());
        let head = store.add_section_head("Rosa", None);
        let paper = store.add_paper(store.add_author("Ada").id);
        let mgr = manager(store.clone());

        let a = mgr
            .create_for_section_head(&paper, head.id, None)
            .await
            .unwrap();
        let b = mgr
            .create_for_section_head(&paper, head.id, None)
            .await
            .unwrap();
        assert_ne!(a.id, b.id);

        let page = mgr
            .list(
                AssignmentFilter {
                    paper_id: Some(paper.id),
                    ..Default::default()
                },
                Page::default(),
            )
            .await
            .unwrap();
        assert_eq!(page.pagination.total, 2);
    }

    #[tokio::test]
    async fn list_filters_by_status_and_paginates() {
        let store = Arc::new(MemoryStore::new());
        let paper = store.add_paper(store.add_author("Ada").id);
        let mgr = manager(store.clone());
        for i in 0..5 {
            let head = store.add_section_head(&format!("Head{i}"), None);
            mgr.create_for_section_head(&paper, head.id, None)
                .await
                .unwrap();
        }

        let page = mgr
            .list(
                AssignmentFilter {
                    status: Some(ReviewStatus::Assigned),
                    ..Default::default()
                },
                Page::new(3, 2),
            )
            .await
            .unwrap();
        assert_eq!(page.pagination.total, 5);
        assert_eq!(page.assignments.len(), 2);
        assert_eq!(page.pagination.total_pages, 3);
        assert_eq!(page.pagination.current_page, 2);
    }
}
