//! crates/peer_review_core/src/lifecycle.rs
//!
//! The Paper Lifecycle Engine: owns the paper status state machine and the
//! append-only statusHistory ledger, and drives the reviewer-assignment
//! fan-out for the chief editor's `assigned` action.
//!
//! State machine:
//!
//! ```text
//! submitted ──assigned──────────▶ underReview ──acceptAndPublish──▶ published
//!     │                               │
//!     └────────rejected──────────▶ rejected ◀──────rejected──────────┘
//! ```
//!
//! `published` and `rejected` are terminal in intent, but the engine does
//! not guard against logically redundant transitions (re-assigning a paper
//! already under review, re-publishing). That permissiveness is inherited
//! behavior, covered by tests rather than silently tightened.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::assignment::AssignmentManager;
use crate::domain::{
    EntityId, NewPaper, Paper, PaperDraft, PaperStatus, ReviewAssignment, ReviewStatus, Role,
    StatusEntry,
};
use crate::ports::{WorkflowError, WorkflowResult, WorkflowStore};

/// Minimum number of suggested reviewers on a submission.
const MIN_SUGGESTED_REVIEWERS: usize = 3;

//=========================================================================================
// Editor actions
//=========================================================================================

/// The chief editor's transition actions, parsed from the request keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorAction {
    Assigned,
    AcceptAndPublish,
    Rejected,
}

impl EditorAction {
    pub fn parse(s: &str) -> WorkflowResult<EditorAction> {
        match s {
            "assigned" => Ok(EditorAction::Assigned),
            "acceptAndPublish" => Ok(EditorAction::AcceptAndPublish),
            "rejected" => Ok(EditorAction::Rejected),
            other => Err(WorkflowError::InvalidInput(format!(
                "Unknown status action: {other}"
            ))),
        }
    }

    /// The paper status this action commits.
    pub fn target(&self) -> PaperStatus {
        match self {
            EditorAction::Assigned => PaperStatus::UnderReview,
            EditorAction::AcceptAndPublish => PaperStatus::Published,
            EditorAction::Rejected => PaperStatus::Rejected,
        }
    }
}

//=========================================================================================
// Engine
//=========================================================================================

#[derive(Clone)]
pub struct LifecycleEngine {
    store: Arc<dyn WorkflowStore>,
    assignments: AssignmentManager,
}

impl LifecycleEngine {
    pub fn new(store: Arc<dyn WorkflowStore>, assignments: AssignmentManager) -> Self {
        Self { store, assignments }
    }

    /// Creates a paper on behalf of an author. The paper is born in
    /// `submitted` with a seeded ledger entry so the mirror invariant holds
    /// from the first read.
    pub async fn submit_paper(
        &self,
        author_id: EntityId,
        draft: PaperDraft,
    ) -> WorkflowResult<Paper> {
        let author = self
            .store
            .get_user(author_id)
            .await?
            .ok_or_else(|| WorkflowError::NotFound(format!("User {author_id} not found")))?;
        if author.role != Role::Author {
            return Err(WorkflowError::Forbidden(
                "Only an author can submit a paper".into(),
            ));
        }

        validate_draft(&draft)?;

        let paper = self
            .store
            .create_paper(NewPaper {
                user_id: author_id,
                paper_status: PaperStatus::Submitted,
                status_history: vec![StatusEntry {
                    status: PaperStatus::Submitted,
                    comment: Some("Paper submitted".into()),
                    date: Utc::now(),
                }],
                draft,
            })
            .await?;

        info!(paper_id = paper.id, author_id, "paper submitted");
        Ok(paper)
    }

    /// The chief editor's top-level status transition.
    ///
    /// For `assigned`, section heads are validated and assignments created
    /// sequentially, failing fast on the first bad id. Assignments created
    /// before the failure persist while the paper's own status does not
    /// change; the sequence is deliberately not transactional (see the
    /// partial fan-out test).
    pub async fn transition_paper_status(
        &self,
        paper_id: EntityId,
        actor_id: EntityId,
        action: &str,
        comment: Option<String>,
        date: Option<DateTime<Utc>>,
        section_head_ids: Option<Vec<EntityId>>,
    ) -> WorkflowResult<Paper> {
        let mut paper = self
            .store
            .get_paper(paper_id)
            .await?
            .ok_or_else(|| WorkflowError::NotFound("Paper not found".into()))?;

        let actor = self
            .store
            .get_user(actor_id)
            .await?
            .ok_or_else(|| WorkflowError::NotFound("User not found".into()))?;
        if actor.role != Role::ChiefEditor {
            return Err(WorkflowError::Forbidden(
                "Only a chief editor can update the paper status".into(),
            ));
        }

        let action = EditorAction::parse(action)?;

        if action == EditorAction::Assigned {
            let ids = section_head_ids.unwrap_or_default();
            if ids.is_empty() {
                return Err(WorkflowError::InvalidInput(
                    "sectionHeadIds must be a non-empty list when assigning".into(),
                ));
            }
            for id in ids {
                // Fail fast: a bad id aborts here, after earlier ids in the
                // list have already been committed.
                self.assignments
                    .create_for_section_head(&paper, id, date)
                    .await?;
            }
        }

        let target = action.target();
        paper.paper_status = target;
        paper.status_history.push(StatusEntry {
            status: target,
            comment,
            date: date.unwrap_or_else(Utc::now),
        });
        self.store
            .update_paper_status(paper.id, paper.paper_status, paper.status_history.clone())
            .await?;

        info!(paper_id, actor_id, status = target.as_str(), "paper status updated");
        Ok(paper)
    }

    /// Records a section head's accept/reject decision on their assignment.
    /// Mutates only the ReviewAssignment; the paper's own status and ledger
    /// are untouched.
    pub async fn record_section_head_decision(
        &self,
        paper_id: EntityId,
        section_head_id: EntityId,
        status: &str,
        comment: Option<String>,
        date: Option<DateTime<Utc>>,
    ) -> WorkflowResult<ReviewAssignment> {
        let actor = self
            .store
            .get_user(section_head_id)
            .await?
            .ok_or_else(|| WorkflowError::NotFound("User not found".into()))?;
        if actor.role != Role::SectionHead {
            return Err(WorkflowError::Forbidden(
                "Only a section head can record a review decision".into(),
            ));
        }

        let paper = self
            .store
            .get_paper(paper_id)
            .await?
            .ok_or_else(|| WorkflowError::NotFound("Paper not found".into()))?;
        if paper.paper_status != PaperStatus::UnderReview {
            return Err(WorkflowError::InvalidState(format!(
                "Paper {} is not under review",
                paper_id
            )));
        }

        let status = ReviewStatus::parse(status).ok_or_else(|| {
            WorkflowError::InvalidInput(format!("Unknown review status: {status}"))
        })?;

        let mut assignment = self
            .store
            .find_assignment(paper_id, section_head_id)
            .await?
            .ok_or_else(|| {
                WorkflowError::NotFound(format!(
                    "No assignment of paper {paper_id} to section head {section_head_id}"
                ))
            })?;

        assignment.status = status;
        assignment.status_history.push(StatusEntry {
            status,
            comment,
            date: date.unwrap_or_else(Utc::now),
        });
        self.store
            .update_assignment_status(
                assignment.id,
                assignment.status,
                assignment.status_history.clone(),
            )
            .await?;

        info!(
            paper_id,
            section_head_id,
            status = status.as_str(),
            "review decision recorded"
        );
        Ok(assignment)
    }
}

//=========================================================================================
// Submission validation
//=========================================================================================

fn validate_draft(draft: &PaperDraft) -> WorkflowResult<()> {
    let required = [
        ("manuScriptTitle", &draft.manu_script_title),
        ("manuScriptType", &draft.manu_script_type),
        ("runningTitle", &draft.running_title),
        ("subject", &draft.subject),
        ("abstract", &draft.abstract_text),
        ("correspondingAuthorName", &draft.corresponding_author_name),
        ("correspondingAuthorEmail", &draft.corresponding_author_email),
    ];
    for (name, value) in required {
        if value.trim().is_empty() {
            return Err(WorkflowError::InvalidInput(format!("{name} is required")));
        }
    }

    if draft.authors.is_empty() {
        return Err(WorkflowError::InvalidInput(
            "Authors information must be provided as a non-empty list".into(),
        ));
    }
    if draft.authors.iter().any(|a| !a.is_complete()) {
        return Err(WorkflowError::InvalidInput(
            "Each author must have fullName, affiliation, country, and email".into(),
        ));
    }

    if draft.reviewers.len() < MIN_SUGGESTED_REVIEWERS {
        return Err(WorkflowError::InvalidInput(format!(
            "At least {MIN_SUGGESTED_REVIEWERS} suggested reviewers are required"
        )));
    }
    if draft.reviewers.iter().any(|r| !r.is_complete()) {
        return Err(WorkflowError::InvalidInput(
            "Each reviewer must have fullName, affiliation, country, and email".into(),
        ));
    }

    match &draft.main_manuscript {
        Some(path) if !path.trim().is_empty() => Ok(()),
        _ => Err(WorkflowError::InvalidInput(
            "mainManuscript file is required".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::ports::NullNotifier;

    fn engine(store: Arc<MemoryStore>) -> LifecycleEngine {
        let assignments = AssignmentManager::new(store.clone(), Arc::new(NullNotifier));
        LifecycleEngine::new(store, assignments)
    }

    fn draft() -> PaperDraft {
        MemoryStore::sample_draft()
    }

    #[tokio::test]
    async fn submission_seeds_ledger() {
        let store = Arc::new(MemoryStore::new());
        let author = store.add_author("Ada");
        let paper = engine(store.clone())
            .submit_paper(author.id, draft())
            .await
            .unwrap();

        assert_eq!(paper.paper_status, PaperStatus::Submitted);
        assert_eq!(paper.status_history.len(), 1);
        assert_eq!(paper.status_history[0].status, PaperStatus::Submitted);
    }

    #[tokio::test]
    async fn submission_rejects_incomplete_drafts() {
        let store = Arc::new(MemoryStore::new());
        let author = store.add_author("Ada");
        let eng = engine(store.clone());

        let mut d = draft();
        d.authors.clear();
        assert!(matches!(
            eng.submit_paper(author.id, d).await.unwrap_err(),
            WorkflowError::InvalidInput(_)
        ));

        let mut d = draft();
        d.reviewers.pop();
        assert!(matches!(
            eng.submit_paper(author.id, d).await.unwrap_err(),
            WorkflowError::InvalidInput(_)
        ));

        let mut d = draft();
        d.main_manuscript = None;
        assert!(matches!(
            eng.submit_paper(author.id, d).await.unwrap_err(),
            WorkflowError::InvalidInput(_)
        ));

        let mut d = draft();
        d.authors[0].email.clear();
        assert!(matches!(
            eng.submit_paper(author.id, d).await.unwrap_err(),
            WorkflowError::InvalidInput(_)
        ));
    }

    #[tokio::test]
    async fn only_authors_may_submit() {
        let store = Arc::new(MemoryStore::new());
        let editor = store.add_chief_editor("Eve");
        let err = engine(store.clone())
            .submit_paper(editor.id, draft())
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Forbidden(_)));
    }

    #[tokio::test]
    async fn ledger_mirrors_status_after_every_transition() {
        let store = Arc::new(MemoryStore::new());
        let editor = store.add_chief_editor("Eve");
        let head = store.add_section_head("Rosa", None);
        let paper = store.add_paper(store.add_author("Ada").id);
        let eng = engine(store.clone());

        let p = eng
            .transition_paper_status(
                paper.id,
                editor.id,
                "assigned",
                Some("please review".into()),
                None,
                Some(vec![head.id]),
            )
            .await
            .unwrap();
        assert_eq!(p.paper_status, PaperStatus::UnderReview);
        assert_eq!(
            p.status_history.last().unwrap().status,
            p.paper_status
        );

        let p = eng
            .transition_paper_status(paper.id, editor.id, "acceptAndPublish", None, None, None)
            .await
            .unwrap();
        assert_eq!(p.paper_status, PaperStatus::Published);
        assert_eq!(p.status_history.last().unwrap().status, p.paper_status);
    }

    #[tokio::test]
    async fn non_chief_editor_cannot_transition() {
        let store = Arc::new(MemoryStore::new());
        let author = store.add_author("Ada");
        let paper = store.add_paper(author.id);

        let err = engine(store.clone())
            .transition_paper_status(paper.id, author.id, "rejected", None, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Forbidden(_)));
    }

    #[tokio::test]
    async fn unknown_action_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let editor = store.add_chief_editor("Eve");
        let paper = store.add_paper(store.add_author("Ada").id);

        let err = engine(store.clone())
            .transition_paper_status(paper.id, editor.id, "approved", None, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn assigning_with_empty_ids_changes_nothing() {
        let store = Arc::new(MemoryStore::new());
        let editor = store.add_chief_editor("Eve");
        let paper = store.add_paper(store.add_author("Ada").id);
        let eng = engine(store.clone());

        for ids in [None, Some(vec![])] {
            let err = eng
                .transition_paper_status(paper.id, editor.id, "assigned", None, None, ids)
                .await
                .unwrap_err();
            assert!(matches!(err, WorkflowError::InvalidInput(_)));
        }

        let unchanged = store.get_paper(paper.id).await.unwrap().unwrap();
        assert_eq!(unchanged.paper_status, PaperStatus::Submitted);
        assert_eq!(unchanged.status_history.len(), 1);
    }

    #[tokio::test]
    async fn fan_out_fails_fast_without_rollback() {
        // Ids [head, 999]: the assignment for the first id is committed,
        // the bad second id aborts the operation, and the paper status is
        // never advanced. Documents the fail-fast-not-atomic property.
        let store = Arc::new(MemoryStore::new());
        let editor = store.add_chief_editor("Eve");
        let head = store.add_section_head("Rosa", None);
        let paper = store.add_paper(store.add_author("Ada").id);

        let err = engine(store.clone())
            .transition_paper_status(
                paper.id,
                editor.id,
                "assigned",
                None,
                None,
                Some(vec![head.id, 999]),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::NotFound(_)));

        let unchanged = store.get_paper(paper.id).await.unwrap().unwrap();
        assert_eq!(unchanged.paper_status, PaperStatus::Submitted);
        assert!(store
            .find_assignment(paper.id, head.id)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn redundant_transitions_are_permitted() {
        // Open design question: the engine does not reject re-assigning a
        // paper already under review, or re-publishing. Reproduced here so
        // a future guard is a visible change.
        let store = Arc::new(MemoryStore::new());
        let editor = store.add_chief_editor("Eve");
        let head = store.add_section_head("Rosa", None);
        let paper = store.add_paper(store.add_author("Ada").id);
        let eng = engine(store.clone());

        for _ in 0..2 {
            eng.transition_paper_status(
                paper.id,
                editor.id,
                "assigned",
                None,
                None,
                Some(vec![head.id]),
            )
            .await
            .unwrap();
        }

        let p = store.get_paper(paper.id).await.unwrap().unwrap();
        assert_eq!(p.paper_status, PaperStatus::UnderReview);
        assert_eq!(p.status_history.len(), 3);
    }

    #[tokio::test]
    async fn decision_requires_under_review() {
        let store = Arc::new(MemoryStore::new());
        let head = store.add_section_head("Rosa", None);
        let paper = store.add_paper(store.add_author("Ada").id);

        let err = engine(store.clone())
            .record_section_head_decision(paper.id, head.id, "accepted", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidState(_)));
        // No assignment exists, and none was created or mutated.
        assert!(store
            .find_assignment(paper.id, head.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn decision_updates_assignment_only() {
        let store = Arc::new(MemoryStore::new());
        let editor = store.add_chief_editor("Eve");
        let head = store.add_section_head("Rosa", None);
        let paper = store.add_paper(store.add_author("Ada").id);
        let eng = engine(store.clone());

        eng.transition_paper_status(
            paper.id,
            editor.id,
            "assigned",
            None,
            None,
            Some(vec![head.id]),
        )
        .await
        .unwrap();

        let assignment = eng
            .record_section_head_decision(paper.id, head.id, "accepted", Some("ok".into()), None)
            .await
            .unwrap();
        assert_eq!(assignment.status, ReviewStatus::Accepted);
        assert_eq!(assignment.status_history.len(), 2);

        let p = store.get_paper(paper.id).await.unwrap().unwrap();
        assert_eq!(p.paper_status, PaperStatus::UnderReview);
        assert_eq!(p.status_history.len(), 2);
    }

    #[tokio::test]
    async fn decision_rejects_unknown_status_and_missing_assignment() {
        let store = Arc::new(MemoryStore::new());
        let editor = store.add_chief_editor("Eve");
        let head = store.add_section_head("Rosa", None);
        let other_head = store.add_section_head("Ines", None);
        let paper = store.add_paper(store.add_author("Ada").id);
        let eng = engine(store.clone());

        eng.transition_paper_status(
            paper.id,
            editor.id,
            "assigned",
            None,
            None,
            Some(vec![head.id]),
        )
        .await
        .unwrap();

        let err = eng
            .record_section_head_decision(paper.id, head.id, "approved", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidInput(_)));

        let err = eng
            .record_section_head_decision(paper.id, other_head.id, "accepted", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::NotFound(_)));
    }
}
