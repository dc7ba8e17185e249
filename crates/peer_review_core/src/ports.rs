//! crates/peer_review_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the workflow core.
//! These traits form the boundary of the hexagonal architecture, keeping the
//! lifecycle engine independent of the concrete database and the outbound
//! notification channel.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    EntityId, NewPaper, NewUser, Page, Paper, PaperStatus, PaperStatusEntry, ReviewAssignment,
    ReviewStatus, ReviewStatusEntry, User,
};

//=========================================================================================
// Error taxonomy
//=========================================================================================

/// The error taxonomy shared by every core operation. The HTTP layer maps
/// each kind to a status code; the core never writes responses itself.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// A referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// The actor is authenticated but holds the wrong role.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Malformed or missing input, including unknown enum keywords.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The operation is not valid for the record's current lifecycle state.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Uniqueness violation, e.g. a duplicate user email.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Unexpected store-level or infrastructure failure.
    #[error("fault: {0}")]
    Fault(String),
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;

//=========================================================================================
// Query filter types
//=========================================================================================

/// Filter for review-assignment scans; all fields optional and ANDed.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssignmentFilter {
    pub paper_id: Option<EntityId>,
    pub section_head_id: Option<EntityId>,
    pub status: Option<ReviewStatus>,
}

/// Filter for the editorial paper queue.
#[derive(Debug, Clone, Copy, Default)]
pub struct PaperQuery {
    pub status: Option<PaperStatus>,
    pub paper_id: Option<EntityId>,
}

/// Search filter for an author's own papers, joined with the owning user.
#[derive(Debug, Clone, Default)]
pub struct AuthorPaperFilter {
    /// Exact match on the owning author's id.
    pub user_id: Option<EntityId>,
    /// Substring match on the manuscript title.
    pub manu_script_title: Option<String>,
    /// Substring match on the owning user's title.
    pub title: Option<String>,
    /// Substring match against the owning user's first or last name.
    pub name: Option<String>,
}

/// Window selector for the public published-papers listing. Both variants
/// are computed from the same "30 days ago" instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicWindow {
    /// `createdAt` older than the cutoff.
    Archive,
    /// `createdAt` newer than the cutoff.
    InPress,
}

//=========================================================================================
// Store port
//=========================================================================================

/// The persistence boundary for users, papers and review assignments.
/// Each call commits independently; multi-record operations in the engine
/// are deliberately not transactional (see the fan-out tests).
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    // --- Users ---
    async fn create_user(&self, user: NewUser) -> WorkflowResult<User>;
    async fn get_user(&self, id: EntityId) -> WorkflowResult<Option<User>>;
    async fn get_users_by_ids(&self, ids: &[EntityId]) -> WorkflowResult<Vec<User>>;
    async fn list_users(&self, page: Page) -> WorkflowResult<(Vec<User>, u64)>;

    // --- Papers ---
    async fn create_paper(&self, paper: NewPaper) -> WorkflowResult<Paper>;
    async fn get_paper(&self, id: EntityId) -> WorkflowResult<Option<Paper>>;
    async fn get_papers_by_ids(&self, ids: &[EntityId]) -> WorkflowResult<Vec<Paper>>;
    /// Atomic single-record update of the status and its ledger.
    async fn update_paper_status(
        &self,
        paper_id: EntityId,
        status: PaperStatus,
        history: Vec<PaperStatusEntry>,
    ) -> WorkflowResult<()>;
    async fn list_papers(&self, query: PaperQuery, page: Page)
        -> WorkflowResult<(Vec<Paper>, u64)>;
    async fn search_author_papers(
        &self,
        filter: &AuthorPaperFilter,
        page: Page,
    ) -> WorkflowResult<(Vec<Paper>, u64)>;
    async fn list_published(
        &self,
        window: Option<PublicWindow>,
        cutoff: DateTime<Utc>,
        page: Page,
    ) -> WorkflowResult<(Vec<Paper>, u64)>;

    // --- Review assignments ---
    async fn create_assignment(
        &self,
        paper_id: EntityId,
        section_head_id: EntityId,
        seed: ReviewStatusEntry,
    ) -> WorkflowResult<ReviewAssignment>;
    /// The assignment for one (paper, section head) pair. Duplicate rows
    /// are possible; the earliest row wins.
    async fn find_assignment(
        &self,
        paper_id: EntityId,
        section_head_id: EntityId,
    ) -> WorkflowResult<Option<ReviewAssignment>>;
    async fn assignments_for_papers(
        &self,
        paper_ids: &[EntityId],
    ) -> WorkflowResult<Vec<ReviewAssignment>>;
    async fn list_assignments(
        &self,
        filter: AssignmentFilter,
        page: Page,
    ) -> WorkflowResult<(Vec<ReviewAssignment>, u64)>;
    async fn update_assignment_status(
        &self,
        assignment_id: EntityId,
        status: ReviewStatus,
        history: Vec<ReviewStatusEntry>,
    ) -> WorkflowResult<()>;
}

//=========================================================================================
// Notification port
//=========================================================================================

/// Outbound notification channel (email in production). Deliveries are
/// best-effort: the engine logs failures and never fails the workflow.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn assignment_created(&self, section_head: &User, paper: &Paper) -> WorkflowResult<()>;
}

/// A notifier that drops every message, for wiring tests.
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn assignment_created(&self, _section_head: &User, _paper: &Paper) -> WorkflowResult<()> {
        Ok(())
    }
}
