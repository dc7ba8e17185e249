//! crates/peer_review_core/src/lib.rs
//!
//! The paper status workflow engine: the lifecycle state machine, the
//! reviewer-assignment sub-workflow, and the role-scoped query views,
//! all behind the `WorkflowStore` port.

pub mod assignment;
pub mod domain;
pub mod lifecycle;
pub mod memory;
pub mod ports;
pub mod views;

pub use assignment::{AssignmentManager, AssignmentPage};
pub use domain::{
    Contributor, EntityId, NewPaper, NewUser, Page, PageMeta, Paper, PaperDraft, PaperStatus,
    PaperStatusEntry, ReviewAssignment, ReviewStatus, ReviewStatusEntry, Role, SectionHeadProfile,
    StatusEntry, User,
};
pub use lifecycle::{EditorAction, LifecycleEngine};
pub use memory::MemoryStore;
pub use ports::{
    AssignmentFilter, AuthorPaperFilter, Notifier, NullNotifier, PaperQuery, PublicWindow,
    WorkflowError, WorkflowResult, WorkflowStore,
};
pub use views::{
    AssignedPaper, PaperPage, PaperStatusPage, PaperWithReviewers, SectionHeadQueue,
    SectionHeadSummary, ViewComposer,
};
