//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use std::sync::Arc;

use crate::adapters::AssetStore;
use crate::config::Config;
use peer_review_core::assignment::AssignmentManager;
use peer_review_core::lifecycle::LifecycleEngine;
use peer_review_core::ports::WorkflowStore;
use peer_review_core::views::ViewComposer;

/// The shared application state, created once at startup and passed to all
/// handlers. The engines are cheap to clone; they hold `Arc`s internally.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn WorkflowStore>,
    pub lifecycle: LifecycleEngine,
    pub assignments: AssignmentManager,
    pub views: ViewComposer,
    pub assets: AssetStore,
}
