//! services/api/src/web/mod.rs

pub mod assignments;
pub mod middleware;
pub mod papers;
pub mod state;
pub mod users;

pub use middleware::{require_identity, Identity};
pub use state::AppState;
