//! services/api/src/lib.rs
//!
//! The HTTP service wrapping the peer-review workflow core: adapters for
//! Postgres, asset storage and notifications, plus the axum route layer.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
