//! services/api/src/adapters/mod.rs

pub mod assets;
pub mod db;
pub mod notify;

pub use assets::AssetStore;
pub use db::PgStore;
pub use notify::LogNotifier;
