//! # skillet-config
//!
//! Configuration system for Skillet. Reads from `skillet.toml`, a `.env` file,
//! and environment variables; CLI flags are applied on top by the caller.

pub mod loader;
pub mod schema;

pub use loader::ConfigLoader;
pub use schema::SkilletConfig;
pub use schema::{ConfigWarning, WarningSeverity};
