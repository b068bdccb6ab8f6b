//! # skillet-core
//!
//! Core types, traits, and primitives for the Skillet skill-driven agent.
//! This crate defines the shared vocabulary used by every other crate in the workspace.

pub mod error;
pub mod message;
pub mod tool;
pub mod types;

pub use error::{Result, SkilletError};
pub use message::{Message, MessageContent, Role};
pub use tool::{Tool, ToolCall, ToolExecutor, ToolResult};
pub use types::*;
