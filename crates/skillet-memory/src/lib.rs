//! # skillet-memory
//!
//! SQLite-backed persistence for the agent:
//!
//! - **Conversations**: per-user thread metadata (title, timestamps) used by
//!   the CLI thread picker.
//! - **Checkpoints**: the full message history of each thread, so a picked
//!   conversation resumes where it left off.

pub mod store;

pub use store::{ConversationRow, ConversationStore, UserConversations, title_from_query};
