/// Identifier of a conversation thread (a UUID string for chats,
/// `data_analysis_<uuid>` for subagent runs).
pub type ThreadId = String;

/// Identifier of the person whose conversations are stored.
pub type UserId = String;

/// Generate a fresh thread id.
pub fn new_thread_id() -> ThreadId {
    uuid::Uuid::new_v4().to_string()
}
