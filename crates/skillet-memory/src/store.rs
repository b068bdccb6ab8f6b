use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use skillet_core::{Message, SkilletError};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Titles longer than this are cut and suffixed with "...".
pub const TITLE_MAX_CHARS: usize = 60;

/// One row of the `conversations` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationRow {
    pub thread_id: String,
    pub user_id: String,
    pub title: String,
    pub created_at: String,
    pub updated_at: String,
}

/// SQLite store for conversation metadata and thread checkpoints.
///
/// Cheap to clone; clones share one connection.
#[derive(Clone)]
pub struct ConversationStore {
    db: Arc<Mutex<Connection>>,
}

fn store_err(e: rusqlite::Error) -> SkilletError {
    SkilletError::Store(e.to_string())
}

/// UTC timestamp in the `YYYY-MM-DD HH:MM:SS` form stored in every table.
pub fn now_timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Conversation title derived from the first user message.
pub fn title_from_query(query: &str) -> String {
    if query.chars().count() > TITLE_MAX_CHARS {
        let head: String = query.chars().take(TITLE_MAX_CHARS).collect();
        format!("{head}...")
    } else {
        query.to_string()
    }
}

impl ConversationStore {
    /// Open or create the database at the given path, creating parent directories.
    pub fn open(path: &Path) -> skillet_core::Result<Self> {
        info!(?path, "opening conversation store");

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path).map_err(store_err)?;

        // Enable WAL mode for concurrent reads
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(store_err)?;

        Self::init(conn)
    }

    /// In-memory database (tests, throwaway subagent runs).
    pub fn open_in_memory() -> skillet_core::Result<Self> {
        let conn = Connection::open_in_memory().map_err(store_err)?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> skillet_core::Result<Self> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS conversations (
                thread_id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                title TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_conversations_user
                ON conversations(user_id, updated_at);

            CREATE TABLE IF NOT EXISTS checkpoints (
                thread_id TEXT PRIMARY KEY,
                messages_json TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            ",
        )
        .map_err(store_err)?;

        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
        })
    }

    /// Conversation operations scoped to one user.
    pub fn for_user(&self, user_id: impl Into<String>) -> UserConversations {
        UserConversations {
            store: self.clone(),
            user_id: user_id.into(),
        }
    }

    /// Persist a thread's messages as a JSON blob (upsert).
    pub fn save_messages(&self, thread_id: &str, messages: &[Message]) -> skillet_core::Result<()> {
        let json = serde_json::to_string(messages)?;
        let db = self.db.lock();
        db.execute(
            "INSERT INTO checkpoints (thread_id, messages_json, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(thread_id) DO UPDATE SET
                messages_json = excluded.messages_json,
                updated_at = excluded.updated_at",
            rusqlite::params![thread_id, json, now_timestamp()],
        )
        .map_err(store_err)?;
        debug!(thread_id, count = messages.len(), "checkpoint saved");
        Ok(())
    }

    /// Load a thread's messages; an unknown thread has none.
    pub fn load_messages(&self, thread_id: &str) -> skillet_core::Result<Vec<Message>> {
        let db = self.db.lock();
        let json: Option<String> = db
            .query_row(
                "SELECT messages_json FROM checkpoints WHERE thread_id = ?1",
                rusqlite::params![thread_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(store_err)?;

        match json {
            Some(j) => Ok(serde_json::from_str(&j)?),
            None => Ok(Vec::new()),
        }
    }

    /// Drop a thread's checkpoint.
    pub fn delete_messages(&self, thread_id: &str) -> skillet_core::Result<bool> {
        let db = self.db.lock();
        let n = db
            .execute("DELETE FROM checkpoints WHERE thread_id = ?1", rusqlite::params![thread_id])
            .map_err(store_err)?;
        Ok(n > 0)
    }
}

/// Conversation metadata for a single user.
#[derive(Clone)]
pub struct UserConversations {
    store: ConversationStore,
    user_id: String,
}

impl UserConversations {
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// All conversations for this user, most recently updated first.
    pub fn list(&self) -> skillet_core::Result<Vec<ConversationRow>> {
        let db = self.store.db.lock();
        let mut stmt = db
            .prepare(
                "SELECT thread_id, user_id, title, created_at, updated_at
                 FROM conversations
                 WHERE user_id = ?1
                 ORDER BY updated_at DESC, rowid DESC",
            )
            .map_err(store_err)?;

        let rows = stmt
            .query_map(rusqlite::params![self.user_id], |row| {
                Ok(ConversationRow {
                    thread_id: row.get(0)?,
                    user_id: row.get(1)?,
                    title: row.get(2)?,
                    created_at: row.get(3)?,
                    updated_at: row.get(4)?,
                })
            })
            .map_err(store_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(store_err)?;

        Ok(rows)
    }

    /// Fetch one conversation of this user.
    pub fn get(&self, thread_id: &str) -> skillet_core::Result<Option<ConversationRow>> {
        let db = self.store.db.lock();
        db.query_row(
            "SELECT thread_id, user_id, title, created_at, updated_at
             FROM conversations WHERE thread_id = ?1 AND user_id = ?2",
            rusqlite::params![thread_id, self.user_id],
            |row| {
                Ok(ConversationRow {
                    thread_id: row.get(0)?,
                    user_id: row.get(1)?,
                    title: row.get(2)?,
                    created_at: row.get(3)?,
                    updated_at: row.get(4)?,
                })
            },
        )
        .optional()
        .map_err(store_err)
    }

    /// Create a new conversation record.
    pub fn create(&self, thread_id: &str, title: &str) -> skillet_core::Result<()> {
        let now = now_timestamp();
        let db = self.store.db.lock();
        db.execute(
            "INSERT INTO conversations (thread_id, user_id, title, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            rusqlite::params![thread_id, self.user_id, title, now],
        )
        .map_err(store_err)?;
        info!(thread_id, user_id = %self.user_id, "conversation created");
        Ok(())
    }

    /// Rename a conversation; also bumps `updated_at`.
    pub fn update_title(&self, thread_id: &str, title: &str) -> skillet_core::Result<()> {
        let db = self.store.db.lock();
        db.execute(
            "UPDATE conversations SET title = ?1, updated_at = ?2 WHERE thread_id = ?3",
            rusqlite::params![title, now_timestamp(), thread_id],
        )
        .map_err(store_err)?;
        Ok(())
    }

    /// Bump `updated_at`. Called after each agent response.
    pub fn touch(&self, thread_id: &str) -> skillet_core::Result<()> {
        self.set_updated_at(thread_id, &now_timestamp())
    }

    fn set_updated_at(&self, thread_id: &str, timestamp: &str) -> skillet_core::Result<()> {
        let db = self.store.db.lock();
        db.execute(
            "UPDATE conversations SET updated_at = ?1 WHERE thread_id = ?2",
            rusqlite::params![timestamp, thread_id],
        )
        .map_err(store_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_orders_by_updated_at_desc() {
        let store = ConversationStore::open_in_memory().unwrap();
        let convs = store.for_user("u1");
        convs.create("a", "A").unwrap();
        convs.create("b", "B").unwrap();
        convs.create("c", "C").unwrap();
        convs.set_updated_at("a", "2030-01-03 00:00:00").unwrap();
        convs.set_updated_at("b", "2030-01-01 00:00:00").unwrap();
        convs.set_updated_at("c", "2030-01-02 00:00:00").unwrap();

        let ids: Vec<_> = convs.list().unwrap().into_iter().map(|r| r.thread_id).collect();
        assert_eq!(ids, vec!["a", "c", "b"]);
    }

    #[test]
    fn timestamp_format() {
        let ts = now_timestamp();
        assert_eq!(ts.len(), 19);
        assert_eq!(&ts[4..5], "-");
        assert_eq!(&ts[10..11], " ");
        assert!(chrono::NaiveDateTime::parse_from_str(&ts, "%Y-%m-%d %H:%M:%S").is_ok());
    }
}
