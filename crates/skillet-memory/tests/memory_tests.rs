#[cfg(test)]
mod tests {
    use skillet_core::{Message, Role, ToolCall, ToolResult};
    use skillet_memory::{ConversationStore, title_from_query};

    // ── Conversations ──────────────────────────────────────────

    mod conversations {
        use super::*;

        #[test]
        fn test_create_and_list() {
            let store = ConversationStore::open_in_memory().unwrap();
            let convs = store.for_user("cli_user");
            convs.create("t1", "New conversation").unwrap();

            let rows = convs.list().unwrap();
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].thread_id, "t1");
            assert_eq!(rows[0].user_id, "cli_user");
            assert_eq!(rows[0].title, "New conversation");
            assert_eq!(rows[0].created_at, rows[0].updated_at);
        }

        #[test]
        fn test_list_is_scoped_to_user() {
            let store = ConversationStore::open_in_memory().unwrap();
            store.for_user("alice").create("a1", "Alice").unwrap();
            store.for_user("bob").create("b1", "Bob").unwrap();

            let alice = store.for_user("alice").list().unwrap();
            assert_eq!(alice.len(), 1);
            assert_eq!(alice[0].title, "Alice");
            assert!(store.for_user("carol").list().unwrap().is_empty());
        }

        #[test]
        fn test_update_title() {
            let store = ConversationStore::open_in_memory().unwrap();
            let convs = store.for_user("u");
            convs.create("t1", "New conversation").unwrap();
            convs.update_title("t1", "How do I parse PDFs?").unwrap();
            assert_eq!(convs.get("t1").unwrap().unwrap().title, "How do I parse PDFs?");
        }

        #[test]
        fn test_touch_unknown_thread_is_noop() {
            let store = ConversationStore::open_in_memory().unwrap();
            store.for_user("u").touch("missing").unwrap();
            assert!(store.for_user("u").get("missing").unwrap().is_none());
        }

        #[test]
        fn test_get_respects_user() {
            let store = ConversationStore::open_in_memory().unwrap();
            store.for_user("alice").create("t1", "x").unwrap();
            assert!(store.for_user("bob").get("t1").unwrap().is_none());
        }

        #[test]
        fn test_duplicate_thread_id_errors() {
            let store = ConversationStore::open_in_memory().unwrap();
            let convs = store.for_user("u");
            convs.create("t1", "x").unwrap();
            assert!(convs.create("t1", "y").is_err());
        }
    }

    // ── Checkpoints ────────────────────────────────────────────

    mod checkpoints {
        use super::*;

        #[test]
        fn test_unknown_thread_is_empty() {
            let store = ConversationStore::open_in_memory().unwrap();
            assert!(store.load_messages("nope").unwrap().is_empty());
        }

        #[test]
        fn test_save_and_load_preserves_tool_turns() {
            let store = ConversationStore::open_in_memory().unwrap();
            let call = ToolCall {
                id: "call_1".into(),
                tool_name: "view_skill".into(),
                arguments: serde_json::json!({"skill_id": "pdf"}),
            };
            let messages = vec![
                Message::text(Role::User, "help with pdf"),
                Message::assistant("", vec![call]),
                Message::tool_result("view_skill", &ToolResult::ok("call_1", "# PDF")),
                Message::assistant("Here is how.", vec![]),
            ];
            store.save_messages("t1", &messages).unwrap();

            let loaded = store.load_messages("t1").unwrap();
            assert_eq!(loaded.len(), 4);
            assert_eq!(loaded[1].tool_calls[0].tool_name, "view_skill");
            assert_eq!(loaded[3].text_content(), "Here is how.");
        }

        #[test]
        fn test_save_overwrites() {
            let store = ConversationStore::open_in_memory().unwrap();
            store
                .save_messages("t1", &[Message::text(Role::User, "one")])
                .unwrap();
            store
                .save_messages(
                    "t1",
                    &[Message::text(Role::User, "one"), Message::text(Role::Assistant, "two")],
                )
                .unwrap();
            assert_eq!(store.load_messages("t1").unwrap().len(), 2);
            assert!(store.delete_messages("t1").unwrap());
            assert!(store.load_messages("t1").unwrap().is_empty());
        }
    }

    // ── Persistence ────────────────────────────────────────────

    #[test]
    fn test_open_creates_parent_dirs_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("agent.db");
        {
            let store = ConversationStore::open(&path).unwrap();
            store.for_user("u").create("t1", "kept").unwrap();
            store
                .save_messages("t1", &[Message::text(Role::User, "hi")])
                .unwrap();
        }
        let store = ConversationStore::open(&path).unwrap();
        assert_eq!(store.for_user("u").list().unwrap()[0].title, "kept");
        assert_eq!(store.load_messages("t1").unwrap()[0].text_content(), "hi");
    }

    // ── Titles ─────────────────────────────────────────────────

    #[test]
    fn test_title_from_query() {
        assert_eq!(title_from_query("short"), "short");
        let exactly_60 = "a".repeat(60);
        assert_eq!(title_from_query(&exactly_60), exactly_60);
        let long = "b".repeat(61);
        assert_eq!(title_from_query(&long), format!("{}...", "b".repeat(60)));
    }

    #[test]
    fn test_title_counts_chars_not_bytes() {
        let query = "é".repeat(61);
        let title = title_from_query(&query);
        assert!(title.ends_with("..."));
        assert_eq!(title.chars().count(), 63);
    }
}
