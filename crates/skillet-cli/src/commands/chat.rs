use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use dialoguer::Select;
use dialoguer::theme::ColorfulTheme;
use tracing::{error, info, warn};

use skillet_config::SkilletConfig;
use skillet_core::{SkilletError, new_thread_id};
use skillet_llm::{LlmProvider, OllamaProvider};
use skillet_memory::{ConversationRow, ConversationStore, UserConversations, title_from_query};
use skillet_runtime::ReActAgent;

use super::ChatArgs;
use super::display::{CliCallback, thread_label};

pub(crate) const NEW_CONVERSATION: &str = "New conversation";

/// What the user picked in the conversation selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ThreadChoice {
    New,
    Resume(String),
    Cancelled,
}

/// Map a selector index onto `rows`; index 0 is "New conversation".
pub(crate) fn choice_from_index(rows: &[ConversationRow], index: Option<usize>) -> ThreadChoice {
    match index {
        None => ThreadChoice::Cancelled,
        Some(0) => ThreadChoice::New,
        Some(i) => rows
            .get(i - 1)
            .map(|r| ThreadChoice::Resume(r.thread_id.clone()))
            .unwrap_or(ThreadChoice::Cancelled),
    }
}

async fn select_thread(rows: Vec<ConversationRow>) -> skillet_core::Result<ThreadChoice> {
    let mut items = vec![NEW_CONVERSATION.to_string()];
    items.extend(rows.iter().map(|r| thread_label(&r.updated_at, &r.title)));

    let picked = tokio::task::spawn_blocking(move || {
        Select::with_theme(&ColorfulTheme::default())
            .with_prompt("Select a conversation:")
            .items(&items)
            .default(0)
            .interact_opt()
    })
    .await
    .map_err(|e| SkilletError::Agent(format!("selector task failed: {e}")))?
    .map_err(|e| SkilletError::Agent(format!("selector failed: {e}")))?;

    Ok(choice_from_index(&rows, picked))
}

/// Pick the thread to chat in. Returns `None` if the user backed out.
async fn resolve_thread(
    convs: &UserConversations,
    args: &ChatArgs,
) -> skillet_core::Result<Option<(String, bool)>> {
    if let Some(thread) = &args.thread {
        let exists = convs.get(thread)?.is_some();
        return Ok(Some((thread.clone(), !exists)));
    }
    if args.new {
        return Ok(Some((new_thread_id(), true)));
    }

    let rows = convs.list()?;
    if rows.is_empty() {
        // no history yet; start fresh without asking
        return Ok(Some((new_thread_id(), true)));
    }

    Ok(match select_thread(rows).await? {
        ThreadChoice::New => Some((new_thread_id(), true)),
        ThreadChoice::Resume(id) => Some((id, false)),
        ThreadChoice::Cancelled => None,
    })
}

/// Read one line from stdin after printing the prompt. `None` on EOF.
async fn read_query() -> Option<String> {
    tokio::task::spawn_blocking(|| {
        print!("\n>>> ");
        std::io::stdout().flush().ok();
        let mut line = String::new();
        match std::io::stdin().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_string()),
        }
    })
    .await
    .ok()
    .flatten()
}

pub(crate) fn is_exit_command(query: &str) -> bool {
    matches!(query.to_lowercase().as_str(), "exit" | "quit" | "q")
}

/// Bookkeeping after an answered query: title a fresh thread from its first
/// query, then bump `updated_at`.
pub(crate) fn record_turn(
    convs: &UserConversations,
    thread_id: &str,
    query: &str,
    title_set: &mut bool,
) -> skillet_core::Result<()> {
    if !*title_set {
        convs.update_title(thread_id, &title_from_query(query))?;
        *title_set = true;
    }
    convs.touch(thread_id)
}

pub(super) async fn cmd_chat(mut config: SkilletConfig, args: ChatArgs) -> skillet_core::Result<()> {
    if let Some(model) = &args.model {
        config.agent.model = model.clone();
    }

    let store = ConversationStore::open(&config.store.db_path)?;
    let convs = store.for_user(&config.user.id);

    let Some((thread_id, is_new)) = resolve_thread(&convs, &args).await? else {
        return Ok(());
    };
    if is_new {
        convs.create(&thread_id, NEW_CONVERSATION)?;
    }

    let ollama = OllamaProvider::with_timeout(
        &config.agent.ollama_url,
        &config.agent.model,
        Duration::from_secs(config.agent.request_timeout_secs),
    )?;
    if let Err(e) = ollama.health_check().await {
        warn!(url = %config.agent.ollama_url, error = %e, "ollama is not reachable; requests will fail until it is");
    }
    let llm: Arc<dyn LlmProvider> = Arc::new(ollama);

    let mut agent = ReActAgent::from_config(
        &config,
        llm,
        Arc::new(CliCallback),
        Some(store.clone()),
        thread_id.clone(),
    )?;

    info!("Thread: {thread_id}");
    info!("Type 'exit' or 'quit' to end the conversation.");

    // resumed threads already carry a title
    let mut title_set = !is_new;

    while let Some(query) = read_query().await {
        if is_exit_command(&query) {
            info!("Ending conversation. Goodbye!");
            break;
        }
        if query.is_empty() {
            continue;
        }

        match agent.run(&query).await {
            Ok(response) => {
                println!("\n{response}\n");

                if let Err(e) = record_turn(&convs, &thread_id, &query, &mut title_set) {
                    error!(thread = %thread_id, error = %e, "Failed to update conversation");
                }
            }
            Err(e) => {
                error!(error = %e, "Error processing query");
                info!("Please try again or type 'exit' to quit.");
            }
        }
    }

    Ok(())
}
