use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use std::path::PathBuf;

use skillet_config::{ConfigLoader, SkilletConfig};
use skillet_core::SkilletError;

mod chat;
pub mod display;
mod skills;

/// Skillet: a local tool-calling agent that learns workflows from skills
#[derive(Parser)]
#[command(name = "skillet", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to skillet.toml config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level override (e.g. debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all log output (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat in the terminal (default)
    Chat(ChatArgs),
    /// Inspect installed skills
    Skills {
        #[command(subcommand)]
        action: SkillAction,
    },
    /// Print the system prompt with skill summaries filled in
    Prompt,
    /// List stored conversations for the configured user
    Conversations {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show current configuration
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completions for bash, zsh, or fish
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(clap::Args, Default)]
pub(crate) struct ChatArgs {
    /// Thread ID to resume (skips the conversation selector)
    #[arg(short, long, conflicts_with = "new")]
    thread: Option<String>,

    /// Model override (e.g. qwen3:8b)
    #[arg(short, long)]
    model: Option<String>,

    /// Start a new conversation without asking
    #[arg(long)]
    new: bool,
}

#[derive(Subcommand)]
enum SkillAction {
    /// List available skills
    List,
    /// Show a skill's instructions, or another file from its folder
    Show {
        id: String,
        /// File inside the skill folder
        #[arg(short, long, default_value = skillet_skills::registry::SKILL_FILE)]
        file: String,
    },
}

impl Cli {
    pub async fn run(self) -> skillet_core::Result<()> {
        // Load config first so we can use it for log format
        let config_loader = ConfigLoader::load(self.config.as_deref())?;
        let config = config_loader.get();

        // Resolve log level: --verbose > --quiet > --log-level > config
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            self.log_level.as_deref().unwrap_or(&config.logging.level)
        };
        init_tracing(&config, log_level);

        match self.command.unwrap_or(Commands::Chat(ChatArgs::default())) {
            Commands::Chat(args) => chat::cmd_chat(config, args).await,
            Commands::Skills { action } => skills::cmd_skills(config, action),
            Commands::Prompt => Self::cmd_prompt(config),
            Commands::Conversations { json } => Self::cmd_conversations(config, json),
            Commands::Config { json } => Self::cmd_config(config, json),
            Commands::Completions { shell } => Self::cmd_completions(shell),
        }
    }

    fn cmd_prompt(config: SkilletConfig) -> skillet_core::Result<()> {
        let registry = skillet_skills::SkillRegistry::discover_in(&config.skills.dir)?;
        let prompt =
            skillet_runtime::SystemPrompt::resolve(config.agent.system_prompt_file.as_deref())?;
        println!("{}", skillet_runtime::get_system_prompt(&prompt, &registry)?);
        Ok(())
    }

    fn cmd_conversations(config: SkilletConfig, json: bool) -> skillet_core::Result<()> {
        let store = skillet_memory::ConversationStore::open(&config.store.db_path)?;
        let rows = store.for_user(&config.user.id).list()?;

        if json {
            println!("{}", serde_json::to_string_pretty(&rows)?);
            return Ok(());
        }
        if rows.is_empty() {
            println!("No conversations for user '{}'.", config.user.id);
            return Ok(());
        }

        println!("\x1b[1mConversations\x1b[0m ({})", rows.len());
        for row in &rows {
            println!(
                "  {}  \x1b[90m{}\x1b[0m",
                display::thread_label(&row.updated_at, &row.title),
                row.thread_id
            );
        }
        Ok(())
    }

    fn cmd_config(config: SkilletConfig, json: bool) -> skillet_core::Result<()> {
        if json {
            println!("{}", serde_json::to_string_pretty(&config)?);
        } else {
            println!(
                "{}",
                toml::to_string_pretty(&config).map_err(|e| SkilletError::Config(e.to_string()))?
            );
        }
        Ok(())
    }

    fn cmd_completions(shell: Shell) -> skillet_core::Result<()> {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "skillet", &mut std::io::stdout());
        Ok(())
    }
}

fn init_tracing(config: &SkilletConfig, log_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    if config.logging.format == "json" {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}
