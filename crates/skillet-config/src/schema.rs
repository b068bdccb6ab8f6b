use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration, maps to `skillet.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SkilletConfig {
    pub agent: AgentConfig,
    pub skills: SkillsConfig,
    pub bash: BashConfig,
    pub file_search: FileSearchConfig,
    pub approval: ApprovalConfig,
    pub data_analysis: DataAnalysisConfig,
    pub store: StoreConfig,
    pub user: UserConfig,
    pub logging: LoggingConfig,
}

// ── Agent ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Ollama model tag, e.g. "qwen3:8b".
    pub model: String,
    /// Base URL of the Ollama server.
    pub ollama_url: String,
    /// Temperature (0.0 - 2.0).
    pub temperature: f32,
    /// Maximum tokens per response (Ollama `num_predict`).
    pub max_tokens: u32,
    /// Maximum agent loop iterations before forcing a stop.
    pub max_iterations: u32,
    /// Path to a prompt template replacing the built-in one.
    /// Must contain `{skill_summaries}`.
    pub system_prompt_file: Option<PathBuf>,
    /// HTTP timeout for a single model call.
    pub request_timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: "qwen3:8b".into(),
            ollama_url: "http://127.0.0.1:11434".into(),
            temperature: 0.0,
            max_tokens: 4096,
            max_iterations: 25,
            system_prompt_file: None,
            request_timeout_secs: 300,
        }
    }
}

// ── Skills ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillsConfig {
    /// Directory containing one folder per skill, each with a `SKILL.md`.
    pub dir: PathBuf,
}

impl Default for SkillsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("skills"),
        }
    }
}

// ── Bash ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BashConfig {
    pub timeout_secs: u64,
    /// Output beyond this many bytes is cut off with a note.
    pub max_output_bytes: usize,
}

impl Default for BashConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_output_bytes: 100_000,
        }
    }
}

// ── File search ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSearchConfig {
    /// Directory that virtual path `/` maps to.
    pub root: PathBuf,
    /// Cap on the number of lines a single search returns.
    pub max_results: usize,
    /// Files larger than this are skipped by grep.
    pub max_file_size_mb: u64,
}

impl Default for FileSearchConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            max_results: 200,
            max_file_size_mb: 10,
        }
    }
}

// ── Approval (human in the loop) ───────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApprovalConfig {
    /// Tools that pause for a yes/no decision before running.
    pub interrupt_on: Vec<String>,
    /// Skip the prompt and approve everything.
    pub auto_approve: bool,
}

impl Default for ApprovalConfig {
    fn default() -> Self {
        Self {
            interrupt_on: vec!["bash".into()],
            auto_approve: false,
        }
    }
}

// ── Data analysis subagent ─────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataAnalysisConfig {
    /// Interpreter used by `run_script`.
    pub python: String,
    pub timeout_secs: u64,
    /// Leave sample rows out of the dataframe summary.
    pub privacy_mode: bool,
    /// Model for the subagent (None = same as the main agent).
    pub model: Option<String>,
}

impl Default for DataAnalysisConfig {
    fn default() -> Self {
        Self {
            python: "python".into(),
            timeout_secs: 60,
            privacy_mode: false,
            model: None,
        }
    }
}

// ── Store ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path to the SQLite database.
    pub db_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("data/agent.db"),
        }
    }
}

// ── User ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    pub id: String,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            id: "cli_user".into(),
        }
    }
}

// ── Logging ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
    /// Output format: "pretty" or "json".
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

// ── Validation ─────────────────────────────────────────────────

/// A single config validation issue.
#[derive(Debug)]
pub struct ConfigWarning {
    pub field: String,
    pub message: String,
    pub severity: WarningSeverity,
    pub hint: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningSeverity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let icon = match self.severity {
            WarningSeverity::Error => "❌",
            WarningSeverity::Warning => "⚠️ ",
            WarningSeverity::Info => "💡",
        };
        write!(f, "{} {}: {}", icon, self.field, self.message)?;
        if let Some(ref h) = self.hint {
            write!(f, "\n   ↳ {}", h)?;
        }
        Ok(())
    }
}

impl SkilletConfig {
    /// Validate the config and return a list of warnings/errors.
    /// Returns `Err` with all messages joined if any severity is Error.
    pub fn validate(&self) -> Result<Vec<ConfigWarning>, String> {
        let mut warnings = Vec::new();

        // ── Agent model ───
        if self.agent.model.trim().is_empty() {
            warnings.push(ConfigWarning {
                field: "agent.model".into(),
                message: "model is empty".into(),
                severity: WarningSeverity::Error,
                hint: Some("Set to an Ollama model tag, e.g. 'qwen3:8b'".into()),
            });
        }

        if !self.agent.ollama_url.starts_with("http://")
            && !self.agent.ollama_url.starts_with("https://")
        {
            warnings.push(ConfigWarning {
                field: "agent.ollama_url".into(),
                message: format!("'{}' is not an http(s) URL", self.agent.ollama_url),
                severity: WarningSeverity::Error,
                hint: Some("e.g. http://127.0.0.1:11434".into()),
            });
        }

        // ── Temperature ───
        if self.agent.temperature < 0.0 || self.agent.temperature > 2.0 {
            warnings.push(ConfigWarning {
                field: "agent.temperature".into(),
                message: format!("temperature {} is out of range", self.agent.temperature),
                severity: WarningSeverity::Error,
                hint: Some("Temperature must be between 0.0 and 2.0".into()),
            });
        }

        if self.agent.max_iterations == 0 {
            warnings.push(ConfigWarning {
                field: "agent.max_iterations".into(),
                message: "max_iterations is 0, the agent could never answer".into(),
                severity: WarningSeverity::Error,
                hint: Some("Set to e.g. 25".into()),
            });
        }

        // ── Timeouts ───
        for (field, secs) in [
            ("bash.timeout_secs", self.bash.timeout_secs),
            ("data_analysis.timeout_secs", self.data_analysis.timeout_secs),
        ] {
            if secs == 0 {
                warnings.push(ConfigWarning {
                    field: field.into(),
                    message: "timeout is 0, every command would time out".into(),
                    severity: WarningSeverity::Error,
                    hint: None,
                });
            }
        }

        // ── Skills dir ───
        if !self.skills.dir.exists() {
            warnings.push(ConfigWarning {
                field: "skills.dir".into(),
                message: format!("{} does not exist, no skills will load", self.skills.dir.display()),
                severity: WarningSeverity::Warning,
                hint: Some("Point SKILL_DIR or skills.dir at a folder of skill directories".into()),
            });
        }

        // ── Logging ───
        let valid_formats = ["pretty", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            warnings.push(ConfigWarning {
                field: "logging.format".into(),
                message: format!("unknown log format '{}'", self.logging.format),
                severity: WarningSeverity::Warning,
                hint: Some(format!("Valid values: {}", valid_formats.join(", "))),
            });
        }

        if self.approval.auto_approve {
            warnings.push(ConfigWarning {
                field: "approval.auto_approve".into(),
                message: "shell commands will run without confirmation".into(),
                severity: WarningSeverity::Info,
                hint: None,
            });
        }

        // Check for hard errors
        let errors: Vec<String> = warnings
            .iter()
            .filter(|w| w.severity == WarningSeverity::Error)
            .map(|w| format!("{}: {}", w.field, w.message))
            .collect();

        if !errors.is_empty() {
            return Err(format!("Configuration errors:\n  • {}", errors.join("\n  • ")));
        }

        Ok(warnings)
    }
}
