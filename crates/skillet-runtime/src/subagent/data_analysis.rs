//! `data_analysis`: delegates a task on a data file to a subagent that writes
//! and runs Python scripts.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use skillet_config::SkilletConfig;
use skillet_core::{Result, SkilletError, Tool, ToolCall, ToolExecutor, ToolResult};
use skillet_llm::LlmProvider;
use skillet_memory::ConversationStore;
use std::io::Write;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::dataframe::analyze_dataframe;
use crate::agent::{AgentSettings, ReActAgent};
use crate::tools::{BashTool, ToolRegistry};

pub const DATA_ANALYSIS_TOOL: &str = "data_analysis";
pub const RUN_SCRIPT_TOOL: &str = "run_script";

const NO_RESULT: &str = "Subagent failed to produce a result";

pub const DATA_ANALYSIS_SYSTEM_PROMPT: &str = "\
You are a data analysis assistant that writes and runs Python scripts.

Your job is to:
1. Understand the data analysis task
2. Write a Python script using the provided dataframe info
3. Use the run_script tool to execute your script
4. If there's an error, use bash with `cat <script_path>` to read the script, fix it, and try again

ENVIRONMENT:
- pandas and numpy are already installed
- The dataframe structure is provided below, use this info to write your script
- Load the data from the file path provided

Guidelines:
- Write simple, clean Python code
- Always include print statements to show results
- Use the exact column names from the provided schema

DEBUGGING:
- If run_script returns an error, it will include the script path
- Use the bash tool: cat /path/to/script.py to see your code
- Fix the issue and call run_script with corrected code
";

/// Paths of scripts written during one subagent run.
type ScriptLedger = Arc<Mutex<Vec<PathBuf>>>;

/// Writes a script to `analysis_*.py` in the temp dir and runs it.
///
/// Failed scripts stay on disk so the subagent can `cat` them; whatever is
/// left is removed by [`RunScriptTool::cleanup`].
#[derive(Clone)]
pub struct RunScriptTool {
    python: String,
    timeout: Duration,
    scripts: ScriptLedger,
}

impl RunScriptTool {
    pub fn new(python: impl Into<String>, timeout: Duration) -> Self {
        Self {
            python: python.into(),
            timeout,
            scripts: Arc::default(),
        }
    }

    /// Scripts still on disk.
    pub fn leftover_scripts(&self) -> Vec<PathBuf> {
        self.scripts.lock().clone()
    }

    /// Delete every script this tool has written that still exists.
    pub fn cleanup(&self) {
        for path in self.scripts.lock().drain(..) {
            if path.exists()
                && let Err(e) = std::fs::remove_file(&path)
            {
                warn!(path = %path.display(), error = %e, "failed to remove analysis script");
            }
        }
    }

    fn write_script(&self, script: &str) -> Result<PathBuf> {
        let mut file = tempfile::Builder::new()
            .prefix("analysis_")
            .suffix(".py")
            .tempfile()?;
        file.write_all(script.as_bytes())?;
        let path = file
            .into_temp_path()
            .keep()
            .map_err(|e| SkilletError::Io(e.error))?;
        self.scripts.lock().push(path.clone());
        Ok(path)
    }

    /// Run `script`; the returned flag is true on success.
    pub async fn run(&self, script: &str) -> Result<(String, bool)> {
        let path = self.write_script(script)?;
        let shown = path.display().to_string();
        debug!(script = %shown, "running analysis script");

        let child = tokio::process::Command::new(&self.python)
            .arg(&path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();
        let child = match child {
            Ok(child) => child,
            Err(e) => return Ok((format!("ERROR in {shown}\n{e}"), false)),
        };

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Ok((format!("ERROR in {shown}\n{e}"), false)),
            Err(_) => {
                return Ok((
                    format!("TIMEOUT in {shown} - exceeded {}s", self.timeout.as_secs()),
                    false,
                ));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Ok((format!("ERROR in {shown}\n{stderr}"), false));
        }

        if let Err(e) = std::fs::remove_file(&path) {
            warn!(script = %shown, error = %e, "failed to remove analysis script");
        } else {
            self.scripts.lock().retain(|p| p != &path);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        if stdout.is_empty() {
            Ok(("Success (no output)".to_string(), true))
        } else {
            Ok((stdout.into_owned(), true))
        }
    }
}

#[async_trait]
impl ToolExecutor for RunScriptTool {
    fn tools(&self) -> Vec<Tool> {
        vec![Tool {
            name: RUN_SCRIPT_TOOL.into(),
            description: "Write a Python script to a temp file and execute it. Returns the \
                script output on success; on error, the script path and the error message."
                .into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "script": {
                        "type": "string",
                        "description": "The complete Python script code to run"
                    }
                },
                "required": ["script"]
            }),
            is_mutating: true,
        }]
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
        let script = call.required_str("script")?;
        let (content, success) = self.run(script).await?;
        Ok(ToolResult {
            tool_call_id: call.id.clone(),
            content,
            is_error: !success,
        })
    }
}

/// The `data_analysis` tool offered to the main agent.
pub struct DataAnalysisTool {
    llm: Arc<dyn LlmProvider>,
    settings: AgentSettings,
    python: String,
    timeout: Duration,
    privacy_mode: bool,
    bash: BashTool,
    store: Option<ConversationStore>,
}

impl DataAnalysisTool {
    pub fn new(llm: Arc<dyn LlmProvider>, settings: AgentSettings) -> Self {
        Self {
            llm,
            settings,
            python: "python".into(),
            timeout: Duration::from_secs(60),
            privacy_mode: false,
            bash: BashTool::default(),
            store: None,
        }
    }

    pub fn from_config(
        config: &SkilletConfig,
        llm: Arc<dyn LlmProvider>,
        store: Option<ConversationStore>,
    ) -> Self {
        let da = &config.data_analysis;
        let mut settings = AgentSettings::from_config(&config.agent);
        if let Some(model) = &da.model {
            settings.model = model.clone();
        }
        settings.temperature = 0.0;

        Self {
            llm,
            settings,
            python: da.python.clone(),
            timeout: Duration::from_secs(da.timeout_secs),
            privacy_mode: da.privacy_mode,
            bash: BashTool::from_config(&config.bash),
            store,
        }
    }

    pub fn with_python(mut self, python: impl Into<String>) -> Self {
        self.python = python.into();
        self
    }

    pub fn with_privacy_mode(mut self, privacy_mode: bool) -> Self {
        self.privacy_mode = privacy_mode;
        self
    }

    pub fn with_store(mut self, store: Option<ConversationStore>) -> Self {
        self.store = store;
        self
    }

    /// Profile the file, then let a fresh subagent work on `task`.
    pub async fn analyze(&self, file_path: &str, task: &str) -> Result<String> {
        let info = analyze_dataframe(file_path, self.privacy_mode);
        let task_prompt = format!("DATAFRAME INFO:\n{info}\n\nTASK:\n{task}");

        let run_script = RunScriptTool::new(&self.python, self.timeout);
        let tools = ToolRegistry::new()
            .with(Arc::new(run_script.clone()))
            .with(Arc::new(self.bash.clone()));

        let thread_id = format!("data_analysis_{}", uuid::Uuid::new_v4());
        info!(file = file_path, thread = %thread_id, model = %self.settings.model, "starting data analysis subagent");

        let mut agent = ReActAgent::builder(self.llm.clone(), DATA_ANALYSIS_SYSTEM_PROMPT)
            .settings(self.settings.clone())
            .tools(tools)
            .store(self.store.clone())
            .thread_id(thread_id)
            .build();

        let outcome = agent.run(&task_prompt).await;
        run_script.cleanup();
        outcome
    }
}

#[async_trait]
impl ToolExecutor for DataAnalysisTool {
    fn tools(&self) -> Vec<Tool> {
        vec![Tool {
            name: DATA_ANALYSIS_TOOL.into(),
            description: "Delegate a data analysis task to a specialized subagent that writes \
                and runs Python (pandas) scripts. Use it to analyze CSV or JSON data files, \
                compute statistics or summaries, and transform or clean data."
                .into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "file_path": {
                        "type": "string",
                        "description": "Path to the data file (CSV or JSON)"
                    },
                    "task": {
                        "type": "string",
                        "description": "Description of the data analysis task"
                    }
                },
                "required": ["file_path", "task"]
            }),
            is_mutating: true,
        }]
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
        let file_path = call.required_str("file_path")?;
        let task = call.required_str("task")?;

        match self.analyze(file_path, task).await {
            Ok(answer) if !answer.trim().is_empty() => Ok(ToolResult::ok(&call.id, answer)),
            Ok(_) => Ok(ToolResult::ok(&call.id, NO_RESULT)),
            Err(e) => {
                warn!(error = %e, "data analysis subagent failed");
                Ok(ToolResult::error(&call.id, format!("{NO_RESULT}: {e}")))
            }
        }
    }
}
