use async_trait::async_trait;
use serde_json::json;
use skillet_core::{Result, Tool, ToolCall, ToolExecutor, ToolResult};
use std::process::Stdio;
use std::time::Duration;
use tracing::{info, warn};

use super::truncate_output;

/// Runs shell commands through `sh -c`.
#[derive(Debug, Clone)]
pub struct BashTool {
    timeout: Duration,
    max_output_bytes: usize,
}

/// Outcome of one command, already phrased for the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BashOutput {
    pub content: String,
    pub success: bool,
}

impl Default for BashTool {
    fn default() -> Self {
        Self::new(Duration::from_secs(30), 100_000)
    }
}

impl BashTool {
    pub fn new(timeout: Duration, max_output_bytes: usize) -> Self {
        Self {
            timeout,
            max_output_bytes,
        }
    }

    pub fn from_config(config: &skillet_config::schema::BashConfig) -> Self {
        Self::new(Duration::from_secs(config.timeout_secs), config.max_output_bytes)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `command` and describe the outcome.
    ///
    /// Failures are reported with the exit code and stderr (stdout if stderr
    /// is empty). Successful runs return stdout only; stderr is treated as
    /// noise.
    pub async fn run(&self, command: &str) -> BashOutput {
        info!(command, timeout_secs = self.timeout.as_secs(), "executing bash command");

        let mut cmd = tokio::process::Command::new("sh");
        cmd.arg("-c")
            .arg(command)
            // Pipe stdin to /dev/null so interactive commands fail fast instead of hanging
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                return BashOutput {
                    content: format!("Error executing command: {e}"),
                    success: false,
                };
            }
        };

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return BashOutput {
                    content: format!("Error executing command: {e}"),
                    success: false,
                };
            }
            Err(_) => {
                warn!(command, "bash command timed out");
                return BashOutput {
                    content: format!(
                        "Error: Command execution timed out ({} second limit)",
                        self.timeout.as_secs()
                    ),
                    success: false,
                };
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let error_output = if stderr.is_empty() { &stdout } else { &stderr };
            return BashOutput {
                content: truncate_output(
                    &format!("Command failed with exit code {code}\nError: {error_output}"),
                    self.max_output_bytes,
                ),
                success: false,
            };
        }

        let content = if stdout.is_empty() {
            "Command executed successfully (no output)".to_string()
        } else {
            truncate_output(&stdout, self.max_output_bytes)
        };
        BashOutput {
            content,
            success: true,
        }
    }
}

#[async_trait]
impl ToolExecutor for BashTool {
    fn tools(&self) -> Vec<Tool> {
        vec![Tool {
            name: "bash".into(),
            description: "Execute a bash command and return the output. Use this for system \
                commands, file operations, process management, or running scripts \
                (e.g. \"ls -la\", \"cat file.txt\", \"python script.py\"). Stdin is closed, \
                so interactive programs will fail."
                .into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "command": {
                        "type": "string",
                        "description": "The bash command to execute"
                    }
                },
                "required": ["command"]
            }),
            is_mutating: true,
        }]
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
        let command = call.required_str("command")?;
        let out = self.run(command).await;
        Ok(ToolResult {
            tool_call_id: call.id.clone(),
            content: out.content,
            is_error: !out.success,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stdout_on_success() {
        let out = BashTool::default().run("echo hello").await;
        assert!(out.success);
        assert_eq!(out.content, "hello\n");
    }

    #[tokio::test]
    async fn stderr_ignored_on_success() {
        let out = BashTool::default().run("echo warn 1>&2; echo ok").await;
        assert_eq!(out.content, "ok\n");
    }

    #[tokio::test]
    async fn empty_output_message() {
        let out = BashTool::default().run("true").await;
        assert_eq!(out.content, "Command executed successfully (no output)");
    }

    #[tokio::test]
    async fn failure_prefers_stderr() {
        let out = BashTool::default().run("echo out; echo bad 1>&2; exit 3").await;
        assert!(!out.success);
        assert_eq!(out.content, "Command failed with exit code 3\nError: bad\n");
    }

    #[tokio::test]
    async fn failure_falls_back_to_stdout() {
        let out = BashTool::default().run("echo only-out; exit 2").await;
        assert_eq!(out.content, "Command failed with exit code 2\nError: only-out\n");
    }

    #[tokio::test]
    async fn timeout_message() {
        let tool = BashTool::new(Duration::from_secs(1), 1000);
        let out = tool.run("sleep 5").await;
        assert!(!out.success);
        assert_eq!(out.content, "Error: Command execution timed out (1 second limit)");
    }

    #[tokio::test]
    async fn long_output_truncated() {
        let tool = BashTool::new(Duration::from_secs(5), 10);
        let out = tool.run("printf '%0100d' 0").await;
        assert!(out.content.starts_with("0000000000\n... (output truncated, 100 bytes total)"));
    }
}
