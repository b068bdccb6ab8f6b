//! # skillet-runtime
//!
//! The agent runtime: renders the system prompt, wires up the tools, and runs
//! the ReAct loop with human approval for risky calls.
//!
//! ## Architecture
//!
//! ```text
//!          user input
//!              │
//!              ▼
//!      ┌───────────────┐   checkpoint   ┌──────────────────┐
//!      │  ReActAgent   │ ─────────────▶ │ ConversationStore │
//!      │               │                └──────────────────┘
//!      │ 1. Think      │  ← LLM call with tool schemas
//!      │ 2. Approve    │  ← InterruptPolicy + AgentCallback
//!      │ 3. Act        │  ← ToolRegistry
//!      │ 4. Repeat     │  until the model stops calling tools
//!      └───────┬───────┘
//!              │
//!   ┌──────────┼──────────┬─────────────┬───────────────┐
//!   ▼          ▼          ▼             ▼               ▼
//! view_skill  bash   glob_search   grep_search   data_analysis
//!                                                       │
//!                                            subagent: run_script + bash
//! ```

pub mod agent;
pub mod callback;
pub mod hitl;
pub mod prompt;
pub mod subagent;
pub mod tools;

pub use agent::{AgentSettings, ReActAgent, ReActAgentBuilder};
pub use callback::{AgentCallback, SilentCallback};
pub use hitl::{ApprovalRequest, ApprovalResponse, InterruptPolicy};
pub use prompt::{SystemPrompt, get_system_prompt};
pub use subagent::{DataAnalysisTool, RunScriptTool, analyze_dataframe};
pub use tools::{BashTool, FileSearchTools, ToolRegistry, ViewSkillTool};
