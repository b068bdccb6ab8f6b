//! Tools exposed to the model.
//!
//! Each group of tools is a [`ToolExecutor`]; the [`ToolRegistry`] merges them
//! and routes calls by name.

pub mod bash;
pub mod file_search;
pub mod skill;

pub use bash::BashTool;
pub use file_search::FileSearchTools;
pub use skill::ViewSkillTool;

use skillet_core::{Result, SkilletError, Tool, ToolCall, ToolExecutor, ToolResult};
use std::collections::HashMap;
use std::sync::Arc;

/// Name-indexed collection of tool executors.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    executors: Vec<Arc<dyn ToolExecutor>>,
    by_name: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an executor. A later executor providing the same tool name wins.
    pub fn register(&mut self, executor: Arc<dyn ToolExecutor>) {
        let idx = self.executors.len();
        for tool in executor.tools() {
            self.by_name.insert(tool.name, idx);
        }
        self.executors.push(executor);
    }

    pub fn with(mut self, executor: Arc<dyn ToolExecutor>) -> Self {
        self.register(executor);
        self
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Tool names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.by_name.keys().cloned().collect();
        names.sort();
        names
    }

    /// Schemas of every tool, in registration order.
    pub fn tools(&self) -> Vec<Tool> {
        let mut seen = std::collections::HashSet::new();
        self.executors
            .iter()
            .enumerate()
            .flat_map(|(idx, ex)| ex.tools().into_iter().map(move |t| (idx, t)))
            .filter(|(idx, t)| self.by_name.get(&t.name) == Some(idx) && seen.insert(t.name.clone()))
            .map(|(_, t)| t)
            .collect()
    }

    pub async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
        let idx = self
            .by_name
            .get(&call.tool_name)
            .ok_or_else(|| SkilletError::ToolNotFound(call.tool_name.clone()))?;
        self.executors[*idx].execute(call).await
    }
}

/// Cut `text` to at most `max_bytes`, on a char boundary, noting the cut.
pub(crate) fn truncate_output(text: &str, max_bytes: usize) -> String {
    if max_bytes == 0 || text.len() <= max_bytes {
        return text.to_string();
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!(
        "{}\n... (output truncated, {} bytes total)",
        &text[..end],
        text.len()
    )
}
