use async_trait::async_trait;
use serde_json::json;
use skillet_core::{Result, Tool, ToolCall, ToolExecutor, ToolResult};
use skillet_skills::SkillRegistry;
use skillet_skills::registry::SKILL_FILE;
use std::sync::Arc;

pub const VIEW_SKILL_TOOL: &str = "view_skill";

/// Lets the model read a skill's instructions or any file bundled with it.
#[derive(Clone)]
pub struct ViewSkillTool {
    registry: Arc<SkillRegistry>,
}

impl ViewSkillTool {
    pub fn new(registry: Arc<SkillRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl ToolExecutor for ViewSkillTool {
    fn tools(&self) -> Vec<Tool> {
        vec![Tool {
            name: VIEW_SKILL_TOOL.into(),
            description: "Load a skill's full instructions (SKILL.md) or another file from the \
                skill folder, such as a reference document or script. Check the skill list in \
                the system prompt for valid IDs."
                .into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "skill_id": {
                        "type": "string",
                        "description": "Skill ID, e.g. \"pdf\""
                    },
                    "file": {
                        "type": "string",
                        "description": "File inside the skill folder",
                        "default": SKILL_FILE
                    }
                },
                "required": ["skill_id"]
            }),
            is_mutating: false,
        }]
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
        let skill_id = call.required_str("skill_id")?;
        let file = call.str_arg("file").unwrap_or(SKILL_FILE);
        let content = self.registry.load_skill(skill_id, file);
        let is_error = content.starts_with("Error");
        Ok(ToolResult {
            tool_call_id: call.id.clone(),
            content,
            is_error,
        })
    }
}
