//! System prompt template and rendering.
//!
//! The template is plain Markdown with one placeholder, `{skill_summaries}`.
//! Literal braces are written doubled (`{{` / `}}`), the same convention as
//! Python's `str.format`, so existing prompt files carry over unchanged.

use skillet_core::{Result, SkilletError};
use skillet_skills::SkillRegistry;
use std::path::Path;
use tracing::{info, warn};

/// Name of the only placeholder a template may use.
pub const SKILL_SUMMARIES: &str = "skill_summaries";

const BUILTIN_TEMPLATE: &str = include_str!("../prompts/Agent.md");

/// Section headers every agent prompt is expected to carry.
pub const REQUIRED_SECTIONS: [&str; 5] = [
    "Core Tools",
    "Skill Management Tools",
    "File Search Tools",
    "Bash Tool",
    "Available Skills",
];

/// A system prompt template.
#[derive(Debug, Clone)]
pub struct SystemPrompt {
    template: String,
}

impl SystemPrompt {
    /// The template compiled into the binary.
    pub fn builtin() -> Self {
        Self {
            template: BUILTIN_TEMPLATE.to_string(),
        }
    }

    pub fn from_template(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Load a template from disk (`agent.system_prompt_file`).
    pub fn from_file(path: &Path) -> Result<Self> {
        let template = std::fs::read_to_string(path).map_err(|e| {
            SkilletError::Template(format!("failed to read {}: {}", path.display(), e))
        })?;
        info!(?path, "loaded system prompt template");
        let prompt = Self { template };
        let missing = prompt.missing_sections();
        if !missing.is_empty() {
            warn!(?path, ?missing, "prompt template lacks expected sections");
        }
        Ok(prompt)
    }

    /// Built-in template unless a file is given.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::builtin()),
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Headers from [`REQUIRED_SECTIONS`] that the template does not contain.
    pub fn missing_sections(&self) -> Vec<&'static str> {
        REQUIRED_SECTIONS
            .iter()
            .copied()
            .filter(|s| !self.template.contains(s))
            .collect()
    }

    /// Substitute `{skill_summaries}`; the value is inserted verbatim.
    pub fn render(&self, skill_summaries: &str) -> Result<String> {
        render_template(&self.template, skill_summaries)
    }
}

/// Render `template`, replacing `{skill_summaries}` and collapsing `{{`/`}}`.
/// Any other placeholder or a lone brace is an error.
pub fn render_template(template: &str, skill_summaries: &str) -> Result<String> {
    let mut out = String::with_capacity(template.len() + skill_summaries.len());
    let mut chars = template.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            '{' => {
                if chars.next_if(|&(_, n)| n == '{').is_some() {
                    out.push('{');
                    continue;
                }
                let rest = &template[pos + 1..];
                let Some(end) = rest.find('}') else {
                    return Err(SkilletError::Template(
                        "single '{' encountered in format string".into(),
                    ));
                };
                let name = &rest[..end];
                if name != SKILL_SUMMARIES {
                    return Err(SkilletError::Template(format!(
                        "unknown placeholder '{{{name}}}'"
                    )));
                }
                out.push_str(skill_summaries);
                // skip the name and the closing brace
                for _ in 0..=name.chars().count() {
                    chars.next();
                }
            }
            '}' => {
                if chars.next_if(|&(_, n)| n == '}').is_some() {
                    out.push('}');
                } else {
                    return Err(SkilletError::Template(
                        "single '}' encountered in format string".into(),
                    ));
                }
            }
            other => out.push(other),
        }
    }

    Ok(out)
}

/// Render `prompt` with the summaries of every skill in `registry`.
pub fn get_system_prompt(prompt: &SystemPrompt, registry: &SkillRegistry) -> Result<String> {
    prompt.render(&registry.skill_summaries())
}
