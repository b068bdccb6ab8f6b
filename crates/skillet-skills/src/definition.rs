use regex::Regex;
use serde::{Deserialize, Serialize};
use skillet_core::{Result, SkilletError};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Opening `---` line, the frontmatter block, then a closing `---` line that
/// must itself end in a newline.
static FRONTMATTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\A---\s*\n(.*?\n)---\s*\n").expect("frontmatter pattern is valid")
});

static NAME_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^name:\s*(.+)$").expect("name pattern is valid"));

static DESCRIPTION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^description:\s*(.+)$").expect("description pattern is valid")
});

pub const UNKNOWN_NAME: &str = "Unknown";
pub const NO_DESCRIPTION: &str = "No description";

/// A skill parsed from a SKILL.md file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillDefinition {
    /// Folder name; this is what `view_skill` takes.
    pub id: String,
    /// Display name from frontmatter, "Unknown" when absent.
    pub name: String,
    /// Short description shown in the system prompt.
    pub description: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub author: Option<String>,
    /// Markdown after the frontmatter.
    #[serde(skip)]
    pub body: String,
    /// Path to the SKILL.md file.
    #[serde(skip)]
    pub file_path: PathBuf,
}

impl SkillDefinition {
    /// Read and parse a SKILL.md. The skill ID is the name of its folder.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let id = path
            .parent()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let mut def = Self::parse(&id, &content)?;
        def.file_path = path.to_path_buf();
        Ok(def)
    }

    /// Parse SKILL.md content for the skill `id`.
    pub fn parse(id: &str, content: &str) -> Result<Self> {
        let caps = FRONTMATTER
            .captures(content)
            .ok_or_else(|| SkilletError::Skill("No frontmatter found in SKILL.md".into()))?;
        let frontmatter = caps.get(1).map_or("", |m| m.as_str());
        let body_start = caps.get(0).map_or(0, |m| m.end());

        let name = NAME_LINE
            .captures(frontmatter)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_else(|| UNKNOWN_NAME.to_string());
        let description = DESCRIPTION_LINE
            .captures(frontmatter)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_else(|| NO_DESCRIPTION.to_string());

        let mut def = SkillDefinition {
            id: id.to_string(),
            name,
            description,
            version: None,
            tags: vec![],
            author: None,
            body: content[body_start..].to_string(),
            file_path: PathBuf::new(),
        };
        parse_extra_keys(frontmatter, &mut def);
        Ok(def)
    }
}

/// Content with its leading frontmatter removed. Content without frontmatter
/// is returned unchanged.
pub fn strip_frontmatter(content: &str) -> &str {
    match FRONTMATTER.find(content) {
        Some(m) => &content[m.end()..],
        None => content,
    }
}

/// Optional keys: version, tags, author.
fn parse_extra_keys(yaml: &str, def: &mut SkillDefinition) {
    for line in yaml.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some((key, value)) = line.split_once(':') {
            let value = value.trim();
            match key.trim() {
                "version" => def.version = Some(unquote(value)),
                "author" => def.author = Some(unquote(value)),
                "tags" => {
                    // Parse [tag1, tag2] or tag1, tag2
                    let inner = value.trim_start_matches('[').trim_end_matches(']');
                    def.tags = inner
                        .split(',')
                        .map(|t| unquote(t.trim()))
                        .filter(|t| !t.is_empty())
                        .collect();
                }
                _ => {}
            }
        }
    }
}

/// Remove surrounding quotes from a YAML value.
fn unquote(s: &str) -> String {
    let s = s.trim();
    if s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')))
    {
        s[1..s.len() - 1].to_string()
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_skill_md() {
        let content = r#"---
name: PDF Processing
description: Extract text and tables from PDFs
version: 2.0.0
tags: [documents, "pdf"]
author: Docs Team
---

# PDF Processing

## Instructions
1. Run pdftotext
"#;
        let def = SkillDefinition::parse("pdf", content).unwrap();

        assert_eq!(def.id, "pdf");
        assert_eq!(def.name, "PDF Processing");
        assert_eq!(def.description, "Extract text and tables from PDFs");
        assert_eq!(def.version.as_deref(), Some("2.0.0"));
        assert_eq!(def.tags, vec!["documents", "pdf"]);
        assert_eq!(def.author.as_deref(), Some("Docs Team"));
        // trailing blank lines after the fence are consumed with it
        assert!(def.body.starts_with("# PDF Processing"));
    }

    #[test]
    fn missing_keys_use_placeholders() {
        let def = SkillDefinition::parse("bare", "---\nversion: 1\n---\nBody").unwrap();
        assert_eq!(def.name, UNKNOWN_NAME);
        assert_eq!(def.description, NO_DESCRIPTION);
        assert_eq!(def.body, "Body");
    }

    #[test]
    fn values_are_trimmed() {
        let def =
            SkillDefinition::parse("x", "---\nname:   Spaced Out   \ndescription:\tTabbed\n---\n")
                .unwrap();
        assert_eq!(def.name, "Spaced Out");
        assert_eq!(def.description, "Tabbed");
    }

    #[test]
    fn missing_frontmatter_errors() {
        let err = SkillDefinition::parse("x", "# No frontmatter\nJust markdown.").unwrap_err();
        assert!(err.to_string().contains("No frontmatter found in SKILL.md"));
    }

    #[test]
    fn closing_fence_needs_newline() {
        assert!(SkillDefinition::parse("x", "---\nname: a\n---").is_err());
        assert!(SkillDefinition::parse("x", "---\nname: a\n---\n").is_ok());
    }

    #[test]
    fn frontmatter_must_start_the_file() {
        assert!(SkillDefinition::parse("x", "\n---\nname: a\n---\n").is_err());
    }

    #[test]
    fn strip_frontmatter_only_when_present() {
        assert_eq!(strip_frontmatter("---\nname: a\n---\nHello"), "Hello");
        assert_eq!(strip_frontmatter("Hello\n---\n"), "Hello\n---\n");
    }
}
