use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

use crate::definition::{SkillDefinition, strip_frontmatter};

/// Name of the entry file every skill folder must contain.
pub const SKILL_FILE: &str = "SKILL.md";

/// The skill registry: discovers skill folders and serves their files.
///
/// Only the location of each SKILL.md is cached. Summaries and file contents
/// are read from disk on every call, so edits to a skill show up without a
/// restart and one broken skill cannot hide the others.
pub struct SkillRegistry {
    /// Skill ID (folder name) -> path of its SKILL.md, kept sorted by ID.
    skills: BTreeMap<String, PathBuf>,
    skills_dir: PathBuf,
}

impl SkillRegistry {
    /// Create an empty registry rooted at `skills_dir`. Call [`discover`](Self::discover) to populate it.
    pub fn new(skills_dir: impl Into<PathBuf>) -> Self {
        Self {
            skills: BTreeMap::new(),
            skills_dir: skills_dir.into(),
        }
    }

    /// Create and populate a registry in one step.
    pub fn discover_in(skills_dir: impl Into<PathBuf>) -> skillet_core::Result<Self> {
        let mut reg = Self::new(skills_dir);
        reg.discover()?;
        Ok(reg)
    }

    /// Find every `<skills_dir>/*/SKILL.md`. A missing directory is not an error.
    pub fn discover(&mut self) -> skillet_core::Result<Vec<String>> {
        let mut loaded = Vec::new();
        let dir = self.skills_dir.clone();

        if !dir.exists() {
            debug!(?dir, "skills directory does not exist, skipping");
            return Ok(loaded);
        }

        let entries = std::fs::read_dir(&dir).map_err(|e| {
            skillet_core::SkilletError::Skill(format!(
                "failed to read skills dir {}: {}",
                dir.display(),
                e
            ))
        })?;

        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let skill_md = path.join(SKILL_FILE);
            if !skill_md.is_file() {
                continue;
            }
            let id = entry.file_name().to_string_lossy().to_string();
            info!(skill = %id, path = ?skill_md, "discovered skill");
            loaded.push(id.clone());
            self.skills.insert(id, skill_md);
        }

        loaded.sort();
        Ok(loaded)
    }

    /// All skill IDs, sorted.
    pub fn list_skills(&self) -> Vec<String> {
        self.skills.keys().cloned().collect()
    }

    pub fn count(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    pub fn contains(&self, skill_id: &str) -> bool {
        self.skills.contains_key(skill_id)
    }

    pub fn skills_dir(&self) -> &Path {
        &self.skills_dir
    }

    /// Parse a skill's SKILL.md.
    pub fn definition(&self, skill_id: &str) -> skillet_core::Result<SkillDefinition> {
        let path = self.skills.get(skill_id).ok_or_else(|| {
            skillet_core::SkilletError::Skill(format!("skill '{skill_id}' not found"))
        })?;
        SkillDefinition::from_file(path)
    }

    /// Markdown block listing every skill, substituted into the system prompt.
    ///
    /// ```text
    /// ## PDF Processing
    /// **ID**: `pdf`
    /// **Description**: Extract text and tables from PDFs
    ///
    /// ## ...
    /// ```
    pub fn skill_summaries(&self) -> String {
        if self.skills.is_empty() {
            return "No skills available.".to_string();
        }

        let mut lines = Vec::with_capacity(self.skills.len() * 3);
        for (id, path) in &self.skills {
            match SkillDefinition::from_file(path) {
                Ok(def) => {
                    lines.push(format!("## {}", def.name));
                    lines.push(format!("**ID**: `{id}`"));
                    lines.push(format!("**Description**: {}\n", def.description));
                }
                Err(e) => {
                    warn!(skill = %id, error = %e, "failed to load skill summary");
                    lines.push(format!("## {id}"));
                    lines.push(format!("**Error loading summary**: {}\n", summary_error(&e)));
                }
            }
        }
        lines.join("\n")
    }

    /// Read `file` from a skill folder. Failures come back as text the model
    /// can read rather than as errors.
    pub fn load_skill(&self, skill_id: &str, file: &str) -> String {
        let Some(skill_md) = self.skills.get(skill_id) else {
            let available = self.list_skills().join(", ");
            return format!("Error: Skill '{skill_id}' not found. Available skills: {available}");
        };

        let folder = skill_md.parent().unwrap_or(Path::new("."));
        let relative = Path::new(file);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        let path = folder.join(relative);
        if escapes || !path.is_file() {
            return format!("Error: File '{file}' not found in skill '{skill_id}'");
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => {
                debug!(skill = %skill_id, file, bytes = content.len(), "loaded skill file");
                if file == SKILL_FILE {
                    strip_frontmatter(&content).to_string()
                } else {
                    content
                }
            }
            Err(e) => format!("Error loading '{file}' from skill '{skill_id}': {e}"),
        }
    }
}

/// Skill errors carry a "skill error: " prefix that adds nothing in a summary.
fn summary_error(e: &skillet_core::SkilletError) -> String {
    match e {
        skillet_core::SkilletError::Skill(msg) => msg.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_skill(root: &Path, id: &str, content: &str) {
        let dir = root.join(id);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(SKILL_FILE), content).unwrap();
    }

    #[test]
    fn nonexistent_dir_is_fine() {
        let mut reg = SkillRegistry::new("/nonexistent/skills");
        let loaded = reg.discover().unwrap();
        assert!(loaded.is_empty());
        assert!(reg.is_empty());
        assert_eq!(reg.skill_summaries(), "No skills available.");
    }

    #[test]
    fn discover_ignores_folders_without_skill_md() {
        let dir = tempfile::tempdir().unwrap();
        write_skill(dir.path(), "beta", "---\nname: Beta\ndescription: b\n---\n");
        write_skill(dir.path(), "alpha", "---\nname: Alpha\ndescription: a\n---\n");
        std::fs::create_dir_all(dir.path().join("notes")).unwrap();
        std::fs::write(dir.path().join("notes").join("README.md"), "hi").unwrap();
        std::fs::write(dir.path().join(SKILL_FILE), "---\nname: Loose\n---\n").unwrap();

        let mut reg = SkillRegistry::new(dir.path());
        let loaded = reg.discover().unwrap();
        assert_eq!(loaded, vec!["alpha", "beta"]);
        assert_eq!(reg.list_skills(), vec!["alpha", "beta"]);
        assert!(!reg.contains("notes"));
    }

    #[test]
    fn definition_uses_folder_as_id() {
        let dir = tempfile::tempdir().unwrap();
        write_skill(dir.path(), "pdf", "---\nname: PDF Tools\ndescription: d\n---\nBody");
        let reg = SkillRegistry::discover_in(dir.path()).unwrap();
        let def = reg.definition("pdf").unwrap();
        assert_eq!(def.id, "pdf");
        assert_eq!(def.name, "PDF Tools");
        assert!(reg.definition("nope").is_err());
    }
}
