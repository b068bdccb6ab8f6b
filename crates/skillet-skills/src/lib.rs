//! # skillet-skills
//!
//! Skills are prompt-injected instructions that teach the model how to use its
//! tools for specific workflows. Each skill is a directory containing a
//! `SKILL.md` file (Markdown with YAML frontmatter) and, optionally, reference
//! files the skill body points at.
//!
//! ## SKILL.md Format
//!
//! ```markdown
//! ---
//! name: PDF Processing
//! description: Extract text and tables from PDF files
//! ---
//!
//! # PDF Processing
//!
//! 1. Use `bash` to run `pdftotext` on the file
//! 2. For forms, read `view_skill(skill_id="pdf", file="forms.md")`
//! ```
//!
//! ## How skills work
//!
//! 1. At startup, the registry finds `<dir>/*/SKILL.md`; the folder name is the skill ID
//! 2. Names, IDs and descriptions are rendered into the system prompt
//! 3. When a skill applies, the model calls `view_skill` to read its body
//! 4. The model follows the instructions using its other tools

pub mod definition;
pub mod registry;

pub use definition::SkillDefinition;
pub use registry::SkillRegistry;
