//! `glob_search` and `grep_search`, sandboxed to one root directory.
//!
//! The model addresses files by virtual path: `/` is the root, and nothing
//! outside it can be reached. Results are reported back as virtual paths.

use async_trait::async_trait;
use glob::{MatchOptions, Pattern};
use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use skillet_core::{Result, SkilletError, Tool, ToolCall, ToolExecutor, ToolResult};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;
use walkdir::WalkDir;

pub const GLOB_TOOL: &str = "glob_search";
pub const GREP_TOOL: &str = "grep_search";

const NO_FILES: &str = "No files found";
const NO_MATCHES: &str = "No matches found";

const GLOB_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

#[derive(Debug, Deserialize)]
struct GlobInput {
    pattern: String,
    #[serde(default = "default_path")]
    path: String,
}

#[derive(Debug, Deserialize)]
struct GrepInput {
    pattern: String,
    #[serde(default = "default_path")]
    path: String,
    #[serde(default)]
    include: Option<String>,
    #[serde(default)]
    output_mode: Option<String>,
}

fn default_path() -> String {
    "/".into()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    FilesWithMatches,
    Content,
    Count,
}

impl OutputMode {
    pub fn parse(mode: &str) -> Option<Self> {
        match mode {
            "files_with_matches" => Some(Self::FilesWithMatches),
            "content" => Some(Self::Content),
            "count" => Some(Self::Count),
            _ => None,
        }
    }
}

/// File search over a root directory.
#[derive(Debug, Clone)]
pub struct FileSearchTools {
    root: PathBuf,
    max_results: usize,
    max_file_size: u64,
}

impl FileSearchTools {
    /// `root` is canonicalized when it exists so containment checks compare
    /// like with like.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let root = root.canonicalize().unwrap_or(root);
        Self {
            root,
            max_results: 200,
            max_file_size: 10 * 1024 * 1024,
        }
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_max_file_size_mb(mut self, mb: u64) -> Self {
        self.max_file_size = mb * 1024 * 1024;
        self
    }

    pub fn from_config(config: &skillet_config::schema::FileSearchConfig) -> Self {
        Self::new(&config.root)
            .with_max_results(config.max_results)
            .with_max_file_size_mb(config.max_file_size_mb)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a virtual path onto the filesystem.
    pub fn resolve(&self, virtual_path: &str) -> std::result::Result<PathBuf, String> {
        let vpath = if virtual_path.starts_with('/') {
            virtual_path.to_string()
        } else {
            format!("/{virtual_path}")
        };
        if vpath.contains("..") || vpath.contains('~') {
            return Err("Path traversal not allowed".into());
        }

        let full = self.root.join(vpath.trim_start_matches('/'));
        // Symlinks may still point outside; check the real location if there is one.
        let real = full.canonicalize().unwrap_or_else(|_| full.clone());
        if !real.starts_with(&self.root) {
            return Err(format!(
                "Path {} is outside root directory {}",
                vpath,
                self.root.display()
            ));
        }
        Ok(full)
    }

    fn to_virtual(&self, path: &Path) -> String {
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        let parts: Vec<_> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        format!("/{}", parts.join("/"))
    }

    /// Files under `path` matching `pattern`, newest first.
    pub fn glob(&self, pattern: &str, path: &str) -> std::result::Result<String, String> {
        let base = self.resolve(path)?;
        let pattern = pattern.trim_start_matches('/');
        let compiled = Pattern::new(pattern).map_err(|e| format!("Invalid glob pattern: {e}"))?;

        if !base.is_dir() {
            return Ok(NO_FILES.into());
        }

        let mut matches: Vec<(String, SystemTime)> = WalkDir::new(&base)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                e.path()
                    .strip_prefix(&base)
                    .map(|rel| compiled.matches_path_with(rel, GLOB_OPTIONS))
                    .unwrap_or(false)
            })
            .map(|e| {
                let mtime = e
                    .metadata()
                    .ok()
                    .and_then(|m| m.modified().ok())
                    .unwrap_or(SystemTime::UNIX_EPOCH);
                (self.to_virtual(e.path()), mtime)
            })
            .collect();

        if matches.is_empty() {
            return Ok(NO_FILES.into());
        }

        matches.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        matches.truncate(self.max_results);
        debug!(pattern, found = matches.len(), "glob search");
        Ok(matches
            .into_iter()
            .map(|(p, _)| p)
            .collect::<Vec<_>>()
            .join("\n"))
    }

    /// Search file contents under `path` for `pattern`.
    pub fn grep(
        &self,
        pattern: &str,
        path: &str,
        include: Option<&str>,
        mode: &str,
    ) -> std::result::Result<String, String> {
        let Some(mode) = OutputMode::parse(mode) else {
            return Err(format!("Invalid output_mode: {mode}"));
        };
        let regex = Regex::new(pattern).map_err(|e| format!("Invalid regex pattern: {e}"))?;
        let filters = match include {
            Some(glob) => expand_braces(glob)
                .iter()
                .map(|g| Pattern::new(g).map_err(|e| format!("Invalid glob pattern: {e}")))
                .collect::<std::result::Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };
        let base = self.resolve(path)?;

        let mut lines = Vec::new();
        let walker = WalkDir::new(&base)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file());

        for entry in walker {
            if lines.len() >= self.max_results {
                break;
            }
            let name = entry.file_name().to_string_lossy();
            if !filters.is_empty() && !filters.iter().any(|f| f.matches(&name)) {
                continue;
            }
            if entry.metadata().map(|m| m.len() > self.max_file_size).unwrap_or(true) {
                continue;
            }
            let Ok(bytes) = std::fs::read(entry.path()) else {
                continue;
            };
            let Ok(text) = String::from_utf8(bytes) else {
                continue;
            };

            let vpath = self.to_virtual(entry.path());
            match mode {
                OutputMode::FilesWithMatches => {
                    if text.lines().any(|l| regex.is_match(l)) {
                        lines.push(vpath);
                    }
                }
                OutputMode::Count => {
                    let n = text.lines().filter(|l| regex.is_match(l)).count();
                    if n > 0 {
                        lines.push(format!("{vpath}:{n}"));
                    }
                }
                OutputMode::Content => {
                    for (i, line) in text.lines().enumerate() {
                        if regex.is_match(line) {
                            lines.push(format!("{vpath}:{}:{line}", i + 1));
                        }
                    }
                }
            }
        }

        if lines.is_empty() {
            return Ok(NO_MATCHES.into());
        }
        lines.truncate(self.max_results);
        Ok(lines.join("\n"))
    }
}

/// Expand `{a,b}` alternations, which `glob::Pattern` does not support.
pub fn expand_braces(pattern: &str) -> Vec<String> {
    let Some(open) = pattern.find('{') else {
        return vec![pattern.to_string()];
    };
    let Some(close) = pattern[open..].find('}').map(|c| open + c) else {
        return vec![pattern.to_string()];
    };
    let (prefix, rest) = (&pattern[..open], &pattern[close + 1..]);
    pattern[open + 1..close]
        .split(',')
        .flat_map(|alt| expand_braces(&format!("{prefix}{alt}{rest}")))
        .collect()
}

fn into_result(call: &ToolCall, outcome: std::result::Result<String, String>) -> ToolResult {
    match outcome {
        Ok(text) => ToolResult::ok(&call.id, text),
        Err(e) => ToolResult::error(&call.id, e),
    }
}

#[async_trait]
impl ToolExecutor for FileSearchTools {
    fn tools(&self) -> Vec<Tool> {
        vec![
            Tool {
                name: GLOB_TOOL.into(),
                description: "Find files by glob pattern. `*` matches within one directory, \
                    `**` spans directories (e.g. \"**/*.py\", \"src/*.rs\"). Returns virtual \
                    paths (\"/\" is the search root) sorted by modification time, newest first."
                    .into(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "pattern": {"type": "string", "description": "Glob pattern to match files against"},
                        "path": {"type": "string", "description": "Directory to search in (default \"/\")"}
                    },
                    "required": ["pattern"]
                }),
                is_mutating: false,
            },
            Tool {
                name: GREP_TOOL.into(),
                description: "Search file contents with a regular expression. output_mode is \
                    \"files_with_matches\" (default), \"content\" (path:line:text) or \"count\" \
                    (path:n). `include` filters file names, e.g. \"*.py\" or \"*.{ts,tsx}\"."
                    .into(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "pattern": {"type": "string", "description": "Regex pattern to search for"},
                        "path": {"type": "string", "description": "Directory to search in (default \"/\")"},
                        "include": {"type": "string", "description": "File name glob filter"},
                        "output_mode": {
                            "type": "string",
                            "enum": ["files_with_matches", "content", "count"],
                            "default": "files_with_matches"
                        }
                    },
                    "required": ["pattern"]
                }),
                is_mutating: false,
            },
        ]
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
        let this = self.clone();
        let tool = call.tool_name.clone();
        let args = call.arguments.clone();

        let outcome = tokio::task::spawn_blocking(move || match tool.as_str() {
            GLOB_TOOL => {
                let input: GlobInput = serde_json::from_value(args)
                    .map_err(|e| format!("Invalid input: {e}"))?;
                this.glob(&input.pattern, &input.path)
            }
            GREP_TOOL => {
                let input: GrepInput = serde_json::from_value(args)
                    .map_err(|e| format!("Invalid input: {e}"))?;
                this.grep(
                    &input.pattern,
                    &input.path,
                    input.include.as_deref(),
                    input.output_mode.as_deref().unwrap_or("files_with_matches"),
                )
            }
            other => Err(format!("unknown file search tool '{other}'")),
        })
        .await
        .map_err(|e| SkilletError::tool(&call.tool_name, e))?;

        Ok(into_result(call, outcome))
    }
}
