use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::schema::SkilletConfig;

/// Loads the Skillet configuration from disk plus environment.
pub struct ConfigLoader {
    config: SkilletConfig,
    config_path: PathBuf,
}

impl ConfigLoader {
    /// Resolve the config path:
    /// explicit path > SKILLET_CONFIG env > ./skillet.toml > ~/.skillet/skillet.toml
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        if let Some(p) = explicit {
            return p.to_path_buf();
        }
        if let Ok(p) = std::env::var("SKILLET_CONFIG") {
            return PathBuf::from(p);
        }
        let local = PathBuf::from("skillet.toml");
        if local.exists() {
            return local;
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".skillet")
            .join("skillet.toml")
    }

    /// Load `.env`, then the config file (falling back to defaults), then env overrides.
    pub fn load(path: Option<&Path>) -> skillet_core::Result<Self> {
        match dotenvy::dotenv() {
            Ok(env_path) => debug!(?env_path, "loaded .env"),
            Err(e) if e.not_found() => {}
            Err(e) => warn!(error = %e, "failed to read .env"),
        }

        let config_path = Self::resolve_path(path);
        let config = if config_path.exists() {
            info!(?config_path, "loading configuration");
            let raw = std::fs::read_to_string(&config_path)?;
            Self::parse(&raw).map_err(|e| {
                skillet_core::SkilletError::Config(format!(
                    "failed to parse {}: {}",
                    config_path.display(),
                    e
                ))
            })?
        } else {
            warn!(?config_path, "config file not found, using defaults");
            SkilletConfig::default()
        };

        // Apply environment variable overrides
        let config = Self::apply_env_overrides(config);

        // Validate config: log warnings, fail on errors
        match config.validate() {
            Ok(warnings) => {
                for w in &warnings {
                    warn!("{}", w);
                }
            }
            Err(e) => {
                return Err(skillet_core::SkilletError::Config(e));
            }
        }

        Ok(Self {
            config,
            config_path,
        })
    }

    /// Parse a TOML document into a config (no env overrides, no validation).
    pub fn parse(raw: &str) -> Result<SkilletConfig, toml::de::Error> {
        toml::from_str::<SkilletConfig>(raw)
    }

    /// Get a copy of the loaded config.
    pub fn get(&self) -> SkilletConfig {
        self.config.clone()
    }

    /// Path the config was resolved to (it may not exist).
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Apply env var overrides (SKILLET_MODEL, SKILL_DIR, AGENT_DB_PATH, etc.)
    pub fn apply_env_overrides(config: SkilletConfig) -> SkilletConfig {
        Self::apply_overrides_from(config, |key| std::env::var(key).ok())
    }

    /// Same as [`apply_env_overrides`](Self::apply_env_overrides) with an
    /// injectable lookup, so tests don't have to mutate the process environment.
    pub fn apply_overrides_from(
        mut config: SkilletConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> SkilletConfig {
        if let Some(v) = lookup("SKILLET_MODEL") {
            config.agent.model = v;
        }
        if let Some(v) = lookup("OLLAMA_HOST") {
            config.agent.ollama_url = normalize_ollama_host(&v);
        }
        if let Some(v) = lookup("SKILL_DIR") {
            config.skills.dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("AGENT_DB_PATH") {
            config.store.db_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("AGENT_USER_ID") {
            config.user.id = v;
        }
        if let Some(v) = lookup("SKILLET_LOG_LEVEL") {
            config.logging.level = v;
        }
        config
    }
}

/// `OLLAMA_HOST` is often given without a scheme (`0.0.0.0:11434`).
fn normalize_ollama_host(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_ollama_host() {
        assert_eq!(normalize_ollama_host("localhost:11434"), "http://localhost:11434");
        assert_eq!(normalize_ollama_host("https://ollama.lan/"), "https://ollama.lan");
    }
}
