#[cfg(test)]
mod tests {
    use skillet_config::schema::*;
    use skillet_config::ConfigLoader;
    use std::collections::HashMap;
    use std::io::Write;
    use std::path::PathBuf;

    // ── Default tests ──────────────────────────────────────────

    #[test]
    fn test_skillet_config_defaults() {
        let config = SkilletConfig::default();
        assert_eq!(config.agent.model, "qwen3:8b");
        assert_eq!(config.agent.ollama_url, "http://127.0.0.1:11434");
        assert_eq!(config.agent.temperature, 0.0);
        assert_eq!(config.agent.max_iterations, 25);
        assert!(config.agent.system_prompt_file.is_none());
    }

    #[test]
    fn test_tool_config_defaults() {
        let config = SkilletConfig::default();
        assert_eq!(config.bash.timeout_secs, 30);
        assert_eq!(config.data_analysis.timeout_secs, 60);
        assert_eq!(config.data_analysis.python, "python");
        assert!(!config.data_analysis.privacy_mode);
        assert_eq!(config.file_search.max_file_size_mb, 10);
        assert_eq!(config.approval.interrupt_on, vec!["bash".to_string()]);
        assert!(!config.approval.auto_approve);
    }

    #[test]
    fn test_store_and_user_defaults() {
        let config = SkilletConfig::default();
        assert_eq!(config.store.db_path, PathBuf::from("data/agent.db"));
        assert_eq!(config.user.id, "cli_user");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "pretty");
    }

    // ── TOML tests ─────────────────────────────────────────────

    #[test]
    fn test_config_toml_roundtrip() {
        let config = SkilletConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let restored: SkilletConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(restored.agent.model, config.agent.model);
        assert_eq!(restored.skills.dir, config.skills.dir);
        assert_eq!(restored.bash.timeout_secs, config.bash.timeout_secs);
    }

    #[test]
    fn test_partial_toml_applies_defaults() {
        let toml_str = r#"
[agent]
model = "llama3.2"

[data_analysis]
privacy_mode = true
"#;
        let config = ConfigLoader::parse(toml_str).unwrap();
        assert_eq!(config.agent.model, "llama3.2");
        assert!(config.data_analysis.privacy_mode);
        // Defaults should fill in
        assert_eq!(config.agent.max_iterations, 25);
        assert_eq!(config.data_analysis.timeout_secs, 60);
        assert_eq!(config.user.id, "cli_user");
    }

    #[test]
    fn test_parse_rejects_wrong_types() {
        let err = ConfigLoader::parse("[bash]\ntimeout_secs = \"soon\"\n");
        assert!(err.is_err());
    }

    // ── Env override tests ─────────────────────────────────────

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("SKILLET_MODEL", "mistral"),
            ("OLLAMA_HOST", "10.0.0.5:11434"),
            ("SKILL_DIR", "/opt/skills"),
            ("AGENT_DB_PATH", "/tmp/x.db"),
            ("AGENT_USER_ID", "alice"),
        ]
        .into_iter()
        .collect();
        let config = ConfigLoader::apply_overrides_from(SkilletConfig::default(), |k| {
            env.get(k).map(|v| v.to_string())
        });
        assert_eq!(config.agent.model, "mistral");
        assert_eq!(config.agent.ollama_url, "http://10.0.0.5:11434");
        assert_eq!(config.skills.dir, PathBuf::from("/opt/skills"));
        assert_eq!(config.store.db_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.user.id, "alice");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_env_overrides_absent_keep_file_values() {
        let mut base = SkilletConfig::default();
        base.user.id = "bob".into();
        let config = ConfigLoader::apply_overrides_from(base, |_| None);
        assert_eq!(config.user.id, "bob");
    }

    // ── Validation tests ───────────────────────────────────────

    #[test]
    fn test_validate_temperature_out_of_range() {
        let mut config = SkilletConfig::default();
        config.agent.temperature = 3.5;
        let err = config.validate().unwrap_err();
        assert!(err.contains("agent.temperature"));
    }

    #[test]
    fn test_validate_zero_timeout_is_error() {
        let mut config = SkilletConfig::default();
        config.bash.timeout_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.contains("bash.timeout_secs"));
    }

    #[test]
    fn test_validate_missing_skills_dir_is_warning() {
        let mut config = SkilletConfig::default();
        config.skills.dir = PathBuf::from("/no/such/skills/dir");
        let warnings = config.validate().unwrap();
        assert!(warnings
            .iter()
            .any(|w| w.field == "skills.dir" && w.severity == WarningSeverity::Warning));
    }

    #[test]
    fn test_warning_display_has_hint() {
        let w = ConfigWarning {
            field: "logging.format".into(),
            message: "unknown log format 'xml'".into(),
            severity: WarningSeverity::Warning,
            hint: Some("Valid values: pretty, json".into()),
        };
        let s = w.to_string();
        assert!(s.contains("logging.format"));
        assert!(s.contains("↳ Valid values"));
    }

    // ── Loader tests ───────────────────────────────────────────

    #[test]
    fn test_resolve_explicit_path_wins() {
        let p = PathBuf::from("/etc/skillet/custom.toml");
        assert_eq!(ConfigLoader::resolve_path(Some(&p)), p);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skillet.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "[skills]\ndir = \"{}\"", dir.path().display()).unwrap();
        writeln!(f, "[bash]\ntimeout_secs = 5").unwrap();

        let loader = ConfigLoader::load(Some(&path)).unwrap();
        assert_eq!(loader.path(), path.as_path());
        assert_eq!(loader.get().bash.timeout_secs, 5);
    }

    #[test]
    fn test_load_invalid_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skillet.toml");
        std::fs::write(&path, "[agent]\ntemperature = 9.0\n").unwrap();
        assert!(ConfigLoader::load(Some(&path)).is_err());
    }
}
