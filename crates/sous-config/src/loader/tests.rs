//! Tests for layered configuration loading.

use super::*;
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Write JSON5 contents to a path, creating parent directories if needed.
fn write_json5(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("dir");
    }
    fs::write(path, contents).expect("write");
}

/// Project tree with a `.git` marker and a nested cwd.
fn project_tree(temp: &TempDir) -> (PathBuf, PathBuf) {
    let project_root = temp.path().join("project");
    fs::create_dir_all(project_root.join(".git")).expect("git");
    let cwd = project_root.join("subdir");
    fs::create_dir_all(&cwd).expect("cwd");
    (project_root, cwd)
}

#[test]
fn parse_minimal_config() {
    let config = SousConfig::load_from_str("{}").expect("config");
    assert_eq!(config.model.name, "llama3.1");
    assert_eq!(config.tool_host.timeout_secs, 180);
}

#[test]
fn parse_json5_with_comments() {
    let json5 = r#"{
        // local model
        model: { name: "qwen2.5", endpoint: "http://gpu-box:11434/api/chat" },
        orchestrator: { max_steps: 5 },
        tool_host: { command: "/usr/local/bin/sous", args: ["tool-server"], env: { RUST_LOG: "debug" } },
    }"#;
    let config = SousConfig::load_from_str(json5).expect("config");
    assert_eq!(config.model.name, "qwen2.5");
    assert_eq!(config.orchestrator.max_steps, 5);
    assert_eq!(config.tool_host.command.as_deref(), Some("/usr/local/bin/sous"));
    assert_eq!(
        config.tool_host.env.get("RUST_LOG").map(String::as_str),
        Some("debug")
    );
}

#[test]
fn rejects_unknown_top_level_key() {
    let err = SousConfig::load_from_str("{ unexpected: true }").unwrap_err();
    assert_eq!(
        format!("{err}"),
        "invalid config at config:unexpected: unknown key"
    );
}

#[test]
fn rejects_wrong_field_type() {
    let err = SousConfig::load_from_str(r#"{ orchestrator: { max_steps: "many" } }"#).unwrap_err();
    assert!(format!("{err}").contains("orchestrator.max_steps"));

    let err = SousConfig::load_from_str(r#"{ tool_host: { args: ["ok", 3] } }"#).unwrap_err();
    assert!(format!("{err}").contains("tool_host.args[1]"));
}

#[test]
fn rejects_non_http_endpoint() {
    let err = SousConfig::load_from_str(r#"{ model: { endpoint: "localhost:11434" } }"#)
        .unwrap_err();
    assert!(format!("{err}").contains("model.endpoint"));
}

#[test]
fn rejects_zero_step_ceiling() {
    let err = SousConfig::load_from_str("{ orchestrator: { max_steps: 0 } }").unwrap_err();
    assert!(matches!(err, ConfigError::ZeroStepCeiling));
}

#[test]
fn each_invariant_has_its_own_error() {
    let cases = [
        (r#"{ model: { name: " " } }"#, "model.name must not be empty"),
        (r#"{ model: { timeout_secs: 0 } }"#, "model.timeout_secs must be greater than zero"),
        (
            r#"{ tool_host: { timeout_secs: 0 } }"#,
            "tool_host.timeout_secs must be greater than zero",
        ),
        (r#"{ tool_host: { command: "  " } }"#, "tool_host.command is set but blank"),
    ];
    for (source, expected) in cases {
        let err = SousConfig::load_from_str(source).unwrap_err();
        assert_eq!(format!("{err}"), expected, "{source}");
    }

    let err = SousConfig::load_from_str(r#"{ tool_host: { command: "" } }"#).unwrap_err();
    assert!(matches!(err, ConfigError::BlankToolHostCommand));
    // A blank endpoint never reaches validate(); the schema wants a URL.
    let err = SousConfig::load_from_str(r#"{ model: { endpoint: "" } }"#).unwrap_err();
    assert!(matches!(err, ConfigError::Schema { ref key, .. } if key == "model.endpoint"));
}

#[test]
fn malformed_json5_names_the_layer() {
    let err = SousConfig::load_from_str("{ model: ").unwrap_err();
    assert!(matches!(err, ConfigError::Syntax { ref layer, .. } if layer == "config"));
    assert!(format!("{err}").starts_with("config is not valid JSON5: "));
}

#[test]
fn layered_config_prefers_repo_over_cwd() {
    let temp = TempDir::new().expect("tmp");
    let (project_root, cwd) = project_tree(&temp);

    let user_config = temp.path().join("user.json5");
    write_json5(&user_config, r#"{ model: { name: "user", timeout_secs: 30 } }"#);
    write_json5(
        &project_root.join(DEFAULT_CONFIG_FILE),
        r#"{ model: { name: "project" } }"#,
    );
    write_json5(&cwd.join(DEFAULT_CONFIG_FILE), r#"{ model: { name: "cwd" } }"#);
    write_json5(
        &project_root
            .join(DEFAULT_CONFIG_DIR)
            .join(DEFAULT_CONFIG_FILE),
        r#"{ model: { name: "repo" } }"#,
    );

    let mut options = LayeredConfigOptions::new(&cwd);
    options.user_config_path = Some(user_config);

    let layered = SousConfig::load_layered_with_options(options).expect("layered");
    assert_eq!(layered.config.model.name, "repo");
    assert_eq!(layered.config.model.timeout_secs, 30);
    let sources: Vec<_> = layered.layers.iter().map(|layer| layer.source).collect();
    assert_eq!(
        sources,
        vec![
            ConfigLayerSource::User,
            ConfigLayerSource::Project,
            ConfigLayerSource::Cwd,
            ConfigLayerSource::Repo,
        ]
    );
}

#[test]
fn runtime_override_wins() {
    let temp = TempDir::new().expect("tmp");
    let (project_root, _) = project_tree(&temp);
    write_json5(
        &project_root.join(DEFAULT_CONFIG_FILE),
        r#"{ store: { path: "project.db" } }"#,
    );
    let runtime_config = temp.path().join("runtime.json5");
    write_json5(&runtime_config, r#"{ store: { path: "runtime.db" } }"#);

    let mut options = LayeredConfigOptions::new(&project_root).with_runtime_path(&runtime_config);
    options.user_config_path = None;

    let layered = SousConfig::load_layered_with_options(options).expect("layered");
    assert_eq!(layered.config.store.path, "runtime.db");
}

#[test]
fn project_root_cwd_layer_is_loaded_once() {
    let temp = TempDir::new().expect("tmp");
    let (project_root, _) = project_tree(&temp);
    write_json5(
        &project_root.join(DEFAULT_CONFIG_FILE),
        r#"{ server: { bind: "0.0.0.0:9000" } }"#,
    );

    let mut options = LayeredConfigOptions::new(&project_root);
    options.user_config_path = None;

    let layered = SousConfig::load_layered_with_options(options).expect("layered");
    assert_eq!(layered.layers.len(), 1);
    assert_eq!(layered.config.server.bind, "0.0.0.0:9000");
}

#[test]
fn invalid_layer_names_its_source() {
    let temp = TempDir::new().expect("tmp");
    let (_, cwd) = project_tree(&temp);
    write_json5(&cwd.join(DEFAULT_CONFIG_FILE), r#"{ store: { dir: "x" } }"#);

    let mut options = LayeredConfigOptions::new(&cwd);
    options.user_config_path = None;

    let err = SousConfig::load_layered_with_options(options).unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("cwd("), "{msg}");
    assert!(msg.contains("store.dir: unknown key"), "{msg}");
}

#[test]
fn missing_runtime_layer_is_an_error() {
    let temp = TempDir::new().expect("tmp");
    let mut options = LayeredConfigOptions::new(temp.path())
        .with_runtime_path(temp.path().join("missing.json5"));
    options.user_config_path = None;

    let err = SousConfig::load_layered_with_options(options).unwrap_err();
    assert!(matches!(err, ConfigError::Read { ref path, .. } if path.ends_with("missing.json5")));
}

#[test]
fn overrides_replace_model_and_store() {
    let vars: HashMap<&str, &str> = HashMap::from([
        (ENV_MODEL, "mistral"),
        (ENV_OLLAMA_URL, "http://10.0.0.2:11434/api/chat"),
        (ENV_DB_PATH, "  "),
    ]);
    let mut config = SousConfig::default();
    config
        .apply_overrides_from(|key| vars.get(key).map(|value| value.to_string()))
        .expect("overrides");
    assert_eq!(config.model.name, "mistral");
    assert_eq!(config.model.endpoint, "http://10.0.0.2:11434/api/chat");
    assert_eq!(config.store.path, "data/recipes.db");
}
