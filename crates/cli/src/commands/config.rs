use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use leadflow_core::config::{AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key_path, value) in effective_values(&config) {
        let source = field_source(
            key_path,
            &env_key(key_path),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(key_path, &value, source));
    }

    lines.join("\n")
}

fn effective_values(config: &AppConfig) -> Vec<(&'static str, String)> {
    let llm_api_key = if config.llm.api_key.is_some() { "<redacted>" } else { "<unset>" };

    vec![
        ("database.url", config.database.url.clone()),
        ("database.max_connections", config.database.max_connections.to_string()),
        ("database.timeout_secs", config.database.timeout_secs.to_string()),
        ("llm.enabled", config.llm.enabled.to_string()),
        ("llm.provider", config.llm.provider.to_string()),
        ("llm.model", config.llm.model.clone()),
        ("llm.base_url", optional(config.llm.base_url.as_deref())),
        ("llm.api_key", llm_api_key.to_string()),
        ("llm.timeout_secs", config.llm.timeout_secs.to_string()),
        ("search.base_url", optional(config.search.base_url.as_deref())),
        ("search.top_k", config.search.top_k.to_string()),
        ("search.timeout_ms", config.search.timeout_ms.to_string()),
        ("dialogue.company_name", config.dialogue.company_name.clone()),
        ("dialogue.consultant_name", config.dialogue.consultant_name.clone()),
        ("dialogue.portfolio_url", config.dialogue.portfolio_url.clone()),
        ("dialogue.office_address", optional(config.dialogue.office_address.as_deref())),
        ("dialogue.phone_cooldown_turns", config.dialogue.phone_cooldown_turns.to_string()),
        ("dialogue.phone_max_attempts", config.dialogue.phone_max_attempts.to_string()),
        ("dialogue.field_cooldown_turns", config.dialogue.field_cooldown_turns.to_string()),
        ("server.bind_address", config.server.bind_address.clone()),
        ("server.port", config.server.port.to_string()),
        ("logging.level", config.logging.level.clone()),
        ("logging.format", format!("{:?}", config.logging.format)),
    ]
}

fn optional(value: Option<&str>) -> String {
    value.unwrap_or("<unset>").to_string()
}

/// `dialogue.company_name` -> `LEADFLOW_DIALOGUE_COMPANY_NAME`
fn env_key(key_path: &str) -> String {
    format!("LEADFLOW_{}", key_path.replace('.', "_").to_ascii_uppercase())
}

fn detect_config_path() -> Option<PathBuf> {
    ["leadflow.toml", "config/leadflow.toml"].into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: &str,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if env::var_os(env_key).is_some() {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

#[cfg(test)]
mod tests {
    use super::{contains_path, env_key};

    #[test]
    fn env_keys_follow_the_key_path() {
        assert_eq!(env_key("dialogue.phone_max_attempts"), "LEADFLOW_DIALOGUE_PHONE_MAX_ATTEMPTS");
        assert_eq!(env_key("llm.api_key"), "LEADFLOW_LLM_API_KEY");
    }

    #[test]
    fn nested_paths_are_found_in_the_file() {
        let doc: toml::Value = "[dialogue]\ncompany_name = \"Acme\"\n".parse().expect("toml");

        assert!(contains_path(&doc, "dialogue.company_name"));
        assert!(!contains_path(&doc, "dialogue.portfolio_url"));
        assert!(!contains_path(&doc, "llm.model"));
    }
}
