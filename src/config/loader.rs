use super::models::Config;
use crate::types::ProxyError;
use crate::types::Result;
use regex::{Captures, Regex};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = fs::read_to_string(path.as_ref())
        .map_err(|e| ProxyError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&content, is_json(path.as_ref()))
}

/// Parses config text (YAML unless `json` is set) and validates it.
pub fn parse_config(content: &str, json: bool) -> Result<Config> {
    // Expand environment variables
    let expanded = expand_env_vars(content);

    let config: Config = if json {
        serde_json::from_str(&expanded)
            .map_err(|e| ProxyError::Config(format!("Failed to parse JSON config: {}", e)))?
    } else {
        serde_yaml::from_str(&expanded)
            .map_err(|e| ProxyError::Config(format!("Failed to parse YAML config: {}", e)))?
    };

    config
        .validate()
        .map_err(|e| ProxyError::Config(format!("Invalid configuration: {}", e)))?;

    Ok(config)
}

fn is_json(path: &Path) -> bool {
    path.extension().and_then(|s| s.to_str()) == Some("json")
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Match ${VAR_NAME} or ${VAR_NAME:-default}
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(:-([^}]*))?\}")
            .expect("environment variable pattern is a valid regex")
    })
}

fn expand_env_vars(content: &str) -> String {
    env_var_pattern()
        .replace_all(content, |cap: &Captures| {
            let var_name = &cap[1];
            let default_value = cap.get(3).map(|m| m.as_str());

            std::env::var(var_name)
                .ok()
                .or_else(|| default_value.map(|s| s.to_string()))
                .unwrap_or_else(|| {
                    tracing::warn!(
                        "Environment variable '{}' not found and no default provided",
                        var_name
                    );
                    String::new()
                })
        })
        .into_owned()
}
