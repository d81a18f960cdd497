use std::env;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILENAME: &str = "config.json";
pub const DEFAULT_USER_AGENT: &str = concat!("md2discourse/", env!("CARGO_PKG_VERSION"));

/// Credentials and base URL for one Discourse forum.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct DiscourseConfig {
    #[serde(rename = "discourse_api_key")]
    pub api_key: String,
    #[serde(rename = "discourse_api_username")]
    pub api_username: String,
    #[serde(rename = "discourse_url")]
    pub url: String,
}

impl DiscourseConfig {
    /// Base URL without a trailing slash, ready for `{base}/site.json` style joins.
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    fn apply_env_overrides(&mut self) {
        if let Some(value) = env_override("DISCOURSE_API_KEY") {
            self.api_key = value;
        }
        if let Some(value) = env_override("DISCOURSE_API_USERNAME") {
            self.api_username = value;
        }
        if let Some(value) = env_override("DISCOURSE_URL") {
            self.url = value;
        }
    }
}

/// Load the JSON config at `config_path`, then let `DISCOURSE_*` env vars override
/// individual keys. Unlike most lookups in this crate a missing file is fatal.
pub fn load_config(config_path: &Path) -> Result<DiscourseConfig> {
    if !config_path.is_file() {
        bail!("Configuration file '{}' not found.", config_path.display());
    }
    let content = fs::read_to_string(config_path)
        .with_context(|| format!("failed to read {}", config_path.display()))?;
    let mut parsed = parse_config(&content)
        .with_context(|| format!("failed to parse {}", config_path.display()))?;
    parsed.apply_env_overrides();
    if parsed.base_url().trim().is_empty() {
        bail!("discourse_url is empty in {}", config_path.display());
    }
    Ok(parsed)
}

fn parse_config(content: &str) -> Result<DiscourseConfig> {
    let parsed: DiscourseConfig = serde_json::from_str(content)?;
    Ok(parsed)
}

fn env_override(key: &str) -> Option<String> {
    let value = env::var(key).ok()?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn load_config_reports_missing_file() {
        let error = load_config(Path::new("/nonexistent/config.json")).expect_err("must fail");
        let message = error.to_string();
        assert!(message.starts_with("Configuration file"));
        assert!(message.ends_with("not found."));
    }

    #[test]
    fn parse_config_reads_discourse_keys() {
        let config = parse_config(
            r#"{
                "discourse_api_key": "secret",
                "discourse_api_username": "system",
                "discourse_url": "https://forum.example.org/"
            }"#,
        )
        .expect("parse config");

        assert_eq!(config.api_key, "secret");
        assert_eq!(config.api_username, "system");
        assert_eq!(config.url, "https://forum.example.org/");
        assert_eq!(config.base_url(), "https://forum.example.org");
    }

    #[test]
    fn load_config_returns_error_for_invalid_json() {
        let temp = tempdir().expect("tempdir");
        let config_path = temp.path().join("config.json");
        fs::write(&config_path, "{\"discourse_api_key\": ").expect("write config");
        let error = load_config(&config_path).expect_err("must fail");
        assert!(error.to_string().contains("failed to parse"));
    }

    #[test]
    fn load_config_requires_every_key() {
        let temp = tempdir().expect("tempdir");
        let config_path = temp.path().join("config.json");
        fs::write(
            &config_path,
            r#"{"discourse_api_key": "k", "discourse_api_username": "u"}"#,
        )
        .expect("write config");
        let error = load_config(&config_path).expect_err("must fail");
        assert!(format!("{error:#}").contains("discourse_url"));
    }

    #[test]
    fn base_url_strips_every_trailing_slash() {
        let config = DiscourseConfig {
            api_key: "k".to_string(),
            api_username: "u".to_string(),
            url: "https://forum.example.org//".to_string(),
        };
        assert_eq!(config.base_url(), "https://forum.example.org");
    }
}
