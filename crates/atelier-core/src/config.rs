//! Configuration — YAML config + env var overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Known provider presets
const PROVIDER_PRESETS: &[(&str, Option<&str>)] = &[
    ("openai", None),
    ("openrouter", Some("https://openrouter.ai/api/v1")),
];

/// Provider-specific API key env vars (checked before OPENAI_API_KEY fallback)
const PROVIDER_KEY_ENV_VARS: &[(&str, &str)] = &[("openrouter", "OPENROUTER_API_KEY")];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// "openai" | "openrouter" | "custom"
    #[serde(default = "default_provider")]
    pub provider: String,

    /// LLM model name
    #[serde(default = "default_model")]
    pub model: String,

    /// API key (set here or via env var)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL for Chat Completions API (auto-set for known providers)
    #[serde(default)]
    pub base_url: Option<String>,

    /// Round budget before the scheduler reports a stall
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,

    /// Retries per action invocation after the first attempt
    #[serde(default = "default_retry_budget")]
    pub retry_budget: u32,

    /// Most context messages a role hands to one invocation
    #[serde(default = "default_max_context_messages")]
    pub max_context_messages: usize,

    /// Max output tokens per generator call
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Where session transcripts and docs land (relative to project root)
    #[serde(default)]
    pub session_dir: Option<String>,

    /// Resolved project root (set at load time, not serialized from YAML)
    #[serde(skip)]
    pub project_root: PathBuf,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-4.1".into()
}
fn default_max_rounds() -> u32 {
    12
}
fn default_retry_budget() -> u32 {
    2
}
fn default_max_context_messages() -> usize {
    30
}
fn default_max_output_tokens() -> u32 {
    2000
}

impl Config {
    /// Load config from a YAML file with env var overrides.
    /// `config_path` is the path to config.yaml.
    pub fn load(config_path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config: {}", config_path.display()))?;

        let mut config: Config =
            serde_yaml::from_str(&content).context("Failed to parse config.yaml")?;

        // Resolve project root from config file location
        config.project_root = config_path
            .parent()
            .unwrap_or(Path::new("."))
            .to_path_buf()
            .canonicalize()
            .unwrap_or_else(|_| {
                config_path
                    .parent()
                    .unwrap_or(Path::new("."))
                    .to_path_buf()
            });

        // Provider (env var override)
        if let Ok(p) = std::env::var("ATELIER_PROVIDER") {
            config.provider = p;
        }

        // Base URL: env var > config > provider preset
        if let Ok(url) = std::env::var("ATELIER_BASE_URL") {
            config.base_url = Some(url);
        } else if config.base_url.is_none() {
            config.base_url = PROVIDER_PRESETS
                .iter()
                .find(|(p, _)| *p == config.provider)
                .and_then(|(_, url)| url.map(String::from));
        }

        // API key: provider-specific env var > OPENAI_API_KEY > config
        let provider_key_var = PROVIDER_KEY_ENV_VARS
            .iter()
            .find(|(p, _)| *p == config.provider)
            .map(|(_, var)| *var);

        if let Some(var) = provider_key_var {
            if let Ok(key) = std::env::var(var) {
                config.api_key = Some(key);
            }
        }
        if config.api_key.is_none() {
            if let Ok(key) = std::env::var("OPENAI_API_KEY") {
                config.api_key = Some(key);
            }
        }

        // Model (env var override)
        if let Ok(m) = std::env::var("ATELIER_MODEL") {
            config.model = m;
        }

        // Validation
        if config.provider == "custom" && config.base_url.is_none() {
            anyhow::bail!(
                "Provider 'custom' requires base_url in config.yaml or ATELIER_BASE_URL env var"
            );
        }

        Ok(config)
    }

    /// Load config from the default location (project_root/config.yaml)
    pub fn load_from_dir(project_root: &Path) -> Result<Self> {
        let config_path = project_root.join("config.yaml");
        Self::load(&config_path)
    }

    /// Resolve the session directory, defaulting to `sessions/` under the
    /// project root.
    pub fn resolve_session_dir(&self) -> PathBuf {
        match &self.session_dir {
            Some(dir) => {
                let p = Path::new(dir);
                if p.is_absolute() {
                    p.to_path_buf()
                } else {
                    self.project_root.join(p)
                }
            }
            None => self.project_root.join("sessions"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key: None,
            base_url: None,
            max_rounds: default_max_rounds(),
            retry_budget: default_retry_budget(),
            max_context_messages: default_max_context_messages(),
            max_output_tokens: default_max_output_tokens(),
            session_dir: None,
            project_root: PathBuf::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_defaults() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(tmp, "provider: openai\nmodel: gpt-4.1").unwrap();

        let config = Config::load(tmp.path()).unwrap();
        assert_eq!(config.provider, "openai");
        assert_eq!(config.model, "gpt-4.1");
        assert_eq!(config.max_rounds, 12);
        assert_eq!(config.retry_budget, 2);
        assert_eq!(config.max_context_messages, 30);
    }

    #[test]
    fn test_load_config_custom_values() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(
            tmp,
            "provider: custom\nmodel: llama3\nbase_url: http://localhost:11434/v1\nmax_rounds: 4\nretry_budget: 0"
        )
        .unwrap();

        let config = Config::load(tmp.path()).unwrap();
        assert_eq!(config.provider, "custom");
        assert_eq!(config.model, "llama3");
        assert_eq!(
            config.base_url.as_deref(),
            Some("http://localhost:11434/v1")
        );
        assert_eq!(config.max_rounds, 4);
        assert_eq!(config.retry_budget, 0);
    }

    #[test]
    fn test_custom_without_base_url_fails() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(tmp, "provider: custom\nmodel: llama3").unwrap();

        let result = Config::load(tmp.path());
        assert!(result.is_err());
    }
}
