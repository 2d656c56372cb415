//! TOML-based configuration for gitscribe.
//!
//! Secrets (the LLM API key and the GitHub token) are referenced through
//! `*_env` fields naming environment variables. They are resolved once via
//! [`AppConfig::resolve_env_vars`] by the binary and the resolved config is
//! handed to the core; nothing in the core reads the environment afterwards.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::ConfigError;

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "GITSCRIBE_CONFIG";

const LLM_KEY_FALLBACK_ENV: &str = "GROQ_API_TOKEN";
const GITHUB_TOKEN_FALLBACK_ENV: &str = "GITHUB_PAT";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level application configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Chat-completion service settings.
    #[serde(default)]
    pub llm: LlmConfig,

    /// GitHub API settings.
    #[serde(default)]
    pub github: GitHubConfig,

    /// Merge-conflict resolution settings.
    #[serde(default)]
    pub resolve: ResolveConfig,
}

// ---------------------------------------------------------------------------
// LLM
// ---------------------------------------------------------------------------

/// Settings for the OpenAI-compatible chat-completion endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL; `/chat/completions` is appended.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Default model identifier.
    #[serde(default = "default_model")]
    pub model: String,

    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Inline API key, used only when the environment variable is unset.
    /// Replaced by the resolved key after `resolve_env_vars`.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens in a reply.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Extra attempts after a transient failure.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_api_base() -> String {
    "https://api.groq.com/openai/v1".into()
}
fn default_model() -> String {
    "llama-3.3-70b-versatile".into()
}
fn default_api_key_env() -> String {
    "GROQ_API_KEY".into()
}
fn default_temperature() -> f32 {
    0.3
}
fn default_max_tokens() -> u32 {
    512
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    3
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            api_key: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

// ---------------------------------------------------------------------------
// GitHub
// ---------------------------------------------------------------------------

/// GitHub API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// GitHub API base URL (default `https://api.github.com`).
    #[serde(default = "default_github_api_url")]
    pub api_url: String,

    /// Environment variable holding the personal access token.
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Inline token, used only when the environment variable is unset.
    #[serde(default, skip_serializing)]
    pub token: Option<String>,

    /// Base branch pull requests target by default.
    #[serde(default = "default_base")]
    pub default_base: String,
}

fn default_github_api_url() -> String {
    "https://api.github.com".into()
}
fn default_token_env() -> String {
    "GITHUB_TOKEN".into()
}
fn default_base() -> String {
    "main".into()
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_github_api_url(),
            token_env: default_token_env(),
            token: None,
            default_base: default_base(),
        }
    }
}

// ---------------------------------------------------------------------------
// Resolve
// ---------------------------------------------------------------------------

/// Merge-conflict resolution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveConfig {
    /// Number of files resolved concurrently.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Maximum tokens for a resolved-file reply.
    #[serde(default = "default_resolve_max_tokens")]
    pub max_tokens: u32,

    /// Model override for resolution; falls back to `llm.model`.
    #[serde(default)]
    pub model: Option<String>,
}

fn default_concurrency() -> usize {
    1
}
fn default_resolve_max_tokens() -> u32 {
    4096
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            max_tokens: default_resolve_max_tokens(),
            model: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading & resolving
// ---------------------------------------------------------------------------

impl AppConfig {
    /// Default config file location: `$GITSCRIBE_CONFIG`, else
    /// `<config dir>/gitscribe/config.toml`.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        if let Ok(explicit) = std::env::var(CONFIG_PATH_ENV) {
            if !explicit.trim().is_empty() {
                return Ok(PathBuf::from(explicit.trim()));
            }
        }
        let base = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(base.join("gitscribe").join("config.toml"))
    }

    /// Load an [`AppConfig`] from a TOML file at the given path.
    ///
    /// This does **not** resolve environment variables -- call
    /// [`resolve_env_vars`](Self::resolve_env_vars) afterwards.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Like [`load_from_file`](Self::load_from_file), but a missing file
    /// yields the defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        match Self::load_from_file(path.as_ref()) {
            Err(ConfigError::FileNotFound(p)) => {
                debug!(path = %p, "no configuration file, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Resolve the `*_env` secret references.
    ///
    /// The named variable wins, then its fallback name, then the inline file
    /// value. Missing secrets are not an error here; commands that need one
    /// call [`require_api_key`](Self::require_api_key) or
    /// [`require_github_token`](Self::require_github_token).
    pub fn resolve_env_vars(&mut self) -> Result<(), ConfigError> {
        info!("resolving environment variable references in config");

        self.llm.api_key = resolve_optional_env(&self.llm.api_key_env, "llm.api_key_env")
            .or_else(|| resolve_optional_env(LLM_KEY_FALLBACK_ENV, "llm.api_key_env"))
            .or_else(|| non_empty(self.llm.api_key.take()));

        self.github.token = resolve_optional_env(&self.github.token_env, "github.token_env")
            .or_else(|| resolve_optional_env(GITHUB_TOKEN_FALLBACK_ENV, "github.token_env"))
            .or_else(|| non_empty(self.github.token.take()));

        debug!("environment variable resolution complete");
        Ok(())
    }

    /// Validate that all values are sane.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.api_base.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "llm.api_base".into(),
                detail: "API base URL must not be empty".into(),
            });
        }
        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "llm.model".into(),
                detail: "model must not be empty".into(),
            });
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::InvalidValue {
                field: "llm.temperature".into(),
                detail: "temperature must be between 0 and 2".into(),
            });
        }
        if self.llm.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "llm.timeout_secs".into(),
                detail: "timeout must be > 0".into(),
            });
        }
        if self.resolve.concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "resolve.concurrency".into(),
                detail: "concurrency must be >= 1".into(),
            });
        }
        Ok(())
    }

    /// Convenience: load (defaults when missing), resolve, and validate.
    pub fn load_and_resolve<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::load_or_default(path)?;
        config.resolve_env_vars()?;
        config.validate()?;
        Ok(config)
    }

    /// The resolved LLM API key, or an error naming the variable to set.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.llm
            .api_key
            .as_deref()
            .ok_or_else(|| ConfigError::SecretMissing {
                var: self.llm.api_key_env.clone(),
                field: "llm.api_key_env".into(),
            })
    }

    /// The resolved GitHub token, or an error naming the variable to set.
    pub fn require_github_token(&self) -> Result<&str, ConfigError> {
        self.github
            .token
            .as_deref()
            .ok_or_else(|| ConfigError::SecretMissing {
                var: self.github.token_env.clone(),
                field: "github.token_env".into(),
            })
    }

    /// Generate a default TOML config template string.
    pub fn default_template() -> &'static str {
        r#"# gitscribe configuration

[llm]
api_base = "https://api.groq.com/openai/v1"
model = "llama-3.3-70b-versatile"
api_key_env = "GROQ_API_KEY"
# api_key = "..."          # used only when the variable above is unset
temperature = 0.3
max_tokens = 512
timeout_secs = 30
max_retries = 3

[github]
api_url = "https://api.github.com"
token_env = "GITHUB_TOKEN"
# token = "..."            # used only when the variable above is unset
default_base = "main"

[resolve]
concurrency = 1
max_tokens = 4096
# model = "..."            # defaults to llm.model
"#
    }
}

/// Try to read an environment variable by name. Returns the trimmed value,
/// or `None` when the variable is unset or blank.
fn resolve_optional_env(env_name: &str, field: &str) -> Option<String> {
    match std::env::var(env_name) {
        Ok(val) if !val.trim().is_empty() => {
            debug!(field, env_name, "resolved env var");
            Some(val.trim().to_string())
        }
        Ok(_) => {
            warn!(field, env_name, "env var is set but empty");
            None
        }
        Err(_) => {
            debug!(field, env_name, "env var not set");
            None
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_toml() -> &'static str {
        r#"
[llm]
api_base = "http://localhost:9999/v1"
model = "test-model"
api_key_env = "TEST_CFG_UNUSED_KEY"
temperature = 0.7
max_tokens = 256
timeout_secs = 10
max_retries = 1

[github]
api_url = "https://github.example.com/api/v3"
token_env = "TEST_CFG_UNUSED_TOKEN"
default_base = "develop"

[resolve]
concurrency = 4
max_tokens = 8192
model = "big-model"
"#
    }

    #[test]
    fn test_parse_full_config() {
        let config: AppConfig = toml::from_str(sample_toml()).expect("failed to parse toml");
        assert_eq!(config.llm.api_base, "http://localhost:9999/v1");
        assert_eq!(config.llm.model, "test-model");
        assert_eq!(config.llm.max_retries, 1);
        assert_eq!(config.github.default_base, "develop");
        assert_eq!(config.resolve.concurrency, 4);
        assert_eq!(config.resolve.model.as_deref(), Some("big-model"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, sample_toml()).unwrap();

        let config = AppConfig::load_from_file(&path).expect("load_from_file failed");
        assert_eq!(config.llm.timeout_secs, 10);
    }

    #[test]
    fn test_file_not_found() {
        let result = AppConfig::load_from_file("/nonexistent/config.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = AppConfig::load_or_default("/nonexistent/config.toml").unwrap();
        assert_eq!(config.llm.model, "llama-3.3-70b-versatile");
        assert_eq!(config.github.default_base, "main");
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "not = valid = toml").unwrap();

        let result = AppConfig::load_or_default(&path);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.llm.api_base, "https://api.groq.com/openai/v1");
        assert_eq!(config.llm.api_key_env, "GROQ_API_KEY");
        assert_eq!(config.llm.max_tokens, 512);
        assert_eq!(config.llm.timeout_secs, 30);
        assert_eq!(config.github.api_url, "https://api.github.com");
        assert_eq!(config.github.token_env, "GITHUB_TOKEN");
        assert_eq!(config.resolve.concurrency, 1);
        assert_eq!(config.resolve.max_tokens, 4096);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_resolve_env_vars_prefers_environment() {
        std::env::set_var("TEST_CFG_LLM_KEY", "  envkey  ");
        std::env::set_var("TEST_CFG_GH_TOKEN", "ghp_env");

        let toml_str = r#"
[llm]
api_key_env = "TEST_CFG_LLM_KEY"
api_key = "filekey"
[github]
token_env = "TEST_CFG_GH_TOKEN"
token = "filetok"
"#;
        let mut config: AppConfig = toml::from_str(toml_str).unwrap();
        config.resolve_env_vars().unwrap();

        assert_eq!(config.require_api_key().unwrap(), "envkey");
        assert_eq!(config.require_github_token().unwrap(), "ghp_env");

        std::env::remove_var("TEST_CFG_LLM_KEY");
        std::env::remove_var("TEST_CFG_GH_TOKEN");
    }

    #[test]
    fn test_resolve_env_vars_falls_back_to_file() {
        let toml_str = r#"
[llm]
api_key_env = "TEST_CFG_NEVER_SET_KEY"
api_key = "  from_file  "
[github]
token_env = "TEST_CFG_NEVER_SET_TOKEN"
token = "filetok"
"#;
        let mut config: AppConfig = toml::from_str(toml_str).unwrap();
        config.resolve_env_vars().unwrap();

        assert_eq!(config.llm.api_key.as_deref(), Some("from_file"));
    }

    #[test]
    fn test_require_secret_missing() {
        let config = AppConfig::default();
        let result = config.require_github_token();
        assert!(matches!(
            result,
            Err(ConfigError::SecretMissing { ref var, .. }) if var == "GITHUB_TOKEN"
        ));
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let mut config: AppConfig = toml::from_str(sample_toml()).unwrap();
        config.resolve.concurrency = 0;
        let result = config.validate();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "resolve.concurrency"
        ));
    }

    #[test]
    fn test_validate_rejects_bad_temperature() {
        let mut config: AppConfig = toml::from_str(sample_toml()).unwrap();
        config.llm.temperature = 3.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config: AppConfig = toml::from_str(sample_toml()).unwrap();
        config.llm.timeout_secs = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "llm.timeout_secs"
        ));
    }

    #[test]
    fn test_default_template_is_valid() {
        let config: AppConfig = toml::from_str(AppConfig::default_template())
            .expect("default template should be valid TOML");
        assert!(config.validate().is_ok());
    }
}
