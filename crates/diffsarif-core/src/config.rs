use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DiffSarifError;

/// Top-level configuration loaded from `.diffsarif.toml`.
///
/// Resolution order: CLI flags > local config file > defaults. The credential
/// itself is never part of the configuration; only the name of the
/// environment variable it is read from.
///
/// # Examples
///
/// ```
/// use diffsarif_core::Config;
///
/// let config = Config::default();
/// assert_eq!(config.server.max_files, 10);
/// assert_eq!(config.llm.api_key_env, "OPENAI_API_KEY");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Completion service settings.
    #[serde(default)]
    pub llm: LlmConfig,
    /// Orchestration settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// HTTP service settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Tool metadata written into every SARIF report.
    #[serde(default)]
    pub report: ReportConfig,
}

impl Config {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DiffSarifError::Io`] if the file cannot be read, or
    /// [`DiffSarifError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use diffsarif_core::Config;
    /// use std::path::Path;
    ///
    /// let config = Config::from_file(Path::new(".diffsarif.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, DiffSarifError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`DiffSarifError::Toml`] if parsing fails, or
    /// [`DiffSarifError::Config`] if a value is out of range.
    ///
    /// # Examples
    ///
    /// ```
    /// use diffsarif_core::Config;
    ///
    /// let toml = r#"
    /// [server]
    /// max_files = 20
    /// "#;
    /// let config = Config::from_toml(toml).unwrap();
    /// assert_eq!(config.server.max_files, 20);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, DiffSarifError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), DiffSarifError> {
        if self.analysis.max_concurrent == 0 {
            return Err(DiffSarifError::Config(
                "analysis.max_concurrent must be at least 1".into(),
            ));
        }
        if self.analysis.max_files == 0 {
            return Err(DiffSarifError::Config(
                "analysis.max_files must be at least 1".into(),
            ));
        }
        if self.server.max_files == 0 {
            return Err(DiffSarifError::Config(
                "server.max_files must be at least 1".into(),
            ));
        }
        if self.llm.model.trim().is_empty() {
            return Err(DiffSarifError::Config("llm.model must not be empty".into()));
        }
        Ok(())
    }
}

/// Completion service configuration.
///
/// # Examples
///
/// ```
/// use diffsarif_core::LlmConfig;
///
/// let config = LlmConfig::default();
/// assert_eq!(config.model, "gpt-4o");
/// assert_eq!(config.max_tokens, 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model identifier sent with every completion request.
    #[serde(default = "default_model")]
    pub model: String,
    /// Base URL of an OpenAI-compatible API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Environment variable holding the credential for CLI runs.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Maximum tokens the model may generate per file.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// HTTP timeout for a single completion call, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_model() -> String {
    "gpt-4o".into()
}

fn default_base_url() -> String {
    "https://api.openai.com".into()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".into()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_temperature() -> f32 {
    0.7
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Orchestration configuration.
///
/// # Examples
///
/// ```
/// use diffsarif_core::AnalysisConfig;
///
/// assert_eq!(AnalysisConfig::default().max_concurrent, 4);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Upper bound on in-flight completion calls (1 = sequential).
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    /// Maximum number of changed files one CLI run will analyze.
    #[serde(default = "default_analysis_max_files")]
    pub max_files: usize,
}

fn default_max_concurrent() -> usize {
    4
}

fn default_analysis_max_files() -> usize {
    50
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            max_files: default_analysis_max_files(),
        }
    }
}

/// HTTP service configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to listen on.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum number of files accepted per request.
    #[serde(default = "default_max_files")]
    pub max_files: usize,
}

fn default_bind() -> String {
    "0.0.0.0:8000".into()
}

fn default_max_files() -> usize {
    10
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_files: default_max_files(),
        }
    }
}

/// SARIF tool driver metadata.
///
/// # Examples
///
/// ```
/// use diffsarif_core::ReportConfig;
///
/// let config = ReportConfig::default();
/// assert_eq!(config.tool_name, "diffsarif");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// `runs[0].tool.driver.name`.
    #[serde(default = "default_tool_name")]
    pub tool_name: String,
    /// `runs[0].tool.driver.informationUri`.
    #[serde(default = "default_information_uri")]
    pub information_uri: String,
}

fn default_tool_name() -> String {
    "diffsarif".into()
}

fn default_information_uri() -> String {
    "https://github.com/diffsarif/diffsarif".into()
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            tool_name: default_tool_name(),
            information_uri: default_information_uri(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = Config::default();
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.llm.base_url, "https://api.openai.com");
        assert_eq!(config.llm.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.llm.max_tokens, 1024);
        assert_eq!(config.llm.timeout_secs, 120);
        assert_eq!(config.analysis.max_concurrent, 4);
        assert_eq!(config.server.bind, "0.0.0.0:8000");
        assert_eq!(config.server.max_files, 10);
        assert_eq!(config.report.tool_name, "diffsarif");
    }

    #[test]
    fn parse_full_toml() {
        let toml = r#"
[llm]
model = "gpt-4o-mini"
base_url = "http://localhost:11434"
api_key_env = "LOCAL_LLM_KEY"
max_tokens = 2048
temperature = 0.2

[analysis]
max_concurrent = 1
max_files = 3

[server]
bind = "127.0.0.1:9000"
max_files = 5

[report]
tool_name = "ci-review"
information_uri = "https://example.com/ci-review"
"#;
        let config = Config::from_toml(toml).unwrap();
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.base_url, "http://localhost:11434");
        assert_eq!(config.llm.api_key_env, "LOCAL_LLM_KEY");
        assert_eq!(config.llm.max_tokens, 2048);
        assert_eq!(config.analysis.max_concurrent, 1);
        assert_eq!(config.analysis.max_files, 3);
        assert_eq!(config.server.bind, "127.0.0.1:9000");
        assert_eq!(config.server.max_files, 5);
        assert_eq!(config.report.tool_name, "ci-review");
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.server.max_files, 10);
        assert_eq!(config.llm.model, "gpt-4o");
    }

    #[test]
    fn invalid_toml_returns_error() {
        let result = Config::from_toml("{{invalid}}");
        assert!(matches!(result, Err(DiffSarifError::Toml(_))));
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let result = Config::from_toml("[analysis]\nmax_concurrent = 0\n");
        assert!(matches!(result, Err(DiffSarifError::Config(_))));
    }

    #[test]
    fn zero_max_files_is_rejected() {
        let result = Config::from_toml("[server]\nmax_files = 0\n");
        assert!(matches!(result, Err(DiffSarifError::Config(_))));
        let result = Config::from_toml("[analysis]\nmax_files = 0\n");
        assert!(matches!(result, Err(DiffSarifError::Config(_))));
    }
}
