//! Configuration loading, validation, and management for piste.
//!
//! Loads configuration from `~/.piste/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Persona prompt sent as the system message of every remote completion.
pub const DEFAULT_SYSTEM_PROMPT: &str = "你是一位专业的击剑AI专家，具有以下特点：

1. 专业知识：
   - 精通花剑、重剑、佩剑三个剑种
   - 了解击剑规则、技术、战术和历史
   - 熟悉国际击剑联合会(FIE)的规则和标准

2. 回复风格：
   - 专业但易懂，用简单语言解释复杂概念
   - 根据用户情感调整语气（兴奋、困惑、好奇等）
   - 提供实用的建议和技巧
   - 保持友好和鼓励的态度

3. 回复内容：
   - 优先回答击剑相关问题
   - 提供准确的技术分析和建议
   - 分享击剑历史和趣闻
   - 分析比赛和战术运用

4. 个性化：
   - 根据对话历史提供连贯的回复
   - 考虑用户的学习水平和兴趣
   - 适时提供鼓励和激励

请用中文回复，保持专业性和趣味性的平衡。";

/// Starter questions offered by the chat panel.
pub const QUICK_QUESTIONS: [&str; 6] = [
    "击剑的基本规则是什么？",
    "花剑、重剑、佩剑有什么区别？",
    "如何提高击剑技术？",
    "击剑比赛如何计分？",
    "击剑的历史起源是什么？",
    "教练在比赛中起什么作用？",
];

/// The root configuration structure.
///
/// Maps directly to `~/.piste/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Remote chat-completion endpoint
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Assistant behaviour
    #[serde(default)]
    pub assistant: AssistantConfig,

    /// HTTP gateway
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Danmaku, action and pose generators
    #[serde(default)]
    pub generators: GeneratorsConfig,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Bearer token; no key means no remote client
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Hard timeout for one completion call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Start in remote mode
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_base_url() -> String {
    "https://api.deepseek.com/v1".into()
}
fn default_model() -> String {
    "deepseek-chat".into()
}
fn default_max_tokens() -> u32 {
    1000
}
fn default_temperature() -> f32 {
    0.7
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_true() -> bool {
    true
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("timeout_secs", &self.timeout_secs)
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Answer locally when the remote call fails
    #[serde(default = "default_true")]
    pub fallback_to_local: bool,

    /// Maximum turns kept in the conversation log
    #[serde(default = "default_history_cap")]
    pub history_cap: usize,

    /// User/assistant pairs sent upstream as context
    #[serde(default = "default_context_pairs")]
    pub context_pairs: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt_override: Option<String>,
}

fn default_history_cap() -> usize {
    50
}
fn default_context_pairs() -> usize {
    5
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            fallback_to_local: true,
            history_cap: default_history_cap(),
            context_pairs: default_context_pairs(),
            system_prompt_override: None,
        }
    }
}

impl AssistantConfig {
    /// The system prompt in effect.
    pub fn system_prompt(&self) -> &str {
        self.system_prompt_override
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    5000
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorsConfig {
    /// Fixed RNG seed; random from the OS when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Maximum entries kept on the danmaku board
    #[serde(default = "default_danmaku_cap")]
    pub danmaku_cap: usize,
}

fn default_danmaku_cap() -> usize {
    100
}

impl Default for GeneratorsConfig {
    fn default() -> Self {
        Self {
            seed: None,
            danmaku_cap: default_danmaku_cap(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.piste/config.toml).
    ///
    /// Then applies environment overrides:
    /// - `PISTE_API_KEY` (highest priority), `DEEPSEEK_API_KEY`
    /// - `DEEPSEEK_BASE_URL`, `DEEPSEEK_MODEL`
    /// - `USE_DEEPSEEK`, `FALLBACK_TO_LOCAL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        Self::load_with_env(&config_path)
    }

    /// Load from a specific path, then apply environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    ///
    /// Blank values are ignored. An API key set in the file is kept.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if self.remote.api_key.is_none() {
            self.remote.api_key = get("PISTE_API_KEY").or_else(|| get("DEEPSEEK_API_KEY"));
        }
        if let Some(url) = get("DEEPSEEK_BASE_URL") {
            self.remote.base_url = url;
        }
        if let Some(model) = get("DEEPSEEK_MODEL") {
            self.remote.model = model;
        }
        if let Some(flag) = get("USE_DEEPSEEK").and_then(|v| parse_flag(&v)) {
            self.remote.enabled = flag;
        }
        if let Some(flag) = get("FALLBACK_TO_LOCAL").and_then(|v| parse_flag(&v)) {
            self.assistant.fallback_to_local = flag;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".piste")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.remote.temperature) {
            return Err(ConfigError::ValidationError(
                "remote.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.remote.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "remote.timeout_secs must be at least 1".into(),
            ));
        }

        if self.assistant.history_cap == 0 {
            return Err(ConfigError::ValidationError(
                "assistant.history_cap must be at least 1".into(),
            ));
        }

        if self.generators.danmaku_cap == 0 {
            return Err(ConfigError::ValidationError(
                "generators.danmaku_cap must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.remote.api_key.is_some()
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        other => {
            tracing::warn!(value = other, "Ignoring unrecognised boolean in environment");
            None
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.gateway.port, 5000);
        assert_eq!(config.remote.model, "deepseek-chat");
        assert_eq!(config.assistant.history_cap, 50);
        assert_eq!(config.assistant.context_pairs, 5);
        assert_eq!(config.generators.danmaku_cap, 100);
        assert!(config.assistant.fallback_to_local);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.remote.base_url, config.remote.base_url);
        assert_eq!(parsed.gateway.port, config.gateway.port);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let mut config = AppConfig::default();
        config.remote.temperature = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_history_cap_rejected() {
        let mut config = AppConfig::default();
        config.assistant.history_cap = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("history_cap"));
    }

    #[test]
    fn zero_timeout_rejected() {
        let mut config = AppConfig::default();
        config.remote.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.remote.base_url, "https://api.deepseek.com/v1");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[remote]\nmodel = \"deepseek-reasoner\"\n\n[gateway]\nport = 8080"
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.remote.model, "deepseek-reasoner");
        assert_eq!(config.remote.timeout_secs, 30);
        assert_eq!(config.gateway.port, 8080);
        assert_eq!(config.gateway.host, "127.0.0.1");
    }

    #[test]
    fn unparseable_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[remote\nmodel = ").unwrap();
        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[
            ("DEEPSEEK_API_KEY", "sk-deepseek"),
            ("DEEPSEEK_MODEL", "deepseek-reasoner"),
            ("USE_DEEPSEEK", "false"),
            ("FALLBACK_TO_LOCAL", "0"),
        ]));
        assert_eq!(config.remote.api_key.as_deref(), Some("sk-deepseek"));
        assert_eq!(config.remote.model, "deepseek-reasoner");
        assert!(!config.remote.enabled);
        assert!(!config.assistant.fallback_to_local);
    }

    #[test]
    fn piste_key_has_priority() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[
            ("PISTE_API_KEY", "sk-piste"),
            ("DEEPSEEK_API_KEY", "sk-deepseek"),
        ]));
        assert_eq!(config.remote.api_key.as_deref(), Some("sk-piste"));
    }

    #[test]
    fn file_key_is_not_overridden() {
        let mut config = AppConfig::default();
        config.remote.api_key = Some("sk-file".into());
        config.apply_env(env(&[("PISTE_API_KEY", "sk-env")]));
        assert_eq!(config.remote.api_key.as_deref(), Some("sk-file"));
    }

    #[test]
    fn blank_and_garbage_env_values_are_ignored() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[("DEEPSEEK_API_KEY", "  "), ("USE_DEEPSEEK", "maybe")]));
        assert!(config.remote.api_key.is_none());
        assert!(config.remote.enabled);
    }

    #[test]
    fn debug_redacts_api_key() {
        let mut config = AppConfig::default();
        config.remote.api_key = Some("sk-super-secret".into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn system_prompt_override() {
        let mut assistant = AssistantConfig::default();
        assert!(assistant.system_prompt().contains("击剑AI专家"));
        assistant.system_prompt_override = Some("  ".into());
        assert_eq!(assistant.system_prompt(), DEFAULT_SYSTEM_PROMPT);
        assistant.system_prompt_override = Some("You are a sabre coach.".into());
        assert_eq!(assistant.system_prompt(), "You are a sabre coach.");
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("deepseek-chat"));
        assert!(toml_str.contains("5000"));
        assert!(!toml_str.contains("api_key"));
    }
}
