use crate::adapters::llm::ChatModelSettings;
use crate::utils::error::{GradeError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_range,
    validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraderConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    pub server: Option<ServerConfig>,
    pub store: Option<StoreConfig>,
    pub batch: Option<BatchConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub timeout_seconds: Option<u64>,
    pub max_retries: Option<u32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        let defaults = ChatModelSettings::default();
        Self {
            base_url: defaults.base_url,
            model: defaults.model,
            api_key: None,
            temperature: None,
            max_tokens: None,
            timeout_seconds: None,
            max_retries: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    pub concurrent_requests: Option<usize>,
}

impl GraderConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(GradeError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| GradeError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${OPENAI_API_KEY})，未設定的保持原樣
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_url("llm.base_url", &self.llm.base_url)?;
        validate_non_empty_string("llm.model", &self.llm.model)?;

        if let Some(temperature) = self.llm.temperature {
            validate_range("llm.temperature", temperature, 0.0, 2.0)?;
        }
        if let Some(max_tokens) = self.llm.max_tokens {
            validate_positive_number("llm.max_tokens", max_tokens as usize, 1)?;
        }
        if let Some(timeout) = self.llm.timeout_seconds {
            validate_range("llm.timeout_seconds", timeout, 1, 600)?;
        }
        if let Some(retries) = self.llm.max_retries {
            validate_range("llm.max_retries", retries, 1, 10)?;
        }

        if let Some(bind) = self.server.as_ref().and_then(|s| s.bind.as_deref()) {
            bind.parse::<std::net::SocketAddr>()
                .map_err(|e| GradeError::InvalidConfigValueError {
                    field: "server.bind".to_string(),
                    value: bind.to_string(),
                    reason: format!("Invalid socket address: {}", e),
                })?;
        }

        if let Some(path) = self.store_path() {
            validate_path("store.path", path)?;
        }

        if let Some(concurrent) = self.batch.as_ref().and_then(|b| b.concurrent_requests) {
            validate_positive_number("batch.concurrent_requests", concurrent, 1)?;
        }

        Ok(())
    }

    /// 未解析的 `${VAR}` 視為未設定，再退回環境變數
    pub fn api_key(&self) -> Option<String> {
        self.llm
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty() && !key.starts_with("${"))
            .or_else(|| std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty()))
    }

    pub fn chat_model_settings(&self) -> ChatModelSettings {
        let defaults = ChatModelSettings::default();
        ChatModelSettings {
            base_url: self.llm.base_url.clone(),
            model: self.llm.model.clone(),
            api_key: self.api_key(),
            temperature: self.llm.temperature.unwrap_or(defaults.temperature),
            max_tokens: self.llm.max_tokens.unwrap_or(defaults.max_tokens),
            timeout: self
                .llm
                .timeout_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            max_retries: self.llm.max_retries.unwrap_or(defaults.max_retries),
            retry_delay: defaults.retry_delay,
        }
    }

    pub fn bind_address(&self) -> &str {
        self.server
            .as_ref()
            .and_then(|s| s.bind.as_deref())
            .unwrap_or(DEFAULT_BIND)
    }

    pub fn store_path(&self) -> Option<&str> {
        self.store.as_ref().and_then(|s| s.path.as_deref())
    }

    pub fn concurrent_requests(&self) -> usize {
        self.batch
            .as_ref()
            .and_then(|b| b.concurrent_requests)
            .unwrap_or(4)
    }
}

impl Validate for GraderConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
