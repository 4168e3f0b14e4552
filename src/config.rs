use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScoutError};

/// Environment variable pointing at an optional TOML configuration file.
pub const CONFIG_PATH_ENV: &str = "COMPANY_SCOUT_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub secret_key: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            secret_key: None,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    8000
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_model_timeout")]
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            embedding_model: default_embedding_model(),
            temperature: 0.0,
            max_tokens: default_max_tokens(),
            timeout_secs: default_model_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}

fn default_model() -> String {
    "gpt-4o-mini".into()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}

fn default_max_tokens() -> u32 {
    256
}

fn default_model_timeout() -> u64 {
    60
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchProvider {
    #[default]
    Google,
    SerpApi,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentConfig {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default = "default_memory_window")]
    pub memory_window: usize,
    #[serde(default = "default_tool_timeout")]
    pub tool_timeout_secs: u64,
    #[serde(default)]
    pub search_provider: SearchProvider,
    #[serde(default)]
    pub google_base_url: Option<String>,
    #[serde(default)]
    pub serpapi_base_url: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            memory_window: default_memory_window(),
            tool_timeout_secs: default_tool_timeout(),
            search_provider: SearchProvider::default(),
            google_base_url: None,
            serpapi_base_url: None,
        }
    }
}

fn default_max_iterations() -> usize {
    15
}

fn default_memory_window() -> usize {
    2
}

fn default_tool_timeout() -> u64 {
    20
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievalConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default)]
    pub chunk_overlap: usize,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// HTTP timeout for the ScaleSerp search request.
    #[serde(default = "default_retrieval_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub scaleserp_base_url: Option<String>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: 0,
            top_k: default_top_k(),
            timeout_secs: default_retrieval_timeout(),
            scaleserp_base_url: None,
        }
    }
}

fn default_chunk_size() -> usize {
    1000
}

fn default_top_k() -> usize {
    4
}

fn default_retrieval_timeout() -> u64 {
    30
}

/// Keys used by the scrape-and-retrieve pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PrimaryCredentials {
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default)]
    pub scaleserp_api_key: Option<String>,
}

/// Keys used by the agent-loop fallback.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SecondaryCredentials {
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default)]
    pub google_api_key: Option<String>,
    #[serde(default)]
    pub google_cse_id: Option<String>,
    #[serde(default)]
    pub serpapi_api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Credentials {
    #[serde(default)]
    pub primary: PrimaryCredentials,
    #[serde(default)]
    pub secondary: SecondaryCredentials,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_filter")]
    pub filter: String,
    #[serde(default)]
    pub json: bool,
    /// Recovered failures kept in memory before the oldest are dropped.
    #[serde(default = "default_failure_history")]
    pub failure_history: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
            failure_history: default_failure_history(),
        }
    }
}

fn default_failure_history() -> usize {
    crate::telemetry::DEFAULT_FAILURE_HISTORY
}

fn default_log_filter() -> String {
    "company_scout=info,tower_http=info".into()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub credentials: Credentials,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let cfg: Self = toml::from_str(&raw)
            .map_err(|err| ScoutError::Config(format!("failed to parse configuration: {err}")))?;
        Ok(cfg)
    }

    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();
        cfg.apply_overrides(|key| env::var(key).ok());
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_env_or_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut cfg = Self::from_file(path)?;
        cfg.apply_overrides(|key| env::var(key).ok());
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reads `COMPANY_SCOUT_CONFIG` when set, then applies environment overrides.
    pub fn load() -> Result<Self> {
        match env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_env_or_file(path),
            Err(_) => Self::from_env(),
        }
    }

    /// Apply overrides from a key lookup; the process environment in production.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            if let Ok(parsed) = port.trim().parse::<u16>() {
                self.server.port = parsed;
            }
        }
        if let Some(secret) = lookup("SECRET_KEY") {
            self.server.secret_key = Some(secret);
        }
        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.credentials.primary.openai_api_key = Some(key);
        }
        if let Some(key) = lookup("SERP_API_KEY") {
            self.credentials.primary.scaleserp_api_key = Some(key.clone());
            self.credentials.secondary.serpapi_api_key = Some(key);
        }
        if let Some(key) = lookup("OPENAI_API_KEY_2") {
            self.credentials.secondary.openai_api_key = Some(key);
        }
        if let Some(key) = lookup("GOOGLE_API_KEY") {
            self.credentials.secondary.google_api_key = Some(key);
        }
        if let Some(id) = lookup("GOOGLE_CSE_ID") {
            self.credentials.secondary.google_cse_id = Some(id);
        }
        if let Some(filter) = lookup("LOG_FILTER") {
            self.logging.filter = filter;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.retrieval.chunk_size == 0 {
            return Err(ScoutError::Config("retrieval.chunk_size must be positive".into()));
        }
        if self.agent.max_iterations == 0 {
            return Err(ScoutError::Config("agent.max_iterations must be positive".into()));
        }
        if self.agent.memory_window == 0 {
            return Err(ScoutError::Config("agent.memory_window must be positive".into()));
        }
        Ok(())
    }
}
