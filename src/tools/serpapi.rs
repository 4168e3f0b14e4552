//! SerpAPI search tool, an alternate provider for the agent's `Search` tool.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{Result, ScoutError};
use crate::tool::{Tool, ToolRegistry};
use crate::tools::{SEARCH_DESCRIPTION, SEARCH_TOOL_NAME};

const NO_RESULT: &str = "No good search result found";

#[derive(Clone, Debug)]
pub struct SerpApiConfig {
    pub api_key: String,
    pub base_url: String,
    pub engine: String,
    pub timeout_secs: u64,
}

impl SerpApiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://serpapi.com".into(),
            engine: "google".into(),
            timeout_secs: 10,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

pub fn serpapi_toolkit(config: SerpApiConfig) -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register(SerpApiSearchTool::new(config)?);
    Ok(registry)
}

pub struct SerpApiSearchTool {
    config: SerpApiConfig,
    http: reqwest::Client,
}

impl SerpApiSearchTool {
    pub fn new(config: SerpApiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ScoutError::tool(SEARCH_TOOL_NAME, e))?;
        Ok(Self { config, http })
    }
}

#[async_trait]
impl Tool for SerpApiSearchTool {
    fn name(&self) -> &str {
        SEARCH_TOOL_NAME
    }

    fn description(&self) -> &str {
        SEARCH_DESCRIPTION
    }

    async fn call(&self, input: &str) -> Result<String> {
        let url = format!(
            "{}/search?engine={}&q={}&api_key={}",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(&self.config.engine),
            urlencoding::encode(input),
            urlencoding::encode(&self.config.api_key),
        );

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ScoutError::tool(SEARCH_TOOL_NAME, e))?;
        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| ScoutError::tool(SEARCH_TOOL_NAME, e))?;

        if let Some(message) = body.get("error").and_then(Value::as_str) {
            return Err(ScoutError::ToolInvocation {
                name: SEARCH_TOOL_NAME.into(),
                source: format!("serpapi returned an error: {message}").into(),
            });
        }
        if !status.is_success() {
            return Err(ScoutError::ToolInvocation {
                name: SEARCH_TOOL_NAME.into(),
                source: format!("serpapi request failed with {status}").into(),
            });
        }

        Ok(extract_answer(&body))
    }
}

/// Pick the most direct answer SerpAPI offers, falling back to the first
/// organic snippet.
fn extract_answer(body: &Value) -> String {
    let candidates = [
        body.pointer("/answer_box/answer"),
        body.pointer("/answer_box/snippet"),
        body.pointer("/knowledge_graph/description"),
        body.pointer("/organic_results/0/snippet"),
    ];
    candidates
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|text| !text.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| NO_RESULT.to_string())
}
