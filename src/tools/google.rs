//! Google Programmable Search tool.
//!
//! Queries the Custom Search JSON API and condenses the result snippets into a
//! single observation string for the agent.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{Result, ScoutError};
use crate::tool::{Tool, ToolRegistry};
use crate::tools::{SEARCH_DESCRIPTION, SEARCH_TOOL_NAME};

const NO_RESULT: &str = "No good Google Search Result was found";

#[derive(Clone, Debug)]
pub struct GoogleSearchConfig {
    pub api_key: String,
    pub cse_id: String,
    pub base_url: String,
    pub num_results: u32,
    pub timeout_secs: u64,
}

impl GoogleSearchConfig {
    pub fn new(api_key: impl Into<String>, cse_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            cse_id: cse_id.into(),
            base_url: "https://www.googleapis.com".into(),
            num_results: 10,
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

/// Registry holding only the Google `Search` tool.
pub fn google_search_toolkit(config: GoogleSearchConfig) -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register(GoogleSearchTool::new(config)?);
    Ok(registry)
}

pub struct GoogleSearchTool {
    config: GoogleSearchConfig,
    http: reqwest::Client,
}

impl GoogleSearchTool {
    pub fn new(config: GoogleSearchConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ScoutError::tool(SEARCH_TOOL_NAME, e))?;
        Ok(Self { config, http })
    }
}

#[async_trait]
impl Tool for GoogleSearchTool {
    fn name(&self) -> &str {
        SEARCH_TOOL_NAME
    }

    fn description(&self) -> &str {
        SEARCH_DESCRIPTION
    }

    async fn call(&self, input: &str) -> Result<String> {
        let url = format!("{}/customsearch/v1", self.config.base_url.trim_end_matches('/'));
        let num = self.config.num_results.to_string();
        let response = self
            .http
            .get(&url)
            .query(&[
                ("key", self.config.api_key.as_str()),
                ("cx", self.config.cse_id.as_str()),
                ("q", input),
                ("num", num.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ScoutError::tool(SEARCH_TOOL_NAME, e))?
            .error_for_status()
            .map_err(|e| ScoutError::tool(SEARCH_TOOL_NAME, e))?;

        let body: CustomSearchResponse = response
            .json()
            .await
            .map_err(|e| ScoutError::tool(SEARCH_TOOL_NAME, e))?;

        Ok(summarize(&body))
    }
}

#[derive(Debug, Deserialize, Default)]
struct CustomSearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    snippet: Option<String>,
}

fn summarize(body: &CustomSearchResponse) -> String {
    let snippets: Vec<&str> = body
        .items
        .iter()
        .filter_map(|item| item.snippet.as_deref())
        .collect();
    if snippets.is_empty() {
        NO_RESULT.to_string()
    } else {
        snippets.join(" ")
    }
}
