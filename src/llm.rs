//! Language model abstraction and the OpenAI-compatible completion client.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ModelConfig;
use crate::error::{Result, ScoutError};

/// Minimal abstraction around a text completion provider.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Complete `prompt`, stopping generation before any of `stop`.
    async fn complete(&self, prompt: &str, stop: &[String]) -> Result<String>;
}

/// Cut `text` at the first occurrence of any stop sequence.
pub fn truncate_at_stop<'a>(text: &'a str, stop: &[String]) -> &'a str {
    let cut = stop
        .iter()
        .filter(|s| !s.is_empty())
        .filter_map(|s| text.find(s.as_str()))
        .min();
    match cut {
        Some(idx) => &text[..idx],
        None => text,
    }
}

fn coalesce_error(status: reqwest::StatusCode, body: &str, provider: &str) -> ScoutError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return ScoutError::LanguageModel(format!("{provider} rate limit exceeded: {body}"));
    }
    ScoutError::LanguageModel(format!("{provider} request failed with {status}: {body}"))
}

#[derive(Clone)]
pub struct OpenAIClient {
    http: reqwest::Client,
    model: String,
    api_key: String,
    base_url: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAIClient {
    /// Build a client for `api_key`; keys are never read from the environment here.
    pub fn from_config(cfg: &ModelConfig, api_key: Option<&str>) -> Result<Self> {
        let api_key = api_key
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ScoutError::Config("missing OpenAI API key".into()))?;
        Ok(Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(cfg.timeout_secs))
                .build()
                .map_err(|err| ScoutError::LanguageModel(format!("http client error: {err}")))?,
            model: cfg.model.clone(),
            api_key: api_key.to_string(),
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            temperature: cfg.temperature,
            max_tokens: cfg.max_tokens,
        })
    }
}

#[async_trait]
impl LanguageModel for OpenAIClient {
    async fn complete(&self, prompt: &str, stop: &[String]) -> Result<String> {
        let payload = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user".into(),
                content: prompt.to_string(),
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stop: if stop.is_empty() { None } else { Some(stop) },
        };

        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|err| ScoutError::LanguageModel(format!("OpenAI request error: {err}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(coalesce_error(status, &body, "openai"));
        }

        let body: ChatResponse = resp.json().await.map_err(|err| {
            ScoutError::LanguageModel(format!("OpenAI response parse error: {err}"))
        })?;

        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| ScoutError::LanguageModel("OpenAI returned no choices".into()))
    }
}

/// A deterministic model used for tests and demos. Replays scripted completions
/// in order and keeps every prompt it was given.
pub struct StubModel {
    responses: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl StubModel {
    pub fn new(responses: Vec<String>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|prompts| prompts.clone())
            .unwrap_or_default()
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().map(|r| r.len()).unwrap_or_default()
    }
}

#[async_trait]
impl LanguageModel for StubModel {
    async fn complete(&self, prompt: &str, _stop: &[String]) -> Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        let mut locked = self
            .responses
            .lock()
            .map_err(|_| ScoutError::LanguageModel("stub model poisoned".into()))?;
        locked.pop_front().ok_or_else(|| {
            ScoutError::LanguageModel("StubModel ran out of scripted responses".into())
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a [String]>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stops() -> Vec<String> {
        vec!["\nObservation:".to_string()]
    }

    #[test]
    fn truncates_at_first_stop_sequence() {
        let raw = "Thought: look it up\nAction: Search\nAction Input: acme\nObservation: made up\nThought: done";
        assert_eq!(
            truncate_at_stop(raw, &stops()),
            "Thought: look it up\nAction: Search\nAction Input: acme"
        );
    }

    #[test]
    fn leaves_text_without_stop_untouched() {
        assert_eq!(truncate_at_stop("Final Answer: 42", &stops()), "Final Answer: 42");
        assert_eq!(truncate_at_stop("abc", &[]), "abc");
    }

    #[tokio::test]
    async fn stub_replays_in_order_and_records_prompts() {
        let model = StubModel::new(vec!["one".into(), "two".into()]);

        assert_eq!(model.complete("p1", &[]).await.unwrap(), "one");
        assert_eq!(model.complete("p2", &[]).await.unwrap(), "two");
        assert!(matches!(
            model.complete("p3", &[]).await,
            Err(ScoutError::LanguageModel(_))
        ));
        assert_eq!(model.prompts(), vec!["p1", "p2", "p3"]);
    }

    #[test]
    fn client_requires_a_key() {
        let cfg = ModelConfig::default();
        assert!(matches!(
            OpenAIClient::from_config(&cfg, None),
            Err(ScoutError::Config(_))
        ));
        assert!(OpenAIClient::from_config(&cfg, Some("sk-test")).is_ok());
    }
}
