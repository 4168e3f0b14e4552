//! Scrape-and-retrieve strategy: search results are chunked, embedded into a
//! per-request index and a fixed battery of questions is answered from the
//! most similar chunks.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::time::timeout;
use tracing::{debug, info};

use crate::error::{Result, ScoutError};
use crate::knowledge::{Document, Embedder, InMemoryVectorStore, KnowledgeBase};
use crate::llm::LanguageModel;
use crate::profile::{CompanyProfile, CompanyQuery, ProfileStrategy, RETRIEVAL_QUESTIONS};
use crate::splitter::TextSplitter;

/// Produces the raw documents a profile is built from.
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    async fn load(&self, query: &CompanyQuery) -> Result<Vec<Document>>;
}

/// Loads the ScaleSerp search results page for a company as one document.
pub struct ScaleSerpLoader {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl ScaleSerpLoader {
    pub fn new(api_key: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .map_err(|err| ScoutError::Retrieval(format!("http client error: {err}")))?,
            api_key: api_key.into(),
            base_url: "https://api.scaleserp.com".into(),
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn url(&self, query: &CompanyQuery) -> String {
        format!(
            "{}/search?api_key={}&q={}&location={}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(&self.api_key),
            urlencoding::encode(&query.company),
            urlencoding::encode(&query.country),
        )
    }
}

#[async_trait]
impl DocumentLoader for ScaleSerpLoader {
    async fn load(&self, query: &CompanyQuery) -> Result<Vec<Document>> {
        let resp = self
            .http
            .get(self.url(query))
            .send()
            .await
            .map_err(|err| ScoutError::Retrieval(format!("scaleserp request error: {err}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ScoutError::Retrieval(format!(
                "scaleserp request failed with {status}: {body}"
            )));
        }

        let body = resp
            .text()
            .await
            .map_err(|err| ScoutError::Retrieval(format!("scaleserp body error: {err}")))?;
        let text = match serde_json::from_str::<Value>(&body) {
            Ok(value) => flatten_json(&value),
            Err(_) => body,
        };

        let source = format!("{}/search", self.base_url.trim_end_matches('/'));
        Ok(vec![Document::new("scaleserp-0", text).with_metadata(json!({
            "source": source,
            "company": query.company,
            "country": query.country,
        }))])
    }
}

/// Render string and number leaves as `path: value` lines, objects in key order.
pub fn flatten_json(value: &Value) -> String {
    let mut lines = Vec::new();
    flatten_into(value, "", &mut lines);
    lines.join("\n")
}

fn flatten_into(value: &Value, path: &str, lines: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let next = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                flatten_into(child, &next, lines);
            }
        }
        Value::Array(items) => {
            for child in items {
                flatten_into(child, path, lines);
            }
        }
        Value::String(s) if !s.trim().is_empty() => lines.push(format!("{path}: {}", s.trim())),
        Value::Number(n) => lines.push(format!("{path}: {n}")),
        _ => {}
    }
}

/// Prompt that answers a question from retrieved context only.
pub fn stuff_prompt(context: &[String], question: &str) -> String {
    format!(
        "Use the following pieces of context to answer the question at the end. If you don't know the answer, just say that you don't know, don't try to make up an answer.\n\n{}\n\nQuestion: {}\nHelpful Answer:",
        context.join("\n\n"),
        question
    )
}

pub struct RetrievalStrategy<M: LanguageModel, E: Embedder + ?Sized> {
    model: Arc<M>,
    embedder: Arc<E>,
    loader: Arc<dyn DocumentLoader>,
    splitter: TextSplitter,
    top_k: usize,
    model_timeout: Duration,
}

impl<M: LanguageModel, E: Embedder + ?Sized> RetrievalStrategy<M, E> {
    pub fn new(model: Arc<M>, embedder: Arc<E>, loader: Arc<dyn DocumentLoader>) -> Self {
        Self {
            model,
            embedder,
            loader,
            splitter: TextSplitter::new(1000, 0),
            top_k: 4,
            model_timeout: Duration::from_secs(60),
        }
    }

    pub fn with_splitter(mut self, splitter: TextSplitter) -> Self {
        self.splitter = splitter;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub fn with_model_timeout(mut self, limit: Duration) -> Self {
        self.model_timeout = limit;
        self
    }

    async fn build_index(
        &self,
        query: &CompanyQuery,
    ) -> Result<KnowledgeBase<E, InMemoryVectorStore>> {
        let documents = self.loader.load(query).await?;
        let mut chunks = Vec::new();
        for document in documents {
            for (i, text) in self.splitter.split_text(&document.text).into_iter().enumerate() {
                chunks.push(
                    Document::new(format!("{}#{i}", document.id), text)
                        .with_metadata(document.metadata.clone()),
                );
            }
        }
        if chunks.is_empty() {
            return Err(ScoutError::Retrieval(format!(
                "no searchable text found for {}",
                query.company
            )));
        }
        debug!(chunks = chunks.len(), "indexing search results");

        let kb = KnowledgeBase::new(
            self.embedder.clone(),
            Arc::new(InMemoryVectorStore::default()),
        );
        kb.add_documents(chunks).await?;
        Ok(kb)
    }

    async fn answer(
        &self,
        kb: &KnowledgeBase<E, InMemoryVectorStore>,
        question: &str,
    ) -> Result<String> {
        let hits = kb.retrieve(question, self.top_k).await?;
        let context: Vec<String> = hits.into_iter().map(|hit| hit.document.text).collect();
        let prompt = stuff_prompt(&context, question);
        let answer = timeout(self.model_timeout, self.model.complete(&prompt, &[]))
            .await
            .map_err(|_| ScoutError::Timeout {
                operation: "model call".into(),
                after: self.model_timeout,
            })??;
        Ok(answer.trim().to_string())
    }
}

#[async_trait]
impl<M, E> ProfileStrategy for RetrievalStrategy<M, E>
where
    M: LanguageModel + 'static,
    E: Embedder + ?Sized + 'static,
{
    fn name(&self) -> &str {
        "retrieval"
    }

    async fn profile(&self, query: &CompanyQuery) -> Result<CompanyProfile> {
        info!(company = %query.company, country = %query.country, "retrieval profile started");
        let kb = self.build_index(query).await?;

        let mut answers = Vec::with_capacity(RETRIEVAL_QUESTIONS.len());
        for question in RETRIEVAL_QUESTIONS {
            answers.push(self.answer(&kb, question).await?);
        }
        let mut answers = answers.into_iter();
        let mut next = || answers.next().unwrap_or_default();

        Ok(CompanyProfile {
            overview: next(),
            products: next(),
            keywords: next(),
            image: Some(next()),
            address: Some(next()),
        })
    }
}
