use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::RwLock;

use crate::config::ModelConfig;
use crate::error::{Result, ScoutError};

#[derive(Clone, Debug)]
pub struct Document {
    pub id: String,
    pub text: String,
    pub metadata: Value,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            metadata: Value::Null,
        }
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }
}

#[derive(Clone, Debug)]
pub struct ScoredDocument {
    pub document: Document,
    pub score: f32,
}

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn add(&self, document: Document, embedding: Vec<f32>) -> Result<()>;
    async fn search(&self, embedding: &[f32], top_k: usize) -> Result<Vec<ScoredDocument>>;
}

/// Whitespace tokens hashed into fixed buckets. Deterministic and offline.
pub struct HashingEmbedder {
    buckets: usize,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self { buckets: 64 }
    }
}

impl HashingEmbedder {
    pub fn new(buckets: usize) -> Self {
        Self {
            buckets: buckets.max(1),
        }
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0; self.buckets];

        for token in text.split_whitespace() {
            let token = token
                .trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase();
            if token.is_empty() {
                continue;
            }
            let mut hasher = std::collections::hash_map::DefaultHasher::new();
            token.hash(&mut hasher);
            let idx = (hasher.finish() as usize) % self.buckets;
            vector[idx] += 1.0;
        }

        Ok(vector)
    }
}

/// OpenAI `/embeddings` client.
#[derive(Clone)]
pub struct OpenAIEmbedder {
    http: reqwest::Client,
    model: String,
    api_key: String,
    base_url: String,
}

impl OpenAIEmbedder {
    pub fn from_config(cfg: &ModelConfig, api_key: Option<&str>) -> Result<Self> {
        let api_key = api_key
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ScoutError::Config("missing OpenAI API key for embeddings".into()))?;
        Ok(Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(cfg.timeout_secs))
                .build()
                .map_err(|err| ScoutError::Embedding(format!("http client error: {err}")))?,
            model: cfg.embedding_model.clone(),
            api_key: api_key.to_string(),
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ScoutError::Embedding("missing embedding".into()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let resp = self
            .http
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({ "model": self.model, "input": texts }))
            .send()
            .await
            .map_err(|err| ScoutError::Embedding(format!("OpenAI request error: {err}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ScoutError::Embedding(format!(
                "OpenAI embeddings failed with {status}: {body}"
            )));
        }

        let mut body: EmbeddingResponse = resp
            .json()
            .await
            .map_err(|err| ScoutError::Embedding(format!("OpenAI response parse error: {err}")))?;
        if body.data.len() != texts.len() {
            return Err(ScoutError::Embedding(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                body.data.len()
            )));
        }
        body.data.sort_by_key(|item| item.index);
        Ok(body.data.into_iter().map(|item| item.embedding).collect())
    }
}

#[derive(Default)]
pub struct InMemoryVectorStore {
    entries: RwLock<Vec<(Document, Vec<f32>)>>,
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn add(&self, document: Document, embedding: Vec<f32>) -> Result<()> {
        self.entries.write().await.push((document, embedding));
        Ok(())
    }

    async fn search(&self, embedding: &[f32], top_k: usize) -> Result<Vec<ScoredDocument>> {
        let entries = self.entries.read().await;
        let mut scored: Vec<ScoredDocument> = entries
            .iter()
            .map(|(doc, stored)| ScoredDocument {
                document: doc.clone(),
                score: cosine_similarity(stored, embedding),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(top_k);
        Ok(scored)
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0, 0.0, 0.0);
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a.sqrt() * norm_b.sqrt())
    }
}

/// Embedder plus vector store; the retrieval half of retrieval-augmented answers.
pub struct KnowledgeBase<E: Embedder + ?Sized, S: VectorStore> {
    embedder: Arc<E>,
    store: Arc<S>,
}

impl<E: Embedder + ?Sized, S: VectorStore> KnowledgeBase<E, S> {
    pub fn new(embedder: Arc<E>, store: Arc<S>) -> Self {
        Self { embedder, store }
    }

    /// Embed all documents in one batch, then index them.
    pub async fn add_documents(&self, documents: Vec<Document>) -> Result<()> {
        let texts: Vec<String> = documents.iter().map(|d| d.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != documents.len() {
            return Err(ScoutError::Embedding(format!(
                "expected {} embeddings, got {}",
                documents.len(),
                embeddings.len()
            )));
        }
        for (document, embedding) in documents.into_iter().zip(embeddings) {
            self.store.add(document, embedding).await?;
        }
        Ok(())
    }

    pub async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<ScoredDocument>> {
        let embedding = self.embedder.embed(query).await?;
        self.store.search(&embedding, top_k).await
    }
}
