//! Company research over web search and language models.
//!
//! Two strategies produce a [`CompanyProfile`]:
//! - Retrieval QA over search results, answering a fixed set of questions.
//! - A ReAct agent that drives a web-search tool, used when the first
//!   strategy fails upstream.
//!
//! [`CompanyProfiler`] picks between them; the `server` feature exposes it
//! over HTTP.

pub mod agent;
pub mod config;
pub mod error;
pub mod knowledge;
pub mod llm;
pub mod memory;
pub mod orchestrator;
pub mod parser;
pub mod profile;
pub mod prompt;
pub mod research;
pub mod retrieval;
#[cfg(feature = "server")]
pub mod server;
pub mod splitter;
pub mod telemetry;
pub mod tool;
pub mod tools;

pub use agent::{Agent, AgentRun, AgentState, AgentStep, OBSERVATION_STOP};
pub use config::{
    AgentConfig, AppConfig, Credentials, LoggingConfig, ModelConfig, RetrievalConfig,
    SearchProvider, ServerConfig,
};
pub use error::{Result, ScoutError};
pub use knowledge::{
    Document, Embedder, HashingEmbedder, InMemoryVectorStore, KnowledgeBase, OpenAIEmbedder,
    ScoredDocument, VectorStore,
};
pub use llm::{truncate_at_stop, LanguageModel, OpenAIClient, StubModel};
pub use memory::{Exchange, WindowMemory};
pub use orchestrator::CompanyProfiler;
pub use parser::{AgentAction, AgentFinish, AgentOutput, OutputParser};
pub use profile::{CompanyProfile, CompanyQuery, ProfileStrategy};
pub use prompt::PromptTemplate;
pub use research::ResearchStrategy;
pub use retrieval::{DocumentLoader, RetrievalStrategy, ScaleSerpLoader};
pub use splitter::TextSplitter;
pub use telemetry::{init_tracing, FailureRecord, TelemetryCollector};
pub use tool::{Tool, ToolRegistry};
