use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::config::{AppConfig, SearchProvider};
use crate::error::{Result, ScoutError};
use crate::knowledge::OpenAIEmbedder;
use crate::llm::OpenAIClient;
use crate::profile::{CompanyProfile, CompanyQuery, ProfileStrategy};
use crate::research::ResearchStrategy;
use crate::retrieval::{RetrievalStrategy, ScaleSerpLoader};
use crate::splitter::TextSplitter;
use crate::telemetry::TelemetryCollector;
use crate::tool::ToolRegistry;
use crate::tools::{google_search_toolkit, serpapi_toolkit, GoogleSearchConfig, SerpApiConfig};

/// Runs the primary strategy and falls back to the secondary one when an
/// upstream provider fails. Other errors propagate unchanged.
pub struct CompanyProfiler {
    primary: Option<Arc<dyn ProfileStrategy>>,
    secondary: Option<Arc<dyn ProfileStrategy>>,
    telemetry: TelemetryCollector,
}

impl CompanyProfiler {
    pub fn new(primary: Arc<dyn ProfileStrategy>, secondary: Arc<dyn ProfileStrategy>) -> Self {
        Self {
            primary: Some(primary),
            secondary: Some(secondary),
            telemetry: TelemetryCollector::default(),
        }
    }

    pub fn from_strategies(
        primary: Option<Arc<dyn ProfileStrategy>>,
        secondary: Option<Arc<dyn ProfileStrategy>>,
    ) -> Result<Self> {
        if primary.is_none() && secondary.is_none() {
            return Err(ScoutError::Config(
                "no profile strategy is configured; set OPENAI_API_KEY and SERP_API_KEY or the secondary credentials".into(),
            ));
        }
        Ok(Self {
            primary,
            secondary,
            telemetry: TelemetryCollector::default(),
        })
    }

    /// Wire both strategies from configuration. A strategy whose credentials
    /// are missing is left out instead of failing startup.
    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        let primary = match build_primary(cfg) {
            Ok(strategy) => Some(strategy),
            Err(ScoutError::Config(reason)) => {
                warn!(%reason, "retrieval strategy disabled");
                None
            }
            Err(err) => return Err(err),
        };
        let secondary = match build_secondary(cfg) {
            Ok(strategy) => Some(strategy),
            Err(ScoutError::Config(reason)) => {
                warn!(%reason, "agent strategy disabled");
                None
            }
            Err(err) => return Err(err),
        };
        Ok(Self::from_strategies(primary, secondary)?
            .with_telemetry(TelemetryCollector::with_capacity(cfg.logging.failure_history)))
    }

    pub fn with_telemetry(mut self, telemetry: TelemetryCollector) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn telemetry(&self) -> &TelemetryCollector {
        &self.telemetry
    }

    pub async fn profile(&self, query: &CompanyQuery) -> Result<CompanyProfile> {
        let Some(primary) = &self.primary else {
            return self.run_secondary(query).await;
        };

        match primary.profile(query).await {
            Ok(profile) => {
                info!(strategy = primary.name(), company = %query.company, "profile ready");
                Ok(profile)
            }
            Err(err) if err.is_upstream_failure() && self.secondary.is_some() => {
                warn!(
                    strategy = primary.name(),
                    error = %err,
                    "primary strategy failed, falling back"
                );
                self.telemetry.record_failure(primary.name(), err.to_string());
                self.run_secondary(query).await
            }
            Err(err) => Err(err),
        }
    }

    async fn run_secondary(&self, query: &CompanyQuery) -> Result<CompanyProfile> {
        let secondary = self
            .secondary
            .as_ref()
            .ok_or_else(|| ScoutError::Config("no secondary strategy configured".into()))?;
        match secondary.profile(query).await {
            Ok(profile) => {
                info!(strategy = secondary.name(), company = %query.company, "profile ready");
                Ok(profile)
            }
            Err(err) => {
                error!(strategy = secondary.name(), error = %err, "secondary strategy failed");
                Err(err)
            }
        }
    }
}

fn build_primary(cfg: &AppConfig) -> Result<Arc<dyn ProfileStrategy>> {
    let creds = &cfg.credentials.primary;
    let model = OpenAIClient::from_config(&cfg.model, creds.openai_api_key.as_deref())?;
    let embedder = OpenAIEmbedder::from_config(&cfg.model, creds.openai_api_key.as_deref())?;
    let key = creds
        .scaleserp_api_key
        .as_deref()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| ScoutError::Config("missing SERP_API_KEY".into()))?;
    let mut loader = ScaleSerpLoader::new(key, cfg.retrieval.timeout_secs)?;
    if let Some(url) = &cfg.retrieval.scaleserp_base_url {
        loader = loader.with_base_url(url.clone());
    }

    let strategy = RetrievalStrategy::new(Arc::new(model), Arc::new(embedder), Arc::new(loader))
        .with_splitter(TextSplitter::new(
            cfg.retrieval.chunk_size,
            cfg.retrieval.chunk_overlap,
        ))
        .with_top_k(cfg.retrieval.top_k)
        .with_model_timeout(Duration::from_secs(cfg.model.timeout_secs));
    Ok(Arc::new(strategy))
}

fn build_secondary(cfg: &AppConfig) -> Result<Arc<dyn ProfileStrategy>> {
    let creds = &cfg.credentials.secondary;
    let model = OpenAIClient::from_config(&cfg.model, creds.openai_api_key.as_deref())?;
    let tools = search_tools(cfg)?;

    let strategy = ResearchStrategy::new(Arc::new(model), tools)
        .with_memory_window(cfg.agent.memory_window)
        .with_max_iterations(cfg.agent.max_iterations)
        .with_timeouts(
            Duration::from_secs(cfg.model.timeout_secs),
            Duration::from_secs(cfg.agent.tool_timeout_secs),
        );
    Ok(Arc::new(strategy))
}

fn search_tools(cfg: &AppConfig) -> Result<ToolRegistry> {
    let creds = &cfg.credentials.secondary;
    let required = |value: &Option<String>, name: &str| {
        value
            .clone()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ScoutError::Config(format!("missing {name}")))
    };

    match cfg.agent.search_provider {
        SearchProvider::Google => {
            let mut config = GoogleSearchConfig::new(
                required(&creds.google_api_key, "GOOGLE_API_KEY")?,
                required(&creds.google_cse_id, "GOOGLE_CSE_ID")?,
            )
            .with_timeout_secs(cfg.agent.tool_timeout_secs);
            if let Some(url) = &cfg.agent.google_base_url {
                config = config.with_base_url(url.clone());
            }
            google_search_toolkit(config)
        }
        SearchProvider::SerpApi => {
            let mut config = SerpApiConfig::new(required(&creds.serpapi_api_key, "SERP_API_KEY")?)
                .with_timeout_secs(cfg.agent.tool_timeout_secs);
            if let Some(url) = &cfg.agent.serpapi_base_url {
                config = config.with_base_url(url.clone());
            }
            serpapi_toolkit(config)
        }
    }
}
