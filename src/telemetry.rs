use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Install the global tracing subscriber. `RUST_LOG` takes precedence over the
/// configured filter. Calling it twice is a no-op.
pub fn init_tracing(cfg: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if cfg.json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };
    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureRecord {
    pub context: String,
    pub error: String,
    pub timestamp: SystemTime,
}

/// Default number of failure records kept before the oldest are evicted.
pub const DEFAULT_FAILURE_HISTORY: usize = 256;

/// Keeps the most recent causes of failures that were recovered from, so a
/// fallback never hides why the primary path was abandoned.
#[derive(Clone)]
pub struct TelemetryCollector {
    capacity: usize,
    failures: Arc<Mutex<VecDeque<FailureRecord>>>,
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_FAILURE_HISTORY)
    }
}

impl TelemetryCollector {
    /// Retain at most `capacity` records; a zero capacity keeps one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            failures: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn record_failure(&self, context: impl Into<String>, error: impl Into<String>) {
        let record = FailureRecord {
            context: context.into(),
            error: error.into(),
            timestamp: SystemTime::now(),
        };
        if let Ok(mut failures) = self.failures.lock() {
            while failures.len() >= self.capacity {
                failures.pop_front();
            }
            failures.push_back(record);
        }
    }

    /// Retained records, oldest first.
    pub fn failures(&self) -> Vec<FailureRecord> {
        self.failures
            .lock()
            .map(|failures| failures.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn drain(&self) -> Vec<FailureRecord> {
        self.failures
            .lock()
            .map(|mut failures| failures.drain(..).collect())
            .unwrap_or_default()
    }
}
