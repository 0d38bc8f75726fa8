use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use habita::{HabitaConfig, SearchStack};
use metrics_exporter_prometheus::PrometheusHandle;

use crate::config::ServerConfig;
use crate::metrics::install_prometheus;

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Catalog, embedder, extractor and ranking engine (shared across requests)
    pub stack: SearchStack,

    /// Renders `/metrics` when metrics are enabled
    pub prometheus: Option<PrometheusHandle>,

    pub started_at: Instant,
}

impl ServerState {
    /// Build the search stack described by `config.habita_config`.
    pub fn new(config: ServerConfig) -> anyhow::Result<Self> {
        let habita = match &config.habita_config {
            Some(path) => HabitaConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => {
                let mut cfg = HabitaConfig::default();
                cfg.apply_env_overrides();
                cfg
            }
        };
        let stack = SearchStack::from_config(&habita).context("building search stack")?;
        Ok(Self::with_stack(config, stack))
    }

    /// Wrap an already assembled stack.
    pub fn with_stack(config: ServerConfig, stack: SearchStack) -> Self {
        let prometheus = if config.metrics_enabled {
            install_prometheus()
        } else {
            None
        };
        Self {
            config: Arc::new(config),
            stack,
            prometheus,
            started_at: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
