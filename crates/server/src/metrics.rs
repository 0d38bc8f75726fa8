//! Prometheus export of ranking metrics.

use std::sync::Arc;
use std::time::Duration;

use catalog::Scope;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use ranking::{set_ranking_metrics, RankingMetrics, SearchMode};

/// Forwards engine observations to the `metrics` facade.
#[derive(Debug, Default)]
pub struct PrometheusRankingMetrics;

impl RankingMetrics for PrometheusRankingMetrics {
    fn record_search(
        &self,
        scope: &Scope,
        mode: SearchMode,
        latency: Duration,
        pool_size: usize,
        hit_count: usize,
    ) {
        let scope_label = match scope {
            Scope::All => "all",
            Scope::Tenant(_) => "tenant",
        };
        metrics::counter!("habita_searches_total", "mode" => mode.as_str(), "scope" => scope_label)
            .increment(1);
        metrics::histogram!("habita_search_latency_seconds", "mode" => mode.as_str())
            .record(latency.as_secs_f64());
        metrics::histogram!("habita_search_pool_size", "mode" => mode.as_str())
            .record(pool_size as f64);
        metrics::histogram!("habita_search_hits", "mode" => mode.as_str()).record(hit_count as f64);
        if hit_count == 0 {
            metrics::counter!("habita_searches_empty_total", "mode" => mode.as_str()).increment(1);
        }
    }
}

/// Install the process-wide Prometheus recorder and hook it into the
/// ranking engine. Later calls reuse the first handle.
pub fn install_prometheus() -> Option<PrometheusHandle> {
    static HANDLE: OnceCell<Option<PrometheusHandle>> = OnceCell::new();
    HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                set_ranking_metrics(Some(Arc::new(PrometheusRankingMetrics)));
                Some(handle)
            }
            Err(err) => {
                tracing::warn!(error = %err, "prometheus recorder unavailable");
                None
            }
        })
        .clone()
}
