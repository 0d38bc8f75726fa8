use once_cell::sync::OnceCell;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use catalog::Scope;

use crate::types::SearchMode;

/// Observer for completed searches.
pub trait RankingMetrics: Send + Sync {
    fn record_search(
        &self,
        scope: &Scope,
        mode: SearchMode,
        latency: Duration,
        pool_size: usize,
        hit_count: usize,
    );
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn RankingMetrics>>> {
    static METRICS: OnceCell<RwLock<Option<Arc<dyn RankingMetrics>>>> = OnceCell::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

pub(crate) fn metrics_recorder() -> Option<Arc<dyn RankingMetrics>> {
    metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}

/// Install or clear the global recorder.
pub fn set_ranking_metrics(recorder: Option<Arc<dyn RankingMetrics>>) {
    let mut guard = metrics_lock()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}
