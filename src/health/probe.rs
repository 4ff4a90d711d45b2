//! Store reachability probe.

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::observability::metrics;
use crate::store::StoreHealth;

/// Result of one probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    /// The process is up and answering.
    pub serving: bool,
    pub store_reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Ping the store, giving up after `timeout`.
///
/// Never fails and never waits meaningfully longer than `timeout`.
pub async fn check(store: &dyn StoreHealth, timeout: Duration) -> HealthReport {
    let started = Instant::now();
    let result = tokio::time::timeout(timeout, store.ping()).await;

    let report = match result {
        Ok(Ok(())) => HealthReport {
            serving: true,
            store_reachable: true,
            error: None,
        },
        Ok(Err(e)) => HealthReport {
            serving: true,
            store_reachable: false,
            error: Some(e.to_string()),
        },
        Err(_) => HealthReport {
            serving: true,
            store_reachable: false,
            error: Some(format!("store ping timed out after {}ms", timeout.as_millis())),
        },
    };

    tracing::debug!(
        reachable = report.store_reachable,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Store health probe finished"
    );
    metrics::record_store_reachable(report.store_reachable);
    report
}
