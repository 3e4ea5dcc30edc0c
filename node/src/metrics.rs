//! # Prometheus Metrics
//!
//! Operational metrics of the root node, scraped at `/metrics` on the
//! metrics port. All series live in a dedicated registry under the `tip3`
//! prefix.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

/// Metric handles of the node. Prometheus handles are internally
/// reference counted, so clones share the same series.
#[derive(Clone)]
pub struct NodeMetrics {
    registry: Registry,
    /// Operations accepted by the root, by RPC method.
    pub ops_processed_total: IntCounterVec,
    /// Operations the root refused, by error code.
    pub ops_rejected_total: IntCounterVec,
    /// Outbound messages delivered, by message kind.
    pub messages_dispatched_total: IntCounterVec,
    /// Bounced credits the root took back.
    pub bounces_reconciled_total: IntCounter,
    /// Current `total_supply`. Saturates at `i64::MAX`.
    pub total_supply: IntGauge,
    /// Current `total_granted`. Saturates at `i64::MAX`.
    pub total_granted: IntGauge,
    /// Messages persisted but not yet delivered.
    pub queue_depth: IntGauge,
    /// Time spent processing one operation including its message cascade.
    pub step_latency_seconds: Histogram,
}

impl NodeMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("tip3".into()), None)?;

        let ops_processed_total = IntCounterVec::new(
            Opts::new("ops_processed_total", "Operations accepted by the root"),
            &["op"],
        )?;
        registry.register(Box::new(ops_processed_total.clone()))?;

        let ops_rejected_total = IntCounterVec::new(
            Opts::new("ops_rejected_total", "Operations rejected by the root"),
            &["code"],
        )?;
        registry.register(Box::new(ops_rejected_total.clone()))?;

        let messages_dispatched_total = IntCounterVec::new(
            Opts::new("messages_dispatched_total", "Outbound messages delivered"),
            &["kind"],
        )?;
        registry.register(Box::new(messages_dispatched_total.clone()))?;

        let bounces_reconciled_total = IntCounter::new(
            "bounces_reconciled_total",
            "Bounced credits whose grant was taken back",
        )?;
        registry.register(Box::new(bounces_reconciled_total.clone()))?;

        let total_supply = IntGauge::new("total_supply", "Current total supply")?;
        registry.register(Box::new(total_supply.clone()))?;

        let total_granted = IntGauge::new("total_granted", "Current total granted")?;
        registry.register(Box::new(total_granted.clone()))?;

        let queue_depth = IntGauge::new("queue_depth", "Undelivered outbound messages")?;
        registry.register(Box::new(queue_depth.clone()))?;

        let step_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "step_latency_seconds",
                "Operation processing latency including delivered messages",
            )
            .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
        )?;
        registry.register(Box::new(step_latency_seconds.clone()))?;

        Ok(Self {
            registry,
            ops_processed_total,
            ops_rejected_total,
            messages_dispatched_total,
            bounces_reconciled_total,
            total_supply,
            total_granted,
            queue_depth,
            step_latency_seconds,
        })
    }

    /// Updates the ledger gauges.
    pub fn observe_ledger(&self, supply: u128, granted: u128) {
        self.total_supply.set(saturate(supply));
        self.total_granted.set(saturate(granted));
    }

    /// Encodes all registered metrics in the Prometheus text format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

fn saturate(v: u128) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

/// Shared metrics handle passed to axum handlers and the runtime.
pub type SharedMetrics = Arc<NodeMetrics>;

/// Renders `/metrics` in Prometheus text format.
pub async fn metrics_handler(State(metrics): State<SharedMetrics>) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_carry_the_prefix() {
        let metrics = NodeMetrics::new().unwrap();
        metrics
            .ops_processed_total
            .with_label_values(&["root_grantTokens"])
            .inc();
        metrics.observe_ledger(1_000, 250);
        let text = metrics.encode().unwrap();
        assert!(text.contains("tip3_ops_processed_total{op=\"root_grantTokens\"} 1"));
        assert!(text.contains("tip3_total_granted 250"));
    }

    #[test]
    fn huge_supply_saturates_the_gauge() {
        let metrics = NodeMetrics::new().unwrap();
        metrics.observe_ledger(u128::MAX, 0);
        assert_eq!(metrics.total_supply.get(), i64::MAX);
    }
}
