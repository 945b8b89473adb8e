//! # Prometheus Metrics
//!
//! Operational metrics for the registry node, scraped by Prometheus at
//! the `/metrics` endpoint on the configured metrics port.
//!
//! Counters are bumped by the API handlers as mutations succeed; gauges
//! are resynced from the registry after every mutation, so a scrape
//! always sees a consistent snapshot.
//!
//! All metrics live in a dedicated [`prometheus::Registry`] so they do
//! not collide with any default global registry consumers.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use std::sync::Arc;

/// Holds all Prometheus metric handles for the node.
///
/// Clone-friendly (prometheus handles are internally `Arc`) so it can be
/// shared across request handlers.
#[derive(Clone)]
pub struct NodeMetrics {
    /// Prometheus registry that owns all metrics below.
    registry: Registry,
    /// Total spinners minted since startup.
    pub spinners_minted_total: IntCounter,
    /// Total ownership transfers, by any path.
    pub transfers_total: IntCounter,
    /// Total marketplace settlements (offer buys, accepted bids, tier sales).
    pub sales_total: IntCounter,
    /// Cumulative settlement volume in base units.
    pub sale_volume_total: IntCounter,
    /// Standing offers right now.
    pub active_offers: IntGauge,
    /// Standing bids right now.
    pub active_bids: IntGauge,
    /// Total value the registry currently holds.
    pub held_value: IntGauge,
    /// Total pending pull-payment balances.
    pub pending_total: IntGauge,
}

impl NodeMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some("gyro".into()), None)
            .expect("failed to create prometheus registry");

        let spinners_minted_total = IntCounter::new(
            "spinners_minted_total",
            "Total spinners minted since startup",
        )
        .expect("metric creation");
        registry
            .register(Box::new(spinners_minted_total.clone()))
            .expect("metric registration");

        let transfers_total = IntCounter::new(
            "transfers_total",
            "Total ownership transfers by any path",
        )
        .expect("metric creation");
        registry
            .register(Box::new(transfers_total.clone()))
            .expect("metric registration");

        let sales_total = IntCounter::new(
            "sales_total",
            "Total marketplace settlements including direct tier sales",
        )
        .expect("metric creation");
        registry
            .register(Box::new(sales_total.clone()))
            .expect("metric registration");

        let sale_volume_total = IntCounter::new(
            "sale_volume_total",
            "Cumulative settlement volume in base units",
        )
        .expect("metric creation");
        registry
            .register(Box::new(sale_volume_total.clone()))
            .expect("metric registration");

        let active_offers = IntGauge::new("active_offers", "Number of standing sale offers")
            .expect("metric creation");
        registry
            .register(Box::new(active_offers.clone()))
            .expect("metric registration");

        let active_bids =
            IntGauge::new("active_bids", "Number of standing bids").expect("metric creation");
        registry
            .register(Box::new(active_bids.clone()))
            .expect("metric registration");

        let held_value = IntGauge::new(
            "held_value",
            "Total value held by the registry in base units",
        )
        .expect("metric creation");
        registry
            .register(Box::new(held_value.clone()))
            .expect("metric registration");

        let pending_total = IntGauge::new(
            "pending_total",
            "Total pending pull-payment balances in base units",
        )
        .expect("metric creation");
        registry
            .register(Box::new(pending_total.clone()))
            .expect("metric registration");

        Self {
            registry,
            spinners_minted_total,
            transfers_total,
            sales_total,
            sale_volume_total,
            active_offers,
            active_bids,
            held_value,
            pending_total,
        }
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer).expect("prometheus output is valid utf-8"))
    }
}

/// Shared metrics state passed to axum handlers.
pub type SharedMetrics = Arc<NodeMetrics>;

/// Axum handler that renders `/metrics` in Prometheus text format.
///
/// Returns HTTP 500 if encoding fails (should never happen in practice).
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}
