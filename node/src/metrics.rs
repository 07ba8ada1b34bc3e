//! # Prometheus Metrics
//!
//! Operational metrics for the witness node, served at `/metrics` on both
//! the API port and the dedicated metrics port.
//!
//! All metrics live in a dedicated [`prometheus::Registry`] with the
//! `agewitness` prefix so they do not collide with the default global
//! registry.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use std::sync::Arc;

use crate::api::AppState;

/// Holds all Prometheus metric handles for the node.
///
/// prometheus handles are `Arc`s internally, so clones share counters.
#[derive(Clone)]
pub struct WitnessMetrics {
    registry: Registry,
    /// Witnesses this node published (submitted to the payload store).
    pub witnesses_published_total: IntCounter,
    /// Witnesses currently held in the in-memory store.
    pub witnesses_stored: IntGauge,
    /// Verification outcomes, labelled `passed` or by the failing check.
    pub verifications_total: IntCounterVec,
    /// Trade limits computed.
    pub limits_computed_total: IntCounter,
}

impl WitnessMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("agewitness".into()), None)?;

        let witnesses_published_total = IntCounter::new(
            "witnesses_published_total",
            "Total number of witnesses published by this node",
        )?;
        registry.register(Box::new(witnesses_published_total.clone()))?;

        let witnesses_stored = IntGauge::new(
            "witnesses_stored",
            "Number of witnesses in the in-memory witness store",
        )?;
        registry.register(Box::new(witnesses_stored.clone()))?;

        let verifications_total = IntCounterVec::new(
            Opts::new(
                "verifications_total",
                "Witness verifications by outcome (passed or failing check)",
            ),
            &["result"],
        )?;
        registry.register(Box::new(verifications_total.clone()))?;

        let limits_computed_total =
            IntCounter::new("limits_computed_total", "Total number of trade limits computed")?;
        registry.register(Box::new(limits_computed_total.clone()))?;

        Ok(Self {
            registry,
            witnesses_published_total,
            witnesses_stored,
            verifications_total,
            limits_computed_total,
        })
    }

    /// Records one verification outcome.
    pub fn record_verification(&self, result: &str) {
        self.verifications_total.with_label_values(&[result]).inc();
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// Shared metrics handle passed to axum handlers.
pub type SharedMetrics = Arc<WitnessMetrics>;

/// Axum handler that renders `/metrics` in Prometheus text format.
///
/// Refreshes the store-size gauge before encoding.
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    let stored = i64::try_from(state.store.len()).unwrap_or(i64::MAX);
    state.metrics.witnesses_stored.set(stored);

    match state.metrics.encode() {
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
