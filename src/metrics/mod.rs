/*!
 * # Metrics Module
 *
 * Prometheus counters for command outcomes and optimistic-concurrency
 * behaviour. Everything is registered in a crate-level [`REGISTRY`] so a
 * host process can expose it with [`gather_text`].
 */

use lazy_static::lazy_static;
use prometheus::core::Collector;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use tracing::warn;

use crate::errors::ServiceError;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref COMMANDS_SUCCEEDED: IntCounterVec = registered(
        IntCounterVec::new(
            Opts::new("commands_succeeded_total", "Commands that completed successfully"),
            &["command"]
        )
        .expect("metric can be created")
    );
    pub static ref COMMANDS_FAILED: IntCounterVec = registered(
        IntCounterVec::new(
            Opts::new("commands_failed_total", "Commands that returned an error"),
            &["command", "error_type"]
        )
        .expect("metric can be created")
    );
    pub static ref CONCURRENCY_RETRIES: IntCounter = registered(
        IntCounter::new(
            "concurrency_retries_total",
            "Attempts repeated after an optimistic-concurrency conflict"
        )
        .expect("metric can be created")
    );
    pub static ref CONCURRENCY_CONFLICTS: IntCounter = registered(
        IntCounter::new(
            "concurrency_conflicts_total",
            "Commands that gave up after exhausting concurrency retries"
        )
        .expect("metric can be created")
    );
}

/// Registers `collector` in [`REGISTRY`] and hands it back. Registration
/// failures are logged; the collector still counts.
pub fn registered<C>(collector: C) -> C
where
    C: Collector + Clone + 'static,
{
    if let Err(e) = REGISTRY.register(Box::new(collector.clone())) {
        warn!("Failed to register metric: {}", e);
    }
    collector
}

pub fn record_success(command: &str) {
    COMMANDS_SUCCEEDED.with_label_values(&[command]).inc();
}

pub fn record_failure(command: &str, error: &ServiceError) {
    COMMANDS_FAILED
        .with_label_values(&[command, error.kind()])
        .inc();
}

/// Renders all registered metrics in the Prometheus text format.
pub fn gather_text() -> Result<String, ServiceError> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&REGISTRY.gather(), &mut buffer)
        .map_err(|e| ServiceError::InternalError(format!("Failed to encode metrics: {}", e)))?;
    String::from_utf8(buffer)
        .map_err(|e| ServiceError::InternalError(format!("Metrics are not valid UTF-8: {}", e)))
}
