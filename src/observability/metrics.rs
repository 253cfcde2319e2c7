//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gameverse_retry_attempts_total` (counter): failed attempts that were retried, by category
//! - `gameverse_breaker_transitions_total` (counter): breaker state changes, by category and target state
//! - `gameverse_breaker_rejections_total` (counter): fast-failed calls, by category
//! - `gameverse_service_flag` (gauge): 1=enabled, 0=disabled, by service
//! - `gameverse_requests_total` (counter) / `gameverse_request_duration_seconds` (histogram): by route, status
//!
//! Recording is a no-op until a recorder is installed with [`init_metrics`].

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::registry::FlagStatus;
use crate::resilience::{BreakerState, FailureCategory};

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_retry(category: FailureCategory) {
    counter!("gameverse_retry_attempts_total", "category" => category.as_str()).increment(1);
}

pub fn record_breaker_transition(category: FailureCategory, to: BreakerState) {
    let to = match to {
        BreakerState::Closed => "closed",
        BreakerState::Open => "open",
    };
    counter!("gameverse_breaker_transitions_total", "category" => category.as_str(), "to" => to).increment(1);
}

pub fn record_breaker_rejection(category: FailureCategory) {
    counter!("gameverse_breaker_rejections_total", "category" => category.as_str()).increment(1);
}

pub fn record_service_flag(service: &str, status: FlagStatus) {
    gauge!("gameverse_service_flag", "service" => service.to_string()).set(f64::from(u8::from(status)));
}

pub fn record_request(route: &str, status: u16, start: Instant) {
    let (route, status) = (route.to_string(), status.to_string());
    counter!("gameverse_requests_total", "route" => route.clone(), "status" => status.clone()).increment(1);
    histogram!("gameverse_request_duration_seconds", "route" => route, "status" => status)
        .record(start.elapsed().as_secs_f64());
}
