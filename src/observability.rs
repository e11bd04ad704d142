//! Request counters reported by the health endpoint

use std::sync::atomic::{AtomicU64, Ordering};

use axum::http::StatusCode;
use serde::Serialize;

/// Metrics handle for recording counters
#[derive(Debug, Default)]
pub struct Metrics {
    responses_ok: AtomicU64,
    responses_not_modified: AtomicU64,
    client_errors: AtomicU64,
    server_errors: AtomicU64,
    meta_lookups_failed: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a response of a resource or manifest route
    pub fn record_response(&self, status: StatusCode) {
        let counter = if status == StatusCode::NOT_MODIFIED {
            &self.responses_not_modified
        } else if status.is_server_error() {
            &self.server_errors
        } else if status.is_client_error() {
            &self.client_errors
        } else {
            &self.responses_ok
        };
        counter.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(status = status.as_u16(), "Metric incremented");
    }

    pub fn meta_lookup_failed(&self) {
        self.meta_lookups_failed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "meta_lookups_failed", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            responses_ok: self.responses_ok.load(Ordering::Relaxed),
            responses_not_modified: self.responses_not_modified.load(Ordering::Relaxed),
            client_errors: self.client_errors.load(Ordering::Relaxed),
            server_errors: self.server_errors.load(Ordering::Relaxed),
            meta_lookups_failed: self.meta_lookups_failed.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub responses_ok: u64,
    pub responses_not_modified: u64,
    pub client_errors: u64,
    pub server_errors: u64,
    pub meta_lookups_failed: u64,
}
