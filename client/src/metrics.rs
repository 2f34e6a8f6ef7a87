//! Client metrics.
//!
//! Counters are recorded through the `metrics` facade; installing an exporter
//! (Prometheus or otherwise) is left to the embedding application.
//!
//! - `lexis_client_requests_total{outcome}`: completed requests
//! - `lexis_client_refresh_total{outcome}`: refresh cycles by result
//! - `lexis_client_queued_total`: requests queued behind an in-flight refresh
//! - `lexis_client_replays_total`: requests reissued after a refresh

use metrics::{counter, describe_counter};

/// Completed requests, labelled by outcome.
pub const REQUESTS_TOTAL: &str = "lexis_client_requests_total";
/// Refresh cycles, labelled by outcome.
pub const REFRESH_TOTAL: &str = "lexis_client_refresh_total";
/// Requests queued behind an in-flight refresh.
pub const QUEUED_TOTAL: &str = "lexis_client_queued_total";
/// Requests replayed after a refresh.
pub const REPLAYS_TOTAL: &str = "lexis_client_replays_total";

/// Refresh cycle result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshResult {
    /// New session stored
    Success,
    /// Refresh call failed
    Failure,
    /// No refresh token, no call made
    Skipped,
}

impl RefreshResult {
    const fn label(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Skipped => "skipped",
        }
    }
}

/// Register metric descriptions with the installed recorder.
pub fn describe_metrics() {
    describe_counter!(REQUESTS_TOTAL, "Admin API requests completed, by outcome");
    describe_counter!(REFRESH_TOTAL, "Session refresh cycles, by outcome");
    describe_counter!(QUEUED_TOTAL, "Requests queued behind an in-flight refresh");
    describe_counter!(REPLAYS_TOTAL, "Requests replayed with a refreshed access token");
}

pub(crate) fn record_request(success: bool) {
    let outcome = if success { "success" } else { "error" };
    counter!(REQUESTS_TOTAL, "outcome" => outcome).increment(1);
}

pub(crate) fn record_refresh(result: RefreshResult) {
    counter!(REFRESH_TOTAL, "outcome" => result.label()).increment(1);
}

pub(crate) fn record_queued() {
    counter!(QUEUED_TOTAL).increment(1);
}

pub(crate) fn record_replay() {
    counter!(REPLAYS_TOTAL).increment(1);
}
