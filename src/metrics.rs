// SPDX-License-Identifier: Apache-2.0

//! Lightweight in-memory counters for console queries.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

use serde::Serialize;

#[derive(Default)]
struct QueryMetrics {
    executed: AtomicU64,
    failed: AtomicU64,
    blocked: AtomicU64,
    invalid: AtomicU64,
    rejected: AtomicU64,
    timeouts: AtomicU64,
    duration_total_ms: AtomicU64,
    duration_max_ms: AtomicU64,
}

static QUERY_METRICS: OnceLock<QueryMetrics> = OnceLock::new();

fn metrics() -> &'static QueryMetrics {
    QUERY_METRICS.get_or_init(QueryMetrics::default)
}

/// Records a statement that reached the backend.
pub fn record_query(duration_ms: f64, success: bool) {
    let duration_ms = duration_ms.max(0.0) as u64;
    let metrics = metrics();
    metrics.executed.fetch_add(1, Ordering::Relaxed);
    if !success {
        metrics.failed.fetch_add(1, Ordering::Relaxed);
    }
    metrics
        .duration_total_ms
        .fetch_add(duration_ms, Ordering::Relaxed);
    metrics
        .duration_max_ms
        .fetch_max(duration_ms, Ordering::Relaxed);
}

/// Statement refused by policy screening.
pub fn record_blocked() {
    metrics().blocked.fetch_add(1, Ordering::Relaxed);
}

/// Statement that could not be screened: blank, unparseable, unsupported
/// or missing its namespace.
pub fn record_invalid() {
    metrics().invalid.fetch_add(1, Ordering::Relaxed);
}

/// Statement vetoed by a pre-execution hook.
pub fn record_rejected() {
    metrics().rejected.fetch_add(1, Ordering::Relaxed);
}

pub fn record_timeout() {
    metrics().timeouts.fetch_add(1, Ordering::Relaxed);
}

#[derive(Debug, Serialize)]
pub struct QueryMetricsSnapshot {
    pub executed: u64,
    pub failed: u64,
    pub blocked: u64,
    pub invalid: u64,
    pub rejected: u64,
    pub timeouts: u64,
    pub avg_ms: Option<f64>,
    pub max_ms: Option<u64>,
}

pub fn snapshot() -> QueryMetricsSnapshot {
    let metrics = metrics();
    let executed = metrics.executed.load(Ordering::Relaxed);
    let duration_total = metrics.duration_total_ms.load(Ordering::Relaxed);
    let max_ms = metrics.duration_max_ms.load(Ordering::Relaxed);

    let avg_ms = if executed > 0 {
        Some(duration_total as f64 / executed as f64)
    } else {
        None
    };

    QueryMetricsSnapshot {
        executed,
        failed: metrics.failed.load(Ordering::Relaxed),
        blocked: metrics.blocked.load(Ordering::Relaxed),
        invalid: metrics.invalid.load(Ordering::Relaxed),
        rejected: metrics.rejected.load(Ordering::Relaxed),
        timeouts: metrics.timeouts.load(Ordering::Relaxed),
        avg_ms,
        max_ms: if max_ms > 0 { Some(max_ms) } else { None },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Counters are process-wide and other tests record concurrently, so
    // only lower bounds are asserted.
    #[test]
    fn counters_only_grow() {
        let initial = snapshot();

        record_query(40.0, true);
        record_query(10.0, false);
        let s1 = snapshot();
        assert!(s1.executed >= initial.executed + 2);
        assert!(s1.failed > initial.failed);
        assert!(s1.avg_ms.is_some());

        record_blocked();
        record_invalid();
        record_rejected();
        record_timeout();
        let s2 = snapshot();
        assert!(s2.blocked > initial.blocked);
        assert!(s2.invalid > initial.invalid);
        assert!(s2.rejected > initial.rejected);
        assert!(s2.timeouts > initial.timeouts);

        record_query(99999.0, true);
        assert!(snapshot().max_ms.unwrap_or_default() >= 99999);
    }

    #[test]
    fn negative_durations_clamp_to_zero() {
        record_query(-5.0, true);
        assert!(snapshot().executed >= 1);
    }
}
