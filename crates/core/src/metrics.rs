//! Prometheus metrics for observability.
//!
//! Counters and histograms for the ingest pipeline: job outcomes, per-stage
//! durations, transferred bytes, and queue health. The worker binary serves
//! `REGISTRY` from its admin endpoint.

use once_cell::sync::Lazy;
use prometheus::{
    HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// Terminal job outcomes by label (delivered, skipped, failed).
pub static JOBS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("ingestd_jobs_total", "Terminal job outcomes"),
        &["outcome"],
    )
    .expect("valid metric definition")
});

/// Per-stage wall-clock duration in seconds.
pub static JOB_STAGE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "ingestd_job_stage_duration_seconds",
            "Job stage duration in seconds",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 300.0]),
        &["stage"],
    )
    .expect("valid metric definition")
});

/// Jobs currently being processed by workers.
pub static JOBS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("ingestd_jobs_in_flight", "Jobs currently being processed")
        .expect("valid metric definition")
});

/// Bytes downloaded from the source bucket.
pub static BYTES_DOWNLOADED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("ingestd_bytes_downloaded_total", "Bytes downloaded")
        .expect("valid metric definition")
});

/// Bytes delivered to the output target.
pub static BYTES_DELIVERED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("ingestd_bytes_delivered_total", "Bytes delivered")
        .expect("valid metric definition")
});

/// Failed queue receive calls.
pub static QUEUE_RECEIVE_ERRORS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "ingestd_queue_receive_errors_total",
        "Failed queue receive calls",
    )
    .expect("valid metric definition")
});

fn register_metrics(registry: &Registry) {
    let _ = registry.register(Box::new(JOBS_TOTAL.clone()));
    let _ = registry.register(Box::new(JOB_STAGE_DURATION.clone()));
    let _ = registry.register(Box::new(JOBS_IN_FLIGHT.clone()));
    let _ = registry.register(Box::new(BYTES_DOWNLOADED.clone()));
    let _ = registry.register(Box::new(BYTES_DELIVERED.clone()));
    let _ = registry.register(Box::new(QUEUE_RECEIVE_ERRORS.clone()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_gathers_registered_metrics() {
        JOBS_TOTAL.with_label_values(&["delivered"]).inc();
        let families = REGISTRY.gather();
        assert!(families.iter().any(|f| f.get_name() == "ingestd_jobs_total"));
    }
}
