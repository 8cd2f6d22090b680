use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

pub struct Metrics {
    // Counters
    total_requests: AtomicUsize,
    successful_requests: AtomicUsize,
    failed_requests: AtomicUsize,

    // Timing (in microseconds)
    total_analyze_time_us: AtomicU64,

    // Counts
    total_paths_found: AtomicUsize,
    total_sentences_ranked: AtomicUsize,
    total_external_failures: AtomicUsize,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            total_requests: AtomicUsize::new(0),
            successful_requests: AtomicUsize::new(0),
            failed_requests: AtomicUsize::new(0),
            total_analyze_time_us: AtomicU64::new(0),
            total_paths_found: AtomicUsize::new(0),
            total_sentences_ranked: AtomicUsize::new(0),
            total_external_failures: AtomicUsize::new(0),
        })
    }

    pub fn record_request(&self, success: bool) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if success {
            self.successful_requests.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_analyze(
        &self,
        duration: std::time::Duration,
        paths: usize,
        sentences: usize,
        external_failures: usize,
    ) {
        self.total_analyze_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        self.total_paths_found.fetch_add(paths, Ordering::Relaxed);
        self.total_sentences_ranked
            .fetch_add(sentences, Ordering::Relaxed);
        self.total_external_failures
            .fetch_add(external_failures, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let requests = self.total_requests.load(Ordering::Relaxed);
        let total_us = self.total_analyze_time_us.load(Ordering::Relaxed) as f64;

        MetricsSnapshot {
            total_requests: requests,
            successful_requests: self.successful_requests.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            avg_analyze_time_ms: if requests > 0 {
                total_us / requests as f64 / 1000.0
            } else {
                0.0
            },
            total_paths_found: self.total_paths_found.load(Ordering::Relaxed),
            total_sentences_ranked: self.total_sentences_ranked.load(Ordering::Relaxed),
            total_external_failures: self.total_external_failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: usize,
    pub successful_requests: usize,
    pub failed_requests: usize,
    pub avg_analyze_time_ms: f64,
    pub total_paths_found: usize,
    pub total_sentences_ranked: usize,
    pub total_external_failures: usize,
}

pub struct TimedOperation {
    start: Instant,
}

impl TimedOperation {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }
}
