use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::time;
use tracing::error;

use crate::error::AppError;
use crate::models::{
    ErrorRecord, ErrorSeverity, HealthStatus, MetricsSnapshot, ServiceStatus,
};
use crate::utils::math;

const MAX_ERROR_RECORDS: usize = 1000;
// Roughly the last hour of samples at one call per second.
const MAX_RESPONSE_SAMPLES: usize = 3600;
const DEGRADED_ERROR_RATE: f64 = 5.0;

#[derive(Default)]
struct Counters {
    api_calls_total: u64,
    api_calls_error: u64,
    cache_hits: u64,
    response_times: Vec<f64>,
}

/// Rolling telemetry for every price-data call: windowed metrics snapshot,
/// error ring buffer, and derived health status.
pub struct MonitoringService {
    counters: Mutex<Counters>,
    snapshot: Mutex<MetricsSnapshot>,
    errors: Mutex<VecDeque<ErrorRecord>>,
    started_at: Instant,
    version: String,
    aggregation_interval: Duration,
}

impl MonitoringService {
    pub fn new(version: &str, aggregation_interval: Duration) -> Self {
        Self {
            counters: Mutex::new(Counters::default()),
            snapshot: Mutex::new(MetricsSnapshot::default()),
            errors: Mutex::new(VecDeque::new()),
            started_at: Instant::now(),
            version: version.to_string(),
            aggregation_interval,
        }
    }

    /// Record one price-data call in the current window.
    pub fn track_api_call(&self, duration_ms: f64, cache_hit: bool, is_error: bool) {
        let mut counters = self.counters.lock().unwrap();
        counters.api_calls_total += 1;
        if is_error {
            counters.api_calls_error += 1;
        }
        if cache_hit {
            counters.cache_hits += 1;
        }
        counters.response_times.push(duration_ms);

        if counters.response_times.len() > MAX_RESPONSE_SAMPLES {
            let excess = counters.response_times.len() - MAX_RESPONSE_SAMPLES;
            counters.response_times.drain(..excess);
        }
    }

    /// Close the current window: compute the snapshot and reset the counters.
    pub fn aggregate(&self) {
        let mut counters = self.counters.lock().unwrap();

        let percentage = |part: u64, total: u64| {
            if total > 0 {
                part as f64 / total as f64 * 100.0
            } else {
                0.0
            }
        };

        let next = MetricsSnapshot {
            response_time: math::mean(&counters.response_times),
            cache_hit_rate: percentage(counters.cache_hits, counters.api_calls_total),
            error_rate: percentage(counters.api_calls_error, counters.api_calls_total),
            api_calls: counters.api_calls_total,
        };

        *counters = Counters::default();
        drop(counters);

        *self.snapshot.lock().unwrap() = next;
    }

    /// The last computed snapshot, not a live value.
    pub fn metrics(&self) -> MetricsSnapshot {
        *self.snapshot.lock().unwrap()
    }

    pub fn log_error(
        &self,
        code: &str,
        message: &str,
        context: HashMap<String, serde_json::Value>,
        severity: ErrorSeverity,
    ) {
        let record = ErrorRecord {
            code: code.to_string(),
            message: message.to_string(),
            context,
            severity,
            timestamp: Utc::now(),
        };

        if severity == ErrorSeverity::Critical {
            self.notify_external(&record);
        }

        let mut errors = self.errors.lock().unwrap();
        errors.push_back(record);
        while errors.len() > MAX_ERROR_RECORDS {
            errors.pop_front();
        }
    }

    /// Buffered error records, optionally filtered by exact severity.
    pub fn recent_errors(&self, severity: Option<ErrorSeverity>) -> Vec<ErrorRecord> {
        let errors = self.errors.lock().unwrap();
        match severity {
            Some(wanted) => errors
                .iter()
                .filter(|record| record.severity == wanted)
                .cloned()
                .collect(),
            None => errors.iter().cloned().collect(),
        }
    }

    pub fn health_status(&self) -> HealthStatus {
        let metrics = self.metrics();
        let status = if metrics.error_rate < DEGRADED_ERROR_RATE {
            ServiceStatus::Healthy
        } else {
            ServiceStatus::Degraded
        };

        HealthStatus {
            status,
            timestamp: Utc::now(),
            uptime_seconds: self.started_at.elapsed().as_secs(),
            version: self.version.clone(),
            metrics,
            last_error: self.errors.lock().unwrap().back().cloned(),
        }
    }

    /// Begin timing one outbound request.
    pub fn start_request(&self) -> RequestTimer<'_> {
        RequestTimer {
            monitoring: self,
            started: Instant::now(),
        }
    }

    /// Recompute the metrics snapshot on a fixed interval.
    pub fn spawn_aggregator(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = time::interval(self.aggregation_interval);
            // The first tick fires immediately; skip it so the first window is full-length.
            interval.tick().await;
            loop {
                interval.tick().await;
                self.aggregate();
            }
        })
    }

    fn notify_external(&self, record: &ErrorRecord) {
        // External error-reporting integration is out of scope; surface in the log.
        error!(code = %record.code, message = %record.message, "Critical error");
    }
}

/// Times a single outbound request and reports its outcome.
pub struct RequestTimer<'a> {
    monitoring: &'a MonitoringService,
    started: Instant,
}

impl RequestTimer<'_> {
    pub fn success(self, cache_hit: bool) {
        let elapsed = self.started.elapsed().as_secs_f64() * 1000.0;
        self.monitoring.track_api_call(elapsed, cache_hit, false);
    }

    pub fn failure(self, err: &AppError, url: &str) {
        let elapsed = self.started.elapsed().as_secs_f64() * 1000.0;
        self.monitoring.track_api_call(elapsed, false, true);

        let (severity, status) = match err {
            AppError::UpstreamStatus(status) if *status >= 500 => {
                (ErrorSeverity::High, Some(*status))
            }
            AppError::UpstreamStatus(status) => (ErrorSeverity::Medium, Some(*status)),
            _ => (ErrorSeverity::Medium, None),
        };

        let mut context = HashMap::new();
        context.insert("url".to_string(), serde_json::json!(url));
        if let Some(status) = status {
            context.insert("status".to_string(), serde_json::json!(status));
        }

        self.monitoring
            .log_error(err.code(), &err.to_string(), context, severity);
    }
}

impl Default for MonitoringService {
    fn default() -> Self {
        Self::new(env!("CARGO_PKG_VERSION"), Duration::from_secs(60))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> MonitoringService {
        MonitoringService::new("test", Duration::from_secs(60))
    }

    #[test]
    fn test_metrics_after_aggregation() {
        let monitoring = service();
        monitoring.track_api_call(100.0, true, false);
        monitoring.track_api_call(150.0, false, false);
        monitoring.track_api_call(200.0, false, true);

        monitoring.aggregate();

        let metrics = monitoring.metrics();
        assert_eq!(metrics.response_time, 150.0);
        assert!((metrics.cache_hit_rate - 100.0 / 3.0).abs() < 1e-9);
        assert!((metrics.error_rate - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(metrics.api_calls, 3);
    }

    #[test]
    fn test_metrics_reset_between_windows() {
        let monitoring = service();
        monitoring.track_api_call(100.0, false, false);
        monitoring.aggregate();
        monitoring.aggregate();

        let metrics = monitoring.metrics();
        assert_eq!(metrics.api_calls, 0);
        assert_eq!(metrics.response_time, 0.0);
    }

    #[test]
    fn test_snapshot_is_not_live() {
        let monitoring = service();
        monitoring.track_api_call(100.0, false, false);

        // Nothing aggregated yet: reads see the previous (empty) window.
        assert_eq!(monitoring.metrics().api_calls, 0);
    }

    #[test]
    fn test_error_ring_buffer_cap() {
        let monitoring = service();
        for i in 0..1100 {
            monitoring.log_error(
                &format!("ERROR{}", i),
                "overflow test",
                HashMap::new(),
                ErrorSeverity::Low,
            );
        }

        let errors = monitoring.recent_errors(None);
        assert_eq!(errors.len(), 1000);
        assert_eq!(errors[0].code, "ERROR100");
    }

    #[test]
    fn test_errors_filtered_by_severity() {
        let monitoring = service();
        monitoring.log_error("E1", "one", HashMap::new(), ErrorSeverity::Low);
        monitoring.log_error("E2", "two", HashMap::new(), ErrorSeverity::High);
        monitoring.log_error("E3", "three", HashMap::new(), ErrorSeverity::High);

        let high = monitoring.recent_errors(Some(ErrorSeverity::High));
        assert_eq!(high.len(), 2);
        assert!(high.iter().all(|e| e.severity == ErrorSeverity::High));
    }

    #[test]
    fn test_health_status_thresholds() {
        let monitoring = service();
        for i in 0..100 {
            monitoring.track_api_call(100.0, false, i < 2);
        }
        monitoring.aggregate();

        let health = monitoring.health_status();
        assert_eq!(health.status, ServiceStatus::Healthy);
        assert_eq!(health.version, "test");
        assert_eq!(health.metrics.error_rate, 2.0);

        for i in 0..100 {
            monitoring.track_api_call(100.0, false, i < 10);
        }
        monitoring.aggregate();

        let health = monitoring.health_status();
        assert_eq!(health.status, ServiceStatus::Degraded);
        assert_eq!(health.metrics.error_rate, 10.0);
    }

    #[test]
    fn test_request_timer_failure_classifies_severity() {
        let monitoring = service();

        let timer = monitoring.start_request();
        timer.failure(&AppError::UpstreamStatus(503), "http://upstream/price-changes");

        let timer = monitoring.start_request();
        timer.failure(&AppError::Upstream("connection refused".to_string()), "http://upstream/search");

        let errors = monitoring.recent_errors(None);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].severity, ErrorSeverity::High);
        assert_eq!(errors[1].severity, ErrorSeverity::Medium);
        assert_eq!(errors[0].context["status"], serde_json::json!(503));

        monitoring.aggregate();
        let metrics = monitoring.metrics();
        assert_eq!(metrics.api_calls, 2);
        assert_eq!(metrics.error_rate, 100.0);
    }

    #[test]
    fn test_response_sample_retention() {
        let monitoring = service();
        for _ in 0..4000 {
            monitoring.track_api_call(50.0, false, false);
        }

        let counters = monitoring.counters.lock().unwrap();
        assert_eq!(counters.response_times.len(), 3600);
        assert_eq!(counters.api_calls_total, 4000);
    }
}
