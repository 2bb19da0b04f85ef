// Engine metrics module
//
// Provides lightweight counters for monitoring reconciliation activity

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Engine counters
///
/// Uses atomic operations for thread-safe tracking without locks. Shared
/// between the service and its debounced checks, and logged on shutdown.
#[derive(Debug)]
pub struct Metrics {
    /// Number of reconciliation passes (deserialize calls that resolved a data directory)
    pub reconciliations: AtomicU64,

    /// Total reconciliation time in milliseconds
    pub total_reconcile_time_ms: AtomicU64,

    /// Invalid entries produced by the last reconciliation
    pub invalid_entries: AtomicUsize,

    /// Successful writes of `plugins.txt`
    pub saves: AtomicU64,

    /// Failed writes of `plugins.txt`
    pub write_failures: AtomicU64,

    /// Times the alphabetical guard restored a previous order
    pub alphabetical_restores: AtomicU64,

    /// Validation passes that ran
    pub validations: AtomicU64,

    /// Validation passes skipped after a trusted write
    pub validations_suppressed: AtomicU64,

    /// Debounced checks that actually ran
    pub checks: AtomicU64,

    /// Fixes applied on request
    pub fixes_applied: AtomicU64,

    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            reconciliations: AtomicU64::new(0),
            total_reconcile_time_ms: AtomicU64::new(0),
            invalid_entries: AtomicUsize::new(0),
            saves: AtomicU64::new(0),
            write_failures: AtomicU64::new(0),
            alphabetical_restores: AtomicU64::new(0),
            validations: AtomicU64::new(0),
            validations_suppressed: AtomicU64::new(0),
            checks: AtomicU64::new(0),
            fixes_applied: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a reconciliation pass and how many invalid entries it produced
    pub fn record_reconciliation(&self, duration: Duration, invalid: usize) {
        self.reconciliations.fetch_add(1, Ordering::Relaxed);
        self.total_reconcile_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
        self.invalid_entries.store(invalid, Ordering::Relaxed);
    }

    pub fn record_save(&self) {
        self.saves.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write_failure(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_alphabetical_restore(&self) {
        self.alphabetical_restores.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a validation pass, or a pass that was skipped
    pub fn record_validation(&self, suppressed: bool) {
        if suppressed {
            self.validations_suppressed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.validations.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_check(&self) {
        self.checks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fix(&self) {
        self.fixes_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Average reconciliation time in milliseconds
    pub fn avg_reconcile_time_ms(&self) -> f64 {
        let total = self.total_reconcile_time_ms.load(Ordering::Relaxed);
        let count = self.reconciliations.load(Ordering::Relaxed);
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Load Order Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Reconciliations: {} (avg: {:.2}ms), invalid entries: {}",
            self.reconciliations.load(Ordering::Relaxed),
            self.avg_reconcile_time_ms(),
            self.invalid_entries.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Saves: {}, write failures: {}, alphabetical restores: {}",
            self.saves.load(Ordering::Relaxed),
            self.write_failures.load(Ordering::Relaxed),
            self.alphabetical_restores.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Checks: {}, validations: {} ({} suppressed), fixes: {}",
            self.checks.load(Ordering::Relaxed),
            self.validations.load(Ordering::Relaxed),
            self.validations_suppressed.load(Ordering::Relaxed),
            self.fixes_applied.load(Ordering::Relaxed)
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new();
        assert_eq!(metrics.reconciliations.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.saves.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_record_reconciliation() {
        let metrics = Metrics::new();

        metrics.record_reconciliation(Duration::from_millis(10), 2);
        metrics.record_reconciliation(Duration::from_millis(30), 1);

        assert_eq!(metrics.reconciliations.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.invalid_entries.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.avg_reconcile_time_ms(), 20.0);
    }

    #[test]
    fn test_avg_reconcile_time_without_passes() {
        assert_eq!(Metrics::new().avg_reconcile_time_ms(), 0.0);
    }

    #[test]
    fn test_validation_counters() {
        let metrics = Metrics::new();

        metrics.record_validation(false);
        metrics.record_validation(true);
        metrics.record_validation(false);

        assert_eq!(metrics.validations.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.validations_suppressed.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_write_counters() {
        let metrics = Metrics::new();

        metrics.record_save();
        metrics.record_write_failure();
        metrics.record_alphabetical_restore();
        metrics.record_check();
        metrics.record_fix();

        assert_eq!(metrics.saves.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.write_failures.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.alphabetical_restores.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.checks.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.fixes_applied.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_uptime() {
        let metrics = Metrics::new();
        thread::sleep(Duration::from_millis(10));
        assert!(metrics.uptime().as_millis() >= 10);
    }
}
