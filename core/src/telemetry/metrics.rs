use std::sync::Mutex;

/// Counter snapshot handed to the status display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub clicks: usize,
    pub traces: usize,
    pub refreshes: usize,
    pub dropped_refreshes: usize,
    pub failures: usize,
}

/// Mutex-guarded interaction counters. Every click, drawn trace, heatmap
/// refresh, dropped refresh, and failed action lands here.
pub struct InteractionMetrics {
    inner: Mutex<MetricsSnapshot>,
}

impl InteractionMetrics {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    pub fn record_click(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.clicks += 1;
        }
    }

    pub fn record_trace(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.traces += 1;
        }
    }

    pub fn record_refresh(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.refreshes += 1;
        }
    }

    pub fn record_dropped_refresh(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.dropped_refreshes += 1;
        }
    }

    pub fn record_failure(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.failures += 1;
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        if let Ok(metrics) = self.inner.lock() {
            *metrics
        } else {
            MetricsSnapshot::default()
        }
    }
}

impl Default for InteractionMetrics {
    fn default() -> Self {
        Self::new()
    }
}
