use super::truncate_bytes;
use super::types::{CallLog, GatewayMonitor, ResponseLog};
use crate::transport::Endpoint;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A no-op monitor that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMonitor;

impl GatewayMonitor for NoopMonitor {
    fn on_call_complete(&self, _call: &CallLog, _response: &ResponseLog) {}
}

/// A logging monitor that prints calls to stderr.
#[derive(Debug, Clone)]
pub struct LoggingMonitor {
    /// Minimum duration to log (filters out fast calls).
    pub min_elapsed: Option<Duration>,
    /// Truncate the printed payload (in bytes). `None` means no truncation.
    pub max_payload_length: Option<usize>,
    /// Prefix for log messages.
    pub prefix: String,
}

impl Default for LoggingMonitor {
    fn default() -> Self {
        Self {
            min_elapsed: None,
            max_payload_length: Some(200),
            prefix: "[athena]".to_string(),
        }
    }
}

impl LoggingMonitor {
    /// Create a new logging monitor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Only log calls slower than this duration.
    pub fn min_elapsed(mut self, duration: Duration) -> Self {
        self.min_elapsed = Some(duration);
        self
    }

    /// Set maximum payload length to display.
    pub fn max_payload_length(mut self, len: usize) -> Self {
        self.max_payload_length = Some(len);
        self
    }

    /// Print payloads in full.
    pub fn no_truncate(mut self) -> Self {
        self.max_payload_length = None;
        self
    }

    /// Set prefix for log messages.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub(crate) fn format_payload(&self, call: &CallLog) -> String {
        let payload = call.payload.to_string();
        match self.max_payload_length {
            Some(max) if payload.len() > max => format!("{}...", truncate_bytes(&payload, max)),
            _ => payload,
        }
    }
}

impl GatewayMonitor for LoggingMonitor {
    fn on_call_complete(&self, call: &CallLog, response: &ResponseLog) {
        if let Some(min) = self.min_elapsed {
            if response.elapsed < min {
                return;
            }
        }
        eprintln!(
            "{} [{}] [{}] {:?} | {} | {}",
            self.prefix,
            call.endpoint,
            call.table().unwrap_or("-"),
            response.elapsed,
            response,
            self.format_payload(call)
        );
    }

    fn on_slow_call(&self, call: &CallLog, elapsed: Duration) {
        eprintln!(
            "{} SLOW CALL [{}] [{}]: {:?}",
            self.prefix,
            call.endpoint,
            call.table().unwrap_or("-"),
            elapsed
        );
    }
}

/// A monitor that tracks call statistics.
#[derive(Debug, Default)]
pub struct StatsMonitor {
    total_calls: AtomicU64,
    failed_calls: AtomicU64,
    total_duration_nanos: AtomicU64,
    fetch_count: AtomicU64,
    insert_count: AtomicU64,
    update_count: AtomicU64,
    delete_count: AtomicU64,
    max_duration_nanos: AtomicU64,
    slowest_call: Mutex<Option<(Endpoint, Option<String>)>>,
}

/// Collected call statistics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallStats {
    /// Total number of calls sent.
    pub total_calls: u64,
    /// Calls that ended with an error (gateway or network).
    pub failed_calls: u64,
    /// Total time spent waiting on the gateway.
    pub total_duration: Duration,
    pub fetch_count: u64,
    pub insert_count: u64,
    pub update_count: u64,
    pub delete_count: u64,
    /// Slowest call duration.
    pub max_duration: Duration,
    /// Endpoint and table of the slowest call.
    pub slowest_call: Option<(Endpoint, Option<String>)>,
}

impl StatsMonitor {
    /// Create a new stats monitor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a snapshot of current statistics.
    pub fn stats(&self) -> CallStats {
        CallStats {
            total_calls: self.total_calls.load(Ordering::Relaxed),
            failed_calls: self.failed_calls.load(Ordering::Relaxed),
            total_duration: Duration::from_nanos(self.total_duration_nanos.load(Ordering::Relaxed)),
            fetch_count: self.fetch_count.load(Ordering::Relaxed),
            insert_count: self.insert_count.load(Ordering::Relaxed),
            update_count: self.update_count.load(Ordering::Relaxed),
            delete_count: self.delete_count.load(Ordering::Relaxed),
            max_duration: Duration::from_nanos(self.max_duration_nanos.load(Ordering::Relaxed)),
            slowest_call: lock(&self.slowest_call).clone(),
        }
    }

    /// Reset all statistics.
    pub fn reset(&self) {
        self.total_calls.store(0, Ordering::Relaxed);
        self.failed_calls.store(0, Ordering::Relaxed);
        self.total_duration_nanos.store(0, Ordering::Relaxed);
        self.fetch_count.store(0, Ordering::Relaxed);
        self.insert_count.store(0, Ordering::Relaxed);
        self.update_count.store(0, Ordering::Relaxed);
        self.delete_count.store(0, Ordering::Relaxed);
        self.max_duration_nanos.store(0, Ordering::Relaxed);
        *lock(&self.slowest_call) = None;
    }
}

impl GatewayMonitor for StatsMonitor {
    fn on_call_complete(&self, call: &CallLog, response: &ResponseLog) {
        let nanos = u64::try_from(response.elapsed.as_nanos()).unwrap_or(u64::MAX);

        self.total_calls.fetch_add(1, Ordering::Relaxed);
        let prev_total = self.total_duration_nanos.fetch_add(nanos, Ordering::Relaxed);
        if prev_total.checked_add(nanos).is_none() {
            // Saturate instead of wrapping.
            self.total_duration_nanos.store(u64::MAX, Ordering::Relaxed);
        }

        let counter = match call.endpoint {
            Endpoint::Fetch => &self.fetch_count,
            Endpoint::Insert => &self.insert_count,
            Endpoint::Update => &self.update_count,
            Endpoint::Delete => &self.delete_count,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        if !response.ok {
            self.failed_calls.fetch_add(1, Ordering::Relaxed);
        }

        let mut current_max = self.max_duration_nanos.load(Ordering::Relaxed);
        while nanos > current_max {
            match self.max_duration_nanos.compare_exchange_weak(
                current_max,
                nanos,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    *lock(&self.slowest_call) = Some((call.endpoint, call.table().map(str::to_string)));
                    break;
                }
                Err(updated) => current_max = updated,
            }
        }
    }
}

#[derive(Debug, Default)]
struct LastCall {
    request: Option<CallLog>,
    response: Option<ResponseLog>,
    error: Option<String>,
}

/// A monitor that keeps the most recent request, response and error.
///
/// Useful for debug panels that show what the client last sent.
#[derive(Debug, Default)]
pub struct LastCallMonitor {
    last: Mutex<LastCall>,
    in_flight: AtomicUsize,
}

impl LastCallMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently started call.
    pub fn last_request(&self) -> Option<CallLog> {
        lock(&self.last).request.clone()
    }

    /// The most recently completed call's outcome.
    pub fn last_response(&self) -> Option<ResponseLog> {
        lock(&self.last).response.clone()
    }

    /// Error of the most recently completed call, cleared when a new call starts.
    pub fn last_error(&self) -> Option<String> {
        lock(&self.last).error.clone()
    }

    /// Number of calls started but not yet completed.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight() > 0
    }
}

impl GatewayMonitor for LastCallMonitor {
    fn on_call_start(&self, call: &CallLog) {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let mut last = lock(&self.last);
        last.request = Some(call.clone());
        last.error = None;
    }

    fn on_call_complete(&self, _call: &CallLog, response: &ResponseLog) {
        {
            let mut last = lock(&self.last);
            last.response = Some(response.clone());
            last.error = response.error.clone();
        }
        let _ = self
            .in_flight
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }
}

/// A composite monitor that delegates to multiple monitors.
pub struct CompositeMonitor {
    monitors: Vec<Arc<dyn GatewayMonitor>>,
}

impl CompositeMonitor {
    /// Create an empty composite monitor.
    pub fn new() -> Self {
        Self {
            monitors: Vec::new(),
        }
    }

    /// Add a monitor.
    #[allow(clippy::should_implement_trait)]
    pub fn add<M: GatewayMonitor + 'static>(mut self, monitor: M) -> Self {
        self.monitors.push(Arc::new(monitor));
        self
    }

    /// Add an Arc-wrapped monitor.
    pub fn add_arc(mut self, monitor: Arc<dyn GatewayMonitor>) -> Self {
        self.monitors.push(monitor);
        self
    }

    pub fn len(&self) -> usize {
        self.monitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }
}

impl Default for CompositeMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl GatewayMonitor for CompositeMonitor {
    fn on_call_start(&self, call: &CallLog) {
        for monitor in &self.monitors {
            monitor.on_call_start(call);
        }
    }

    fn on_call_complete(&self, call: &CallLog, response: &ResponseLog) {
        for monitor in &self.monitors {
            monitor.on_call_complete(call, response);
        }
    }

    fn on_slow_call(&self, call: &CallLog, elapsed: Duration) {
        for monitor in &self.monitors {
            monitor.on_slow_call(call, elapsed);
        }
    }
}
