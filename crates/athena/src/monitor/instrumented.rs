use super::config::MonitorConfig;
use super::monitors::{CompositeMonitor, NoopMonitor};
use super::types::{CallLog, GatewayMonitor, ResponseLog};
use crate::options::CallOptions;
use crate::payload::{DeletePayload, FetchPayload, InsertPayload, UpdatePayload};
use crate::result::GatewayResponse;
use crate::transport::{Endpoint, GatewayTransport, build_headers};
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A transport wrapper that reports every call to a [`GatewayMonitor`].
///
/// Monitoring must be explicitly enabled via `MonitorConfig::enable_monitoring()`.
/// The wrapped transport's responses are passed through unchanged.
pub struct InstrumentedTransport<T> {
    transport: T,
    monitor: Arc<dyn GatewayMonitor>,
    config: MonitorConfig,
}

impl<T: GatewayTransport> InstrumentedTransport<T> {
    /// Wrap a transport with no monitoring.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            monitor: Arc::new(NoopMonitor),
            config: MonitorConfig::default(),
        }
    }

    /// Set the monitor configuration.
    pub fn with_config(mut self, config: MonitorConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the monitor.
    pub fn with_monitor<M: GatewayMonitor + 'static>(mut self, monitor: M) -> Self {
        self.monitor = Arc::new(monitor);
        self
    }

    /// Set the monitor from an Arc (keep a handle to read its state later).
    pub fn with_monitor_arc(mut self, monitor: Arc<dyn GatewayMonitor>) -> Self {
        self.monitor = monitor;
        self
    }

    /// Add a monitor next to the current one.
    pub fn add_monitor_arc(mut self, monitor: Arc<dyn GatewayMonitor>) -> Self {
        let existing = std::mem::replace(&mut self.monitor, Arc::new(NoopMonitor));
        self.monitor = Arc::new(CompositeMonitor::new().add_arc(existing).add_arc(monitor));
        self
    }

    /// Set the slow call threshold.
    pub fn with_slow_call_threshold(mut self, threshold: Duration) -> Self {
        self.config.slow_call_threshold = Some(threshold);
        self
    }

    /// Enable monitoring.
    pub fn enable_monitoring(mut self) -> Self {
        self.config.monitoring_enabled = true;
        self
    }

    /// Disable monitoring.
    pub fn disable_monitoring(mut self) -> Self {
        self.config.monitoring_enabled = false;
        self
    }

    /// Check if monitoring is enabled.
    pub fn is_monitoring_enabled(&self) -> bool {
        self.config.monitoring_enabled
    }

    /// Get the current configuration.
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Get a reference to the wrapped transport.
    pub fn inner(&self) -> &T {
        &self.transport
    }

    async fn observe<P, F>(
        &self,
        endpoint: Endpoint,
        payload: &P,
        options: &CallOptions,
        call: F,
    ) -> GatewayResponse
    where
        P: Serialize + Sync,
        F: Future<Output = GatewayResponse> + Send,
    {
        if !self.config.monitoring_enabled {
            return call.await;
        }

        let body = serde_json::to_value(payload).unwrap_or(Value::Null);
        let log = CallLog::new(endpoint, body, build_headers(options));
        self.monitor.on_call_start(&log);

        let start = Instant::now();
        let response = call.await;
        let elapsed = start.elapsed();

        if let Some(threshold) = self.config.slow_call_threshold {
            if elapsed > threshold {
                self.monitor.on_slow_call(&log, elapsed);
            }
        }
        self.monitor
            .on_call_complete(&log, &ResponseLog::new(&response, elapsed));

        response
    }
}

impl<T: GatewayTransport> GatewayTransport for InstrumentedTransport<T> {
    async fn fetch(&self, payload: &FetchPayload, options: &CallOptions) -> GatewayResponse {
        self.observe(
            Endpoint::Fetch,
            payload,
            options,
            self.transport.fetch(payload, options),
        )
        .await
    }

    async fn insert(&self, payload: &InsertPayload, options: &CallOptions) -> GatewayResponse {
        self.observe(
            Endpoint::Insert,
            payload,
            options,
            self.transport.insert(payload, options),
        )
        .await
    }

    async fn update(&self, payload: &UpdatePayload, options: &CallOptions) -> GatewayResponse {
        self.observe(
            Endpoint::Update,
            payload,
            options,
            self.transport.update(payload, options),
        )
        .await
    }

    async fn delete(&self, payload: &DeletePayload, options: &CallOptions) -> GatewayResponse {
        self.observe(
            Endpoint::Delete,
            payload,
            options,
            self.transport.delete(payload, options),
        )
        .await
    }
}
