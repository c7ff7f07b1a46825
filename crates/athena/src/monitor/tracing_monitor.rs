use super::types::{CallLog, GatewayMonitor, ResponseLog};
use std::time::Duration;
use tracing::Level;

/// A `tracing`-based monitor that emits one event per completed call.
///
/// Slow calls are always reported at `WARN`. Events use the
/// `athena.gateway` target.
///
/// Enable via the crate feature: `athena = { features = ["tracing"] }`.
#[derive(Debug, Clone)]
pub struct TracingMonitor {
    /// Tracing event level to emit at.
    pub level: Level,
    /// Include the JSON payload in events.
    pub include_payload: bool,
}

impl Default for TracingMonitor {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            include_payload: false,
        }
    }
}

impl TracingMonitor {
    /// Create a new monitor with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the tracing event level.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Attach the JSON payload to every event.
    pub fn with_payload(mut self) -> Self {
        self.include_payload = true;
        self
    }
}

impl GatewayMonitor for TracingMonitor {
    fn on_call_complete(&self, call: &CallLog, response: &ResponseLog) {
        /// Dispatch a tracing event at a runtime-determined level.
        macro_rules! emit_at_level {
            ($level:expr, $($field:tt)*) => {
                match $level {
                    Level::ERROR => tracing::error!($($field)*),
                    Level::WARN  => tracing::warn!($($field)*),
                    Level::INFO  => tracing::info!($($field)*),
                    Level::DEBUG => tracing::debug!($($field)*),
                    Level::TRACE => tracing::trace!($($field)*),
                }
            };
        }

        let table = call.table().unwrap_or("-");
        let error = response.error.as_deref().unwrap_or("-");
        if self.include_payload {
            emit_at_level!(
                self.level,
                target: "athena.gateway",
                endpoint = %call.endpoint,
                table,
                status = response.status,
                ok = response.ok,
                error,
                elapsed = ?response.elapsed,
                payload = %call.payload,
            );
        } else {
            emit_at_level!(
                self.level,
                target: "athena.gateway",
                endpoint = %call.endpoint,
                table,
                status = response.status,
                ok = response.ok,
                error,
                elapsed = ?response.elapsed,
            );
        }
    }

    fn on_slow_call(&self, call: &CallLog, elapsed: Duration) {
        tracing::warn!(
            target: "athena.gateway",
            endpoint = %call.endpoint,
            table = call.table().unwrap_or("-"),
            elapsed = ?elapsed,
            "slow gateway call"
        );
    }
}
