use super::truncate_bytes;
use crate::result::GatewayResponse;
use crate::transport::Endpoint;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Headers whose values are replaced before they reach a monitor.
const REDACTED_HEADERS: &[&str] = &["apikey", "x-api-key", "x-supabase-key"];

/// Maximum length for error messages in [`ResponseLog`].
const MAX_ERROR_LEN: usize = 512;

/// A gateway call about to be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct CallLog {
    pub endpoint: Endpoint,
    /// HTTP method (`POST`, `PUT` or `DELETE`).
    pub method: &'static str,
    /// JSON body.
    pub payload: Value,
    /// Request headers, with credentials redacted.
    pub headers: BTreeMap<String, String>,
    pub timestamp: DateTime<Utc>,
}

impl CallLog {
    /// Create a call log stamped with the current time.
    pub fn new(endpoint: Endpoint, payload: Value, headers: BTreeMap<String, String>) -> Self {
        let headers = headers
            .into_iter()
            .map(|(name, value)| {
                if REDACTED_HEADERS.contains(&name.to_ascii_lowercase().as_str()) {
                    (name, "***".to_string())
                } else {
                    (name, value)
                }
            })
            .collect();
        Self {
            endpoint,
            method: endpoint.method(),
            payload,
            headers,
            timestamp: Utc::now(),
        }
    }

    /// `table_name` from the payload, when present.
    pub fn table(&self) -> Option<&str> {
        self.payload.get("table_name").and_then(Value::as_str)
    }
}

/// Outcome of a gateway call.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseLog {
    /// HTTP status, `0` when no response was received.
    pub status: u16,
    pub ok: bool,
    /// Error message (truncated to 512 bytes).
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub elapsed: Duration,
}

impl ResponseLog {
    /// Summarize a transport response.
    pub fn new(response: &GatewayResponse, elapsed: Duration) -> Self {
        Self {
            status: response.status,
            ok: response.ok && response.error.is_none(),
            error: response.error.as_deref().map(truncate_error),
            timestamp: Utc::now(),
            elapsed,
        }
    }
}

fn truncate_error(message: &str) -> String {
    if message.len() > MAX_ERROR_LEN {
        format!("{}...", truncate_bytes(message, MAX_ERROR_LEN))
    } else {
        message.to_string()
    }
}

impl fmt::Display for ResponseLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error {
            Some(error) => write!(f, "{} error: {error}", self.status),
            None => write!(f, "{} ok", self.status),
        }
    }
}

/// Trait for observing gateway calls.
///
/// Implement this trait to collect metrics, log calls, or surface the last
/// request/response in a UI.
pub trait GatewayMonitor: Send + Sync {
    /// Called before a call is sent.
    ///
    /// Default implementation does nothing.
    fn on_call_start(&self, _call: &CallLog) {}

    /// Called after a call completes (success or failure).
    fn on_call_complete(&self, call: &CallLog, response: &ResponseLog);

    /// Called when a call exceeds the configured slow threshold.
    ///
    /// Default implementation does nothing.
    fn on_slow_call(&self, _call: &CallLog, _elapsed: Duration) {}
}
