//! Gateway call monitoring.
//!
//! This module provides traits and utilities for:
//! - Timing every gateway call
//! - Keeping the last request/response for debugging
//! - Logging and metrics collection
//!
//! # Example
//!
//! ```rust,ignore
//! use athena::monitor::{InstrumentedTransport, LastCallMonitor, MonitorConfig};
//! use athena::{AthenaClient, CallOptions, HttpTransport, HttpTransportConfig};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let last = Arc::new(LastCallMonitor::new());
//! let transport = InstrumentedTransport::new(HttpTransport::new(HttpTransportConfig::new())?)
//!     .with_config(
//!         MonitorConfig::new()
//!             .with_slow_call_threshold(Duration::from_secs(2))
//!             .enable_monitoring(),
//!     )
//!     .with_monitor_arc(last.clone());
//!
//! let client = AthenaClient::with_transport(transport, CallOptions::new().api_key("key"));
//! let _ = client.from("users").select("*").await;
//! println!("{:?}", last.last_request());
//! ```

mod config;
mod instrumented;
mod monitors;
mod types;

#[cfg(feature = "tracing")]
mod tracing_monitor;


pub use config::MonitorConfig;
pub use instrumented::InstrumentedTransport;
pub use monitors::{
    CallStats, CompositeMonitor, LastCallMonitor, LoggingMonitor, NoopMonitor, StatsMonitor,
};
pub use types::{CallLog, GatewayMonitor, ResponseLog};

#[cfg(feature = "tracing")]
pub use tracing_monitor::TracingMonitor;

pub(crate) fn truncate_bytes(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
