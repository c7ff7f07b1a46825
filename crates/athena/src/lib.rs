//! # athena
//!
//! A fluent, table-oriented client for the Athena HTTP data gateway.
//!
//! ## Features
//!
//! - **Fluent filters**: `eq`, `gt`, `in_list`, `or`, `not`, `range`, ... accumulate per table
//! - **Deferred writes**: `insert` / `upsert` / `update` / `delete` return a handle that sends
//!   exactly once, on first resolution
//! - **Layered options**: client defaults, per-call options and refinement options merge
//!   with later layers winning
//! - **Uniform results**: every operation yields a [`QueryResult`] with `data`, `error`,
//!   `status` and the raw body; gateway failures never panic or raise
//! - **Pluggable transport**: swap [`HttpTransport`] for any [`GatewayTransport`]
//! - **Call monitoring**: wrap a transport in [`monitor::InstrumentedTransport`]
//!
//! ## Quick start
//!
//! ```ignore
//! use athena::prelude::*;
//! use serde_json::json;
//!
//! let client = create_client("https://athena-db.com", "api-key", CallOptions::new())?;
//!
//! // Fetch
//! let mut users = client.from("users");
//! let page = users
//!     .eq("status", "active")
//!     .range(0, 9)
//!     .select("id,name")
//!     .await;
//!
//! // Insert, returning the new row
//! let created = client
//!     .from("countries")
//!     .insert(json!({ "name": "Mordor" }))?
//!     .single("id,name")
//!     .await;
//!
//! // Update by filter
//! let mut orders = client.from("orders");
//! orders.eq("id", 7);
//! let updated = orders.update(json!({ "status": "shipped" }))?.await;
//!
//! // Delete by id
//! let mut sessions = client.from("sessions");
//! sessions.eq("id", "abc-123");
//! let deleted = sessions.delete()?.await;
//! ```

pub mod builder;
pub mod client;
pub mod condition;
pub mod error;
pub mod monitor;
pub mod mutation;
pub mod options;
pub mod payload;
pub mod prelude;
pub mod result;
pub mod transport;

pub use builder::QueryBuilder;
pub use client::{AthenaClient, create_client};
pub use condition::{Condition, ConditionValue, Op, Scalar};
pub use error::{AthenaError, AthenaResult};
pub use monitor::{
    CallLog, CallStats, CompositeMonitor, GatewayMonitor, InstrumentedTransport, LastCallMonitor,
    LoggingMonitor, MonitorConfig, NoopMonitor, ResponseLog, StatsMonitor,
};
pub use mutation::{MutationQuery, MutationState, Resolution};
pub use options::{CallOptions, CountMode, DeleteOptions, UpsertOptions, merge_options};
pub use payload::{
    AggregationStrategy, Columns, DeletePayload, FetchPayload, GatewayRequest, InsertPayload,
    TimeGranularity, UpdatePayload,
};
pub use result::{GatewayResponse, QueryResult};
pub use transport::{
    DEFAULT_BASE_URL, DEFAULT_CLIENT, Endpoint, GatewayTransport, HttpTransport,
    HttpTransportConfig, build_headers,
};

#[cfg(feature = "tracing")]
pub use monitor::TracingMonitor;
