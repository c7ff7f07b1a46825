//! Client entry point.
//!
//! An [`AthenaClient`] binds a [`GatewayTransport`] to a set of default
//! options and hands out one [`QueryBuilder`] per table.
//!
//! ```ignore
//! use athena::{CallOptions, create_client};
//!
//! let client = create_client(
//!     "https://athena-db.com",
//!     "my-api-key",
//!     CallOptions::new().client("railway_direct"),
//! )?;
//!
//! let mut users = client.from("users");
//! let result = users.eq("id", 42).single("*").await;
//! ```

use crate::builder::QueryBuilder;
use crate::error::AthenaResult;
use crate::options::CallOptions;
use crate::transport::{GatewayTransport, HttpTransport, HttpTransportConfig};
use std::sync::Arc;

/// Table-oriented gateway client.
///
/// Cheap to clone: the transport and defaults are shared.
pub struct AthenaClient<T: GatewayTransport = HttpTransport> {
    transport: Arc<T>,
    defaults: Arc<CallOptions>,
}

impl<T: GatewayTransport> Clone for AthenaClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            defaults: Arc::clone(&self.defaults),
        }
    }
}

impl<T: GatewayTransport> std::fmt::Debug for AthenaClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AthenaClient")
            .field("base_url", &self.defaults.base_url)
            .field("client", &self.defaults.client)
            .finish_non_exhaustive()
    }
}

impl AthenaClient<HttpTransport> {
    /// Create an HTTP client for `url` authenticated with `api_key`.
    ///
    /// `options` become the client defaults; a `base_url` or `api_key` set in
    /// them wins over the positional arguments.
    pub fn new(url: &str, api_key: &str, options: CallOptions) -> AthenaResult<Self> {
        let defaults = CallOptions::new()
            .base_url(url)
            .api_key(api_key)
            .merge(&options);
        let base_url = defaults.base_url.clone().unwrap_or_default();
        let transport = HttpTransport::new(HttpTransportConfig::new().base_url(base_url))?;
        Ok(Self::with_transport(transport, defaults))
    }
}

impl<T: GatewayTransport + 'static> AthenaClient<T> {
    /// Create a client over a custom transport.
    pub fn with_transport(transport: T, defaults: CallOptions) -> Self {
        Self {
            transport: Arc::new(transport),
            defaults: Arc::new(defaults),
        }
    }

    /// Start a fresh builder for `table`.
    pub fn from(&self, table: impl Into<String>) -> QueryBuilder<T> {
        QueryBuilder::new(table, Arc::clone(&self.transport), Arc::clone(&self.defaults))
    }

    /// Alias for [`AthenaClient::from`].
    pub fn table(&self, table: impl Into<String>) -> QueryBuilder<T> {
        self.from(table)
    }

    /// Default options applied to every call.
    pub fn defaults(&self) -> &CallOptions {
        &self.defaults
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

/// Create an HTTP-backed client. See [`AthenaClient::new`].
pub fn create_client(url: &str, api_key: &str, options: CallOptions) -> AthenaResult<AthenaClient> {
    AthenaClient::new(url, api_key, options)
}
