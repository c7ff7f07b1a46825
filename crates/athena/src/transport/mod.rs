//! Gateway transport seam.
//!
//! [`GatewayTransport`] performs exactly one wire request per call and folds
//! every outcome (including network failures) into a [`GatewayResponse`].
//! The query builder only ever talks to this trait, so tests and
//! instrumentation can substitute their own implementation.

mod http;

pub use http::{DEFAULT_BASE_URL, DEFAULT_CLIENT, HttpTransport, HttpTransportConfig, build_headers};

use crate::options::CallOptions;
use crate::payload::{DeletePayload, FetchPayload, GatewayRequest, InsertPayload, UpdatePayload};
use crate::result::GatewayResponse;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// The four gateway endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Fetch,
    Insert,
    Update,
    Delete,
}

impl Endpoint {
    /// Request path relative to the base URL.
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Fetch => "/gateway/fetch",
            Endpoint::Insert => "/gateway/insert",
            Endpoint::Update => "/gateway/update",
            Endpoint::Delete => "/gateway/delete",
        }
    }

    /// HTTP method used for this endpoint.
    pub fn method(&self) -> &'static str {
        match self {
            Endpoint::Fetch | Endpoint::Update => "POST",
            Endpoint::Insert => "PUT",
            Endpoint::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method(), self.path())
    }
}

impl GatewayRequest {
    /// Endpoint this request is sent to.
    pub fn endpoint(&self) -> Endpoint {
        match self {
            GatewayRequest::Fetch(_) => Endpoint::Fetch,
            GatewayRequest::Insert(_) => Endpoint::Insert,
            GatewayRequest::Update(_) => Endpoint::Update,
            GatewayRequest::Delete(_) => Endpoint::Delete,
        }
    }
}

/// One wire request per logical operation.
///
/// `options` is the fully merged option set for the call; implementations turn
/// it into request headers. Implementations must not panic or return errors
/// for gateway/network failures: report them in the response instead.
pub trait GatewayTransport: Send + Sync {
    /// Read rows.
    fn fetch(
        &self,
        payload: &FetchPayload,
        options: &CallOptions,
    ) -> impl Future<Output = GatewayResponse> + Send;

    /// Insert or upsert rows.
    fn insert(
        &self,
        payload: &InsertPayload,
        options: &CallOptions,
    ) -> impl Future<Output = GatewayResponse> + Send;

    /// Update rows matching the payload conditions.
    fn update(
        &self,
        payload: &UpdatePayload,
        options: &CallOptions,
    ) -> impl Future<Output = GatewayResponse> + Send;

    /// Delete by resource id and/or conditions.
    fn delete(
        &self,
        payload: &DeletePayload,
        options: &CallOptions,
    ) -> impl Future<Output = GatewayResponse> + Send;

    /// Dispatch a prebuilt request to its endpoint.
    fn send(
        &self,
        request: &GatewayRequest,
        options: &CallOptions,
    ) -> impl Future<Output = GatewayResponse> + Send {
        async move {
            match request {
                GatewayRequest::Fetch(p) => self.fetch(p, options).await,
                GatewayRequest::Insert(p) => self.insert(p, options).await,
                GatewayRequest::Update(p) => self.update(p, options).await,
                GatewayRequest::Delete(p) => self.delete(p, options).await,
            }
        }
    }
}

impl<T: GatewayTransport> GatewayTransport for Arc<T> {
    fn fetch(
        &self,
        payload: &FetchPayload,
        options: &CallOptions,
    ) -> impl Future<Output = GatewayResponse> + Send {
        (**self).fetch(payload, options)
    }

    fn insert(
        &self,
        payload: &InsertPayload,
        options: &CallOptions,
    ) -> impl Future<Output = GatewayResponse> + Send {
        (**self).insert(payload, options)
    }

    fn update(
        &self,
        payload: &UpdatePayload,
        options: &CallOptions,
    ) -> impl Future<Output = GatewayResponse> + Send {
        (**self).update(payload, options)
    }

    fn delete(
        &self,
        payload: &DeletePayload,
        options: &CallOptions,
    ) -> impl Future<Output = GatewayResponse> + Send {
        (**self).delete(payload, options)
    }
}
