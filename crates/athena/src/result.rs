//! Gateway responses and the normalized result returned to callers.

use crate::error::AthenaResult;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw outcome of one transport call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayResponse {
    /// Whether the HTTP status was 2xx.
    pub ok: bool,
    /// HTTP status, or `0` when no response was received.
    pub status: u16,
    /// Parsed response body.
    pub data: Option<Value>,
    /// Gateway or network error message.
    pub error: Option<String>,
    /// Parsed response body, kept untouched.
    pub raw: Value,
}

impl GatewayResponse {
    /// A response for a request that never reached the gateway.
    pub fn network_failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            status: 0,
            data: None,
            error: Some(message.into()),
            raw: Value::Null,
        }
    }

    /// Build a response from a status code and a parsed body.
    ///
    /// For non-2xx statuses the error message is the body's `error` field,
    /// falling back to `message`, when either is a non-empty string. A 2xx body
    /// is data, even when a row has an `error` or `message` column.
    pub fn from_body(status: u16, body: Value) -> Self {
        let ok = (200..300).contains(&status);
        let error = if ok {
            None
        } else {
            ["error", "message"].iter().find_map(|key| {
                body.get(key)
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            })
        };
        Self {
            ok,
            status,
            data: (!body.is_null()).then(|| body.clone()),
            error,
            raw: body,
        }
    }
}

/// Parse a response body: empty is `null`, JSON is parsed, anything else is
/// kept as a string.
pub(crate) fn parse_body(text: &str) -> Value {
    if text.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Normalized outcome of every builder and mutation operation.
///
/// `data` is `None` whenever the operation failed; `error` is `None` whenever
/// it succeeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult<T = Value> {
    pub data: Option<T>,
    pub error: Option<String>,
    pub status: u16,
    pub raw: Value,
}

impl<T> QueryResult<T> {
    /// Whether the operation succeeded.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Map the data payload, keeping status and raw body.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> QueryResult<U> {
        QueryResult {
            data: self.data.map(f),
            error: self.error,
            status: self.status,
            raw: self.raw,
        }
    }
}

impl QueryResult<Value> {
    /// Collapse array data to its first element (`None` when empty).
    ///
    /// Non-array data passes through unchanged.
    pub fn into_single(self) -> QueryResult<Value> {
        let QueryResult {
            data,
            error,
            status,
            raw,
        } = self;
        let data = match data {
            Some(Value::Array(items)) => items.into_iter().next(),
            other => other,
        };
        QueryResult {
            data,
            error,
            status,
            raw,
        }
    }

    /// Deserialize the data payload into a typed value.
    pub fn decode<R: DeserializeOwned>(self) -> AthenaResult<QueryResult<R>> {
        let data = self.data.map(serde_json::from_value).transpose()?;
        Ok(QueryResult {
            data,
            error: self.error,
            status: self.status,
            raw: self.raw,
        })
    }
}

impl From<GatewayResponse> for QueryResult<Value> {
    fn from(response: GatewayResponse) -> Self {
        if response.ok {
            return QueryResult {
                data: response.data,
                error: None,
                status: response.status,
                raw: response.raw,
            };
        }
        let error = response
            .error
            .unwrap_or_else(|| format!("gateway request failed with status {}", response.status));
        QueryResult {
            data: None,
            error: Some(error),
            status: response.status,
            raw: response.raw,
        }
    }
}
