use super::{Endpoint, GatewayTransport};
use crate::error::AthenaResult;
use crate::options::CallOptions;
use crate::payload::{DeletePayload, FetchPayload, InsertPayload, UpdatePayload};
use crate::result::{GatewayResponse, parse_body};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Base URL used when neither the call nor the transport config names one.
pub const DEFAULT_BASE_URL: &str = "https://athena-db.com";

/// Default `X-Athena-Client` value.
pub const DEFAULT_CLIENT: &str = "railway_direct";

/// Configuration for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Fallback base URL when the call options carry none.
    pub base_url: String,
    /// Total request timeout. `None` means no timeout (default).
    pub timeout: Option<Duration>,
    /// TCP connect timeout.
    pub connect_timeout: Option<Duration>,
    /// Value of the `User-Agent` header.
    pub user_agent: Option<String>,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
            connect_timeout: None,
            user_agent: Some(concat!("athena-rs/", env!("CARGO_PKG_VERSION")).to_string()),
        }
    }
}

impl HttpTransportConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fallback base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the total request timeout.
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Set the connect timeout.
    pub fn connect_timeout(mut self, duration: Duration) -> Self {
        self.connect_timeout = Some(duration);
        self
    }

    /// Set the `User-Agent` header.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }
}

/// Compute the request headers for a merged option set.
///
/// Names are lowercase. Custom `headers` are applied last and override a
/// computed header of the same name regardless of case; custom headers with
/// empty values are skipped.
pub fn build_headers(options: &CallOptions) -> BTreeMap<String, String> {
    fn non_empty(value: &Option<String>) -> Option<&str> {
        value.as_deref().filter(|v| !v.is_empty())
    }

    let mut headers = BTreeMap::new();
    headers.insert("content-type".to_string(), "application/json".to_string());

    if let Some(user) = non_empty(&options.user_id) {
        headers.insert("x-user-id".to_string(), user.to_string());
    }
    if let Some(company) = non_empty(&options.company_id) {
        headers.insert("x-company-id".to_string(), company.to_string());
    }
    if let Some(org) = non_empty(&options.organization_id) {
        headers.insert("x-organization-id".to_string(), org.to_string());
    }

    let client = options.client.as_deref().unwrap_or(DEFAULT_CLIENT);
    if !client.is_empty() {
        headers.insert("x-athena-client".to_string(), client.to_string());
    }

    let strip_nulls = options.strip_nulls.unwrap_or(true);
    headers.insert("x-strip-nulls".to_string(), strip_nulls.to_string());

    if let Some(event) = non_empty(&options.publish_event) {
        headers.insert("x-publish-event".to_string(), event.to_string());
    }
    if let Some(key) = non_empty(&options.api_key) {
        headers.insert("apikey".to_string(), key.to_string());
        headers.insert("x-api-key".to_string(), key.to_string());
    }
    if let Some(url) = non_empty(&options.supabase_url) {
        headers.insert("x-supabase-url".to_string(), url.to_string());
    }
    if let Some(key) = non_empty(&options.supabase_key) {
        headers.insert("x-supabase-key".to_string(), key.to_string());
    }

    for (name, value) in &options.headers {
        if !value.is_empty() {
            headers.insert(name.to_ascii_lowercase(), value.clone());
        }
    }

    headers
}

fn to_header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap, String> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| format!("invalid header name `{name}`: {e}"))?;
        let header_value =
            HeaderValue::from_str(value).map_err(|e| format!("invalid value for header `{name}`: {e}"))?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}

/// [`GatewayTransport`] over HTTP using `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    config: HttpTransportConfig,
}

impl HttpTransport {
    /// Create a transport with a freshly built `reqwest` client.
    pub fn new(config: HttpTransportConfig) -> AthenaResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(agent) = &config.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        Ok(Self {
            client: builder.build()?,
            config,
        })
    }

    /// Create a transport around an existing `reqwest` client.
    pub fn with_client(client: reqwest::Client, config: HttpTransportConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &HttpTransportConfig {
        &self.config
    }

    /// Full URL for an endpoint, with one trailing `/` removed from the base.
    pub fn url_for(&self, endpoint: Endpoint, options: &CallOptions) -> String {
        let base = options.base_url.as_deref().unwrap_or(&self.config.base_url);
        let base = base.strip_suffix('/').unwrap_or(base);
        format!("{base}{}", endpoint.path())
    }

    async fn call<P: Serialize + Sync>(
        &self,
        endpoint: Endpoint,
        payload: &P,
        options: &CallOptions,
    ) -> GatewayResponse {
        let url = self.url_for(endpoint, options);
        let headers = match to_header_map(&build_headers(options)) {
            Ok(headers) => headers,
            Err(message) => return GatewayResponse::network_failure(message),
        };
        let method = match endpoint {
            Endpoint::Fetch | Endpoint::Update => reqwest::Method::POST,
            Endpoint::Insert => reqwest::Method::PUT,
            Endpoint::Delete => reqwest::Method::DELETE,
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(target: "athena.gateway", %endpoint, %url, "sending gateway request");

        let sent = self
            .client
            .request(method, &url)
            .headers(headers)
            .json(payload)
            .send()
            .await;

        let response = match sent {
            Ok(response) => {
                let status = response.status().as_u16();
                match response.text().await {
                    Ok(text) => GatewayResponse::from_body(status, parse_body(&text)),
                    Err(err) => GatewayResponse::network_failure(err.to_string()),
                }
            }
            Err(err) => GatewayResponse::network_failure(err.to_string()),
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: "athena.gateway",
            %endpoint,
            status = response.status,
            ok = response.ok,
            error = response.error.as_deref().unwrap_or("-"),
            "gateway response"
        );

        response
    }
}

impl GatewayTransport for HttpTransport {
    async fn fetch(&self, payload: &FetchPayload, options: &CallOptions) -> GatewayResponse {
        self.call(Endpoint::Fetch, payload, options).await
    }

    async fn insert(&self, payload: &InsertPayload, options: &CallOptions) -> GatewayResponse {
        self.call(Endpoint::Insert, payload, options).await
    }

    async fn update(&self, payload: &UpdatePayload, options: &CallOptions) -> GatewayResponse {
        self.call(Endpoint::Update, payload, options).await
    }

    async fn delete(&self, payload: &DeletePayload, options: &CallOptions) -> GatewayResponse {
        self.call(Endpoint::Delete, payload, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_headers() {
        let headers = build_headers(&CallOptions::new());
        assert_eq!(headers.get("content-type").unwrap(), "application/json");
        assert_eq!(headers.get("x-athena-client").unwrap(), DEFAULT_CLIENT);
        assert_eq!(headers.get("x-strip-nulls").unwrap(), "true");
        assert!(!headers.contains_key("apikey"));
        assert!(!headers.contains_key("x-user-id"));
    }

    #[test]
    fn test_identity_and_auth_headers() {
        let options = CallOptions::new()
            .api_key("secret")
            .user_id("u-1")
            .company_id("c-1")
            .organization_id("")
            .strip_nulls(false)
            .publish_event("orders.created")
            .supabase_url("https://sb.example")
            .supabase_key("sb-key");
        let headers = build_headers(&options);
        assert_eq!(headers.get("apikey").unwrap(), "secret");
        assert_eq!(headers.get("x-api-key").unwrap(), "secret");
        assert_eq!(headers.get("x-user-id").unwrap(), "u-1");
        assert_eq!(headers.get("x-company-id").unwrap(), "c-1");
        assert!(!headers.contains_key("x-organization-id"));
        assert_eq!(headers.get("x-strip-nulls").unwrap(), "false");
        assert_eq!(headers.get("x-publish-event").unwrap(), "orders.created");
        assert_eq!(headers.get("x-supabase-url").unwrap(), "https://sb.example");
        assert_eq!(headers.get("x-supabase-key").unwrap(), "sb-key");
    }

    #[test]
    fn test_custom_headers_override_and_skip_empty() {
        let options = CallOptions::new()
            .header("X-Athena-Client", "custom_client")
            .header("x-empty", "");
        let headers = build_headers(&options);
        assert_eq!(headers.get("x-athena-client").unwrap(), "custom_client");
        assert!(!headers.contains_key("x-empty"));
    }

    #[test]
    fn test_custom_header_override_ignores_case() {
        let options = CallOptions::new()
            .api_key("computed-key")
            .header("X-Api-Key", "custom-key")
            .header("Apikey", "custom-apikey")
            .header("x-strip-NULLS", "false");
        let headers = build_headers(&options);
        assert_eq!(headers.get("x-api-key").unwrap(), "custom-key");
        assert_eq!(headers.get("apikey").unwrap(), "custom-apikey");
        assert_eq!(headers.get("x-strip-nulls").unwrap(), "false");
        assert!(!headers.contains_key("X-Api-Key"));
        assert!(!headers.contains_key("Apikey"));

        let map = to_header_map(&headers).unwrap();
        assert_eq!(map.get("x-api-key").unwrap(), "custom-key");
        assert_eq!(map.get("apikey").unwrap(), "custom-apikey");
        assert_eq!(map.get_all("apikey").iter().count(), 1);
    }

    #[test]
    fn test_invalid_header_is_reported() {
        let mut headers = BTreeMap::new();
        headers.insert("bad header".to_string(), "v".to_string());
        let err = to_header_map(&headers).unwrap_err();
        assert!(err.contains("bad header"));
    }

    #[test]
    fn test_url_trims_one_trailing_slash() {
        let transport = HttpTransport::new(HttpTransportConfig::new()).unwrap();
        let options = CallOptions::new().base_url("https://gw.example/");
        assert_eq!(
            transport.url_for(Endpoint::Update, &options),
            "https://gw.example/gateway/update"
        );
        assert_eq!(
            transport.url_for(Endpoint::Fetch, &CallOptions::new()),
            "https://athena-db.com/gateway/fetch"
        );
    }
}
