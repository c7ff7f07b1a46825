//! Shared test doubles.

#![allow(dead_code)]

use athena::{
    AthenaClient, CallOptions, DeletePayload, FetchPayload, GatewayRequest, GatewayResponse,
    GatewayTransport, InsertPayload, UpdatePayload,
};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

/// A transport that records every request and replays queued responses.
///
/// When the queue is empty it answers `200 []`.
#[derive(Default)]
pub struct MockTransport {
    requests: Mutex<Vec<(GatewayRequest, CallOptions)>>,
    responses: Mutex<VecDeque<GatewayResponse>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response built from a status code and JSON body.
    pub fn push_response(&self, status: u16, body: Value) {
        self.responses
            .lock()
            .unwrap()
            .push_back(GatewayResponse::from_body(status, body));
    }

    pub fn push_network_failure(&self, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(GatewayResponse::network_failure(message));
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<(GatewayRequest, CallOptions)> {
        self.requests.lock().unwrap().clone()
    }

    /// JSON body of the most recent request.
    pub fn last_payload(&self) -> Value {
        self.requests
            .lock()
            .unwrap()
            .last()
            .map(|(request, _)| request.to_json())
            .unwrap_or(Value::Null)
    }

    pub fn last_options(&self) -> CallOptions {
        self.requests
            .lock()
            .unwrap()
            .last()
            .map(|(_, options)| options.clone())
            .unwrap_or_default()
    }

    fn record(&self, request: GatewayRequest, options: &CallOptions) -> GatewayResponse {
        self.requests.lock().unwrap().push((request, options.clone()));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| GatewayResponse::from_body(200, Value::Array(Vec::new())))
    }
}

impl GatewayTransport for MockTransport {
    async fn fetch(&self, payload: &FetchPayload, options: &CallOptions) -> GatewayResponse {
        self.record(GatewayRequest::Fetch(payload.clone()), options)
    }

    async fn insert(&self, payload: &InsertPayload, options: &CallOptions) -> GatewayResponse {
        self.record(GatewayRequest::Insert(payload.clone()), options)
    }

    async fn update(&self, payload: &UpdatePayload, options: &CallOptions) -> GatewayResponse {
        self.record(GatewayRequest::Update(payload.clone()), options)
    }

    async fn delete(&self, payload: &DeletePayload, options: &CallOptions) -> GatewayResponse {
        self.record(GatewayRequest::Delete(payload.clone()), options)
    }
}

/// A client over a fresh [`MockTransport`].
pub fn mock_client(defaults: CallOptions) -> AthenaClient<MockTransport> {
    AthenaClient::with_transport(MockTransport::new(), defaults)
}
