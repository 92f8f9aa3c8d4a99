//! Helpers shared by the integration test binaries.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use hf_core::{ApiError, HttpMethod, HttpRequest, HttpResponse, Transport};

/// Replays canned responses in order and records what was sent.
#[derive(Default)]
pub struct RecordingTransport {
    responses: Mutex<VecDeque<HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl RecordingTransport {
    pub fn new(responses: impl IntoIterator<Item = HttpResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ApiError::Transport("no canned response left".to_string()))
    }
}

/// Parse the method string from test vectors into `HttpMethod`.
pub fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "PATCH" => HttpMethod::Patch,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

/// Canned response from a vector entry `{"status": .., "body": ..}`. A
/// string body is sent verbatim, anything else as JSON, and a missing body
/// as an empty one.
pub fn canned_response(entry: &serde_json::Value) -> HttpResponse {
    let status = entry["status"].as_u64().unwrap() as u16;
    let body = match &entry["body"] {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(text) => text.clone(),
        other => other.to_string(),
    };
    HttpResponse::new(status, body)
}
