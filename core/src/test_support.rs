//! Transports that answer from a script instead of the network.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::Transport;

/// Replays queued responses in order and records every request it receives.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, ApiError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, status: u16, body: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(HttpResponse::new(status, body)));
        self
    }

    pub fn fail(self, message: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(ApiError::Transport(message.to_string())));
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("scripted transport ran out of responses"))
    }
}

/// Answers each request with the result of a routing function.
pub struct RoutedTransport<F> {
    route: F,
    requests: Mutex<Vec<HttpRequest>>,
}

impl<F> RoutedTransport<F>
where
    F: Fn(&HttpRequest) -> HttpResponse + Send + Sync,
{
    pub fn new(route: F) -> Self {
        Self {
            route,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn count_matching(&self, suffix: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.url.ends_with(suffix))
            .count()
    }
}

#[async_trait]
impl<F> Transport for RoutedTransport<F>
where
    F: Fn(&HttpRequest) -> HttpResponse + Send + Sync,
{
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let response = (self.route)(&request);
        self.requests.lock().unwrap().push(request);
        tokio::task::yield_now().await;
        Ok(response)
    }
}
