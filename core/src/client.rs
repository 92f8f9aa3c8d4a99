//! Authenticated HTTP client with one transparent token refresh per call.
//!
//! # Design
//! A logical call is at most two attempts. The attempt state is a local
//! `Attempt` value owned by each call, so concurrent calls never share a
//! retry flag:
//!
//! 1. `First`: send with the stored access token (if any).
//! 2. On `401`, exchange the refresh token at `/auth/refresh`. No refresh
//!    token, or a failed exchange, clears storage and yields
//!    `ApiError::Unauthenticated`.
//! 3. `Retried`: send once more with the new access token. A second `401` is
//!    returned to the caller as `ApiError::Http`.
//!
//! Refreshes are serialized. A call that was rejected with a token which has
//! since been replaced by another call's refresh retries with the new token
//! instead of refreshing again.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{ApiError, ConfigError};
use crate::http::{build_refresh_request, build_request, parse_body, HttpResponse, RequestOptions};
use crate::storage::TokenStorage;
use crate::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    First,
    Retried,
}

/// Response of one attempt together with the token it was sent with.
struct Exchange {
    response: HttpResponse,
    sent_with: Option<String>,
}

pub struct HttpClient {
    base_url: String,
    transport: Arc<dyn Transport>,
    storage: Arc<dyn TokenStorage>,
    refresh_gate: Mutex<()>,
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    /// Fails when `base_url` is blank. Trailing slashes are stripped.
    pub fn new(
        base_url: &str,
        transport: Arc<dyn Transport>,
        storage: Arc<dyn TokenStorage>,
    ) -> Result<Self, ApiError> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(ConfigError::MissingBaseUrl.into());
        }
        Ok(Self {
            base_url: base_url.to_string(),
            transport,
            storage,
            refresh_gate: Mutex::new(()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn storage(&self) -> &Arc<dyn TokenStorage> {
        &self.storage
    }

    /// Perform one logical request and decode the body into `T`.
    ///
    /// An empty or `204` body decodes from JSON `null`, so `()` and `Option<_>`
    /// are valid targets for endpoints that return nothing.
    pub async fn request<T: DeserializeOwned>(&self, path: &str, options: RequestOptions) -> Result<T, ApiError> {
        let value = self.request_raw(path, options).await?;
        serde_json::from_value(value).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    /// Like `request`, returning the parsed body without decoding it.
    pub async fn request_raw(&self, path: &str, options: RequestOptions) -> Result<Value, ApiError> {
        let mut attempt = Attempt::First;
        loop {
            let exchange = self.send(path, &options, attempt).await?;
            match (exchange.response.status, attempt) {
                (401, Attempt::First) => {
                    self.refresh_after_rejection(exchange.sent_with.as_deref()).await?;
                    attempt = Attempt::Retried;
                }
                _ => return into_result(exchange.response),
            }
        }
    }

    async fn send(&self, path: &str, options: &RequestOptions, attempt: Attempt) -> Result<Exchange, ApiError> {
        let access_token = self.storage.access_token().await?;
        let request = build_request(&self.base_url, path, options, access_token.as_deref())?;
        debug!(
            method = %request.method,
            path,
            ?attempt,
            authenticated = access_token.is_some(),
            "sending request"
        );
        let response = self.transport.execute(request).await?;
        debug!(path, status = response.status, ?attempt, "received response");
        Ok(Exchange {
            response,
            sent_with: access_token,
        })
    }

    /// Obtain a fresh access token after the server rejected `sent_with`.
    async fn refresh_after_rejection(&self, sent_with: Option<&str>) -> Result<(), ApiError> {
        let _gate = self.refresh_gate.lock().await;

        let current = self.storage.access_token().await?;
        if current.is_some() && current.as_deref() != sent_with {
            debug!("access token replaced while waiting; retrying without refresh");
            return Ok(());
        }

        let Some(refresh_token) = self.storage.refresh_token().await? else {
            warn!("access token rejected and no refresh token stored; signing out");
            return self.sign_out().await;
        };

        let response = self
            .transport
            .execute(build_refresh_request(&self.base_url, &refresh_token))
            .await?;
        if !response.is_success() {
            warn!(status = response.status, "token refresh rejected; signing out");
            return self.sign_out().await;
        }

        let payload = parse_body(&response);
        let Some(access_token) = non_empty_str(&payload, "accessToken") else {
            warn!("token refresh response carried no access token; signing out");
            return self.sign_out().await;
        };
        let next_refresh = non_empty_str(&payload, "refreshToken").unwrap_or(refresh_token.as_str());

        self.storage.set_tokens(access_token, next_refresh).await?;
        info!(rotated = next_refresh != refresh_token, "access token refreshed");
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), ApiError> {
        self.storage.clear().await?;
        Err(ApiError::Unauthenticated)
    }
}

fn non_empty_str<'a>(payload: &'a Value, key: &str) -> Option<&'a str> {
    payload.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Map the final response of a call to its parsed body or an `Http` error.
fn into_result(response: HttpResponse) -> Result<Value, ApiError> {
    let body = parse_body(&response);
    if response.is_success() {
        Ok(body)
    } else {
        Err(ApiError::Http {
            status: response.status,
            body,
        })
    }
}
