//! Client SDK for the fitness-testing backend.
//!
//! # Overview
//! Request building and response parsing are pure (`http`); the network
//! round-trip happens behind the `Transport` trait, so the host decides how
//! bytes move and tests can script responses deterministically.
//!
//! # Design
//! - `HttpClient` attaches the bearer token and refreshes it once on `401`.
//! - `ApiClient` exposes one typed method per backend operation.
//! - Token persistence is pluggable through `TokenStorage`: in memory, a JSON
//!   file, or a platform key-value store via `SecureStore`.
//! - `session`, `builder` and `templates` hold the client-side rules shared
//!   by the web and mobile front ends (role routing, workout validation and
//!   quick-start tests).
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod api;
pub mod builder;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod session;
pub mod storage;
pub mod templates;
pub mod transport;
pub mod types;

#[cfg(test)]
mod test_support;

pub use api::{ApiClient, Endpoints};
pub use client::HttpClient;
pub use config::{Platform, SdkConfig};
pub use error::{ApiError, ConfigError, StorageError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, RequestOptions};
pub use session::{AuthGate, Session, SessionManager};
pub use storage::{FileTokenStorage, MemoryTokenStorage, SecureStore, SecureTokenStorage, TokenPair, TokenStorage};
pub use transport::{ReqwestTransport, Transport};
