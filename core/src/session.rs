//! Session state shared by the web and mobile front ends.
//!
//! Screens never inspect tokens directly. They ask `SessionManager` who the
//! current user is, and an `AuthGate` tells a protected screen whether to
//! render, send the user to their role's home, or show sign-in.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::api::ApiClient;
use crate::error::ApiError;
use crate::types::{MeResponse, UserRole};

pub fn normalize_role(role: &str) -> Option<UserRole> {
    match role {
        "ATHLETE" => Some(UserRole::Athlete),
        "COACH" => Some(UserRole::Coach),
        "ADMIN" => Some(UserRole::Admin),
        _ => None,
    }
}

/// A `401` response or a session that could not be refreshed. `403` is not
/// unauthorized: the user is signed in but lacks the role.
pub fn is_unauthorized_error(error: &ApiError) -> bool {
    error.is_unauthorized()
}

/// Message suitable for showing to the user.
pub fn extract_error_message(error: &ApiError) -> String {
    match error {
        ApiError::Http { status, body } => match body {
            serde_json::Value::String(text) => text.clone(),
            serde_json::Value::Object(map) => match map.get("detail") {
                Some(serde_json::Value::String(detail)) => detail.clone(),
                _ => format!("HTTP {status}"),
            },
            _ => format!("HTTP {status}"),
        },
        other => other.to_string(),
    }
}

pub fn route_for_role(role: UserRole) -> &'static str {
    match role {
        UserRole::Athlete => "/athlete/dashboard",
        UserRole::Coach => "/coach/overview",
        UserRole::Admin => "/admin",
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub role: Option<UserRole>,
    pub email: Option<String>,
    pub is_loading: bool,
}

impl Session {
    pub fn loading() -> Self {
        Self {
            role: None,
            email: None,
            is_loading: true,
        }
    }

    pub fn anonymous() -> Self {
        Self {
            role: None,
            email: None,
            is_loading: false,
        }
    }

    pub fn from_me(me: &MeResponse) -> Self {
        Self {
            role: Some(me.role),
            email: Some(me.email.clone()),
            is_loading: false,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.role.is_some()
    }
}

/// Outcome of guarding a screen that only some roles may see.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthGate {
    Granted(MeResponse),
    /// Signed in with a role that is not allowed here; go to this route.
    Redirect(&'static str),
    SignIn,
}

/// Cooperative cancellation for a session load whose screen went away.
///
/// Cancelling never aborts the in-flight request; the result is dropped
/// when it arrives.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct SessionManager {
    api: Arc<ApiClient>,
    session: RwLock<Session>,
}

impl SessionManager {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            session: RwLock::new(Session::loading()),
        }
    }

    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    pub async fn session(&self) -> Session {
        self.session.read().await.clone()
    }

    /// Resolve the current user from stored tokens.
    ///
    /// Without tokens this is anonymous and makes no request. A rejected
    /// session clears storage and is anonymous too; any other failure is
    /// returned and leaves the session as it was.
    pub async fn hydrate(&self) -> Result<Session, ApiError> {
        let session = self.load().await?;
        *self.session.write().await = session.clone();
        Ok(session)
    }

    /// Like `hydrate`, but returns `None` and leaves state untouched if
    /// `cancel` fired while the load was in flight.
    pub async fn hydrate_unless_cancelled(&self, cancel: &CancelFlag) -> Result<Option<Session>, ApiError> {
        let loaded = self.load().await;
        if cancel.is_cancelled() {
            debug!("session load cancelled; result discarded");
            return Ok(None);
        }
        let session = loaded?;
        *self.session.write().await = session.clone();
        Ok(Some(session))
    }

    pub async fn require_role(&self, allowed: &[UserRole]) -> Result<AuthGate, ApiError> {
        match self.current_user().await? {
            None => {
                *self.session.write().await = Session::anonymous();
                Ok(AuthGate::SignIn)
            }
            Some(me) => {
                *self.session.write().await = Session::from_me(&me);
                if allowed.contains(&me.role) {
                    Ok(AuthGate::Granted(me))
                } else {
                    Ok(AuthGate::Redirect(route_for_role(me.role)))
                }
            }
        }
    }

    pub async fn logout(&self) -> Result<(), ApiError> {
        let result = self.api.logout().await;
        *self.session.write().await = Session::anonymous();
        result
    }

    async fn load(&self) -> Result<Session, ApiError> {
        Ok(match self.current_user().await? {
            Some(me) => Session::from_me(&me),
            None => Session::anonymous(),
        })
    }

    /// `None` when there is no usable session.
    async fn current_user(&self) -> Result<Option<MeResponse>, ApiError> {
        if self.api.current_tokens().await?.is_none() {
            return Ok(None);
        }
        match self.api.me().await {
            Ok(me) => Ok(Some(me)),
            Err(e) if is_unauthorized_error(&e) => {
                info!("stored session rejected; signing out");
                self.api.storage().clear().await?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::storage::{MemoryTokenStorage, TokenStorage};
    use crate::test_support::ScriptedTransport;

    const ME_COACH: &str = r#"{"id":"u2","email":"coach@example.com","role":"COACH","status":"ACTIVE"}"#;

    async fn manager(
        transport: ScriptedTransport,
        signed_in: bool,
    ) -> (SessionManager, Arc<ScriptedTransport>, Arc<MemoryTokenStorage>) {
        let transport = Arc::new(transport);
        let storage = Arc::new(MemoryTokenStorage::new());
        if signed_in {
            storage.set_tokens("a", "r").await.unwrap();
        }
        let api = ApiClient::new("http://localhost/api/v1", transport.clone(), storage.clone()).unwrap();
        (SessionManager::new(Arc::new(api)), transport, storage)
    }

    #[test]
    fn roles_normalize_strictly() {
        assert_eq!(normalize_role("COACH"), Some(UserRole::Coach));
        assert_eq!(normalize_role("coach"), None);
        assert_eq!(normalize_role(""), None);
    }

    #[test]
    fn unauthorized_classification() {
        assert!(is_unauthorized_error(&ApiError::Unauthenticated));
        assert!(is_unauthorized_error(&ApiError::Http { status: 401, body: json!(null) }));
        assert!(!is_unauthorized_error(&ApiError::Http { status: 403, body: json!(null) }));
        assert!(!is_unauthorized_error(&ApiError::Http { status: 500, body: json!(null) }));
        assert!(!is_unauthorized_error(&ApiError::Transport("offline".into())));
    }

    #[test]
    fn error_messages() {
        let text = ApiError::Http { status: 502, body: json!("Bad gateway") };
        assert_eq!(extract_error_message(&text), "Bad gateway");

        let detail = ApiError::Http { status: 400, body: json!({"detail": "Invalid credentials"}) };
        assert_eq!(extract_error_message(&detail), "Invalid credentials");

        let structured = ApiError::Http { status: 422, body: json!({"detail": [{"loc": ["body"]}]}) };
        assert_eq!(extract_error_message(&structured), "HTTP 422");

        assert_eq!(extract_error_message(&ApiError::Unauthenticated), "UNAUTHENTICATED");
        assert_eq!(extract_error_message(&ApiError::Transport("connection refused".into())), "connection refused");
    }

    #[test]
    fn home_routes() {
        assert_eq!(route_for_role(UserRole::Athlete), "/athlete/dashboard");
        assert_eq!(route_for_role(UserRole::Coach), "/coach/overview");
        assert_eq!(route_for_role(UserRole::Admin), "/admin");
    }

    #[tokio::test]
    async fn hydrate_without_tokens_makes_no_request() {
        let (manager, transport, _) = manager(ScriptedTransport::new(), false).await;
        assert!(manager.session().await.is_loading);

        let session = manager.hydrate().await.unwrap();
        assert_eq!(session, Session::anonymous());
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn hydrate_loads_current_user() {
        let (manager, _, _) = manager(ScriptedTransport::new().respond(200, ME_COACH), true).await;

        let session = manager.hydrate().await.unwrap();
        assert_eq!(session.role, Some(UserRole::Coach));
        assert_eq!(session.email.as_deref(), Some("coach@example.com"));
        assert_eq!(manager.session().await, session);
    }

    #[tokio::test]
    async fn hydrate_with_rejected_session_clears_storage() {
        let transport = ScriptedTransport::new()
            .respond(401, "")
            .respond(200, r#"{"accessToken":"a2"}"#)
            .respond(401, "");
        let (manager, _, storage) = manager(transport, true).await;

        let session = manager.hydrate().await.unwrap();
        assert!(!session.is_authenticated());
        assert!(storage.tokens().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn hydrate_propagates_server_errors() {
        let (manager, _, storage) = manager(ScriptedTransport::new().respond(500, "down"), true).await;

        let err = manager.hydrate().await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert!(storage.tokens().await.unwrap().is_some());
        assert!(manager.session().await.is_loading);
    }

    #[tokio::test]
    async fn cancelled_load_is_discarded() {
        let (manager, transport, _) = manager(ScriptedTransport::new().respond(200, ME_COACH), true).await;
        let cancel = CancelFlag::new();
        cancel.cancel();

        assert_eq!(manager.hydrate_unless_cancelled(&cancel).await.unwrap(), None);
        assert_eq!(transport.call_count(), 1);
        assert!(manager.session().await.is_loading);
    }

    #[tokio::test]
    async fn role_gate() {
        let transport = ScriptedTransport::new().respond(200, ME_COACH).respond(200, ME_COACH);
        let (manager, _, _) = manager(transport, true).await;

        match manager.require_role(&[UserRole::Coach, UserRole::Admin]).await.unwrap() {
            AuthGate::Granted(me) => assert_eq!(me.role, UserRole::Coach),
            other => panic!("expected access, got {other:?}"),
        }
        assert_eq!(
            manager.require_role(&[UserRole::Athlete]).await.unwrap(),
            AuthGate::Redirect("/coach/overview")
        );
    }

    #[tokio::test]
    async fn role_gate_without_session_asks_for_sign_in() {
        let (manager, _, _) = manager(ScriptedTransport::new(), false).await;
        assert_eq!(manager.require_role(&[UserRole::Athlete]).await.unwrap(), AuthGate::SignIn);
    }

    #[tokio::test]
    async fn logout_resets_session() {
        let transport = ScriptedTransport::new().respond(200, ME_COACH).respond(204, "");
        let (manager, _, storage) = manager(transport, true).await;

        manager.hydrate().await.unwrap();
        manager.logout().await.unwrap();

        assert_eq!(manager.session().await, Session::anonymous());
        assert!(storage.tokens().await.unwrap().is_none());
    }
}
