//! Session and credential state.
//!
//! `SessionStore` owns the authenticated-user snapshot: the bearer token
//! (persisted through [`TokenStore`]), the user profile, permissions and
//! roles. State transitions follow a strict order so observers never see an
//! authenticated snapshot without a profile: login stores the token first,
//! then hydrates; any hydration failure clears the token before the error
//! propagates.
//!
//! The store also listens on the hub's invalidation channel, so a 401
//! detected anywhere in the request layer resets the session without the
//! two components knowing about each other.

use arcanum_client::token::TokenStore;
use arcanum_core::api::AuthApi;
use arcanum_core::auth::{LoginPayload, UserProfile};
use arcanum_core::error::{ArcanumError, Result};
use arcanum_core::events::EventHub;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::watch;

/// Coarse session lifecycle phase, derived from the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Nothing resolved yet (process start, before the first hydration).
    Unresolved,
    /// A login or hydration is in progress.
    Resolving,
    /// Token present and profile loaded.
    Authenticated,
    /// Resolved to no valid session.
    Anonymous,
}

/// Observable session state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub token: Option<String>,
    pub profile: Option<UserProfile>,
    pub permissions: Vec<String>,
    pub roles: Vec<String>,
    pub loading: bool,
    /// Whether at least one hydration attempt has completed.
    pub initialized: bool,
}

impl SessionSnapshot {
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.profile.is_some()
    }

    pub fn status(&self) -> SessionStatus {
        if self.loading {
            SessionStatus::Resolving
        } else if !self.initialized {
            SessionStatus::Unresolved
        } else if self.is_authenticated() {
            SessionStatus::Authenticated
        } else {
            SessionStatus::Anonymous
        }
    }
}

/// The process-wide session store.
pub struct SessionStore {
    api: Arc<dyn AuthApi>,
    tokens: TokenStore,
    hub: Arc<EventHub>,
    state: watch::Sender<SessionSnapshot>,
    listener_started: AtomicBool,
}

impl SessionStore {
    /// Creates the store, seeding the token from persistence so a page
    /// reload does not look logged-out before hydration.
    pub fn new(api: Arc<dyn AuthApi>, tokens: TokenStore, hub: Arc<EventHub>) -> Self {
        let snapshot = SessionSnapshot {
            token: tokens.get_token(),
            ..Default::default()
        };
        let (state, _) = watch::channel(snapshot);

        Self {
            api,
            tokens,
            hub,
            state,
            listener_started: AtomicBool::new(false),
        }
    }

    /// Subscribes to session-state changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    /// A snapshot of the current session state.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    /// Exchanges credentials for a token and hydrates the profile.
    ///
    /// The token is accepted from `data.token` or the envelope's top level,
    /// whichever the backend used. A success envelope without a token is an
    /// authentication failure.
    ///
    /// # Errors
    ///
    /// Auth when the response carries no token or hydration rejects it;
    /// transport and upstream errors propagate from the API.
    pub async fn login(&self, payload: &LoginPayload) -> Result<()> {
        self.state.send_modify(|s| s.loading = true);

        let result = self.login_inner(payload).await;

        self.state.send_modify(|s| s.loading = false);
        result
    }

    async fn login_inner(&self, payload: &LoginPayload) -> Result<()> {
        let envelope = self.api.login(payload).await?;

        let token = field_from(&envelope.data, "token")
            .and_then(|v| v.as_str().map(str::to_string))
            .or_else(|| envelope.extra_as::<String>("token"));
        let expires_in = field_from(&envelope.data, "expiresIn")
            .and_then(|v| v.as_i64())
            .or_else(|| envelope.extra_as::<i64>("expiresIn"));

        let Some(token) = token else {
            let msg = envelope.msg();
            return Err(ArcanumError::auth(if msg.is_empty() {
                "登录失败"
            } else {
                msg
            }));
        };

        self.tokens.set_token(&token, expires_in);
        self.state.send_modify(|s| s.token = Some(token));

        self.hydrate_inner(true).await
    }

    /// Loads profile, permissions and roles for the stored token.
    ///
    /// Without a token this resolves to an initialized anonymous session
    /// and makes no request. Once initialized, repeat calls are no-ops
    /// unless `force` is set.
    ///
    /// # Errors
    ///
    /// Re-raises the user-info failure after clearing the token and
    /// resetting the session.
    pub async fn hydrate(&self, force: bool) -> Result<()> {
        self.state.send_modify(|s| s.loading = true);

        let result = self.hydrate_inner(force).await;

        self.state.send_modify(|s| s.loading = false);
        result
    }

    async fn hydrate_inner(&self, force: bool) -> Result<()> {
        let current = self.snapshot();

        if current.token.is_none() {
            self.reset_to_anonymous();
            return Ok(());
        }

        if current.initialized && !force {
            return Ok(());
        }

        match self.api.fetch_user_info().await {
            Ok(info) => {
                self.state.send_modify(|s| {
                    s.profile = info.user.clone();
                    s.permissions = info.permissions.clone();
                    s.roles = info.roles.clone();
                    s.initialized = true;
                });
                Ok(())
            }
            Err(err) => {
                // The token the backend rejected must not survive locally.
                self.tokens.clear_token();
                self.reset_to_anonymous();
                Err(err)
            }
        }
    }

    /// Ends the session.
    ///
    /// The backend call is best-effort: a failed logout request still clears
    /// the local session. Listeners are told through the invalidation
    /// channel so caches holding user-scoped data can drop it.
    pub async fn logout(&self, remote: bool) {
        if remote {
            if let Err(err) = self.api.logout().await {
                tracing::warn!("logout request failed: {}", err);
            }
        }

        self.tokens.clear_token();
        self.reset_to_anonymous();
        self.hub.broadcast_invalidation();
    }

    /// Starts the background task that resets the session whenever the hub
    /// broadcasts an invalidation. Idempotent; the task ends when the store
    /// is dropped.
    pub fn spawn_invalidation_listener(self: &Arc<Self>) {
        if self.listener_started.swap(true, Ordering::SeqCst) {
            return;
        }

        let mut rx = self.hub.subscribe_invalidation();
        let store: Weak<Self> = Arc::downgrade(self);

        tokio::spawn(async move {
            while rx.recv().await.is_ok() {
                let Some(store) = store.upgrade() else {
                    break;
                };
                store.reset_to_anonymous();
            }
        });
    }

    /// Resets the snapshot to an initialized anonymous session, re-reading
    /// the token from persistence.
    fn reset_to_anonymous(&self) {
        let token = self.tokens.get_token();
        self.state.send_modify(|s| {
            s.token = token.clone();
            s.profile = None;
            s.permissions = Vec::new();
            s.roles = Vec::new();
            s.initialized = true;
        });
    }
}

/// Looks up a field in the envelope's `data` object.
fn field_from<'a>(data: &'a Option<Value>, key: &str) -> Option<&'a Value> {
    data.as_ref().and_then(|value| value.get(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockAuthApi;
    use serde_json::json;

    fn store_with(api: Arc<MockAuthApi>) -> (Arc<SessionStore>, Arc<EventHub>) {
        let hub = Arc::new(EventHub::new());
        let store = Arc::new(SessionStore::new(
            api,
            TokenStore::in_memory(),
            hub.clone(),
        ));
        (store, hub)
    }

    fn credentials() -> LoginPayload {
        LoginPayload {
            username: "alice".to_string(),
            password: "secret".to_string(),
            code: None,
            uuid: None,
        }
    }

    #[tokio::test]
    async fn test_login_stores_token_and_hydrates() {
        let api = Arc::new(MockAuthApi::new());
        let (store, _hub) = store_with(api.clone());

        store.login(&credentials()).await.unwrap();

        let snapshot = store.snapshot();
        assert_eq!(snapshot.token.as_deref(), Some("tok-1"));
        assert_eq!(
            snapshot.profile.as_ref().map(|p| p.user_name.as_str()),
            Some("alice")
        );
        assert_eq!(snapshot.status(), SessionStatus::Authenticated);
        assert_eq!(api.info_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_login_accepts_top_level_token() {
        let api = Arc::new(MockAuthApi::new());
        api.set_login_envelope(
            serde_json::from_value(json!({"code": 200, "msg": "操作成功", "token": "top-tok"}))
                .unwrap(),
        );
        let (store, _hub) = store_with(api);

        store.login(&credentials()).await.unwrap();

        assert_eq!(store.snapshot().token.as_deref(), Some("top-tok"));
    }

    #[tokio::test]
    async fn test_login_without_token_is_auth_error() {
        let api = Arc::new(MockAuthApi::new());
        api.set_login_envelope(
            serde_json::from_value(json!({"code": 200, "msg": "操作成功"})).unwrap(),
        );
        let (store, _hub) = store_with(api.clone());

        let err = store.login(&credentials()).await.unwrap_err();

        assert!(err.is_auth());
        assert_eq!(store.snapshot().token, None);
        assert_eq!(api.info_calls.load(Ordering::SeqCst), 0);
        assert!(!store.snapshot().loading);
    }

    #[tokio::test]
    async fn test_hydrate_failure_clears_rejected_token() {
        let api = Arc::new(MockAuthApi::new());
        let (store, _hub) = store_with(api.clone());
        store.login(&credentials()).await.unwrap();

        // The backend stops accepting the token (expiry, revocation).
        api.fail_user_info(true);
        let err = store.hydrate(true).await.unwrap_err();

        assert!(err.is_auth());
        let snapshot = store.snapshot();
        assert_eq!(snapshot.token, None);
        assert_eq!(snapshot.profile, None);
        assert_eq!(snapshot.status(), SessionStatus::Anonymous);
    }

    #[tokio::test]
    async fn test_hydrate_without_token_skips_request() {
        let api = Arc::new(MockAuthApi::new());
        let (store, _hub) = store_with(api.clone());

        store.hydrate(false).await.unwrap();

        assert_eq!(api.info_calls.load(Ordering::SeqCst), 0);
        let snapshot = store.snapshot();
        assert!(snapshot.initialized);
        assert_eq!(snapshot.status(), SessionStatus::Anonymous);
    }

    #[tokio::test]
    async fn test_repeat_hydrate_is_cached_until_forced() {
        let api = Arc::new(MockAuthApi::new());
        let (store, _hub) = store_with(api.clone());
        store.login(&credentials()).await.unwrap();

        store.hydrate(false).await.unwrap();
        assert_eq!(api.info_calls.load(Ordering::SeqCst), 1);

        store.hydrate(true).await.unwrap();
        assert_eq!(api.info_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_logout_clears_session_and_broadcasts() {
        let api = Arc::new(MockAuthApi::new());
        let (store, hub) = store_with(api.clone());
        store.login(&credentials()).await.unwrap();

        let mut invalidations = hub.subscribe_invalidation();
        store.logout(true).await;

        assert_eq!(api.logout_calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.snapshot().status(), SessionStatus::Anonymous);
        assert!(invalidations.recv().await.is_ok());
    }

    #[tokio::test]
    async fn test_failed_remote_logout_still_clears_local_session() {
        let api = Arc::new(MockAuthApi::new());
        api.fail_logout(true);
        let (store, _hub) = store_with(api);
        store.login(&credentials()).await.unwrap();

        store.logout(true).await;

        assert_eq!(store.snapshot().token, None);
        assert_eq!(store.snapshot().status(), SessionStatus::Anonymous);
    }

    #[tokio::test]
    async fn test_invalidation_resets_session() {
        let api = Arc::new(MockAuthApi::new());
        let (store, hub) = store_with(api);
        store.login(&credentials()).await.unwrap();
        store.spawn_invalidation_listener();

        // Simulate the request layer detecting concurrent 401s elsewhere.
        hub.broadcast_invalidation();
        hub.broadcast_invalidation();

        let mut rx = store.subscribe();
        rx.wait_for(|s| s.profile.is_none()).await.unwrap();
        assert_eq!(store.snapshot().status(), SessionStatus::Anonymous);
    }

    #[tokio::test]
    async fn test_listener_spawn_is_idempotent() {
        let api = Arc::new(MockAuthApi::new());
        let (store, _hub) = store_with(api);
        store.spawn_invalidation_listener();
        store.spawn_invalidation_listener();
        assert!(store.listener_started.load(Ordering::SeqCst));
    }
}
