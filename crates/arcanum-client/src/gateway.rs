//! HTTP gateway to the blog backend.
//!
//! Every backend request goes through one pipeline: bearer-token injection,
//! envelope unwrap, mapping of non-success codes to domain failures, and the
//! unauthorized path (token clear + invalidation broadcast + login redirect)
//! when a 401 surfaces anywhere.
//!
//! Notification contract: the gateway emits the user-facing toast for
//! envelope-level failures (non-200 codes, 401). Transport-level failures are
//! returned un-notified so the per-resource fetchers can attach their own
//! wording. Callers above the fetchers must not notify again.

use crate::config::ClientConfig;
use crate::token::TokenStore;
use arcanum_core::envelope::{CODE_OK, CODE_UNAUTHORIZED, Envelope};
use arcanum_core::error::{ArcanumError, Result};
use arcanum_core::events::EventHub;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Per-request options.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestOptions {
    /// Skip bearer injection and the unauthorized side effects (used by
    /// login and captcha, where a 401 is an ordinary failure).
    pub skip_auth: bool,
    /// Override the client-wide timeout.
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn skip_auth() -> Self {
        Self {
            skip_auth: true,
            ..Self::default()
        }
    }
}

/// The single request pipeline shared by all fetchers.
#[derive(Clone)]
pub struct ApiGateway {
    client: reqwest::Client,
    config: ClientConfig,
    tokens: TokenStore,
    hub: Arc<EventHub>,
}

impl ApiGateway {
    /// Creates a gateway from configuration, token store and event hub.
    pub fn new(config: ClientConfig, tokens: TokenStore, hub: Arc<EventHub>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_default();

        Self {
            client,
            config,
            tokens,
            hub,
        }
    }

    /// The token store this gateway consults for credentials.
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// The event hub this gateway publishes signals to.
    pub fn hub(&self) -> &Arc<EventHub> {
        &self.hub
    }

    /// The client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Issues a GET request with query parameters.
    pub async fn get(
        &self,
        path: &str,
        params: &[(String, String)],
        options: RequestOptions,
    ) -> Result<Envelope> {
        let builder = self.client.get(self.url_for(path)).query(params);
        self.execute(builder, path, options).await
    }

    /// Issues a POST request with a JSON body.
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
        options: RequestOptions,
    ) -> Result<Envelope> {
        let builder = self.client.post(self.url_for(path)).json(body);
        self.execute(builder, path, options).await
    }

    /// Issues a POST request without a body.
    pub async fn post_empty(&self, path: &str, options: RequestOptions) -> Result<Envelope> {
        let builder = self.client.post(self.url_for(path));
        self.execute(builder, path, options).await
    }

    fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn execute(
        &self,
        mut builder: reqwest::RequestBuilder,
        path: &str,
        options: RequestOptions,
    ) -> Result<Envelope> {
        if !options.skip_auth {
            if let Some(token) = self.tokens.get_token() {
                builder = builder.header("Authorization", format!("Bearer {token}"));
            }
        }

        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(map_transport_error)?;
        let status = response.status().as_u16() as i64;

        if status == CODE_UNAUTHORIZED {
            return Err(self.handle_unauthorized(None, path, options));
        }

        let envelope: Envelope = match response.json().await {
            Ok(envelope) => envelope,
            Err(err) => {
                tracing::warn!("failed to decode response envelope for {path}: {err}");
                return Err(self.envelope_decode_failure(status));
            }
        };

        let code = envelope.code_or(status);

        if code == CODE_UNAUTHORIZED {
            let msg = (!envelope.msg().is_empty()).then(|| envelope.msg().to_string());
            return Err(self.handle_unauthorized(msg, path, options));
        }

        if code != CODE_OK {
            let message = if envelope.msg().is_empty() {
                "接口请求失败".to_string()
            } else {
                envelope.msg().to_string()
            };
            self.hub.notify_error(&message);
            return Err(ArcanumError::upstream(code, message));
        }

        Ok(envelope)
    }

    /// A body that does not parse as the canonical envelope is an upstream
    /// failure; the gateway owns its notification like any other
    /// envelope-level failure.
    fn envelope_decode_failure(&self, status: i64) -> ArcanumError {
        let message = "响应解析失败，请稍后再试";
        self.hub.notify_error(message);
        ArcanumError::upstream(status, message)
    }

    /// The unauthorized path: clear the credential, broadcast invalidation,
    /// and request navigation to the login route with the original path
    /// preserved in the `redirect` parameter.
    ///
    /// Requests marked `skip_auth` (login itself, captcha) bypass the side
    /// effects and get a plain auth failure notification instead.
    fn handle_unauthorized(
        &self,
        message: Option<String>,
        path: &str,
        options: RequestOptions,
    ) -> ArcanumError {
        if options.skip_auth {
            let message = message.unwrap_or_else(|| "登录失败，请检查账号或密码".to_string());
            self.hub.notify_error(&message);
            return ArcanumError::auth(message);
        }

        self.tokens.clear_token();
        self.hub.broadcast_invalidation();
        self.hub.navigate(login_redirect_target(path));

        let message = message.unwrap_or_else(|| "登录状态已失效，请重新登录".to_string());
        self.hub.notify_error(&message);
        ArcanumError::auth(message)
    }
}

/// Builds the login route carrying the original path as a `redirect`
/// query parameter.
pub fn login_redirect_target(original_path: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(original_path.as_bytes()).collect();
    format!("/login?redirect={encoded}")
}

fn map_transport_error(err: reqwest::Error) -> ArcanumError {
    if err.is_timeout() {
        ArcanumError::Timeout
    } else {
        ArcanumError::network(err.to_string())
    }
}
