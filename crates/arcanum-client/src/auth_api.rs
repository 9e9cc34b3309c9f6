//! Reqwest-backed implementation of the authentication endpoints.

use crate::gateway::{ApiGateway, RequestOptions};
use arcanum_core::api::AuthApi;
use arcanum_core::auth::{CaptchaImage, LoginPayload, UserInfoPayload, UserProfile};
use arcanum_core::envelope::Envelope;
use arcanum_core::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// The captcha image can be slow to render server-side.
const CAPTCHA_TIMEOUT: Duration = Duration::from_secs(20);

/// Authentication fetchers over the shared gateway.
#[derive(Clone)]
pub struct HttpAuthApi {
    gateway: ApiGateway,
}

impl HttpAuthApi {
    pub fn new(gateway: ApiGateway) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn login(&self, payload: &LoginPayload) -> Result<Envelope> {
        // skip_auth: a stale bearer header must not leak into login, and a
        // 401 here is a credential failure, not a session invalidation.
        self.gateway
            .post_json("/login", payload, RequestOptions::skip_auth())
            .await
    }

    async fn fetch_user_info(&self) -> Result<UserInfoPayload> {
        let envelope = self
            .gateway
            .get("/getInfo", &[], RequestOptions::default())
            .await?;

        // Profile and grants usually live under `data`, but some deployments
        // put them at the top level of the envelope. Fall back per field.
        let from_data = envelope.opt_data_as::<UserInfoPayload>()?.unwrap_or_default();

        Ok(UserInfoPayload {
            permissions: if from_data.permissions.is_empty() {
                envelope.extra_as("permissions").unwrap_or_default()
            } else {
                from_data.permissions
            },
            roles: if from_data.roles.is_empty() {
                envelope.extra_as("roles").unwrap_or_default()
            } else {
                from_data.roles
            },
            user: from_data
                .user
                .or_else(|| envelope.extra_as::<UserProfile>("user")),
        })
    }

    async fn logout(&self) -> Result<()> {
        self.gateway
            .post_empty("/logout", RequestOptions::default())
            .await?;
        Ok(())
    }

    async fn fetch_captcha_image(&self) -> Result<CaptchaImage> {
        let options = RequestOptions {
            skip_auth: true,
            timeout: Some(CAPTCHA_TIMEOUT),
        };
        let envelope = self.gateway.get("/captchaImage", &[], options).await?;

        // Captcha fields sit at the top level of the envelope, not in `data`.
        Ok(CaptchaImage {
            captcha_enabled: envelope.extra_as("captchaEnabled"),
            uuid: envelope.extra_as("uuid"),
            img: envelope.extra_as("img"),
        })
    }
}
