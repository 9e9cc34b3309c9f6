//! Backend API traits.
//!
//! These traits are the seams between the application layer and the HTTP
//! infrastructure: stores and caches depend on `Arc<dyn …>` so tests can
//! inject in-memory implementations, while `arcanum-client` provides the
//! reqwest-backed ones.
//!
//! Error-notification contract: implementations surface a user-facing
//! notification at the fetch boundary *and* re-raise the error, so callers
//! own local error state but must not notify again.

use crate::auth::{CaptchaImage, LoginPayload, UserInfoPayload};
use crate::blog::{
    Article, ArticleListQuery, ArticleListResult, Category, CommentListResult,
    CreateCommentPayload, SiteInfo, Tag,
};
use crate::chat::{ChatCompletionRequest, ChatCompletionResult};
use crate::envelope::Envelope;
use crate::error::Result;
use async_trait::async_trait;

/// Read (and comment-write) access to the blog content endpoints.
#[async_trait]
pub trait BlogApi: Send + Sync {
    /// Fetches one page of articles matching `query`.
    async fn fetch_articles(&self, query: &ArticleListQuery) -> Result<ArticleListResult>;

    /// Fetches a single article with content.
    async fn fetch_article_detail(&self, article_id: i64) -> Result<Article>;

    /// Fetches all categories (single lookup page).
    async fn fetch_categories(&self) -> Result<Vec<Category>>;

    /// Fetches all tags (single lookup page).
    async fn fetch_tags(&self) -> Result<Vec<Tag>>;

    /// Fetches site metadata, falling back to the hardcoded default rather
    /// than failing.
    async fn fetch_site_info(&self) -> Result<SiteInfo>;

    /// Fetches a page of comments for an article.
    async fn fetch_comments(
        &self,
        article_id: i64,
        page_num: u32,
        page_size: u32,
    ) -> Result<CommentListResult>;

    /// Submits a new comment. Content must be non-empty.
    async fn submit_comment(&self, payload: &CreateCommentPayload) -> Result<Envelope>;
}

/// Access to the authentication endpoints.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchanges credentials for a token-bearing envelope.
    ///
    /// The raw envelope is returned because the token may live under `data`
    /// or at the top level.
    async fn login(&self, payload: &LoginPayload) -> Result<Envelope>;

    /// Fetches the current user's profile, permissions and roles.
    async fn fetch_user_info(&self) -> Result<UserInfoPayload>;

    /// Notifies the backend of a logout. Best-effort for callers.
    async fn logout(&self) -> Result<()>;

    /// Fetches a captcha challenge (unauthenticated, extended timeout).
    async fn fetch_captcha_image(&self) -> Result<CaptchaImage>;
}

/// Access to the chat-completion endpoint.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Issues a completion request and extracts the assistant text.
    async fn create_completion(&self, request: &ChatCompletionRequest)
    -> Result<ChatCompletionResult>;
}
