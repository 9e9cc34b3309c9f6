//! In-memory API doubles shared by the unit tests.

use arcanum_core::api::{AuthApi, BlogApi, ChatApi};
use arcanum_core::auth::{CaptchaImage, LoginPayload, UserInfoPayload, UserProfile};
use arcanum_core::blog::{
    Article, ArticleListItem, ArticleListQuery, ArticleListResult, Category, Comment,
    CommentListResult, CreateCommentPayload, SiteInfo, Tag,
};
use arcanum_core::chat::{ChatCompletionRequest, ChatCompletionResult};
use arcanum_core::envelope::Envelope;
use arcanum_core::error::{ArcanumError, Result};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::watch;

pub fn article(article_id: i64, title: &str) -> Article {
    Article {
        article_id,
        user_id: None,
        title: title.to_string(),
        summary: Some(format!("{title} 摘要")),
        content: Some(format!("{title} 正文")),
        category_id: Some(1),
        category_name: Some("随笔".to_string()),
        cover_image_url: None,
        status: Some("1".to_string()),
        allow_comment: Some("1".to_string()),
        view_count: Some(0),
        tag_ids: None,
        create_time: None,
        update_time: None,
    }
}

pub fn ok_envelope() -> Envelope {
    serde_json::from_value(json!({"code": 200, "msg": "操作成功"}))
        .expect("valid envelope literal")
}

/// Blog backend double with per-endpoint call counters, failure switches and
/// a gate for holding the article-list request open.
pub struct MockBlogApi {
    pub list_calls: AtomicUsize,
    pub detail_calls: AtomicUsize,
    pub category_calls: AtomicUsize,
    pub tag_calls: AtomicUsize,
    pub comment_calls: AtomicUsize,
    pub submitted: Mutex<Vec<CreateCommentPayload>>,
    articles: Mutex<Vec<Article>>,
    comments: Mutex<Vec<Comment>>,
    list_fails: AtomicBool,
    detail_fails: AtomicBool,
    list_gate: watch::Sender<bool>,
}

impl MockBlogApi {
    pub fn new() -> Self {
        let (list_gate, _) = watch::channel(true);
        Self {
            list_calls: AtomicUsize::new(0),
            detail_calls: AtomicUsize::new(0),
            category_calls: AtomicUsize::new(0),
            tag_calls: AtomicUsize::new(0),
            comment_calls: AtomicUsize::new(0),
            submitted: Mutex::new(Vec::new()),
            articles: Mutex::new(Vec::new()),
            comments: Mutex::new(Vec::new()),
            list_fails: AtomicBool::new(false),
            detail_fails: AtomicBool::new(false),
            list_gate,
        }
    }

    pub fn push_articles(&self, rows: Vec<(i64, &str)>) {
        let mut articles = self.articles.lock().unwrap();
        articles.clear();
        articles.extend(rows.into_iter().map(|(id, title)| article(id, title)));
    }

    pub fn push_comments(&self, rows: Vec<Comment>) {
        *self.comments.lock().unwrap() = rows;
    }

    pub fn fail_articles(&self, fail: bool) {
        self.list_fails.store(fail, Ordering::SeqCst);
    }

    pub fn fail_detail(&self, fail: bool) {
        self.detail_fails.store(fail, Ordering::SeqCst);
    }

    /// Holds subsequent article-list requests open until released.
    pub fn hold_articles(&self) {
        self.list_gate.send_replace(false);
    }

    pub fn release_articles(&self) {
        self.list_gate.send_replace(true);
    }
}

impl Default for MockBlogApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlogApi for MockBlogApi {
    async fn fetch_articles(&self, query: &ArticleListQuery) -> Result<ArticleListResult> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        let mut gate = self.list_gate.subscribe();
        let _ = gate.wait_for(|open| *open).await;

        if self.list_fails.load(Ordering::SeqCst) {
            return Err(ArcanumError::network("connection refused"));
        }

        let articles = self.articles.lock().unwrap();
        let list: Vec<ArticleListItem> =
            articles.iter().cloned().map(ArticleListItem::from).collect();
        let total = list.len() as i64;
        Ok(ArticleListResult {
            list,
            total,
            page_num: query.page_num(),
            page_size: query.page_size(),
        })
    }

    async fn fetch_article_detail(&self, article_id: i64) -> Result<Article> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);

        if self.detail_fails.load(Ordering::SeqCst) {
            return Err(ArcanumError::network("connection refused"));
        }

        self.articles
            .lock()
            .unwrap()
            .iter()
            .find(|article| article.article_id == article_id)
            .cloned()
            .ok_or_else(|| ArcanumError::upstream(200, "文章数据为空"))
    }

    async fn fetch_categories(&self) -> Result<Vec<Category>> {
        self.category_calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![Category {
            category_id: 1,
            name: "随笔".to_string(),
            description: None,
            sort: Some(1),
        }])
    }

    async fn fetch_tags(&self) -> Result<Vec<Tag>> {
        self.tag_calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![Tag {
            tag_id: 1,
            name: "Rust".to_string(),
        }])
    }

    async fn fetch_site_info(&self) -> Result<SiteInfo> {
        Ok(SiteInfo::fallback())
    }

    async fn fetch_comments(
        &self,
        article_id: i64,
        _page_num: u32,
        _page_size: u32,
    ) -> Result<CommentListResult> {
        self.comment_calls.fetch_add(1, Ordering::SeqCst);
        let list: Vec<Comment> = self
            .comments
            .lock()
            .unwrap()
            .iter()
            .filter(|comment| comment.article_id == article_id)
            .cloned()
            .collect();
        let total = list.len() as i64;
        Ok(CommentListResult { list, total })
    }

    async fn submit_comment(&self, payload: &CreateCommentPayload) -> Result<Envelope> {
        self.submitted.lock().unwrap().push(payload.clone());
        Ok(ok_envelope())
    }
}

/// Auth backend double. The login envelope and user-info payload are
/// configurable; failures are per-endpoint switches.
pub struct MockAuthApi {
    pub info_calls: AtomicUsize,
    pub logout_calls: AtomicUsize,
    login_envelope: Mutex<Envelope>,
    user_info: Mutex<UserInfoPayload>,
    login_fails: AtomicBool,
    info_fails: AtomicBool,
    logout_fails: AtomicBool,
}

impl MockAuthApi {
    pub fn new() -> Self {
        Self {
            info_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
            login_envelope: Mutex::new(
                serde_json::from_value(json!({
                    "code": 200,
                    "msg": "操作成功",
                    "data": {"token": "tok-1", "expiresIn": 720}
                }))
                .expect("valid envelope literal"),
            ),
            user_info: Mutex::new(UserInfoPayload {
                permissions: vec!["blog:read".to_string()],
                roles: vec!["reader".to_string()],
                user: Some(UserProfile {
                    user_id: 1,
                    user_name: "alice".to_string(),
                    nick_name: "爱丽丝".to_string(),
                    avatar: None,
                    email: None,
                    phonenumber: None,
                    sex: None,
                    dept_id: None,
                }),
            }),
            login_fails: AtomicBool::new(false),
            info_fails: AtomicBool::new(false),
            logout_fails: AtomicBool::new(false),
        }
    }

    pub fn set_login_envelope(&self, envelope: Envelope) {
        *self.login_envelope.lock().unwrap() = envelope;
    }

    pub fn set_user_info(&self, info: UserInfoPayload) {
        *self.user_info.lock().unwrap() = info;
    }

    pub fn fail_login(&self, fail: bool) {
        self.login_fails.store(fail, Ordering::SeqCst);
    }

    pub fn fail_user_info(&self, fail: bool) {
        self.info_fails.store(fail, Ordering::SeqCst);
    }

    pub fn fail_logout(&self, fail: bool) {
        self.logout_fails.store(fail, Ordering::SeqCst);
    }
}

impl Default for MockAuthApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthApi for MockAuthApi {
    async fn login(&self, _payload: &LoginPayload) -> Result<Envelope> {
        if self.login_fails.load(Ordering::SeqCst) {
            return Err(ArcanumError::auth("登录失败，请检查账号或密码"));
        }
        Ok(self.login_envelope.lock().unwrap().clone())
    }

    async fn fetch_user_info(&self) -> Result<UserInfoPayload> {
        self.info_calls.fetch_add(1, Ordering::SeqCst);
        if self.info_fails.load(Ordering::SeqCst) {
            return Err(ArcanumError::auth("登录状态已失效，请重新登录"));
        }
        Ok(self.user_info.lock().unwrap().clone())
    }

    async fn logout(&self) -> Result<()> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        if self.logout_fails.load(Ordering::SeqCst) {
            return Err(ArcanumError::network("connection refused"));
        }
        Ok(())
    }

    async fn fetch_captcha_image(&self) -> Result<CaptchaImage> {
        Ok(CaptchaImage::default())
    }
}

/// Chat backend double recording the last request it saw.
pub struct MockChatApi {
    pub calls: AtomicUsize,
    pub last_request: Mutex<Option<ChatCompletionRequest>>,
    reply: Mutex<String>,
    fails: AtomicBool,
    hangs: AtomicBool,
}

impl MockChatApi {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
            reply: Mutex::new("好的，已收到。".to_string()),
            fails: AtomicBool::new(false),
            hangs: AtomicBool::new(false),
        }
    }

    pub fn set_reply(&self, reply: &str) {
        *self.reply.lock().unwrap() = reply.to_string();
    }

    pub fn fail(&self, fail: bool) {
        self.fails.store(fail, Ordering::SeqCst);
    }

    /// Makes subsequent requests never settle (for timeout/cancel tests).
    pub fn hang(&self, hang: bool) {
        self.hangs.store(hang, Ordering::SeqCst);
    }
}

impl Default for MockChatApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatApi for MockChatApi {
    async fn create_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());

        if self.hangs.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }

        if self.fails.load(Ordering::SeqCst) {
            return Err(ArcanumError::upstream(500, "模型服务不可用"));
        }

        Ok(ChatCompletionResult {
            content: self.reply.lock().unwrap().clone(),
            raw: None,
        })
    }
}
