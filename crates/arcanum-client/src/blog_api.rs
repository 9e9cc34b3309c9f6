//! Reqwest-backed implementation of the blog content endpoints.

use crate::gateway::{ApiGateway, RequestOptions};
use arcanum_core::api::BlogApi;
use arcanum_core::blog::{
    Article, ArticleListItem, ArticleListQuery, ArticleListResult, Category, CommentListResult,
    CreateCommentPayload, PartialSiteInfo, SiteInfo, Tag,
};
use arcanum_core::envelope::{CODE_OK, Envelope};
use arcanum_core::error::{ArcanumError, Result};
use async_trait::async_trait;

/// Page size used for the category and tag lookup lists.
const LOOKUP_PAGE_SIZE: u32 = 100;
/// Article status filter: published only.
const PUBLISHED_STATUS: &str = "1";

/// Blog content fetchers over the shared gateway.
#[derive(Clone)]
pub struct HttpBlogApi {
    gateway: ApiGateway,
}

impl HttpBlogApi {
    pub fn new(gateway: ApiGateway) -> Self {
        Self { gateway }
    }

    /// Emits the user-facing notification for failures the gateway has not
    /// already described, then re-raises.
    ///
    /// Auth failures and non-200 upstream codes were notified inside the
    /// gateway pipeline. An `Upstream` carrying the success code is built
    /// locally (e.g. an empty `data` payload) and gets its own message;
    /// everything else is transport-level and gets the resource-specific
    /// wording.
    fn surface(&self, err: ArcanumError, message: &str) -> ArcanumError {
        match &err {
            ArcanumError::Auth(_) => {}
            ArcanumError::Upstream { code, .. } if *code != CODE_OK => {}
            ArcanumError::Upstream { .. } => {
                self.gateway.hub().notify_error(err.user_message());
            }
            _ => self.gateway.hub().notify_error(message),
        }
        err
    }
}

#[async_trait]
impl BlogApi for HttpBlogApi {
    async fn fetch_articles(&self, query: &ArticleListQuery) -> Result<ArticleListResult> {
        let page_num = query.page_num();
        let page_size = query.page_size();

        let mut params: Vec<(String, String)> = vec![
            ("pageNum".to_string(), page_num.to_string()),
            ("pageSize".to_string(), page_size.to_string()),
            (
                "status".to_string(),
                query
                    .status
                    .clone()
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| PUBLISHED_STATUS.to_string()),
            ),
            ("delFlag".to_string(), "0".to_string()),
        ];
        if let Some(category_id) = query.category_id {
            params.push(("categoryId".to_string(), category_id.to_string()));
        }
        if let Some(tag_id) = query.tag_id {
            params.push(("tagId".to_string(), tag_id.to_string()));
        }
        if let Some(title) = query.title_filter().filter(|t| !t.is_empty()) {
            params.push(("title".to_string(), title.to_string()));
        }

        let envelope = self
            .gateway
            .get("/blog/article/list", &params, RequestOptions::default())
            .await
            .map_err(|err| self.surface(err, "文章列表加载失败，请稍后重试"))?;

        let rows: Vec<Article> = envelope.rows_as()?;
        let total = envelope.total_or(rows.len());

        Ok(ArticleListResult {
            list: rows.into_iter().map(ArticleListItem::from).collect(),
            total,
            page_num,
            page_size,
        })
    }

    async fn fetch_article_detail(&self, article_id: i64) -> Result<Article> {
        let envelope = self
            .gateway
            .get(
                &format!("/blog/article/{article_id}"),
                &[],
                RequestOptions::default(),
            )
            .await
            .map_err(|err| self.surface(err, "获取文章详情失败，请稍后重试"))?;

        envelope
            .opt_data_as::<Article>()
            .map_err(|err| self.surface(err, "获取文章详情失败，请稍后重试"))?
            .ok_or_else(|| {
                self.surface(
                    ArcanumError::upstream(CODE_OK, "文章数据为空"),
                    "获取文章详情失败，请稍后重试",
                )
            })
    }

    async fn fetch_categories(&self) -> Result<Vec<Category>> {
        let params = lookup_params();
        let envelope = self
            .gateway
            .get("/blog/category/list", &params, RequestOptions::default())
            .await
            .map_err(|err| self.surface(err, "分类数据加载失败"))?;

        envelope.rows_as()
    }

    async fn fetch_tags(&self) -> Result<Vec<Tag>> {
        let params = lookup_params();
        let envelope = self
            .gateway
            .get("/blog/tag/list", &params, RequestOptions::default())
            .await
            .map_err(|err| self.surface(err, "标签数据加载失败"))?;

        envelope.rows_as()
    }

    async fn fetch_site_info(&self) -> Result<SiteInfo> {
        // Best-effort endpoint: any failure falls back to the default
        // instead of rejecting, and raises no notification.
        let fetched: Result<Envelope> = self
            .gateway
            .get("/blog/site/info", &[], RequestOptions::default())
            .await;

        match fetched.and_then(|envelope| envelope.opt_data_as::<PartialSiteInfo>()) {
            Ok(Some(partial)) => Ok(SiteInfo::fallback().merged_with(partial)),
            Ok(None) => Ok(SiteInfo::fallback()),
            Err(err) => {
                tracing::warn!("site info unavailable, using fallback: {err}");
                Ok(SiteInfo::fallback())
            }
        }
    }

    async fn fetch_comments(
        &self,
        article_id: i64,
        page_num: u32,
        page_size: u32,
    ) -> Result<CommentListResult> {
        let params: Vec<(String, String)> = vec![
            ("articleId".to_string(), article_id.to_string()),
            ("status".to_string(), "1".to_string()),
            ("delFlag".to_string(), "0".to_string()),
            ("pageNum".to_string(), page_num.max(1).to_string()),
            ("pageSize".to_string(), page_size.max(1).to_string()),
        ];

        let envelope = self
            .gateway
            .get("/blog/comment/list", &params, RequestOptions::default())
            .await
            .map_err(|err| self.surface(err, "评论列表加载失败，请稍后重试"))?;

        let rows = envelope.rows_as()?;
        let total = envelope.total_or(rows.len());

        Ok(CommentListResult { list: rows, total })
    }

    async fn submit_comment(&self, payload: &CreateCommentPayload) -> Result<Envelope> {
        if payload.content.trim().is_empty() {
            return Err(ArcanumError::validation("评论内容不能为空"));
        }

        self.gateway
            .post_json("/blog/comment", payload, RequestOptions::default())
            .await
            .map_err(|err| self.surface(err, "评论提交失败，请稍后重试"))
    }
}

fn lookup_params() -> Vec<(String, String)> {
    vec![
        ("pageNum".to_string(), "1".to_string()),
        ("pageSize".to_string(), LOOKUP_PAGE_SIZE.to_string()),
    ]
}
