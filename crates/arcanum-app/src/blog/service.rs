//! The process-wide blog cache service.

use crate::cache::{FetchMode, KeyedCache};
use arcanum_core::api::BlogApi;
use arcanum_core::blog::{
    Article, ArticleListQuery, ArticleListResult, Category, CommentListResult,
    CreateCommentPayload, QueryKey, SiteInfo, Tag,
};
use arcanum_core::envelope::Envelope;
use arcanum_core::error::Result;
use std::sync::Arc;

/// Comments are fetched as a single fixed top page, not incrementally
/// paginated.
pub const COMMENT_PAGE_SIZE: u32 = 200;

/// One cache per resource, constructed once at process start and shared by
/// reference with every view.
///
/// Article list, article detail and comments are read-through (a cache hit
/// still revalidates); categories, tags and site info are cache-first.
pub struct BlogCache {
    api: Arc<dyn BlogApi>,
    article_list: KeyedCache<QueryKey, ArticleListResult>,
    article_detail: KeyedCache<i64, Article>,
    comments: KeyedCache<i64, CommentListResult>,
    categories: KeyedCache<(), Vec<Category>>,
    tags: KeyedCache<(), Vec<Tag>>,
    site_info: KeyedCache<(), SiteInfo>,
}

impl BlogCache {
    pub fn new(api: Arc<dyn BlogApi>) -> Self {
        Self {
            api,
            article_list: KeyedCache::new(),
            article_detail: KeyedCache::new(),
            comments: KeyedCache::new(),
            categories: KeyedCache::new(),
            tags: KeyedCache::new(),
            site_info: KeyedCache::new(),
        }
    }

    /// Cached page for `query`, if any.
    pub fn peek_article_list(&self, query: &ArticleListQuery) -> Option<ArticleListResult> {
        self.article_list.peek(&QueryKey::from_query(query))
    }

    /// Fetches one page of articles with coalescing and read-through
    /// revalidation.
    pub async fn article_list(
        &self,
        query: &ArticleListQuery,
        force: bool,
    ) -> Result<ArticleListResult> {
        let key = QueryKey::from_query(query);
        let api = self.api.clone();
        let query = query.clone();

        self.article_list
            .get_or_fetch(key, force, FetchMode::ReadThrough, move || async move {
                api.fetch_articles(&query).await
            })
            .await
    }

    pub fn peek_article_detail(&self, article_id: i64) -> Option<Article> {
        self.article_detail.peek(&article_id)
    }

    pub async fn article_detail(&self, article_id: i64, force: bool) -> Result<Article> {
        let api = self.api.clone();

        self.article_detail
            .get_or_fetch(article_id, force, FetchMode::ReadThrough, move || async move {
                api.fetch_article_detail(article_id).await
            })
            .await
    }

    pub fn peek_comments(&self, article_id: i64) -> Option<CommentListResult> {
        self.comments.peek(&article_id)
    }

    pub async fn comments(&self, article_id: i64, force: bool) -> Result<CommentListResult> {
        let api = self.api.clone();

        self.comments
            .get_or_fetch(article_id, force, FetchMode::ReadThrough, move || async move {
                api.fetch_comments(article_id, 1, COMMENT_PAGE_SIZE).await
            })
            .await
    }

    pub fn peek_categories(&self) -> Option<Vec<Category>> {
        self.categories.peek(&())
    }

    pub async fn categories(&self, force: bool) -> Result<Vec<Category>> {
        let api = self.api.clone();

        self.categories
            .get_or_fetch((), force, FetchMode::CacheFirst, move || async move {
                api.fetch_categories().await
            })
            .await
    }

    pub fn peek_tags(&self) -> Option<Vec<Tag>> {
        self.tags.peek(&())
    }

    pub async fn tags(&self, force: bool) -> Result<Vec<Tag>> {
        let api = self.api.clone();

        self.tags
            .get_or_fetch((), force, FetchMode::CacheFirst, move || async move {
                api.fetch_tags().await
            })
            .await
    }

    pub fn peek_site_info(&self) -> Option<SiteInfo> {
        self.site_info.peek(&())
    }

    pub async fn site_info(&self, force: bool) -> Result<SiteInfo> {
        let api = self.api.clone();

        self.site_info
            .get_or_fetch((), force, FetchMode::CacheFirst, move || async move {
                api.fetch_site_info().await
            })
            .await
    }

    /// Submits a comment. Not cached; the caller refreshes the thread.
    pub async fn submit_comment(&self, payload: &CreateCommentPayload) -> Result<Envelope> {
        self.api.submit_comment(payload).await
    }
}
