//! Observable views over the blog caches.
//!
//! Each view pairs a `StateCell` with the shared `BlogCache` and implements
//! the stale-while-revalidate display contract: a cache hit is published
//! immediately, the fetch proceeds (coalesced with any in-flight request for
//! the same key), success overwrites both cache and display, and failure
//! keeps the previously displayed value whenever a cache entry existed.

use crate::cache::{ResourceState, StateCell};
use crate::blog::BlogCache;
use arcanum_core::blog::{
    Article, ArticleListQuery, ArticleListResult, Category, CommentListResult,
    CreateCommentPayload, SiteInfo, Tag,
};
use arcanum_core::envelope::Envelope;
use arcanum_core::error::{ArcanumError, Result};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// Paged, filterable article list.
pub struct ArticleListView {
    cache: Arc<BlogCache>,
    query: Mutex<ArticleListQuery>,
    state: StateCell<ArticleListResult>,
}

impl ArticleListView {
    /// Creates a view over `cache` with an initial query. Call
    /// [`ArticleListView::load`] to populate it.
    pub fn new(cache: Arc<BlogCache>, initial_query: ArticleListQuery) -> Self {
        Self {
            cache,
            query: Mutex::new(initial_query),
            state: StateCell::new(),
        }
    }

    /// Subscribes to display-state changes.
    pub fn subscribe(&self) -> watch::Receiver<ResourceState<ArticleListResult>> {
        self.state.subscribe()
    }

    /// Snapshot of the current display state.
    pub fn state(&self) -> ResourceState<ArticleListResult> {
        self.state.get()
    }

    /// The current query.
    pub fn query(&self) -> ArticleListQuery {
        self.query.lock().unwrap().clone()
    }

    /// Loads the current page, serving a cached value first when present.
    pub async fn load(&self, force: bool) {
        let query = self.query();

        if !force {
            if let Some(cached) = self.cache.peek_article_list(&query) {
                self.state.show_cached(cached);
            }
        }

        self.state.set_loading(true);

        match self.cache.article_list(&query, force).await {
            Ok(result) => self.state.set_value(result),
            Err(err) => {
                let keep = self.cache.peek_article_list(&query).is_some();
                self.state.set_error(err.user_message(), keep);
            }
        }

        self.state.set_loading(false);
    }

    /// Force-refreshes the current page.
    pub async fn refresh(&self) {
        self.load(true).await;
    }

    /// Turns to `page` (1-based) and reloads. Page numbers below 1 are
    /// ignored.
    pub async fn set_page(&self, page: u32) {
        if page < 1 {
            return;
        }

        self.query.lock().unwrap().page_num = Some(page);
        self.load(false).await;
    }

    /// Replaces the filters, resets to the first page and reloads.
    pub async fn set_filters(
        &self,
        category_id: Option<i64>,
        tag_id: Option<i64>,
        keyword: Option<String>,
    ) {
        {
            let mut query = self.query.lock().unwrap();
            query.category_id = category_id;
            query.tag_id = tag_id;
            query.keyword = keyword;
            query.page_num = Some(1);
        }
        self.load(false).await;
    }
}

/// A single article with content.
pub struct ArticleDetailView {
    cache: Arc<BlogCache>,
    article_id: Mutex<Option<i64>>,
    state: StateCell<Article>,
}

impl ArticleDetailView {
    pub fn new(cache: Arc<BlogCache>) -> Self {
        Self {
            cache,
            article_id: Mutex::new(None),
            state: StateCell::new(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ResourceState<Article>> {
        self.state.subscribe()
    }

    pub fn state(&self) -> ResourceState<Article> {
        self.state.get()
    }

    /// Points the view at an article. `None` models an id the UI has not
    /// resolved yet; loading it is a silent no-op.
    pub fn set_article_id(&self, article_id: Option<i64>) {
        *self.article_id.lock().unwrap() = article_id;
    }

    pub async fn load(&self, force: bool) {
        // An unresolved id is a transient UI state, not an error.
        let Some(article_id) = *self.article_id.lock().unwrap() else {
            return;
        };

        if !force {
            if let Some(cached) = self.cache.peek_article_detail(article_id) {
                self.state.show_cached(cached);
            }
        }

        self.state.set_loading(true);

        match self.cache.article_detail(article_id, force).await {
            Ok(article) => self.state.set_value(article),
            Err(err) => {
                let keep = self.cache.peek_article_detail(article_id).is_some();
                self.state.set_error(err.user_message(), keep);
            }
        }

        self.state.set_loading(false);
    }

    pub async fn refresh(&self) {
        self.load(true).await;
    }
}

/// The comment thread of one article (fixed top page).
pub struct CommentsView {
    cache: Arc<BlogCache>,
    article_id: Mutex<Option<i64>>,
    state: StateCell<CommentListResult>,
}

impl CommentsView {
    pub fn new(cache: Arc<BlogCache>) -> Self {
        Self {
            cache,
            article_id: Mutex::new(None),
            state: StateCell::new(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ResourceState<CommentListResult>> {
        self.state.subscribe()
    }

    pub fn state(&self) -> ResourceState<CommentListResult> {
        self.state.get()
    }

    pub fn set_article_id(&self, article_id: Option<i64>) {
        *self.article_id.lock().unwrap() = article_id;
    }

    pub async fn load(&self, force: bool) {
        let Some(article_id) = *self.article_id.lock().unwrap() else {
            return;
        };

        if !force {
            if let Some(cached) = self.cache.peek_comments(article_id) {
                self.state.show_cached(cached);
            }
        }

        self.state.set_loading(true);

        match self.cache.comments(article_id, force).await {
            Ok(result) => self.state.set_value(result),
            Err(err) => {
                let keep = self.cache.peek_comments(article_id).is_some();
                self.state.set_error(err.user_message(), keep);
            }
        }

        self.state.set_loading(false);
    }

    pub async fn refresh(&self) {
        self.load(true).await;
    }

    /// Submits a comment on the viewed article.
    ///
    /// # Errors
    ///
    /// Returns a Validation error when no article id is set or the content
    /// is empty; backend failures are re-raised from the fetcher.
    pub async fn submit(
        &self,
        nickname: Option<String>,
        content: String,
        parent_id: Option<i64>,
    ) -> Result<Envelope> {
        let Some(article_id) = *self.article_id.lock().unwrap() else {
            return Err(ArcanumError::validation("文章 ID 无效"));
        };

        self.cache
            .submit_comment(&CreateCommentPayload {
                article_id,
                nickname,
                content,
                parent_id,
                code: None,
                uuid: None,
            })
            .await
    }
}

/// Global category lookup (cache-first).
pub struct CategoriesView {
    cache: Arc<BlogCache>,
    state: StateCell<Vec<Category>>,
}

impl CategoriesView {
    pub fn new(cache: Arc<BlogCache>) -> Self {
        let state = StateCell::with_value(cache.peek_categories());
        Self { cache, state }
    }

    pub fn subscribe(&self) -> watch::Receiver<ResourceState<Vec<Category>>> {
        self.state.subscribe()
    }

    pub fn state(&self) -> ResourceState<Vec<Category>> {
        self.state.get()
    }

    /// Ensures categories are present, fetching at most once across all
    /// concurrent callers.
    pub async fn ensure(&self, force: bool) {
        if !force {
            if let Some(cached) = self.cache.peek_categories() {
                self.state.set_value(cached);
                return;
            }
        }

        self.state.set_loading(true);

        match self.cache.categories(force).await {
            Ok(categories) => self.state.set_value(categories),
            Err(err) => {
                let keep = self.cache.peek_categories().is_some();
                self.state.set_error(err.user_message(), keep);
            }
        }

        self.state.set_loading(false);
    }

    pub async fn refresh(&self) {
        self.ensure(true).await;
    }
}

/// Global tag lookup (cache-first).
pub struct TagsView {
    cache: Arc<BlogCache>,
    state: StateCell<Vec<Tag>>,
}

impl TagsView {
    pub fn new(cache: Arc<BlogCache>) -> Self {
        let state = StateCell::with_value(cache.peek_tags());
        Self { cache, state }
    }

    pub fn subscribe(&self) -> watch::Receiver<ResourceState<Vec<Tag>>> {
        self.state.subscribe()
    }

    pub fn state(&self) -> ResourceState<Vec<Tag>> {
        self.state.get()
    }

    pub async fn ensure(&self, force: bool) {
        if !force {
            if let Some(cached) = self.cache.peek_tags() {
                self.state.set_value(cached);
                return;
            }
        }

        self.state.set_loading(true);

        match self.cache.tags(force).await {
            Ok(tags) => self.state.set_value(tags),
            Err(err) => {
                let keep = self.cache.peek_tags().is_some();
                self.state.set_error(err.user_message(), keep);
            }
        }

        self.state.set_loading(false);
    }

    pub async fn refresh(&self) {
        self.ensure(true).await;
    }
}

/// Site metadata (cache-first; the fetcher itself falls back to a default
/// instead of failing).
pub struct SiteInfoView {
    cache: Arc<BlogCache>,
    state: StateCell<SiteInfo>,
}

impl SiteInfoView {
    pub fn new(cache: Arc<BlogCache>) -> Self {
        let state = StateCell::with_value(cache.peek_site_info());
        Self { cache, state }
    }

    pub fn subscribe(&self) -> watch::Receiver<ResourceState<SiteInfo>> {
        self.state.subscribe()
    }

    pub fn state(&self) -> ResourceState<SiteInfo> {
        self.state.get()
    }

    pub async fn ensure(&self, force: bool) {
        if !force {
            if let Some(cached) = self.cache.peek_site_info() {
                self.state.set_value(cached);
                return;
            }
        }

        self.state.set_loading(true);

        match self.cache.site_info(force).await {
            Ok(info) => self.state.set_value(info),
            Err(err) => {
                let keep = self.cache.peek_site_info().is_some();
                self.state.set_error(err.user_message(), keep);
            }
        }

        self.state.set_loading(false);
    }

    pub async fn refresh(&self) {
        self.ensure(true).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockBlogApi;
    use std::sync::atomic::Ordering;

    fn view_with_mock() -> (Arc<MockBlogApi>, Arc<BlogCache>) {
        let api = Arc::new(MockBlogApi::new());
        let cache = Arc::new(BlogCache::new(api.clone()));
        (api, cache)
    }

    #[tokio::test]
    async fn test_list_load_populates_state() {
        let (api, cache) = view_with_mock();
        api.push_articles(vec![(1, "第一篇"), (2, "第二篇")]);

        let view = ArticleListView::new(cache, ArticleListQuery::default());
        view.load(false).await;

        let state = view.state();
        let result = state.value.unwrap();
        assert_eq!(result.list.len(), 2);
        assert_eq!(result.total, 2);
        assert!(!state.loading);
        assert_eq!(state.error, None);
    }

    #[tokio::test]
    async fn test_concurrent_identical_queries_share_one_request() {
        let (api, cache) = view_with_mock();
        api.push_articles(vec![(1, "文章")]);
        api.hold_articles();

        let query = ArticleListQuery {
            category_id: Some(5),
            page_num: Some(2),
            ..Default::default()
        };
        let view_a = Arc::new(ArticleListView::new(cache.clone(), query.clone()));
        let view_b = Arc::new(ArticleListView::new(cache.clone(), query.clone()));

        let a = {
            let view = view_a.clone();
            tokio::spawn(async move { view.load(false).await })
        };
        while api.list_calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        let b = {
            let view = view_b.clone();
            tokio::spawn(async move { view.load(false).await })
        };
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        api.release_articles();

        a.await.unwrap();
        b.await.unwrap();

        assert_eq!(api.list_calls.load(Ordering::SeqCst), 1);
        let result_a = view_a.state().value.unwrap();
        let result_b = view_b.state().value.unwrap();
        assert_eq!(result_a, result_b);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_displayed_value() {
        let (api, cache) = view_with_mock();
        api.push_articles(vec![(1, "旧文章")]);

        let view = ArticleListView::new(cache, ArticleListQuery::default());
        view.load(false).await;
        let before = view.state().value.unwrap();

        api.fail_articles(true);
        view.refresh().await;

        let state = view.state();
        assert_eq!(state.value.unwrap(), before);
        assert!(state.error.is_some());
    }

    #[tokio::test]
    async fn test_failure_without_cache_resets_value() {
        let (api, cache) = view_with_mock();
        api.fail_articles(true);

        let view = ArticleListView::new(cache, ArticleListQuery::default());
        view.load(false).await;

        let state = view.state();
        assert_eq!(state.value, None);
        assert!(state.error.is_some());
    }

    #[tokio::test]
    async fn test_success_after_failure_clears_error() {
        let (api, cache) = view_with_mock();
        api.fail_articles(true);

        let view = ArticleListView::new(cache, ArticleListQuery::default());
        view.load(false).await;
        assert!(view.state().error.is_some());

        api.fail_articles(false);
        api.push_articles(vec![(1, "文章")]);
        view.refresh().await;

        let state = view.state();
        assert!(state.error.is_none());
        assert!(state.value.is_some());
    }

    #[tokio::test]
    async fn test_detail_without_id_is_silent_noop() {
        let (api, cache) = view_with_mock();
        let view = ArticleDetailView::new(cache);

        view.load(false).await;

        assert_eq!(api.detail_calls.load(Ordering::SeqCst), 0);
        let state = view.state();
        assert_eq!(state.value, None);
        assert!(!state.loading);
        assert_eq!(state.error, None);
    }

    #[tokio::test]
    async fn test_categories_cache_hit_skips_request() {
        let (api, cache) = view_with_mock();

        let view = CategoriesView::new(cache.clone());
        view.ensure(false).await;
        view.ensure(false).await;

        assert_eq!(api.category_calls.load(Ordering::SeqCst), 1);

        // A second view over the same cache starts warm.
        let other = CategoriesView::new(cache);
        assert!(other.state().value.is_some());
    }

    #[tokio::test]
    async fn test_comment_submit_requires_article_id() {
        let (_api, cache) = view_with_mock();
        let view = CommentsView::new(cache);

        let err = view
            .submit(None, "好文！".to_string(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ArcanumError::Validation(_)));
    }

    #[tokio::test]
    async fn test_set_filters_resets_page() {
        let (api, cache) = view_with_mock();
        api.push_articles(vec![(1, "文章")]);

        let view = ArticleListView::new(
            cache,
            ArticleListQuery {
                page_num: Some(3),
                ..Default::default()
            },
        );
        view.set_filters(Some(5), None, None).await;

        let query = view.query();
        assert_eq!(query.page_num, Some(1));
        assert_eq!(query.category_id, Some(5));
    }
}
