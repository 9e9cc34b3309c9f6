//! Blog data layer: singleton caches and observable views.
//!
//! # Module Structure
//!
//! - `service`: `BlogCache`, the process-wide cache service owning one
//!   keyed cache per resource
//! - `views`: observable per-usage views (article list, article detail,
//!   comments, categories, tags, site info)

mod service;
mod views;

pub use service::BlogCache;
pub use views::{
    ArticleDetailView, ArticleListView, CategoriesView, CommentsView, SiteInfoView, TagsView,
};
