//! Blog domain module.
//!
//! Domain models for the content site (articles, categories, tags, comments,
//! site metadata) plus the list-query type and its canonical cache key.
//!
//! # Module Structure
//!
//! - `model`: wire/domain models (`Article`, `Category`, `Tag`, `Comment`, `SiteInfo`)
//! - `query`: `ArticleListQuery` and the canonical `QueryKey` serialization

mod model;
mod query;

pub use model::{
    Article, ArticleListItem, ArticleListResult, Category, Comment, CommentListResult,
    CreateCommentPayload, PartialSiteInfo, PrincipleEntry, SiteInfo, Tag, TimelineEntry,
};
pub use query::{ArticleListQuery, QueryKey};
