//! Application layer: caches, observable views, session and conversation
//! stores.
//!
//! Everything here is transport-agnostic: components depend on the API
//! traits from `arcanum-core` and are handed `Arc<dyn …>` implementations
//! (the reqwest-backed ones from `arcanum-client`, or in-memory doubles in
//! tests).

pub mod blog;
pub mod cache;
pub mod chat;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use blog::{
    ArticleDetailView, ArticleListView, BlogCache, CategoriesView, CommentsView, SiteInfoView,
    TagsView,
};
pub use cache::{FetchMode, KeyedCache, ResourceState, StateCell};
pub use chat::{ChatState, ChatStore, MAX_CONTEXT_ARTICLES};
pub use session::{SessionSnapshot, SessionStatus, SessionStore};
