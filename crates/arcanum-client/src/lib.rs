//! HTTP infrastructure for the Arcanum blog client.
//!
//! This crate provides the reqwest-backed implementations of the API traits
//! declared in `arcanum-core`: the token store, the gateway pipeline
//! (credential injection, envelope unwrap, unauthorized side effects), and
//! the per-resource fetchers.

pub mod auth_api;
pub mod blog_api;
pub mod chat_api;
pub mod config;
pub mod gateway;
pub mod token;

pub use auth_api::HttpAuthApi;
pub use blog_api::HttpBlogApi;
pub use chat_api::HttpChatApi;
pub use config::ClientConfig;
pub use gateway::{ApiGateway, RequestOptions, login_redirect_target};
pub use token::{KeyValueStorage, MemoryStorage, TokenStore};
