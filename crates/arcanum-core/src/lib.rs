//! Core domain layer for the Arcanum blog client.
//!
//! This crate holds the domain models, the shared error type, the canonical
//! response envelope, the backend API traits, and the process-wide event
//! hub. It performs no I/O; the reqwest-backed implementations live in
//! `arcanum-client` and the caching/session/conversation stores in
//! `arcanum-app`.

pub mod api;
pub mod auth;
pub mod blog;
pub mod chat;
pub mod envelope;
pub mod error;
pub mod events;

// Re-export common error type
pub use error::{ArcanumError, Result};
