//! Chat assistant domain module.
//!
//! # Module Structure
//!
//! - `message`: conversation message and reference-context types
//! - `completion`: chat-completion request/response wire types and content
//!   extraction

mod completion;
mod message;

pub use completion::{
    ChatCompletionMessage, ChatCompletionRequest, ChatCompletionResponse, ChatCompletionResult,
};
pub use message::{
    ChatContextArticle, ChatMessage, ChatRole, ChatToast, ToastKind, normalize_summary,
};
