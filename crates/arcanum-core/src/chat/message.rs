//! Conversation message and reference-context types.

use crate::blog::Article;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Longest summary carried into the assistant's reference context.
const MAX_SUMMARY_CHARS: usize = 360;

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// The role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// A single message in the conversation history.
///
/// Messages are append-only. The one exception is the pending assistant
/// placeholder, whose `content`, `pending` and `error` fields settle in place
/// when its request completes; it is the same logical turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub role: ChatRole,
    pub content: String,
    /// Creation time in epoch milliseconds.
    pub created_at: i64,
    #[serde(default)]
    pub pending: bool,
    #[serde(default)]
    pub error: bool,
}

/// A reference article pinned to the conversation context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatContextArticle {
    pub article_id: i64,
    pub title: String,
    pub summary: String,
    pub source: String,
    /// Time the article was added, in epoch milliseconds.
    pub added_at: i64,
}

impl ChatContextArticle {
    /// Normalizes an article into context form: title defaulted, summary
    /// stripped and truncated, source taken from the category name.
    pub fn from_article(article: &Article, added_at: i64) -> Self {
        let raw_summary = article
            .summary
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(article.content.as_deref())
            .unwrap_or("");

        Self {
            article_id: article.article_id,
            title: if article.title.is_empty() {
                "未命名文章".to_string()
            } else {
                article.title.clone()
            },
            summary: normalize_summary(raw_summary),
            source: article
                .category_name
                .clone()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "简栈".to_string()),
            added_at,
        }
    }
}

/// Kind of an advisory toast raised by the conversation manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

/// An advisory toast shown next to the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatToast {
    pub id: String,
    pub kind: ToastKind,
    pub message: String,
}

/// Strips HTML tags, collapses whitespace and truncates to the context
/// summary limit (counting characters, not bytes).
pub fn normalize_summary(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }

    let stripped = HTML_TAG.replace_all(input, "");
    let collapsed = WHITESPACE.replace_all(&stripped, " ");
    let text = collapsed.trim();

    if text.chars().count() <= MAX_SUMMARY_CHARS {
        return text.to_string();
    }

    let mut truncated: String = text.chars().take(MAX_SUMMARY_CHARS).collect();
    truncated.push('…');
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_summary_strips_html_and_whitespace() {
        let input = "<p>第一段</p>\n\n  <b>第二段</b>  ";
        assert_eq!(normalize_summary(input), "第一段 第二段");
    }

    #[test]
    fn test_normalize_summary_truncates_on_char_boundary() {
        let input = "汉".repeat(400);
        let normalized = normalize_summary(&input);
        assert_eq!(normalized.chars().count(), MAX_SUMMARY_CHARS + 1);
        assert!(normalized.ends_with('…'));
    }

    #[test]
    fn test_context_article_defaults() {
        let article = Article {
            article_id: 7,
            user_id: None,
            title: String::new(),
            summary: None,
            content: Some("<p>正文内容</p>".to_string()),
            category_id: None,
            category_name: None,
            cover_image_url: None,
            status: None,
            allow_comment: None,
            view_count: None,
            tag_ids: None,
            create_time: None,
            update_time: None,
        };

        let ctx = ChatContextArticle::from_article(&article, 1);
        assert_eq!(ctx.title, "未命名文章");
        assert_eq!(ctx.summary, "正文内容");
        assert_eq!(ctx.source, "简栈");
    }
}
