//! Chat-completion wire types.

use super::message::ChatRole;
use serde::{Deserialize, Serialize};

/// One message in a completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionMessage {
    pub role: ChatRole,
    pub content: String,
}

/// Request body for the completion endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatCompletionRequest {
    pub conversation_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    pub messages: Vec<ChatCompletionMessage>,
}

/// Completion response in any of the shapes the endpoint may produce.
///
/// Content is accepted from `content`, `data.content`, or
/// `choices[0].message.content`, in that priority order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub data: Option<ResponseData>,
    #[serde(default)]
    pub choices: Option<Vec<Choice>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseData {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub message: Option<ChoiceMessage>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    /// Extracts the assistant text, or an empty string when no location
    /// yields non-blank content.
    pub fn extract_content(&self) -> String {
        if let Some(content) = self.content.as_ref().filter(|c| !c.trim().is_empty()) {
            return content.clone();
        }

        let nested = self
            .data
            .as_ref()
            .and_then(|d| d.content.as_ref())
            .filter(|c| !c.trim().is_empty());
        if let Some(content) = nested {
            return content.clone();
        }

        self.choices
            .as_ref()
            .and_then(|choices| choices.first())
            .and_then(|choice| choice.message.as_ref())
            .and_then(|message| message.content.clone())
            .unwrap_or_default()
    }
}

/// Result of a completion call: the extracted text plus the raw response
/// when one could be parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatCompletionResult {
    pub content: String,
    pub raw: Option<ChatCompletionResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_prefers_top_level_content() {
        let response: ChatCompletionResponse = serde_json::from_str(
            r#"{"content":"顶层","data":{"content":"嵌套"},"choices":[{"message":{"content":"choice"}}]}"#,
        )
        .unwrap();
        assert_eq!(response.extract_content(), "顶层");
    }

    #[test]
    fn test_extract_falls_through_blank_content() {
        let response: ChatCompletionResponse =
            serde_json::from_str(r#"{"content":"  ","data":{"content":"嵌套"}}"#).unwrap();
        assert_eq!(response.extract_content(), "嵌套");
    }

    #[test]
    fn test_extract_reads_first_choice() {
        let response: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":"回答"}}]}"#).unwrap();
        assert_eq!(response.extract_content(), "回答");
    }

    #[test]
    fn test_extract_empty_when_nothing_set() {
        let response = ChatCompletionResponse::default();
        assert_eq!(response.extract_content(), "");
    }
}
