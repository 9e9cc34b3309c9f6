//! Conversation manager for the site's AI assistant.
//!
//! Owns the ordered message history, the bounded reference-article context,
//! and the lifetime of the single outstanding completion request. Completion
//! failures never escape this module: they settle into the pending assistant
//! message's error state and an advisory toast.

use arcanum_core::api::ChatApi;
use arcanum_core::blog::Article;
use arcanum_core::chat::{
    ChatCompletionMessage, ChatCompletionRequest, ChatContextArticle, ChatMessage, ChatRole,
    ChatToast, ToastKind,
};
use arcanum_core::error::ArcanumError;
use arcanum_core::events::EventHub;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Trailing user/assistant turns replayed to the model.
const MAX_HISTORY_MESSAGES: usize = 10;
/// Upper bound on pinned reference articles (FIFO eviction).
pub const MAX_CONTEXT_ARTICLES: usize = 2;
/// Hard deadline for one completion request.
const REQUEST_TIMEOUT: Duration = Duration::from_millis(15_000);
/// How long an advisory toast stays up before auto-dismissing.
const TOAST_DURATION: Duration = Duration::from_millis(3_500);

const BASE_SYSTEM_PROMPT: &str = "你是简栈的 AI 小助手，擅长总结文章、提炼重点，并以简明的中文回答访客的问题。保持口吻友好但克制，如有不确定或缺失的上下文请主动说明。";

const CONTEXT_PREAMBLE: &str =
    "以下是访客主动提供的参考资料，请在回答中优先引用，如需引用请在段末使用（引用：文章标题）：";

/// Observable conversation state.
#[derive(Debug, Clone)]
pub struct ChatState {
    pub conversation_id: String,
    pub messages: Vec<ChatMessage>,
    pub context_articles: Vec<ChatContextArticle>,
    pub toast: Option<ChatToast>,
    pub is_sending: bool,
    pub last_error: Option<String>,
}

impl ChatState {
    fn new() -> Self {
        Self {
            conversation_id: create_id("c"),
            messages: Vec::new(),
            context_articles: Vec::new(),
            toast: None,
            is_sending: false,
            last_error: None,
        }
    }

    pub fn has_messages(&self) -> bool {
        !self.messages.is_empty()
    }
}

/// The conversation manager.
pub struct ChatStore {
    api: Arc<dyn ChatApi>,
    hub: Arc<EventHub>,
    state: Arc<watch::Sender<ChatState>>,
    /// Reservation flag for the single outstanding request.
    sending: AtomicBool,
    cancel: Mutex<Option<CancellationToken>>,
}

impl ChatStore {
    pub fn new(api: Arc<dyn ChatApi>, hub: Arc<EventHub>) -> Self {
        let (state, _) = watch::channel(ChatState::new());
        Self {
            api,
            hub,
            state: Arc::new(state),
            sending: AtomicBool::new(false),
            cancel: Mutex::new(None),
        }
    }

    /// Subscribes to conversation-state changes.
    pub fn subscribe(&self) -> watch::Receiver<ChatState> {
        self.state.subscribe()
    }

    /// A snapshot of the current conversation state.
    pub fn state(&self) -> ChatState {
        self.state.borrow().clone()
    }

    /// Sends a user message and awaits the assistant's reply.
    ///
    /// Returns `false` without touching the conversation when the text is
    /// blank or a request is already pending. Otherwise the user message and
    /// a pending assistant placeholder are appended immediately, and the
    /// placeholder settles in place when the request completes; failures are
    /// absorbed into its error state rather than raised.
    pub async fn send_user_message(&self, text: &str) -> bool {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return false;
        }

        if self.sending.swap(true, Ordering::SeqCst) {
            self.show_toast(ToastKind::Info, "上一条回答生成中，请稍候再试");
            return false;
        }

        let now = chrono::Utc::now().timestamp_millis();
        let assistant_id = create_id("assistant");
        let with_context;

        {
            let user_message = ChatMessage {
                id: create_id("user"),
                role: ChatRole::User,
                content: trimmed.to_string(),
                created_at: now,
                pending: false,
                error: false,
            };
            let placeholder = ChatMessage {
                id: assistant_id.clone(),
                role: ChatRole::Assistant,
                content: String::new(),
                created_at: now,
                pending: true,
                error: false,
            };

            let mut has_context = false;
            self.state.send_modify(|state| {
                state.messages.push(user_message);
                state.messages.push(placeholder);
                state.is_sending = true;
                state.last_error = None;
                has_context = !state.context_articles.is_empty();
            });
            with_context = has_context;
        }

        let mut payload = Map::new();
        payload.insert("withContext".to_string(), Value::Bool(with_context));
        self.hub.track("ai_chat_send", Some(payload));

        let request = {
            let state = self.state.borrow();
            ChatCompletionRequest {
                conversation_id: state.conversation_id.clone(),
                model: None,
                stream: None,
                messages: build_request_messages(&state),
            }
        };

        let token = CancellationToken::new();
        *self.cancel.lock().unwrap() = Some(token.clone());

        let outcome = tokio::select! {
            result = self.api.create_completion(&request) => result,
            _ = tokio::time::sleep(REQUEST_TIMEOUT) => Err(ArcanumError::Timeout),
            _ = token.cancelled() => Err(ArcanumError::Aborted),
        };

        self.cancel.lock().unwrap().take();
        self.sending.store(false, Ordering::SeqCst);

        let succeeded = match outcome {
            Ok(result) => {
                let reply = result.content;
                let empty = reply.is_empty();
                self.settle_assistant(
                    &assistant_id,
                    if empty {
                        "（未收到内容，请稍后再试）".to_string()
                    } else {
                        reply
                    },
                    empty,
                );
                true
            }
            Err(err) if err.is_cancellation() => {
                self.settle_assistant(&assistant_id, "请求已超时，稍后再试。".to_string(), true);
                self.show_toast(ToastKind::Error, "AI 请求超时，已为你取消");
                self.track_error(&err);
                false
            }
            Err(err) => {
                let display = match &err {
                    ArcanumError::Network(_) => "网络异常，请稍后再试。",
                    _ => "AI 暂时不可用，请稍后再试。",
                };
                self.settle_assistant(&assistant_id, display.to_string(), true);
                self.show_toast(ToastKind::Error, err.user_message());
                self.state
                    .send_modify(|state| state.last_error = Some(err.user_message()));
                self.track_error(&err);
                false
            }
        };

        self.state.send_modify(|state| state.is_sending = false);
        succeeded
    }

    /// Pins an article as reference context.
    ///
    /// Upserts by id (a duplicate moves to the most-recent slot without
    /// growing the list) and evicts the oldest entry past the bound. An
    /// article without an id is ignored.
    pub fn add_article_to_context(&self, article: &Article) {
        if article.article_id == 0 {
            return;
        }

        let entry =
            ChatContextArticle::from_article(article, chrono::Utc::now().timestamp_millis());
        let title = entry.title.clone();

        self.state.send_modify(|state| {
            state
                .context_articles
                .retain(|ctx| ctx.article_id != entry.article_id);
            state.context_articles.push(entry);

            let overflow = state.context_articles.len().saturating_sub(MAX_CONTEXT_ARTICLES);
            if overflow > 0 {
                state.context_articles.drain(0..overflow);
            }
        });

        self.show_toast(ToastKind::Success, format!("已将《{title}》加入参考资料"));
    }

    /// Unpins a reference article by id.
    pub fn remove_context_article(&self, article_id: i64) {
        self.state.send_modify(|state| {
            state
                .context_articles
                .retain(|ctx| ctx.article_id != article_id);
        });
    }

    /// Clears the history and starts a fresh conversation id. Reference
    /// context is dropped unless explicitly retained.
    pub fn reset_conversation(&self, keep_context: bool) {
        self.state.send_modify(|state| {
            state.messages.clear();
            state.last_error = None;
            state.conversation_id = create_id("c");
            if !keep_context {
                state.context_articles.clear();
            }
        });
    }

    /// Aborts the in-flight completion, if any. Idempotent.
    pub fn cancel_ongoing_request(&self) {
        if let Some(token) = self.cancel.lock().unwrap().take() {
            token.cancel();
        }
    }

    /// Dismisses the current toast immediately.
    pub fn dismiss_toast(&self) {
        self.state.send_modify(|state| state.toast = None);
    }

    fn settle_assistant(&self, id: &str, content: String, error: bool) {
        self.state.send_modify(|state| {
            if let Some(message) = state.messages.iter_mut().find(|m| m.id == id) {
                message.content = content;
                message.pending = false;
                message.error = error;
            }
        });
    }

    fn show_toast(&self, kind: ToastKind, message: impl Into<String>) {
        let toast = ChatToast {
            id: create_id("toast"),
            kind,
            message: message.into(),
        };
        let toast_id = toast.id.clone();

        self.state.send_modify(|state| state.toast = Some(toast));

        // Auto-dismiss, unless a newer toast replaced this one meanwhile.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let state = self.state.clone();
            handle.spawn(async move {
                tokio::time::sleep(TOAST_DURATION).await;
                state.send_modify(|s| {
                    if s.toast.as_ref().is_some_and(|t| t.id == toast_id) {
                        s.toast = None;
                    }
                });
            });
        }
    }

    fn track_error(&self, err: &ArcanumError) {
        let mut payload = Map::new();
        payload.insert(
            "code".to_string(),
            Value::String(error_code(err).to_string()),
        );
        self.hub.track("ai_chat_error", Some(payload));
    }
}

/// System prompt, optional reference-context block, and the trailing
/// non-pending, non-error user/assistant turns.
fn build_request_messages(state: &ChatState) -> Vec<ChatCompletionMessage> {
    let mut request = vec![ChatCompletionMessage {
        role: ChatRole::System,
        content: BASE_SYSTEM_PROMPT.to_string(),
    }];

    if !state.context_articles.is_empty() {
        let block = state
            .context_articles
            .iter()
            .enumerate()
            .map(|(index, ctx)| {
                let summary = if ctx.summary.is_empty() {
                    "暂无摘要"
                } else {
                    &ctx.summary
                };
                format!("{}. 《{}》 · {}\n摘要：{}", index + 1, ctx.title, ctx.source, summary)
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        request.push(ChatCompletionMessage {
            role: ChatRole::System,
            content: format!("{CONTEXT_PREAMBLE}\n{block}"),
        });
    }

    let history: Vec<&ChatMessage> = state
        .messages
        .iter()
        .filter(|msg| {
            matches!(msg.role, ChatRole::User | ChatRole::Assistant)
                && !msg.pending
                && !msg.error
                && !msg.content.trim().is_empty()
        })
        .collect();
    let start = history.len().saturating_sub(MAX_HISTORY_MESSAGES);

    for msg in &history[start..] {
        request.push(ChatCompletionMessage {
            role: msg.role,
            content: msg.content.clone(),
        });
    }

    request
}

fn create_id(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4())
}

fn error_code(err: &ArcanumError) -> &'static str {
    match err {
        ArcanumError::Validation(_) => "validation",
        ArcanumError::Auth(_) => "auth",
        ArcanumError::Upstream { .. } => "upstream",
        ArcanumError::Timeout => "timeout",
        ArcanumError::Aborted => "aborted",
        ArcanumError::Network(_) => "network",
        ArcanumError::Serialization(_) => "serialization",
        ArcanumError::Internal(_) => "internal",
    }
}
