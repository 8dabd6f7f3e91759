//! Chat session controller
//!
//! One `ChatSession` per login. It owns the transcript, the single archive
//! slot used by new-chat / clear-history / resume, the deep-search flag and the
//! last extracted recommendation table. Callers that share a session across
//! tasks must serialise access (the server wraps each one in a mutex), so the
//! transcript stays strictly append-only within a turn.

use std::sync::Arc;
use std::time::Duration;

use crate::config::ModelConfig;
use crate::llm::{ChatBackend, CompletionError};
use crate::models::{ChatMessage, Message, RecommendationTable, Role};
use crate::parser::parse_reply;
use crate::prompts;

/// Cosmetic delays applied before each remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub normal_latency: Duration,
    pub deep_search_latency: Duration,
}

impl SessionSettings {
    pub fn from_model_config(model: &ModelConfig) -> Self {
        Self {
            normal_latency: Duration::from_millis(model.normal_latency_ms),
            deep_search_latency: Duration::from_millis(model.deep_search_latency_ms),
        }
    }

    /// No simulated latency.
    pub fn immediate() -> Self {
        Self {
            normal_latency: Duration::ZERO,
            deep_search_latency: Duration::ZERO,
        }
    }
}

/// Result of one `submit`. Every variant carries the assistant message that
/// was appended to the transcript.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    Replied(Message),
    NetworkError { reply: Message, notice: String },
    Failed { reply: Message, notice: String },
}

impl TurnOutcome {
    pub fn reply(&self) -> &Message {
        match self {
            TurnOutcome::Replied(reply)
            | TurnOutcome::NetworkError { reply, .. }
            | TurnOutcome::Failed { reply, .. } => reply,
        }
    }

    pub fn notice(&self) -> Option<&str> {
        match self {
            TurnOutcome::Replied(_) => None,
            TurnOutcome::NetworkError { notice, .. } | TurnOutcome::Failed { notice, .. } => {
                Some(notice)
            }
        }
    }
}

pub struct ChatSession {
    username: String,
    messages: Vec<Message>,
    archived: Option<Vec<Message>>,
    deep_search: bool,
    last_table: Option<RecommendationTable>,
    backend: Arc<dyn ChatBackend>,
    settings: SessionSettings,
}

impl ChatSession {
    pub fn new(
        username: impl Into<String>,
        backend: Arc<dyn ChatBackend>,
        settings: SessionSettings,
    ) -> Self {
        let username = username.into();
        let greeting = prompts::welcome_greeting(&username);
        Self {
            username,
            messages: vec![Message::assistant(greeting)],
            archived: None,
            deep_search: false,
            last_table: None,
            backend,
            settings,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn deep_search(&self) -> bool {
        self.deep_search
    }

    pub fn can_resume(&self) -> bool {
        self.archived.is_some()
    }

    pub fn last_table(&self) -> Option<&RecommendationTable> {
        self.last_table.as_ref()
    }

    pub fn set_deep_search(&mut self, enabled: bool) {
        self.deep_search = enabled;
    }

    /// System persona followed by every transcript message (role and content
    /// only). With deep search on, the latest user content gets the elaboration
    /// suffix; the stored transcript is left as typed.
    pub fn payload(&self) -> Vec<ChatMessage> {
        let mut payload = Vec::with_capacity(self.messages.len() + 1);
        payload.push(ChatMessage::system(prompts::SYSTEM_PROMPT));
        payload.extend(self.messages.iter().map(Message::to_chat_message));

        if self.deep_search {
            if let Some(last_user) = payload.iter_mut().rev().find(|m| m.role == Role::User) {
                last_user.content.push_str(prompts::DEEP_SEARCH_SUFFIX);
            }
        }

        payload
    }

    /// Run one turn. Failures are folded into the transcript and the returned
    /// outcome; nothing is propagated to the caller.
    pub async fn submit(&mut self, prompt: &str) -> TurnOutcome {
        self.messages.push(Message::user(prompt));
        let payload = self.payload();

        let latency = if self.deep_search {
            self.settings.deep_search_latency
        } else {
            self.settings.normal_latency
        };
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        tracing::info!(
            username = %self.username,
            backend = self.backend.name(),
            messages = payload.len(),
            deep_search = self.deep_search,
            "Submitting chat turn"
        );

        match self.backend.complete(&payload).await {
            Ok(raw) => {
                let parsed = parse_reply(&raw);
                self.last_table = (!parsed.table.is_empty()).then(|| parsed.table.clone());
                let reply = Message::assistant_with_table(parsed.text, parsed.table);
                self.messages.push(reply.clone());
                TurnOutcome::Replied(reply)
            }
            Err(e) => self.record_failure(e),
        }
    }

    fn record_failure(&mut self, error: CompletionError) -> TurnOutcome {
        if error.is_transport() {
            tracing::warn!(username = %self.username, error = %error, "Chat turn failed: transport");
            let reply = Message::assistant(prompts::TRANSPORT_APOLOGY);
            self.messages.push(reply.clone());
            TurnOutcome::NetworkError {
                reply,
                notice: prompts::TRANSPORT_NOTICE.to_string(),
            }
        } else {
            tracing::error!(username = %self.username, error = %error, "Chat turn failed");
            let reply = Message::assistant(prompts::GENERIC_APOLOGY);
            self.messages.push(reply.clone());
            TurnOutcome::Failed {
                reply,
                notice: prompts::error_notice(&error.to_string()),
            }
        }
    }

    pub fn new_chat(&mut self) {
        let greeting = prompts::new_chat_greeting(&self.username);
        self.restart_with(greeting);
    }

    pub fn clear_history(&mut self) {
        self.restart_with(prompts::CLEARED_GREETING.to_string());
    }

    /// Restore the archived transcript. Returns false (and changes nothing) when
    /// the archive slot is empty.
    pub fn resume_chat(&mut self) -> bool {
        match self.archived.take() {
            Some(archived) => {
                self.messages = archived;
                true
            }
            None => false,
        }
    }

    /// Replace the whole session with the logged-out transcript. The archive
    /// slot, table and deep-search flag do not survive.
    pub fn logout(&mut self) -> Message {
        tracing::info!(username = %self.username, "User logged out");
        let farewell = Message::assistant(prompts::LOGGED_OUT_MESSAGE);
        self.messages = vec![farewell.clone()];
        self.archived = None;
        self.last_table = None;
        self.deep_search = false;
        farewell
    }

    fn restart_with(&mut self, greeting: String) {
        let previous = std::mem::replace(&mut self.messages, vec![Message::assistant(greeting)]);
        self.archived = Some(previous);
        self.last_table = None;
    }
}
