//! Usage-limited chat session embedded in a wizard step.
//!
//! Counters are seeded from step configuration and then replaced by whatever
//! the server reports after each call; nothing is computed locally and
//! nothing survives the session.

use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::InteractionError;
use crate::schema::{ChatConfig, UsageType};

use super::client::WebhookClient;
use super::payload::ChatPayload;
use super::response::WebhookReply;

pub const NO_CREDITS_NOTICE: &str = "No credits remaining. Please purchase more to continue.";
pub const NO_ATTEMPTS_NOTICE: &str = "No attempts remaining for this session.";
pub const CHAT_ERROR_NOTICE: &str = "Sorry, there was an error processing your message.";

/// Credits at or below this are shown as low.
pub const LOW_TOKENS: i64 = 5;
/// Attempts at or below this are shown as low.
pub const LOW_ATTEMPTS: i64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One line of the chat transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Reply shape of the chat proxy.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub tokens_left: Option<i64>,
    #[serde(default)]
    pub attempts_left: Option<i64>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ChatReply {
    pub fn text(&self) -> Option<&str> {
        self.response.as_deref().or(self.output.as_deref())
    }
}

/// What happened to one `send` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank message; nothing happened.
    Ignored,
    /// The usage counter was exhausted; no call was made.
    Blocked,
    Replied,
    Failed,
}

/// In-memory state of one chat step.
#[derive(Debug, Clone)]
pub struct ChatSession {
    config: ChatConfig,
    user_id: String,
    tokens_left: i64,
    attempts_left: i64,
    transcript: Vec<ChatMessage>,
    last_error: Option<InteractionError>,
}

impl ChatSession {
    pub fn new(config: ChatConfig) -> Self {
        let transcript = vec![ChatMessage::system(config.welcome_message.clone())];
        Self {
            user_id: session_user_id(),
            tokens_left: config.initial_tokens,
            attempts_left: config.initial_attempts,
            transcript,
            last_error: None,
            config,
        }
    }

    pub fn usage_type(&self) -> UsageType {
        self.config.usage_type
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn tokens_left(&self) -> i64 {
        self.tokens_left
    }

    pub fn attempts_left(&self) -> i64 {
        self.attempts_left
    }

    /// Configured starting attempts, shown as the denominator of the badge.
    pub fn max_attempts(&self) -> i64 {
        self.config.initial_attempts
    }

    pub fn placeholder(&self) -> &str {
        self.config
            .placeholder
            .as_deref()
            .unwrap_or("Type your message...")
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn last_error(&self) -> Option<&InteractionError> {
        self.last_error.as_ref()
    }

    /// The notice to show instead of calling out, if the usage counter is spent.
    fn exhausted_notice(&self) -> Option<&'static str> {
        match self.config.usage_type {
            UsageType::Token if self.tokens_left <= 0 => Some(NO_CREDITS_NOTICE),
            UsageType::Attempt if self.attempts_left <= 0 => Some(NO_ATTEMPTS_NOTICE),
            _ => None,
        }
    }

    /// Send one user message through `client`.
    pub async fn send(&mut self, client: &WebhookClient, message: &str) -> SendOutcome {
        let message = message.trim();
        if message.is_empty() {
            return SendOutcome::Ignored;
        }

        if let Some(notice) = self.exhausted_notice() {
            info!(user = %self.user_id, usage = %self.config.usage_type, "Chat blocked by usage limit");
            self.transcript.push(ChatMessage::system(notice));
            return SendOutcome::Blocked;
        }

        self.transcript.push(ChatMessage::user(message));
        self.last_error = None;

        match self.exchange(client, message).await {
            Ok(reply) => {
                self.apply_counters(&reply);
                let text = reply.text().unwrap_or_default().to_string();
                self.transcript.push(ChatMessage::assistant(text));
                SendOutcome::Replied
            }
            Err(err) => {
                err.log(&serde_json::json!({
                    "userId": self.user_id,
                    "usageType": self.config.usage_type,
                }));
                self.transcript.push(ChatMessage::system(CHAT_ERROR_NOTICE));
                self.last_error = Some(err);
                SendOutcome::Failed
            }
        }
    }

    async fn exchange(
        &self,
        client: &WebhookClient,
        message: &str,
    ) -> Result<ChatReply, InteractionError> {
        let url = client
            .resolve_url(self.config.webhook_url.as_deref())
            .ok_or_else(|| InteractionError::config(&["webhookUrl"]))?;

        let payload = ChatPayload {
            message,
            user_id: &self.user_id,
            usage_type: self.config.usage_type,
        };

        let value = match client.post(url, &payload).await? {
            WebhookReply::Json(value) => value,
            WebhookReply::NotJson(_) => {
                return Err(InteractionError::response("Invalid response format from server"));
            }
        };

        let reply: ChatReply = serde_json::from_value(value).map_err(|e| {
            InteractionError::response("Invalid response format from server")
                .with_details(serde_json::json!({ "parseError": e.to_string() }))
        })?;

        if let Some(error) = reply.error.as_deref().filter(|e| !e.trim().is_empty()) {
            return Err(InteractionError::server_reported(Some(error), None));
        }

        Ok(reply)
    }

    /// Trust the server's remaining counts for the configured usage type.
    fn apply_counters(&mut self, reply: &ChatReply) {
        match self.config.usage_type {
            UsageType::Token => {
                if let Some(tokens) = reply.tokens_left {
                    self.tokens_left = tokens;
                }
            }
            UsageType::Attempt => {
                if let Some(attempts) = reply.attempts_left {
                    self.attempts_left = attempts;
                }
            }
            UsageType::Unlimited => {}
        }
        if self.exhausted_notice().is_some() {
            warn!(user = %self.user_id, "Chat usage exhausted");
        }
    }
}

/// Random, session-scoped user id. Not a durable identity.
fn session_user_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!("kit-user-{suffix}")
}
