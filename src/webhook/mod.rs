//! Webhook integration: the only place the wizard talks to the network
//! after its documents are loaded.

pub mod chat;
pub mod client;
pub mod payload;
pub mod response;

pub use chat::{ChatMessage, ChatRole, ChatSession, SendOutcome};
pub use client::{WebhookClient, validate_required_responses};
pub use payload::{ChatPayload, WebhookPayload};
pub use response::{
    ResultContent, WebhookReply, WebhookResult, parse_webhook_response,
};
