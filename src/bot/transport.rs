// Chat transport abstraction
//
// The dispatcher only talks to the chat through this trait; the Telegram
// implementation lives in `telegram.rs`.

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Inbound update, already stripped of transport specifics
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// Plain text message
    Message { chat_id: i64, text: String },
    /// Button press carrying the button's payload
    Interaction {
        chat_id: i64,
        message_id: i32,
        data: String,
    },
}

impl InboundEvent {
    pub fn chat_id(&self) -> i64 {
        match self {
            Self::Message { chat_id, .. } | Self::Interaction { chat_id, .. } => *chat_id,
        }
    }
}

/// One button of a choice list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub label: String,
    /// Opaque payload returned in the matching `Interaction`
    pub id: String,
}

/// Media upload
#[derive(Debug, Clone, Copy)]
pub struct MediaUpload<'a> {
    pub path: &'a Path,
    pub file_name: &'a str,
    pub caption: &'a str,
}

#[derive(Debug, Error)]
#[error("transport error: {0}")]
pub struct TransportError(pub String);

/// Outbound half of the chat transport. Implementations must be safe to
/// call from many requests at once.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), TransportError>;

    async fn send_media(&self, chat_id: i64, media: MediaUpload<'_>) -> Result<(), TransportError>;

    async fn send_choices(
        &self,
        chat_id: i64,
        text: &str,
        choices: &[Choice],
    ) -> Result<(), TransportError>;

    async fn remove_message(&self, chat_id: i64, message_id: i32) -> Result<(), TransportError>;
}
