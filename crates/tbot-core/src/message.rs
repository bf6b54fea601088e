//! Outbound message model.
//!
//! [`OutboundMessage`] is the fully-specified message object a handler or the
//! server hands to [`Transport::send`](crate::Transport::send). Only the
//! message kinds the dispatcher itself needs are modelled; anything more
//! exotic goes through `send_raw`.

use serde::{Deserialize, Serialize};

use crate::event::ChatId;

/// The content of an outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum MessageKind {
    /// Plain text.
    Text(String),
    /// Text to be rendered as Markdown by the client.
    Markdown(String),
    /// A photo, by transport file id or URL.
    Photo {
        file: String,
        #[serde(default)]
        caption: Option<String>,
    },
    /// A document, by transport file id or URL.
    Document {
        file: String,
        #[serde(default)]
        caption: Option<String>,
    },
}

/// A message to be delivered to a chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Destination chat.
    pub chat_id: ChatId,
    /// Content.
    pub kind: MessageKind,
    /// Message id to reply to, if any.
    #[serde(default)]
    pub reply_to: Option<i64>,
}

impl OutboundMessage {
    /// Creates a plain-text message.
    pub fn text(chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            kind: MessageKind::Text(text.into()),
            reply_to: None,
        }
    }

    /// Creates a Markdown message.
    pub fn markdown(chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            kind: MessageKind::Markdown(text.into()),
            reply_to: None,
        }
    }

    /// Makes this message a reply to `message_id`.
    pub fn reply_to(mut self, message_id: i64) -> Self {
        self.reply_to = Some(message_id);
        self
    }

    /// Returns the textual part of the message, if any.
    pub fn as_text(&self) -> Option<&str> {
        match &self.kind {
            MessageKind::Text(text) | MessageKind::Markdown(text) => Some(text),
            MessageKind::Photo { caption, .. } | MessageKind::Document { caption, .. } => {
                caption.as_deref()
            }
        }
    }
}
