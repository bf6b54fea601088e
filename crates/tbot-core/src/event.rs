//! Inbound event model.
//!
//! An [`Update`] is the immutable envelope a transport hands to the
//! dispatcher. It carries the chat it came from, a [`Payload`] (either
//! command text or an uploaded file), and whatever transport-native data the
//! adapter wants to pass through untouched in [`Update::metadata`].
//!
//! # Command paths
//!
//! The router only looks at the first whitespace-delimited token of a text
//! payload, see [`Update::command`]. Everything after it is exposed as
//! [`Update::args`].
//!
//! ```rust
//! use tbot_core::Update;
//!
//! let update = Update::text(42, "/echo hello world");
//! assert_eq!(update.command(), Some("/echo"));
//! assert_eq!(update.args(), "hello world");
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier of a chat on the remote platform.
pub type ChatId = i64;

/// A file uploaded by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileUpload {
    /// Transport-side file identifier, used to download the content.
    pub file_id: String,
    /// Original file name, if the client sent one.
    #[serde(default)]
    pub file_name: Option<String>,
    /// MIME type reported by the client.
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Size in bytes.
    #[serde(default)]
    pub size: Option<u64>,
    /// Caption typed alongside the upload. Never used for routing.
    #[serde(default)]
    pub caption: Option<String>,
}

impl FileUpload {
    /// Creates an upload with only a file id.
    pub fn new(file_id: impl Into<String>) -> Self {
        Self {
            file_id: file_id.into(),
            file_name: None,
            mime_type: None,
            size: None,
            caption: None,
        }
    }

    /// Sets the file name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    /// Sets the caption.
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }
}

/// What the user sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Payload {
    /// Raw message text, possibly a command.
    Text(String),
    /// A file upload.
    File(FileUpload),
}

/// An inbound chat event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Update {
    /// The chat this update belongs to.
    pub chat_id: ChatId,
    /// Transport message id, used for threaded replies.
    #[serde(default)]
    pub message_id: Option<i64>,
    /// Text or file content.
    pub payload: Payload,
    /// Transport-native data, passed through untouched.
    #[serde(default)]
    pub metadata: Value,
}

impl Update {
    /// Creates a text update.
    pub fn text(chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            message_id: None,
            payload: Payload::Text(text.into()),
            metadata: Value::Null,
        }
    }

    /// Creates a file-upload update.
    pub fn file(chat_id: ChatId, file: FileUpload) -> Self {
        Self {
            chat_id,
            message_id: None,
            payload: Payload::File(file),
            metadata: Value::Null,
        }
    }

    /// Attaches a transport message id.
    pub fn with_message_id(mut self, message_id: i64) -> Self {
        self.message_id = Some(message_id);
        self
    }

    /// Attaches transport-native metadata.
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Returns `true` if this update is a file upload.
    pub fn is_file(&self) -> bool {
        matches!(self.payload, Payload::File(_))
    }

    /// Returns the raw text, or `None` for file uploads.
    pub fn text_content(&self) -> Option<&str> {
        match &self.payload {
            Payload::Text(text) => Some(text),
            Payload::File(_) => None,
        }
    }

    /// Returns the uploaded file, or `None` for text updates.
    pub fn file_upload(&self) -> Option<&FileUpload> {
        match &self.payload {
            Payload::File(file) => Some(file),
            Payload::Text(_) => None,
        }
    }

    /// Returns the leading token of the text, or `None` for file uploads.
    ///
    /// Blank text yields `Some("")`, which never matches a route.
    pub fn command(&self) -> Option<&str> {
        self.text_content()
            .map(|text| split_command(text).0)
    }

    /// Returns the text following the command token, trimmed.
    ///
    /// File uploads return their caption, or an empty string.
    pub fn args(&self) -> &str {
        match &self.payload {
            Payload::Text(text) => split_command(text).1,
            Payload::File(file) => file.caption.as_deref().unwrap_or("").trim(),
        }
    }
}

/// Splits text into its command token and the trimmed remainder.
pub fn split_command(text: &str) -> (&str, &str) {
    let text = text.trim();
    match text.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (text, ""),
    }
}

/// Strips a `@username` suffix from a command token if it addresses this bot.
///
/// Any other suffix is kept, so `/start@other_bot` will not match `/start`.
pub fn strip_mention<'a>(command: &'a str, username: &str) -> &'a str {
    match command.rsplit_once('@') {
        Some((head, mention)) if !head.is_empty() && mention == username => head,
        _ => command,
    }
}
