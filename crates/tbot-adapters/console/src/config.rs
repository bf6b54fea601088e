//! Configuration for the console transport.
//!
//! ```toml
//! chat_id = 1
//! file_prefix = "!file"
//! buffer = 32
//! ```

use serde::{Deserialize, Serialize};
use tbot_core::ChatId;

/// Console transport configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Chat that input lines are attributed to, unless a line starts with
    /// `#<chat_id>`.
    #[serde(default = "default_chat_id")]
    pub chat_id: ChatId,

    /// Lines starting with this word become file uploads:
    /// `!file <file_id> [caption]`.
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    /// Capacity of the update channel.
    #[serde(default = "default_buffer")]
    pub buffer: usize,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            chat_id: default_chat_id(),
            file_prefix: default_file_prefix(),
            buffer: default_buffer(),
        }
    }
}

fn default_chat_id() -> ChatId {
    1
}

fn default_file_prefix() -> String {
    "!file".to_string()
}

fn default_buffer() -> usize {
    32
}
