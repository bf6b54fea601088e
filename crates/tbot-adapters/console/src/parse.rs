//! Turning console lines into updates.

use tbot_core::{ChatId, FileUpload, Update};

use crate::config::ConsoleConfig;

/// Parses one input line.
///
/// - `#42 /start` is text from chat 42
/// - `!file abc123 holiday photo` is an upload of `abc123` with a caption
/// - anything else is text from the configured chat
///
/// Blank lines yield `None`.
pub fn parse_line(line: &str, config: &ConsoleConfig, message_id: i64) -> Option<Update> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let (chat_id, rest) = split_chat(line).unwrap_or((config.chat_id, line));

    let update = match parse_file(rest, &config.file_prefix) {
        Some(upload) => Update::file(chat_id, upload),
        None => Update::text(chat_id, rest),
    };
    Some(update.with_message_id(message_id))
}

fn split_chat(line: &str) -> Option<(ChatId, &str)> {
    let rest = line.strip_prefix('#')?;
    let (id, text) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    let chat_id = id.parse().ok()?;
    Some((chat_id, text.trim_start()))
}

fn parse_file(text: &str, prefix: &str) -> Option<FileUpload> {
    if prefix.is_empty() {
        return None;
    }
    let rest = text.strip_prefix(prefix)?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }

    let rest = rest.trim_start();
    let (file_id, caption) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    if file_id.is_empty() {
        return None;
    }

    let mut upload = FileUpload::new(file_id);
    if let Some(name) = file_id.rsplit(['/', '\\']).next().filter(|n| *n != file_id) {
        upload = upload.with_name(name);
    }
    let caption = caption.trim();
    if !caption.is_empty() {
        upload = upload.with_caption(caption);
    }
    Some(upload)
}
