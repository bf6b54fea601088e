//! Extractor system for handler parameters.
//!
//! Any type implementing [`FromContext`] can appear as a handler parameter;
//! the framework extracts it from the [`Context`] before the handler runs.
//!
//! ```rust,ignore
//! async fn echo(Args(text): Args) -> String {
//!     text
//! }
//!
//! async fn upload(File(file): File, chat: Chat) -> String {
//!     format!("chat {} sent {}", chat.0, file.file_id)
//! }
//! ```
//!
//! # Error Handling
//!
//! If an extractor fails the handler does not run and the [`ExtractError`]
//! is reported as a handler failure. Wrap a parameter in [`Option<T>`] or
//! `Result<T, ExtractError>` to handle the failure yourself.

use std::sync::Arc;

use tbot_core::{BoxedTransport, ChatId, FileUpload, Update};

use crate::context::Context;
use crate::conversation::Conversation;
use crate::error::{ExtractError, ExtractResult};

/// A type that can be extracted from a [`Context`].
pub trait FromContext: Sized {
    /// Attempts to extract this type from the given context.
    fn from_context(ctx: &Arc<Context>) -> ExtractResult<Self>;
}

/// The full context.
impl FromContext for Arc<Context> {
    fn from_context(ctx: &Arc<Context>) -> ExtractResult<Self> {
        Ok(Arc::clone(ctx))
    }
}

/// A clone of the update.
impl FromContext for Update {
    fn from_context(ctx: &Arc<Context>) -> ExtractResult<Self> {
        Ok(ctx.update().clone())
    }
}

/// The transport, for sends beyond a simple reply.
impl FromContext for BoxedTransport {
    fn from_context(ctx: &Arc<Context>) -> ExtractResult<Self> {
        Ok(Arc::clone(ctx.transport()))
    }
}

/// This chat's conversation state.
impl FromContext for Conversation {
    fn from_context(ctx: &Arc<Context>) -> ExtractResult<Self> {
        Ok(ctx.conversation())
    }
}

/// Optional parameters never fail.
impl<T: FromContext> FromContext for Option<T> {
    fn from_context(ctx: &Arc<Context>) -> ExtractResult<Self> {
        Ok(T::from_context(ctx).ok())
    }
}

/// Hands the extraction error to the handler instead of skipping it.
impl<T: FromContext> FromContext for Result<T, ExtractError> {
    fn from_context(ctx: &Arc<Context>) -> ExtractResult<Self> {
        Ok(T::from_context(ctx))
    }
}

/// The chat id of the update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chat(pub ChatId);

impl FromContext for Chat {
    fn from_context(ctx: &Arc<Context>) -> ExtractResult<Self> {
        Ok(Chat(ctx.chat_id()))
    }
}

/// The text following the command token (the caption for uploads).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args(pub String);

impl FromContext for Args {
    fn from_context(ctx: &Arc<Context>) -> ExtractResult<Self> {
        Ok(Args(ctx.args().to_string()))
    }
}

/// The full message text. Fails on file uploads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text(pub String);

impl FromContext for Text {
    fn from_context(ctx: &Arc<Context>) -> ExtractResult<Self> {
        ctx.update()
            .text_content()
            .map(|text| Text(text.to_string()))
            .ok_or(ExtractError::NotText)
    }
}

/// The uploaded file. Fails on text updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File(pub FileUpload);

impl FromContext for File {
    fn from_context(ctx: &Arc<Context>) -> ExtractResult<Self> {
        ctx.update()
            .file_upload()
            .cloned()
            .map(File)
            .ok_or(ExtractError::NotFile)
    }
}

/// A clone of a value a middleware stored with
/// [`Context::set_extension`].
#[derive(Debug, Clone)]
pub struct Extension<T>(pub T);

impl<T: Clone + 'static> FromContext for Extension<T> {
    fn from_context(ctx: &Arc<Context>) -> ExtractResult<Self> {
        ctx.get_extension::<T>().map(Extension).ok_or_else(|| {
            ExtractError::custom(format!(
                "extension {} not set; is the middleware installed?",
                std::any::type_name::<T>()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::ConversationStore;
    use tbot_core::MemoryTransport;

    fn ctx(update: Update) -> Arc<Context> {
        let (transport, _handle) = MemoryTransport::new(1);
        Arc::new(Context::new(
            update,
            Arc::new(transport),
            Arc::new(ConversationStore::new()),
        ))
    }

    #[test]
    fn test_text_extractors() {
        let ctx = ctx(Update::text(3, "/say hi there"));
        assert_eq!(Chat::from_context(&ctx).unwrap(), Chat(3));
        assert_eq!(Args::from_context(&ctx).unwrap().0, "hi there");
        assert_eq!(Text::from_context(&ctx).unwrap().0, "/say hi there");
        assert!(matches!(File::from_context(&ctx), Err(ExtractError::NotFile)));
    }

    #[test]
    fn test_file_extractors() {
        let ctx = ctx(Update::file(3, FileUpload::new("f1")));
        assert_eq!(File::from_context(&ctx).unwrap().0.file_id, "f1");
        assert!(Option::<Text>::from_context(&ctx).unwrap().is_none());
        assert!(matches!(
            Result::<Text, ExtractError>::from_context(&ctx).unwrap(),
            Err(ExtractError::NotText)
        ));
    }

    #[test]
    fn test_extension_extractor() {
        #[derive(Clone, Debug, PartialEq)]
        struct User(&'static str);

        let ctx = ctx(Update::text(3, "/me"));
        assert!(Extension::<User>::from_context(&ctx).is_err());

        ctx.set_extension(User("ann"));
        assert_eq!(Extension::<User>::from_context(&ctx).unwrap().0, User("ann"));
    }
}
