//! The per-dispatch context handed to middlewares and handlers.
//!
//! One [`Context`] is created for every update that resolves to a handler.
//! It owns the [`Update`], a handle to the transport for replies, the shared
//! [`ConversationStore`], and a small type-keyed extension map that
//! middlewares can use to pass data down the chain (an authenticated user, a
//! request id, ...).
//!
//! # Example
//!
//! ```rust,ignore
//! async fn whoami(ctx: Arc<Context>) -> Result<(), BoxError> {
//!     let user = ctx.get_extension::<AuthUser>();
//!     ctx.reply(format!("chat {} / user {:?}", ctx.chat_id(), user)).await?;
//!     Ok(())
//! }
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use tbot_core::{ApiResult, BoxedTransport, ChatId, OutboundMessage, Update, strip_mention};

use crate::conversation::{Conversation, ConversationStore};
use crate::router::MatchKind;

/// Everything a handler can see about the update it is processing.
pub struct Context {
    update: Update,
    transport: BoxedTransport,
    conversations: Arc<ConversationStore>,
    match_kind: MatchKind,
    route: Option<String>,
    command: String,
    extensions: Mutex<HashMap<TypeId, Box<dyn Any + Send + Sync>>>,
}

impl Context {
    /// Creates a context for `update`.
    ///
    /// The dispatcher fills in the match information with
    /// [`with_match`](Self::with_match); contexts built by hand (in tests)
    /// default to [`MatchKind::Default`].
    pub fn new(
        update: Update,
        transport: BoxedTransport,
        conversations: Arc<ConversationStore>,
    ) -> Self {
        let command = update.command().unwrap_or_default().to_string();
        Self {
            update,
            transport,
            conversations,
            match_kind: MatchKind::Default,
            route: None,
            command,
            extensions: Mutex::new(HashMap::new()),
        }
    }

    /// Records how the router resolved this update.
    pub fn with_match(mut self, kind: MatchKind, route: Option<String>) -> Self {
        self.match_kind = kind;
        self.route = route;
        self
    }

    /// Strips a trailing `@username` from the recorded command token.
    pub(crate) fn with_username(mut self, username: Option<&str>) -> Self {
        if let Some(username) = username {
            self.command = strip_mention(&self.command, username).to_string();
        }
        self
    }

    // ─── Update accessors ─────────────────────────────────────────────────────

    /// The update being processed.
    pub fn update(&self) -> &Update {
        &self.update
    }

    /// Shortcut for `update().chat_id`.
    pub fn chat_id(&self) -> ChatId {
        self.update.chat_id
    }

    /// The command token as typed (minus a mention of this bot).
    ///
    /// Empty for file uploads.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// The text following the command token.
    pub fn args(&self) -> &str {
        self.update.args()
    }

    /// Which rule picked the handler.
    pub fn match_kind(&self) -> MatchKind {
        self.match_kind
    }

    /// The canonical route path for route and alias matches.
    pub fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }

    // ─── Outbound ─────────────────────────────────────────────────────────────

    /// The transport this update arrived on.
    pub fn transport(&self) -> &BoxedTransport {
        &self.transport
    }

    /// Sends `text` back to the originating chat.
    pub async fn reply(&self, text: impl Into<String>) -> ApiResult<()> {
        self.transport
            .send(OutboundMessage::text(self.chat_id(), text))
            .await
    }

    /// Sends a fully-specified message.
    pub async fn send(&self, message: OutboundMessage) -> ApiResult<()> {
        self.transport.send(message).await
    }

    // ─── Conversation state ───────────────────────────────────────────────────

    /// Conversation state for this update's chat.
    pub fn conversation(&self) -> Conversation {
        Conversation::new(Arc::clone(&self.conversations), self.chat_id())
    }

    /// The shared store, for handlers that touch other chats.
    pub fn conversations(&self) -> &Arc<ConversationStore> {
        &self.conversations
    }

    // ─── Extensions ───────────────────────────────────────────────────────────

    /// Stores a value for the rest of this dispatch.
    ///
    /// Only one value per type can be stored; subsequent calls overwrite.
    pub fn set_extension<T: Send + Sync + 'static>(&self, value: T) {
        self.extensions
            .lock()
            .insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Retrieves a cloned extension value.
    pub fn get_extension<T: Clone + 'static>(&self) -> Option<T> {
        self.extensions
            .lock()
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref::<T>())
            .cloned()
    }

    /// Removes and returns an extension value.
    pub fn take_extension<T: 'static>(&self) -> Option<T> {
        self.extensions
            .lock()
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast::<T>().ok())
            .map(|v| *v)
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("update", &self.update)
            .field("transport", &self.transport.name())
            .field("match_kind", &self.match_kind)
            .field("route", &self.route)
            .finish_non_exhaustive()
    }
}
