//! Per-chat conversation state.
//!
//! A [`ConversationStore`] keeps typed values for each chat, so a handler can
//! stash whatever continuation data a multi-step interaction needs and pick it
//! up again on the next update from the same chat. Values are keyed by their
//! Rust type; only one value per type per chat is stored.
//!
//! The store is shared by every dispatch task. Updates for the same chat can
//! run concurrently, so read-modify-write sequences should go through
//! [`ConversationStore::update`], which holds the chat's lock for the whole
//! closure.
//!
//! ```rust
//! use tbot_framework::ConversationStore;
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct AwaitingName;
//!
//! let store = ConversationStore::new();
//! store.set(42, AwaitingName);
//! assert_eq!(store.get::<AwaitingName>(42), Some(AwaitingName));
//!
//! assert!(store.reset(42));
//! assert!(!store.reset(42));
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::trace;

use tbot_core::ChatId;

type ChatState = HashMap<TypeId, Box<dyn Any + Send + Sync>>;

/// Concurrent map of chat id to typed state.
#[derive(Default)]
pub struct ConversationStore {
    chats: RwLock<HashMap<ChatId, Arc<Mutex<ChatState>>>>,
}

impl ConversationStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn chat(&self, chat_id: ChatId) -> Option<Arc<Mutex<ChatState>>> {
        self.chats.read().get(&chat_id).cloned()
    }

    fn chat_or_insert(&self, chat_id: ChatId) -> Arc<Mutex<ChatState>> {
        if let Some(chat) = self.chat(chat_id) {
            return chat;
        }
        Arc::clone(self.chats.write().entry(chat_id).or_default())
    }

    /// Stores `value` for `chat_id`, replacing any previous value of type `T`.
    pub fn set<T: Send + Sync + 'static>(&self, chat_id: ChatId, value: T) {
        self.chat_or_insert(chat_id)
            .lock()
            .insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Returns a clone of the stored `T` for `chat_id`.
    pub fn get<T: Clone + 'static>(&self, chat_id: ChatId) -> Option<T> {
        self.chat(chat_id)?
            .lock()
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref::<T>())
            .cloned()
    }

    /// Returns `true` if a `T` is stored for `chat_id`.
    pub fn contains<T: 'static>(&self, chat_id: ChatId) -> bool {
        self.chat(chat_id)
            .is_some_and(|chat| chat.lock().contains_key(&TypeId::of::<T>()))
    }

    /// Removes and returns the stored `T` for `chat_id`.
    pub fn take<T: 'static>(&self, chat_id: ChatId) -> Option<T> {
        self.chat(chat_id)?
            .lock()
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast::<T>().ok())
            .map(|v| *v)
    }

    /// Atomically updates the stored `T`, starting from `T::default()` if absent.
    ///
    /// Returns a clone of the new value. The closure runs under the chat's
    /// lock, so it must not touch the store itself.
    pub fn update<T, F>(&self, chat_id: ChatId, f: F) -> T
    where
        T: Default + Clone + Send + Sync + 'static,
        F: FnOnce(&mut T),
    {
        let chat = self.chat_or_insert(chat_id);
        let mut state = chat.lock();
        let mut value = state
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast::<T>().ok())
            .map(|v| *v)
            .unwrap_or_default();
        f(&mut value);
        state.insert(TypeId::of::<T>(), Box::new(value.clone()));
        value
    }

    /// Clears all state for `chat_id`.
    ///
    /// Returns `true` if there was anything to clear; resetting a chat with
    /// no state is a no-op.
    pub fn reset(&self, chat_id: ChatId) -> bool {
        let removed = self.chats.write().remove(&chat_id).is_some();
        trace!(chat_id, removed, "Conversation reset");
        removed
    }

    /// Returns `true` if `chat_id` has any state.
    pub fn is_active(&self, chat_id: ChatId) -> bool {
        self.chat(chat_id).is_some_and(|chat| !chat.lock().is_empty())
    }

    /// Returns the number of chats with stored state.
    pub fn len(&self) -> usize {
        self.chats.read().len()
    }

    /// Returns `true` if no chat has stored state.
    pub fn is_empty(&self) -> bool {
        self.chats.read().is_empty()
    }
}

impl std::fmt::Debug for ConversationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationStore")
            .field("chats", &self.len())
            .finish()
    }
}

/// A [`ConversationStore`] view scoped to one chat.
///
/// This is what handlers normally receive; see the `FromContext` impl.
#[derive(Clone)]
pub struct Conversation {
    store: Arc<ConversationStore>,
    chat_id: ChatId,
}

impl Conversation {
    /// Creates a view of `store` for `chat_id`.
    pub fn new(store: Arc<ConversationStore>, chat_id: ChatId) -> Self {
        Self { store, chat_id }
    }

    /// The chat this view is scoped to.
    pub fn chat_id(&self) -> ChatId {
        self.chat_id
    }

    pub fn set<T: Send + Sync + 'static>(&self, value: T) {
        self.store.set(self.chat_id, value);
    }

    pub fn get<T: Clone + 'static>(&self) -> Option<T> {
        self.store.get(self.chat_id)
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.store.contains::<T>(self.chat_id)
    }

    pub fn take<T: 'static>(&self) -> Option<T> {
        self.store.take(self.chat_id)
    }

    pub fn update<T, F>(&self, f: F) -> T
    where
        T: Default + Clone + Send + Sync + 'static,
        F: FnOnce(&mut T),
    {
        self.store.update(self.chat_id, f)
    }

    /// Clears all state for this chat.
    pub fn reset(&self) -> bool {
        self.store.reset(self.chat_id)
    }
}

impl std::fmt::Debug for Conversation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Conversation")
            .field("chat_id", &self.chat_id)
            .finish_non_exhaustive()
    }
}
