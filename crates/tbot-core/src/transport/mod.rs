//! Transport abstraction.
//!
//! A [`Transport`] is the chat-platform adapter seen from the dispatcher:
//! a closable stream of [`Update`]s going in, and three flavours of outbound
//! send going out. How updates are acquired (webhook, long polling, a test
//! channel) is entirely the adapter's business.
//!
//! ```text
//! ┌─────────────┐  updates()   ┌────────────┐  resolve   ┌─────────┐
//! │  Transport  │─────────────▶│ Dispatcher │───────────▶│ Handler │
//! │  (adapter)  │◀─────────────│            │            │         │
//! └─────────────┘  send / raw  └────────────┘            └─────────┘
//! ```

pub mod memory;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::{ApiResult, TransportResult};
use crate::event::Update;
use crate::message::OutboundMessage;

pub use memory::{MemoryHandle, MemoryTransport, SentItem};

/// The inbound side of a transport. Closing the sender ends the stream.
pub type UpdateStream = mpsc::Receiver<Update>;

/// The chat-platform adapter.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Opens the update stream.
    ///
    /// Most transports hand out exactly one stream; a second call should
    /// fail with [`TransportError::StreamTaken`](crate::TransportError::StreamTaken).
    async fn updates(&self) -> TransportResult<UpdateStream>;

    /// Sends a fully-specified message.
    async fn send(&self, message: OutboundMessage) -> ApiResult<()>;

    /// Sends a raw request for API surface the message model doesn't cover.
    async fn send_raw(&self, endpoint: &str, params: HashMap<String, String>) -> ApiResult<Value>;

    /// Called once the server stops consuming updates.
    ///
    /// The default implementation does nothing.
    async fn shutdown(&self) {}
}

/// A shared transport trait object.
pub type BoxedTransport = Arc<dyn Transport>;
