//! # tbot Core
//!
//! The data model shared by every tbot crate.
//!
//! - **Events**: the inbound [`Update`] envelope and its [`Payload`]
//! - **Messages**: the outbound [`OutboundMessage`]
//! - **Transport**: the [`Transport`] trait implemented by chat-platform
//!   adapters, plus the channel-backed [`MemoryTransport`]
//! - **Errors**: [`TransportError`] and [`ApiError`]
//!
//! Routing, middleware and dispatch live in `tbot-framework`.

pub mod error;
pub mod event;
pub mod message;
pub mod transport;

pub use error::{ApiError, ApiResult, TransportError, TransportResult};
pub use event::{ChatId, FileUpload, Payload, Update, split_command, strip_mention};
pub use message::{MessageKind, OutboundMessage};
pub use transport::{
    BoxedTransport, MemoryHandle, MemoryTransport, SentItem, Transport, UpdateStream,
};
