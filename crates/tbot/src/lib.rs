//! # tbot
//!
//! A command-dispatch layer for chat bots.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐  Update   ┌────────────┐ resolve ┌────────┐  compose  ┌──────────────────────┐
//! │  Transport  │──────────▶│ Dispatcher │────────▶│ Router │──────────▶│ m1(m2(...(handler))) │
//! │  (adapter)  │◀──────────│ (task/upd) │         └────────┘           └──────────────────────┘
//! └─────────────┘   send    └────────────┘
//! ```
//!
//! - **Transport**: produces [`Update`](core::Update)s and performs sends
//! - **Router**: exact path, then alias, then default; file uploads go to
//!   the file handler
//! - **Middleware**: tower layers wrapping every dispatch, first registered
//!   is outermost
//! - **Dispatcher**: one task per update, errors and panics isolated
//! - **BotServer**: configuration, logging, `/help` and graceful shutdown
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tbot::prelude::*;
//!
//! async fn echo(Args(text): Args) -> String {
//!     text
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let server = BotServer::builder().build(MyTransport::connect()?)?;
//!
//!     server.handle_func("/echo", echo)?.describe("repeat the arguments");
//!     server.set_alias("/echo", ["/e", "/say"])?;
//!
//!     server.serve().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `command` *(default)*: [`CommandArgs`](framework::CommandArgs), clap-parsed arguments
//! - `toml-config` *(default)*: `tbot.toml` configuration files
//! - `json-log`: JSON log output

pub use tbot_core as core;
pub use tbot_framework as framework;
pub use tbot_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use tbot::prelude::*;
/// ```
pub mod prelude {
    // Server - main entry point
    pub use tbot_runtime::{BotConfig, BotServer, RuntimeError};

    // Event and transport model
    pub use tbot_core::{
        ApiError, ChatId, FileUpload, OutboundMessage, Transport, TransportError, Update,
    };

    // Routing and handlers
    pub use tbot_framework::{
        Context, Conversation, DispatchOutcome, Handler, HandlerResponse, MatchKind, RouteError,
        Router,
    };

    // Extractors - for handler parameters
    pub use tbot_framework::{Args, Chat, Extension, File, FromContext, Text};

    // Middleware
    pub use tbot_framework::middleware::{self, Middleware, Next};

    // Structured command support (requires "command" feature)
    #[cfg(feature = "command")]
    pub use tbot_framework::CommandArgs;
}
