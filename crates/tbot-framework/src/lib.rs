//! Routing, middleware and dispatch for tbot.
//!
//! This crate turns a stream of [`Update`](tbot_core::Update)s into handler
//! invocations:
//!
//! - [`Router`]: command path, alias, file and default handler resolution,
//!   plus per-chat [`ConversationStore`]
//! - [`middleware`]: tower-based middleware chain, first registered is
//!   outermost
//! - [`Dispatcher`]: one task per update, failures isolated and counted
//!
//! Handlers are ordinary async functions whose parameters implement
//! [`FromContext`]:
//!
//! ```rust,ignore
//! use tbot_framework::{Args, Dispatcher, Router};
//!
//! async fn echo(Args(text): Args) -> String {
//!     text
//! }
//!
//! let router = Router::new();
//! router.handle_func("/echo", echo)?.describe("repeat the arguments");
//! router.set_alias("/echo", ["/e"])?;
//!
//! let dispatcher = Dispatcher::new(router, transport);
//! dispatcher.run(updates).await;
//! ```

pub mod context;
pub mod conversation;
pub mod dispatcher;
pub mod error;
pub mod extractor;
pub mod handler;
pub mod middleware;
pub mod router;

#[cfg(feature = "command")]
pub mod command;

pub use context::Context;
pub use conversation::{Conversation, ConversationStore};
pub use dispatcher::{DispatchOutcome, DispatchStats, Dispatcher, StatsSnapshot};
pub use error::{BoxError, ExtractError, ExtractResult, HandlerError, RouteError, RouteResult};
pub use extractor::{Args, Chat, Extension, File, FromContext, Text};
pub use handler::{BoxedHandler, Handler, HandlerResponse, into_handler, static_reply};
pub use middleware::{HandlerService, Middleware, MiddlewareStack, Next, from_fn};
pub use router::{MatchKind, Resolution, RouteBuilder, RouteInfo, Router};

#[cfg(feature = "command")]
pub use command::CommandArgs;
