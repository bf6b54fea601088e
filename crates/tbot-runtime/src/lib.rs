//! tbot Runtime - configuration, logging and the serving loop.
//!
//! This crate provides:
//! - Layered configuration (`BotConfig`, `ConfigLoader`)
//! - Logging setup from configuration (`LoggingBuilder`)
//! - [`BotServer`]: a transport plus dispatcher with graceful shutdown
//!
//! ```ignore
//! use tbot_runtime::BotServer;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let server = BotServer::builder().build(MyTransport::connect()?)?;
//!
//!     server.handle("/start", "hello!")?.describe("greet");
//!     server.handle_func("/echo", |Args(text): Args| async move { text })?;
//!
//!     // Runs until Ctrl+C or the transport closes its stream
//!     server.serve().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod server;

pub use config::{BotConfig, ConfigError, ConfigLoader, ConfigResult};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use server::{BotServer, ServerBuilder};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Logging macros, for handlers that want to log without depending on
/// `tracing` directly.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
