//! # tbot Console Adapter
//!
//! A [`Transport`](tbot_core::Transport) for trying bots out in a terminal.
//! Every line typed on stdin becomes an update, every message the bot sends
//! is printed on stdout.
//!
//! ```text
//! > /start
//! [chat 1] hello!
//! > #42 /go
//! [chat 42] hello!
//! > !file notes.txt my notes
//! [chat 1] stored notes.txt
//! ```
//!
//! ```rust,ignore
//! use tbot_adapter_console::ConsoleTransport;
//!
//! let server = BotServer::builder().build(ConsoleTransport::new())?;
//! server.serve().await?;
//! ```

pub mod config;
pub mod parse;
pub mod transport;

pub use config::ConsoleConfig;
pub use parse::parse_line;
pub use transport::{ConsoleTransport, render_message};
