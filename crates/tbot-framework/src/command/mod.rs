//! Clap-based argument parsing.
//!
//! Enabled with the `command` feature. Declare the arguments of a route as a
//! `clap::Parser` and take [`CommandArgs<T>`] as a handler parameter; the
//! text after the command token is shell-split and parsed before the handler
//! runs.
//!
//! ```rust,ignore
//! use clap::Parser;
//! use tbot_framework::CommandArgs;
//!
//! #[derive(Parser, Clone)]
//! struct Remind {
//!     /// Minutes from now
//!     minutes: u32,
//!     /// What to remind about
//!     text: Vec<String>,
//! }
//!
//! router.handle_func("/remind", |cmd: CommandArgs<Remind>| async move {
//!     format!("in {} min: {}", cmd.minutes, cmd.text.join(" "))
//! })?;
//! ```
//!
//! On a parse failure the handler does not run and clap's rendered message
//! (usage, or the full help for `--help`) is carried by
//! [`ExtractError::InvalidArgs`](crate::ExtractError::InvalidArgs). Wrap the
//! parameter in `Result<CommandArgs<T>, ExtractError>` to reply with it.

pub mod extractor;
pub mod split;

pub use extractor::CommandArgs;
pub use split::shell_split;
