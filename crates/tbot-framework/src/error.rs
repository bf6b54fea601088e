//! Error types for the tbot framework.

use thiserror::Error;

pub use tower::BoxError;

/// Registration-time mistakes.
///
/// These are static configuration errors: they surface the first time the
/// offending `handle_*` / `set_alias` call runs, never during dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// The path (or alias) is empty after trimming.
    #[error("route path must not be empty")]
    EmptyPath,

    /// The path contains whitespace, so no command token could ever equal it.
    #[error("route path '{0}' contains whitespace")]
    InvalidPath(String),

    /// `set_alias` was pointed at something that is itself an alias.
    #[error("'{route}' is an alias of '{target}'; aliases must point at a canonical route")]
    AliasOfAlias {
        /// The alias used as a target.
        route: String,
        /// Where that alias points.
        target: String,
    },

    /// The new alias is already the target of another alias, so
    /// registering it would chain two aliases.
    #[error("'{alias}' is the target of alias '{by}'; it cannot become an alias itself")]
    AliasIsTarget {
        /// The alias being registered.
        alias: String,
        /// An existing alias pointing at it.
        by: String,
    },

    /// The alias is already registered as a canonical route.
    #[error("alias '{0}' is already a route; exact matches always win so it could never fire")]
    AliasShadowsRoute(String),

    /// The alias equals the route it points to.
    #[error("'{0}' cannot be an alias of itself")]
    SelfAlias(String),
}

/// Result type for registration calls.
pub type RouteResult<T> = Result<T, RouteError>;

/// Errors that can occur during context extraction.
#[derive(Debug, Clone, Error)]
pub enum ExtractError {
    /// The handler asked for text but the update is a file upload.
    #[error("update carries no text")]
    NotText,

    /// The handler asked for a file but the update is text.
    #[error("update carries no file")]
    NotFile,

    /// Command arguments failed to parse.
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    /// Custom extraction error.
    #[error("{0}")]
    Custom(String),
}

impl ExtractError {
    /// Creates a custom extraction error.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }
}

/// Result type for extraction operations.
pub type ExtractResult<T> = Result<T, ExtractError>;

/// A handler returned `Err`.
///
/// The dispatcher logs these and counts them as failures; they never reach
/// other in-flight dispatches.
#[derive(Debug, Clone, Error)]
#[error("handler error: {0}")]
pub struct HandlerError(pub String);
