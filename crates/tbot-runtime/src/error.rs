//! Runtime error types.

use tbot_core::{ApiError, TransportError};
use tbot_framework::RouteError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur while building or running a server.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A route from the configuration could not be registered.
    #[error("Route error: {0}")]
    Route(#[from] RouteError),

    /// The update stream could not be opened.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
