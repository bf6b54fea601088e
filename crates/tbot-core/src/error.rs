//! Error types for transports and outbound API calls.
//!
//! Routing and handler errors live in `tbot-framework`; this crate only
//! describes failures at the adapter boundary.

use thiserror::Error;

// =============================================================================
// Transport Errors
// =============================================================================

/// Errors raised while acquiring or consuming the update stream.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The update stream could not be opened.
    #[error("failed to open update stream: {reason}")]
    StreamUnavailable {
        /// Reason for failure.
        reason: String,
    },

    /// The update stream was already taken by another consumer.
    #[error("update stream already taken")]
    StreamTaken,

    /// Connection closed.
    #[error("connection closed: {reason}")]
    ConnectionClosed {
        /// Reason for closure.
        reason: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

// =============================================================================
// API Errors
// =============================================================================

/// Errors raised by outbound sends.
///
/// The dispatcher never retries; whoever called `send` decides what to do.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The transport is not connected.
    #[error("transport is not connected")]
    NotConnected,
    /// The remote API rejected the request.
    #[error("API error ({code}): {message}")]
    Rejected { code: i64, message: String },
    /// The endpoint is not supported by this transport.
    #[error("unsupported endpoint: {0}")]
    UnsupportedEndpoint(String),
    /// Failed to serialize/deserialize.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// Transport error.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Result type for API calls.
pub type ApiResult<T> = Result<T, ApiError>;
