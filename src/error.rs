//! Error types for the console core and the proxy server.

use thiserror::Error;

/// Result type for console operations.
pub type ConsoleResult<T> = Result<T, ConsoleError>;

/// Errors surfaced by the client controller.
///
/// Every variant is handled where it originates: logged, then shown as a
/// transient status banner. None of them ends the session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsoleError {
    /// The master reference could not be resolved.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Listing documents failed.
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Create, update or delete failed.
    #[error("Mutation error: {0}")]
    Mutation(String),

    /// A required form field is missing or a selection is invalid.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration could not be loaded or merged.
    #[error("Config error: {0}")]
    Config(String),
}

/// Result type for proxy operations.
pub type ProxyResult<T> = Result<T, ProxyError>;

/// Errors raised while setting up or running the proxy.
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Bind error: {0}")]
    Bind(String),

    #[error("Invalid upstream: {0}")]
    InvalidUpstream(String),

    #[error("Upstream unreachable: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("Response build error: {0}")]
    Response(#[from] warp::http::Error),
}
