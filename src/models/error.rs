use thiserror::Error;

/// Per-connection protocol errors. All of these are local to one
/// connection: they end that socket and never take down the router or
/// touch other sessions.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("no session found for {0}")]
    SessionNotFound(String),

    /// A viewer sent a frame; viewers are consumers only.
    #[error("viewer connections are receive-only")]
    UnexpectedRole,

    #[error("malformed message: {0}")]
    MalformedMessage(String),
}
