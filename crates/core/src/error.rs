//! Unified error types for bizdesk.

/// Unified error types for the bizdesk client.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., an unparseable path or selector).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Network unreachable, connection reset, body read failure.
    #[error("TRANSPORT_ERROR: {0}")]
    Transport(String),

    /// Request did not complete before its deadline.
    #[error("TIMEOUT: no response after {0}ms")]
    Timeout(u64),

    /// Response body was not a valid envelope.
    #[error("MALFORMED_RESPONSE: {0}")]
    Malformed(String),

    /// Backend rejected the session identity (401/403).
    #[error("AUTH_FAILED: {message} (status {status})")]
    Auth { status: u16, message: String },

    /// Any other non-success HTTP status.
    #[error("HTTP_ERROR: {message} (status {status})")]
    Http { status: u16, message: String },

    /// Response body exceeded the configured limit.
    #[error("TOO_LARGE: {0}")]
    TooLarge(String),

    /// Page navigation could not complete.
    #[error("NAVIGATION_FAILED: {0}")]
    Navigation(String),
}

impl Error {
    /// HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Auth { status, .. } | Error::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Human-readable message without the code prefix, suitable for an alert.
    pub fn message(&self) -> String {
        match self {
            Error::InvalidInput(msg)
            | Error::Transport(msg)
            | Error::Malformed(msg)
            | Error::TooLarge(msg)
            | Error::Navigation(msg) => msg.clone(),
            Error::Timeout(ms) => format!("no response after {ms}ms"),
            Error::Auth { message, .. } | Error::Http { message, .. } => message.clone(),
        }
    }
}
