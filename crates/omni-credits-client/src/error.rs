//! Client error types.
//!
//! Business outcomes the caller is expected to branch on (insufficient
//! balance, event replay, unknown user) get their own variants; everything
//! else the server reports lands in the generic `Api` variant.

/// Errors that can occur when using the omni-credits client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Insufficient credits for the charge.
    #[error("insufficient credits: balance={balance}, required={required}")]
    InsufficientCredits {
        /// Current balance.
        balance: i64,
        /// Required amount.
        required: i64,
    },

    /// The event id was already charged; the first charge stands.
    #[error("duplicate event: {message}")]
    DuplicateEvent {
        /// The server's message, carrying the event ID.
        message: String,
    },

    /// No account exists for the given user.
    #[error("unknown user")]
    UnknownUser,

    /// Any other error response from the server.
    #[error("API error: {code} - {message}")]
    Api {
        /// Stable error code.
        code: String,
        /// Error message.
        message: String,
        /// HTTP status code.
        status: u16,
    },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
