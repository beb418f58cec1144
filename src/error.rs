use thiserror::Error;

/// Categorizes errors for subscriber-side decision-making.
///
/// This is a lightweight, cloneable representation of the error type that
/// can travel inside connection events. Only `WebSocket` and
/// `ConnectionFailed` errors are auto-recovered by the reconnection policy;
/// every other kind is reported upward for the application to decide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// WebSocket protocol error
    WebSocket,
    /// Connection failed (timeout, refused, abrupt close)
    ConnectionFailed,
    /// Retry attempts exhausted; no further reconnection will happen
    RetryExhausted,
    /// A received frame did not match the expected message shape
    Decode,
    /// Snapshot HTTP request failed at the transport level
    Http,
    /// Invalid configuration
    Config,
}

/// Errors that can occur in ws-hub-client
#[derive(Error, Debug)]
pub enum Error {
    /// WebSocket transport error
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Connection failed or was lost
    #[error("Connection failed after {attempts} attempts: {last_error}")]
    ConnectionFailed { attempts: u32, last_error: String },

    /// Reconnection attempts exceeded the configured maximum
    #[error("Retry attempts exhausted after {attempts} attempts: {last_error}")]
    RetryExhausted { attempts: u32, last_error: String },

    /// A received frame could not be decoded into a `ClientMessage`
    #[error("Failed to decode frame: {context}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// HTTP error from the snapshot fetcher
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
}

impl Error {
    /// Get the kind of this error for decision-making.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::WebSocket(_) => ErrorKind::WebSocket,
            Error::ConnectionFailed { .. } => ErrorKind::ConnectionFailed,
            Error::RetryExhausted { .. } => ErrorKind::RetryExhausted,
            Error::Decode { .. } => ErrorKind::Decode,
            Error::Http(_) => ErrorKind::Http,
            Error::Config(_) => ErrorKind::Config,
        }
    }
}
