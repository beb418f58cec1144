use crate::error::{Error, ErrorKind};
use crate::message::ClientMessage;

/// Lifecycle and data events published on the connection event bus.
///
/// Exactly one `Ready` is published at construction, before any connection
/// attempt; every other event originates from the active transport or the
/// reconnection policy. The bus is broadcast, not replay: a subscriber only
/// observes events from the point of subscription onward.
#[derive(Debug, Clone)]
pub enum ConnectionEvent {
    /// The connection instance is constructed and ready to connect.
    Ready,
    /// A transport finished its handshake.
    Open { endpoint: String },
    /// The active transport closed.
    Close(CloseInfo),
    /// A failure surfaced to subscribers: a failed connect attempt, a
    /// decode failure, or terminal retry exhaustion.
    Error(ErrorNotice),
    /// A decoded inbound frame.
    Data(ClientMessage),
    /// The connection was explicitly closed; no further events follow.
    Complete,
}

impl ConnectionEvent {
    pub fn is_data(&self) -> bool {
        matches!(self, Self::Data(_))
    }

    pub fn into_data(self) -> Option<ClientMessage> {
        match self {
            Self::Data(message) => Some(message),
            _ => None,
        }
    }
}

/// Close detail forwarded from the transport's close signal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloseInfo {
    pub code: Option<u16>,
    pub reason: Option<String>,
}

/// Cloneable failure detail carried by [`ConnectionEvent::Error`].
#[derive(Debug, Clone)]
pub struct ErrorNotice {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorNotice {
    pub(crate) fn from_error(error: &Error) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}
