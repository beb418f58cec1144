//! # ws-hub-client
//!
//! A resilient client for real-time pub/sub message hubs, with multi-endpoint
//! failover, auto-reconnection, and HTTP snapshot fallback.
//!
//! ## Features
//!
//! - **Auto-reconnection** with linear backoff and a configurable retry budget
//! - **Multi-endpoint failover** - candidates rotate round-robin on failure
//! - **Endpoint normalization** - raw hosts become canonical, fully
//!   parameterized stream and snapshot URLs
//! - **Typed message model** with channel-prefix routing
//! - **Broadcast event bus** - lifecycle and data events fan out to any
//!   number of independent subscribers
//! - **Snapshot fallback** - point-in-time state over HTTP when streaming
//!   is not wanted
//!
//! ## Example
//!
//! ```ignore
//! use ws_hub_client::{ConnectParams, ConnectionOptions, HubConnection};
//! use tokio_stream::StreamExt;
//!
//! let options = ConnectionOptions::builder()
//!     .endpoints("hub-a.example.com,hub-b.example.com")
//!     .api_key("key1")
//!     .api_host("trading.example.com")
//!     .channels(["ticks", "orders"])
//!     .build()?;
//!
//! let connection = HubConnection::new(options)?;
//! let mut ticks = connection.channel_stream::<Tick>("ticks");
//! connection.connect(ConnectParams::default());
//!
//! while let Some(message) = ticks.next().await {
//!     println!("{}: {:?}", message.channel(), message.value());
//! }
//! ```

mod channels;
mod config;
mod connection;
mod endpoint;
mod error;
mod event;
mod message;
mod router;
mod snapshot;

pub use channels::ChannelSpec;
pub use config::{
    ConfigError, ConnectParams, ConnectionOptions, ConnectionOptionsBuilder, Env, SnapshotOrder,
    SnapshotParam,
};
pub use connection::HubConnection;
pub use endpoint::{normalize_endpoints, EndpointKind, EndpointSpec};
pub use error::{Error, ErrorKind};
pub use event::{CloseInfo, ConnectionEvent, ErrorNotice};
pub use message::{
    ClientConnectedMessage, ClientMessage, ClientMessageType, ClientSubscribedMessage,
    SubscribedChannel,
};
pub use snapshot::SnapshotResult;

/// Result type for ws-hub-client operations
pub type Result<T> = std::result::Result<T, Error>;
