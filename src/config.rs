use crate::channels::ChannelSpec;
use crate::endpoint::EndpointSpec;
use std::time::Duration;

/// Target environment, controlling scheme selection for generated URLs.
///
/// `Dev` uses plaintext schemes (`ws://`, `http://`); `Prod` uses TLS
/// (`wss://`, `https://`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Env {
    Dev,
    #[default]
    Prod,
}

/// Ordering mode accepted by the `snapshot` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotOrder {
    Asc,
    Desc,
}

/// Value passed through as the `snapshot` query parameter.
///
/// The hub accepts either a boolean or an ordering mode here. The client
/// treats the value as opaque and does not interpret ordering semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotParam {
    Enabled(bool),
    Order(SnapshotOrder),
}

impl Default for SnapshotParam {
    fn default() -> Self {
        Self::Enabled(true)
    }
}

impl SnapshotParam {
    /// The literal query-string value for this parameter.
    pub fn as_query_value(self) -> &'static str {
        match self {
            Self::Enabled(true) => "true",
            Self::Enabled(false) => "false",
            Self::Order(SnapshotOrder::Asc) => "asc",
            Self::Order(SnapshotOrder::Desc) => "desc",
        }
    }
}

/// Immutable connection configuration.
///
/// Once a [`HubConnection`](crate::HubConnection) is constructed from these
/// options, the canonical channel set and endpoint lists never change;
/// reconfiguration requires constructing a new instance.
#[derive(Debug, Clone, Default)]
pub struct ConnectionOptions {
    /// Candidate backend endpoints (comma-delimited string or list).
    pub endpoints: EndpointSpec,
    /// API key embedded in every generated URL.
    pub api_key: String,
    /// API host identifier embedded in every generated URL.
    pub api_host: String,
    /// Channels to subscribe to.
    pub channels: ChannelSpec,
    /// Value of the `snapshot` query parameter.
    pub snapshot: SnapshotParam,
    /// Optional `snapshot_size` query parameter.
    pub snapshot_size: Option<u32>,
    /// Optional `user_id` query parameter.
    pub user_id: Option<String>,
    /// Environment tag controlling scheme selection.
    pub env: Env,
}

impl ConnectionOptions {
    /// Create a new builder for connection options.
    pub fn builder() -> ConnectionOptionsBuilder {
        ConnectionOptionsBuilder::default()
    }
}

/// Builder for [`ConnectionOptions`].
#[derive(Debug, Clone, Default)]
pub struct ConnectionOptionsBuilder {
    options: ConnectionOptions,
}

impl ConnectionOptionsBuilder {
    /// Set the candidate endpoints.
    pub fn endpoints(mut self, endpoints: impl Into<EndpointSpec>) -> Self {
        self.options.endpoints = endpoints.into();
        self
    }

    /// Set the API key.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.options.api_key = api_key.into();
        self
    }

    /// Set the API host identifier.
    pub fn api_host(mut self, api_host: impl Into<String>) -> Self {
        self.options.api_host = api_host.into();
        self
    }

    /// Set the channel specification.
    pub fn channels(mut self, channels: impl Into<ChannelSpec>) -> Self {
        self.options.channels = channels.into();
        self
    }

    /// Set the `snapshot` query parameter.
    pub fn snapshot(mut self, snapshot: SnapshotParam) -> Self {
        self.options.snapshot = snapshot;
        self
    }

    /// Set the `snapshot_size` query parameter.
    pub fn snapshot_size(mut self, size: u32) -> Self {
        self.options.snapshot_size = Some(size);
        self
    }

    /// Set the `user_id` query parameter.
    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.options.user_id = Some(user_id.into());
        self
    }

    /// Set the target environment.
    pub fn env(mut self, env: Env) -> Self {
        self.options.env = env;
        self
    }

    /// Build the options with validation.
    ///
    /// Fails fast on input that would otherwise produce a silently-empty
    /// endpoint list. An empty channel set is allowed ("subscribe to
    /// nothing").
    pub fn build(self) -> Result<ConnectionOptions, ConfigError> {
        if self.options.endpoints.entries().next().is_none() {
            return Err(ConfigError::InvalidEndpoints(
                "at least one endpoint is required".to_string(),
            ));
        }

        if self.options.api_key.trim().is_empty() {
            return Err(ConfigError::InvalidCredentials(
                "api_key must not be empty".to_string(),
            ));
        }

        if self.options.api_host.trim().is_empty() {
            return Err(ConfigError::InvalidCredentials(
                "api_host must not be empty".to_string(),
            ));
        }

        Ok(self.options)
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// Invalid endpoint specification
    #[error("Invalid endpoints: {0}")]
    InvalidEndpoints(String),
    /// Invalid credential configuration
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),
}

/// Parameters governing a single `connect()` call.
#[derive(Debug, Clone)]
pub struct ConnectParams {
    /// Maximum number of reconnection attempts before the failure is
    /// surfaced terminally. Compared against the attempt count, never
    /// elapsed time.
    pub max_retry_attempts: u32,
    /// Base delay of the linear reconnection backoff.
    pub retry_delay: Duration,
    /// Timeout for establishing a single transport connection.
    pub connect_timeout: Duration,
}

impl Default for ConnectParams {
    fn default() -> Self {
        Self {
            // Effectively unlimited: keep reconnecting until closed.
            max_retry_attempts: u32::MAX,
            retry_delay: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl ConnectParams {
    /// Delay before reconnect attempt `attempt` (1-indexed).
    ///
    /// Linear backoff: `attempt × retry_delay`. Successful traffic resets
    /// the attempt counter, so a clean connection does not inherit an
    /// elevated delay on a later, unrelated failure.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.retry_delay.saturating_mul(attempt)
    }
}
