use crate::connection::HubConnection;
use crate::endpoint::{unix_millis, with_cache_buster};
use crate::error::Error;
use serde::de::DeserializeOwned;
use std::sync::atomic::Ordering;
use tracing::{debug, warn};

/// Outcome of a snapshot fetch that reached the backend.
///
/// A non-2xx response is data, not an `Err`: the caller often wants to fall
/// back to live streaming rather than propagate it. Transport-level failures
/// (connect, TLS, body read) still surface as [`Error`].
#[derive(Debug, Clone)]
pub enum SnapshotResult<T> {
    Success(T),
    Failure {
        status: u16,
        message: String,
        body: String,
    },
}

impl<T> SnapshotResult<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn into_success(self) -> Option<T> {
        match self {
            Self::Success(value) => Some(value),
            Self::Failure { .. } => None,
        }
    }
}

impl HubConnection {
    /// Fetch a point-in-time snapshot over HTTP instead of streaming.
    ///
    /// Shares the round-robin cursor with the streaming supervisor, so
    /// snapshot fetches and connection attempts rotate through the backends
    /// together. Does not touch retry state and works whether or not a
    /// stream is connected.
    pub async fn fetch_snapshot<T>(&self) -> Result<SnapshotResult<T>, Error>
    where
        T: DeserializeOwned,
    {
        if self.snapshot_endpoints.is_empty() {
            return Err(Error::Config(crate::config::ConfigError::InvalidEndpoints(
                "no snapshot endpoints configured".to_string(),
            )));
        }

        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.snapshot_endpoints.len();
        let endpoint = &self.snapshot_endpoints[index];
        let url = with_cache_buster(endpoint, unix_millis());
        debug!(%endpoint, "fetching snapshot");

        let response = self.http.get(&url).send().await?;
        let status = response.status();

        if status.is_success() {
            let value = response.json::<T>().await?;
            Ok(SnapshotResult::Success(value))
        } else {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "snapshot request failed");
            Ok(SnapshotResult::Failure {
                status: status.as_u16(),
                message: format!("Error {}", status.as_u16()),
                body,
            })
        }
    }
}
