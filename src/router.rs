use crate::connection::HubConnection;
use crate::event::ConnectionEvent;
use crate::message::ClientMessage;
use serde::de::DeserializeOwned;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tracing::warn;

impl HubConnection {
    /// Stream every event published on the bus.
    ///
    /// Each call produces an independent subscriber; events published after
    /// subscription fan out to all of them. A subscriber that lags past the
    /// bus capacity skips the missed events and continues.
    pub fn event_stream(&self) -> impl Stream<Item = ConnectionEvent> + Send + Unpin {
        BroadcastStream::new(self.subscribe()).filter_map(|received| match received {
            Ok(event) => Some(event),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                warn!(skipped, "event subscriber lagged, skipping ahead");
                None
            }
        })
    }

    /// Stream only data messages, with payloads decoded into `T`.
    ///
    /// Messages whose payload does not decode as `T` are skipped with a
    /// warning; use [`event_stream`](Self::event_stream) to observe decode
    /// problems as they happen.
    pub fn data_stream<T>(&self) -> impl Stream<Item = ClientMessage<T>> + Send + Unpin
    where
        T: DeserializeOwned + Send + 'static,
    {
        BroadcastStream::new(self.subscribe()).filter_map(|received| {
            let message = match received {
                Ok(ConnectionEvent::Data(message)) => message,
                Ok(_) => return None,
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    warn!(skipped, "data subscriber lagged, skipping ahead");
                    return None;
                }
            };

            match message.into_typed::<T>() {
                Ok(typed) => Some(typed),
                Err(error) => {
                    warn!(%error, "skipping message with unexpected payload shape");
                    None
                }
            }
        })
    }

    /// Stream data messages routed to one requested channel.
    ///
    /// Routing uses prefix matching: a message tagged `ticks` reaches a
    /// subscriber of `ticks/eurusd`, while a message tagged `ticker` does
    /// not reach a subscriber of `ticks`.
    pub fn channel_stream<T>(
        &self,
        channel: impl Into<String>,
    ) -> impl Stream<Item = ClientMessage<T>> + Send + Unpin
    where
        T: DeserializeOwned + Send + 'static,
    {
        let channel = channel.into();
        self.data_stream::<T>()
            .filter(move |message| message.matches_channel(&channel))
    }
}
