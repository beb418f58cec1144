use crate::config::{ConnectParams, ConnectionOptions};
use crate::endpoint::{normalize_endpoints, unix_millis, with_cache_buster, EndpointKind};
use crate::error::Error;
use crate::event::{CloseInfo, ConnectionEvent, ErrorNotice};
use crate::message::ClientMessage;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

/// Capacity of the broadcast event bus. A subscriber that falls this far
/// behind skips ahead instead of stalling the supervisor or its peers.
const EVENT_BUS_CAPACITY: usize = 256;

/// Process-unique connection identifiers, assigned once at construction.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Type alias for the transport stream
type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// A reconnect-safe subscription to a pub/sub message hub.
///
/// Owns at most one live WebSocket transport at any instant, rotates across
/// candidate endpoints on failure, and republishes all transport lifecycle
/// and data signals onto a broadcast event bus consumed through
/// [`event_stream`](Self::event_stream), [`data_stream`](Self::data_stream)
/// and [`channel_stream`](Self::channel_stream).
///
/// The canonical channel set and endpoint lists are computed once at
/// construction and never change; build a new instance to reconfigure.
pub struct HubConnection {
    id: u64,
    channels: BTreeSet<String>,
    pub(crate) stream_endpoints: Arc<Vec<String>>,
    pub(crate) snapshot_endpoints: Vec<String>,
    /// Round-robin cursor shared between streaming and snapshot fetches.
    pub(crate) cursor: Arc<AtomicUsize>,
    events: broadcast::Sender<ConnectionEvent>,
    pub(crate) http: reqwest::Client,
    active: Mutex<Option<ActiveTransport>>,
}

struct ActiveTransport {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl HubConnection {
    /// Build a connection from validated options.
    ///
    /// Pure aside from id assignment: normalizes the channel set and derives
    /// the stream and snapshot endpoint lists, but opens no sockets. Fails
    /// fast if the options normalize to an empty endpoint list.
    pub fn new(options: ConnectionOptions) -> Result<Self, Error> {
        let channels = options.channels.canonicalize();
        let stream_endpoints = normalize_endpoints(&options, EndpointKind::Stream, &channels);
        let snapshot_endpoints = normalize_endpoints(&options, EndpointKind::Snapshot, &channels);

        if stream_endpoints.is_empty() {
            return Err(Error::Config(crate::config::ConfigError::InvalidEndpoints(
                "options normalize to an empty endpoint list".to_string(),
            )));
        }

        let (events, _) = broadcast::channel(EVENT_BUS_CAPACITY);

        let connection = Self {
            id: NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
            channels,
            stream_endpoints: Arc::new(stream_endpoints),
            snapshot_endpoints,
            cursor: Arc::new(AtomicUsize::new(0)),
            events,
            http: reqwest::Client::new(),
            active: Mutex::new(None),
        };

        // Observable only by subscribers attached before the first
        // connect; the bus does not replay.
        let _ = connection.events.send(ConnectionEvent::Ready);

        Ok(connection)
    }

    /// Process-unique identifier, stable for this instance's lifetime.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The canonical channel set embedded in every generated endpoint.
    pub fn channels(&self) -> &BTreeSet<String> {
        &self.channels
    }

    /// Normalized stream endpoint candidates, in rotation order.
    pub fn stream_endpoints(&self) -> &[String] {
        &self.stream_endpoints
    }

    /// Normalized snapshot endpoint candidates, in rotation order.
    pub fn snapshot_endpoints(&self) -> &[String] {
        &self.snapshot_endpoints
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.events.subscribe()
    }

    #[cfg(test)]
    pub(crate) fn publish_for_test(&self, event: ConnectionEvent) {
        let _ = self.events.send(event);
    }

    /// Open the stream and keep it alive under the given retry policy.
    ///
    /// Any previous transport or pending reconnect is torn down first, so a
    /// repeated call never leaves two live transports behind. Must be called
    /// within a tokio runtime; transport lifecycle is reported through the
    /// event bus, not as a return value.
    pub fn connect(&self, params: ConnectParams) {
        let previous = self.signal_shutdown();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let context = SupervisorContext {
            endpoints: Arc::clone(&self.stream_endpoints),
            cursor: Arc::clone(&self.cursor),
            events: self.events.clone(),
            params,
        };

        let handle = tokio::spawn(async move {
            // Wait out the outgoing task so event production never overlaps
            // between transports.
            if let Some(transport) = previous {
                let _ = transport.handle.await;
            }
            run_supervisor(context, shutdown_rx).await;
        });
        *self.active.lock() = Some(ActiveTransport {
            shutdown_tx,
            handle,
        });
    }

    /// Close the stream and stop all reconnection.
    ///
    /// Signals shutdown (synchronously pre-empting any pending scheduled
    /// reconnect), waits for the supervisor task to exit, then emits
    /// `Complete`. The task is gone before `Complete` is published, so no
    /// event can follow it. The snapshot fetcher remains usable afterwards.
    pub async fn close(&self) {
        if let Some(transport) = self.signal_shutdown() {
            let _ = transport.handle.await;
        }
        let _ = self.events.send(ConnectionEvent::Complete);
    }

    fn signal_shutdown(&self) -> Option<ActiveTransport> {
        let previous = self.active.lock().take();
        if let Some(transport) = &previous {
            debug!(id = self.id, "tearing down active transport");
            let _ = transport.shutdown_tx.send(true);
        }
        previous
    }
}

impl Drop for HubConnection {
    fn drop(&mut self) {
        let _ = self.signal_shutdown();
    }
}

/// Everything the supervisor task needs, detached from `HubConnection` so
/// the task survives borrows of the owning struct.
struct SupervisorContext {
    endpoints: Arc<Vec<String>>,
    cursor: Arc<AtomicUsize>,
    events: broadcast::Sender<ConnectionEvent>,
    params: ConnectParams,
}

/// How an opened transport ended.
enum TransportEnd {
    /// Shutdown was requested; do not reconnect.
    Shutdown,
    /// The transport failed or was closed by the peer.
    Failed(Error),
}

/// Supervisor loop: connect, drive, rotate, back off, repeat.
///
/// The round-robin cursor advances on every connection attempt, so with
/// K endpoints attempt i lands on endpoint i mod K and every failure moves
/// to the next candidate. Linear backoff; a successfully received message
/// resets the attempt counter. Every failed attempt is observable: a
/// connect-phase failure publishes a non-terminal `Error` event, an opened
/// transport that ends publishes `Close`. Exceeding the retry budget
/// surfaces one terminal error event and ends the task.
async fn run_supervisor(context: SupervisorContext, mut shutdown: watch::Receiver<bool>) {
    let mut attempt: u32 = 0;

    loop {
        if *shutdown.borrow() {
            break;
        }

        let index = context.cursor.fetch_add(1, Ordering::Relaxed) % context.endpoints.len();
        let endpoint = &context.endpoints[index];
        let url = with_cache_buster(endpoint, unix_millis());
        debug!(%endpoint, attempt, "opening transport");

        let connected = tokio::select! {
            result = timeout(context.params.connect_timeout, connect_async(url.as_str())) => result,
            _ = shutdown.changed() => break,
        };

        let failure = match connected {
            Ok(Ok((ws_stream, _response))) => {
                info!(%endpoint, "connected");
                let _ = context.events.send(ConnectionEvent::Open {
                    endpoint: endpoint.clone(),
                });

                match drive_transport(ws_stream, &context, &mut shutdown, &mut attempt).await {
                    TransportEnd::Shutdown => break,
                    TransportEnd::Failed(error) => error,
                }
            }
            Ok(Err(error)) => publish_attempt_failure(&context, Error::WebSocket(error)),
            Err(_elapsed) => publish_attempt_failure(
                &context,
                Error::ConnectionFailed {
                    attempts: attempt + 1,
                    last_error: "connection timed out".to_string(),
                },
            ),
        };

        attempt += 1;
        warn!(%endpoint, attempt, error = %failure, "transport attempt failed");

        if attempt > context.params.max_retry_attempts {
            error!(
                attempts = attempt,
                "retry attempts exhausted, giving up on reconnection"
            );
            let terminal = Error::RetryExhausted {
                attempts: attempt,
                last_error: failure.to_string(),
            };
            let _ = context
                .events
                .send(ConnectionEvent::Error(ErrorNotice::from_error(&terminal)));
            break;
        }

        let delay = context.params.delay_for_attempt(attempt);
        debug!(?delay, attempt, "scheduling reconnect");
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = shutdown.changed() => break,
        }
    }

    debug!("supervisor task exiting");
}

/// Surface one failed connect attempt as a non-terminal error event.
fn publish_attempt_failure(context: &SupervisorContext, failure: Error) -> Error {
    let _ = context
        .events
        .send(ConnectionEvent::Error(ErrorNotice::from_error(&failure)));
    failure
}

/// Drive one opened transport until it ends.
///
/// Emits `Data` for every decoded frame, a non-fatal `Error` for frames
/// that fail to decode, and exactly one `Close` when the transport ends for
/// any reason other than explicit shutdown. Replies to WebSocket pings.
async fn drive_transport(
    ws_stream: WsStream,
    context: &SupervisorContext,
    shutdown: &mut watch::Receiver<bool>,
    attempt: &mut u32,
) -> TransportEnd {
    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    handle_payload(text.as_bytes(), context, attempt);
                }
                Some(Ok(Message::Binary(data))) => {
                    handle_payload(&data, context, attempt);
                }
                Some(Ok(Message::Ping(data))) => {
                    debug!("received ping, sending pong");
                    if let Err(error) = write.send(Message::Pong(data)).await {
                        let _ = context.events.send(ConnectionEvent::Close(CloseInfo::default()));
                        return TransportEnd::Failed(Error::WebSocket(error));
                    }
                }
                Some(Ok(Message::Pong(_))) | Some(Ok(Message::Frame(_))) => {}
                Some(Ok(Message::Close(frame))) => {
                    info!("received close frame");
                    let info = frame
                        .map(|f| CloseInfo {
                            code: Some(u16::from(f.code)),
                            reason: Some(f.reason.into_owned()),
                        })
                        .unwrap_or_default();
                    let _ = context.events.send(ConnectionEvent::Close(info));
                    return TransportEnd::Failed(Error::ConnectionFailed {
                        attempts: *attempt + 1,
                        last_error: "closed by server".to_string(),
                    });
                }
                Some(Err(error)) => {
                    warn!(%error, "WebSocket error");
                    let _ = context.events.send(ConnectionEvent::Close(CloseInfo::default()));
                    return TransportEnd::Failed(Error::WebSocket(error));
                }
                None => {
                    info!("WebSocket stream ended");
                    let _ = context.events.send(ConnectionEvent::Close(CloseInfo::default()));
                    return TransportEnd::Failed(Error::ConnectionFailed {
                        attempts: *attempt + 1,
                        last_error: "stream ended".to_string(),
                    });
                }
            },

            _ = shutdown.changed() => {
                debug!("shutdown requested, closing transport");
                let _ = write.close().await;
                return TransportEnd::Shutdown;
            }
        }
    }
}

/// Decode one raw frame payload and publish the outcome.
///
/// A malformed frame surfaces as a non-fatal `Error` event; it never tears
/// down the transport. Successful traffic clears the backoff state.
fn handle_payload(payload: &[u8], context: &SupervisorContext, attempt: &mut u32) {
    match serde_json::from_slice::<ClientMessage>(payload) {
        Ok(message) => {
            *attempt = 0;
            let _ = context.events.send(ConnectionEvent::Data(message));
        }
        Err(source) => {
            let error = Error::Decode {
                context: payload_preview(payload),
                source,
            };
            warn!(%error, "dropping malformed frame");
            let _ = context
                .events
                .send(ConnectionEvent::Error(ErrorNotice::from_error(&error)));
        }
    }
}

fn payload_preview(payload: &[u8]) -> String {
    const PREVIEW_LIMIT: usize = 120;
    let text = String::from_utf8_lossy(&payload[..payload.len().min(PREVIEW_LIMIT)]);
    if payload.len() > PREVIEW_LIMIT {
        format!("{text}...")
    } else {
        text.into_owned()
    }
}
