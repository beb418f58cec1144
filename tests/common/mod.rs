//! Common test utilities for ws-hub-client integration tests
//!
//! Provides mock backends: a scripted WebSocket hub, a handshake-rejecting
//! listener, and a one-shot HTTP snapshot responder.

use std::net::SocketAddr;
use std::sync::Once;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;

static TRACING: Once = Once::new();

/// Install a test subscriber once per process; `RUST_LOG` controls output.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A scripted mock hub.
///
/// Every accepted client completes a WebSocket handshake and receives the
/// configured frames in order. Depending on the mode, the server then holds
/// the connection open until the client closes, or closes it immediately to
/// force a reconnect on the client side.
pub struct MockWsServer {
    pub addr: SocketAddr,
    shutdown: Arc<Notify>,
}

impl MockWsServer {
    /// Start a server that sends `frames` to each client, then holds the
    /// connection open.
    pub async fn start(frames: Vec<String>) -> Self {
        Self::start_with_mode(frames, true).await
    }

    /// Start a server that sends `frames` to each client, then closes the
    /// connection from the server side.
    pub async fn start_closing(frames: Vec<String>) -> Self {
        Self::start_with_mode(frames, false).await
    }

    async fn start_with_mode(frames: Vec<String>, hold_open: bool) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(Notify::new());
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        match result {
                            Ok((stream, _)) => {
                                let frames = frames.clone();
                                let shutdown = shutdown_clone.clone();
                                tokio::spawn(async move {
                                    Self::handle_connection(stream, frames, hold_open, shutdown)
                                        .await;
                                });
                            }
                            Err(_) => break,
                        }
                    }
                    _ = shutdown_clone.notified() => break,
                }
            }
        });

        Self { addr, shutdown }
    }

    async fn handle_connection(
        stream: TcpStream,
        frames: Vec<String>,
        hold_open: bool,
        shutdown: Arc<Notify>,
    ) {
        use futures_util::{SinkExt, StreamExt};
        use tokio_tungstenite::accept_async;
        use tokio_tungstenite::tungstenite::Message;

        let ws_stream = match accept_async(stream).await {
            Ok(ws) => ws,
            Err(_) => return,
        };

        let (mut write, mut read) = ws_stream.split();

        for frame in frames {
            if write.send(Message::Text(frame)).await.is_err() {
                return;
            }
        }

        if !hold_open {
            let _ = write.send(Message::Close(None)).await;
            return;
        }

        loop {
            tokio::select! {
                msg = read.next() => match msg {
                    Some(Ok(msg)) if msg.is_close() => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) | None => break,
                },
                _ = shutdown.notified() => break,
            }
        }
    }

    /// The raw host entry to configure on the client.
    pub fn endpoint(&self) -> String {
        self.addr.to_string()
    }

    pub fn shutdown(&self) {
        self.shutdown.notify_waiters();
    }
}

impl Drop for MockWsServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// A listener that accepts TCP connections and immediately drops them, so
/// every WebSocket handshake against it fails. Counts accepted connections
/// for rotation assertions.
pub struct RejectingServer {
    pub addr: SocketAddr,
    attempts: Arc<AtomicUsize>,
    shutdown: Arc<Notify>,
}

impl RejectingServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let attempts = Arc::new(AtomicUsize::new(0));
        let shutdown = Arc::new(Notify::new());
        let attempts_clone = attempts.clone();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => match result {
                        Ok((stream, _)) => {
                            attempts_clone.fetch_add(1, Ordering::SeqCst);
                            drop(stream);
                        }
                        Err(_) => break,
                    },
                    _ = shutdown_clone.notified() => break,
                }
            }
        });

        Self {
            addr,
            attempts,
            shutdown,
        }
    }

    pub fn endpoint(&self) -> String {
        self.addr.to_string()
    }

    pub fn attempt_count(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Drop for RejectingServer {
    fn drop(&mut self) {
        self.shutdown.notify_waiters();
    }
}

/// Bind a port and release it, yielding an address that refuses connections.
///
/// Slightly racy if the OS reassigns the port, but reliable enough for
/// loopback tests.
pub async fn refused_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr.to_string()
}

/// A snapshot backend that answers every request with a fixed HTTP response,
/// then closes the connection.
pub struct MockHttpServer {
    pub addr: SocketAddr,
    shutdown: Arc<Notify>,
}

impl MockHttpServer {
    pub async fn start(status: u16, reason: &'static str, body: String) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(Notify::new());
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => match result {
                        Ok((stream, _)) => {
                            let body = body.clone();
                            tokio::spawn(async move {
                                Self::respond(stream, status, reason, body).await;
                            });
                        }
                        Err(_) => break,
                    },
                    _ = shutdown_clone.notified() => break,
                }
            }
        });

        Self { addr, shutdown }
    }

    async fn respond(mut stream: TcpStream, status: u16, reason: &str, body: String) {
        // Drain the request head before answering.
        let mut buffer = [0u8; 4096];
        let mut request = Vec::new();
        loop {
            match stream.read(&mut buffer).await {
                Ok(0) => return,
                Ok(n) => {
                    request.extend_from_slice(&buffer[..n]);
                    if request.windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }
                Err(_) => return,
            }
        }

        let response = format!(
            "HTTP/1.1 {status} {reason}\r\n\
             content-type: application/json\r\n\
             content-length: {}\r\n\
             connection: close\r\n\
             \r\n\
             {body}",
            body.len()
        );
        let _ = stream.write_all(response.as_bytes()).await;
        let _ = stream.shutdown().await;
    }

    pub fn endpoint(&self) -> String {
        self.addr.to_string()
    }
}

impl Drop for MockHttpServer {
    fn drop(&mut self) {
        self.shutdown.notify_waiters();
    }
}
