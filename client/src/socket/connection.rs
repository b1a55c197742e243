//! Socket Connection
//!
//! Owns the single WebSocket connection to the channel server. The
//! connection is driven by three tasks: a writer draining the outbound
//! queue, a reader routing replies to their pending requests, and a
//! heartbeat ticker.

use futures_util::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as Frame;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use url::Url;

use crate::channel::Channel;
use crate::error::{ClientError, Result};
use crate::socket::message::{Message, PHX_CLOSE, PHX_ERROR, PHX_REPLY, Reply};

/// Socket ready states (matching the browser WebSocket API)
pub const SOCKET_CONNECTING: u32 = 0;
pub const SOCKET_OPEN: u32 = 1;
pub const SOCKET_CLOSING: u32 = 2;
pub const SOCKET_CLOSED: u32 = 3;

/// State shared between the socket handle and its background tasks
struct SocketShared {
    ready_state: AtomicU32,
    next_ref: AtomicU64,
    outbound: Mutex<Option<mpsc::UnboundedSender<String>>>,
    pending: Mutex<HashMap<String, oneshot::Sender<Result<Reply>>>>,
    writer: Mutex<Option<JoinHandle<()>>>,
}

impl SocketShared {
    fn outbound(&self) -> MutexGuard<'_, Option<mpsc::UnboundedSender<String>>> {
        self.outbound.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn pending(&self) -> MutexGuard<'_, HashMap<String, oneshot::Sender<Result<Reply>>>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn writer(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.writer.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Mark the socket closed and fail every request still awaiting a reply.
    fn mark_closed(&self) {
        self.ready_state.store(SOCKET_CLOSED, Ordering::SeqCst);
        self.outbound().take();
        let dropped = self.pending().drain().count();
        if dropped > 0 {
            log::debug!("[Socket] Dropped {} pending replies", dropped);
        }
    }
}

/// A cheap-to-clone handle on the channel server connection.
#[derive(Clone)]
pub struct Socket {
    url: Url,
    heartbeat_interval: Duration,
    shared: Arc<SocketShared>,
}

impl Socket {
    pub fn new(url: Url, heartbeat_interval: Duration) -> Self {
        Self {
            url,
            heartbeat_interval,
            shared: Arc::new(SocketShared {
                ready_state: AtomicU32::new(SOCKET_CLOSED),
                next_ref: AtomicU64::new(1),
                outbound: Mutex::new(None),
                pending: Mutex::new(HashMap::new()),
                writer: Mutex::new(None),
            }),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn ready_state(&self) -> u32 {
        self.shared.ready_state.load(Ordering::SeqCst)
    }

    pub fn is_connected(&self) -> bool {
        self.ready_state() == SOCKET_OPEN
    }

    /// Create a channel handle for `topic` on this socket.
    pub fn channel(&self, topic: impl Into<String>) -> Channel {
        Channel::new(topic.into(), self.clone())
    }

    /// Open the connection and start the background tasks.
    ///
    /// Calling this on an already open socket is a no-op. Failures are
    /// returned as-is; the socket does not retry.
    pub async fn connect(&self) -> Result<()> {
        if self.is_connected() {
            return Ok(());
        }

        let shared = &self.shared;
        shared.ready_state.store(SOCKET_CONNECTING, Ordering::SeqCst);

        let result = self.open().await;
        if result.is_err() {
            shared.ready_state.store(SOCKET_CLOSED, Ordering::SeqCst);
        }
        result
    }

    async fn open(&self) -> Result<()> {
        if self.url.scheme() != "ws" {
            return Err(ClientError::UnsupportedScheme(self.url.scheme().to_string()));
        }
        let host = self.url.host_str().ok_or(ClientError::MissingHost)?;
        let port = self.url.port_or_known_default().unwrap_or(80);
        let addr = format!("{}:{}", host, port);

        log::info!("[Socket] Connecting TCP to {}", addr);
        let tcp_stream = TcpStream::connect(&addr)
            .await
            .map_err(ClientError::Connect)?;

        let request = self.url.as_str().into_client_request()?;

        log::info!("[Socket] Performing WebSocket handshake on {}", self.url.path());
        let (ws_stream, response) = tokio_tungstenite::client_async(request, tcp_stream).await?;
        log::info!(
            "[Socket] Connected successfully (status: {})",
            response.status()
        );

        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        *self.shared.outbound() = Some(tx);
        self.shared.ready_state.store(SOCKET_OPEN, Ordering::SeqCst);

        let (mut write, mut read) = ws_stream.split();

        // Forward outgoing frames until every sender is gone, then close
        let writer = tokio::spawn(async move {
            while let Some(text) = rx.recv().await {
                if let Err(e) = write.send(Frame::Text(text.into())).await {
                    log::error!("[Socket] Send error: {}", e);
                    break;
                }
            }
            if let Err(e) = write.close().await {
                log::debug!("[Socket] Close error: {}", e);
            }
        });
        *self.shared.writer() = Some(writer);

        let shared = self.shared.clone();
        tokio::spawn(async move {
            while let Some(frame) = read.next().await {
                match frame {
                    Ok(Frame::Text(text)) => {
                        log::debug!("[Socket] Received {} bytes", text.len());
                        match Message::decode(text.as_str()) {
                            Ok(message) => dispatch(&shared, message),
                            Err(e) => log::warn!("[Socket] Skipping undecodable frame: {}", e),
                        }
                    }
                    Ok(Frame::Binary(data)) => {
                        log::debug!("[Socket] Ignoring binary frame ({} bytes)", data.len());
                    }
                    Ok(Frame::Ping(_)) | Ok(Frame::Pong(_)) | Ok(Frame::Frame(_)) => {}
                    Ok(Frame::Close(frame)) => {
                        let (code, reason) = frame
                            .map(|f| (f.code.into(), f.reason.to_string()))
                            .unwrap_or((1000u16, String::new()));
                        log::info!("[Socket] Received close: {} {}", code, reason);
                        break;
                    }
                    Err(e) => {
                        log::error!("[Socket] Read error: {}", e);
                        break;
                    }
                }
            }
            shared.mark_closed();
            log::info!("[Socket] Connection ended");
        });

        let heartbeat = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(heartbeat.heartbeat_interval);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if !heartbeat.is_connected() {
                    break;
                }
                let message = Message::heartbeat(heartbeat.make_ref());
                if let Err(e) = heartbeat.send(&message) {
                    log::warn!("[Socket] Heartbeat failed: {}", e);
                    break;
                }
            }
        });

        Ok(())
    }

    /// Allocate the next message ref.
    pub fn make_ref(&self) -> String {
        self.shared.next_ref.fetch_add(1, Ordering::SeqCst).to_string()
    }

    /// Queue a message without waiting for a reply.
    pub fn send(&self, message: &Message) -> Result<()> {
        let text = message.encode()?;
        let outbound = self.shared.outbound();
        let sender = match outbound.as_ref() {
            Some(sender) if self.is_connected() => sender,
            _ => return Err(ClientError::NotConnected),
        };
        log::debug!(
            "[Socket] Sending {} on {} (ref {:?})",
            message.event,
            message.topic,
            message.msg_ref
        );
        sender.send(text).map_err(|_| ClientError::NotConnected)
    }

    /// Queue a message and return a receiver resolving with its reply.
    ///
    /// The message must carry a ref. A reply that cannot be decoded resolves
    /// with the codec error; if the socket closes first the sender is dropped.
    pub fn request(&self, message: &Message) -> Result<oneshot::Receiver<Result<Reply>>> {
        let msg_ref = message.msg_ref.clone().ok_or(ClientError::MissingRef)?;
        let (tx, rx) = oneshot::channel();
        self.shared.pending().insert(msg_ref.clone(), tx);

        if let Err(e) = self.send(message) {
            self.shared.pending().remove(&msg_ref);
            return Err(e);
        }
        Ok(rx)
    }

    /// Close the connection once every queued frame has been written.
    ///
    /// Resolves after the writer has sent the close frame. Pending requests
    /// fail with `Closed` when the server acknowledges the close.
    pub async fn disconnect(&self) {
        if self.ready_state() != SOCKET_OPEN {
            return;
        }
        log::info!("[Socket] Closing");
        self.shared.ready_state.store(SOCKET_CLOSING, Ordering::SeqCst);
        // Dropping the sender lets the writer flush and send a close frame
        self.shared.outbound().take();

        let writer = self.shared.writer().take();
        if let Some(writer) = writer {
            if let Err(e) = writer.await {
                log::warn!("[Socket] Writer task failed: {}", e);
            }
        }
    }
}

/// Route an inbound message.
fn dispatch(shared: &SocketShared, message: Message) {
    match message.event.as_str() {
        PHX_REPLY => {
            let waiter = message
                .msg_ref
                .as_ref()
                .and_then(|r| shared.pending().remove(r));
            let Some(waiter) = waiter else {
                log::debug!(
                    "[Socket] Reply for {} with no pending request (ref {:?})",
                    message.topic,
                    message.msg_ref
                );
                return;
            };
            let reply = Reply::from_payload(message.payload);
            if let Err(e) = &reply {
                log::warn!("[Socket] Malformed reply on {}: {}", message.topic, e);
            }
            let _ = waiter.send(reply);
        }
        PHX_ERROR | PHX_CLOSE => {
            log::warn!("[Socket] Channel {} reported {}", message.topic, message.event);
        }
        _ => {
            log::debug!(
                "[Socket] Unhandled {} event on {}",
                message.event,
                message.topic
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn socket(url: &str) -> Socket {
        Socket::new(Url::parse(url).unwrap(), Duration::from_secs(30))
    }

    #[test]
    fn test_refs_are_sequential() {
        let socket = socket("ws://localhost:4000/socket/websocket");
        assert_eq!(socket.make_ref(), "1");
        assert_eq!(socket.make_ref(), "2");
        assert_eq!(socket.clone().make_ref(), "3");
    }

    #[test]
    fn test_send_requires_connection() {
        let socket = socket("ws://localhost:4000/socket/websocket");
        assert_eq!(socket.ready_state(), SOCKET_CLOSED);
        let result = socket.send(&Message::heartbeat(socket.make_ref()));
        assert!(matches!(result, Err(ClientError::NotConnected)));
    }

    #[test]
    fn test_failed_request_leaves_nothing_pending() {
        let socket = socket("ws://localhost:4000/socket/websocket");
        let result = socket.request(&Message::heartbeat(socket.make_ref()));
        assert!(result.is_err());
        assert!(socket.shared.pending().is_empty());
    }

    #[tokio::test]
    async fn test_disconnect_when_closed_is_a_no_op() {
        let socket = socket("ws://localhost:4000/socket/websocket");
        socket.disconnect().await;
        assert_eq!(socket.ready_state(), SOCKET_CLOSED);
    }

    #[tokio::test]
    async fn test_malformed_reply_reaches_the_waiter() {
        let socket = socket("ws://localhost:4000/socket/websocket");
        let (tx, rx) = oneshot::channel();
        socket.shared.pending().insert("4".to_string(), tx);

        let reply = Message::new(
            Some("4".into()),
            Some("4".into()),
            "comments:1",
            PHX_REPLY,
            serde_json::json!({"status": "timeout", "response": {}}),
        );
        dispatch(&socket.shared, reply);

        assert!(matches!(rx.await, Ok(Err(ClientError::Codec(_)))));
        assert!(socket.shared.pending().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_secure_scheme() {
        let socket = socket("wss://localhost:4000/socket/websocket");
        let result = socket.connect().await;
        assert!(matches!(result, Err(ClientError::UnsupportedScheme(s)) if s == "wss"));
        assert_eq!(socket.ready_state(), SOCKET_CLOSED);
    }
}
