//! Channel
//!
//! A topic-scoped handle on a [`Socket`]. A channel is joined at most once;
//! pushes are only accepted after the join request has been issued.

use serde_json::Value;
use std::sync::OnceLock;

use crate::error::{ClientError, Result};
use crate::socket::Socket;
use crate::socket::message::{Message, PHX_JOIN};

pub struct Channel {
    topic: String,
    socket: Socket,
    join_ref: OnceLock<String>,
}

impl Channel {
    pub(crate) fn new(topic: String, socket: Socket) -> Self {
        Self {
            topic,
            socket,
            join_ref: OnceLock::new(),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Whether a join request has been issued on this channel.
    pub fn is_joined(&self) -> bool {
        self.join_ref.get().is_some()
    }

    /// Send `phx_join` and wait for the server's reply.
    ///
    /// Resolves with the reply's `response` on `ok`; an `error` reply becomes
    /// [`ClientError::JoinRejected`] carrying the response as the reason.
    pub async fn join(&self, params: Value) -> Result<Value> {
        if self.is_joined() {
            return Err(ClientError::AlreadyJoined(self.topic.clone()));
        }
        let join_ref = self.socket.make_ref();
        if self.join_ref.set(join_ref.clone()).is_err() {
            return Err(ClientError::AlreadyJoined(self.topic.clone()));
        }

        log::info!("[Channel {}] Joining (ref {})", self.topic, join_ref);
        let message = Message::new(
            Some(join_ref.clone()),
            Some(join_ref),
            self.topic.as_str(),
            PHX_JOIN,
            params,
        );
        let reply = self
            .socket
            .request(&message)?
            .await
            .map_err(|_| ClientError::Closed)??;

        if reply.is_ok() {
            Ok(reply.response)
        } else {
            Err(ClientError::JoinRejected(reply.response))
        }
    }

    /// Push an event on this channel without waiting for a reply.
    pub fn push(&self, event: &str, payload: Value) -> Result<()> {
        let join_ref = self.join_ref.get().ok_or(ClientError::NotJoined)?;
        let message = Message::new(
            Some(join_ref.clone()),
            Some(self.socket.make_ref()),
            self.topic.as_str(),
            event,
            payload,
        );
        self.socket.send(&message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use url::Url;

    fn channel(topic: &str) -> Channel {
        let url = Url::parse("ws://localhost:4000/socket/websocket").unwrap();
        Socket::new(url, Duration::from_secs(30)).channel(topic)
    }

    #[test]
    fn test_push_before_join_is_refused() {
        let channel = channel("comments:1");
        assert!(!channel.is_joined());
        let result = channel.push("comment:add", json!({"content": "hi"}));
        assert!(matches!(result, Err(ClientError::NotJoined)));
    }

    #[tokio::test]
    async fn test_second_join_is_refused() {
        let channel = channel("comments:1");
        // Not connected, so the first join fails on send but still claims the join
        assert!(matches!(
            channel.join(json!({})).await,
            Err(ClientError::NotConnected)
        ));
        assert!(matches!(
            channel.join(json!({})).await,
            Err(ClientError::AlreadyJoined(topic)) if topic == "comments:1"
        ));
    }

    #[tokio::test]
    async fn test_refused_join_does_not_consume_a_ref() {
        let channel = channel("comments:1");
        let _ = channel.join(json!({})).await;
        assert_eq!(channel.join_ref.get().map(String::as_str), Some("1"));

        let _ = channel.join(json!({})).await;
        assert_eq!(channel.socket.make_ref(), "2");
    }
}
