//! Channel Wire Protocol
//!
//! Messages travel as JSON arrays in the v2 serializer layout:
//! `[join_ref, ref, topic, event, payload]`.

use serde::Deserialize;
use serde_json::Value;

use crate::error::Result;

/// Serializer version advertised in the connection url.
pub const PROTOCOL_VSN: &str = "2.0.0";

/// Topic used for socket level traffic such as heartbeats.
pub const PHOENIX_TOPIC: &str = "phoenix";

pub const PHX_JOIN: &str = "phx_join";
pub const PHX_REPLY: &str = "phx_reply";
pub const PHX_ERROR: &str = "phx_error";
pub const PHX_CLOSE: &str = "phx_close";
pub const HEARTBEAT: &str = "heartbeat";

/// A single frame exchanged with the server.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub join_ref: Option<String>,
    pub msg_ref: Option<String>,
    pub topic: String,
    pub event: String,
    pub payload: Value,
}

impl Message {
    pub fn new(
        join_ref: Option<String>,
        msg_ref: Option<String>,
        topic: impl Into<String>,
        event: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self {
            join_ref,
            msg_ref,
            topic: topic.into(),
            event: event.into(),
            payload,
        }
    }

    /// Build a heartbeat frame for the given ref.
    pub fn heartbeat(msg_ref: String) -> Self {
        Self::new(
            None,
            Some(msg_ref),
            PHOENIX_TOPIC,
            HEARTBEAT,
            Value::Object(Default::default()),
        )
    }

    pub fn encode(&self) -> Result<String> {
        let frame = (
            &self.join_ref,
            &self.msg_ref,
            &self.topic,
            &self.event,
            &self.payload,
        );
        Ok(serde_json::to_string(&frame)?)
    }

    pub fn decode(text: &str) -> Result<Self> {
        let (join_ref, msg_ref, topic, event, payload): (
            Option<String>,
            Option<String>,
            String,
            String,
            Value,
        ) = serde_json::from_str(text)?;

        Ok(Self {
            join_ref,
            msg_ref,
            topic,
            event,
            payload,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyStatus {
    Ok,
    Error,
}

/// Payload carried by a `phx_reply` event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Reply {
    pub status: ReplyStatus,
    #[serde(default)]
    pub response: Value,
}

impl Reply {
    pub fn from_payload(payload: Value) -> Result<Self> {
        Ok(serde_json::from_value(payload)?)
    }

    pub fn is_ok(&self) -> bool {
        self.status == ReplyStatus::Ok
    }
}
