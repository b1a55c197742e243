//! Channel Socket
//!
//! A single WebSocket connection to a Phoenix-style channel server,
//! built on tokio-tungstenite. Channels multiplex over this socket.

mod connection;
pub mod message;

pub use connection::{SOCKET_CLOSED, SOCKET_CLOSING, SOCKET_CONNECTING, SOCKET_OPEN, Socket};
pub use message::{Message, Reply, ReplyStatus};
