//! Phoenix channels client for a comment thread.
//!
//! [`Socket`] owns the WebSocket connection, [`Channel`] scopes traffic to a
//! topic, and [`CommentClient`] wires them to a [`Page`].

pub mod channel;
pub mod comments;
pub mod config;
pub mod error;
pub mod socket;

pub use channel::Channel;
pub use comments::{
    COMMENT_ADD, Comment, CommentClient, Escaping, JoinOutcome, MemoryPage, Page,
    comments_topic, render_comments,
};
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use socket::Socket;
