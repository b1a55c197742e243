//! # Comment Channel Client
//!
//! Joins the `comments:<id>` topic of a channel server, renders the comments
//! sent back on join into a [`Page`], and pushes new comments from the
//! page's comment form.
//!
//! ## Example
//!
//! ```no_run
//! use comment_channel::{ClientConfig, CommentClient, MemoryPage};
//!
//! # async fn run() -> comment_channel::Result<()> {
//! let config = ClientConfig::default()
//!     .with_token("user-token")
//!     .with_topic_id("42");
//! let page = MemoryPage::for_config(&config);
//!
//! let mut client = CommentClient::new(config, page)?;
//! client.start().await?;
//! client.submit("hello")?;
//! # Ok(())
//! # }
//! ```

mod client;
mod page;
mod render;

use serde::{Deserialize, Serialize};

pub use client::{CommentClient, JoinOutcome};
pub use page::{MemoryPage, Page};
pub use render::{Escaping, render_comments};

/// Event pushed when the comment form is submitted.
pub const COMMENT_ADD: &str = "comment:add";

/// A single comment as sent by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub content: String,
}

impl Comment {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// Response body of a successful comment topic join.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JoinResponse {
    #[serde(default)]
    pub comments: Vec<Comment>,
}

/// Topic name for the comment thread identified by `topic_id`.
pub fn comments_topic(topic_id: &str) -> String {
    format!("comments:{}", topic_id)
}
