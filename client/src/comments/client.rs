use serde_json::{Value, json};

use crate::channel::Channel;
use crate::comments::{COMMENT_ADD, Comment, JoinResponse, Page, comments_topic, render_comments};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::socket::Socket;

/// Result of joining the comment topic.
#[derive(Debug, Clone, PartialEq)]
pub enum JoinOutcome {
    /// Joined; carries the initial batch of comments, already rendered.
    Joined(Vec<Comment>),
    /// The server refused the join; carries its reason.
    Rejected(Value),
    /// No topic identifier was available, so nothing was sent.
    Skipped,
}

/// Connects to the channel server, joins one comment topic and keeps a page
/// in sync with it.
pub struct CommentClient<P: Page> {
    config: ClientConfig,
    socket: Socket,
    page: P,
    channel: Option<Channel>,
}

impl<P: Page> CommentClient<P> {
    pub fn new(config: ClientConfig, page: P) -> Result<Self> {
        config.validate()?;
        let socket = Socket::new(config.socket_url()?, config.heartbeat_interval);
        Ok(Self {
            config,
            socket,
            page,
            channel: None,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn socket(&self) -> &Socket {
        &self.socket
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn channel(&self) -> Option<&Channel> {
        self.channel.as_ref()
    }

    /// Connect, then join the configured topic.
    pub async fn start(&mut self) -> Result<JoinOutcome> {
        self.connect().await?;
        let topic_id = self.config.topic_id.clone();
        self.join(topic_id.as_deref()).await
    }

    pub async fn connect(&self) -> Result<()> {
        self.socket.connect().await
    }

    /// Join `comments:<topic_id>` and render the comments it replies with.
    ///
    /// An absent or empty `topic_id` is skipped without touching the socket.
    /// A rejected join is logged and reported as [`JoinOutcome::Rejected`].
    pub async fn join(&mut self, topic_id: Option<&str>) -> Result<JoinOutcome> {
        let Some(topic_id) = topic_id.filter(|id| !id.is_empty()) else {
            log::debug!("No channel topic id, skipping join");
            return Ok(JoinOutcome::Skipped);
        };
        if let Some(channel) = &self.channel {
            return Err(ClientError::AlreadyJoined(channel.topic().to_string()));
        }

        let channel = self.socket.channel(comments_topic(topic_id));
        let result = channel.join(json!({})).await;
        self.channel = Some(channel);

        match result {
            Ok(response) => {
                log::info!("Joined successfully: {}", response);
                let response: JoinResponse = serde_json::from_value(response)?;
                self.render(&response.comments)?;
                Ok(JoinOutcome::Joined(response.comments))
            }
            Err(ClientError::JoinRejected(reason)) => {
                log::warn!("Unable to join: {}", reason);
                Ok(JoinOutcome::Rejected(reason))
            }
            Err(e) => Err(e),
        }
    }

    /// Push `comment:add` with `content`. Empty content is sent as-is.
    pub fn submit(&self, content: &str) -> Result<()> {
        let channel = self.channel.as_ref().ok_or(ClientError::NotJoined)?;
        log::debug!("Submitting comment ({} bytes)", content.len());
        channel.push(COMMENT_ADD, json!({ "content": content }))
    }

    /// Form submission handler: submit whatever is typed in the comment field.
    pub fn submit_form(&self) -> Result<()> {
        let content = self
            .page
            .field_value(&self.config.form_selector, &self.config.input_selector)?;
        self.submit(&content)
    }

    /// Replace the comment container with one list item per comment.
    pub fn render(&self, comments: &[Comment]) -> Result<()> {
        let html = render_comments(comments, self.config.escaping);
        self.page
            .set_inner_html(&self.config.container_selector, &html)
    }
}
