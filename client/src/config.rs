use std::time::Duration;
use url::Url;

use crate::comments::Escaping;
use crate::error::{ClientError, Result};
use crate::socket::message::PROTOCOL_VSN;

pub const ENV_BASE_URL: &str = "COMMENTS_BASE_URL";
pub const ENV_SOCKET_PATH: &str = "COMMENTS_SOCKET_PATH";
pub const ENV_USER_TOKEN: &str = "USER_TOKEN";
pub const ENV_TOPIC_ID: &str = "CHANNEL_TOPIC_ID";
pub const ENV_HEARTBEAT_SECS: &str = "HEARTBEAT_INTERVAL_SECS";

/// Everything the comment client needs from its hosting page.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub socket_path: String,
    /// Bearer token sent as the `token` connection parameter.
    pub token: Option<String>,
    /// Identifier of the comment thread; no channel is joined without one.
    pub topic_id: Option<String>,
    pub form_selector: String,
    pub input_selector: String,
    pub container_selector: String,
    pub heartbeat_interval: Duration,
    pub escaping: Escaping,
}

impl ClientConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_socket_path(mut self, socket_path: impl Into<String>) -> Self {
        self.socket_path = socket_path.into();
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_topic_id(mut self, topic_id: impl Into<String>) -> Self {
        self.topic_id = Some(topic_id.into());
        self
    }

    pub fn with_selectors(
        mut self,
        form: impl Into<String>,
        input: impl Into<String>,
        container: impl Into<String>,
    ) -> Self {
        self.form_selector = form.into();
        self.input_selector = input.into();
        self.container_selector = container.into();
        self
    }

    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    pub fn with_escaping(mut self, escaping: Escaping) -> Self {
        self.escaping = escaping;
        self
    }

    /// Defaults overridden by any of the `COMMENTS_*`, `USER_TOKEN`,
    /// `CHANNEL_TOPIC_ID` and `HEARTBEAT_INTERVAL_SECS` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(base_url) = lookup(ENV_BASE_URL) {
            config.base_url = base_url;
        }
        if let Some(socket_path) = lookup(ENV_SOCKET_PATH) {
            config.socket_path = socket_path;
        }
        config.token = lookup(ENV_USER_TOKEN);
        config.topic_id = lookup(ENV_TOPIC_ID);

        if let Some(secs) = lookup(ENV_HEARTBEAT_SECS) {
            let secs = secs.parse::<u64>().map_err(|e| {
                ClientError::Config(format!("{} must be whole seconds: {}", ENV_HEARTBEAT_SECS, e))
            })?;
            config.heartbeat_interval = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.heartbeat_interval.is_zero() {
            return Err(ClientError::Config(
                "heartbeat interval must be non-zero".to_string(),
            ));
        }
        self.socket_url().map(|_| ())
    }

    /// Transport url: `<base_url><socket_path>/websocket?token=..&vsn=2.0.0`.
    pub fn socket_url(&self) -> Result<Url> {
        let base = Url::parse(&self.base_url)?;
        let path = format!("{}/websocket", self.socket_path.trim_end_matches('/'));
        let mut url = base.join(&path)?;

        {
            let mut query = url.query_pairs_mut();
            if let Some(token) = &self.token {
                query.append_pair("token", token);
            }
            query.append_pair("vsn", PROTOCOL_VSN);
        }

        Ok(url)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "ws://localhost:4000".to_string(),
            socket_path: "/socket".to_string(),
            token: None,
            topic_id: None,
            form_selector: "#new-comment".to_string(),
            input_selector: "textarea".to_string(),
            container_selector: "#comments".to_string(),
            heartbeat_interval: Duration::from_secs(30),
            escaping: Escaping::Html,
        }
    }
}
