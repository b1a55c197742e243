use serde_json::Value;
use tokio_tungstenite::tungstenite;

pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors produced by the socket, channels and the comment client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid socket url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("unsupported url scheme `{0}`, expected ws")]
    UnsupportedScheme(String),

    #[error("socket url has no host")]
    MissingHost,

    #[error("tcp connection failed: {0}")]
    Connect(#[source] std::io::Error),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("malformed message: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("socket is not connected")]
    NotConnected,

    #[error("request message has no ref")]
    MissingRef,

    #[error("socket closed before a reply arrived")]
    Closed,

    #[error("join rejected: {0}")]
    JoinRejected(Value),

    #[error("channel `{0}` was already joined")]
    AlreadyJoined(String),

    #[error("channel has not been joined")]
    NotJoined,

    #[error("no element matches `{0}`")]
    MissingElement(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}
