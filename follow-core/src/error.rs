use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("unexpected http status {status}")]
    Status { status: u16 },
    #[error("api error {code}: {}", message.as_deref().unwrap_or("no message"))]
    Api { code: i64, message: Option<String> },
}

impl ClientError {
    /// HTTP status carried by the failure, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status } => Some(*status),
            ClientError::Network(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no configuration directory available")]
    NoConfigDir,
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config format error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("clipboard unavailable: {0}")]
    Clipboard(String),
    #[error("failed to open {0}")]
    Open(String),
    #[error("operation not supported on this platform")]
    Unsupported,
}

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
