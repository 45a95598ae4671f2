use std::sync::Arc;
use thiserror::Error;

/// Errors raised while parsing or validating crate configuration.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("invalid max notify concurrency: {0}")]
    InvalidMaxNotifyNum(String),
    #[error("invalid max notify retry count: {0}")]
    InvalidMaxNotifyTryNum(String),
    #[error("invalid notify timeout: {0}")]
    InvalidNotifyTimeout(String),
    #[error("invalid idle sleep time: {0}")]
    InvalidIdleSleepTime(String),
    #[error("configuration parse error: {0}")]
    ParseError(String),
}

/// Unified error type for the notify-out crate.
///
/// Per spec, `send_notify` itself never surfaces one of these to its
/// caller — unknown zones and empty slave sets are silent no-ops. These
/// variants cover the sub-operations (socket bind, config load) that can
/// genuinely fail and are logged/handled internally.
#[derive(Debug, Clone, Error)]
pub enum NotifyError {
    #[error("IO error: {0}")]
    Io(Arc<std::io::Error>),
    #[error("failed to bind notify socket: {0}")]
    SocketBind(Arc<std::io::Error>),
    #[error("zone not found: {0}")]
    ZoneNotFound(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Zone(#[from] crate::zone::ZoneError),
    #[error(transparent)]
    Parse(#[from] crate::dns::ParseError),
}

impl From<std::io::Error> for NotifyError {
    fn from(err: std::io::Error) -> Self {
        NotifyError::Io(Arc::new(err))
    }
}

pub type Result<T> = std::result::Result<T, NotifyError>;
