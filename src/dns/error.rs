use thiserror::Error;

/// Errors raised while reading or writing DNS wire format.
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    #[error("message is shorter than a DNS header")]
    TruncatedHeader,
    #[error("message ended before question section was complete")]
    TruncatedQuestion,
    #[error("domain name label exceeds 63 bytes or is otherwise malformed")]
    InvalidLabel,
    #[error("domain name label is not valid UTF-8")]
    InvalidLabelEncoding,
    #[error("bit stream error: {0}")]
    BitStream(String),
}

impl From<std::io::Error> for ParseError {
    fn from(err: std::io::Error) -> Self {
        ParseError::BitStream(err.to_string())
    }
}
