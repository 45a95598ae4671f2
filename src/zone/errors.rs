use thiserror::Error;

/// Zone-related errors.
#[derive(Debug, Clone, Error)]
pub enum ZoneError {
    #[error("invalid record: {0}")]
    InvalidRecord(String),
    #[error("zone missing required SOA record")]
    MissingSOA,
    #[error("zone not found: {0}")]
    ZoneNotFound(String),
    #[error("invalid resource record type: {0}")]
    InvalidRRType(String),
}

pub type Result<T> = std::result::Result<T, ZoneError>;
