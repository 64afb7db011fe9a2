#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("invalid time format: {0:?}")]
    InvalidTimeFormat(String),
    #[error("seconds must be below 60, got {0}")]
    InvalidSeconds(u64),
}

pub type Result<T> = std::result::Result<T, Error>;
