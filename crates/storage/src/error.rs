#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("data directory not available")]
    DataDirUnavailable,
    #[error("path must be absolute")]
    PathNotAbsolute,
    #[error("invalid session id: {0:?}")]
    InvalidSessionId(String),
}

pub type Result<T> = std::result::Result<T, Error>;
