use crate::clip::ClipField;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("split would produce an empty clip")]
    EmptySplitRejected,
    #[error("at least one clip must remain")]
    MinimumClipCountViolation,
    #[error("clip not found: {0}")]
    ClipNotFound(String),
    #[error("cursor {cursor} is outside clip text of {len} characters")]
    CursorOutOfRange { cursor: usize, len: usize },
    #[error("{field} time {seconds} would invert clip range [{start}, {end}]")]
    InvertedRange {
        field: ClipField,
        seconds: f64,
        start: f64,
        end: f64,
    },
    #[error("time {0} is not a finite number of seconds")]
    NonFiniteTime(f64),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Time(#[from] hypr_timecode::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Storage(#[from] hypr_storage::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
