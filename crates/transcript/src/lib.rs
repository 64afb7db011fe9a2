mod error;
pub mod id;
pub mod index;
pub mod input;
pub mod resolve;
pub mod types;

pub use error::*;
pub use id::{IdGenerator, SequentialIdGen, UuidIdGen};
pub use index::{IndexHit, WordIndex};
pub use input::{TaskPayload, VideoInfo, WireSegment, WireWord};
pub use resolve::{TimeRangeResolver, has_word_timestamps, resolve, whole_range};
pub use types::{CharacterIndexEntry, TimeOffset, TimeRange, TranscribedWord, TranscriptSegment};
