/// One recognized token with its transcription-provided timing, in seconds.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub struct TranscribedWord {
    pub text: String,
    pub start_time: f64,
    pub end_time: f64,
    pub probability: f64,
}

impl TranscribedWord {
    pub fn new(text: impl Into<String>, start_time: f64, end_time: f64) -> Self {
        Self {
            text: text.into(),
            start_time,
            end_time,
            probability: 1.0,
        }
    }
}

/// A contiguous span of speech. Concatenating `words[].text` across all
/// segments, in order, reconstructs the text the character index is built on.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub struct TranscriptSegment {
    pub id: i64,
    pub start_time: f64,
    pub end_time: f64,
    pub text: String,
    pub words: Vec<TranscribedWord>,
}

impl TranscriptSegment {
    pub fn has_words(&self) -> bool {
        !self.words.is_empty()
    }
}

/// One character of one word, positioned in the concatenated word text.
///
/// Positions count `char`s, not bytes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacterIndexEntry<'a> {
    pub character: char,
    pub global_char_index: usize,
    pub word: &'a TranscribedWord,
    pub segment_index: usize,
    pub word_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    pub start_time: f64,
    pub end_time: f64,
}

impl TimeRange {
    pub fn new(start_time: f64, end_time: f64) -> Self {
        Self {
            start_time,
            end_time,
        }
    }

    pub fn duration(&self) -> f64 {
        (self.end_time - self.start_time).max(0.0)
    }

    /// Push the start later and pull the end earlier by `offset`, keeping
    /// `start >= 0` and `end >= start`.
    pub fn shrink(self, offset: TimeOffset) -> Self {
        let start_time = (self.start_time + offset.seconds()).max(0.0);
        let end_time = (self.end_time - offset.seconds()).max(start_time);
        Self {
            start_time,
            end_time,
        }
    }
}

/// Symmetric boundary correction applied to resolved clip ranges.
///
/// Always within `0.0..=10.0` seconds at one-decimal granularity.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, serde::Serialize, serde::Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct TimeOffset(f64);

impl TimeOffset {
    pub const MAX_SECONDS: f64 = 10.0;
    pub const ZERO: TimeOffset = TimeOffset(0.0);

    pub fn new(seconds: f64) -> Self {
        if !seconds.is_finite() {
            return Self::ZERO;
        }
        let clamped = seconds.clamp(0.0, Self::MAX_SECONDS);
        Self((clamped * 10.0).round() / 10.0)
    }

    pub fn seconds(self) -> f64 {
        self.0
    }
}

impl From<f64> for TimeOffset {
    fn from(seconds: f64) -> Self {
        Self::new(seconds)
    }
}

impl From<TimeOffset> for f64 {
    fn from(offset: TimeOffset) -> Self {
        offset.0
    }
}
