//! Text-to-time alignment.
//!
//! A clip is a slice of the full text, identified by its character offset.
//! Its start time is the start of the word covering its first character and
//! its end time is the end of the word covering its last character.
//!
//! Cursor positions do not line up 1:1 with word tokens (transcriptions drop
//! punctuation and whitespace), so a position with no exact entry resolves to
//! the nearest *preceding* word. Under-shooting keeps slightly more audio;
//! over-shooting would cut into the wrong phrase.

use crate::index::{IndexHit, WordIndex};
use crate::types::{TimeOffset, TimeRange, TranscriptSegment};

/// `false` when the transcription only carries segment-level timing.
///
/// Callers skip fine-grained resolution in that case and use
/// [`whole_range`] instead.
pub fn has_word_timestamps(segments: &[TranscriptSegment]) -> bool {
    segments.first().is_some_and(TranscriptSegment::has_words)
}

pub fn whole_range(duration: f64) -> TimeRange {
    TimeRange::new(0.0, duration.max(0.0))
}

/// Resolve a clip against `segments`, rebuilding the index.
///
/// Prefer [`TimeRangeResolver`] when resolving several clips against the same
/// segments.
pub fn resolve(
    full_text: &str,
    clip_text: &str,
    clip_start_offset: usize,
    segments: &[TranscriptSegment],
    time_offset: TimeOffset,
) -> TimeRange {
    TimeRangeResolver::new(segments).resolve(full_text, clip_text, clip_start_offset, time_offset)
}

pub struct TimeRangeResolver<'a> {
    segments: &'a [TranscriptSegment],
    index: WordIndex<'a>,
}

impl<'a> TimeRangeResolver<'a> {
    pub fn new(segments: &'a [TranscriptSegment]) -> Self {
        Self {
            segments,
            index: WordIndex::new(segments),
        }
    }

    pub fn index(&self) -> &WordIndex<'a> {
        &self.index
    }

    pub fn resolve(
        &self,
        full_text: &str,
        clip_text: &str,
        clip_start_offset: usize,
        time_offset: TimeOffset,
    ) -> TimeRange {
        let clip_len = clip_text.chars().count();
        let clip_end_offset = (clip_start_offset + clip_len).saturating_sub(1);

        let full_len = full_text.chars().count();
        if clip_start_offset + clip_len > full_len {
            tracing::debug!(
                clip_start_offset,
                clip_len,
                full_len,
                "clip_exceeds_full_text"
            );
        }

        let candidate = match (
            self.index.lookup(clip_start_offset),
            self.index.lookup(clip_end_offset),
        ) {
            (Some(start), Some(end)) => {
                trace_fallback("start", clip_start_offset, &start);
                trace_fallback("end", clip_end_offset, &end);
                TimeRange::new(start.entry().word.start_time, end.entry().word.end_time)
            }
            _ => TimeRange::new(0.0, self.last_word_end()),
        };

        candidate.shrink(time_offset)
    }

    fn last_word_end(&self) -> f64 {
        self.segments
            .last()
            .and_then(|s| s.words.last())
            .map_or(0.0, |w| w.end_time)
    }
}

fn trace_fallback(boundary: &'static str, position: usize, hit: &IndexHit<'_>) {
    if !hit.is_exact() {
        tracing::debug!(
            boundary,
            position,
            resolved = hit.entry().global_char_index,
            word = %hit.entry().word.text,
            "alignment_fallback"
        );
    }
}
