//! Splitting one clip into two at a text cursor.
//!
//! A clip's position in the full text is the summed character length of every
//! clip before it. That model silently desyncs once a clip's text is edited
//! independently of the transcript, so every split also checks the clip texts
//! against the full text and reports a [`AlignmentDiagnostic`] when they
//! disagree. The split itself still uses the summed offsets.

use hypr_transcript::{
    IdGenerator, TimeOffset, TimeRange, TimeRangeResolver, TranscriptSegment,
    has_word_timestamps, whole_range,
};

use crate::clip::{Clip, derive_title};
use crate::{Error, Result};

/// Everything about the transcript a split needs besides the clips.
#[derive(Debug, Clone, Copy)]
pub struct SplitContext<'a> {
    pub full_text: &'a str,
    pub segments: &'a [TranscriptSegment],
    pub time_offset: TimeOffset,
    pub media_duration: f64,
    pub title_max_chars: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SplitOutcome {
    /// New clip covering the text before the cursor, inserted before `tail`.
    pub head: Clip,
    /// The original clip (same id) now holding the text after the cursor.
    pub tail: Clip,
    /// Where the playback surface should seek after the split.
    pub seek_to: f64,
    pub diagnostic: Option<AlignmentDiagnostic>,
}

/// Clip texts no longer concatenate to the full text.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignmentDiagnostic {
    pub full_text_chars: usize,
    pub clip_text_chars: usize,
    /// First character position where the two texts differ.
    pub first_mismatch: usize,
}

pub fn text_alignment_diagnostic(clips: &[Clip], full_text: &str) -> Option<AlignmentDiagnostic> {
    let mut clip_chars = clips.iter().flat_map(|c| c.text.chars());
    let mut full_chars = full_text.chars();
    let mut position = 0;

    loop {
        match (clip_chars.next(), full_chars.next()) {
            (None, None) => return None,
            (a, b) if a == b => position += 1,
            _ => {
                return Some(AlignmentDiagnostic {
                    full_text_chars: full_text.chars().count(),
                    clip_text_chars: clips.iter().map(Clip::char_len).sum(),
                    first_mismatch: position,
                });
            }
        }
    }
}

/// Character offset of `clips[index]` in the full text.
pub fn clip_start_in_full_text(clips: &[Clip], index: usize) -> usize {
    clips.iter().take(index).map(Clip::char_len).sum()
}

/// Split `clips[index]` at `cursor` (a character position in its text).
///
/// Fails with [`Error::EmptySplitRejected`] when the head would be blank;
/// callers treat that as a no-op.
pub fn split(
    clips: &[Clip],
    index: usize,
    cursor: usize,
    ctx: &SplitContext<'_>,
    ids: &mut dyn IdGenerator,
) -> Result<SplitOutcome> {
    let clip = clips
        .get(index)
        .ok_or_else(|| Error::ClipNotFound(format!("#{index}")))?;

    let len = clip.char_len();
    if cursor > len {
        return Err(Error::CursorOutOfRange { cursor, len });
    }

    let head_text: String = clip.text.chars().take(cursor).collect();
    let tail_text: String = clip.text.chars().skip(cursor).collect();
    if head_text.trim().is_empty() {
        return Err(Error::EmptySplitRejected);
    }

    let diagnostic = text_alignment_diagnostic(clips, ctx.full_text);
    if let Some(d) = &diagnostic {
        tracing::warn!(
            full_text_chars = d.full_text_chars,
            clip_text_chars = d.clip_text_chars,
            first_mismatch = d.first_mismatch,
            "clip_text_desynced_from_transcript"
        );
    }

    let offset = clip_start_in_full_text(clips, index);
    let (mut head_range, tail_start) = if has_word_timestamps(ctx.segments) {
        let resolver = TimeRangeResolver::new(ctx.segments);
        let head = resolver.resolve(ctx.full_text, &head_text, offset, ctx.time_offset);
        let tail = resolver.resolve(
            ctx.full_text,
            &tail_text,
            offset + cursor,
            ctx.time_offset,
        );
        (head, tail.start_time)
    } else {
        let whole = whole_range(ctx.media_duration);
        (whole, whole.start_time)
    };

    // An untimed clip after a timed predecessor continues from it instead of
    // trusting a recomputed zero.
    if clip.start_time == 0.0 && index > 0 {
        head_range = continue_from(head_range, clips[index - 1].end_time);
    }

    let head = Clip {
        id: ids.next_id(),
        title: derive_title(&head_text, ctx.title_max_chars),
        text: head_text,
        start_time: head_range.start_time,
        end_time: head_range.end_time,
        is_default: false,
        folder: clip.folder.clone(),
    };

    let mut tail = Clip {
        title: derive_title(&tail_text, ctx.title_max_chars),
        text: tail_text,
        start_time: tail_start,
        ..clip.clone()
    };
    if tail.end_time < tail.start_time {
        tracing::debug!(
            clip_id = %tail.id,
            start = tail.start_time,
            end = tail.end_time,
            "tail_end_raised_to_start"
        );
        tail.end_time = tail.start_time;
    }

    tracing::debug!(
        head_id = %head.id,
        tail_id = %tail.id,
        cursor,
        offset,
        "clip_split"
    );

    Ok(SplitOutcome {
        seek_to: tail.start_time,
        head,
        tail,
        diagnostic,
    })
}

fn continue_from(range: TimeRange, previous_end: f64) -> TimeRange {
    TimeRange::new(previous_end, range.end_time.max(previous_end))
}
