use crate::clip::{Clip, ClipField, derive_title};
use crate::split::SplitOutcome;
use crate::{Error, Result};

/// Ordered, never-empty clip list.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(transparent)]
pub struct ClipList {
    clips: Vec<Clip>,
}

impl ClipList {
    /// The single default clip covering the whole video.
    pub fn initial(id: String, text: String, duration: f64, title_max_chars: usize) -> Self {
        Self {
            clips: vec![Clip {
                id,
                title: derive_title(&text, title_max_chars),
                text,
                start_time: 0.0,
                end_time: duration.max(0.0),
                is_default: true,
                folder: None,
            }],
        }
    }

    /// Adopt clips from outside, e.g. a persisted snapshot. Every clip must
    /// hold a finite, non-inverted range.
    pub fn from_clips(clips: Vec<Clip>) -> Result<Self> {
        if clips.is_empty() {
            return Err(Error::MinimumClipCountViolation);
        }
        for clip in &clips {
            check_range(clip)?;
        }
        Ok(Self { clips })
    }

    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    pub fn into_clips(self) -> Vec<Clip> {
        self.clips
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Clip> {
        self.clips.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Clip> {
        self.clips.iter().find(|c| c.id == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.clips.iter().position(|c| c.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Clip> {
        self.clips
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| Error::ClipNotFound(id.to_string()))
    }

    /// Remove a clip. The last remaining clip can never be removed.
    pub fn delete(&mut self, id: &str) -> Result<Clip> {
        let index = self
            .position(id)
            .ok_or_else(|| Error::ClipNotFound(id.to_string()))?;
        if self.clips.len() <= 1 {
            return Err(Error::MinimumClipCountViolation);
        }
        Ok(self.clips.remove(index))
    }

    /// Overwrite one boundary. Rejects values that would put the end before
    /// the start.
    pub fn set_field(&mut self, id: &str, field: ClipField, seconds: f64) -> Result<()> {
        if !seconds.is_finite() {
            return Err(Error::NonFiniteTime(seconds));
        }
        let clip = self.get_mut(id)?;
        let seconds = seconds.max(0.0);

        let (start, end) = match field {
            ClipField::Start => (seconds, clip.end_time),
            ClipField::End => (clip.start_time, seconds),
        };
        if end < start {
            return Err(Error::InvertedRange {
                field,
                seconds,
                start: clip.start_time,
                end: clip.end_time,
            });
        }

        clip.start_time = start;
        clip.end_time = end;
        Ok(())
    }

    pub fn rename(&mut self, id: &str, title: impl Into<String>) -> Result<()> {
        self.get_mut(id)?.title = title.into();
        Ok(())
    }

    pub fn set_folder(&mut self, id: &str, folder: Option<String>) -> Result<()> {
        self.get_mut(id)?.folder = folder.filter(|f| !f.trim().is_empty());
        Ok(())
    }

    pub fn set_text(&mut self, id: &str, text: impl Into<String>) -> Result<()> {
        self.get_mut(id)?.text = text.into();
        Ok(())
    }

    /// Extend the default clip to the media duration once it is known.
    /// Returns `true` when a clip changed.
    pub fn fill_default_duration(&mut self, duration: f64) -> bool {
        let mut changed = false;
        for clip in self.clips.iter_mut().filter(|c| c.is_default) {
            if clip.end_time <= 0.0 && duration > 0.0 {
                clip.end_time = duration;
                changed = true;
            }
        }
        changed
    }

    /// Replace the split clip with its tail and insert the head before it.
    pub(crate) fn apply_split(&mut self, index: usize, outcome: &SplitOutcome) {
        self.clips[index] = outcome.tail.clone();
        self.clips.insert(index, outcome.head.clone());
    }
}

fn check_range(clip: &Clip) -> Result<()> {
    for seconds in [clip.start_time, clip.end_time] {
        if !seconds.is_finite() {
            return Err(Error::NonFiniteTime(seconds));
        }
    }
    if clip.end_time < clip.start_time {
        return Err(Error::InvertedRange {
            field: ClipField::End,
            seconds: clip.end_time,
            start: clip.start_time,
            end: clip.end_time,
        });
    }
    Ok(())
}
