/// Where a media position change came from.
///
/// Every seek this crate issues is tagged [`TimeSource::ExternalInput`]; the
/// surface echoes that tag on the resulting time update so it can be told
/// apart from genuine playback progress or scrubbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(rename_all = "kebab-case")]
pub enum TimeSource {
    VideoNative,
    ExternalInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub enum MediaEventKind {
    TimeUpdate,
    DragStart,
    DragMove,
    DragEnd,
}

impl MediaEventKind {
    pub fn is_drag(self) -> bool {
        !matches!(self, Self::TimeUpdate)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub struct TimeUpdateEvent {
    pub kind: MediaEventKind,
    pub time: f64,
    pub source: TimeSource,
}

impl TimeUpdateEvent {
    /// Playback progress reported by the surface itself.
    pub fn native(time: f64) -> Self {
        Self {
            kind: MediaEventKind::TimeUpdate,
            time,
            source: TimeSource::VideoNative,
        }
    }

    /// The surface reporting back a position this crate seeked to.
    pub fn echo(time: f64) -> Self {
        Self {
            kind: MediaEventKind::TimeUpdate,
            time,
            source: TimeSource::ExternalInput,
        }
    }

    pub fn drag(kind: MediaEventKind, time: f64) -> Self {
        Self {
            kind,
            time,
            source: TimeSource::VideoNative,
        }
    }
}

/// The external playback surface: a single media position and play state.
///
/// Implementations use interior mutability; the controllers only hold shared
/// references.
pub trait MediaSurface: Send + Sync + 'static {
    fn seek_to(&self, time: f64, source: TimeSource);
    fn play(&self);
    fn pause(&self);
    fn current_time(&self) -> f64;
    fn duration(&self) -> f64;
}
