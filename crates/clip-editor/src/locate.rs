//! Locate mode: scrubbing the video retargets one clip boundary.
//!
//! [`LocateState::transition`] is a pure `(state, event) -> (state, effects)`
//! function. [`LocateController`] owns the state and carries the effects out
//! against the clip list, the media surface and the runtime.
//!
//! Updates tagged [`TimeSource::ExternalInput`] are never applied to a field:
//! they are the surface echoing a seek this module issued.

use std::sync::Arc;

use crate::clip::{ClipField, LocateTarget};
use crate::list::ClipList;
use crate::media::{MediaSurface, TimeSource, TimeUpdateEvent};
use crate::runtime::{EditorEvent, EditorRuntime};
use crate::{Error, Result};

pub const LOCATE_ADVISORY: &str = "drag video progress to update time";

#[derive(Debug, Clone, Default, PartialEq)]
pub enum LocateState {
    #[default]
    Idle,
    Locating { clip_id: String, field: ClipField },
}

#[derive(Debug, Clone, PartialEq)]
pub enum LocateEvent {
    /// `current_value` is the clip's present value for `field`.
    Activate {
        clip_id: String,
        field: ClipField,
        current_value: f64,
    },
    Exit,
    Media(TimeUpdateEvent),
    ManualCommit {
        clip_id: String,
        field: ClipField,
        seconds: f64,
    },
    ClipRemoved { clip_id: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum LocateEffect {
    Seek { time: f64, source: TimeSource },
    Pause,
    UpdateField {
        clip_id: String,
        field: ClipField,
        time: f64,
    },
    Advise(&'static str),
    TargetChanged,
}

impl LocateState {
    pub fn is_locating(&self, clip_id: &str, field: ClipField) -> bool {
        matches!(self, Self::Locating { clip_id: c, field: f } if c == clip_id && *f == field)
    }

    pub fn transition(self, event: &LocateEvent) -> (Self, Vec<LocateEffect>) {
        match (self, event) {
            (
                state,
                LocateEvent::Activate {
                    clip_id,
                    field,
                    current_value,
                },
            ) => {
                if state.is_locating(clip_id, *field) {
                    (
                        Self::Idle,
                        vec![LocateEffect::Pause, LocateEffect::TargetChanged],
                    )
                } else {
                    (
                        Self::Locating {
                            clip_id: clip_id.clone(),
                            field: *field,
                        },
                        vec![
                            LocateEffect::Seek {
                                time: *current_value,
                                source: TimeSource::ExternalInput,
                            },
                            LocateEffect::Advise(LOCATE_ADVISORY),
                            LocateEffect::TargetChanged,
                        ],
                    )
                }
            }

            (Self::Idle, LocateEvent::Exit) => (Self::Idle, vec![]),
            (Self::Locating { .. }, LocateEvent::Exit) => (
                Self::Idle,
                vec![LocateEffect::Pause, LocateEffect::TargetChanged],
            ),

            (Self::Idle, LocateEvent::Media(_)) => (Self::Idle, vec![]),
            (Self::Locating { clip_id, field }, LocateEvent::Media(update)) => {
                let effects = if update.source == TimeSource::ExternalInput {
                    vec![]
                } else {
                    vec![LocateEffect::UpdateField {
                        clip_id: clip_id.clone(),
                        field,
                        time: update.time,
                    }]
                };
                (Self::Locating { clip_id, field }, effects)
            }

            (
                state,
                LocateEvent::ManualCommit {
                    clip_id,
                    field,
                    seconds,
                },
            ) => {
                let mut effects = vec![LocateEffect::UpdateField {
                    clip_id: clip_id.clone(),
                    field: *field,
                    time: *seconds,
                }];
                if state.is_locating(clip_id, *field) {
                    effects.push(LocateEffect::Seek {
                        time: *seconds,
                        source: TimeSource::ExternalInput,
                    });
                }
                (state, effects)
            }

            (Self::Locating { clip_id, .. }, LocateEvent::ClipRemoved { clip_id: removed })
                if clip_id == *removed =>
            {
                (
                    Self::Idle,
                    vec![LocateEffect::Pause, LocateEffect::TargetChanged],
                )
            }
            (state, LocateEvent::ClipRemoved { .. }) => (state, vec![]),
        }
    }
}

/// Drives [`LocateState`] against the clip list and the media surface.
pub struct LocateController {
    state: LocateState,
    media: Arc<dyn MediaSurface>,
    runtime: Arc<dyn EditorRuntime>,
}

impl LocateController {
    pub fn new(media: Arc<dyn MediaSurface>, runtime: Arc<dyn EditorRuntime>) -> Self {
        Self {
            state: LocateState::Idle,
            media,
            runtime,
        }
    }

    pub fn state(&self) -> &LocateState {
        &self.state
    }

    pub fn target(&self, clips: &ClipList) -> LocateTarget {
        match &self.state {
            LocateState::Idle => LocateTarget::none(),
            LocateState::Locating { clip_id, field } => LocateTarget {
                clip_id: Some(clip_id.clone()),
                field: Some(*field),
                clip_index: clips.position(clip_id),
            },
        }
    }

    /// Toggle locate mode for one clip boundary.
    pub fn activate(&mut self, clips: &mut ClipList, clip_id: &str, field: ClipField) -> Result<()> {
        let current_value = clips
            .get(clip_id)
            .ok_or_else(|| Error::ClipNotFound(clip_id.to_string()))?
            .field(field);

        self.dispatch(
            clips,
            LocateEvent::Activate {
                clip_id: clip_id.to_string(),
                field,
                current_value,
            },
        )
    }

    pub fn exit(&mut self, clips: &mut ClipList) {
        let _ = self.dispatch(clips, LocateEvent::Exit);
    }

    /// Feed a time update or drag event from the surface.
    ///
    /// Updates the surface cannot apply (an inverted range) are logged and
    /// dropped; the next event overwrites them anyway.
    pub fn on_media_event(&mut self, clips: &mut ClipList, event: TimeUpdateEvent) {
        if let Err(error) = self.dispatch(clips, LocateEvent::Media(event)) {
            tracing::debug!(%error, time = event.time, "locate_update_rejected");
        }
    }

    /// A value typed into a time field and confirmed by the user.
    pub fn commit(
        &mut self,
        clips: &mut ClipList,
        clip_id: &str,
        field: ClipField,
        seconds: f64,
    ) -> Result<()> {
        self.dispatch(
            clips,
            LocateEvent::ManualCommit {
                clip_id: clip_id.to_string(),
                field,
                seconds,
            },
        )
    }

    pub fn on_clip_removed(&mut self, clips: &mut ClipList, clip_id: &str) {
        let _ = self.dispatch(
            clips,
            LocateEvent::ClipRemoved {
                clip_id: clip_id.to_string(),
            },
        );
    }

    fn dispatch(&mut self, clips: &mut ClipList, event: LocateEvent) -> Result<()> {
        let (next, effects) = std::mem::take(&mut self.state).transition(&event);
        self.state = next;

        for effect in effects {
            match effect {
                LocateEffect::Seek { time, source } => self.media.seek_to(time, source),
                LocateEffect::Pause => self.media.pause(),
                LocateEffect::UpdateField {
                    clip_id,
                    field,
                    time,
                } => {
                    // Stop before seeking to a value the list refused.
                    clips.set_field(&clip_id, field, time)?;
                    self.runtime.emit(EditorEvent::ClipsChanged {
                        clips: clips.clips().to_vec(),
                    });
                }
                LocateEffect::Advise(message) => self.runtime.emit(EditorEvent::Advisory {
                    message: message.to_string(),
                }),
                LocateEffect::TargetChanged => {
                    let target = self.target(clips);
                    tracing::debug!(?target, "locate_target_changed");
                    self.runtime
                        .emit(EditorEvent::LocateTargetChanged { target });
                }
            }
        }
        Ok(())
    }
}
