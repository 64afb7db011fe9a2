//! One editing session over a finished transcription task.
//!
//! [`EditorSession`] owns the clip list and routes every user action through
//! the splitter, the locate controller and the clip player, emitting
//! [`EditorEvent`]s and scheduling autosaves as the list changes.

use std::sync::Arc;

use hypr_storage::{DebouncedStore, SessionStore};
use hypr_transcript::{IdGenerator, TaskPayload, TimeOffset, TranscriptSegment};

use crate::clip::{Clip, ClipField, LocateTarget};
use crate::config::EditorConfig;
use crate::export::{SubmissionClip, build_submission};
use crate::field::TimeFields;
use crate::list::ClipList;
use crate::locate::{LocateController, LocateState};
use crate::media::{MediaSurface, TimeSource, TimeUpdateEvent};
use crate::playback::{ClipPlayer, PlayPlan};
use crate::runtime::{EditorEvent, EditorRuntime};
use crate::split::{SplitContext, SplitOutcome, split};
use crate::{Error, Result};

/// What gets persisted between launches.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorSnapshot {
    pub clips: Vec<Clip>,
    #[serde(default)]
    pub time_offset: TimeOffset,
}

pub struct EditorSession {
    session_id: String,
    clips: ClipList,
    segments: Vec<TranscriptSegment>,
    full_text: String,
    duration: f64,
    config: EditorConfig,
    ids: Box<dyn IdGenerator>,
    media: Arc<dyn MediaSurface>,
    runtime: Arc<dyn EditorRuntime>,
    locate: LocateController,
    player: ClipPlayer,
    fields: TimeFields,
    autosave: Option<Arc<DebouncedStore>>,
}

impl EditorSession {
    /// Start from a single default clip holding the whole transcript, or the
    /// translation when `config.prefer_translation` is set and one exists.
    ///
    /// Splits still align against the transcript's word text.
    pub fn new(
        session_id: impl Into<String>,
        task: &TaskPayload,
        config: EditorConfig,
        media: Arc<dyn MediaSurface>,
        runtime: Arc<dyn EditorRuntime>,
        mut ids: Box<dyn IdGenerator>,
    ) -> Self {
        let full_text = task.full_text();
        let duration = task.duration();
        let clips = ClipList::initial(
            ids.next_id(),
            task.source_text(config.prefer_translation),
            duration,
            config.title_max_chars,
        );

        Self {
            session_id: session_id.into(),
            clips,
            segments: task.segments(),
            full_text,
            duration,
            locate: LocateController::new(Arc::clone(&media), Arc::clone(&runtime)),
            player: ClipPlayer::new(Arc::clone(&media), Arc::clone(&runtime), config.seek_settle()),
            fields: TimeFields::new(Arc::clone(&runtime), config.field_recovery()),
            config,
            ids,
            media,
            runtime,
            autosave: None,
        }
    }

    /// Persist every change through `store`, debounced by the configured delay.
    pub fn with_autosave(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.autosave = Some(Arc::new(DebouncedStore::new(
            store,
            self.config.autosave_debounce(),
        )));
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn clips(&self) -> &ClipList {
        &self.clips
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn full_text(&self) -> &str {
        &self.full_text
    }

    pub fn segments(&self) -> &[TranscriptSegment] {
        &self.segments
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Split `clip_id` at a character cursor in its text.
    ///
    /// A cursor that would leave the head blank is ignored (`Ok(None)`).
    pub fn split_at(&mut self, clip_id: &str, cursor: usize) -> Result<Option<SplitOutcome>> {
        let _span = tracing::info_span!("editor", session_id = %self.session_id).entered();
        let index = self
            .clips
            .position(clip_id)
            .ok_or_else(|| Error::ClipNotFound(clip_id.to_string()))?;

        let ctx = SplitContext {
            full_text: &self.full_text,
            segments: &self.segments,
            time_offset: self.config.time_offset,
            media_duration: self.duration,
            title_max_chars: self.config.title_max_chars,
        };

        let outcome = match split(self.clips.clips(), index, cursor, &ctx, &mut *self.ids) {
            Ok(outcome) => outcome,
            Err(Error::EmptySplitRejected) => {
                tracing::debug!(clip_id, cursor, "empty_split_ignored");
                return Ok(None);
            }
            Err(error) => return Err(error),
        };

        self.clips.apply_split(index, &outcome);
        tracing::info!(clip_id, clips = self.clips.len(), "clip_split_applied");
        self.media.seek_to(outcome.seek_to, TimeSource::ExternalInput);
        self.structure_changed();

        Ok(Some(outcome))
    }

    pub fn delete_clip(&mut self, clip_id: &str) -> Result<Clip> {
        let _span = tracing::info_span!("editor", session_id = %self.session_id).entered();
        let removed = self.clips.delete(clip_id)?;

        self.locate.on_clip_removed(&mut self.clips, clip_id);
        self.fields.forget_clip(clip_id);
        self.player.on_clips_changed(&self.clips);
        self.structure_changed();

        Ok(removed)
    }

    pub fn rename_clip(&mut self, clip_id: &str, title: impl Into<String>) -> Result<()> {
        self.clips.rename(clip_id, title)?;
        self.changed();
        Ok(())
    }

    pub fn set_clip_folder(&mut self, clip_id: &str, folder: Option<String>) -> Result<()> {
        self.clips.set_folder(clip_id, folder)?;
        self.changed();
        Ok(())
    }

    pub fn set_clip_text(&mut self, clip_id: &str, text: impl Into<String>) -> Result<()> {
        self.clips.set_text(clip_id, text)?;
        self.changed();
        Ok(())
    }

    /// Enter locate mode for a boundary, or leave it when already there.
    pub fn toggle_locate(&mut self, clip_id: &str, field: ClipField) -> Result<()> {
        self.locate.activate(&mut self.clips, clip_id, field)
    }

    pub fn exit_locate(&mut self) {
        self.locate.exit(&mut self.clips);
    }

    pub fn locate_target(&self) -> LocateTarget {
        self.locate.target(&self.clips)
    }

    pub fn on_media_event(&mut self, event: TimeUpdateEvent) {
        let locating = matches!(self.locate.state(), LocateState::Locating { .. });
        self.locate.on_media_event(&mut self.clips, event);
        if locating {
            self.persist();
        }
    }

    /// Text the boundary's time field shows.
    pub fn time_display(&self, clip_id: &str, field: ClipField) -> Result<String> {
        let current = self.clip_value(clip_id, field)?;
        Ok(self.fields.display(clip_id, field, current))
    }

    pub fn edit_time(&mut self, clip_id: &str, field: ClipField, text: &str) -> Result<()> {
        let current = self.clip_value(clip_id, field)?;
        self.fields.edit(clip_id, field, current, text);
        Ok(())
    }

    /// Parse `text` as `mm:ss.d` and write it to the boundary.
    ///
    /// Rejected input stays in the field until the recovery delay passes,
    /// then the field reverts to the clip value.
    pub fn commit_time(&mut self, clip_id: &str, field: ClipField, text: &str) -> Result<f64> {
        let current = self.clip_value(clip_id, field)?;

        let result = hypr_timecode::parse(text)
            .map_err(Error::from)
            .and_then(|seconds| {
                self.locate
                    .commit(&mut self.clips, clip_id, field, seconds)
                    .map(|()| seconds)
            });

        match result {
            Ok(seconds) => {
                self.fields.accepted(clip_id, field);
                self.persist();
                Ok(seconds)
            }
            Err(error) => {
                self.fields.rejected(clip_id, field, current, text);
                Err(error)
            }
        }
    }

    fn clip_value(&self, clip_id: &str, field: ClipField) -> Result<f64> {
        self.clips
            .get(clip_id)
            .map(|clip| clip.field(field))
            .ok_or_else(|| Error::ClipNotFound(clip_id.to_string()))
    }

    pub fn play_clip(&mut self, clip_id: &str) -> Result<PlayPlan> {
        let clip = self
            .clips
            .get(clip_id)
            .ok_or_else(|| Error::ClipNotFound(clip_id.to_string()))?;
        let (start, end) = (clip.start_time, clip.end_time);
        Ok(self.player.play_clip(clip_id, start, end))
    }

    pub fn stop_playback(&mut self) {
        self.player.stop();
    }

    pub fn playing_clip(&self) -> Option<String> {
        self.player.playing_clip()
    }

    /// The surface reported the real media duration.
    pub fn on_metadata_loaded(&mut self, duration: f64) {
        if duration.is_finite() && duration > 0.0 {
            self.duration = duration;
        }
        if self.clips.fill_default_duration(self.duration) {
            self.changed();
        }
    }

    /// Applies to splits made from now on; existing clips are not re-resolved.
    pub fn set_time_offset(&mut self, offset: impl Into<TimeOffset>) {
        self.config.time_offset = offset.into();
        self.persist();
    }

    pub fn snapshot(&self) -> EditorSnapshot {
        EditorSnapshot {
            clips: self.clips.clips().to_vec(),
            time_offset: self.config.time_offset,
        }
    }

    /// Replace the clip list wholesale; playback and locate mode are reset.
    pub fn restore(&mut self, snapshot: EditorSnapshot) -> Result<()> {
        let clips = ClipList::from_clips(snapshot.clips)?;

        self.player.stop();
        self.locate.exit(&mut self.clips);
        self.fields.clear();
        self.clips = clips;
        self.config.time_offset = snapshot.time_offset;
        self.runtime.emit(EditorEvent::ClipsChanged {
            clips: self.clips.clips().to_vec(),
        });

        Ok(())
    }

    /// Restore from `store` if it holds this session. Returns whether it did.
    pub async fn load(&mut self, store: &dyn SessionStore) -> Result<bool> {
        let Some(value) = store.load(&self.session_id).await? else {
            return Ok(false);
        };

        let snapshot: EditorSnapshot = serde_json::from_value(value)?;
        tracing::info!(
            session_id = %self.session_id,
            clips = snapshot.clips.len(),
            "session_restored"
        );
        self.restore(snapshot)?;
        Ok(true)
    }

    /// Write any pending autosave now.
    pub async fn flush(&self) -> Result<()> {
        if let Some(store) = &self.autosave {
            store.flush().await?;
        }
        Ok(())
    }

    pub fn submission(&self) -> Vec<SubmissionClip> {
        build_submission(self.clips.clips())
    }

    fn structure_changed(&mut self) {
        self.changed();
        if matches!(self.locate.state(), LocateState::Locating { .. }) {
            self.runtime.emit(EditorEvent::LocateTargetChanged {
                target: self.locate.target(&self.clips),
            });
        }
    }

    fn changed(&self) {
        self.runtime.emit(EditorEvent::ClipsChanged {
            clips: self.clips.clips().to_vec(),
        });
        self.persist();
    }

    fn persist(&self) {
        let Some(store) = &self.autosave else {
            return;
        };

        match serde_json::to_value(self.snapshot()) {
            Ok(state) => store.schedule(&self.session_id, state),
            Err(error) => tracing::warn!(%error, "snapshot_serialize_failed"),
        }
    }
}
