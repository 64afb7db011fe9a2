use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use hypr_timecode as timecode;
use tokio_util::sync::CancellationToken;

use crate::clip::ClipField;
use crate::runtime::{EditorEvent, EditorRuntime};

/// Editable `mm:ss.d` text bound to one clip boundary.
///
/// While the user is typing, external updates are ignored so they don't
/// clobber the input; a failed commit puts the last good value back.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeField {
    value: f64,
    display: String,
    editing: bool,
}

impl TimeField {
    pub fn new(seconds: f64) -> Self {
        Self {
            value: seconds,
            display: timecode::format(seconds),
            editing: false,
        }
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn edit(&mut self, text: impl Into<String>) {
        self.display = text.into();
        self.editing = true;
    }

    pub fn commit(&mut self) -> timecode::Result<f64> {
        self.editing = false;
        match timecode::parse(&self.display) {
            Ok(seconds) => {
                self.value = seconds;
                self.display = timecode::format(seconds);
                Ok(seconds)
            }
            Err(error) => {
                tracing::debug!(%error, input = %self.display, "time_field_reverted");
                self.display = timecode::format(self.value);
                Err(error)
            }
        }
    }

    pub fn cancel(&mut self) {
        self.editing = false;
        self.display = timecode::format(self.value);
    }

    /// Returns `false` when the update was dropped because an edit is open.
    pub fn sync(&mut self, seconds: f64) -> bool {
        if self.editing {
            return false;
        }
        self.value = seconds;
        self.display = timecode::format(seconds);
        true
    }
}

type FieldKey = (String, ClipField);

struct Slot {
    field: TimeField,
    generation: u64,
    recovery: Option<CancellationToken>,
}

#[derive(Default)]
struct Slots {
    open: HashMap<FieldKey, Slot>,
    generation: u64,
}

/// The open time fields of one editor, keyed by clip boundary.
///
/// A boundary without an open field shows its clip value. Input the editor
/// rejected stays visible for `recovery` and is then reverted to the last
/// accepted value, announced with [`EditorEvent::TimeFieldChanged`].
pub struct TimeFields {
    slots: Arc<Mutex<Slots>>,
    recovery: Duration,
    runtime: Arc<dyn EditorRuntime>,
}

impl TimeFields {
    pub fn new(runtime: Arc<dyn EditorRuntime>, recovery: Duration) -> Self {
        Self {
            slots: Arc::new(Mutex::new(Slots::default())),
            recovery,
            runtime,
        }
    }

    /// Text shown for a boundary whose clip value is `current`.
    pub fn display(&self, clip_id: &str, field: ClipField, current: f64) -> String {
        lock(&self.slots)
            .open
            .get(&(clip_id.to_string(), field))
            .map_or_else(|| timecode::format(current), |s| s.field.display().to_string())
    }

    /// The user typed into a field; any pending revert is abandoned.
    pub fn edit(&self, clip_id: &str, field: ClipField, current: f64, text: &str) {
        let mut slots = lock(&self.slots);
        let generation = slots.next_generation();
        let slot = slots
            .open
            .entry((clip_id.to_string(), field))
            .or_insert_with(|| Slot {
                field: TimeField::new(current),
                generation,
                recovery: None,
            });

        if let Some(token) = slot.recovery.take() {
            token.cancel();
        }
        slot.generation = generation;
        slot.field.edit(text);
    }

    /// The value was applied; the field goes back to following the clip.
    pub fn accepted(&self, clip_id: &str, field: ClipField) {
        if let Some(slot) = lock(&self.slots).open.remove(&(clip_id.to_string(), field))
            && let Some(token) = slot.recovery
        {
            token.cancel();
        }
    }

    /// `text` was refused; keep it visible, then revert to `current`.
    ///
    /// Must be called within a tokio runtime.
    pub fn rejected(&self, clip_id: &str, field: ClipField, current: f64, text: &str) {
        let key = (clip_id.to_string(), field);
        let token = CancellationToken::new();

        let generation = {
            let mut slots = lock(&self.slots);
            let generation = slots.next_generation();
            let mut time_field = TimeField::new(current);
            time_field.edit(text);

            let previous = slots.open.insert(
                key.clone(),
                Slot {
                    field: time_field,
                    generation,
                    recovery: Some(token.clone()),
                },
            );
            if let Some(token) = previous.and_then(|p| p.recovery) {
                token.cancel();
            }
            generation
        };

        tracing::debug!(clip_id, %field, input = text, "time_field_rejected");

        let slots = Arc::clone(&self.slots);
        let runtime = Arc::clone(&self.runtime);
        let recovery = self.recovery;

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(recovery) => {}
            }

            let display = {
                let mut slots = lock(&slots);
                let current = slots
                    .open
                    .get(&key)
                    .is_some_and(|slot| slot.generation == generation);
                if current {
                    slots.open.remove(&key).map(|mut slot| {
                        slot.field.cancel();
                        slot.field.display().to_string()
                    })
                } else {
                    None
                }
            };

            if let Some(display) = display {
                let (clip_id, field) = key;
                runtime.emit(EditorEvent::TimeFieldChanged {
                    clip_id,
                    field,
                    display,
                });
            }
        });
    }

    /// Close every field of a clip that no longer exists.
    pub fn forget_clip(&self, clip_id: &str) {
        lock(&self.slots).open.retain(|(id, _), slot| {
            let keep = id != clip_id;
            if !keep && let Some(token) = slot.recovery.take() {
                token.cancel();
            }
            keep
        });
    }

    pub fn clear(&self) {
        for (_, slot) in lock(&self.slots).open.drain() {
            if let Some(token) = slot.recovery {
                token.cancel();
            }
        }
    }
}

impl Slots {
    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }
}

impl Drop for TimeFields {
    fn drop(&mut self) {
        self.clear();
    }
}

fn lock(slots: &Mutex<Slots>) -> MutexGuard<'_, Slots> {
    slots.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::testing::RecordingRuntime;

    #[test]
    fn commit_normalizes_display() {
        let mut field = TimeField::new(0.0);
        field.edit("1:5.25");

        assert_eq!(field.commit(), Ok(65.25));
        assert_eq!(field.display(), "01:05.2");
        assert!(!field.is_editing());
    }

    #[test]
    fn bad_input_reverts() {
        let mut field = TimeField::new(12.5);
        field.edit("soon");

        assert!(matches!(
            field.commit(),
            Err(timecode::Error::InvalidTimeFormat(_))
        ));
        assert_eq!(field.display(), "00:12.5");
        assert_eq!(field.value(), 12.5);
    }

    fn fields() -> (Arc<RecordingRuntime>, TimeFields) {
        let runtime = Arc::new(RecordingRuntime::default());
        let fields = TimeFields::new(runtime.clone(), Duration::from_secs(1));
        (runtime, fields)
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_input_reverts_after_delay() {
        let (runtime, fields) = fields();

        fields.rejected("c", ClipField::Start, 2.0, "2:99");
        assert_eq!(fields.display("c", ClipField::Start, 2.0), "2:99");

        tokio::time::sleep(Duration::from_millis(1100)).await;

        assert_eq!(fields.display("c", ClipField::Start, 2.0), "00:02.0");
        assert_eq!(
            runtime.events(),
            vec![EditorEvent::TimeFieldChanged {
                clip_id: "c".into(),
                field: ClipField::Start,
                display: "00:02.0".into(),
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn typing_again_cancels_the_revert() {
        let (runtime, fields) = fields();

        fields.rejected("c", ClipField::End, 5.0, "oops");
        tokio::time::sleep(Duration::from_millis(500)).await;
        fields.edit("c", ClipField::End, 5.0, "00:04");
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(fields.display("c", ClipField::End, 5.0), "00:04");
        assert!(runtime.events().is_empty());

        fields.accepted("c", ClipField::End);
        assert_eq!(fields.display("c", ClipField::End, 4.0), "00:04.0");
    }

    #[tokio::test(start_paused = true)]
    async fn forgotten_clip_never_reverts() {
        let (runtime, fields) = fields();

        fields.rejected("gone", ClipField::End, 5.0, "x");
        fields.forget_clip("gone");
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert!(runtime.events().is_empty());
        assert_eq!(fields.display("gone", ClipField::End, 5.0), "00:05.0");
    }

    #[test]
    fn sync_waits_for_edit_to_close() {
        let mut field = TimeField::new(1.0);
        field.edit("00:0");

        assert!(!field.sync(4.0));
        assert_eq!(field.display(), "00:0");

        field.cancel();
        assert_eq!(field.display(), "00:01.0");
        assert!(field.sync(4.0));
        assert_eq!(field.display(), "00:04.0");
    }
}
