//! Bounded playback of one clip's `[start, end)` range.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::list::ClipList;
use crate::media::{MediaSurface, TimeSource};
use crate::runtime::{EditorEvent, EditorRuntime};

#[derive(Debug, Clone, PartialEq)]
pub enum PlayPlan {
    /// Something is already playing; a second invocation pauses it.
    Stop,
    Play {
        clip_id: String,
        from: f64,
        end: f64,
        /// `false` when the playhead is already inside the clip.
        seek: bool,
        stop_after: Duration,
    },
}

/// Decide what a play-clip request does, without touching anything.
pub fn plan_play(
    clip_id: &str,
    start: f64,
    end: f64,
    current_time: f64,
    is_playing: bool,
) -> PlayPlan {
    if is_playing {
        return PlayPlan::Stop;
    }

    let inside = current_time >= start && current_time < end;
    let from = if inside { current_time } else { start };

    PlayPlan::Play {
        clip_id: clip_id.to_string(),
        from,
        end,
        seek: !inside,
        stop_after: Duration::try_from_secs_f64((end - from).max(0.0)).unwrap_or_default(),
    }
}

#[derive(Default)]
struct Playing {
    clip_id: Option<String>,
    generation: u64,
}

/// Plays clips on the media surface and stops them at their end boundary.
///
/// A seek is assumed settled after `settle`; the start is deferred by that
/// much whenever a seek was needed. Each request cancels whatever timer the
/// previous one left behind. Timers run on the current tokio runtime.
pub struct ClipPlayer {
    media: Arc<dyn MediaSurface>,
    runtime: Arc<dyn EditorRuntime>,
    settle: Duration,
    playing: Arc<Mutex<Playing>>,
    pending: Option<CancellationToken>,
}

impl ClipPlayer {
    pub fn new(
        media: Arc<dyn MediaSurface>,
        runtime: Arc<dyn EditorRuntime>,
        settle: Duration,
    ) -> Self {
        Self {
            media,
            runtime,
            settle,
            playing: Arc::new(Mutex::new(Playing::default())),
            pending: None,
        }
    }

    pub fn playing_clip(&self) -> Option<String> {
        lock(&self.playing).clip_id.clone()
    }

    /// Toggle playback of `[start, end)` for `clip_id`.
    pub fn play_clip(&mut self, clip_id: &str, start: f64, end: f64) -> PlayPlan {
        let plan = plan_play(
            clip_id,
            start,
            end,
            self.media.current_time(),
            self.playing_clip().is_some(),
        );

        match &plan {
            PlayPlan::Stop => self.stop(),
            PlayPlan::Play {
                clip_id,
                from,
                end,
                seek,
                stop_after,
            } => self.start(clip_id, *from, *end, *seek, *stop_after),
        }

        plan
    }

    fn start(&mut self, clip_id: &str, from: f64, end: f64, seek: bool, stop_after: Duration) {
        self.cancel_pending();

        let generation = {
            let mut playing = lock(&self.playing);
            playing.generation += 1;
            playing.clip_id = Some(clip_id.to_string());
            playing.generation
        };

        tracing::debug!(clip_id, from, end, seek, "clip_play");
        self.runtime.emit(EditorEvent::PlayingClipChanged {
            clip_id: Some(clip_id.to_string()),
        });

        if seek {
            self.media.seek_to(from, TimeSource::ExternalInput);
        } else {
            self.media.play();
        }

        let token = CancellationToken::new();
        self.pending = Some(token.clone());

        let media = Arc::clone(&self.media);
        let runtime = Arc::clone(&self.runtime);
        let playing = Arc::clone(&self.playing);
        let settle = self.settle;

        tokio::spawn(async move {
            if seek {
                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = tokio::time::sleep(settle) => {}
                }
                media.play();
            }

            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(stop_after) => {}
            }

            {
                let mut playing = lock(&playing);
                if playing.generation != generation {
                    return;
                }
                playing.clip_id = None;
            }

            media.pause();
            media.seek_to(end, TimeSource::ExternalInput);
            runtime.emit(EditorEvent::PlayingClipChanged { clip_id: None });
        });
    }

    /// Pause and forget the current clip, cancelling its timers.
    pub fn stop(&mut self) {
        self.cancel_pending();

        let stopped = {
            let mut playing = lock(&self.playing);
            playing.generation += 1;
            playing.clip_id.take()
        };

        if let Some(clip_id) = stopped {
            tracing::debug!(%clip_id, "clip_stop");
            self.media.pause();
            self.runtime
                .emit(EditorEvent::PlayingClipChanged { clip_id: None });
        }
    }

    /// Stop if the playing clip no longer exists.
    pub fn on_clips_changed(&mut self, clips: &ClipList) {
        if let Some(clip_id) = self.playing_clip()
            && !clips.contains(&clip_id)
        {
            self.stop();
        }
    }

    fn cancel_pending(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
    }
}

impl Drop for ClipPlayer {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

fn lock(playing: &Mutex<Playing>) -> std::sync::MutexGuard<'_, Playing> {
    playing.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::Clip;
    use crate::media::testing::{Call, FakeMedia};
    use crate::runtime::testing::RecordingRuntime;

    const SETTLE: Duration = Duration::from_millis(200);

    fn player(at: f64) -> (Arc<FakeMedia>, Arc<RecordingRuntime>, ClipPlayer) {
        let media = Arc::new(FakeMedia::at(at));
        let runtime = Arc::new(RecordingRuntime::default());
        let player = ClipPlayer::new(media.clone(), runtime.clone(), SETTLE);
        (media, runtime, player)
    }

    #[test]
    fn plan_stops_when_anything_plays() {
        assert_eq!(plan_play("a", 0.0, 5.0, 2.0, true), PlayPlan::Stop);
    }

    #[test]
    fn plan_resumes_inside_range() {
        assert_eq!(
            plan_play("a", 1.0, 5.0, 2.0, false),
            PlayPlan::Play {
                clip_id: "a".into(),
                from: 2.0,
                end: 5.0,
                seek: false,
                stop_after: Duration::from_secs(3),
            }
        );
    }

    #[test]
    fn plan_seeks_outside_range() {
        let PlayPlan::Play { from, seek, .. } = plan_play("a", 1.0, 5.0, 5.0, false) else {
            panic!("expected play");
        };
        assert_eq!((from, seek), (1.0, true));
    }

    #[test]
    fn plan_survives_unbounded_end() {
        let PlayPlan::Play { stop_after, .. } = plan_play("a", 0.0, f64::INFINITY, 1.0, false)
        else {
            panic!("expected play");
        };
        assert_eq!(stop_after, Duration::ZERO);

        let PlayPlan::Play { stop_after, .. } = plan_play("a", 0.0, f64::NAN, 1.0, false) else {
            panic!("expected play");
        };
        assert_eq!(stop_after, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn second_invocation_stops() {
        let (media, _, mut player) = player(0.0);

        assert!(matches!(
            player.play_clip("a", 0.0, 5.0),
            PlayPlan::Play { seek: false, .. }
        ));
        *media.time.lock().unwrap() = 2.0;
        assert_eq!(player.play_clip("a", 0.0, 5.0), PlayPlan::Stop);

        assert_eq!(media.calls(), vec![Call::Play, Call::Pause]);
        assert_eq!(player.playing_clip(), None);

        // The cancelled stop timer must not fire later.
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(media.calls(), vec![Call::Play, Call::Pause]);
    }

    #[tokio::test(start_paused = true)]
    async fn seek_then_play_after_settle_and_stop_at_end() {
        let (media, runtime, mut player) = player(10.0);

        player.play_clip("a", 1.0, 3.0);
        assert_eq!(media.calls(), vec![Call::Seek(1.0, TimeSource::ExternalInput)]);

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(media.calls().last(), Some(&Call::Play));
        assert_eq!(player.playing_clip().as_deref(), Some("a"));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(
            media.calls(),
            vec![
                Call::Seek(1.0, TimeSource::ExternalInput),
                Call::Play,
                Call::Pause,
                Call::Seek(3.0, TimeSource::ExternalInput),
            ]
        );
        assert_eq!(player.playing_clip(), None);
        assert_eq!(
            runtime.events(),
            vec![
                EditorEvent::PlayingClipChanged {
                    clip_id: Some("a".into())
                },
                EditorEvent::PlayingClipChanged { clip_id: None },
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn deleting_playing_clip_cancels_timer() {
        let (media, _, mut player) = player(0.0);
        player.play_clip("gone", 0.0, 1.0);

        let remaining = ClipList::from_clips(vec![Clip {
            id: "other".into(),
            title: String::new(),
            text: String::new(),
            start_time: 0.0,
            end_time: 1.0,
            is_default: false,
            folder: None,
        }])
        .unwrap();
        player.on_clips_changed(&remaining);
        assert_eq!(player.playing_clip(), None);

        // A new playback must not be stopped by the old clip's timer.
        player.play_clip("other", 0.0, 5.0);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(player.playing_clip().as_deref(), Some("other"));
        assert_eq!(
            media.calls().iter().filter(|c| **c == Call::Pause).count(),
            1
        );
    }
}
