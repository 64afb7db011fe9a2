use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::clip::{Clip, ClipField, LocateTarget};

/// Observable side effects for the clip list UI.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(tag = "type")]
pub enum EditorEvent {
    #[serde(rename = "clipsChanged")]
    ClipsChanged { clips: Vec<Clip> },
    #[serde(rename = "locateTargetChanged")]
    LocateTargetChanged { target: LocateTarget },
    #[serde(rename = "playingClipChanged")]
    PlayingClipChanged { clip_id: Option<String> },
    #[serde(rename = "advisory")]
    Advisory { message: String },
    /// A time field's shown text changed without the user typing.
    #[serde(rename = "timeFieldChanged")]
    TimeFieldChanged {
        clip_id: String,
        field: ClipField,
        display: String,
    },
}

pub trait EditorRuntime: Send + Sync + 'static {
    fn emit(&self, event: EditorEvent);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(&EditorEvent) + Send + Sync>;

/// Fan-out of [`EditorEvent`]s to subscribed listeners.
///
/// Constructed once per editor and injected wherever events are produced.
/// After [`EventHub::dispose`] every emit is dropped and new subscriptions
/// are refused.
#[derive(Default)]
pub struct EventHub {
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
    next_id: AtomicU64,
    disposed: AtomicBool,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &self,
        listener: impl Fn(&EditorEvent) + Send + Sync + 'static,
    ) -> Option<SubscriptionId> {
        if self.disposed.load(Ordering::Acquire) {
            return None;
        }
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, Arc::new(listener)));
        Some(id)
    }

    /// Returns `false` when the id was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.lock();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::Release);
        self.lock().clear();
    }

    pub fn listener_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(SubscriptionId, Listener)>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EditorRuntime for EventHub {
    fn emit(&self, event: EditorEvent) {
        if self.disposed.load(Ordering::Acquire) {
            return;
        }
        // Listeners may subscribe or unsubscribe from inside the callback.
        let listeners: Vec<Listener> = self.lock().iter().map(|(_, l)| l.clone()).collect();
        for listener in listeners {
            listener(&event);
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Records every emitted event.
    #[derive(Default)]
    pub struct RecordingRuntime {
        pub events: Mutex<Vec<EditorEvent>>,
    }

    impl RecordingRuntime {
        pub fn events(&self) -> Vec<EditorEvent> {
            self.events.lock().unwrap().clone()
        }

        pub fn take(&self) -> Vec<EditorEvent> {
            std::mem::take(&mut *self.events.lock().unwrap())
        }
    }

    impl EditorRuntime for RecordingRuntime {
        fn emit(&self, event: EditorEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    #[test]
    fn hub_fans_out_until_unsubscribed() {
        let hub = EventHub::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let id = hub
            .subscribe({
                let seen = seen.clone();
                move |e| seen.lock().unwrap().push(e.clone())
            })
            .unwrap();

        let event = EditorEvent::Advisory {
            message: "hi".into(),
        };
        hub.emit(event.clone());
        assert!(hub.unsubscribe(id));
        assert!(!hub.unsubscribe(id));
        hub.emit(event.clone());

        assert_eq!(*seen.lock().unwrap(), vec![event]);
    }

    #[test]
    fn disposed_hub_refuses_listeners() {
        let hub = EventHub::new();
        hub.subscribe(|_| {}).unwrap();
        hub.dispose();

        assert_eq!(hub.listener_count(), 0);
        assert!(hub.subscribe(|_| {}).is_none());
    }

    #[test]
    fn events_are_tagged() {
        let json = serde_json::to_value(EditorEvent::PlayingClipChanged {
            clip_id: Some("a".into()),
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "playingClipChanged", "clip_id": "a"})
        );
    }
}
