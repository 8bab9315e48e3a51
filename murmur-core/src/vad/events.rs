//! Detector notifications and the subscriber registry that delivers them.
//!
//! Listeners run synchronously inside `process`, in registration order.
//! They must not block and must not call back into the detector.
//!
//! A caller that prefers polling can take a [`Listeners::channel`] tap and
//! drain it from its capture loop instead of registering closures.

use crossbeam_channel::{Receiver, Sender, TrySendError};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Something a detector observed, stamped with its virtual clock.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum VadEvent {
    /// A speech segment opened.
    SpeechBegin { at_ms: f64 },
    /// The open speech segment closed.
    SpeechEnd { at_ms: f64 },
    /// The silence timeout elapsed without any speech segment ever opening.
    SpeechNotDetected { at_ms: f64 },
    /// Periodic input level in [0.0, 1.0].
    AudioLevel { at_ms: f64, level: f32 },
}

impl VadEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            VadEvent::SpeechBegin { .. } => EventKind::SpeechBegin,
            VadEvent::SpeechEnd { .. } => EventKind::SpeechEnd,
            VadEvent::SpeechNotDetected { .. } => EventKind::SpeechNotDetected,
            VadEvent::AudioLevel { .. } => EventKind::AudioLevel,
        }
    }

    pub fn at_ms(&self) -> f64 {
        match *self {
            VadEvent::SpeechBegin { at_ms }
            | VadEvent::SpeechEnd { at_ms }
            | VadEvent::SpeechNotDetected { at_ms }
            | VadEvent::AudioLevel { at_ms, .. } => at_ms,
        }
    }
}

/// Discriminant of [`VadEvent`], used to filter subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    SpeechBegin,
    SpeechEnd,
    SpeechNotDetected,
    AudioLevel,
}

/// Handle returned by every subscription, accepted by [`Listeners::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Callback = Box<dyn FnMut(&VadEvent) + Send>;

struct Listener {
    id: ListenerId,
    /// `None` receives every event.
    kind: Option<EventKind>,
    callback: Callback,
}

/// Ordered fan-out of detector events to zero or more subscribers.
#[derive(Default)]
pub struct Listeners {
    entries: Vec<Listener>,
    next_id: u64,
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.entries.len())
            .finish()
    }
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_speech_begin(&mut self, mut f: impl FnMut() + Send + 'static) -> ListenerId {
        self.register(Some(EventKind::SpeechBegin), Box::new(move |_| f()))
    }

    pub fn on_speech_end(&mut self, mut f: impl FnMut() + Send + 'static) -> ListenerId {
        self.register(Some(EventKind::SpeechEnd), Box::new(move |_| f()))
    }

    pub fn on_speech_not_detected(&mut self, mut f: impl FnMut() + Send + 'static) -> ListenerId {
        self.register(Some(EventKind::SpeechNotDetected), Box::new(move |_| f()))
    }

    pub fn on_audio_level(&mut self, mut f: impl FnMut(f32) + Send + 'static) -> ListenerId {
        self.register(
            Some(EventKind::AudioLevel),
            Box::new(move |ev| {
                if let VadEvent::AudioLevel { level, .. } = ev {
                    f(*level);
                }
            }),
        )
    }

    /// Receive every event, including its timestamp.
    pub fn on_event(&mut self, f: impl FnMut(&VadEvent) + Send + 'static) -> ListenerId {
        self.register(None, Box::new(f))
    }

    /// Tap all events into a bounded channel.
    ///
    /// Events that do not fit are dropped with a warning; the detector never
    /// waits on a slow reader.
    pub fn channel(&mut self, capacity: usize) -> Receiver<VadEvent> {
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        self.register(None, Box::new(move |ev| forward(&tx, ev)));
        rx
    }

    /// Remove a subscription. Returns `false` if the id was unknown.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|l| l.id != id);
        self.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Deliver `event` to every matching subscriber, oldest first.
    pub fn emit(&mut self, event: VadEvent) {
        let kind = event.kind();
        for listener in &mut self.entries {
            if listener.kind.map_or(true, |k| k == kind) {
                (listener.callback)(&event);
            }
        }
    }

    fn register(&mut self, kind: Option<EventKind>, callback: Callback) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push(Listener { id, kind, callback });
        id
    }
}

fn forward(tx: &Sender<VadEvent>, event: &VadEvent) {
    match tx.try_send(*event) {
        Ok(()) | Err(TrySendError::Disconnected(_)) => {}
        Err(TrySendError::Full(ev)) => {
            warn!(kind = ?ev.kind(), "event channel full; dropping event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn delivers_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut listeners = Listeners::new();

        for name in ["first", "second", "third"] {
            let log = Arc::clone(&log);
            listeners.on_speech_begin(move || log.lock().unwrap().push(name));
        }
        listeners.emit(VadEvent::SpeechBegin { at_ms: 30.0 });

        assert_eq!(*log.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn typed_listeners_only_see_their_kind() {
        let begins = Arc::new(Mutex::new(0));
        let levels = Arc::new(Mutex::new(Vec::new()));
        let mut listeners = Listeners::new();
        {
            let begins = Arc::clone(&begins);
            listeners.on_speech_begin(move || *begins.lock().unwrap() += 1);
        }
        {
            let levels = Arc::clone(&levels);
            listeners.on_audio_level(move |l| levels.lock().unwrap().push(l));
        }

        listeners.emit(VadEvent::AudioLevel { at_ms: 100.0, level: 0.25 });
        listeners.emit(VadEvent::SpeechEnd { at_ms: 200.0 });

        assert_eq!(*begins.lock().unwrap(), 0);
        assert_eq!(*levels.lock().unwrap(), vec![0.25]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let hits = Arc::new(Mutex::new(0));
        let mut listeners = Listeners::new();
        let id = {
            let hits = Arc::clone(&hits);
            listeners.on_speech_end(move || *hits.lock().unwrap() += 1)
        };

        listeners.emit(VadEvent::SpeechEnd { at_ms: 1.0 });
        assert!(listeners.unsubscribe(id));
        assert!(!listeners.unsubscribe(id));
        listeners.emit(VadEvent::SpeechEnd { at_ms: 2.0 });

        assert_eq!(*hits.lock().unwrap(), 1);
        assert!(listeners.is_empty());
    }

    #[test]
    fn channel_tap_drops_when_full() {
        let mut listeners = Listeners::new();
        let rx = listeners.channel(1);

        listeners.emit(VadEvent::SpeechBegin { at_ms: 10.0 });
        listeners.emit(VadEvent::SpeechEnd { at_ms: 20.0 });

        assert_eq!(rx.try_recv(), Ok(VadEvent::SpeechBegin { at_ms: 10.0 }));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn event_serializes_with_camel_case_tag() {
        let json = serde_json::to_value(VadEvent::SpeechNotDetected { at_ms: 3510.0 })
            .expect("serialize event");
        assert_eq!(json["type"], "speechNotDetected");
        assert_eq!(json["atMs"], 3510.0);

        let level = serde_json::to_value(VadEvent::AudioLevel { at_ms: 100.0, level: 0.5 })
            .expect("serialize level");
        assert_eq!(level["type"], "audioLevel");
        assert_eq!(level["level"], 0.5);
    }
}
