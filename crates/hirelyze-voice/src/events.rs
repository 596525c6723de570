//! Voice SDK events and the handler registry they are dispatched through.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

/// Speaker of a transcript line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// Whether a transcript chunk is still being revised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptType {
    Partial,
    Final,
}

/// A message pushed by the voice SDK during a call.
///
/// Only transcripts are interpreted; every other message type is accepted
/// and ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum VoiceMessage {
    #[serde(rename_all = "camelCase")]
    Transcript {
        role: Role,
        transcript_type: TranscriptType,
        transcript: String,
    },
    #[serde(other)]
    Other,
}

/// A lifecycle or content event emitted by the voice SDK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceEvent {
    CallStart,
    CallEnd,
    Message(VoiceMessage),
    SpeechStart,
    SpeechEnd,
    Error(String),
}

/// Event names handlers subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    CallStart,
    CallEnd,
    Message,
    SpeechStart,
    SpeechEnd,
    Error,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CallStart => "call-start",
            Self::CallEnd => "call-end",
            Self::Message => "message",
            Self::SpeechStart => "speech-start",
            Self::SpeechEnd => "speech-end",
            Self::Error => "error",
        }
    }
}

impl VoiceEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::CallStart => EventKind::CallStart,
            Self::CallEnd => EventKind::CallEnd,
            Self::Message(_) => EventKind::Message,
            Self::SpeechStart => EventKind::SpeechStart,
            Self::SpeechEnd => EventKind::SpeechEnd,
            Self::Error(_) => EventKind::Error,
        }
    }
}

type Handler = Arc<dyn Fn(&VoiceEvent) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: Vec<(u64, EventKind, Handler)>,
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    match registry.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::error!("voice event registry lock poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

/// Handler registry for voice SDK events.
///
/// Handlers run synchronously on the emitting task, outside the registry
/// lock, so a handler may itself subscribe or drop subscriptions.
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Arc<Mutex<Registry>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for events of `kind`. The handler stays
    /// registered until the returned [`Subscription`] is dropped.
    #[must_use = "dropping the subscription unregisters the handler"]
    pub fn on<F>(&self, kind: EventKind, handler: F) -> Subscription
    where
        F: Fn(&VoiceEvent) + Send + Sync + 'static,
    {
        let mut registry = lock(&self.registry);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.handlers.push((id, kind, Arc::new(handler)));

        Subscription {
            registry: Arc::downgrade(&self.registry),
            id,
            kind,
        }
    }

    /// Dispatches `event` to every handler registered for its kind and
    /// returns how many ran.
    pub fn emit(&self, event: &VoiceEvent) -> usize {
        let kind = event.kind();
        let matching: Vec<Handler> = lock(&self.registry)
            .handlers
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .map(|(_, _, h)| Arc::clone(h))
            .collect();

        tracing::trace!(event = kind.as_str(), handlers = matching.len(), "voice event");
        for handler in &matching {
            handler(event);
        }
        matching.len()
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.registry).handlers.len()
    }
}

/// Guard for a registered handler; dropping it unregisters the handler.
#[derive(Debug)]
pub struct Subscription {
    registry: Weak<Mutex<Registry>>,
    id: u64,
    kind: EventKind,
}

impl Subscription {
    pub fn kind(&self) -> EventKind {
        self.kind
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry).handlers.retain(|(id, _, _)| *id != self.id);
        }
    }
}
