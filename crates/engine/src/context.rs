//! Per-run context handed to every engine call

use hrel_events::{EventEmitter, EventSender};

/// Context for engine operations, providing event emission
#[derive(Clone, Default)]
pub struct EngineContext {
    event_sender: Option<EventSender>,
    correlation_id: Option<String>,
}

impl EngineContext {
    #[must_use]
    pub fn new(event_sender: Option<EventSender>) -> Self {
        Self {
            event_sender,
            correlation_id: None,
        }
    }

    /// Context that drops every event
    #[must_use]
    pub fn silent() -> Self {
        Self::default()
    }

    /// Stamp emitted events with a run identifier
    #[must_use]
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }
}

impl EventEmitter for EngineContext {
    fn event_sender(&self) -> Option<&EventSender> {
        self.event_sender.as_ref()
    }

    fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }
}
