#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Event system for async communication in hrel
//!
//! Pipeline stages never print. They emit domain events through an
//! [`EventEmitter`]; the CLI drains the channel and turns events into
//! structured `tracing` records.

pub mod meta;
pub use meta::{EventLevel, EventMeta, EventSource};

pub mod events;
pub use events::{
    AppEvent, EngineEvent, FailureContext, GeneralEvent, PipelineEvent, Stage,
};

use hrel_errors::UserFacingError;
use hrel_types::Target;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// An event together with its emission metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub meta: EventMeta,
    pub event: AppEvent,
}

impl EventMessage {
    /// Wrap an event with metadata derived from the event itself
    #[must_use]
    pub fn from_event(event: AppEvent) -> Self {
        let meta = EventMeta::new(event.log_level(), event.event_source());
        Self { meta, event }
    }
}

pub type EventSender = UnboundedSender<EventMessage>;

pub type EventReceiver = UnboundedReceiver<EventMessage>;

/// Create a new event channel
#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// The unified trait for emitting events throughout hrel
///
/// Works the same whether you hold a raw `EventSender` or a struct that
/// carries an optional one.
pub trait EventEmitter {
    /// Get the event sender for this emitter
    fn event_sender(&self) -> Option<&EventSender>;

    /// Correlation id stamped on every emitted event
    fn correlation_id(&self) -> Option<&str> {
        None
    }

    fn emit(&self, event: AppEvent) {
        if let Some(sender) = self.event_sender() {
            let mut message = EventMessage::from_event(event);
            if let Some(id) = self.correlation_id() {
                message.meta = message.meta.with_correlation_id(id);
            }
            // Receiver may be gone during shutdown
            let _ = sender.send(message);
        }
    }

    fn emit_debug(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::debug(message)));
    }

    fn emit_warning(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::warning(message)));
    }

    fn emit_operation_started(&self, operation: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::OperationStarted {
            operation: operation.into(),
        }));
    }

    fn emit_operation_completed(&self, operation: impl Into<String>, success: bool) {
        self.emit(AppEvent::General(GeneralEvent::OperationCompleted {
            operation: operation.into(),
            success,
        }));
    }

    fn emit_operation_failed<E>(&self, operation: impl Into<String>, error: &E)
    where
        E: UserFacingError + ?Sized,
    {
        self.emit(AppEvent::General(GeneralEvent::OperationFailed {
            operation: operation.into(),
            failure: FailureContext::from_error(error),
        }));
    }

    fn emit_stage_started(&self, stage: Stage, targets: &[Target]) {
        self.emit(AppEvent::Pipeline(PipelineEvent::StageStarted {
            stage,
            targets: targets.to_vec(),
        }));
    }

    fn emit_stage_completed(&self, stage: Stage, duration: Duration, artifacts: usize) {
        self.emit(AppEvent::Pipeline(PipelineEvent::StageCompleted {
            stage,
            duration,
            artifacts,
        }));
    }

    fn emit_stage_failed<E>(&self, stage: Stage, error: &E)
    where
        E: UserFacingError + ?Sized,
    {
        self.emit(AppEvent::Pipeline(PipelineEvent::StageFailed {
            stage,
            failure: FailureContext::from_error(error),
        }));
    }

    fn emit_artifact(&self, stage: Stage, target: Option<Target>, path: impl Into<PathBuf>) {
        self.emit(AppEvent::Pipeline(PipelineEvent::ArtifactProduced {
            stage,
            target,
            path: path.into(),
        }));
    }
}

/// Implementation of `EventEmitter` for the raw `EventSender`
impl EventEmitter for EventSender {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hrel_errors::{ConfigError, Error};

    struct Tagged {
        sender: EventSender,
    }

    impl EventEmitter for Tagged {
        fn event_sender(&self) -> Option<&EventSender> {
            Some(&self.sender)
        }

        fn correlation_id(&self) -> Option<&str> {
            Some("run-1")
        }
    }

    #[tokio::test]
    async fn emits_with_metadata_from_event() {
        let (tx, mut rx) = channel();
        let emitter = Tagged { sender: tx };

        emitter.emit_stage_started(Stage::Build, &[]);
        let err = Error::from(ConfigError::MissingField {
            field: "registry".to_string(),
        });
        emitter.emit_stage_failed(Stage::Publish, &err);

        let started = rx.recv().await.unwrap();
        assert_eq!(started.meta.level, EventLevel::Info);
        assert_eq!(started.meta.source, EventSource::Pipeline);
        assert_eq!(started.meta.correlation_id.as_deref(), Some("run-1"));

        let failed = rx.recv().await.unwrap();
        assert_eq!(failed.meta.level, EventLevel::Error);
        match failed.event {
            AppEvent::Pipeline(PipelineEvent::StageFailed { stage, failure }) => {
                assert_eq!(stage, Stage::Publish);
                assert_eq!(failure.code.as_deref(), Some("config.missing_field"));
                assert!(failure.hint.is_some());
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn dropped_receiver_is_ignored() {
        let (tx, rx) = channel();
        drop(rx);
        tx.emit_warning("nobody listening");
    }

    #[test]
    fn events_serialize_with_domain_tag() {
        let event = AppEvent::Pipeline(PipelineEvent::TagsResolved {
            tags: vec!["1.0.0".to_string()],
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["domain"], "pipeline");
        assert_eq!(json["event"]["type"], "TagsResolved");
    }
}
