//! Integration tests for events

#[cfg(test)]
mod tests {
    use hrel_errors::{BuildError, Error};
    use hrel_events::*;
    use hrel_types::{Target, TargetArch, TargetOs};
    use std::time::Duration;

    #[tokio::test]
    async fn test_event_sender_emit_helpers() {
        let (tx, mut rx) = channel();

        tx.emit_warning("signing by tag");
        tx.emit_debug("test debug");

        let first = rx.recv().await.unwrap();
        assert!(matches!(
            first.event,
            AppEvent::General(GeneralEvent::Warning { .. })
        ));
        assert_eq!(first.meta.level, EventLevel::Warn);
        assert!(first.meta.correlation_id.is_none());

        let second = rx.recv().await.unwrap();
        assert!(matches!(
            second.event,
            AppEvent::General(GeneralEvent::DebugLog { .. })
        ));
        assert_eq!(second.meta.source, EventSource::General);
    }

    #[tokio::test]
    async fn test_stage_lifecycle_roundtrip() {
        let (tx, mut rx) = channel();
        let target = Target::new(TargetOs::Darwin, TargetArch::Arm64);

        tx.emit_stage_started(Stage::Build, &[target]);
        tx.emit_artifact(Stage::Build, Some(target), "dist/bin/harbor-cli");
        tx.emit_stage_completed(Stage::Build, Duration::from_secs(3), 1);

        let started = rx.recv().await.unwrap();
        match started.event {
            AppEvent::Pipeline(PipelineEvent::StageStarted { stage, targets }) => {
                assert_eq!(stage, Stage::Build);
                assert_eq!(targets, vec![target]);
            }
            other => panic!("unexpected {other:?}"),
        }

        let artifact = rx.recv().await.unwrap();
        assert_eq!(artifact.meta.level, EventLevel::Debug);

        let completed = rx.recv().await.unwrap();
        assert!(matches!(
            completed.event,
            AppEvent::Pipeline(PipelineEvent::StageCompleted { artifacts: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_operation_failure_carries_context() {
        let (tx, mut rx) = channel();
        let err = Error::from(BuildError::MissingBinary {
            path: "dist/bin/harbor-cli_v1_linux_amd64".into(),
        })
        .context("release");

        tx.emit_operation_failed("release", &err);

        let message = rx.recv().await.unwrap();
        match message.event {
            AppEvent::General(GeneralEvent::OperationFailed { operation, failure }) => {
                assert_eq!(operation, "release");
                assert_eq!(failure.code.as_deref(), Some("build.missing_binary"));
                assert!(failure.message.starts_with("release: "));
                assert!(!failure.retryable);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_message_serializes_with_meta() {
        let message = EventMessage::from_event(AppEvent::Engine(EngineEvent::RegistryLogin {
            registry: "demo.goharbor.io".into(),
            username: "robot".into(),
        }));
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["event"]["domain"], "engine");
        assert_eq!(json["event"]["event"]["type"], "RegistryLogin");
        assert_eq!(json["meta"]["source"], "engine");
    }
}
