//! Structured logging integration for events
//!
//! Pipeline and engine events arrive on the event channel and are turned into
//! tracing records here, with the event metadata attached as fields.

use hrel_events::{AppEvent, EngineEvent, EventMessage, GeneralEvent, PipelineEvent};
use tracing::level_filters::LevelFilter;
use tracing::{debug, error, info, warn};

/// Log an `EventMessage` using the tracing infrastructure with structured fields
pub fn log_event_with_tracing(message: &EventMessage) {
    let meta = &message.meta;
    if meta.tracing_level() > LevelFilter::current() {
        return;
    }
    let source = meta.source.as_str();
    let correlation = meta.correlation_id.as_deref().unwrap_or("-");

    match &message.event {
        AppEvent::General(event) => match event {
            GeneralEvent::Warning { message } => {
                warn!(source, correlation, "{message}");
            }
            GeneralEvent::DebugLog { message } => {
                debug!(source, correlation, "{message}");
            }
            GeneralEvent::OperationStarted { operation } => {
                info!(source, correlation, operation = %operation, "Operation started");
            }
            GeneralEvent::OperationCompleted { operation, success } => {
                info!(
                    source,
                    correlation,
                    operation = %operation,
                    success = success,
                    "Operation completed"
                );
            }
            GeneralEvent::OperationFailed { operation, failure } => {
                error!(
                    source,
                    correlation,
                    operation = %operation,
                    code = ?failure.code,
                    hint = ?failure.hint,
                    "Operation failed: {}",
                    failure.message
                );
            }
        },

        AppEvent::Pipeline(event) => match event {
            PipelineEvent::StageStarted { stage, targets } => {
                let targets: Vec<String> = targets.iter().map(ToString::to_string).collect();
                info!(
                    source,
                    correlation,
                    stage = %stage,
                    targets = %targets.join(","),
                    "Stage started"
                );
            }
            PipelineEvent::StageCompleted {
                stage,
                duration,
                artifacts,
            } => {
                info!(
                    source,
                    correlation,
                    stage = %stage,
                    duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
                    artifacts = artifacts,
                    "Stage completed"
                );
            }
            PipelineEvent::StageFailed { stage, failure } => {
                error!(
                    source,
                    correlation,
                    stage = %stage,
                    code = ?failure.code,
                    retryable = failure.retryable,
                    "Stage failed: {}",
                    failure.message
                );
            }
            PipelineEvent::ProjectDetected {
                app_version,
                go_version,
                git_commit,
            } => {
                info!(
                    source,
                    correlation,
                    app_version = %app_version,
                    go_version = %go_version,
                    git_commit = %git_commit,
                    "Project detected"
                );
            }
            PipelineEvent::ArtifactProduced {
                stage,
                target,
                path,
            } => {
                debug!(
                    source,
                    correlation,
                    stage = %stage,
                    target = ?target.as_ref().map(ToString::to_string),
                    path = %path.display(),
                    "Artifact produced"
                );
            }
            PipelineEvent::TagsResolved { tags } => {
                info!(source, correlation, tags = %tags.join(","), "Image tags resolved");
            }
            PipelineEvent::ImagePublished { address } => {
                info!(source, correlation, address = %address, "Image published");
            }
            PipelineEvent::ImageSigned { address } => {
                info!(source, correlation, address = %address, "Image signed");
            }
        },

        AppEvent::Engine(event) => match event {
            EngineEvent::CommandStarted {
                command_id,
                program,
                args,
            } => {
                debug!(
                    source,
                    correlation,
                    command_id = %command_id,
                    "{program} {}",
                    args.join(" ")
                );
            }
            EngineEvent::CommandCompleted {
                command_id,
                exit_code,
                duration,
                stdout_bytes,
                stderr_bytes,
            } => {
                debug!(
                    source,
                    correlation,
                    command_id = %command_id,
                    exit_code = ?exit_code,
                    duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
                    stdout_bytes = stdout_bytes,
                    stderr_bytes = stderr_bytes,
                    "Command completed"
                );
            }
            EngineEvent::CommandFailed {
                command_id,
                failure,
                duration,
            } => {
                error!(
                    source,
                    correlation,
                    command_id = %command_id,
                    code = ?failure.code,
                    duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
                    "Command failed: {}",
                    failure.message
                );
            }
            EngineEvent::RegistryLogin { registry, username } => {
                info!(
                    source,
                    correlation,
                    registry = %registry,
                    username = %username,
                    "Logged in to registry"
                );
            }
        },
    }
}
