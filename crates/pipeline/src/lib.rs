#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Release pipeline stages for hrel
//!
//! Each stage turns configuration and project versions into container
//! specs, hands them to a [`ContainerEngine`] and checks what landed in the
//! dist directory. Stages run strictly one after another and the first
//! failure aborts the run.

pub mod archive;
pub mod build;
pub mod credentials;
pub mod project;
pub mod publish;
pub mod release;
pub mod sbom;
pub mod sign;

pub use build::BuildKind;
pub use credentials::{OidcCredentials, RegistryCredentials};
pub use project::{parse_go_directive, ProjectInfo};
pub use release::ReleaseReport;

use hrel_config::Config;
use hrel_engine::{ContainerEngine, EngineContext};
use hrel_errors::Error;
use hrel_events::{AppEvent, EventEmitter, EventSender, PipelineEvent, Stage};
use hrel_types::Target;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Everything a stage needs: settings, the checkout and an engine
pub struct Pipeline {
    config: Config,
    source_dir: PathBuf,
    engine: Arc<dyn ContainerEngine>,
    ctx: EngineContext,
}

impl Pipeline {
    pub fn new(
        config: Config,
        source_dir: impl Into<PathBuf>,
        engine: Arc<dyn ContainerEngine>,
        ctx: EngineContext,
    ) -> Self {
        Self {
            config,
            source_dir: source_dir.into(),
            engine,
            ctx,
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// Root of all produced artifacts
    #[must_use]
    pub fn dist_dir(&self) -> PathBuf {
        self.config.dist_path(&self.source_dir)
    }

    /// Resolve project versions and announce them
    ///
    /// # Errors
    ///
    /// Returns an error if the application or Go version cannot be found.
    pub async fn detect(&self) -> Result<ProjectInfo, Error> {
        self.stage(Stage::Detect, &[], async {
            let info = ProjectInfo::detect(&self.source_dir, &self.config.project).await?;
            self.emit(AppEvent::Pipeline(PipelineEvent::ProjectDetected {
                app_version: info.app_version.clone(),
                go_version: info.go_version.clone(),
                git_commit: info.git_commit.clone(),
            }));
            Ok::<_, Error>(info)
        })
        .await
    }

    /// Run `work` bracketed by stage lifecycle events
    async fn stage<T, F>(&self, stage: Stage, targets: &[Target], work: F) -> Result<T, Error>
    where
        T: StageOutput,
        F: Future<Output = Result<T, Error>>,
    {
        let start = Instant::now();
        self.emit_stage_started(stage, targets);

        match work.await {
            Ok(output) => {
                self.emit_stage_completed(stage, start.elapsed(), output.artifact_count());
                Ok(output)
            }
            Err(error) => {
                self.emit_stage_failed(stage, &error);
                Err(error)
            }
        }
    }
}

impl EventEmitter for Pipeline {
    fn event_sender(&self) -> Option<&EventSender> {
        self.ctx.event_sender()
    }

    fn correlation_id(&self) -> Option<&str> {
        self.ctx.correlation_id()
    }
}

/// Number of artifacts a stage reports on completion
trait StageOutput {
    fn artifact_count(&self) -> usize;
}

impl<T> StageOutput for Vec<T> {
    fn artifact_count(&self) -> usize {
        self.len()
    }
}

impl StageOutput for String {
    fn artifact_count(&self) -> usize {
        1
    }
}

impl StageOutput for ProjectInfo {
    fn artifact_count(&self) -> usize {
        0
    }
}
