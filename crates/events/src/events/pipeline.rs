use hrel_types::Target;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use super::FailureContext;

/// Pipeline stages in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Detect,
    Build,
    Archive,
    Publish,
    Sign,
    Sbom,
}

impl Stage {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Detect => "detect",
            Self::Build => "build",
            Self::Archive => "archive",
            Self::Publish => "publish",
            Self::Sign => "sign",
            Self::Sbom => "sbom",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stage lifecycle and artifact events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PipelineEvent {
    StageStarted {
        stage: Stage,
        targets: Vec<Target>,
    },

    StageCompleted {
        stage: Stage,
        duration: Duration,
        artifacts: usize,
    },

    StageFailed {
        stage: Stage,
        failure: FailureContext,
    },

    /// Versions resolved from the source checkout
    ProjectDetected {
        app_version: String,
        go_version: String,
        git_commit: String,
    },

    /// A file landed in the dist directory
    ArtifactProduced {
        stage: Stage,
        target: Option<Target>,
        path: PathBuf,
    },

    /// Tags after trimming and `v` stripping
    TagsResolved { tags: Vec<String> },

    ImagePublished { address: String },

    ImageSigned { address: String },
}
