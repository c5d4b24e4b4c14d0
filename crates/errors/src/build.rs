//! Build stage error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum BuildError {
    #[error("build failed for {target}: {message}")]
    Failed { target: String, message: String },

    #[error("expected binary missing after build: {path}")]
    MissingBinary { path: String },

    #[error("project detection failed: {message}")]
    DetectionFailed { message: String },

    #[error("git command failed: {message}")]
    GitFailed { message: String },

    #[error("archive creation failed for {archive}: {message}")]
    ArchiveFailed { archive: String, message: String },
}

impl UserFacingError for BuildError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::MissingBinary { .. } => Some("Run `hrel build` before packaging."),
            Self::GitFailed { .. } | Self::DetectionFailed { .. } => {
                Some("Run hrel from a git checkout of the project or pass the versions explicitly.")
            }
            _ => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::Failed { .. } => "build.failed",
            Self::MissingBinary { .. } => "build.missing_binary",
            Self::DetectionFailed { .. } => "build.detection_failed",
            Self::GitFailed { .. } => "build.git_failed",
            Self::ArchiveFailed { .. } => "build.archive_failed",
        };
        Some(code)
    }
}
