//! SBOM error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum SbomError {
    #[error("dist directory is empty: {path} (run build first)")]
    EmptyDist { path: String },

    #[error("could not read dist directory {path}: {message}")]
    UnreadableDist { path: String, message: String },

    #[error("archive missing for SBOM generation: {archive}")]
    MissingArchive { archive: String },

    #[error("SBOM generation failed for {archive}: {message}")]
    GenerationFailed { archive: String, message: String },
}

impl UserFacingError for SbomError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::EmptyDist { .. } | Self::MissingArchive { .. } => {
                Some("Run `hrel build` and `hrel archive` before generating SBOMs.")
            }
            _ => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::EmptyDist { .. } => "sbom.empty_dist",
            Self::UnreadableDist { .. } => "sbom.unreadable_dist",
            Self::MissingArchive { .. } => "sbom.missing_archive",
            Self::GenerationFailed { .. } => "sbom.generation_failed",
        };
        Some(code)
    }
}
