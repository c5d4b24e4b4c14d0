//! Container engine error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

/// Errors raised while driving the container engine
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum EngineError {
    #[error("container engine not available: {program}")]
    Unavailable { program: String },

    #[error("failed to spawn {program}: {message}")]
    SpawnFailed { program: String, message: String },

    #[error("{command} exited with {exit_code:?}: {stderr}")]
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("registry login to {registry} failed: {message}")]
    LoginFailed { registry: String, message: String },

    #[error("image build failed: {message}")]
    ImageBuildFailed { message: String },

    #[error("could not read image metadata: {message}")]
    MetadataMissing { message: String },

    #[error("invalid container spec: {message}")]
    InvalidSpec { message: String },
}

impl UserFacingError for EngineError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::Unavailable { .. } | Self::SpawnFailed { .. } => {
                Some("Install docker or podman, or point --engine at a compatible binary.")
            }
            Self::LoginFailed { .. } => Some("Check the registry address and credentials."),
            Self::ImageBuildFailed { .. } => {
                Some("Multi-platform builds need `docker buildx` with QEMU emulation enabled.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::LoginFailed { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::Unavailable { .. } => "engine.unavailable",
            Self::SpawnFailed { .. } => "engine.spawn_failed",
            Self::CommandFailed { .. } => "engine.command_failed",
            Self::LoginFailed { .. } => "engine.login_failed",
            Self::ImageBuildFailed { .. } => "engine.image_build_failed",
            Self::MetadataMissing { .. } => "engine.metadata_missing",
            Self::InvalidSpec { .. } => "engine.invalid_spec",
        };
        Some(code)
    }
}
