//! Signing error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum SigningError {
    #[error("failed to sign image {image}: {message}")]
    SignFailed { image: String, message: String },

    #[error("no image address to sign")]
    EmptyAddress,
}

impl UserFacingError for SigningError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::EmptyAddress => {
                Some("Sign the address printed by `hrel publish` (image@sha256:...).")
            }
            Self::SignFailed { .. } => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::SignFailed { .. } => "signing.sign_failed",
            Self::EmptyAddress => "signing.empty_address",
        };
        Some(code)
    }
}
