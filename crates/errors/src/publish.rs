//! Image publishing error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum PublishError {
    #[error("failed to publish image: {message}")]
    Failed { message: String },

    #[error("no image tags to publish")]
    NoTags,

    #[error("publish returned no image addresses")]
    NoAddresses,
}

impl UserFacingError for PublishError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::NoTags => Some("Pass at least one --tag or set image.default_tags."),
            _ => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::Failed { .. } => "publish.failed",
            Self::NoTags => "publish.no_tags",
            Self::NoAddresses => "publish.no_addresses",
        };
        Some(code)
    }
}
