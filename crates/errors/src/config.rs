//! Configuration error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    NotFound { path: String },

    #[error("invalid config: {message}")]
    Invalid { message: String },

    #[error("parse error: {message}")]
    ParseError { message: String },

    #[error("missing required field: {field}")]
    MissingField { field: String },

    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("failed to serialize config: {error}")]
    SerializeError { error: String },

    #[error("invalid image tag {tag:?}: {reason}")]
    InvalidTag { tag: String, reason: String },

    #[error(
        "actionsIdTokenRequestUrl (exist={url_present}) and actionsIdTokenRequestToken \
         (exist={token_present}) must be provided when githubToken is provided"
    )]
    IncompleteOidc {
        url_present: bool,
        token_present: bool,
    },
}

impl UserFacingError for ConfigError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::NotFound { .. } => {
                Some("Pass --config with an existing file or drop the flag to use defaults.")
            }
            Self::MissingField { field } => Some(match field.as_str() {
                "registry" => "Set image.registry in hrel.toml, HREL_REGISTRY or --registry.",
                "app_version" => "Tag the repository or pass --app-version explicitly.",
                "go_version" => "Add a `go` directive to go.mod or pass --go-version.",
                _ => "Add the missing configuration field noted in the error message.",
            }),
            Self::InvalidValue { .. } | Self::Invalid { .. } | Self::ParseError { .. } => {
                Some("Fix the configuration value and retry the command.")
            }
            Self::InvalidTag { .. } => Some("Image tags must be non-empty after trimming."),
            Self::IncompleteOidc { .. } => Some(
                "Export ACTIONS_ID_TOKEN_REQUEST_URL and ACTIONS_ID_TOKEN_REQUEST_TOKEN \
                 (grant `id-token: write` to the workflow) or drop the GitHub token.",
            ),
            Self::SerializeError { .. } => None,
        }
    }

    fn is_retryable(&self) -> bool {
        false
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::NotFound { .. } => "config.not_found",
            Self::Invalid { .. } => "config.invalid",
            Self::ParseError { .. } => "config.parse_error",
            Self::MissingField { .. } => "config.missing_field",
            Self::InvalidValue { .. } => "config.invalid_value",
            Self::SerializeError { .. } => "config.serialize_error",
            Self::InvalidTag { .. } => "config.invalid_tag",
            Self::IncompleteOidc { .. } => "config.incomplete_oidc",
        };
        Some(code)
    }
}
