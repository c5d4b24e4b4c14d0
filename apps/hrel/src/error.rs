//! CLI error handling

use std::fmt;

use hrel_errors::UserFacingError;

/// CLI-specific error type
#[derive(Debug)]
pub enum CliError {
    /// Pipeline, engine or configuration error
    Pipeline(hrel_errors::Error),
    /// Invalid command arguments
    InvalidArguments(String),
    /// Writing results failed
    Io(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Pipeline(e) => {
                let message = e.user_message();
                write!(f, "{message}")?;
                if let Some(code) = e.user_code() {
                    write!(f, "\n  Code: {code}")?;
                }
                if let Some(hint) = e.user_hint() {
                    write!(f, "\n  Hint: {hint}")?;
                }
                if e.is_retryable() {
                    write!(f, "\n  Retry: safe to retry this operation.")?;
                }
                Ok(())
            }
            CliError::InvalidArguments(msg) => write!(f, "Invalid arguments: {msg}"),
            CliError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl CliError {
    /// Machine-readable form printed in `--json` mode
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            CliError::Pipeline(e) => serde_json::json!({
                "error": e.user_message(),
                "code": e.user_code(),
                "hint": e.user_hint(),
                "retryable": e.is_retryable(),
            }),
            other => serde_json::json!({ "error": other.to_string() }),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Pipeline(e) => Some(e),
            CliError::Io(e) => Some(e),
            CliError::InvalidArguments(_) => None,
        }
    }
}

impl From<hrel_errors::Error> for CliError {
    fn from(e: hrel_errors::Error) -> Self {
        CliError::Pipeline(e)
    }
}

impl From<hrel_errors::ConfigError> for CliError {
    fn from(e: hrel_errors::ConfigError) -> Self {
        CliError::Pipeline(e.into())
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}
