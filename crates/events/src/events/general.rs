use serde::{Deserialize, Serialize};

use super::FailureContext;

/// Free-form diagnostics and top-level command lifecycle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeneralEvent {
    Warning { message: String },

    DebugLog { message: String },

    /// A top-level command (build, publish, release, ...) started
    OperationStarted { operation: String },

    OperationCompleted { operation: String, success: bool },

    OperationFailed {
        operation: String,
        failure: FailureContext,
    },
}

impl GeneralEvent {
    pub fn warning(message: impl Into<String>) -> Self {
        Self::Warning {
            message: message.into(),
        }
    }

    pub fn debug(message: impl Into<String>) -> Self {
        Self::DebugLog {
            message: message.into(),
        }
    }
}
