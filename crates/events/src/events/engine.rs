use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::FailureContext;

/// Container engine invocations; `args` never contain secret values
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EngineEvent {
    CommandStarted {
        command_id: String,
        program: String,
        args: Vec<String>,
    },

    CommandCompleted {
        command_id: String,
        exit_code: Option<i32>,
        duration: Duration,
        stdout_bytes: u64,
        stderr_bytes: u64,
    },

    CommandFailed {
        command_id: String,
        failure: FailureContext,
        duration: Duration,
    },

    RegistryLogin { registry: String, username: String },
}
