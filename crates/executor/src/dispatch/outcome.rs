use serde::Serialize;

use crate::runner::ExecutionResult;

/// Fixed warning text for a firing alert with no configured command.
pub const NO_MAPPING_WARNING: &str = "No command found for this alert_id";

/// Fixed error text when the mapping source cannot be read.
pub const CONFIG_UNAVAILABLE_ERROR: &str = "Configuration file not found";

/// One entry in the batch response. Untagged: each variant serializes
/// as a flat record whose fields identify it.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum AlertOutcome {
    Execution(ExecutionResult),
    NoMapping {
        alert: String,
        alert_id: String,
        warning: String,
    },
    ExtractionFailed {
        alert: String,
        error: String,
    },
    ConfigUnavailable {
        alert: String,
        error: String,
    },
}

#[derive(Debug, Serialize)]
pub struct DispatchResponse {
    pub results: Vec<AlertOutcome>,
}
