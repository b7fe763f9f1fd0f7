use crate::{FaultKind, LedgerError};

/// Errors returned by tools and resource reads.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Tool name was not found in registry.
    #[error("tool not found: {0}")]
    ToolNotFound(String),
    /// Tool received invalid arguments.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    /// The referenced search or resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// Vendor gateway failure.
    #[error("upstream failure: {0}")]
    Upstream(String),
    /// Storage failure.
    #[error("storage failure: {0}")]
    Storage(String),
    /// Tool execution failed for any other reason.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),
}

impl ToolError {
    /// Fault kind for ledger-originated errors.
    pub fn fault_kind(&self) -> Option<FaultKind> {
        match self {
            ToolError::InvalidArguments(_) => Some(FaultKind::Validation),
            ToolError::NotFound(_) => Some(FaultKind::NotFound),
            ToolError::Upstream(_) => Some(FaultKind::Upstream),
            ToolError::Storage(_) => Some(FaultKind::Storage),
            ToolError::ToolNotFound(_) | ToolError::ExecutionFailed(_) => None,
        }
    }
}

impl From<LedgerError> for ToolError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err.kind() {
            FaultKind::Upstream => ToolError::Upstream(message),
            FaultKind::NotFound => ToolError::NotFound(message),
            FaultKind::Validation => ToolError::InvalidArguments(message),
            FaultKind::Storage => ToolError::Storage(message),
        }
    }
}
