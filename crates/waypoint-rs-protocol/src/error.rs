//! Fault taxonomy shared by the ledger and the domain servers.

use crate::{Domain, SearchId};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Coarse fault classification reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    /// The vendor gateway call failed.
    Upstream,
    /// The requested search id does not exist.
    NotFound,
    /// A predicate or request parameter is malformed.
    Validation,
    /// The durable medium refused a read or write.
    Storage,
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FaultKind::Upstream => "upstream",
            FaultKind::NotFound => "not_found",
            FaultKind::Validation => "validation",
            FaultKind::Storage => "storage",
        };
        f.write_str(name)
    }
}

/// Errors returned by a vendor gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Network or HTTP-level failure.
    #[error("request failed: {0}")]
    Request(String),
    /// Credentials missing or rejected.
    #[error("authentication failed: {0}")]
    Auth(String),
    /// Vendor quota or rate limit exhausted.
    #[error("quota exceeded: {0}")]
    Quota(String),
    /// The call did not complete in time.
    #[error("timed out: {0}")]
    Timeout(String),
    /// The vendor answered with a payload the domain schema cannot accept.
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Errors returned by ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Vendor gateway failure, carried verbatim.
    #[error("upstream fault in {domain}: {source}")]
    Upstream {
        domain: Domain,
        #[source]
        source: GatewayError,
    },
    /// No record with this id exists in the domain namespace.
    #[error("no such search in {domain}: {id}")]
    NotFound { domain: Domain, id: SearchId },
    /// Malformed predicate or request parameter.
    #[error("invalid {parameter}: {message}")]
    Validation {
        domain: Option<Domain>,
        parameter: String,
        message: String,
    },
    /// The durable medium refused a read or write.
    #[error("storage fault in {domain}: {message}")]
    Storage {
        domain: Domain,
        id: Option<SearchId>,
        message: String,
    },
}

impl LedgerError {
    /// Build a validation fault naming the offending parameter.
    pub fn validation(
        domain: Option<Domain>,
        parameter: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Validation {
            domain,
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Build a storage fault with operation context.
    pub fn storage(
        domain: Domain,
        id: Option<&SearchId>,
        context: &str,
        err: impl fmt::Display,
    ) -> Self {
        let message = match id {
            Some(id) => format!("{context} (id={id}): {err}"),
            None => format!("{context}: {err}"),
        };
        Self::Storage {
            domain,
            id: id.cloned(),
            message,
        }
    }

    /// Classify the error.
    pub fn kind(&self) -> FaultKind {
        match self {
            LedgerError::Upstream { .. } => FaultKind::Upstream,
            LedgerError::NotFound { .. } => FaultKind::NotFound,
            LedgerError::Validation { .. } => FaultKind::Validation,
            LedgerError::Storage { .. } => FaultKind::Storage,
        }
    }

    /// Domain the fault belongs to, when known.
    pub fn domain(&self) -> Option<Domain> {
        match self {
            LedgerError::Upstream { domain, .. }
            | LedgerError::NotFound { domain, .. }
            | LedgerError::Storage { domain, .. } => Some(*domain),
            LedgerError::Validation { domain, .. } => *domain,
        }
    }

    /// Attach a domain to a validation fault raised without one.
    pub fn in_domain(self, domain: Domain) -> Self {
        match self {
            LedgerError::Validation {
                domain: None,
                parameter,
                message,
            } => LedgerError::Validation {
                domain: Some(domain),
                parameter,
                message,
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FaultKind, GatewayError, LedgerError};
    use crate::{Domain, SearchId};
    use pretty_assertions::assert_eq;
    use std::error::Error;

    #[test]
    fn upstream_keeps_gateway_error_as_source() {
        let err = LedgerError::Upstream {
            domain: Domain::Flight,
            source: GatewayError::Quota("monthly searches used".to_string()),
        };
        assert_eq!(err.kind(), FaultKind::Upstream);
        assert_eq!(
            err.to_string(),
            "upstream fault in flight: quota exceeded: monthly searches used"
        );
        let source = err.source().expect("source");
        assert_eq!(source.to_string(), "quota exceeded: monthly searches used");
    }

    #[test]
    fn storage_message_includes_context_and_id() {
        let id = SearchId::parse("hotel_x_1").expect("id");
        let err = LedgerError::storage(Domain::Hotel, Some(&id), "publish record", "disk full");
        assert_eq!(
            err.to_string(),
            "storage fault in hotel: publish record (id=hotel_x_1): disk full"
        );
        assert_eq!(err.domain(), Some(Domain::Hotel));
    }

    #[test]
    fn validation_faults_pick_up_domain() {
        let err = LedgerError::validation(None, "max_price", "must be a number")
            .in_domain(Domain::Hotel);
        assert_eq!(err.domain(), Some(Domain::Hotel));
        assert_eq!(err.kind(), FaultKind::Validation);
        assert_eq!(err.to_string(), "invalid max_price: must be a number");
    }
}
