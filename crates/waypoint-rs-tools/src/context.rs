//! Tool execution context.

use crate::Tool;
use crate::output_policy::ToolOutputPolicy;
use log::{debug, warn};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;
use waypoint_rs_ledger::{Ledger, VendorGateway};
use waypoint_rs_protocol::{Domain, ToolError};

/// Services shared by every tool call on one domain server.
pub struct DomainServices {
    pub ledger: Arc<Ledger>,
    /// Provider call used by the search tool. Read-only servers leave it unset.
    pub gateway: Option<Arc<dyn VendorGateway>>,
    pub output_policy: Option<ToolOutputPolicy>,
}

/// Context passed to tools during execution.
///
/// Per-call identity is stored directly; shared services sit behind an
/// `Arc` so cloning per call is a reference-count bump.
#[derive(Clone)]
pub struct ToolContext {
    pub domain: Domain,
    /// Id of this invocation, for log correlation.
    pub call_id: Uuid,
    pub tool_name: Option<String>,
    pub services: Arc<DomainServices>,
}

impl ToolContext {
    pub fn new(domain: Domain, services: Arc<DomainServices>) -> Self {
        Self {
            domain,
            call_id: Uuid::new_v4(),
            tool_name: None,
            services,
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.services.ledger
    }

    /// The configured gateway, checked against this server's domain.
    pub fn gateway(&self) -> Result<&dyn VendorGateway, ToolError> {
        let gateway = self.services.gateway.as_deref().ok_or_else(|| {
            ToolError::ExecutionFailed(format!(
                "no vendor gateway configured for {}",
                self.domain
            ))
        })?;
        if gateway.domain() != self.domain {
            return Err(ToolError::ExecutionFailed(format!(
                "gateway serves {}, not {}",
                gateway.domain(),
                self.domain
            )));
        }
        Ok(gateway)
    }

    pub fn apply_output_policy(&self, value: Value) -> Value {
        match self.services.output_policy.as_ref() {
            Some(policy) => policy.apply(value),
            None => value,
        }
    }

    /// Run a tool and pass its result through the output policy.
    pub async fn execute_tool(&mut self, tool: &dyn Tool, args: Value) -> Result<Value, ToolError> {
        self.tool_name = Some(tool.name().to_string());
        self.call_id = Uuid::new_v4();
        debug!(
            "executing tool (domain={}, tool_name={}, call_id={})",
            self.domain,
            tool.name(),
            self.call_id
        );
        match tool.call(self, args).await {
            Ok(result) => Ok(self.apply_output_policy(result)),
            Err(err) => {
                warn!(
                    "tool failed (domain={}, tool_name={}, call_id={}): {}",
                    self.domain,
                    tool.name(),
                    self.call_id,
                    err
                );
                Err(err)
            }
        }
    }
}

impl std::fmt::Debug for ToolContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolContext")
            .field("domain", &self.domain)
            .field("call_id", &self.call_id)
            .field("tool_name", &self.tool_name)
            .finish()
    }
}
