//! One domain server: its tools and resources over a shared ledger.

use crate::context::{DomainServices, ToolContext};
use crate::domain::register_domain_tools;
use crate::output_policy::ToolOutputPolicy;
use crate::registry::ToolRegistry;
use crate::resources::{ResourceTarget, parse_resource_uri, render_detail, render_listing, resource_templates};
use crate::tool::ToolSpec;
use log::{debug, info};
use serde_json::Value;
use std::sync::Arc;
use waypoint_rs_ledger::{Ledger, VendorGateway};
use waypoint_rs_protocol::{Domain, ToolError};

/// Tools and resources for one search domain.
pub struct DomainServer {
    domain: Domain,
    services: Arc<DomainServices>,
    registry: ToolRegistry,
}

impl DomainServer {
    pub fn builder(domain: Domain, ledger: Arc<Ledger>) -> DomainServerBuilder {
        DomainServerBuilder {
            domain,
            ledger,
            gateway: None,
            output_policy: None,
        }
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn tools(&self) -> Vec<ToolSpec> {
        self.registry.specs()
    }

    pub fn resource_templates(&self) -> [String; 2] {
        resource_templates(self.domain)
    }

    /// Run a tool by name.
    pub async fn call_tool(&self, name: &str, args: Value) -> Result<Value, ToolError> {
        let tool = self
            .registry
            .get(name)
            .ok_or_else(|| ToolError::ToolNotFound(name.to_string()))?;
        let mut ctx = ToolContext::new(self.domain, self.services.clone());
        ctx.execute_tool(tool.as_ref(), args).await
    }

    /// Render a resource of this domain as markdown.
    pub fn read_resource(&self, uri: &str) -> Result<String, ToolError> {
        let (domain, target) = parse_resource_uri(uri)?;
        if domain != self.domain {
            return Err(ToolError::NotFound(format!(
                "{uri} belongs to the {domain} server, not {}",
                self.domain
            )));
        }
        debug!("reading resource (domain={}, uri={})", domain, uri);
        let ledger = &self.services.ledger;
        match target {
            ResourceTarget::Searches => {
                let summaries = ledger.enumerate(domain, ledger.list_order())?;
                Ok(render_listing(domain, &summaries))
            }
            ResourceTarget::Search(id) => {
                let record = ledger.retrieve(domain, &id)?;
                Ok(render_detail(&record))
            }
        }
    }
}

/// Builder for [`DomainServer`].
pub struct DomainServerBuilder {
    domain: Domain,
    ledger: Arc<Ledger>,
    gateway: Option<Arc<dyn VendorGateway>>,
    output_policy: Option<ToolOutputPolicy>,
}

impl DomainServerBuilder {
    pub fn gateway(mut self, gateway: Arc<dyn VendorGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    pub fn output_policy(mut self, policy: ToolOutputPolicy) -> Self {
        self.output_policy = Some(policy);
        self
    }

    pub fn build(self) -> DomainServer {
        let registry = ToolRegistry::new();
        register_domain_tools(&registry, self.domain);
        info!(
            "domain server ready (domain={}, tools={}, gateway={})",
            self.domain,
            registry.len(),
            self.gateway.is_some()
        );
        DomainServer {
            domain: self.domain,
            services: Arc::new(DomainServices {
                ledger: self.ledger,
                gateway: self.gateway,
                output_policy: self.output_policy,
            }),
            registry,
        }
    }
}
