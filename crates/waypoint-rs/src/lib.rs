//! Public SDK surface for Waypoint.
//!
//! This crate re-exports the ledger, tool and config building blocks and
//! provides a small initialization helper to keep consumer setup consistent.

pub mod replay;

/// Re-export for convenience.
pub use waypoint_rs_config as config;
/// Re-export for convenience.
pub use waypoint_rs_ledger as ledger;
/// Re-export for convenience.
pub use waypoint_rs_protocol as protocol;
/// Re-export for convenience.
pub use waypoint_rs_tools as tools;

pub use replay::ReplayGateway;

use std::sync::Arc;
use waypoint_rs_config::WaypointConfig;
use waypoint_rs_ledger::{Ledger, VendorGateway};
use waypoint_rs_protocol::Domain;
use waypoint_rs_tools::{DomainServer, ToolOutputPolicy};

#[inline]
/// Initialize logging with env_logger (millisecond timestamps, `RUST_LOG`).
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    let _ = env_logger::builder()
        .format_timestamp_millis()
        .parse_default_env()
        .try_init();
}

/// Domain server over `ledger`, with the configured output policy.
pub fn domain_server(
    config: &WaypointConfig,
    domain: Domain,
    ledger: Arc<Ledger>,
    gateway: Option<Arc<dyn VendorGateway>>,
) -> DomainServer {
    let mut builder = DomainServer::builder(domain, ledger)
        .output_policy(ToolOutputPolicy::from(&config.tools.output_policy));
    if let Some(gateway) = gateway {
        builder = builder.gateway(gateway);
    }
    builder.build()
}
