//! Tool and resource surface of the Waypoint domain servers.

mod args;
pub mod context;
pub mod domain;
pub mod output_policy;
pub mod registry;
pub mod resources;
pub mod server;
pub mod tool;

/// Tool execution context and shared services.
pub use context::{DomainServices, ToolContext};
/// Domain tools and registration helpers.
pub use domain::{
    DetailsTool, DistanceTool, FilterResultsTool, PredicateFilterTool, SearchTool,
    domain_tool_registry, register_domain_tools, search_tool_name,
};
/// Tool output policy.
pub use output_policy::ToolOutputPolicy;
/// Tool registry type.
pub use registry::ToolRegistry;
/// Resource URI parsing and rendering.
pub use resources::{ResourceTarget, parse_resource_uri, render_detail, render_listing};
/// Domain server.
pub use server::{DomainServer, DomainServerBuilder};
/// Tool trait and spec type.
pub use tool::{Tool, ToolSpec};
