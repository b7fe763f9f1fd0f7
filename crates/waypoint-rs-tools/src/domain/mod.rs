//! Search, details, and filter tools for one domain server.

mod distance;
mod filters;

use crate::args::{object_schema, parse_args, search_id_property};
use crate::{Tool, ToolContext, ToolRegistry};
use async_trait::async_trait;
use log::info;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use waypoint_rs_ledger::{DomainSchema, FilteredView, ParamKind, Predicate};
use waypoint_rs_protocol::{Domain, RequestParams, ToolError};

pub use distance::DistanceTool;
pub use filters::{PredicateFilterTool, filter_tools};

/// Name of the tool that records a new search.
pub fn search_tool_name(domain: Domain) -> &'static str {
    match domain {
        Domain::Flight => "search_flights",
        Domain::Hotel => "search_hotels",
        Domain::Event => "search_events",
        Domain::Weather => "search_weather",
        Domain::Geocode => "geocode_location",
        Domain::Finance => "search_finance",
    }
}

/// Register every tool a domain server exposes.
pub fn register_domain_tools(registry: &ToolRegistry, domain: Domain) {
    registry.register(Arc::new(SearchTool::new(domain)));
    registry.register(Arc::new(DetailsTool::new(domain)));
    registry.register(Arc::new(FilterResultsTool::new(domain)));
    for tool in filter_tools(domain) {
        registry.register(tool);
    }
    if domain == Domain::Geocode {
        registry.register(Arc::new(DistanceTool));
    }
    info!("registered domain tools (domain={})", domain);
}

/// Build a registry for one domain.
pub fn domain_tool_registry(domain: Domain) -> ToolRegistry {
    let registry = ToolRegistry::new();
    register_domain_tools(&registry, domain);
    registry
}

/// Filter tool output: the view's items as the vendor sent them.
pub(crate) fn filtered_response(view: &FilteredView, filters_applied: Value) -> Value {
    json!({
        "search_id": view.search_id,
        "filters_applied": filters_applied,
        "total_filtered": view.total_filtered(),
        "original_count": view.original_count,
        "items": view.items.iter().map(|item| &item.raw).collect::<Vec<_>>(),
    })
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SearchIdArgs {
    search_id: String,
}

/// Calls the domain's gateway through the ledger and returns the new id.
#[derive(Debug)]
pub struct SearchTool {
    domain: Domain,
    description: String,
}

impl SearchTool {
    pub fn new(domain: Domain) -> Self {
        Self {
            domain,
            description: format!(
                "Search {} data and record the results; returns a search_id for later retrieval and filtering",
                domain
            ),
        }
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        search_tool_name(self.domain)
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn args_schema(&self) -> Value {
        let schema = DomainSchema::for_domain(self.domain);
        let mut properties = serde_json::Map::new();
        for spec in schema.params {
            let property = match spec.kind {
                ParamKind::Text => json!({"type": "string"}),
                ParamKind::Date => json!({"type": "string", "format": "date"}),
                ParamKind::Integer { min, max } => match max {
                    Some(max) => json!({"type": "integer", "minimum": min, "maximum": max}),
                    None => json!({"type": "integer", "minimum": min}),
                },
                ParamKind::Choice(choices) => json!({"type": "string", "enum": choices}),
                ParamKind::Flag => json!({"type": "boolean"}),
                ParamKind::IntegerList { min, max } => {
                    let mut items = json!({"type": "integer", "minimum": min});
                    if let Some(max) = max {
                        items["maximum"] = json!(max);
                    }
                    json!({"type": "array", "items": items})
                }
            };
            properties.insert(spec.name.to_string(), property);
        }
        let required: Vec<&str> = schema
            .params
            .iter()
            .filter(|spec| spec.required)
            .map(|spec| spec.name)
            .collect();
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    fn records(&self) -> bool {
        true
    }

    async fn call(&self, ctx: &ToolContext, args: Value) -> Result<Value, ToolError> {
        let params = RequestParams::from_value(args)?;
        let gateway = ctx.gateway()?;
        let outcome = ctx.ledger().record_with(gateway, params).await?;
        Ok(json!({
            "search_id": outcome.id,
            "summary": outcome.summary,
        }))
    }
}

/// Returns a full stored record.
#[derive(Debug)]
pub struct DetailsTool {
    domain: Domain,
    name: String,
    description: String,
}

impl DetailsTool {
    pub fn new(domain: Domain) -> Self {
        Self {
            domain,
            name: format!("get_{}_details", domain.tag()),
            description: format!(
                "Get the full stored {} search for a search_id, including request parameters and every result",
                domain
            ),
        }
    }
}

#[async_trait]
impl Tool for DetailsTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn args_schema(&self) -> Value {
        object_schema(
            json!({"search_id": search_id_property(search_tool_name(self.domain))}),
            &["search_id"],
        )
    }

    async fn call(&self, ctx: &ToolContext, args: Value) -> Result<Value, ToolError> {
        let input: SearchIdArgs = parse_args(args)?;
        let record = ctx.ledger().retrieve(self.domain, &input.search_id)?;
        serde_json::to_value(&record)
            .map_err(|err| ToolError::ExecutionFailed(format!("failed to encode record: {err}")))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FilterResultsArgs {
    search_id: String,
    #[serde(default)]
    predicate: Option<Predicate>,
    #[serde(default)]
    predicates: Vec<Predicate>,
}

/// Applies caller-built predicates to a stored search.
#[derive(Debug)]
pub struct FilterResultsTool {
    domain: Domain,
    name: String,
    description: String,
}

impl FilterResultsTool {
    pub fn new(domain: Domain) -> Self {
        Self {
            domain,
            name: format!("filter_{}_results", domain.tag()),
            description: format!(
                "Filter a stored {} search with range, membership, date_range, or all predicates over its result fields",
                domain
            ),
        }
    }
}

#[async_trait]
impl Tool for FilterResultsTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn args_schema(&self) -> Value {
        let fields: Vec<Value> = DomainSchema::for_domain(self.domain)
            .fields
            .iter()
            .map(|field| json!({"name": field.name, "kind": field.kind}))
            .collect();
        let predicate = json!({
            "type": "object",
            "description": "Predicate tagged by kind: range {field, min, max}, membership {field, values, require, match}, date_range {field, from, to}, all {predicates}",
            "required": ["kind"],
            "x-fields": fields,
        });
        object_schema(
            json!({
                "search_id": search_id_property(search_tool_name(self.domain)),
                "predicate": predicate,
                "predicates": {"type": "array", "items": predicate},
            }),
            &["search_id"],
        )
    }

    async fn call(&self, ctx: &ToolContext, args: Value) -> Result<Value, ToolError> {
        let input: FilterResultsArgs = parse_args(args)?;
        let predicates: Vec<Predicate> = input.predicate.into_iter().chain(input.predicates).collect();
        if predicates.is_empty() {
            return Err(ToolError::InvalidArguments(
                "provide `predicate` or `predicates`".to_string(),
            ));
        }
        let view = ctx
            .ledger()
            .derive_all(self.domain, &input.search_id, &predicates)?;
        let applied = serde_json::to_value(&view.predicate)
            .map_err(|err| ToolError::ExecutionFailed(err.to_string()))?;
        Ok(filtered_response(&view, applied))
    }
}
