//! Markdown resources: `<scheme>://searches` and `<scheme>://{id}`.

use chrono::SecondsFormat;
use std::fmt::Write;
use waypoint_rs_ledger::{FieldValue, ResultItem, SearchRecord, SearchSummary};
use waypoint_rs_protocol::{Domain, ToolError};

/// Items shown in a record's detail resource.
const DETAIL_ITEMS: usize = 5;

/// What a resource URI points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceTarget {
    /// Listing of every recorded search.
    Searches,
    /// One recorded search.
    Search(String),
}

/// Split a resource URI into its domain and target.
pub fn parse_resource_uri(uri: &str) -> Result<(Domain, ResourceTarget), ToolError> {
    let (scheme, path) = uri
        .trim()
        .split_once("://")
        .ok_or_else(|| ToolError::InvalidArguments(format!("not a resource uri: {uri}")))?;
    let domain = Domain::from_scheme(scheme)
        .ok_or_else(|| ToolError::NotFound(format!("unknown resource scheme: {scheme}")))?;
    let path = path.trim_matches('/');
    let target = match path {
        "" => {
            return Err(ToolError::InvalidArguments(format!(
                "resource uri has no path: {uri}"
            )));
        }
        "searches" => ResourceTarget::Searches,
        "locations" if domain == Domain::Geocode => ResourceTarget::Searches,
        id => ResourceTarget::Search(id.to_string()),
    };
    Ok((domain, target))
}

/// URI templates a domain server answers.
pub fn resource_templates(domain: Domain) -> [String; 2] {
    [
        format!("{}://searches", domain.scheme()),
        format!("{}://{{id}}", domain.scheme()),
    ]
}

fn noun(domain: Domain) -> &'static str {
    match domain {
        Domain::Flight => "Flight",
        Domain::Hotel => "Hotel",
        Domain::Event => "Event",
        Domain::Weather => "Weather",
        Domain::Geocode => "Location",
        Domain::Finance => "Finance",
    }
}

/// Listing resource body.
pub fn render_listing(domain: Domain, summaries: &[SearchSummary]) -> String {
    let mut out = format!("# {} Searches\n\n", noun(domain));
    if summaries.is_empty() {
        let _ = writeln!(out, "No {} searches found.\n", domain);
        let _ = writeln!(
            out,
            "Use the {} tool to record one.",
            crate::domain::search_tool_name(domain)
        );
        return out;
    }
    let _ = writeln!(out, "Total searches: {}\n", summaries.len());
    for summary in summaries {
        let _ = writeln!(out, "## {}", summary.id);
        let _ = writeln!(out, "- **Search**: {}", summary.label);
        let _ = writeln!(out, "- **Created**: {}", timestamp(summary));
        let _ = writeln!(out, "- **Results**: {}", summary.item_count);
        if let Some(range) = &summary.primary_range {
            let _ = writeln!(
                out,
                "- **{} range**: {} to {}",
                capitalize(&range.field),
                range.min,
                range.max
            );
        }
        out.push_str("\n---\n\n");
    }
    out
}

/// Detail resource body: request, counts, and the first few items.
pub fn render_detail(record: &SearchRecord) -> String {
    let summary = &record.summary;
    let mut out = format!("# {} Search: {}\n\n", noun(record.domain), record.id);

    out.push_str("## Request\n");
    if record.request_params.is_empty() {
        out.push_str("- (no parameters)\n");
    }
    for (key, value) in record.request_params.iter() {
        let value = value
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| value.to_string());
        let _ = writeln!(out, "- **{key}**: {value}");
    }

    out.push_str("\n## Results\n");
    let _ = writeln!(out, "- **Created**: {}", timestamp(summary));
    let _ = writeln!(out, "- **Total results**: {}", summary.item_count);
    if let Some(range) = &summary.primary_range {
        let _ = writeln!(
            out,
            "- **{} range**: {} to {}",
            capitalize(&range.field),
            range.min,
            range.max
        );
    }

    let items = &record.result_payload.items;
    if items.is_empty() {
        out.push_str("\nNo results were returned for this search.\n");
        return out;
    }
    let shown = items.len().min(DETAIL_ITEMS);
    let _ = writeln!(out, "\n## Top Results ({shown} of {})\n", items.len());
    for (idx, item) in items.iter().take(DETAIL_ITEMS).enumerate() {
        let _ = writeln!(out, "### {}. {}", idx + 1, item_title(item, idx));
        for (name, value) in &item.fields {
            let _ = writeln!(out, "- **{name}**: {}", render_value(value));
        }
        out.push('\n');
    }
    out
}

fn timestamp(summary: &SearchSummary) -> String {
    summary.created_at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn item_title(item: &ResultItem, idx: usize) -> String {
    ["title", "name", "display_name"]
        .iter()
        .find_map(|field| match item.field(field) {
            Some(FieldValue::Text(text)) => Some(text.clone()),
            _ => None,
        })
        .unwrap_or_else(|| format!("Result {}", idx + 1))
}

fn render_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Number(number) => number.to_string(),
        FieldValue::Text(text) => text.clone(),
        FieldValue::Tags(tags) => tags.join(", "),
        FieldValue::Date(date) => date.format("%Y-%m-%d").to_string(),
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>().replace('_', " "),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::{ResourceTarget, parse_resource_uri, render_listing};
    use pretty_assertions::assert_eq;
    use waypoint_rs_protocol::{Domain, ToolError};

    #[test]
    fn parses_collection_and_item_uris() {
        assert_eq!(
            parse_resource_uri("hotels://searches").expect("uri"),
            (Domain::Hotel, ResourceTarget::Searches)
        );
        assert_eq!(
            parse_resource_uri("geocoder://locations").expect("uri"),
            (Domain::Geocode, ResourceTarget::Searches)
        );
        assert_eq!(
            parse_resource_uri("events://event_hiking_1/").expect("uri"),
            (Domain::Event, ResourceTarget::Search("event_hiking_1".to_string()))
        );
        assert!(matches!(
            parse_resource_uri("trains://searches"),
            Err(ToolError::NotFound(_))
        ));
        assert!(matches!(
            parse_resource_uri("searches"),
            Err(ToolError::InvalidArguments(_))
        ));
    }

    #[test]
    fn empty_listing_points_at_search_tool() {
        let body = render_listing(Domain::Weather, &[]);
        assert_eq!(
            body,
            "# Weather Searches\n\nNo weather searches found.\n\nUse the search_weather tool to record one.\n"
        );
    }
}
