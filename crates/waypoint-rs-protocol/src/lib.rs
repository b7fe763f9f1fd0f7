//! Shared vocabulary for the Waypoint search servers: domains, search ids,
//! request parameters, and the fault taxonomy every layer reports.

mod error;
mod tool;

pub use error::{FaultKind, GatewayError, LedgerError};
pub use tool::ToolError;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Maximum length of a search identifier.
pub const MAX_SEARCH_ID_LEN: usize = 200;

/// Search category served by one domain server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Flight,
    Hotel,
    Event,
    Weather,
    Geocode,
    Finance,
}

impl Domain {
    /// Every domain, in declaration order.
    pub const ALL: [Domain; 6] = [
        Domain::Flight,
        Domain::Hotel,
        Domain::Event,
        Domain::Weather,
        Domain::Geocode,
        Domain::Finance,
    ];

    /// Short tag used in ids, config keys, and logs.
    pub fn tag(self) -> &'static str {
        match self {
            Domain::Flight => "flight",
            Domain::Hotel => "hotel",
            Domain::Event => "event",
            Domain::Weather => "weather",
            Domain::Geocode => "geocode",
            Domain::Finance => "finance",
        }
    }

    /// Default storage directory for the domain namespace.
    pub fn default_directory(self) -> &'static str {
        match self {
            Domain::Flight => "flights",
            Domain::Hotel => "hotels",
            Domain::Event => "events",
            Domain::Weather => "weather_data",
            Domain::Geocode => "geocoded_locations",
            Domain::Finance => "finance",
        }
    }

    /// Resource URI scheme (`<scheme>://searches`).
    pub fn scheme(self) -> &'static str {
        match self {
            Domain::Flight => "flights",
            Domain::Hotel => "hotels",
            Domain::Event => "events",
            Domain::Weather => "weather",
            Domain::Geocode => "geocoder",
            Domain::Finance => "finance",
        }
    }

    /// Resolve a resource scheme back to its domain.
    pub fn from_scheme(scheme: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|domain| domain.scheme().eq_ignore_ascii_case(scheme))
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Error returned when a domain name cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown domain: {0}")]
pub struct UnknownDomain(pub String);

impl FromStr for Domain {
    type Err = UnknownDomain;

    /// Accepts the tag (`hotel`) or the resource scheme (`hotels`).
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|domain| {
                domain.tag().eq_ignore_ascii_case(trimmed)
                    || domain.scheme().eq_ignore_ascii_case(trimmed)
            })
            .ok_or_else(|| UnknownDomain(trimmed.to_string()))
    }
}

/// Identifier of one committed search within a domain namespace.
///
/// Ids double as file names, so only `[A-Za-z0-9_.-]` is accepted and a
/// leading `.` is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SearchId(String);

/// Error returned for malformed search ids.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid search id {value:?}: {reason}")]
pub struct InvalidSearchId {
    pub value: String,
    pub reason: &'static str,
}

impl SearchId {
    /// Validate and wrap a search id.
    pub fn parse(value: impl Into<String>) -> Result<Self, InvalidSearchId> {
        let value = value.into();
        let reason = if value.is_empty() {
            Some("must not be empty")
        } else if value.len() > MAX_SEARCH_ID_LEN {
            Some("too long")
        } else if value.starts_with('.') {
            Some("must not start with '.'")
        } else if !value
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.'))
        {
            Some("contains characters outside [A-Za-z0-9_.-]")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(InvalidSearchId { value, reason }),
            None => Ok(Self(value)),
        }
    }

    /// Compose an id from free-form parts joined by `_`.
    ///
    /// Characters outside `[A-Za-z0-9-]` collapse to a single `_`, empty
    /// parts are dropped, and each part is capped at 48 characters, so the
    /// result is always a valid id.
    pub fn from_parts<'a>(parts: impl IntoIterator<Item = &'a str>) -> Self {
        let mut out = String::new();
        for part in parts {
            let mut cleaned = String::new();
            for ch in part.chars() {
                if ch.is_ascii_alphanumeric() || ch == '-' {
                    cleaned.push(ch);
                } else if !cleaned.is_empty() && !cleaned.ends_with('_') {
                    cleaned.push('_');
                }
            }
            cleaned.truncate(MAX_ID_PART_LEN);
            let cleaned = cleaned.trim_end_matches('_');
            if cleaned.is_empty() {
                continue;
            }
            if !out.is_empty() {
                out.push('_');
            }
            out.push_str(cleaned);
        }
        if out.is_empty() {
            out.push_str("search");
        }
        out.truncate(MAX_SEARCH_ID_LEN);
        Self(out)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

const MAX_ID_PART_LEN: usize = 48;

impl fmt::Display for SearchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SearchId {
    type Error = InvalidSearchId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<SearchId> for String {
    fn from(id: SearchId) -> Self {
        id.0
    }
}

impl AsRef<str> for SearchId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Normalized input parameters of a search.
///
/// Keys are kept sorted so the JSON encoding is canonical.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestParams(BTreeMap<String, Value>);

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build params from a JSON object; any other JSON shape is rejected.
    pub fn from_value(value: Value) -> Result<Self, LedgerError> {
        match value {
            Value::Object(map) => Ok(map.into_iter().collect()),
            Value::Null => Ok(Self::default()),
            other => Err(LedgerError::validation(
                None,
                "request_params",
                format!("expected a JSON object, got {}", json_type_name(&other)),
            )),
        }
    }

    /// Insert a parameter, builder style.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|value| !value.is_null())
    }

    /// String parameter, ignoring blanks.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Canonical JSON object form.
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect::<Map<String, Value>>(),
        )
    }
}

impl FromIterator<(String, Value)> for RequestParams {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Listing order for search summaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListOrder {
    /// Oldest first.
    #[default]
    Ascending,
    /// Newest first.
    Descending,
}

/// Human-readable JSON type name used in error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::{Domain, ListOrder, RequestParams, SearchId};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn domain_parses_tags_and_schemes() {
        assert_eq!("hotel".parse::<Domain>().expect("tag"), Domain::Hotel);
        assert_eq!("Hotels".parse::<Domain>().expect("scheme"), Domain::Hotel);
        assert_eq!(
            "geocoder".parse::<Domain>().expect("scheme"),
            Domain::Geocode
        );
        assert!("trains".parse::<Domain>().is_err());
        assert_eq!(Domain::from_scheme("weather"), Some(Domain::Weather));
        assert_eq!(Domain::Weather.default_directory(), "weather_data");
    }

    #[test]
    fn search_id_rejects_path_like_values() {
        assert!(SearchId::parse("hotel_Banff_20250101T000000Z_ab12").is_ok());
        for bad in ["", "../etc", ".hidden", "a/b", "a b", "x\\y"] {
            let err = SearchId::parse(bad).expect_err(bad);
            assert_eq!(err.value, bad);
        }
        let long = "a".repeat(super::MAX_SEARCH_ID_LEN + 1);
        assert!(SearchId::parse(long).is_err());
    }

    #[test]
    fn search_id_from_parts_sanitizes() {
        let id = SearchId::from_parts(["event", "hiking events, Banff!", "", "20250101T000000Z"]);
        assert_eq!(id.as_str(), "event_hiking_events_Banff_20250101T000000Z");
        assert!(SearchId::parse(id.as_str()).is_ok());
        assert_eq!(SearchId::from_parts(["..", "/"]).as_str(), "search");
        let long = "x".repeat(100);
        assert_eq!(SearchId::from_parts([long.as_str()]).as_str().len(), 48);
    }

    #[test]
    fn search_id_deserialization_validates() {
        let id: SearchId = serde_json::from_value(json!("event_x_1")).expect("id");
        assert_eq!(id.as_str(), "event_x_1");
        assert!(serde_json::from_value::<SearchId>(json!("../x")).is_err());
    }

    #[test]
    fn request_params_are_canonical_and_skip_nulls() {
        let params = RequestParams::from_value(json!({
            "q": "hiking events",
            "location": "Banff",
            "empty": null,
            "blank": "  "
        }))
        .expect("params");
        assert_eq!(
            serde_json::to_string(&params).expect("encode"),
            r#"{"blank":"  ","empty":null,"location":"Banff","q":"hiking events"}"#
        );
        assert_eq!(params.get("empty"), None);
        assert_eq!(params.get_str("blank"), None);
        assert_eq!(params.get_str("location"), Some("Banff"));
    }

    #[test]
    fn request_params_reject_non_objects() {
        let err = RequestParams::from_value(json!([1, 2])).expect_err("array");
        assert_eq!(
            err.to_string(),
            "invalid request_params: expected a JSON object, got array"
        );
    }

    #[test]
    fn list_order_defaults_to_ascending() {
        assert_eq!(ListOrder::default(), ListOrder::Ascending);
        let order: ListOrder = serde_json::from_value(json!("descending")).expect("order");
        assert_eq!(order, ListOrder::Descending);
    }
}
