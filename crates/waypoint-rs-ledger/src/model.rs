//! Persisted search records and the typed result items the filter engine reads.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use waypoint_rs_protocol::{Domain, RequestParams, SearchId};

/// Kind of a normalized item field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Number,
    Text,
    Tags,
    Date,
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            FieldKind::Number => "number",
            FieldKind::Text => "text",
            FieldKind::Tags => "tags",
            FieldKind::Date => "date",
        })
    }
}

/// One typed field value extracted from a vendor item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    Number(f64),
    Text(String),
    Tags(Vec<String>),
    Date(NaiveDate),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Number(_) => FieldKind::Number,
            FieldValue::Text(_) => FieldKind::Text,
            FieldValue::Tags(_) => FieldKind::Tags,
            FieldValue::Date(_) => FieldKind::Date,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::Date(value) => Some(*value),
            _ => None,
        }
    }

    /// Text and tag values as a list of strings; a text value is a one-element list.
    pub fn as_labels(&self) -> Option<Vec<&str>> {
        match self {
            FieldValue::Text(value) => Some(vec![value.as_str()]),
            FieldValue::Tags(values) => Some(values.iter().map(String::as_str).collect()),
            _ => None,
        }
    }
}

/// One entry of a normalized result list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultItem {
    /// Typed fields, keyed by the domain schema's field names.
    pub fields: BTreeMap<String, FieldValue>,
    /// The vendor item exactly as received.
    pub raw: Value,
}

impl ResultItem {
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }
}

/// Normalized provider response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ResultPayload {
    /// Result items in vendor order.
    pub items: Vec<ResultItem>,
    /// Provider-level metadata (price insights, pagination hints, ...).
    #[serde(default)]
    pub metadata: Value,
}

/// Min/max of the domain's primary numeric field across a record's items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimaryRange {
    pub field: String,
    pub min: f64,
    pub max: f64,
}

/// Digest of a record, computed once at write time for cheap listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSummary {
    pub id: SearchId,
    pub domain: Domain,
    pub created_at: DateTime<Utc>,
    /// Compact rendering of the key request parameters.
    pub label: String,
    pub item_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_range: Option<PrimaryRange>,
    pub request_params: RequestParams,
}

/// The unit of persistence: one committed search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRecord {
    pub id: SearchId,
    pub domain: Domain,
    pub created_at: DateTime<Utc>,
    pub request_params: RequestParams,
    pub summary: SearchSummary,
    pub result_payload: ResultPayload,
}

/// Returned by `Ledger::record` once the record is durably committed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordOutcome {
    pub id: SearchId,
    pub summary: SearchSummary,
}
