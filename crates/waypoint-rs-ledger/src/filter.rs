//! Predicate evaluation over stored result items.
//!
//! Filtering is pure: it reads a record's items and returns a new view, never
//! touching the store. Applying `p1` then `p2` gives the same items as
//! applying `p1.and(p2)` once.

use crate::model::{FieldKind, ResultItem, SearchRecord};
use crate::schema::DomainSchema;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use waypoint_rs_protocol::{Domain, LedgerError, SearchId};

/// Whether a membership predicate needs one or every listed value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Require {
    #[default]
    Any,
    All,
}

/// How a wanted value is compared to an item's value (case-insensitive).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    #[default]
    Exact,
    /// The item's value contains the wanted value as a substring.
    Contains,
}

/// Closed set of filter conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Predicate {
    /// Inclusive numeric bounds.
    Range {
        field: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    /// Text or tag membership.
    Membership {
        field: String,
        values: Vec<String>,
        #[serde(default)]
        require: Require,
        #[serde(default, rename = "match")]
        mode: MatchMode,
    },
    /// Inclusive calendar-date bounds.
    DateRange {
        field: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<NaiveDate>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        to: Option<NaiveDate>,
    },
    /// Conjunction; an empty conjunction matches every item.
    All {
        #[serde(default)]
        predicates: Vec<Predicate>,
    },
}

impl Predicate {
    pub fn range(field: impl Into<String>, min: Option<f64>, max: Option<f64>) -> Self {
        Predicate::Range {
            field: field.into(),
            min,
            max,
        }
    }

    pub fn membership(
        field: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<String>>,
        require: Require,
        mode: MatchMode,
    ) -> Self {
        Predicate::Membership {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
            require,
            mode,
        }
    }

    pub fn date_range(
        field: impl Into<String>,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Self {
        Predicate::DateRange {
            field: field.into(),
            from,
            to,
        }
    }

    /// Conjunction of `self` and `other`, flattening nested conjunctions.
    pub fn and(self, other: Predicate) -> Predicate {
        let mut predicates = match self {
            Predicate::All { predicates } => predicates,
            single => vec![single],
        };
        match other {
            Predicate::All { predicates: more } => predicates.extend(more),
            single => predicates.push(single),
        }
        Predicate::All { predicates }
    }

    /// Check the predicate against a domain's field catalog.
    pub fn validate(&self, schema: &DomainSchema) -> Result<(), LedgerError> {
        self.validate_at(schema, "predicate")
    }

    fn validate_at(&self, schema: &DomainSchema, path: &str) -> Result<(), LedgerError> {
        let invalid = |parameter: String, message: String| {
            LedgerError::validation(Some(schema.domain), parameter, message)
        };
        let expect_field = |field: &str, allowed: &[FieldKind]| {
            match schema.field_kind(field) {
                None => Err(invalid(
                    format!("{path}.field"),
                    format!("unknown {} field {field:?}", schema.domain),
                )),
                Some(kind) if !allowed.contains(&kind) => Err(invalid(
                    format!("{path}.field"),
                    format!("field {field:?} holds {kind} values"),
                )),
                Some(_) => Ok(()),
            }
        };

        match self {
            Predicate::Range { field, min, max } => {
                expect_field(field.as_str(), &[FieldKind::Number])?;
                for (name, bound) in [("min", min), ("max", max)] {
                    if bound.is_some_and(|value| !value.is_finite()) {
                        return Err(invalid(
                            format!("{path}.{name}"),
                            "must be a finite number".to_string(),
                        ));
                    }
                }
                match (min, max) {
                    (None, None) => Err(invalid(
                        path.to_string(),
                        "range needs min or max".to_string(),
                    )),
                    (Some(min), Some(max)) if min > max => Err(invalid(
                        format!("{path}.min"),
                        format!("{min} is greater than max {max}"),
                    )),
                    _ => Ok(()),
                }
            }
            Predicate::Membership { field, values, .. } => {
                expect_field(field.as_str(), &[FieldKind::Text, FieldKind::Tags])?;
                if values.iter().all(|value| value.trim().is_empty()) {
                    return Err(invalid(
                        format!("{path}.values"),
                        "needs at least one non-blank value".to_string(),
                    ));
                }
                Ok(())
            }
            Predicate::DateRange { field, from, to } => {
                expect_field(field.as_str(), &[FieldKind::Date])?;
                match (from, to) {
                    (None, None) => Err(invalid(
                        path.to_string(),
                        "date range needs from or to".to_string(),
                    )),
                    (Some(from), Some(to)) if from > to => Err(invalid(
                        format!("{path}.from"),
                        format!("{from} is after to {to}"),
                    )),
                    _ => Ok(()),
                }
            }
            Predicate::All { predicates } => {
                for (idx, predicate) in predicates.iter().enumerate() {
                    predicate.validate_at(schema, &format!("{path}.predicates[{idx}]"))?;
                }
                Ok(())
            }
        }
    }

    /// Whether an item satisfies the predicate. Missing fields never match.
    pub fn matches(&self, item: &ResultItem) -> bool {
        match self {
            Predicate::Range { field, min, max } => item
                .field(field)
                .and_then(|value| value.as_number())
                .is_some_and(|value| {
                    min.is_none_or(|min| value >= min) && max.is_none_or(|max| value <= max)
                }),
            Predicate::Membership {
                field,
                values,
                require,
                mode,
            } => {
                let Some(labels) = item.field(field).and_then(|value| value.as_labels()) else {
                    return false;
                };
                let labels: Vec<String> = labels.iter().map(|label| label.to_lowercase()).collect();
                let mut wanted = values
                    .iter()
                    .map(|value| value.trim().to_lowercase())
                    .filter(|value| !value.is_empty());
                let hit = |wanted: &String| {
                    labels.iter().any(|label| match mode {
                        MatchMode::Exact => label == wanted,
                        MatchMode::Contains => label.contains(wanted.as_str()),
                    })
                };
                match require {
                    Require::Any => wanted.any(|value| hit(&value)),
                    Require::All => wanted.all(|value| hit(&value)),
                }
            }
            Predicate::DateRange { field, from, to } => item
                .field(field)
                .and_then(|value| value.as_date())
                .is_some_and(|date| {
                    from.is_none_or(|from| date >= from) && to.is_none_or(|to| date <= to)
                }),
            Predicate::All { predicates } => predicates.iter().all(|p| p.matches(item)),
        }
    }
}

/// Items satisfying `predicate`, in their original order.
pub fn filter_items(items: &[ResultItem], predicate: &Predicate) -> Vec<ResultItem> {
    items
        .iter()
        .filter(|item| predicate.matches(item))
        .cloned()
        .collect()
}

/// A transient, filtered view over one committed record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilteredView {
    pub search_id: SearchId,
    pub domain: Domain,
    /// Everything applied so far, as one conjunction.
    pub predicate: Predicate,
    pub original_count: usize,
    pub items: Vec<ResultItem>,
}

impl FilteredView {
    pub fn new(record: &SearchRecord, predicate: Predicate) -> Self {
        let items = filter_items(&record.result_payload.items, &predicate);
        Self {
            search_id: record.id.clone(),
            domain: record.domain,
            predicate,
            original_count: record.result_payload.items.len(),
            items,
        }
    }

    pub fn total_filtered(&self) -> usize {
        self.items.len()
    }

    /// Narrow the view further.
    pub fn refine(self, predicate: Predicate) -> Self {
        let items = filter_items(&self.items, &predicate);
        Self {
            predicate: self.predicate.and(predicate),
            items,
            ..self
        }
    }
}
