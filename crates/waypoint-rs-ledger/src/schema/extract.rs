//! Lenient readers for vendor JSON.

use crate::model::{FieldValue, ResultItem};
use chrono::NaiveDate;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// A number not glued to a preceding digit, with an optional minus sign in
/// group 1 so `"10-15"` still reads as a range.
static NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\d.,])(-?)(\d+(?:,\d{3})*(?:\.\d+)?)").expect("valid number pattern")
});

/// A finite number from a JSON number or the first number inside a string
/// (`"$1,250"`, `"From 25 CAD"`). A leading minus in a string is ignored.
pub(super) fn number(value: Option<&Value>) -> Option<f64> {
    read_number(value, false)
}

/// Like [`number`], but a string keeps its sign (`"-5 °F"` -> -5).
pub(super) fn signed_number(value: Option<&Value>) -> Option<f64> {
    read_number(value, true)
}

fn read_number(value: Option<&Value>, signed: bool) -> Option<f64> {
    match value? {
        Value::Number(number) => number.as_f64().filter(|value| value.is_finite()),
        Value::String(text) => numbers_in(text, signed).next(),
        _ => None,
    }
}

/// Every number in a string, in order.
fn numbers_in(text: &str, signed: bool) -> impl Iterator<Item = f64> + '_ {
    NUMBER
        .captures_iter(text)
        .filter_map(move |found| {
            let digits = found.get(2)?.as_str().replace(',', "");
            let value = digits.parse::<f64>().ok()?;
            let negative = signed && found.get(1).is_some_and(|sign| !sign.as_str().is_empty());
            Some(if negative { -value } else { value })
        })
        .filter(|value| value.is_finite())
}

/// Largest number in a string (`"10 to 15 mph"` -> 15).
pub(super) fn largest_number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::String(text) => numbers_in(text, false).reduce(f64::max),
        other => number(Some(other)),
    }
}

pub(super) fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(text) => Some(text.trim().to_string()).filter(|text| !text.is_empty()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Strings from a string, number, or array of either, de-duplicated in order.
pub(super) fn tags(value: Option<&Value>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut push = |value: &Value| {
        if let Some(tag) = text(Some(value))
            && !out.contains(&tag)
        {
            out.push(tag);
        }
    };
    match value {
        Some(Value::Array(values)) => values.iter().for_each(&mut push),
        Some(value) => push(value),
        None => {}
    }
    out
}

/// A date from `YYYY-MM-DD`, an ISO timestamp, or `Mon D` / `Mon D, YYYY`
/// (resolved against `year` when the vendor omits it).
pub(super) fn date(value: Option<&Value>, year: i32) -> Option<NaiveDate> {
    let text = value?.as_str()?.trim();
    if let Some(prefix) = text.get(..10)
        && let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d")
    {
        return Some(date);
    }
    let cleaned = text.replace(',', "");
    let mut words = cleaned.split_whitespace();
    let (Some(month), Some(day)) = (words.next(), words.next()) else {
        return None;
    };
    let year = words
        .next()
        .and_then(|word| word.parse::<i32>().ok())
        .unwrap_or(year);
    NaiveDate::parse_from_str(&format!("{month} {day} {year}"), "%b %d %Y").ok()
}

/// The list under `key`; a missing key is an empty list, anything other
/// than an array is a shape error.
pub(super) fn list<'a>(
    map: &'a serde_json::Map<String, Value>,
    key: &str,
) -> Result<&'a [Value], String> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(&[]),
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(format!("`{key}` is not a list")),
    }
}

/// Copy the listed keys of a response into a metadata object.
pub(super) fn metadata(map: &serde_json::Map<String, Value>, keys: &[&str]) -> Value {
    Value::Object(
        keys.iter()
            .filter_map(|key| map.get(*key).map(|value| (key.to_string(), value.clone())))
            .collect(),
    )
}

/// Accumulates typed fields for one vendor item.
pub(super) struct ItemBuilder {
    fields: BTreeMap<String, FieldValue>,
    raw: Value,
}

impl ItemBuilder {
    pub(super) fn new(raw: &Value) -> Self {
        Self {
            fields: BTreeMap::new(),
            raw: raw.clone(),
        }
    }

    pub(super) fn number(mut self, name: &str, value: Option<f64>) -> Self {
        if let Some(value) = value.filter(|value| value.is_finite()) {
            self.fields.insert(name.to_string(), FieldValue::Number(value));
        }
        self
    }

    pub(super) fn text(mut self, name: &str, value: Option<String>) -> Self {
        if let Some(value) = value {
            self.fields.insert(name.to_string(), FieldValue::Text(value));
        }
        self
    }

    pub(super) fn tags(mut self, name: &str, values: Vec<String>) -> Self {
        if !values.is_empty() {
            self.fields.insert(name.to_string(), FieldValue::Tags(values));
        }
        self
    }

    pub(super) fn date(mut self, name: &str, value: Option<NaiveDate>) -> Self {
        if let Some(value) = value {
            self.fields.insert(name.to_string(), FieldValue::Date(value));
        }
        self
    }

    pub(super) fn build(self) -> ResultItem {
        ResultItem {
            fields: self.fields,
            raw: self.raw,
        }
    }
}
