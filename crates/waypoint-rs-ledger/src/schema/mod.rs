//! Per-domain request and result schemas.
//!
//! A [`DomainSchema`] validates request parameters before the gateway is
//! called and turns the vendor's JSON into typed [`ResultItem`]s afterwards,
//! so the filter engine never sees loosely-typed payloads.

mod extract;
mod normalize;

use crate::model::{FieldKind, PrimaryRange, ResultItem, ResultPayload};
use chrono::NaiveDate;
use serde_json::{Number, Value};
use waypoint_rs_protocol::{Domain, GatewayError, LedgerError, RequestParams, json_type_name};

/// Accepted shape of one request parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Non-blank string, trimmed.
    Text,
    /// Calendar date, `YYYY-MM-DD`.
    Date,
    /// Whole number within bounds (numeric strings are accepted).
    Integer { min: i64, max: Option<i64> },
    /// One of a fixed set of lowercase words.
    Choice(&'static [&'static str]),
    /// Boolean; `"true"`/`"false"` strings are accepted.
    Flag,
    /// Whole numbers within bounds, as an array or a comma-separated string.
    IntegerList { min: i64, max: Option<i64> },
}

#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    /// Alternate names folded into `name` during validation.
    pub aliases: &'static [&'static str],
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

/// Inputs to vendor normalization that do not come from the response.
#[derive(Debug, Clone, Copy)]
pub struct NormalizeContext {
    /// Cap applied to each vendor result list.
    pub max_results: usize,
    /// Year used to resolve dates the vendor gives without one.
    pub search_year: i32,
}

type Normalizer =
    fn(&serde_json::Map<String, Value>, &NormalizeContext) -> Result<ResultPayload, GatewayError>;

/// Request parameters, item fields, and normalization for one domain.
pub struct DomainSchema {
    pub domain: Domain,
    pub params: &'static [ParamSpec],
    pub fields: &'static [FieldSpec],
    /// Numeric field summarized as the record's `primary_range`.
    pub primary_field: &'static str,
    /// Parameters rendered into the summary label and the id.
    pub label_params: &'static [&'static str],
    normalize: Normalizer,
}

const fn required(name: &'static str, kind: ParamKind) -> ParamSpec {
    ParamSpec {
        name,
        kind,
        required: true,
        aliases: &[],
    }
}

const fn optional(name: &'static str, kind: ParamKind) -> ParamSpec {
    ParamSpec {
        name,
        kind,
        required: false,
        aliases: &[],
    }
}

const fn field(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec { name, kind }
}

const COUNT: ParamKind = ParamKind::Integer { min: 1, max: None };
const HEADCOUNT: ParamKind = ParamKind::Integer { min: 0, max: None };
const CODES: ParamKind = ParamKind::IntegerList { min: 1, max: None };
const MAX_RESULTS: ParamSpec = optional("max_results", COUNT);
const COUNTRY: ParamSpec = optional("country", ParamKind::Text);
const LANGUAGE: ParamSpec = optional("language", ParamKind::Text);

static FLIGHT: DomainSchema = DomainSchema {
    domain: Domain::Flight,
    params: &[
        required("departure_id", ParamKind::Text),
        required("arrival_id", ParamKind::Text),
        required("outbound_date", ParamKind::Date),
        optional("return_date", ParamKind::Date),
        optional(
            "trip_type",
            ParamKind::Integer {
                min: 1,
                max: Some(3),
            },
        ),
        optional("adults", COUNT),
        optional("children", HEADCOUNT),
        optional("infants_in_seat", HEADCOUNT),
        optional("infants_on_lap", HEADCOUNT),
        optional(
            "travel_class",
            ParamKind::Integer {
                min: 1,
                max: Some(4),
            },
        ),
        optional("currency", ParamKind::Text),
        COUNTRY,
        LANGUAGE,
        MAX_RESULTS,
    ],
    fields: &[
        field("price", FieldKind::Number),
        field("airlines", FieldKind::Tags),
        field("duration", FieldKind::Number),
        field("stops", FieldKind::Number),
        field("category", FieldKind::Text),
    ],
    primary_field: "price",
    label_params: &["departure_id", "arrival_id", "outbound_date"],
    normalize: normalize::flights,
};

static HOTEL: DomainSchema = DomainSchema {
    domain: Domain::Hotel,
    params: &[
        required("location", ParamKind::Text),
        required("check_in_date", ParamKind::Date),
        required("check_out_date", ParamKind::Date),
        optional("adults", COUNT),
        optional("children", HEADCOUNT),
        optional(
            "children_ages",
            ParamKind::IntegerList {
                min: 1,
                max: Some(17),
            },
        ),
        optional("currency", ParamKind::Text),
        COUNTRY,
        LANGUAGE,
        optional("sort_by", COUNT),
        optional(
            "hotel_class",
            ParamKind::IntegerList {
                min: 2,
                max: Some(5),
            },
        ),
        optional("amenities", CODES),
        optional("property_types", CODES),
        optional("brands", CODES),
        optional("free_cancellation", ParamKind::Flag),
        optional("special_offers", ParamKind::Flag),
        optional("vacation_rentals", ParamKind::Flag),
        optional("bedrooms", HEADCOUNT),
        MAX_RESULTS,
    ],
    fields: &[
        field("price", FieldKind::Number),
        field("rating", FieldKind::Number),
        field("hotel_class", FieldKind::Tags),
        field("amenities", FieldKind::Tags),
        field("name", FieldKind::Text),
        field("reviews", FieldKind::Number),
    ],
    primary_field: "price",
    label_params: &["location", "check_in_date", "check_out_date"],
    normalize: normalize::hotels,
};

static EVENT: DomainSchema = DomainSchema {
    domain: Domain::Event,
    params: &[
        ParamSpec {
            aliases: &["q"],
            ..required("query", ParamKind::Text)
        },
        optional("location", ParamKind::Text),
        optional("date_filter", ParamKind::Text),
        optional("event_type", ParamKind::Text),
        LANGUAGE,
        COUNTRY,
        MAX_RESULTS,
    ],
    fields: &[
        field("title", FieldKind::Text),
        field("venue", FieldKind::Text),
        field("keywords", FieldKind::Tags),
        field("when", FieldKind::Text),
        field("start_date", FieldKind::Date),
        field("price", FieldKind::Number),
    ],
    primary_field: "price",
    label_params: &["query", "location"],
    normalize: normalize::events,
};

static WEATHER: DomainSchema = DomainSchema {
    domain: Domain::Weather,
    params: &[
        required("location", ParamKind::Text),
        optional(
            "kind",
            ParamKind::Choice(&["current", "forecast", "historical"]),
        ),
        optional("forecast_days", COUNT),
        MAX_RESULTS,
    ],
    fields: &[
        field("temperature", FieldKind::Number),
        field("precipitation_chance", FieldKind::Number),
        field("wind_speed", FieldKind::Number),
        field("date", FieldKind::Date),
        field("condition", FieldKind::Tags),
    ],
    primary_field: "temperature",
    label_params: &["location", "kind"],
    normalize: normalize::weather,
};

static GEOCODE: DomainSchema = DomainSchema {
    domain: Domain::Geocode,
    params: &[
        ParamSpec {
            aliases: &["q", "location"],
            ..required("query", ParamKind::Text)
        },
        MAX_RESULTS,
    ],
    fields: &[
        field("display_name", FieldKind::Text),
        field("latitude", FieldKind::Number),
        field("longitude", FieldKind::Number),
        field("importance", FieldKind::Number),
        field("place_type", FieldKind::Tags),
    ],
    primary_field: "importance",
    label_params: &["query"],
    normalize: normalize::locations,
};

static FINANCE: DomainSchema = DomainSchema {
    domain: Domain::Finance,
    params: &[
        ParamSpec {
            aliases: &["q", "symbol"],
            ..required("query", ParamKind::Text)
        },
        optional(
            "kind",
            ParamKind::Choice(&["stock", "currency", "market", "historical"]),
        ),
        optional("exchange", ParamKind::Text),
        optional("window", ParamKind::Text),
        MAX_RESULTS,
    ],
    fields: &[
        field("name", FieldKind::Text),
        field("symbol", FieldKind::Text),
        field("price", FieldKind::Number),
        field("movement_percentage", FieldKind::Number),
        field("movement", FieldKind::Tags),
        field("region", FieldKind::Tags),
        field("date", FieldKind::Date),
    ],
    primary_field: "price",
    label_params: &["query", "kind"],
    normalize: normalize::finance,
};

impl DomainSchema {
    pub fn for_domain(domain: Domain) -> &'static DomainSchema {
        match domain {
            Domain::Flight => &FLIGHT,
            Domain::Hotel => &HOTEL,
            Domain::Event => &EVENT,
            Domain::Weather => &WEATHER,
            Domain::Geocode => &GEOCODE,
            Domain::Finance => &FINANCE,
        }
    }

    pub fn field_kind(&self, name: &str) -> Option<FieldKind> {
        self.fields
            .iter()
            .find(|spec| spec.name == name)
            .map(|spec| spec.kind)
    }

    /// Check and normalize request parameters.
    ///
    /// Aliases fold into their canonical name, blanks and nulls are dropped,
    /// integers become JSON numbers, and choices are lowercased.
    pub fn validate_params(&self, params: &RequestParams) -> Result<RequestParams, LedgerError> {
        let domain = Some(self.domain);
        let mut normalized = RequestParams::new();

        for (key, value) in params.iter() {
            let Some(spec) = self
                .params
                .iter()
                .find(|spec| spec.name == key.as_str() || spec.aliases.contains(&key.as_str()))
            else {
                return Err(LedgerError::validation(domain, key, "unknown parameter"));
            };
            let Some(value) = normalize_param(spec, value)
                .map_err(|message| LedgerError::validation(domain, key, message))?
            else {
                continue;
            };
            if normalized.contains_key(spec.name) {
                return Err(LedgerError::validation(
                    domain,
                    spec.name,
                    "given more than once through an alias",
                ));
            }
            normalized.insert(spec.name, value);
        }

        if let Some(missing) = self
            .params
            .iter()
            .find(|spec| spec.required && !normalized.contains_key(spec.name))
        {
            return Err(LedgerError::validation(
                domain,
                missing.name,
                "required parameter is missing",
            ));
        }

        self.check_date_order(&normalized)?;
        Ok(normalized)
    }

    fn check_date_order(&self, params: &RequestParams) -> Result<(), LedgerError> {
        let (start, end, strict) = match self.domain {
            Domain::Flight => ("outbound_date", "return_date", false),
            Domain::Hotel => ("check_in_date", "check_out_date", true),
            _ => return Ok(()),
        };
        let date = |name: &str| params.get_str(name).and_then(|value| parse_date(value).ok());
        let (Some(from), Some(to)) = (date(start), date(end)) else {
            return Ok(());
        };
        if to < from || (strict && to == from) {
            let relation = if strict { "after" } else { "on or after" };
            return Err(LedgerError::validation(
                Some(self.domain),
                end,
                format!("must be {relation} {start}"),
            ));
        }
        Ok(())
    }

    /// Key parameter values, in label order.
    pub fn label_values(&self, params: &RequestParams) -> Vec<String> {
        self.label_params
            .iter()
            .filter_map(|name| params.get(name))
            .map(|value| match value {
                Value::String(text) => text.trim().to_string(),
                other => other.to_string(),
            })
            .filter(|value| !value.is_empty())
            .collect()
    }

    pub fn label(&self, params: &RequestParams) -> String {
        let values = self.label_values(params);
        if values.is_empty() {
            self.domain.tag().to_string()
        } else {
            values.join(" / ")
        }
    }

    /// Convert a vendor response into a typed payload.
    ///
    /// Anything that is not a JSON object is malformed. A top-level `error`
    /// string is the vendor reporting a failed request.
    pub fn normalize(
        &self,
        response: &Value,
        ctx: &NormalizeContext,
    ) -> Result<ResultPayload, GatewayError> {
        let Value::Object(map) = response else {
            return Err(GatewayError::Malformed(format!(
                "expected a JSON object from the {} provider, got {}",
                self.domain,
                json_type_name(response)
            )));
        };
        if let Some(Value::String(message)) = map.get("error") {
            return Err(GatewayError::Request(message.clone()));
        }
        (self.normalize)(map, ctx)
    }

    /// Range of the primary field over the items that carry it.
    pub fn primary_range(&self, items: &[ResultItem]) -> Option<PrimaryRange> {
        let mut values = items
            .iter()
            .filter_map(|item| item.field(self.primary_field))
            .filter_map(|value| value.as_number());
        let first = values.next()?;
        let (min, max) = values.fold((first, first), |(min, max), value| {
            (min.min(value), max.max(value))
        });
        Some(PrimaryRange {
            field: self.primary_field.to_string(),
            min,
            max,
        })
    }
}

fn normalize_param(spec: &ParamSpec, value: &Value) -> Result<Option<Value>, String> {
    if value.is_null() {
        return Ok(None);
    }
    match spec.kind {
        ParamKind::Text => match value {
            Value::String(text) if text.trim().is_empty() => Ok(None),
            Value::String(text) => Ok(Some(Value::String(text.trim().to_string()))),
            Value::Number(number) => Ok(Some(Value::String(number.to_string()))),
            other => Err(format!("expected string, got {}", json_type_name(other))),
        },
        ParamKind::Date => {
            let Some(text) = value.as_str() else {
                return Err(format!(
                    "expected a YYYY-MM-DD date, got {}",
                    json_type_name(value)
                ));
            };
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            let date = parse_date(text).map_err(|_| format!("{text:?} is not a YYYY-MM-DD date"))?;
            Ok(Some(Value::String(date.format("%Y-%m-%d").to_string())))
        }
        ParamKind::Integer { min, max } => {
            if value.as_str().is_some_and(|text| text.trim().is_empty()) {
                return Ok(None);
            }
            let parsed = bounded_integer(value, min, max)?;
            Ok(Some(Value::Number(Number::from(parsed))))
        }
        ParamKind::IntegerList { min, max } => {
            let parsed = match value {
                Value::Array(values) => values
                    .iter()
                    .map(|value| bounded_integer(value, min, max))
                    .collect::<Result<Vec<_>, _>>()?,
                Value::String(text) => text
                    .split(',')
                    .map(str::trim)
                    .filter(|part| !part.is_empty())
                    .map(|part| bounded_integer(&Value::String(part.to_string()), min, max))
                    .collect::<Result<Vec<_>, _>>()?,
                Value::Number(_) => vec![bounded_integer(value, min, max)?],
                other => {
                    return Err(format!(
                        "expected a list of integers, got {}",
                        json_type_name(other)
                    ));
                }
            };
            if parsed.is_empty() {
                return Ok(None);
            }
            Ok(Some(Value::Array(
                parsed
                    .into_iter()
                    .map(|value| Value::Number(Number::from(value)))
                    .collect(),
            )))
        }
        ParamKind::Flag => match value {
            Value::Bool(flag) => Ok(Some(Value::Bool(*flag))),
            Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
                "" => Ok(None),
                "true" => Ok(Some(Value::Bool(true))),
                "false" => Ok(Some(Value::Bool(false))),
                other => Err(format!("expected true or false, got {other:?}")),
            },
            other => Err(format!("expected a boolean, got {}", json_type_name(other))),
        },
        ParamKind::Choice(choices) => {
            let Some(text) = value.as_str() else {
                return Err(format!("expected string, got {}", json_type_name(value)));
            };
            let lowered = text.trim().to_ascii_lowercase();
            if lowered.is_empty() {
                return Ok(None);
            }
            if choices.contains(&lowered.as_str()) {
                Ok(Some(Value::String(lowered)))
            } else {
                Err(format!("must be one of {}", choices.join(", ")))
            }
        }
    }
}

fn bounded_integer(value: &Value, min: i64, max: Option<i64>) -> Result<i64, String> {
    let parsed = match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    };
    let Some(parsed) = parsed else {
        return Err(format!("expected an integer, got {value}"));
    };
    if parsed < min || max.is_some_and(|max| parsed > max) {
        let bounds = match max {
            Some(max) => format!("between {min} and {max}"),
            None => format!("at least {min}"),
        };
        return Err(format!("must be {bounds}, got {parsed}"));
    }
    Ok(parsed)
}

fn parse_date(value: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
}

#[cfg(test)]
mod tests {
    use super::DomainSchema;
    use crate::model::FieldKind;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use waypoint_rs_protocol::{Domain, FaultKind, RequestParams};

    fn params(value: serde_json::Value) -> RequestParams {
        RequestParams::from_value(value).expect("params")
    }

    #[test]
    fn aliases_fold_and_blanks_drop() {
        let schema = DomainSchema::for_domain(Domain::Event);
        let normalized = schema
            .validate_params(&params(json!({
                "q": "  hiking events ",
                "location": "Banff",
                "event_type": "",
                "max_results": "5"
            })))
            .expect("valid");
        assert_eq!(
            normalized.to_value(),
            json!({"location": "Banff", "max_results": 5, "query": "hiking events"})
        );
        assert_eq!(schema.label(&normalized), "hiking events / Banff");
    }

    #[test]
    fn missing_required_param_names_it() {
        let err = DomainSchema::for_domain(Domain::Hotel)
            .validate_params(&params(json!({"location": "Banff", "check_in_date": "2025-01-05"})))
            .expect_err("missing");
        assert_eq!(err.kind(), FaultKind::Validation);
        assert_eq!(
            err.to_string(),
            "invalid check_out_date: required parameter is missing"
        );
        assert_eq!(err.domain(), Some(Domain::Hotel));
    }

    #[test]
    fn dates_and_counts_are_type_checked() {
        let flight = DomainSchema::for_domain(Domain::Flight);
        let base = json!({"departure_id": "YYC", "arrival_id": "LAX"});

        let mut bad_date = base.clone();
        bad_date["outbound_date"] = json!("05/01/2025");
        let err = flight.validate_params(&params(bad_date)).expect_err("date");
        assert!(err.to_string().starts_with("invalid outbound_date"));

        let mut bad_count = base.clone();
        bad_count["outbound_date"] = json!("2025-01-05");
        bad_count["max_results"] = json!(0);
        let err = flight.validate_params(&params(bad_count)).expect_err("count");
        assert_eq!(err.to_string(), "invalid max_results: must be at least 1, got 0");

        let mut bad_class = base;
        bad_class["outbound_date"] = json!("2025-01-05");
        bad_class["travel_class"] = json!(7);
        assert!(flight.validate_params(&params(bad_class)).is_err());
    }

    #[test]
    fn date_order_is_enforced() {
        let hotel = DomainSchema::for_domain(Domain::Hotel);
        let err = hotel
            .validate_params(&params(json!({
                "location": "Banff",
                "check_in_date": "2025-01-05",
                "check_out_date": "2025-01-05"
            })))
            .expect_err("same day");
        assert_eq!(
            err.to_string(),
            "invalid check_out_date: must be after check_in_date"
        );

        let flight = DomainSchema::for_domain(Domain::Flight);
        assert!(
            flight
                .validate_params(&params(json!({
                    "departure_id": "YYC",
                    "arrival_id": "LAX",
                    "outbound_date": "2025-01-05",
                    "return_date": "2025-01-05"
                })))
                .is_ok()
        );
    }

    #[test]
    fn unknown_params_and_bad_choices_are_rejected() {
        let weather = DomainSchema::for_domain(Domain::Weather);
        let err = weather
            .validate_params(&params(json!({"location": "Banff", "units": "m"})))
            .expect_err("unknown");
        assert_eq!(err.to_string(), "invalid units: unknown parameter");

        let err = weather
            .validate_params(&params(json!({"location": "Banff", "kind": "yearly"})))
            .expect_err("choice");
        assert_eq!(
            err.to_string(),
            "invalid kind: must be one of current, forecast, historical"
        );

        let ok = weather
            .validate_params(&params(json!({"location": "Banff", "kind": "Forecast"})))
            .expect("choice");
        assert_eq!(ok.get_str("kind"), Some("forecast"));
    }

    #[test]
    fn vendor_search_options_are_accepted() {
        let hotel = DomainSchema::for_domain(Domain::Hotel)
            .validate_params(&params(json!({
                "location": "Banff",
                "check_in_date": "2025-02-01",
                "check_out_date": "2025-02-03",
                "sort_by": 3,
                "free_cancellation": true,
                "special_offers": "false",
                "hotel_class": "4, 5",
                "amenities": [35, "9"],
                "children_ages": [4, 11],
                "bedrooms": 2,
                "country": "ca",
                "language": "en"
            })))
            .expect("hotel options");
        assert_eq!(hotel.get("free_cancellation"), Some(&json!(true)));
        assert_eq!(hotel.get("special_offers"), Some(&json!(false)));
        assert_eq!(hotel.get("hotel_class"), Some(&json!([4, 5])));
        assert_eq!(hotel.get("amenities"), Some(&json!([35, 9])));

        let flight = DomainSchema::for_domain(Domain::Flight)
            .validate_params(&params(json!({
                "departure_id": "YYC",
                "arrival_id": "LAX",
                "outbound_date": "2025-01-05",
                "trip_type": 2,
                "children": 1,
                "infants_on_lap": 1,
                "language": "en",
                "country": "us"
            })))
            .expect("flight options");
        assert_eq!(flight.get("trip_type"), Some(&json!(2)));

        let event = DomainSchema::for_domain(Domain::Event)
            .validate_params(&params(json!({"q": "jazz", "language": "fr", "country": "ca"})))
            .expect("event options");
        assert_eq!(event.get_str("country"), Some("ca"));
    }

    #[test]
    fn flags_and_integer_lists_are_type_checked() {
        let hotel = DomainSchema::for_domain(Domain::Hotel);
        let base = json!({
            "location": "Banff",
            "check_in_date": "2025-02-01",
            "check_out_date": "2025-02-03"
        });

        let mut bad_flag = base.clone();
        bad_flag["free_cancellation"] = json!("maybe");
        let err = hotel.validate_params(&params(bad_flag)).expect_err("flag");
        assert_eq!(
            err.to_string(),
            "invalid free_cancellation: expected true or false, got \"maybe\""
        );

        let mut bad_class = base.clone();
        bad_class["hotel_class"] = json!([3, 6]);
        let err = hotel.validate_params(&params(bad_class)).expect_err("class");
        assert_eq!(
            err.to_string(),
            "invalid hotel_class: must be between 2 and 5, got 6"
        );

        let mut bad_ages = base;
        bad_ages["children_ages"] = json!({"first": 4});
        assert!(hotel.validate_params(&params(bad_ages)).is_err());
    }

    #[test]
    fn alias_and_canonical_together_conflict() {
        let err = DomainSchema::for_domain(Domain::Geocode)
            .validate_params(&params(json!({"q": "Banff", "query": "Jasper"})))
            .expect_err("duplicate");
        assert_eq!(err.kind(), FaultKind::Validation);
    }

    #[test]
    fn field_catalog_lookup() {
        let hotel = DomainSchema::for_domain(Domain::Hotel);
        assert_eq!(hotel.field_kind("amenities"), Some(FieldKind::Tags));
        assert_eq!(hotel.field_kind("airlines"), None);
    }

    #[test]
    fn non_object_responses_are_malformed() {
        let ctx = super::NormalizeContext {
            max_results: 10,
            search_year: 2025,
        };
        let err = DomainSchema::for_domain(Domain::Hotel)
            .normalize(&json!(["not", "an", "object"]), &ctx)
            .expect_err("malformed");
        assert!(matches!(err, waypoint_rs_protocol::GatewayError::Malformed(_)));

        let err = DomainSchema::for_domain(Domain::Hotel)
            .normalize(&json!({"error": "Invalid API key"}), &ctx)
            .expect_err("vendor error");
        assert_eq!(
            err,
            waypoint_rs_protocol::GatewayError::Request("Invalid API key".to_string())
        );
    }
}
