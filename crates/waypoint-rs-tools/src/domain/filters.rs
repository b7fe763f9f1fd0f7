//! Domain filter tools with typed arguments.
//!
//! Each tool turns its arguments into a [`Predicate`] over the domain's
//! result fields; evaluation and validation happen in the ledger.

use super::{filtered_response, search_tool_name};
use crate::args::{applied, number_property, object_schema, parse_args, search_id_property, string_list_property};
use crate::{Tool, ToolContext};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use waypoint_rs_ledger::{MatchMode, Predicate, Require};
use waypoint_rs_protocol::{Domain, ToolError};

/// Predicate and the `filters_applied` echo built from a tool's arguments.
type Built = Result<(Predicate, Value), ToolError>;

/// Static description of one typed filter tool.
pub struct FilterSpec {
    pub name: &'static str,
    pub domain: Domain,
    pub description: &'static str,
    properties: fn() -> Value,
    build: fn(Value) -> Built,
}

static FILTERS: &[FilterSpec] = &[
    FilterSpec {
        name: "filter_flights_by_price",
        domain: Domain::Flight,
        description: "Filter a flight search by price range",
        properties: price_properties,
        build: by_price,
    },
    FilterSpec {
        name: "filter_flights_by_airline",
        domain: Domain::Flight,
        description: "Filter a flight search to itineraries flown by any of the given airlines",
        properties: || json!({"airlines": string_list_property("Airline names to keep")}),
        build: flights_by_airline,
    },
    FilterSpec {
        name: "filter_hotels_by_price",
        domain: Domain::Hotel,
        description: "Filter a hotel search by nightly price range",
        properties: price_properties,
        build: by_price,
    },
    FilterSpec {
        name: "filter_hotels_by_rating",
        domain: Domain::Hotel,
        description: "Filter a hotel search by minimum overall rating (default 4.0)",
        properties: || json!({"min_rating": number_property("Minimum overall rating")}),
        build: hotels_by_rating,
    },
    FilterSpec {
        name: "filter_hotels_by_amenities",
        domain: Domain::Hotel,
        description: "Filter a hotel search to properties offering every listed amenity",
        properties: || {
            json!({"required_amenities": string_list_property("Amenities every hotel must have, e.g. Pool")})
        },
        build: hotels_by_amenities,
    },
    FilterSpec {
        name: "filter_hotels_by_class",
        domain: Domain::Hotel,
        description: "Filter a hotel search by hotel class (star rating)",
        properties: || {
            json!({"hotel_classes": {
                "type": "array",
                "items": {"type": "integer", "minimum": 1, "maximum": 5},
                "minItems": 1,
                "description": "Classes to keep, e.g. [4, 5]",
            }})
        },
        build: hotels_by_class,
    },
    FilterSpec {
        name: "filter_events_by_date",
        domain: Domain::Event,
        description: "Filter an event search by start date, or by a phrase in the vendor's date text",
        properties: || {
            json!({
                "date_range": {"type": "string", "description": "Phrase matched against the event's date text, e.g. weekend"},
                "specific_date": {"type": "string", "format": "date"},
                "from": {"type": "string", "format": "date"},
                "to": {"type": "string", "format": "date"},
            })
        },
        build: events_by_date,
    },
    FilterSpec {
        name: "filter_events_by_type",
        domain: Domain::Event,
        description: "Filter an event search to events whose title or description mentions any of the given types",
        properties: || json!({"event_types": string_list_property("Event types, e.g. concert")}),
        build: events_by_type,
    },
    FilterSpec {
        name: "filter_events_by_venue",
        domain: Domain::Event,
        description: "Filter an event search to events at venues matching any of the given names",
        properties: || json!({"venue_names": string_list_property("Venue names or name fragments")}),
        build: events_by_venue,
    },
    FilterSpec {
        name: "filter_forecast_by_conditions",
        domain: Domain::Weather,
        description: "Filter a weather forecast by temperature, precipitation chance, and wind speed",
        properties: || {
            json!({
                "min_temp": number_property("Minimum temperature"),
                "max_temp": number_property("Maximum temperature"),
                "max_precipitation_chance": number_property("Maximum precipitation chance, 0-100"),
                "wind_speed_threshold": {
                    "type": ["string", "number"],
                    "description": "Maximum wind speed, e.g. \"15 mph\"",
                },
            })
        },
        build: forecast_by_conditions,
    },
    FilterSpec {
        name: "filter_locations_by_type",
        domain: Domain::Geocode,
        description: "Filter geocoded locations by place class or type, e.g. city or tourism",
        properties: || json!({"place_types": string_list_property("Place classes or types to keep")}),
        build: locations_by_type,
    },
    FilterSpec {
        name: "filter_locations_by_bounds",
        domain: Domain::Geocode,
        description: "Filter geocoded locations to a latitude/longitude bounding box",
        properties: || {
            json!({
                "min_latitude": number_property("Southern bound"),
                "max_latitude": number_property("Northern bound"),
                "min_longitude": number_property("Western bound"),
                "max_longitude": number_property("Eastern bound"),
            })
        },
        build: locations_by_bounds,
    },
    FilterSpec {
        name: "filter_stocks_by_price_movement",
        domain: Domain::Finance,
        description: "Filter market results by absolute percentage move and direction",
        properties: || {
            json!({
                "min_percentage": number_property("Minimum absolute percentage change"),
                "max_percentage": number_property("Maximum absolute percentage change"),
                "movement_type": {"type": "string", "description": "Up or Down"},
            })
        },
        build: stocks_by_price_movement,
    },
];

/// Typed filter tools for a domain.
pub fn filter_tools(domain: Domain) -> Vec<Arc<dyn Tool>> {
    FILTERS
        .iter()
        .filter(|spec| spec.domain == domain)
        .map(|spec| Arc::new(PredicateFilterTool { spec }) as Arc<dyn Tool>)
        .collect()
}

/// Tool backed by a [`FilterSpec`].
pub struct PredicateFilterTool {
    spec: &'static FilterSpec,
}

impl std::fmt::Debug for PredicateFilterTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredicateFilterTool")
            .field("name", &self.spec.name)
            .field("domain", &self.spec.domain)
            .finish()
    }
}

#[async_trait]
impl Tool for PredicateFilterTool {
    fn name(&self) -> &str {
        self.spec.name
    }

    fn description(&self) -> &str {
        self.spec.description
    }

    fn args_schema(&self) -> Value {
        let mut properties = match (self.spec.properties)() {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        properties.insert(
            "search_id".to_string(),
            search_id_property(search_tool_name(self.spec.domain)),
        );
        object_schema(Value::Object(properties), &["search_id"])
    }

    async fn call(&self, ctx: &ToolContext, args: Value) -> Result<Value, ToolError> {
        let Value::Object(mut args) = args else {
            return Err(ToolError::InvalidArguments(
                "arguments must be a JSON object".to_string(),
            ));
        };
        let search_id = match args.remove("search_id") {
            Some(Value::String(id)) => id,
            Some(_) => {
                return Err(ToolError::InvalidArguments(
                    "search_id must be a string".to_string(),
                ));
            }
            None => {
                return Err(ToolError::InvalidArguments(
                    "missing field `search_id`".to_string(),
                ));
            }
        };
        let (predicate, filters_applied) = (self.spec.build)(Value::Object(args))?;
        let view = ctx
            .ledger()
            .derive(self.spec.domain, &search_id, &predicate)?;
        Ok(filtered_response(&view, filters_applied))
    }
}

fn price_properties() -> Value {
    json!({
        "min_price": number_property("Minimum price"),
        "max_price": number_property("Maximum price"),
    })
}

/// Conjunction of the parts the caller asked for; at least one is required.
fn conjunction(parts: Vec<Predicate>, expected: &str) -> Result<Predicate, ToolError> {
    let mut parts = parts.into_iter();
    let first = parts
        .next()
        .ok_or_else(|| ToolError::InvalidArguments(format!("set at least one of {expected}")))?;
    Ok(parts.fold(first, Predicate::and))
}

fn bounds(field: &str, min: Option<f64>, max: Option<f64>) -> Option<Predicate> {
    (min.is_some() || max.is_some()).then(|| Predicate::range(field, min, max))
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PriceArgs {
    #[serde(default)]
    min_price: Option<f64>,
    #[serde(default)]
    max_price: Option<f64>,
}

fn by_price(args: Value) -> Built {
    let args: PriceArgs = parse_args(args)?;
    let predicate = conjunction(
        bounds("price", args.min_price, args.max_price)
            .into_iter()
            .collect(),
        "min_price, max_price",
    )?;
    Ok((
        predicate,
        applied(json!({"min_price": args.min_price, "max_price": args.max_price})),
    ))
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct AirlineArgs {
    airlines: Vec<String>,
}

fn flights_by_airline(args: Value) -> Built {
    let args: AirlineArgs = parse_args(args)?;
    Ok((
        Predicate::membership("airlines", args.airlines.clone(), Require::Any, MatchMode::Exact),
        json!({"airlines": args.airlines}),
    ))
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RatingArgs {
    #[serde(default = "default_min_rating")]
    min_rating: f64,
}

fn default_min_rating() -> f64 {
    4.0
}

fn hotels_by_rating(args: Value) -> Built {
    let args: RatingArgs = parse_args(args)?;
    Ok((
        Predicate::range("rating", Some(args.min_rating), None),
        json!({"min_rating": args.min_rating}),
    ))
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct AmenityArgs {
    required_amenities: Vec<String>,
}

fn hotels_by_amenities(args: Value) -> Built {
    let args: AmenityArgs = parse_args(args)?;
    Ok((
        Predicate::membership(
            "amenities",
            args.required_amenities.clone(),
            Require::All,
            MatchMode::Exact,
        ),
        json!({"required_amenities": args.required_amenities}),
    ))
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ClassArgs {
    hotel_classes: Vec<u8>,
}

fn hotels_by_class(args: Value) -> Built {
    let args: ClassArgs = parse_args(args)?;
    Ok((
        Predicate::membership(
            "hotel_class",
            args.hotel_classes.iter().map(u8::to_string),
            Require::Any,
            MatchMode::Exact,
        ),
        json!({"hotel_classes": args.hotel_classes}),
    ))
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct EventDateArgs {
    #[serde(default)]
    date_range: Option<String>,
    #[serde(default)]
    specific_date: Option<NaiveDate>,
    #[serde(default)]
    from: Option<NaiveDate>,
    #[serde(default)]
    to: Option<NaiveDate>,
}

fn events_by_date(args: Value) -> Built {
    let args: EventDateArgs = parse_args(args)?;
    let mut parts = Vec::new();
    if let Some(phrase) = args
        .date_range
        .as_deref()
        .map(str::trim)
        .filter(|phrase| !phrase.is_empty())
    {
        parts.push(Predicate::membership(
            "when",
            [phrase.replace('_', " ")],
            Require::Any,
            MatchMode::Contains,
        ));
    }
    if let Some(day) = args.specific_date {
        parts.push(Predicate::date_range("start_date", Some(day), Some(day)));
    }
    if args.from.is_some() || args.to.is_some() {
        parts.push(Predicate::date_range("start_date", args.from, args.to));
    }
    let predicate = conjunction(parts, "date_range, specific_date, from, to")?;
    Ok((
        predicate,
        applied(json!({
            "date_range": args.date_range,
            "specific_date": args.specific_date,
            "from": args.from,
            "to": args.to,
        })),
    ))
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct EventTypeArgs {
    event_types: Vec<String>,
}

fn events_by_type(args: Value) -> Built {
    let args: EventTypeArgs = parse_args(args)?;
    Ok((
        Predicate::membership(
            "keywords",
            args.event_types.clone(),
            Require::Any,
            MatchMode::Contains,
        ),
        json!({"event_types": args.event_types}),
    ))
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct VenueArgs {
    venue_names: Vec<String>,
}

fn events_by_venue(args: Value) -> Built {
    let args: VenueArgs = parse_args(args)?;
    Ok((
        Predicate::membership(
            "venue",
            args.venue_names.clone(),
            Require::Any,
            MatchMode::Contains,
        ),
        json!({"venue_names": args.venue_names}),
    ))
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ForecastArgs {
    #[serde(default)]
    min_temp: Option<f64>,
    #[serde(default)]
    max_temp: Option<f64>,
    #[serde(default)]
    max_precipitation_chance: Option<f64>,
    #[serde(default)]
    wind_speed_threshold: Option<Value>,
}

fn forecast_by_conditions(args: Value) -> Built {
    let args: ForecastArgs = parse_args(args)?;
    let max_wind = args
        .wind_speed_threshold
        .as_ref()
        .map(wind_speed)
        .transpose()?;
    let parts = [
        bounds("temperature", args.min_temp, args.max_temp),
        bounds("precipitation_chance", None, args.max_precipitation_chance),
        bounds("wind_speed", None, max_wind),
    ]
    .into_iter()
    .flatten()
    .collect();
    let predicate = conjunction(
        parts,
        "min_temp, max_temp, max_precipitation_chance, wind_speed_threshold",
    )?;
    Ok((
        predicate,
        applied(json!({
            "min_temp": args.min_temp,
            "max_temp": args.max_temp,
            "max_precipitation_chance": args.max_precipitation_chance,
            "wind_speed_threshold": args.wind_speed_threshold,
        })),
    ))
}

/// `15`, `"15"`, or `"15 mph"`; the unit is ignored.
fn wind_speed(value: &Value) -> Result<f64, ToolError> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text
            .split(|ch: char| !(ch.is_ascii_digit() || ch == '.'))
            .find(|part| !part.is_empty())
            .and_then(|part| part.parse::<f64>().ok()),
        _ => None,
    };
    parsed.filter(|speed| speed.is_finite()).ok_or_else(|| {
        ToolError::InvalidArguments(format!(
            "wind_speed_threshold must contain a number, got {value}"
        ))
    })
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PlaceTypeArgs {
    place_types: Vec<String>,
}

fn locations_by_type(args: Value) -> Built {
    let args: PlaceTypeArgs = parse_args(args)?;
    Ok((
        Predicate::membership(
            "place_type",
            args.place_types.clone(),
            Require::Any,
            MatchMode::Exact,
        ),
        json!({"place_types": args.place_types}),
    ))
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct BoundsArgs {
    #[serde(default)]
    min_latitude: Option<f64>,
    #[serde(default)]
    max_latitude: Option<f64>,
    #[serde(default)]
    min_longitude: Option<f64>,
    #[serde(default)]
    max_longitude: Option<f64>,
}

fn locations_by_bounds(args: Value) -> Built {
    let args: BoundsArgs = parse_args(args)?;
    let parts = [
        bounds("latitude", args.min_latitude, args.max_latitude),
        bounds("longitude", args.min_longitude, args.max_longitude),
    ]
    .into_iter()
    .flatten()
    .collect();
    let predicate = conjunction(
        parts,
        "min_latitude, max_latitude, min_longitude, max_longitude",
    )?;
    Ok((
        predicate,
        applied(json!({
            "min_latitude": args.min_latitude,
            "max_latitude": args.max_latitude,
            "min_longitude": args.min_longitude,
            "max_longitude": args.max_longitude,
        })),
    ))
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct MovementArgs {
    #[serde(default)]
    min_percentage: Option<f64>,
    #[serde(default)]
    max_percentage: Option<f64>,
    #[serde(default)]
    movement_type: Option<String>,
}

fn stocks_by_price_movement(args: Value) -> Built {
    let args: MovementArgs = parse_args(args)?;
    let movement = args
        .movement_type
        .as_deref()
        .map(str::trim)
        .filter(|movement| !movement.is_empty())
        .map(|movement| {
            Predicate::membership("movement", [movement], Require::Any, MatchMode::Exact)
        });
    let parts = [
        bounds(
            "movement_percentage",
            args.min_percentage,
            args.max_percentage,
        ),
        movement,
    ]
    .into_iter()
    .flatten()
    .collect();
    let predicate = conjunction(parts, "min_percentage, max_percentage, movement_type")?;
    Ok((
        predicate,
        applied(json!({
            "min_percentage": args.min_percentage,
            "max_percentage": args.max_percentage,
            "movement_type": args.movement_type,
        })),
    ))
}

#[cfg(test)]
mod tests {
    use super::{FILTERS, by_price, events_by_date, forecast_by_conditions, wind_speed};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::BTreeSet;
    use waypoint_rs_ledger::{DomainSchema, MatchMode, Predicate, Require};
    use waypoint_rs_protocol::ToolError;

    #[test]
    fn every_filter_builds_predicates_over_known_fields() {
        let samples = [
            ("filter_flights_by_price", json!({"max_price": 500})),
            ("filter_flights_by_airline", json!({"airlines": ["Delta"]})),
            ("filter_hotels_by_price", json!({"min_price": 100})),
            ("filter_hotels_by_rating", json!({})),
            ("filter_hotels_by_amenities", json!({"required_amenities": ["Pool"]})),
            ("filter_hotels_by_class", json!({"hotel_classes": [4, 5]})),
            ("filter_events_by_date", json!({"from": "2025-01-01"})),
            ("filter_events_by_type", json!({"event_types": ["concert"]})),
            ("filter_events_by_venue", json!({"venue_names": ["Hall"]})),
            ("filter_forecast_by_conditions", json!({"max_temp": 20})),
            ("filter_locations_by_type", json!({"place_types": ["city"]})),
            ("filter_locations_by_bounds", json!({"min_latitude": 50})),
            ("filter_stocks_by_price_movement", json!({"movement_type": "Up"})),
        ];
        let names: BTreeSet<_> = FILTERS.iter().map(|spec| spec.name).collect();
        assert_eq!(names.len(), samples.len());
        for (name, args) in samples {
            let spec = FILTERS
                .iter()
                .find(|spec| spec.name == name)
                .expect("filter registered");
            let (predicate, _) = (spec.build)(args).expect(name);
            predicate
                .validate(DomainSchema::for_domain(spec.domain))
                .expect(name);
        }
    }

    #[test]
    fn price_filter_echoes_only_set_bounds() {
        let (predicate, applied) = by_price(json!({"max_price": 25})).expect("built");
        assert_eq!(predicate, Predicate::range("price", None, Some(25.0)));
        assert_eq!(applied, json!({"max_price": 25.0}));

        let err = by_price(json!({})).expect_err("no bounds");
        assert!(matches!(err, ToolError::InvalidArguments(_)));
        let err = by_price(json!({"max_price": 25, "currency": "USD"})).expect_err("unknown");
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn event_date_filter_combines_parts() {
        let (predicate, _) = events_by_date(json!({
            "date_range": "next_week",
            "specific_date": "2025-01-05"
        }))
        .expect("built");
        let day = NaiveDate::from_ymd_opt(2025, 1, 5);
        assert_eq!(
            predicate,
            Predicate::membership("when", ["next week"], Require::Any, MatchMode::Contains)
                .and(Predicate::date_range("start_date", day, day))
        );
        assert!(events_by_date(json!({"specific_date": "Jan 5"})).is_err());
    }

    #[test]
    fn forecast_filter_parses_wind_thresholds() {
        assert_eq!(wind_speed(&json!("15 mph")).expect("speed"), 15.0);
        assert_eq!(wind_speed(&json!(7.5)).expect("speed"), 7.5);
        assert!(wind_speed(&json!("calm")).is_err());

        let (predicate, _) =
            forecast_by_conditions(json!({"wind_speed_threshold": "10 to 15 mph"}))
                .expect("built");
        assert_eq!(predicate, Predicate::range("wind_speed", None, Some(10.0)));
    }
}
