//! Vendor response normalization, one function per domain.

use super::NormalizeContext;
use super::extract::{self, ItemBuilder};
use crate::model::{ResultItem, ResultPayload};
use serde_json::{Map, Value};
use waypoint_rs_protocol::GatewayError;

type Normalized = Result<ResultPayload, GatewayError>;

fn list<'a>(map: &'a Map<String, Value>, key: &str) -> Result<&'a [Value], GatewayError> {
    extract::list(map, key).map_err(GatewayError::Malformed)
}

fn capped<'a>(
    items: &'a [Value],
    ctx: &NormalizeContext,
) -> impl Iterator<Item = &'a Value> + use<'a> {
    items.iter().take(ctx.max_results)
}

pub(super) fn flights(map: &Map<String, Value>, ctx: &NormalizeContext) -> Normalized {
    let mut items = Vec::new();
    for (key, category) in [("best_flights", "best"), ("other_flights", "other")] {
        for raw in capped(list(map, key)?, ctx) {
            items.push(flight_item(raw, category));
        }
    }
    Ok(ResultPayload {
        items,
        metadata: extract::metadata(map, &["price_insights", "airports"]),
    })
}

fn flight_item(raw: &Value, category: &str) -> ResultItem {
    let legs = raw.get("flights").and_then(Value::as_array);
    let airlines = legs
        .map(|legs| {
            let names: Vec<Value> = legs
                .iter()
                .filter_map(|leg| leg.get("airline").cloned())
                .collect();
            extract::tags(Some(&Value::Array(names)))
        })
        .unwrap_or_default();
    let stops = match raw.get("layovers").and_then(Value::as_array) {
        Some(layovers) => Some(layovers.len()),
        None => legs.map(|legs| legs.len().saturating_sub(1)),
    };
    ItemBuilder::new(raw)
        .number("price", extract::number(raw.get("price")))
        .tags("airlines", airlines)
        .number("duration", extract::number(raw.get("total_duration")))
        .number("stops", stops.map(|stops| stops as f64))
        .text("category", Some(category.to_string()))
        .build()
}

pub(super) fn hotels(map: &Map<String, Value>, ctx: &NormalizeContext) -> Normalized {
    let items = capped(list(map, "properties")?, ctx)
        .map(|raw| {
            ItemBuilder::new(raw)
                .number(
                    "price",
                    extract::number(raw.pointer("/rate_per_night/extracted_lowest")),
                )
                .number("rating", extract::number(raw.get("overall_rating")))
                .tags(
                    "hotel_class",
                    extract::tags(raw.get("extracted_hotel_class")),
                )
                .tags("amenities", extract::tags(raw.get("amenities")))
                .text("name", extract::text(raw.get("name")))
                .number("reviews", extract::number(raw.get("reviews")))
                .build()
        })
        .collect();
    Ok(ResultPayload {
        items,
        metadata: extract::metadata(
            map,
            &["search_information", "brands", "serpapi_pagination"],
        ),
    })
}

pub(super) fn events(map: &Map<String, Value>, ctx: &NormalizeContext) -> Normalized {
    let items = capped(list(map, "events_results")?, ctx)
        .map(|raw| {
            let keywords = extract::tags(Some(&Value::Array(
                ["title", "description"]
                    .iter()
                    .filter_map(|key| raw.get(*key).cloned())
                    .collect(),
            )));
            let ticket_price = raw
                .get("ticket_info")
                .and_then(Value::as_array)
                .and_then(|tickets| {
                    tickets.iter().find_map(|ticket| {
                        extract::number(ticket.get("extracted_price"))
                            .or_else(|| extract::number(ticket.get("price")))
                    })
                });
            ItemBuilder::new(raw)
                .text("title", extract::text(raw.get("title")))
                .text("venue", extract::text(raw.pointer("/venue/name")))
                .tags("keywords", keywords)
                .text("when", extract::text(raw.pointer("/date/when")))
                .date(
                    "start_date",
                    extract::date(raw.pointer("/date/start_date"), ctx.search_year),
                )
                .number("price", ticket_price)
                .build()
        })
        .collect();
    Ok(ResultPayload {
        items,
        metadata: extract::metadata(map, &["search_information", "search_parameters"]),
    })
}

/// NWS-style `periods`, a date-keyed `forecast` object, or one `current`
/// observation, in that order of preference.
pub(super) fn weather(map: &Map<String, Value>, ctx: &NormalizeContext) -> Normalized {
    let periods: &[Value] = match map.get("periods") {
        Some(_) => list(map, "periods")?,
        None => match map.get("forecast") {
            Some(Value::Object(forecast)) => match forecast.get("periods") {
                Some(_) => list(forecast, "periods")?,
                None => &[],
            },
            _ => &[],
        },
    };

    let mut items: Vec<ResultItem> = capped(periods, ctx)
        .map(|raw| {
            let precipitation = raw
                .get("probability_of_precipitation")
                .or_else(|| raw.pointer("/probabilityOfPrecipitation/value"))
                .map(|value| value.get("value").unwrap_or(value));
            ItemBuilder::new(raw)
                .number("temperature", extract::signed_number(raw.get("temperature")))
                .number("precipitation_chance", extract::number(precipitation))
                .number(
                    "wind_speed",
                    extract::largest_number(raw.get("wind_speed").or_else(|| raw.get("windSpeed"))),
                )
                .date(
                    "date",
                    extract::date(
                        raw.get("start_time").or_else(|| raw.get("startTime")),
                        ctx.search_year,
                    ),
                )
                .tags(
                    "condition",
                    extract::tags(raw.get("short_forecast").or_else(|| raw.get("shortForecast"))),
                )
                .build()
        })
        .collect();

    if items.is_empty()
        && let Some(Value::Object(days)) = map.get("forecast")
    {
        items = days
            .iter()
            .filter(|(key, _)| key.as_str() != "periods")
            .take(ctx.max_results)
            .map(|(key, raw)| {
                let date = extract::date(raw.get("date"), ctx.search_year)
                    .or_else(|| extract::date(Some(&Value::String(key.clone())), ctx.search_year));
                ItemBuilder::new(raw)
                    .number("temperature", extract::signed_number(raw.get("avgtemp")))
                    .number("precipitation_chance", extract::number(raw.get("chanceofrain")))
                    .date("date", date)
                    .build()
            })
            .collect();
    }

    if items.is_empty()
        && let Some(current @ Value::Object(_)) = map.get("current")
    {
        let reading = |key: &str| {
            current
                .get(key)
                .map(|value| value.get("value").unwrap_or(value))
        };
        let condition = current
            .get("weather_descriptions")
            .or_else(|| current.get("text_description"));
        items.push(
            ItemBuilder::new(current)
                .number("temperature", extract::signed_number(reading("temperature")))
                .number("precipitation_chance", extract::number(reading("precip")))
                .number("wind_speed", extract::largest_number(reading("wind_speed")))
                .date(
                    "date",
                    extract::date(
                        current.get("timestamp").or_else(|| {
                            map.get("location")
                                .and_then(|location| location.get("localtime"))
                        }),
                        ctx.search_year,
                    ),
                )
                .tags("condition", extract::tags(condition))
                .build(),
        );
    }

    Ok(ResultPayload {
        items,
        metadata: extract::metadata(map, &["location", "request", "forecast_type", "units"]),
    })
}

pub(super) fn locations(map: &Map<String, Value>, ctx: &NormalizeContext) -> Normalized {
    let single = map
        .get("location_data")
        .or_else(|| map.get("location"))
        .filter(|value| value.is_object());
    let found: Vec<&Value> = match map.get("locations") {
        Some(_) => capped(list(map, "locations")?, ctx).collect(),
        None => single.into_iter().collect(),
    };
    let items = found
        .into_iter()
        .map(|raw| {
            let source = raw.get("raw_data").unwrap_or(raw);
            let place_type = extract::tags(Some(&Value::Array(
                ["class", "type"]
                    .iter()
                    .filter_map(|key| source.get(*key).cloned())
                    .collect(),
            )));
            ItemBuilder::new(raw)
                .text(
                    "display_name",
                    extract::text(raw.get("display_name").or_else(|| raw.get("address"))),
                )
                .number(
                    "latitude",
                    extract::signed_number(raw.get("latitude").or_else(|| source.get("lat"))),
                )
                .number(
                    "longitude",
                    extract::signed_number(raw.get("longitude").or_else(|| source.get("lon"))),
                )
                .number(
                    "importance",
                    extract::number(raw.get("importance").or_else(|| source.get("importance"))),
                )
                .tags("place_type", place_type)
                .build()
        })
        .collect();
    Ok(ResultPayload {
        items,
        metadata: extract::metadata(map, &["query", "multiple_results", "count"]),
    })
}

/// Market lists flattened region by region, historical graph points, or a
/// single quote summary.
pub(super) fn finance(map: &Map<String, Value>, ctx: &NormalizeContext) -> Normalized {
    let mut items = Vec::new();

    if let Some(markets) = map.get("markets") {
        let Value::Object(regions) = markets else {
            return Err(GatewayError::Malformed("`markets` is not an object".to_string()));
        };
        for (region, entries) in regions {
            let Value::Array(entries) = entries else {
                continue;
            };
            for raw in capped(entries, ctx) {
                items.push(
                    quote(raw)
                        .tags("region", vec![region.clone()])
                        .build(),
                );
            }
        }
    } else if map.contains_key("graph") {
        for raw in capped(list(map, "graph")?, ctx) {
            items.push(
                ItemBuilder::new(raw)
                    .number("price", extract::number(raw.get("price")))
                    .date("date", extract::date(raw.get("date"), ctx.search_year))
                    .build(),
            );
        }
    } else if let Some(summary @ Value::Object(_)) = map.get("summary") {
        items.push(quote(summary).build());
    }

    Ok(ResultPayload {
        items,
        metadata: extract::metadata(map, &["summary", "search_parameters", "knowledge_graph"]),
    })
}

fn quote(raw: &Value) -> ItemBuilder {
    let percentage = extract::signed_number(raw.pointer("/price_movement/percentage"))
        .map(f64::abs);
    ItemBuilder::new(raw)
        .text(
            "name",
            extract::text(raw.get("name").or_else(|| raw.get("title"))),
        )
        .text("symbol", extract::text(raw.get("stock")))
        .number(
            "price",
            extract::number(raw.get("extracted_price").or_else(|| raw.get("price"))),
        )
        .number("movement_percentage", percentage)
        .tags(
            "movement",
            extract::tags(raw.pointer("/price_movement/movement")),
        )
}
