//! Vendor-shaped responses and request parameters.

use serde_json::{Value, json};
use waypoint_rs_protocol::RequestParams;

/// `{"q": "hiking events", "location": "Banff"}`.
pub fn banff_event_params() -> RequestParams {
    RequestParams::new()
        .with("q", "hiking events")
        .with("location", "Banff")
}

/// One event per price, dated Jan 5, 6, 7, ... in vendor order.
pub fn events_response(prices: &[f64]) -> Value {
    let venues = ["Tunnel Mountain", "Banff Centre", "Lake Louise Hall"];
    let events: Vec<Value> = prices
        .iter()
        .enumerate()
        .map(|(idx, price)| {
            json!({
                "title": format!("Guided Hike {}", idx + 1),
                "description": if idx % 2 == 0 { "Sunrise hiking tour" } else { "Evening concert and hike" },
                "date": {
                    "start_date": format!("Jan {}", idx + 5),
                    "when": format!("Sat, Jan {}, 7 AM", idx + 5),
                },
                "venue": {"name": venues[idx % venues.len()]},
                "ticket_info": [{"source": "Tickets", "price": format!("${price}")}],
            })
        })
        .collect();
    json!({
        "search_information": {"total_results": events.len()},
        "events_results": events,
    })
}

pub fn hotel_params() -> RequestParams {
    RequestParams::new()
        .with("location", "Banff")
        .with("check_in_date", "2025-02-01")
        .with("check_out_date", "2025-02-03")
}

/// Three properties: a cheap hostel, a mid-range hotel, a resort.
pub fn hotels_response() -> Value {
    json!({
        "search_information": {"total_results": 3},
        "properties": [
            {
                "name": "Banff Hostel",
                "rate_per_night": {"lowest": "$45", "extracted_lowest": 45},
                "overall_rating": 3.9,
                "extracted_hotel_class": 2,
                "amenities": ["Free Wi-Fi", "Kitchen"],
                "reviews": 812
            },
            {
                "name": "Elk Lodge",
                "rate_per_night": {"lowest": "$180", "extracted_lowest": 180},
                "overall_rating": 4.4,
                "extracted_hotel_class": 3,
                "amenities": ["Free Wi-Fi", "Pool", "Hot tub"],
                "reviews": 1204
            },
            {
                "name": "Fairmont Banff Springs",
                "rate_per_night": {"lowest": "$620", "extracted_lowest": 620},
                "overall_rating": 4.6,
                "extracted_hotel_class": 5,
                "amenities": ["Free Wi-Fi", "Pool", "Spa"],
                "reviews": 5321
            }
        ]
    })
}

pub fn flight_params() -> RequestParams {
    RequestParams::new()
        .with("departure_id", "YYC")
        .with("arrival_id", "YVR")
        .with("outbound_date", "2025-02-01")
}

/// Two best flights and one other flight.
pub fn flights_response() -> Value {
    json!({
        "best_flights": [
            {
                "flights": [{"airline": "WestJet"}],
                "total_duration": 85,
                "price": 189
            },
            {
                "flights": [{"airline": "Air Canada"}, {"airline": "Air Canada"}],
                "layovers": [{"name": "Kelowna"}],
                "total_duration": 190,
                "price": 142
            }
        ],
        "other_flights": [
            {
                "flights": [{"airline": "Flair Airlines"}],
                "total_duration": 90,
                "price": 99
            }
        ],
        "price_insights": {"lowest_price": 99}
    })
}

/// NWS-style forecast periods.
pub fn forecast_response() -> Value {
    json!({
        "location": "Banff",
        "forecast_type": "daily",
        "periods": [
            {
                "start_time": "2025-01-05T06:00:00-07:00",
                "temperature": -4,
                "probability_of_precipitation": 10,
                "wind_speed": "5 to 10 mph",
                "short_forecast": "Sunny"
            },
            {
                "start_time": "2025-01-06T06:00:00-07:00",
                "temperature": 2,
                "probability_of_precipitation": 70,
                "wind_speed": "15 to 25 mph",
                "short_forecast": "Snow Showers"
            },
            {
                "start_time": "2025-01-07T06:00:00-07:00",
                "temperature": -1,
                "probability_of_precipitation": 20,
                "wind_speed": "10 mph",
                "short_forecast": "Partly Cloudy"
            }
        ]
    })
}

/// Two Nominatim-style matches.
pub fn locations_response() -> Value {
    json!({
        "query": "Banff",
        "multiple_results": true,
        "count": 2,
        "locations": [
            {
                "display_name": "Banff, Alberta, Canada",
                "latitude": 51.1784,
                "longitude": -115.5708,
                "raw_data": {"class": "place", "type": "town", "importance": 0.62}
            },
            {
                "display_name": "Banff, Aberdeenshire, Scotland",
                "latitude": 57.6650,
                "longitude": -2.5236,
                "raw_data": {"class": "place", "type": "village", "importance": 0.41}
            }
        ]
    })
}

/// Market overview with two regions.
pub fn markets_response() -> Value {
    json!({
        "markets": {
            "us": [
                {
                    "name": "Dow Jones",
                    "stock": ".DJI:INDEXDJX",
                    "price": "42,156.10",
                    "price_movement": {"percentage": 1.2, "movement": "Up"}
                },
                {
                    "name": "Nasdaq",
                    "stock": ".IXIC:INDEXNASDAQ",
                    "price": "19,310.79",
                    "price_movement": {"percentage": -2.4, "movement": "Down"}
                }
            ],
            "asia": [
                {
                    "name": "Nikkei 225",
                    "stock": "NI225:INDEXNIKKEI",
                    "price": "39,894.54",
                    "price_movement": {"percentage": 0.3, "movement": "Up"}
                }
            ]
        }
    })
}
