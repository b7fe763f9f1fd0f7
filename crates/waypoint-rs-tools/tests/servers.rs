use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::sync::Arc;
use tempfile::tempdir;
use waypoint_rs_protocol::{Domain, ListOrder, ToolError};
use waypoint_rs_test_utils::fixtures::{
    events_response, flights_response, forecast_response, hotels_response, locations_response,
    markets_response,
};
use waypoint_rs_test_utils::{FailingGateway, file_ledger, memory_ledger, stub_server};
use waypoint_rs_tools::{DomainServer, ToolOutputPolicy, search_tool_name};

async fn search(server: &DomainServer, args: Value) -> String {
    let output = server
        .call_tool(search_tool_name(server.domain()), args)
        .await
        .expect("search");
    output["search_id"]
        .as_str()
        .expect("search_id string")
        .to_string()
}

async fn filter(server: &DomainServer, tool: &str, search_id: &str, mut args: Value) -> Value {
    args["search_id"] = json!(search_id);
    server.call_tool(tool, args).await.expect(tool)
}

fn names(output: &Value, key: &str) -> Vec<String> {
    output["items"]
        .as_array()
        .expect("items")
        .iter()
        .map(|item| item[key].as_str().unwrap_or_default().to_string())
        .collect()
}

#[tokio::test]
async fn event_search_details_and_filters() {
    let temp = tempdir().expect("tempdir");
    let server = stub_server(
        Domain::Event,
        file_ledger(temp.path()),
        events_response(&[10.0, 25.0, 40.0]),
    );

    let output = server
        .call_tool(
            "search_events",
            json!({"q": "hiking events", "location": "Banff"}),
        )
        .await
        .expect("search");
    assert_eq!(output["summary"]["item_count"], json!(3));
    assert_eq!(output["summary"]["label"], json!("hiking events / Banff"));
    let id = output["search_id"].as_str().expect("id").to_string();

    let details = server
        .call_tool("get_event_details", json!({"search_id": id}))
        .await
        .expect("details");
    assert_eq!(details["request_params"]["query"], json!("hiking events"));
    assert_eq!(
        details["result_payload"]["items"]
            .as_array()
            .map(Vec::len),
        Some(3)
    );

    let concerts = filter(
        &server,
        "filter_events_by_type",
        &id,
        json!({"event_types": ["Concert"]}),
    )
    .await;
    assert_eq!(names(&concerts, "title"), vec!["Guided Hike 2"]);
    assert_eq!(concerts["original_count"], json!(3));
    assert_eq!(concerts["total_filtered"], json!(1));

    let lake = filter(
        &server,
        "filter_events_by_venue",
        &id,
        json!({"venue_names": ["lake louise"]}),
    )
    .await;
    assert_eq!(names(&lake, "title"), vec!["Guided Hike 3"]);

    let early = filter(
        &server,
        "filter_events_by_date",
        &id,
        json!({"from": "2025-01-05", "to": "2025-01-06"}),
    )
    .await;
    assert_eq!(names(&early, "title"), vec!["Guided Hike 1", "Guided Hike 2"]);

    let cheap = filter(
        &server,
        "filter_event_results",
        &id,
        json!({"predicate": {"kind": "range", "field": "price", "max": 25}}),
    )
    .await;
    assert_eq!(names(&cheap, "title"), vec!["Guided Hike 1", "Guided Hike 2"]);
    assert_eq!(
        cheap["filters_applied"],
        json!({"kind": "range", "field": "price", "max": 25.0})
    );
}

#[tokio::test]
async fn hotel_filters() {
    let server = stub_server(Domain::Hotel, memory_ledger(), hotels_response());
    let id = search(
        &server,
        json!({"location": "Banff", "check_in_date": "2025-02-01", "check_out_date": "2025-02-03"}),
    )
    .await;

    let pools = filter(
        &server,
        "filter_hotels_by_amenities",
        &id,
        json!({"required_amenities": ["pool", "Free Wi-Fi"]}),
    )
    .await;
    assert_eq!(names(&pools, "name"), vec!["Elk Lodge", "Fairmont Banff Springs"]);
    assert_eq!(
        pools["filters_applied"],
        json!({"required_amenities": ["pool", "Free Wi-Fi"]})
    );

    let rated = filter(&server, "filter_hotels_by_rating", &id, json!({})).await;
    assert_eq!(names(&rated, "name"), vec!["Elk Lodge", "Fairmont Banff Springs"]);

    let luxury = filter(
        &server,
        "filter_hotels_by_class",
        &id,
        json!({"hotel_classes": [4, 5]}),
    )
    .await;
    assert_eq!(names(&luxury, "name"), vec!["Fairmont Banff Springs"]);

    let budget = filter(
        &server,
        "filter_hotels_by_price",
        &id,
        json!({"max_price": 200}),
    )
    .await;
    assert_eq!(names(&budget, "name"), vec!["Banff Hostel", "Elk Lodge"]);

    let err = server
        .call_tool("filter_hotels_by_price", json!({"search_id": id}))
        .await
        .expect_err("no bounds");
    assert!(matches!(err, ToolError::InvalidArguments(_)), "{err}");

    let combined = filter(
        &server,
        "filter_hotel_results",
        &id,
        json!({"predicates": [
            {"kind": "membership", "field": "amenities", "values": ["Pool"], "require": "all"},
            {"kind": "range", "field": "price", "max": 300}
        ]}),
    )
    .await;
    assert_eq!(names(&combined, "name"), vec!["Elk Lodge"]);
}

#[tokio::test]
async fn flight_filters_keep_vendor_order() {
    let server = stub_server(Domain::Flight, memory_ledger(), flights_response());
    let id = search(
        &server,
        json!({"departure_id": "YYC", "arrival_id": "YVR", "outbound_date": "2025-02-01"}),
    )
    .await;

    let cheap = filter(
        &server,
        "filter_flights_by_price",
        &id,
        json!({"max_price": 150}),
    )
    .await;
    let prices: Vec<Value> = cheap["items"]
        .as_array()
        .expect("items")
        .iter()
        .map(|item| item["price"].clone())
        .collect();
    assert_eq!(prices, vec![json!(142), json!(99)]);

    let air_canada = filter(
        &server,
        "filter_flights_by_airline",
        &id,
        json!({"airlines": ["air canada"]}),
    )
    .await;
    assert_eq!(air_canada["total_filtered"], json!(1));
    assert_eq!(air_canada["items"][0]["price"], json!(142));
}

#[tokio::test]
async fn forecast_filter_uses_wind_threshold() {
    let server = stub_server(Domain::Weather, memory_ledger(), forecast_response());
    let id = search(&server, json!({"location": "Banff", "kind": "forecast"})).await;

    let calm = filter(
        &server,
        "filter_forecast_by_conditions",
        &id,
        json!({"max_precipitation_chance": 30, "wind_speed_threshold": "15 mph"}),
    )
    .await;
    assert_eq!(names(&calm, "short_forecast"), vec!["Sunny", "Partly Cloudy"]);

    let mild = filter(
        &server,
        "filter_forecast_by_conditions",
        &id,
        json!({"min_temp": 0}),
    )
    .await;
    assert_eq!(names(&mild, "short_forecast"), vec!["Snow Showers"]);
}

#[tokio::test]
async fn geocoder_filters_and_distance() {
    let server = stub_server(Domain::Geocode, memory_ledger(), locations_response());
    let id = search(&server, json!({"location": "Banff"})).await;

    let north = filter(
        &server,
        "filter_locations_by_bounds",
        &id,
        json!({"min_latitude": 55}),
    )
    .await;
    assert_eq!(
        names(&north, "display_name"),
        vec!["Banff, Aberdeenshire, Scotland"]
    );

    let towns = filter(
        &server,
        "filter_locations_by_type",
        &id,
        json!({"place_types": ["town"]}),
    )
    .await;
    assert_eq!(names(&towns, "display_name"), vec!["Banff, Alberta, Canada"]);

    let distance = server
        .call_tool(
            "calculate_distance",
            json!({"lat1": 51.1784, "lon1": -115.5708, "lat2": 51.0447, "lon2": -114.0719, "unit": "km"}),
        )
        .await
        .expect("distance");
    let km = distance["distance"].as_f64().expect("number");
    assert!((100.0..110.0).contains(&km), "{km}");
    assert_eq!(distance["calculation_method"], json!("haversine"));

    let err = server
        .call_tool(
            "calculate_distance",
            json!({"lat1": 91, "lon1": 0, "lat2": 0, "lon2": 0}),
        )
        .await
        .expect_err("latitude out of range");
    assert!(matches!(err, ToolError::InvalidArguments(_)), "{err}");

    let listing = server
        .read_resource("geocoder://locations")
        .expect("collection alias");
    assert!(listing.contains("Total searches: 1"), "{listing}");
}

#[tokio::test]
async fn stock_movement_filter() {
    let server = stub_server(Domain::Finance, memory_ledger(), markets_response());
    let id = search(&server, json!({"q": "markets", "kind": "market"})).await;

    let movers = filter(
        &server,
        "filter_stocks_by_price_movement",
        &id,
        json!({"min_percentage": 1.0}),
    )
    .await;
    let mut movers = names(&movers, "name");
    movers.sort();
    assert_eq!(movers, vec!["Dow Jones", "Nasdaq"]);

    let down = filter(
        &server,
        "filter_stocks_by_price_movement",
        &id,
        json!({"movement_type": "down"}),
    )
    .await;
    assert_eq!(names(&down, "name"), vec!["Nasdaq"]);
}

#[tokio::test]
async fn resources_render_listing_and_detail() {
    let temp = tempdir().expect("tempdir");
    let server = stub_server(
        Domain::Event,
        file_ledger(temp.path()),
        events_response(&[10.0, 25.0, 40.0]),
    );

    let empty = server.read_resource("events://searches").expect("listing");
    assert_eq!(
        empty,
        "# Event Searches\n\nNo event searches found.\n\nUse the search_events tool to record one.\n"
    );

    let id = search(&server, json!({"query": "hiking events", "location": "Banff"})).await;
    let listing = server.read_resource("events://searches").expect("listing");
    assert!(listing.contains("Total searches: 1"), "{listing}");
    assert!(listing.contains(&format!("## {id}")), "{listing}");
    assert!(listing.contains("- **Price range**: 10 to 40"), "{listing}");

    let detail = server
        .read_resource(&format!("events://{id}"))
        .expect("detail");
    assert!(detail.starts_with(&format!("# Event Search: {id}\n")), "{detail}");
    assert!(detail.contains("- **location**: Banff"), "{detail}");
    assert!(detail.contains("## Top Results (3 of 3)"), "{detail}");
    assert!(detail.contains("### 1. Guided Hike 1"), "{detail}");

    let err = server
        .read_resource("events://event_never_recorded")
        .expect_err("missing");
    assert!(matches!(err, ToolError::NotFound(_)), "{err}");

    let err = server
        .read_resource("hotels://searches")
        .expect_err("other domain");
    assert!(matches!(err, ToolError::NotFound(_)), "{err}");

    assert_eq!(
        server.resource_templates(),
        ["events://searches".to_string(), "events://{id}".to_string()]
    );
}

#[tokio::test]
async fn faults_map_to_tool_errors() {
    let temp = tempdir().expect("tempdir");
    let ledger = file_ledger(temp.path());
    let server = DomainServer::builder(Domain::Hotel, ledger.clone())
        .gateway(Arc::new(FailingGateway::timeout(Domain::Hotel)))
        .build();

    let err = server
        .call_tool(
            "search_hotels",
            json!({"location": "Banff", "check_in_date": "2025-02-01", "check_out_date": "2025-02-03"}),
        )
        .await
        .expect_err("timeout");
    assert!(matches!(err, ToolError::Upstream(_)), "{err}");
    assert!(
        ledger
            .enumerate(Domain::Hotel, ListOrder::Ascending)
            .expect("list")
            .is_empty()
    );

    let err = server
        .call_tool("search_hotels", json!({"location": "Banff"}))
        .await
        .expect_err("missing dates");
    assert!(matches!(err, ToolError::InvalidArguments(_)), "{err}");

    let err = server
        .call_tool("get_hotel_details", json!({"search_id": "../etc/passwd"}))
        .await
        .expect_err("bad id");
    assert!(matches!(err, ToolError::InvalidArguments(_)), "{err}");

    let err = server
        .call_tool("get_hotel_details", json!({"search_id": "hotel_missing"}))
        .await
        .expect_err("missing");
    assert!(matches!(err, ToolError::NotFound(_)), "{err}");

    let err = server
        .call_tool("filter_hotel_results", json!({"search_id": "hotel_missing"}))
        .await
        .expect_err("no predicate");
    assert!(matches!(err, ToolError::InvalidArguments(_)), "{err}");

    let err = server
        .call_tool("book_hotel", json!({}))
        .await
        .expect_err("unknown tool");
    assert!(matches!(err, ToolError::ToolNotFound(_)), "{err}");

    let offline = DomainServer::builder(Domain::Hotel, ledger).build();
    let err = offline
        .call_tool("search_hotels", json!({"location": "Banff"}))
        .await
        .expect_err("no gateway");
    assert!(matches!(err, ToolError::ExecutionFailed(_)), "{err}");
}

#[tokio::test]
async fn output_policy_redacts_tool_results() {
    let server = DomainServer::builder(Domain::Event, memory_ledger())
        .gateway(Arc::new(waypoint_rs_test_utils::StubGateway::new(
            Domain::Event,
            events_response(&[10.0, 25.0]),
        )))
        .output_policy(ToolOutputPolicy {
            redact_keys: vec!["ticket_info".to_string()],
            max_array_len: 1,
            ..ToolOutputPolicy::default()
        })
        .build();
    let id = search(&server, json!({"query": "hiking events"})).await;

    let output = filter(
        &server,
        "filter_event_results",
        &id,
        json!({"predicate": {"kind": "range", "field": "price", "min": 0}}),
    )
    .await;
    assert_eq!(output["total_filtered"], json!(2));
    assert_eq!(output["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(output["items"][0]["ticket_info"], json!("[REDACTED]"));
}

#[test]
fn every_domain_exposes_search_details_and_generic_filter() {
    for domain in Domain::ALL {
        let server = DomainServer::builder(domain, memory_ledger()).build();
        let names: Vec<String> = server.tools().into_iter().map(|spec| spec.name).collect();
        assert!(names.contains(&search_tool_name(domain).to_string()));
        assert!(names.contains(&format!("get_{}_details", domain.tag())));
        assert!(names.contains(&format!("filter_{}_results", domain.tag())));
        assert_eq!(
            names.contains(&"calculate_distance".to_string()),
            domain == Domain::Geocode
        );
    }
}
