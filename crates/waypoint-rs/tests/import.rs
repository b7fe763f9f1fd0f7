use pretty_assertions::assert_eq;
use serde_json::json;
use std::fs;
use std::sync::Arc;
use tempfile::tempdir;
use waypoint_rs::config::WaypointConfig;
use waypoint_rs::ledger::Ledger;
use waypoint_rs::protocol::{Domain, FaultKind, ListOrder, RequestParams};
use waypoint_rs::{ReplayGateway, domain_server};

#[tokio::test]
async fn imported_response_is_served_by_the_domain_server() {
    let temp = tempdir().expect("tempdir");
    let config = WaypointConfig::builder()
        .storage_root(temp.path().display().to_string())
        .directory(Domain::Event, "captured_events")
        .build();
    let response = temp.path().join("events.json");
    fs::write(
        &response,
        json!({"events_results": [
            {"title": "Jazz Night", "venue": {"name": "Banff Centre"}, "ticket_info": [{"price": "$30"}]},
            {"title": "Ski Demo", "venue": {"name": "Norquay"}}
        ]})
        .to_string(),
    )
    .expect("write response");

    let ledger = Arc::new(Ledger::from_config(&config));
    let outcome = ledger
        .record_with(
            &ReplayGateway::new(Domain::Event, &response),
            RequestParams::new().with("query", "banff events"),
        )
        .await
        .expect("import");
    assert_eq!(outcome.summary.item_count, 2);
    assert!(
        temp.path()
            .join("captured_events")
            .join(format!("{}.json", outcome.id))
            .is_file()
    );

    let server = domain_server(&config, Domain::Event, ledger.clone(), None);
    let listing = server.read_resource("events://searches").expect("listing");
    assert!(listing.contains(outcome.id.as_str()), "{listing}");

    let filtered = server
        .call_tool(
            "filter_events_by_venue",
            json!({"search_id": outcome.id, "venue_names": ["norquay"]}),
        )
        .await
        .expect("filter");
    assert_eq!(filtered["items"][0]["title"], json!("Ski Demo"));
}

#[tokio::test]
async fn unreadable_capture_records_nothing() {
    let temp = tempdir().expect("tempdir");
    let config = WaypointConfig::builder()
        .storage_root(temp.path().display().to_string())
        .build();
    let ledger = Ledger::from_config(&config);

    let err = ledger
        .record_with(
            &ReplayGateway::new(Domain::Hotel, temp.path().join("missing.json")),
            RequestParams::new()
                .with("location", "Banff")
                .with("check_in_date", "2025-02-01")
                .with("check_out_date", "2025-02-03"),
        )
        .await
        .expect_err("missing capture");
    assert_eq!(err.kind(), FaultKind::Upstream);
    assert!(
        ledger
            .enumerate(Domain::Hotel, ListOrder::Ascending)
            .expect("list")
            .is_empty()
    );
}
