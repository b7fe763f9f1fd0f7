//! Test helpers shared across Waypoint crates.

pub mod clock;
pub mod fixtures;
pub mod gateway;
pub mod store;

pub use clock::{FixedClock, SteppingClock};
pub use gateway::{FailingGateway, RecordingGateway, StubGateway};
pub use store::{FailingStore, MemoryStore};

use chrono::{Duration, TimeZone, Utc};
use std::path::Path;
use std::sync::Arc;
use waypoint_rs_config::SearchConfig;
use waypoint_rs_ledger::{FileResultStore, Ledger, StoreLayout};
use waypoint_rs_protocol::Domain;
use waypoint_rs_tools::DomainServer;

/// File-backed ledger under `root`, on a clock that ticks one second per record.
pub fn file_ledger(root: &Path) -> Arc<Ledger> {
    Arc::new(Ledger::new(
        Arc::new(FileResultStore::open(root, StoreLayout::new())),
        Arc::new(stepping_clock()),
        SearchConfig::default(),
    ))
}

/// In-memory ledger on the same stepping clock.
pub fn memory_ledger() -> Arc<Ledger> {
    Arc::new(Ledger::new(
        Arc::new(MemoryStore::new()),
        Arc::new(stepping_clock()),
        SearchConfig::default(),
    ))
}

/// Domain server over `ledger` that answers searches with `response`.
pub fn stub_server(
    domain: Domain,
    ledger: Arc<Ledger>,
    response: serde_json::Value,
) -> DomainServer {
    DomainServer::builder(domain, ledger)
        .gateway(Arc::new(StubGateway::new(domain, response)))
        .build()
}

fn stepping_clock() -> SteppingClock {
    SteppingClock::new(
        Utc.with_ymd_and_hms(2025, 1, 1, 9, 30, 0)
            .single()
            .unwrap_or_default(),
        Duration::seconds(1),
    )
}
