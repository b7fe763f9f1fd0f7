//! Operation surface each domain server calls.

use crate::allocator::allocate;
use crate::clock::{Clock, MonotonicClock, SystemClock};
use crate::filter::{FilteredView, Predicate};
use crate::model::{RecordOutcome, SearchRecord, SearchSummary};
use crate::schema::{DomainSchema, NormalizeContext};
use crate::store::{FileResultStore, ResultStore, StoreLayout};
use async_trait::async_trait;
use chrono::Datelike;
use log::{debug, info, warn};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use waypoint_rs_config::{SearchConfig, WaypointConfig};
use waypoint_rs_protocol::{Domain, GatewayError, LedgerError, ListOrder, RequestParams, SearchId};

/// External collaborator that performs the provider call for one domain.
///
/// Timeouts and retries belong here; the ledger treats every error the same.
#[async_trait]
pub trait VendorGateway: Send + Sync {
    fn domain(&self) -> Domain;

    /// Fetch the raw provider response for already-validated parameters.
    async fn fetch(&self, params: &RequestParams) -> Result<Value, GatewayError>;
}

/// Records searches, and serves them back whole, listed, or filtered.
pub struct Ledger {
    store: Arc<dyn ResultStore>,
    clock: MonotonicClock,
    config: SearchConfig,
}

impl Ledger {
    pub fn new(store: Arc<dyn ResultStore>, clock: Arc<dyn Clock>, config: SearchConfig) -> Self {
        Self {
            store,
            clock: MonotonicClock::new(clock),
            config,
        }
    }

    /// File-backed ledger on the wall clock, laid out per the storage section.
    pub fn from_config(config: &WaypointConfig) -> Self {
        let store = FileResultStore::open(
            config.storage.root_path(),
            StoreLayout::from_config(&config.storage),
        );
        Self::new(Arc::new(store), Arc::new(SystemClock), config.search.clone())
    }

    pub fn store(&self) -> &Arc<dyn ResultStore> {
        &self.store
    }

    /// Configured listing order.
    pub fn list_order(&self) -> ListOrder {
        self.config.list_order
    }

    /// Run `fetch` and commit what it returns under a fresh id.
    ///
    /// Parameters are checked before `fetch` runs. Nothing is allocated or
    /// written unless the response normalizes cleanly, so a failed or
    /// cancelled call leaves no trace.
    pub async fn record<F, Fut>(
        &self,
        domain: Domain,
        params: RequestParams,
        fetch: F,
    ) -> Result<RecordOutcome, LedgerError>
    where
        F: FnOnce(RequestParams) -> Fut,
        Fut: Future<Output = Result<Value, GatewayError>>,
    {
        let schema = DomainSchema::for_domain(domain);
        let params = schema.validate_params(&params)?;
        debug!(
            "requesting provider data (domain={}, params={})",
            domain,
            params.to_value()
        );

        let upstream = |source: GatewayError| {
            warn!("provider call failed (domain={}, error={})", domain, source);
            LedgerError::Upstream { domain, source }
        };
        let response = fetch(params.clone()).await.map_err(upstream)?;

        let now = self.clock.now();
        let ctx = NormalizeContext {
            max_results: self.max_results(&params),
            search_year: now.year(),
        };
        let payload = schema.normalize(&response, &ctx).map_err(upstream)?;

        let id = allocate(domain, &params, now);
        let summary = SearchSummary {
            id: id.clone(),
            domain,
            created_at: now,
            label: schema.label(&params),
            item_count: payload.items.len(),
            primary_range: schema.primary_range(&payload.items),
            request_params: params.clone(),
        };
        let record = SearchRecord {
            id: id.clone(),
            domain,
            created_at: now,
            request_params: params,
            summary: summary.clone(),
            result_payload: payload,
        };
        self.store.put(&record)?;

        info!(
            "recorded search (domain={}, id={}, items={})",
            domain, id, summary.item_count
        );
        Ok(RecordOutcome { id, summary })
    }

    /// [`Ledger::record`] with a gateway object as the fetch function.
    pub async fn record_with(
        &self,
        gateway: &dyn VendorGateway,
        params: RequestParams,
    ) -> Result<RecordOutcome, LedgerError> {
        self.record(gateway.domain(), params, |params| async move {
            gateway.fetch(&params).await
        })
        .await
    }

    /// Load one record. A malformed id is rejected before the store is touched.
    pub fn retrieve(&self, domain: Domain, id: &str) -> Result<SearchRecord, LedgerError> {
        let id = parse_id(domain, id)?;
        self.store.get(domain, &id)
    }

    pub fn enumerate(
        &self,
        domain: Domain,
        order: ListOrder,
    ) -> Result<Vec<SearchSummary>, LedgerError> {
        self.store.list(domain, order)
    }

    /// Filter a stored record. The predicate is validated against the domain
    /// schema first, so a bad predicate never reaches the store.
    pub fn derive(
        &self,
        domain: Domain,
        id: &str,
        predicate: &Predicate,
    ) -> Result<FilteredView, LedgerError> {
        let schema = DomainSchema::for_domain(domain);
        predicate.validate(schema)?;
        let record = self.retrieve(domain, id)?;
        let view = FilteredView::new(&record, predicate.clone());
        debug!(
            "derived filtered view (domain={}, id={}, kept={}, of={})",
            domain,
            record.id,
            view.total_filtered(),
            view.original_count
        );
        Ok(view)
    }

    /// Apply predicates one after another. Equivalent to a single pass with
    /// their conjunction; an empty list keeps every item.
    pub fn derive_all(
        &self,
        domain: Domain,
        id: &str,
        predicates: &[Predicate],
    ) -> Result<FilteredView, LedgerError> {
        let schema = DomainSchema::for_domain(domain);
        for predicate in predicates {
            predicate.validate(schema)?;
        }
        let record = self.retrieve(domain, id)?;
        let mut predicates = predicates.iter().cloned();
        let first = predicates
            .next()
            .unwrap_or_else(|| Predicate::All { predicates: Vec::new() });
        Ok(predicates.fold(FilteredView::new(&record, first), FilteredView::refine))
    }

    fn max_results(&self, params: &RequestParams) -> usize {
        params
            .get("max_results")
            .and_then(Value::as_u64)
            .and_then(|value| usize::try_from(value).ok())
            .unwrap_or(self.config.default_max_results)
    }
}

fn parse_id(domain: Domain, id: &str) -> Result<SearchId, LedgerError> {
    SearchId::parse(id.trim())
        .map_err(|err| LedgerError::validation(Some(domain), "search_id", err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::Ledger;
    use crate::clock::Clock;
    use crate::filter::Predicate;
    use crate::store::{FileResultStore, StoreLayout};
    use chrono::{DateTime, TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::tempdir;
    use waypoint_rs_config::SearchConfig;
    use waypoint_rs_protocol::{Domain, FaultKind, GatewayError, ListOrder, RequestParams};

    struct Fixed;

    impl Clock for Fixed {
        fn now(&self) -> DateTime<Utc> {
            Utc.with_ymd_and_hms(2025, 1, 1, 9, 30, 0).unwrap()
        }
    }

    fn ledger(root: &std::path::Path) -> Ledger {
        Ledger::new(
            Arc::new(FileResultStore::open(root, StoreLayout::new())),
            Arc::new(Fixed),
            SearchConfig::default(),
        )
    }

    #[tokio::test]
    async fn invalid_params_never_reach_the_gateway() {
        let temp = tempdir().expect("tempdir");
        let ledger = ledger(temp.path());
        let called = AtomicBool::new(false);
        let err = ledger
            .record(
                Domain::Hotel,
                RequestParams::new().with("location", "Banff"),
                |_| async {
                    called.store(true, Ordering::SeqCst);
                    Ok(json!({}))
                },
            )
            .await
            .expect_err("missing dates");
        assert_eq!(err.kind(), FaultKind::Validation);
        assert!(!called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn malformed_response_is_upstream_and_leaves_nothing() {
        let temp = tempdir().expect("tempdir");
        let ledger = ledger(temp.path());
        let err = ledger
            .record(
                Domain::Geocode,
                RequestParams::new().with("query", "Banff"),
                |_| async { Ok(json!(["not", "an", "object"])) },
            )
            .await
            .expect_err("malformed");
        assert_eq!(err.kind(), FaultKind::Upstream);
        assert!(
            ledger
                .enumerate(Domain::Geocode, ListOrder::Ascending)
                .expect("list")
                .is_empty()
        );
    }

    #[tokio::test]
    async fn max_results_param_caps_items() {
        let temp = tempdir().expect("tempdir");
        let ledger = ledger(temp.path());
        let outcome = ledger
            .record(
                Domain::Geocode,
                RequestParams::new()
                    .with("q", "Springfield")
                    .with("max_results", 2),
                |_| async {
                    Ok(json!({"locations": [
                        {"display_name": "A", "lat": "1", "lon": "2"},
                        {"display_name": "B", "lat": "3", "lon": "4"},
                        {"display_name": "C", "lat": "5", "lon": "6"}
                    ]}))
                },
            )
            .await
            .expect("record");
        assert_eq!(outcome.summary.item_count, 2);
        assert_eq!(
            outcome.summary.request_params.get_str("query"),
            Some("Springfield")
        );
    }

    #[tokio::test]
    async fn gateway_error_is_carried_verbatim() {
        let temp = tempdir().expect("tempdir");
        let ledger = ledger(temp.path());
        let err = ledger
            .record(
                Domain::Finance,
                RequestParams::new().with("query", "AAPL"),
                |_| async { Err(GatewayError::Auth("missing api key".to_string())) },
            )
            .await
            .expect_err("auth");
        assert_eq!(
            err.to_string(),
            "upstream fault in finance: authentication failed: missing api key"
        );
    }

    #[test]
    fn bad_ids_and_predicates_are_validation_faults() {
        let temp = tempdir().expect("tempdir");
        let ledger = ledger(temp.path());
        let err = ledger
            .retrieve(Domain::Event, "../../etc/passwd")
            .expect_err("path id");
        assert_eq!(err.kind(), FaultKind::Validation);

        let err = ledger
            .derive(
                Domain::Event,
                "event_missing",
                &Predicate::range("price", Some(30.0), Some(10.0)),
            )
            .expect_err("inverted range");
        assert_eq!(err.kind(), FaultKind::Validation);

        let err = ledger
            .derive(
                Domain::Event,
                "event_missing",
                &Predicate::range("price", None, Some(10.0)),
            )
            .expect_err("missing");
        assert_eq!(err.kind(), FaultKind::NotFound);
    }
}
