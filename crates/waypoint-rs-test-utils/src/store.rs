use parking_lot::RwLock;
use std::collections::BTreeMap;
use waypoint_rs_ledger::store::sort_summaries;
use waypoint_rs_ledger::{ResultStore, SearchRecord, SearchSummary};
use waypoint_rs_protocol::{Domain, LedgerError, ListOrder, SearchId};

/// Write-once store held in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<(Domain, SearchId), SearchRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl ResultStore for MemoryStore {
    fn put(&self, record: &SearchRecord) -> Result<(), LedgerError> {
        let key = (record.domain, record.id.clone());
        let mut records = self.records.write();
        if records.contains_key(&key) {
            return Err(LedgerError::storage(
                record.domain,
                Some(&record.id),
                "publish record",
                "id is already committed",
            ));
        }
        records.insert(key, record.clone());
        Ok(())
    }

    fn get(&self, domain: Domain, id: &SearchId) -> Result<SearchRecord, LedgerError> {
        self.records
            .read()
            .get(&(domain, id.clone()))
            .cloned()
            .ok_or_else(|| LedgerError::NotFound {
                domain,
                id: id.clone(),
            })
    }

    fn list(&self, domain: Domain, order: ListOrder) -> Result<Vec<SearchSummary>, LedgerError> {
        let mut summaries: Vec<SearchSummary> = self
            .records
            .read()
            .values()
            .filter(|record| record.domain == domain)
            .map(|record| record.summary.clone())
            .collect();
        sort_summaries(&mut summaries, order);
        Ok(summaries)
    }
}

/// Store whose medium refuses every operation.
#[derive(Debug, Default)]
pub struct FailingStore;

impl ResultStore for FailingStore {
    fn put(&self, record: &SearchRecord) -> Result<(), LedgerError> {
        Err(LedgerError::storage(
            record.domain,
            Some(&record.id),
            "write staging file",
            "no space left on device",
        ))
    }

    fn get(&self, domain: Domain, id: &SearchId) -> Result<SearchRecord, LedgerError> {
        Err(LedgerError::storage(
            domain,
            Some(id),
            "read record",
            "permission denied",
        ))
    }

    fn list(&self, domain: Domain, _order: ListOrder) -> Result<Vec<SearchSummary>, LedgerError> {
        Err(LedgerError::storage(
            domain,
            None,
            "list records",
            "permission denied",
        ))
    }
}
