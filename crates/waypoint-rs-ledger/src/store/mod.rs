//! Durable, write-once storage for search records.

mod file;

pub use file::FileResultStore;

use crate::model::{SearchRecord, SearchSummary};
use std::collections::BTreeMap;
use waypoint_rs_config::StorageConfig;
use waypoint_rs_protocol::{Domain, LedgerError, ListOrder, SearchId};

/// Keyed record storage, one namespace per domain.
///
/// `put` must be atomic with respect to concurrent `get`/`list`: a reader
/// sees either nothing or the complete record.
pub trait ResultStore: Send + Sync {
    /// Commit a record under its id. Writing an id twice is a storage fault.
    fn put(&self, record: &SearchRecord) -> Result<(), LedgerError>;

    /// Load one record, or `NotFound`.
    fn get(&self, domain: Domain, id: &SearchId) -> Result<SearchRecord, LedgerError>;

    /// Summaries of every record in the domain, ordered by `(created_at, id)`.
    fn list(&self, domain: Domain, order: ListOrder) -> Result<Vec<SearchSummary>, LedgerError>;
}

/// Sort summaries by `(created_at, id)`, reversed for descending order.
pub fn sort_summaries(summaries: &mut [SearchSummary], order: ListOrder) {
    summaries.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
    if order == ListOrder::Descending {
        summaries.reverse();
    }
}

/// Directory name per domain under the store root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreLayout {
    overrides: BTreeMap<Domain, String>,
}

impl StoreLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_directory(mut self, domain: Domain, directory: impl Into<String>) -> Self {
        self.overrides.insert(domain, directory.into());
        self
    }

    /// Layout from the `storage` config section. Assumes the config was validated.
    pub fn from_config(storage: &StorageConfig) -> Self {
        Domain::ALL
            .into_iter()
            .fold(Self::new(), |layout, domain| {
                layout.with_directory(domain, storage.directory_for(domain))
            })
    }

    pub fn directory(&self, domain: Domain) -> &str {
        self.overrides
            .get(&domain)
            .map(String::as_str)
            .unwrap_or_else(|| domain.default_directory())
    }
}
