//! Search-result ledger: id allocation, write-once storage, and filtered
//! views over recorded searches.

pub mod allocator;
pub mod clock;
pub mod facade;
pub mod filter;
pub mod model;
pub mod schema;
pub mod store;

/// Id allocation.
pub use allocator::allocate;
/// Time sources.
pub use clock::{Clock, MonotonicClock, SystemClock};
/// Ledger facade and the gateway seam.
pub use facade::{Ledger, VendorGateway};
/// Filter engine.
pub use filter::{FilteredView, MatchMode, Predicate, Require, filter_items};
/// Record model.
pub use model::{
    FieldKind, FieldValue, PrimaryRange, RecordOutcome, ResultItem, ResultPayload, SearchRecord,
    SearchSummary,
};
/// Per-domain request and result schemas.
pub use schema::{DomainSchema, FieldSpec, NormalizeContext, ParamKind, ParamSpec};
/// Result storage.
pub use store::{FileResultStore, ResultStore, StoreLayout};
