//! Explorer Module
//!
//! Search orchestration in front of paid discovery providers: lookup,
//! real query execution, and page prefetch.

mod executor;
mod lookup;
mod prefetch;
mod search;

pub use executor::{HttpQueryExecutor, QueryExecutor};
pub use lookup::{ExplorerCache, LookupOutcome};
pub use prefetch::{PrefetchStats, Prefetcher};
pub use search::{PopularSearch, SearchService};
