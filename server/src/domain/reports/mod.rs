//! Report resolution domain
//!
//! Everything between the HTTP surface and the stores:
//! - `catalog` - built-in definitions and startup reconciliation
//! - `filters` - typed filter values, query normalization, merge/validation
//! - `resolver` - the orchestrator (cache read-through, dispatch, wrapping)
//! - `sources` - the closed data-source set and its fetch adapters
//! - `ttl` - report-id substring heuristic for cache TTLs

pub mod catalog;
pub mod filters;
pub mod resolver;
pub mod sources;
pub mod ttl;

pub use catalog::{CatalogError, seed_catalog};
pub use filters::{FilterSet, FilterValue};
pub use resolver::{
    CacheStats, CatalogEntry, InvalidationOutcome, ReportError, ReportPayload, ReportResolver,
    ResolveOptions, ResolvedReport,
};
pub use sources::{DataSource, ReportResult};
