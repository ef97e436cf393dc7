//! Domain logic for delivery-metrics reporting
//!
//! - `reports` - definition catalog, filter handling, data-source dispatch,
//!   and the cache-aware resolution orchestrator

pub mod reports;

pub use reports::{ReportError, ReportResolver, ResolveOptions};
