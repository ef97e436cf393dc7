//! Data storage layer
//!
//! Provides the storage services for the application:
//! - `postgres` - Transactional database holding delivery data and the
//!   report catalog
//! - `cache` - In-memory, Redis, or disabled caching of resolved reports
//! - `types` - Shared row types across repositories

pub mod cache;
pub mod postgres;
pub mod types;

pub use cache::{CacheKey, CacheService};
pub use postgres::{PostgresError, PostgresService};
pub use types::{IncrementRow, ReportDefinitionRow, SprintRow};
