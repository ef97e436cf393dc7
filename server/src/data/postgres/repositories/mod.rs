//! PostgreSQL repositories
//!
//! Free functions over a `PgPool`, grouped by the report area they serve.

pub mod activity_metrics;
pub mod increment_metrics;
pub mod issue_metrics;
pub mod report_definitions;
pub mod sprint_metrics;
pub mod teams;
