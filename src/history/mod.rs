//! Event history: Postgres store, period resolution, and analytics.

pub mod analytics;
pub mod period;
pub mod store;

pub use analytics::{AnalyticsReport, aggregate};
pub use period::Period;
pub use store::{BranchRef, ClosedEvent, HistoryRecord, Store};
