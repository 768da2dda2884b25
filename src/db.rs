//! Store abstraction over the `historico` event table.
//!
//! Handlers hold the store as `Arc<dyn EventStore>` so tests can substitute
//! an in-memory implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::DatabaseError;
use crate::history::{ClosedEvent, HistoryRecord};

/// Time bounds applied to the analytics fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRange {
    /// `hora_entrada >= start`, open upper bound.
    From(DateTime<Utc>),
    /// `hora_entrada >= start` and `hora_salida <= end`. The upper bound
    /// runs against the exit column, matching the upstream API.
    Between {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// Filter for the analytics fetch. Closed events only; the store always
/// excludes rows still checked in.
#[derive(Debug, Clone)]
pub struct AnalyticsFilter {
    pub range: DateRange,
    pub sucursal_id: Option<i64>,
}

/// Filter for the record listing.
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    /// Exact match on the employee id.
    pub employee_id: Option<String>,
    /// Case-insensitive substring match on the name.
    pub name_contains: Option<String>,
    /// Inclusive lower bound on `hora_entrada`.
    pub entry_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `hora_entrada`.
    pub entry_to: Option<DateTime<Utc>>,
    /// Exact match on the branch id.
    pub sucursal_id: Option<i64>,
}

/// One page of records plus the exact total matching the filter.
#[derive(Debug)]
pub struct HistoryPage {
    pub records: Vec<HistoryRecord>,
    pub total_records: i64,
}

/// Data store client for the event table.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Fetch every closed event matching the filter, unpaginated.
    async fn closed_events(
        &self,
        filter: &AnalyticsFilter,
    ) -> Result<Vec<ClosedEvent>, DatabaseError>;

    /// Fetch one page of records, newest id first, with an exact count.
    async fn history_page(
        &self,
        filter: &HistoryFilter,
        offset: i64,
        limit: i64,
    ) -> Result<HistoryPage, DatabaseError>;

    /// Fetch every record matching the filter, newest id first (export mode).
    /// The caller owns the cost of large result sets.
    async fn history_export(
        &self,
        filter: &HistoryFilter,
    ) -> Result<Vec<HistoryRecord>, DatabaseError>;
}
