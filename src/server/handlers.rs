//! The two request handlers plus the health probe.
//!
//! Each request is stateless: parse parameters, build a filter, await the
//! single store round-trip, then (for analytics) reduce synchronously.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use chrono::{NaiveDate, Utc};

use crate::db::{AnalyticsFilter, DateRange, EventStore, HistoryFilter};
use crate::error::ApiError;
use crate::history::analytics::{AnalyticsReport, aggregate};
use crate::history::period::{Period, day_end, day_start};
use crate::server::types::{
    AnalyticsParams, HistoryParams, HistoryResponse, PAGE_SIZE, Pagination,
};

/// Shared state for the HTTP API.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EventStore>,
    /// Exceeded-duration threshold in seconds, read once at startup.
    pub max_dwell_seconds: i64,
}

pub async fn health() -> &'static str {
    "OK"
}

/// `GET /analytics` — fetch all closed events in range and aggregate.
pub async fn analytics(
    State(state): State<AppState>,
    Query(params): Query<AnalyticsParams>,
) -> Result<Json<AnalyticsReport>, ApiError> {
    let range = match (&params.fecha_desde, &params.fecha_hasta) {
        (Some(desde), Some(hasta)) => DateRange::Between {
            start: day_start(parse_date("fecha_desde", desde)?),
            end: day_end(parse_date("fecha_hasta", hasta)?),
        },
        _ => {
            let period = Period::parse(params.periodo.as_deref());
            DateRange::From(day_start(period.start_date(Utc::now().date_naive())))
        }
    };

    let filter = AnalyticsFilter {
        range,
        sucursal_id: params.sucursal_id,
    };
    let rows = state.store.closed_events(&filter).await?;
    let report = aggregate(&rows, state.max_dwell_seconds);

    if report.skipped_heatmap_rows > 0 {
        tracing::warn!(
            skipped = report.skipped_heatmap_rows,
            "rows omitted from heatmap: unreadable entry timestamp"
        );
    }

    Ok(Json(report))
}

/// `GET /historico` — filtered listing, paginated unless exporting.
pub async fn history(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let filter = HistoryFilter {
        employee_id: params.id_empleado,
        name_contains: params.nombre,
        entry_from: params
            .fecha_desde
            .as_deref()
            .map(|d| parse_date("fecha_desde", d))
            .transpose()?
            .map(day_start),
        entry_to: params
            .fecha_hasta
            .as_deref()
            .map(|d| parse_date("fecha_hasta", d))
            .transpose()?
            .map(day_end),
        sucursal_id: params.sucursal_id,
    };

    if params.exportar.as_deref() == Some("true") {
        let data = state.store.history_export(&filter).await?;
        return Ok(Json(HistoryResponse {
            data,
            pagination: None,
        }));
    }

    let page = params.page.unwrap_or(1).max(1);
    let offset = (i64::from(page) - 1) * PAGE_SIZE;
    let fetched = state.store.history_page(&filter, offset, PAGE_SIZE).await?;

    let pagination = Pagination {
        total_records: fetched.total_records,
        current_page: page,
        total_pages: (fetched.total_records + PAGE_SIZE - 1) / PAGE_SIZE,
        page_size: PAGE_SIZE,
    };
    Ok(Json(HistoryResponse {
        data: fetched.records,
        pagination: Some(pagination),
    }))
}

fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, ApiError> {
    raw.parse().map_err(|_| {
        ApiError::BadRequest(format!("invalid {field}: expected YYYY-MM-DD, got {raw:?}"))
    })
}
