//! Request and response DTOs for the HTTP API.

use serde::{Deserialize, Serialize};

use crate::history::HistoryRecord;

/// Fixed page size for the record listing.
pub const PAGE_SIZE: i64 = 50;

/// Query parameters for `GET /analytics`.
#[derive(Debug, Default, Deserialize)]
pub struct AnalyticsParams {
    /// `hoy`, `semana`, or `mes`; anything else means `semana`.
    pub periodo: Option<String>,
    /// `YYYY-MM-DD`; only honored together with `fecha_hasta`.
    pub fecha_desde: Option<String>,
    pub fecha_hasta: Option<String>,
    pub sucursal_id: Option<i64>,
}

/// Query parameters for `GET /historico`.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
    pub page: Option<u32>,
    pub id_empleado: Option<String>,
    pub nombre: Option<String>,
    pub fecha_desde: Option<String>,
    pub fecha_hasta: Option<String>,
    pub sucursal_id: Option<i64>,
    /// Literal `"true"` bypasses pagination entirely.
    pub exportar: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub total_records: i64,
    pub current_page: u32,
    pub total_pages: i64,
    pub page_size: i64,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub data: Vec<HistoryRecord>,
    /// Absent in export mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}
