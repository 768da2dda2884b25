//! PostgreSQL store for the `historico` event table.

use chrono::{DateTime, Utc};
use deadpool_postgres::{Config, Pool, Runtime};
use tokio_postgres::NoTls;
use tokio_postgres::types::ToSql;

use crate::config::DatabaseConfig;
use crate::db::{AnalyticsFilter, DateRange, EventStore, HistoryFilter, HistoryPage};
use crate::error::DatabaseError;

/// A closed event row fetched for aggregation.
#[derive(Debug, Clone)]
pub struct ClosedEvent {
    pub employee_id: String,
    pub name: String,
    /// Entry timestamp. `None` when the column is NULL or fails to decode;
    /// such rows are skipped by the heatmap only.
    pub entry_at: Option<DateTime<Utc>>,
    /// `None` when the dwell time was never computed upstream.
    pub duration_seconds: Option<i64>,
}

/// Joined branch reference embedded in a listing row.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BranchRef {
    pub nombre: String,
}

/// A raw event row for the listing endpoint. Field names match the wire
/// format of the upstream table.
#[derive(Debug, Clone, serde::Serialize)]
pub struct HistoryRecord {
    pub id: i64,
    pub employee_id: String,
    pub name: String,
    pub hora_entrada: DateTime<Utc>,
    pub hora_salida: Option<DateTime<Utc>>,
    pub tiempo_dentro_segundos: Option<i64>,
    pub sucursal: Option<BranchRef>,
}

const SELECT_RECORD: &str = "SELECT h.id, h.employee_id, h.name, h.hora_entrada, h.hora_salida, \
     h.tiempo_dentro_segundos, s.nombre AS sucursal_nombre \
     FROM historico h LEFT JOIN sucursales s ON s.id = h.sucursal_id";

/// Database store backed by a deadpool connection pool.
pub struct Store {
    pool: Pool,
}

impl Store {
    /// Create a new store and connect to the database.
    pub async fn new(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let mut cfg = Config::new();
        cfg.url = Some(config.url().to_string());
        cfg.pool = Some(deadpool_postgres::PoolConfig {
            max_size: config.pool_size,
            ..Default::default()
        });

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| DatabaseError::Pool(e.to_string()))?;

        // Test connection
        let _ = pool.get().await?;

        Ok(Self { pool })
    }

    /// Get a connection from the pool.
    async fn conn(&self) -> Result<deadpool_postgres::Object, DatabaseError> {
        Ok(self.pool.get().await?)
    }
}

#[async_trait::async_trait]
impl EventStore for Store {
    async fn closed_events(
        &self,
        filter: &AnalyticsFilter,
    ) -> Result<Vec<ClosedEvent>, DatabaseError> {
        let conn = self.conn().await?;

        let mut sql = String::from(
            "SELECT employee_id, name, hora_entrada, tiempo_dentro_segundos \
             FROM historico WHERE hora_salida IS NOT NULL",
        );
        let mut params: Vec<&(dyn ToSql + Sync)> = Vec::new();

        match &filter.range {
            DateRange::From(start) => {
                params.push(start);
                sql.push_str(&format!(" AND hora_entrada >= ${}", params.len()));
            }
            DateRange::Between { start, end } => {
                params.push(start);
                sql.push_str(&format!(" AND hora_entrada >= ${}", params.len()));
                params.push(end);
                sql.push_str(&format!(" AND hora_salida <= ${}", params.len()));
            }
        }
        if let Some(ref sucursal) = filter.sucursal_id {
            params.push(sucursal);
            sql.push_str(&format!(" AND sucursal_id = ${}", params.len()));
        }

        let rows = conn.query(sql.as_str(), &params).await?;

        let mut events = Vec::with_capacity(rows.len());
        for row in rows {
            let employee_id: String = match row.try_get("employee_id") {
                Ok(value) => value,
                Err(e) => {
                    tracing::warn!("dropping row with unreadable employee_id: {e}");
                    continue;
                }
            };
            let name: String = match row.try_get("name") {
                Ok(value) => value,
                Err(e) => {
                    tracing::warn!("dropping row with unreadable name: {e}");
                    continue;
                }
            };
            events.push(ClosedEvent {
                employee_id,
                name,
                entry_at: row.try_get::<_, DateTime<Utc>>("hora_entrada").ok(),
                duration_seconds: row
                    .try_get::<_, Option<i64>>("tiempo_dentro_segundos")
                    .ok()
                    .flatten(),
            });
        }
        Ok(events)
    }

    async fn history_page(
        &self,
        filter: &HistoryFilter,
        offset: i64,
        limit: i64,
    ) -> Result<HistoryPage, DatabaseError> {
        let conn = self.conn().await?;
        let (where_sql, params) = history_conditions(filter);
        let refs: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|p| p.as_ref() as &(dyn ToSql + Sync)).collect();

        let count_sql = format!("SELECT COUNT(*) FROM historico h{where_sql}");
        let total_records: i64 = conn.query_one(count_sql.as_str(), &refs).await?.try_get(0)?;

        let select_sql = format!(
            "{SELECT_RECORD}{where_sql} ORDER BY h.id DESC LIMIT ${} OFFSET ${}",
            refs.len() + 1,
            refs.len() + 2,
        );
        let mut page_refs = refs;
        page_refs.push(&limit);
        page_refs.push(&offset);

        let rows = conn.query(select_sql.as_str(), &page_refs).await?;
        Ok(HistoryPage {
            records: collect_records(rows),
            total_records,
        })
    }

    async fn history_export(
        &self,
        filter: &HistoryFilter,
    ) -> Result<Vec<HistoryRecord>, DatabaseError> {
        let conn = self.conn().await?;
        let (where_sql, params) = history_conditions(filter);
        let refs: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|p| p.as_ref() as &(dyn ToSql + Sync)).collect();

        let sql = format!("{SELECT_RECORD}{where_sql} ORDER BY h.id DESC");
        let rows = conn.query(sql.as_str(), &refs).await?;
        Ok(collect_records(rows))
    }
}

/// Render the WHERE clause for a listing filter, returning the SQL fragment
/// and its owned parameter values in positional order.
fn history_conditions(filter: &HistoryFilter) -> (String, Vec<Box<dyn ToSql + Sync + Send>>) {
    let mut sql = String::from(" WHERE true");
    let mut params: Vec<Box<dyn ToSql + Sync + Send>> = Vec::new();

    if let Some(id) = &filter.employee_id {
        params.push(Box::new(id.clone()));
        sql.push_str(&format!(" AND h.employee_id = ${}", params.len()));
    }
    if let Some(name) = &filter.name_contains {
        params.push(Box::new(format!("%{name}%")));
        sql.push_str(&format!(" AND h.name ILIKE ${}", params.len()));
    }
    if let Some(from) = filter.entry_from {
        params.push(Box::new(from));
        sql.push_str(&format!(" AND h.hora_entrada >= ${}", params.len()));
    }
    if let Some(to) = filter.entry_to {
        params.push(Box::new(to));
        sql.push_str(&format!(" AND h.hora_entrada <= ${}", params.len()));
    }
    if let Some(sucursal) = filter.sucursal_id {
        params.push(Box::new(sucursal));
        sql.push_str(&format!(" AND h.sucursal_id = ${}", params.len()));
    }

    (sql, params)
}

/// Map rows into records, logging and skipping any row whose required
/// columns fail to decode.
fn collect_records(rows: Vec<tokio_postgres::Row>) -> Vec<HistoryRecord> {
    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        match record_from_row(&row) {
            Ok(record) => records.push(record),
            Err(e) => tracing::warn!("dropping undecodable history row: {e}"),
        }
    }
    records
}

fn record_from_row(row: &tokio_postgres::Row) -> Result<HistoryRecord, tokio_postgres::Error> {
    Ok(HistoryRecord {
        id: row.try_get("id")?,
        employee_id: row.try_get("employee_id")?,
        name: row.try_get("name")?,
        hora_entrada: row.try_get("hora_entrada")?,
        hora_salida: row.try_get("hora_salida")?,
        tiempo_dentro_segundos: row.try_get("tiempo_dentro_segundos")?,
        sucursal: row
            .try_get::<_, Option<String>>("sucursal_nombre")?
            .map(|nombre| BranchRef { nombre }),
    })
}
