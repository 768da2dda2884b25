//! In-memory aggregation over closed events.
//!
//! The analytics endpoint fetches every closed event in range and reduces
//! the rows here: a single pass accumulates KPIs, per-employee summaries,
//! the duration histogram, and the day/hour heatmap; one stable sort then
//! yields the Pareto ranking. Serialized field names match the wire format
//! of the upstream API.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, Timelike};
use serde::Serialize;

use crate::history::ClosedEvent;

/// Top-line indicators for the selected range.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Kpis {
    /// Mean dwell time in seconds across all closed entries.
    pub tiempo_promedio_general: f64,
    /// Closed entries with a known duration.
    pub total_ingresos: u64,
    /// Entries whose dwell time exceeded the threshold.
    pub total_excedidos: u64,
    /// Share of entries within the threshold, in percent. 100 when empty.
    pub cumplimiento_seguridad: f64,
    /// Share of exceeded entries, in percent. 0 when empty.
    pub tasa_excedidos: f64,
}

/// Per-employee accumulation, built fresh per request.
#[derive(Debug, Clone, Serialize)]
pub struct EmployeeSummary {
    pub employee_id: String,
    pub name: String,
    pub total_segundos: i64,
    pub total_ingresos: u64,
    pub total_excedidos: u64,
    pub promedio_segundos: f64,
    /// Duplicate of `total_segundos`, kept for wire compatibility.
    pub tiempo_total: i64,
}

/// Fixed five-bucket dwell-time histogram. Upper bounds are inclusive;
/// the last bucket is open-ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Histogram {
    #[serde(rename = "0-15m")]
    pub up_to_15m: u64,
    #[serde(rename = "15-30m")]
    pub up_to_30m: u64,
    #[serde(rename = "30-45m")]
    pub up_to_45m: u64,
    #[serde(rename = "45-60m")]
    pub up_to_60m: u64,
    #[serde(rename = ">60m")]
    pub over_60m: u64,
}

impl Histogram {
    fn record(&mut self, seconds: i64) {
        if seconds <= 900 {
            self.up_to_15m += 1;
        } else if seconds <= 1800 {
            self.up_to_30m += 1;
        } else if seconds <= 2700 {
            self.up_to_45m += 1;
        } else if seconds <= 3600 {
            self.up_to_60m += 1;
        } else {
            self.over_60m += 1;
        }
    }

    /// Sum of all bucket counts.
    pub fn total(&self) -> u64 {
        self.up_to_15m + self.up_to_30m + self.up_to_45m + self.up_to_60m + self.over_60m
    }
}

/// Sparse entry counts keyed by UTC day of week (0 = Sunday) then hour.
pub type Heatmap = BTreeMap<u8, BTreeMap<u8, u64>>;

/// One employee in the Pareto ranking.
#[derive(Debug, Clone, Serialize)]
pub struct ParetoEntry {
    pub name: String,
    pub excedidos: u64,
    /// Running share of the grand exceeded total, in percent.
    pub cumulative_percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Charts {
    pub histograma: Histogram,
    pub heatmap: Heatmap,
    pub pareto: Vec<ParetoEntry>,
}

/// Full analytics response body.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsReport {
    pub kpis: Kpis,
    /// Per-employee summaries in Pareto order (descending exceeded count,
    /// first appearance breaking ties).
    pub resumen_trabajador: Vec<EmployeeSummary>,
    /// `employee_id -> exceeded count`, derived from the summaries.
    pub excedidos_trabajador: BTreeMap<String, u64>,
    pub graficos: Charts,
    /// Rows whose entry timestamp could not be read. Omitted from the
    /// heatmap only; every other aggregate still counts them.
    #[serde(skip)]
    pub skipped_heatmap_rows: u64,
}

/// Reduce closed events into the full analytics report.
///
/// A row with an unknown duration is dropped from every aggregate and
/// decrements the entry count; it never fails the request. An entry whose
/// duration is strictly greater than `max_dwell_seconds` counts as exceeded.
pub fn aggregate(rows: &[ClosedEvent], max_dwell_seconds: i64) -> AnalyticsReport {
    let mut total_ingresos = rows.len() as u64;
    let mut total_excedidos = 0u64;
    let mut total_segundos = 0i64;
    let mut summaries: Vec<EmployeeSummary> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut histograma = Histogram::default();
    let mut heatmap = Heatmap::new();
    let mut skipped_heatmap_rows = 0u64;

    for row in rows {
        let Some(seconds) = row.duration_seconds else {
            total_ingresos -= 1;
            continue;
        };

        total_segundos += seconds;

        let slot = *index.entry(row.employee_id.clone()).or_insert_with(|| {
            summaries.push(EmployeeSummary {
                employee_id: row.employee_id.clone(),
                name: row.name.clone(),
                total_segundos: 0,
                total_ingresos: 0,
                total_excedidos: 0,
                promedio_segundos: 0.0,
                tiempo_total: 0,
            });
            summaries.len() - 1
        });
        let summary = &mut summaries[slot];
        summary.total_segundos += seconds;
        summary.total_ingresos += 1;

        if seconds > max_dwell_seconds {
            total_excedidos += 1;
            summary.total_excedidos += 1;
        }

        histograma.record(seconds);

        match row.entry_at {
            Some(entry) => {
                let day = entry.weekday().num_days_from_sunday() as u8;
                let hour = entry.hour() as u8;
                *heatmap.entry(day).or_default().entry(hour).or_insert(0) += 1;
            }
            None => skipped_heatmap_rows += 1,
        }
    }

    for summary in &mut summaries {
        summary.promedio_segundos = if summary.total_ingresos > 0 {
            summary.total_segundos as f64 / summary.total_ingresos as f64
        } else {
            0.0
        };
        summary.tiempo_total = summary.total_segundos;
    }

    // Stable sort keeps first-appearance order among equal exceeded counts.
    summaries.sort_by(|a, b| b.total_excedidos.cmp(&a.total_excedidos));

    let mut cumulative = 0u64;
    let pareto = summaries
        .iter()
        .map(|s| {
            cumulative += s.total_excedidos;
            let cumulative_percent = if total_excedidos > 0 {
                cumulative as f64 / total_excedidos as f64 * 100.0
            } else {
                0.0
            };
            ParetoEntry {
                name: s.name.clone(),
                excedidos: s.total_excedidos,
                cumulative_percent,
            }
        })
        .collect();

    let excedidos_trabajador = summaries
        .iter()
        .map(|s| (s.employee_id.clone(), s.total_excedidos))
        .collect();

    let kpis = Kpis {
        tiempo_promedio_general: if total_ingresos > 0 {
            total_segundos as f64 / total_ingresos as f64
        } else {
            0.0
        },
        total_ingresos,
        total_excedidos,
        cumplimiento_seguridad: if total_ingresos > 0 {
            (total_ingresos - total_excedidos) as f64 / total_ingresos as f64 * 100.0
        } else {
            100.0
        },
        tasa_excedidos: if total_ingresos > 0 {
            total_excedidos as f64 / total_ingresos as f64 * 100.0
        } else {
            0.0
        },
    };

    AnalyticsReport {
        kpis,
        resumen_trabajador: summaries,
        excedidos_trabajador,
        graficos: Charts {
            histograma,
            heatmap,
            pareto,
        },
        skipped_heatmap_rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    const THRESHOLD: i64 = 3600;

    fn event(emp: &str, duration: Option<i64>) -> ClosedEvent {
        ClosedEvent {
            employee_id: emp.to_string(),
            name: format!("Employee {emp}"),
            // 2024-07-03 is a Wednesday; 14:30 UTC.
            entry_at: Some(Utc.with_ymd_and_hms(2024, 7, 3, 14, 30, 0).unwrap()),
            duration_seconds: duration,
        }
    }

    #[test]
    fn empty_input_yields_zero_defaults() {
        let report = aggregate(&[], THRESHOLD);

        assert_eq!(report.kpis.total_ingresos, 0);
        assert_eq!(report.kpis.total_excedidos, 0);
        assert_eq!(report.kpis.tiempo_promedio_general, 0.0);
        assert_eq!(report.kpis.cumplimiento_seguridad, 100.0);
        assert_eq!(report.kpis.tasa_excedidos, 0.0);
        assert!(report.resumen_trabajador.is_empty());
        assert!(report.excedidos_trabajador.is_empty());
        assert_eq!(report.graficos.histograma, Histogram::default());
        assert!(report.graficos.heatmap.is_empty());
        assert!(report.graficos.pareto.is_empty());
    }

    #[test]
    fn three_row_scenario() {
        let rows = [
            event("1", Some(500)),
            event("1", Some(4000)),
            event("2", Some(1000)),
        ];
        let report = aggregate(&rows, THRESHOLD);

        assert_eq!(report.kpis.total_ingresos, 3);
        assert_eq!(report.kpis.total_excedidos, 1);
        assert_eq!(report.kpis.tiempo_promedio_general, 5500.0 / 3.0);

        let histograma = report.graficos.histograma;
        assert_eq!(histograma.up_to_15m, 1); // 500s
        assert_eq!(histograma.up_to_30m, 1); // 1000s
        assert_eq!(histograma.up_to_45m, 0);
        assert_eq!(histograma.up_to_60m, 0);
        assert_eq!(histograma.over_60m, 1); // 4000s

        // Employee 1 leads the Pareto order with the only exceeded entry.
        let first = &report.resumen_trabajador[0];
        assert_eq!(first.employee_id, "1");
        assert_eq!(first.total_ingresos, 2);
        assert_eq!(first.total_excedidos, 1);
        assert_eq!(first.total_segundos, 4500);
        assert_eq!(first.tiempo_total, 4500);
        assert_eq!(first.promedio_segundos, 2250.0);

        assert_eq!(report.excedidos_trabajador.get("1"), Some(&1));
        assert_eq!(report.excedidos_trabajador.get("2"), Some(&0));
    }

    #[test]
    fn null_duration_rows_vanish_without_error() {
        let rows = [event("1", Some(100)), event("2", None)];
        let report = aggregate(&rows, THRESHOLD);

        assert_eq!(report.kpis.total_ingresos, 1);
        assert_eq!(report.graficos.histograma.total(), 1);
        assert_eq!(report.resumen_trabajador.len(), 1);
        assert_eq!(report.resumen_trabajador[0].employee_id, "1");
        // The null row never reached the heatmap, and was not "skipped":
        // it was excluded from all aggregates up front.
        assert_eq!(report.skipped_heatmap_rows, 0);
    }

    #[test]
    fn counts_are_conserved() {
        let rows = [
            event("a", Some(100)),
            event("a", Some(5000)),
            event("b", None),
            event("b", Some(2000)),
            event("c", Some(7200)),
        ];
        let report = aggregate(&rows, THRESHOLD);
        let nulls = rows.iter().filter(|r| r.duration_seconds.is_none()).count() as u64;

        assert_eq!(report.kpis.total_ingresos + nulls, rows.len() as u64);
        assert_eq!(report.graficos.histograma.total(), report.kpis.total_ingresos);

        let per_employee_ingresos: u64 = report
            .resumen_trabajador
            .iter()
            .map(|s| s.total_ingresos)
            .sum();
        let per_employee_excedidos: u64 = report
            .resumen_trabajador
            .iter()
            .map(|s| s.total_excedidos)
            .sum();
        assert_eq!(per_employee_ingresos, report.kpis.total_ingresos);
        assert_eq!(per_employee_excedidos, report.kpis.total_excedidos);
    }

    #[test]
    fn threshold_comparison_is_strict() {
        let rows = [event("1", Some(3600)), event("2", Some(3601))];
        let report = aggregate(&rows, THRESHOLD);

        assert_eq!(report.kpis.total_excedidos, 1);
        assert_eq!(report.excedidos_trabajador.get("1"), Some(&0));
        assert_eq!(report.excedidos_trabajador.get("2"), Some(&1));
    }

    #[test]
    fn bucket_upper_bounds_are_inclusive() {
        let rows = [
            event("1", Some(900)),
            event("1", Some(901)),
            event("1", Some(1800)),
            event("1", Some(2700)),
            event("1", Some(3600)),
            event("1", Some(3601)),
        ];
        let histograma = aggregate(&rows, THRESHOLD).graficos.histograma;

        assert_eq!(
            histograma,
            Histogram {
                up_to_15m: 1,
                up_to_30m: 2,
                up_to_45m: 1,
                up_to_60m: 1,
                over_60m: 1,
            }
        );
    }

    #[test]
    fn pareto_is_monotone_and_reaches_100() {
        let mut rows = Vec::new();
        // a: 3 exceeded, b: 1 exceeded, c: none.
        for _ in 0..3 {
            rows.push(event("a", Some(4000)));
        }
        rows.push(event("b", Some(5000)));
        rows.push(event("c", Some(100)));
        let report = aggregate(&rows, THRESHOLD);

        let pareto = &report.graficos.pareto;
        assert_eq!(pareto.len(), 3);
        assert_eq!(pareto[0].excedidos, 3);
        assert_eq!(pareto[0].cumulative_percent, 75.0);
        assert_eq!(pareto[1].cumulative_percent, 100.0);
        assert_eq!(pareto[2].cumulative_percent, 100.0);
        for pair in pareto.windows(2) {
            assert!(pair[0].cumulative_percent <= pair[1].cumulative_percent);
            assert!(pair[0].excedidos >= pair[1].excedidos);
        }
        assert!((pareto.last().unwrap().cumulative_percent - 100.0).abs() < 1e-9);
    }

    #[test]
    fn pareto_without_exceeded_entries_stays_at_zero() {
        let rows = [event("a", Some(100)), event("b", Some(200))];
        let report = aggregate(&rows, THRESHOLD);

        for entry in &report.graficos.pareto {
            assert_eq!(entry.cumulative_percent, 0.0);
        }
    }

    #[test]
    fn equal_exceeded_counts_keep_first_appearance_order() {
        let rows = [
            event("z", Some(4000)),
            event("m", Some(4000)),
            event("a", Some(4000)),
        ];
        let report = aggregate(&rows, THRESHOLD);

        let order: Vec<&str> = report
            .resumen_trabajador
            .iter()
            .map(|s| s.employee_id.as_str())
            .collect();
        assert_eq!(order, vec!["z", "m", "a"]);
    }

    #[test]
    fn heatmap_buckets_by_utc_day_and_hour() {
        let rows = [event("1", Some(100)), event("1", Some(200))];
        let report = aggregate(&rows, THRESHOLD);

        // Wednesday = 3 with Sunday as 0; entry hour 14.
        assert_eq!(report.graficos.heatmap[&3][&14], 2);
        assert_eq!(report.graficos.heatmap.len(), 1);
    }

    #[test]
    fn unreadable_entry_timestamp_only_skips_the_heatmap() {
        let mut row = event("1", Some(4000));
        row.entry_at = None;
        let report = aggregate(&[row], THRESHOLD);

        assert_eq!(report.skipped_heatmap_rows, 1);
        assert!(report.graficos.heatmap.is_empty());
        // Every other aggregate still counted the row.
        assert_eq!(report.kpis.total_ingresos, 1);
        assert_eq!(report.kpis.total_excedidos, 1);
        assert_eq!(report.graficos.histograma.over_60m, 1);
    }

    #[test]
    fn report_serializes_with_wire_field_names() {
        let rows = [event("1", Some(500)), event("1", Some(4000))];
        let report = aggregate(&rows, THRESHOLD);
        let json = serde_json::to_value(&report).unwrap();

        assert!(json["kpis"]["tiempo_promedio_general"].is_number());
        assert_eq!(json["kpis"]["total_ingresos"], 2);
        assert_eq!(json["graficos"]["histograma"]["0-15m"], 1);
        assert_eq!(json["graficos"]["histograma"][">60m"], 1);
        assert_eq!(json["graficos"]["heatmap"]["3"]["14"], 2);
        assert_eq!(json["excedidos_trabajador"]["1"], 1);
        assert_eq!(json["resumen_trabajador"][0]["tiempo_total"], 4500);
        // The skip counter is internal, not part of the wire format.
        assert!(json.get("skipped_heatmap_rows").is_none());
    }
}
