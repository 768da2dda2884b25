//! Access-control check-in/check-out history and analytics API.
//!
//! Two stateless endpoints over the `historico` event table: a filtered,
//! paginated record listing (with an unpaginated export mode) and an
//! analytics view that fetches all matching closed events and reduces them
//! in memory to KPIs, per-employee summaries, a duration histogram, a
//! day/hour heatmap, and a Pareto ranking.

pub mod config;
pub mod db;
pub mod error;
pub mod history;
pub mod server;
