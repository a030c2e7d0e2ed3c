//! Derivation pipeline for the dashboard panels
//!
//! Every function here is pure: it reads already-fetched datasets and
//! returns the exact series a chart or table panel consumes.

pub mod plots;
mod snapshot;
mod stats;
mod tables;

pub use plots::{
    align_to_day_zero, compare_from_day_zero, compress_label, country_trajectory, point_series,
    rank_death_rates, worldwide_trajectory, xth_date, AggregatedColumns, DayZeroComparison,
    DayZeroSeries, MarkerScale, Metric, PointSeries, PointSpec, RankedSeries, RankingDiagnostic,
    RankingSpec, SkipCounts, TimeSeries, AVERAGE_LABEL,
};
pub use snapshot::{latest_date, latest_snapshot};
pub use stats::{country_summaries, CountrySummary, LocationColumns};
pub use tables::{sorted_table_model, table_model, TableConfig, TableModel};

use ct_data::DataError;
use serde::Serialize;
use thiserror::Error;

/// Errors raised while deriving chart series
#[derive(Error, Debug)]
pub enum DeriveError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error("{country} never reached {threshold} {metric}")]
    ThresholdNotReached {
        country: String,
        threshold: f64,
        metric: Metric,
    },
}

/// Any series a panel can render
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum DerivedSeries {
    Points(PointSeries),
    Ranked(RankedSeries),
    Dated(Vec<TimeSeries<chrono::NaiveDate>>),
    DayZero(DayZeroComparison),
    Table(TableModel),
    Countries(Vec<CountrySummary>),
}
