//! Series builders for the chart panels

// Geographic overlays
pub mod geo;

// Death-rate bar charts
pub mod bar;

// Case trajectories
pub mod line;

// Utilities
pub mod utils;

// Re-exports
pub use bar::{rank_death_rates, RankedSeries, RankingDiagnostic, RankingSpec, AVERAGE_LABEL};
pub use geo::{point_series, MarkerScale, PointSeries, PointSpec, SkipCounts};
pub use line::{
    align_to_day_zero, compare_from_day_zero, country_trajectory, worldwide_trajectory, xth_date,
    AggregatedColumns, DayZeroComparison, DayZeroSeries, Metric, TimeSeries,
};
pub use utils::compress_label;
