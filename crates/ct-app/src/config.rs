//! Dashboard configuration

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use ct_data::{EndpointConfig, SourceConfig};
use ct_views::{AggregatedColumns, LocationColumns, MarkerScale, Metric, TableConfig};
use serde::{Deserialize, Serialize};

/// Everything a page build needs besides the data itself.
///
/// Every field has a default, so a config file only lists what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub title: String,
    pub endpoints: EndpointConfig,
    pub source: SourceConfig,
    /// Per-request timeout, e.g. "30s" or "1m 30s"
    pub request_timeout: String,
    pub columns: AggregatedColumns,
    pub location_columns: LocationColumns,
    /// Countries drawn on the trajectory and day-zero panels
    pub comparison_countries: Vec<String>,
    pub day_zero: DayZeroConfig,
    pub ranking: RankingConfig,
    pub table: TableConfig,
    pub markers: MarkerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DayZeroConfig {
    pub threshold: f64,
    pub metric: Metric,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    pub min_cases: f64,
    pub min_deaths: f64,
    pub max_rows: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    pub confirmed: MarkerScale,
    pub deaths: MarkerScale,
    pub recovered: MarkerScale,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            title: "Covid-19 tracker".to_string(),
            endpoints: EndpointConfig::default(),
            source: SourceConfig::default(),
            request_timeout: "30s".to_string(),
            columns: AggregatedColumns::default(),
            location_columns: LocationColumns::default(),
            comparison_countries: ["US", "Italy", "Spain", "Germany", "United Kingdom", "France"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            day_zero: DayZeroConfig::default(),
            ranking: RankingConfig::default(),
            table: TableConfig {
                max_rows_displayed: 999,
                sort_column: Some("Confirmed".to_string()),
                descending: true,
            },
            markers: MarkerConfig::default(),
        }
    }
}

impl Default for DayZeroConfig {
    fn default() -> Self {
        Self {
            threshold: 100.0,
            metric: Metric::Cases,
        }
    }
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            min_cases: 1000.0,
            min_deaths: 10.0,
            max_rows: Some(20),
        }
    }
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            confirmed: MarkerScale::CONFIRMED,
            deaths: MarkerScale::DEATHS,
            recovered: MarkerScale::RECOVERED,
        }
    }
}

impl DashboardConfig {
    /// Read a JSON config file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn request_timeout(&self) -> Result<Duration> {
        humantime::parse_duration(&self.request_timeout)
            .with_context(|| format!("invalid request_timeout '{}'", self.request_timeout))
    }
}
