//! Decoding and endpoint configuration

use chrono::NaiveDate;
use ct_core::SourceFormat;
use serde::{Deserialize, Serialize};

use super::null_handling::NullConfig;

/// Default datapackage manifest listing the aggregated series
pub const DEFAULT_MANIFEST_URL: &str = "https://datahub.io/core/covid-19/datapackage.json";

/// Default per-location feed with coordinates and latest counts
pub const DEFAULT_LOCATIONS_URL: &str = "https://coronavirus-tracker-api.herokuapp.com/v2/locations";

/// How fetched bodies are decoded into datasets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Null handling for CSV cells
    pub null_config: NullConfig,

    /// Rows sampled when inferring CSV column types
    pub sample_size: usize,

    /// Accepted date layouts (chrono format strings), tried in order
    pub date_formats: Vec<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            null_config: NullConfig::default(),
            sample_size: 5000,
            date_formats: vec!["%Y-%m-%d".to_string(), "%Y/%m/%d".to_string()],
        }
    }
}

impl SourceConfig {
    /// Parse a date using the configured layouts, first match wins
    pub fn parse_date(&self, value: &str) -> Option<NaiveDate> {
        parse_date_with(&self.date_formats, value)
    }
}

/// Parse a date with the first of `formats` that accepts it
pub fn parse_date_with(formats: &[String], value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

/// Where the upstream data lives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Manifest describing the named datasets
    pub manifest_url: String,

    /// Catalog name of the daily per-country series
    pub countries_resource: String,

    /// Catalog name of the daily worldwide series
    pub worldwide_resource: String,

    /// Catalog name of the combined per-country series, fetched only when set
    pub combined_resource: Option<String>,

    /// Locations feed URL
    pub locations_url: String,

    /// Key of the record array inside the locations response
    pub locations_record_path: Option<String>,

    /// Format of the locations feed when its URL carries no hint
    pub locations_format: Option<SourceFormat>,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            manifest_url: DEFAULT_MANIFEST_URL.to_string(),
            countries_resource: "countries-aggregated".to_string(),
            worldwide_resource: "worldwide-aggregated".to_string(),
            combined_resource: None,
            locations_url: DEFAULT_LOCATIONS_URL.to_string(),
            locations_record_path: Some("locations".to_string()),
            locations_format: Some(SourceFormat::Json),
        }
    }
}
