//! Geographic point overlays

use ct_data::{DataError, TabularDataset};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::utils::place_label;
use crate::DeriveError;

/// Marker sizing: `radius = sqrt(magnitude) / divisor + offset`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkerScale {
    pub divisor: f64,
    pub offset: f64,
}

impl MarkerScale {
    /// Scale used for the confirmed-cases overlay
    pub const CONFIRMED: MarkerScale = MarkerScale { divisor: 10.0, offset: 0.0 };

    /// Scale used for the deaths overlay
    pub const DEATHS: MarkerScale = MarkerScale { divisor: 10.0, offset: 2.0 };

    /// Scale used for the recovered overlay
    pub const RECOVERED: MarkerScale = MarkerScale { divisor: 10.0, offset: 2.0 };

    pub fn radius(&self, magnitude: f64) -> f64 {
        // A zero divisor would give infinite markers
        let divisor = if self.divisor > 0.0 { self.divisor } else { 1.0 };
        magnitude.sqrt() / divisor + self.offset
    }
}

impl Default for MarkerScale {
    fn default() -> Self {
        Self::CONFIRMED
    }
}

/// Which columns feed a point overlay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointSpec {
    pub label_column: String,
    pub sub_region_column: Option<String>,
    pub longitude_column: String,
    pub latitude_column: String,
    pub metric_column: String,
    pub scale: MarkerScale,
}

impl PointSpec {
    /// Overlay over the flattened locations feed
    pub fn locations(metric_column: impl Into<String>, scale: MarkerScale) -> Self {
        Self {
            label_column: "country".to_string(),
            sub_region_column: Some("province".to_string()),
            longitude_column: "coordinates.longitude".to_string(),
            latitude_column: "coordinates.latitude".to_string(),
            metric_column: metric_column.into(),
            scale,
        }
    }
}

/// Rows left out of a point series
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SkipCounts {
    /// Null or zero metric
    pub zero_metric: usize,
    /// Missing or out-of-range coordinates, negative metric, missing label
    pub invalid: usize,
}

impl SkipCounts {
    pub fn total(&self) -> usize {
        self.zero_metric + self.invalid
    }
}

/// One scatter-map trace
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PointSeries {
    pub name: String,
    pub longitude: Vec<f64>,
    pub latitude: Vec<f64>,
    pub labels: Vec<String>,
    pub magnitudes: Vec<f64>,
    pub radii: Vec<f64>,
    pub skipped: SkipCounts,
}

impl PointSeries {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

enum RowOutcome {
    Point {
        longitude: f64,
        latitude: f64,
        label: String,
        magnitude: f64,
    },
    ZeroMetric,
    Invalid,
}

/// Build one marker per qualifying row.
///
/// Missing columns fail the whole series. Individual bad rows are skipped
/// and counted instead.
pub fn point_series(dataset: &TabularDataset, spec: &PointSpec) -> Result<PointSeries, DeriveError> {
    let mut required = vec![
        spec.label_column.as_str(),
        spec.longitude_column.as_str(),
        spec.latitude_column.as_str(),
        spec.metric_column.as_str(),
    ];
    if let Some(sub) = &spec.sub_region_column {
        required.push(sub.as_str());
    }
    for column in required {
        if !dataset.has_column(column) {
            return Err(DataError::ColumnNotFound(column.to_string()).into());
        }
    }

    let mut series = PointSeries {
        name: spec.metric_column.clone(),
        ..Default::default()
    };

    for row in 0..dataset.row_count() {
        match classify_row(dataset, spec, row)? {
            RowOutcome::Point {
                longitude,
                latitude,
                label,
                magnitude,
            } => {
                series.longitude.push(longitude);
                series.latitude.push(latitude);
                series.labels.push(label);
                series.magnitudes.push(magnitude);
                series.radii.push(spec.scale.radius(magnitude));
            }
            RowOutcome::ZeroMetric => series.skipped.zero_metric += 1,
            RowOutcome::Invalid => series.skipped.invalid += 1,
        }
    }

    debug!(
        "Point series '{}': {} points, {} zero-metric rows, {} invalid rows",
        series.name,
        series.len(),
        series.skipped.zero_metric,
        series.skipped.invalid
    );
    Ok(series)
}

fn classify_row(dataset: &TabularDataset, spec: &PointSpec, row: usize) -> Result<RowOutcome, DataError> {
    // Unparseable cells are row-level problems, not series-level ones
    let number = |column: &str| match dataset.numeric(column, row) {
        Ok(value) => Ok(value),
        Err(DataError::TypeMismatch { .. }) => Ok(None),
        Err(e) => Err(e),
    };

    let magnitude = match dataset.numeric(&spec.metric_column, row) {
        Ok(Some(m)) if m.is_finite() => m,
        Ok(None) => return Ok(RowOutcome::ZeroMetric),
        Ok(Some(_)) | Err(DataError::TypeMismatch { .. }) => return Ok(RowOutcome::Invalid),
        Err(e) => return Err(e),
    };
    if magnitude == 0.0 {
        return Ok(RowOutcome::ZeroMetric);
    }
    if magnitude < 0.0 {
        return Ok(RowOutcome::Invalid);
    }

    let (longitude, latitude) = match (number(&spec.longitude_column)?, number(&spec.latitude_column)?) {
        (Some(lon), Some(lat)) if valid_coordinates(lon, lat) => (lon, lat),
        _ => return Ok(RowOutcome::Invalid),
    };

    let place = match dataset.text(&spec.label_column, row)? {
        Some(place) if !place.trim().is_empty() => place,
        _ => return Ok(RowOutcome::Invalid),
    };
    let sub_region = match &spec.sub_region_column {
        Some(column) => dataset.text(column, row)?,
        None => None,
    };

    Ok(RowOutcome::Point {
        longitude,
        latitude,
        label: place_label(&place, sub_region.as_deref()),
        magnitude,
    })
}

fn valid_coordinates(longitude: f64, latitude: f64) -> bool {
    (-180.0..=180.0).contains(&longitude) && (-90.0..=90.0).contains(&latitude)
}
