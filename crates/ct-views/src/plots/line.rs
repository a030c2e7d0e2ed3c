//! Cumulative case trajectories, by calendar date or from day zero

use std::fmt;

use chrono::NaiveDate;
use ct_core::Value;
use ct_data::config::parse_date_with;
use ct_data::{DataError, SourceConfig, TabularDataset};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::DeriveError;

/// Which cumulative count a trajectory follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Cases,
    Recoveries,
    Deaths,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Metric::Cases => "cases",
            Metric::Recoveries => "recoveries",
            Metric::Deaths => "deaths",
        };
        f.write_str(name)
    }
}

/// Column names of the aggregated time series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatedColumns {
    pub date: String,
    pub country: String,
    pub confirmed: String,
    pub recovered: String,
    pub deaths: String,
    /// Layouts tried when the date column holds text
    #[serde(skip)]
    pub date_formats: Vec<String>,
}

impl Default for AggregatedColumns {
    fn default() -> Self {
        Self {
            date: "Date".to_string(),
            country: "Country".to_string(),
            confirmed: "Confirmed".to_string(),
            recovered: "Recovered".to_string(),
            deaths: "Deaths".to_string(),
            date_formats: SourceConfig::default().date_formats,
        }
    }
}

impl AggregatedColumns {
    /// Column holding the given metric
    pub fn metric(&self, metric: Metric) -> &str {
        match metric {
            Metric::Cases => &self.confirmed,
            Metric::Recoveries => &self.recovered,
            Metric::Deaths => &self.deaths,
        }
    }

    /// Read text dates with the layouts the decoder was configured with
    pub fn with_date_formats(mut self, formats: Vec<String>) -> Self {
        self.date_formats = formats;
        self
    }
}

/// A named line trace
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries<X> {
    pub name: String,
    pub x: Vec<X>,
    pub y: Vec<f64>,
}

impl<X> TimeSeries<X> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            x: Vec::new(),
            y: Vec::new(),
        }
    }

    pub fn push(&mut self, x: X, y: f64) {
        self.x.push(x);
        self.y.push(y);
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// A country's trajectory counted in days since its threshold date
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayZeroSeries {
    pub day_zero: NaiveDate,
    pub series: TimeSeries<i64>,
}

/// Several countries aligned on their own day zero
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DayZeroComparison {
    pub threshold: f64,
    pub metric: Option<Metric>,
    pub series: Vec<DayZeroSeries>,
    /// Countries that never reached the threshold
    pub omitted: Vec<String>,
}

fn require_columns(dataset: &TabularDataset, columns: &[&str]) -> Result<(), DataError> {
    match columns.iter().find(|c| !dataset.has_column(c)) {
        Some(missing) => Err(DataError::ColumnNotFound(missing.to_string())),
        None => Ok(()),
    }
}

fn row_date(dataset: &TabularDataset, column: &str, row: usize, formats: &[String]) -> Result<NaiveDate, DataError> {
    match dataset.value(column, row)? {
        Value::Date(date) => Ok(date),
        Value::Str(s) => parse_date_with(formats, &s).ok_or_else(|| DataError::TypeMismatch {
            column: column.to_string(),
            row,
            expected: "date",
            found: format!("string '{}'", s),
        }),
        other => Err(DataError::TypeMismatch {
            column: column.to_string(),
            row,
            expected: "date",
            found: other.type_name().to_string(),
        }),
    }
}

/// Calendar trajectory of one metric for one country.
///
/// Null counts read as zero.
pub fn country_trajectory(
    dataset: &TabularDataset,
    columns: &AggregatedColumns,
    country: &str,
    metric: Metric,
) -> Result<TimeSeries<NaiveDate>, DeriveError> {
    let rows = dataset.filter(&columns.country, &Value::from(country))?;
    let mut series = calendar_series(&rows, columns, metric, country)?;
    series.name = country.to_string();
    Ok(series)
}

/// Calendar trajectory of one metric over the worldwide series
pub fn worldwide_trajectory(
    dataset: &TabularDataset,
    columns: &AggregatedColumns,
    metric: Metric,
) -> Result<TimeSeries<NaiveDate>, DeriveError> {
    Ok(calendar_series(dataset, columns, metric, &metric.to_string())?)
}

fn calendar_series(
    dataset: &TabularDataset,
    columns: &AggregatedColumns,
    metric: Metric,
    name: &str,
) -> Result<TimeSeries<NaiveDate>, DataError> {
    let value_column = columns.metric(metric);
    // Check both columns even when there are no rows
    require_columns(dataset, &[&columns.date, value_column])?;

    let mut series = TimeSeries::new(name);
    for row in 0..dataset.row_count() {
        let date = row_date(dataset, &columns.date, row, &columns.date_formats)?;
        let value = dataset.numeric(value_column, row)?.unwrap_or(0.0);
        series.push(date, value);
    }
    debug!("Trajectory '{}' has {} points", name, series.len());
    Ok(series)
}

/// Index of the first row of `rows` whose metric reaches `threshold`
fn first_reaching(
    rows: &TabularDataset,
    metric_column: &str,
    threshold: f64,
) -> Result<Option<usize>, DataError> {
    for row in 0..rows.row_count() {
        if rows.numeric(metric_column, row)?.unwrap_or(0.0) >= threshold {
            return Ok(Some(row));
        }
    }
    Ok(None)
}

/// First date on which `country`'s metric reached `threshold`, if ever
pub fn xth_date(
    dataset: &TabularDataset,
    columns: &AggregatedColumns,
    country: &str,
    threshold: f64,
    metric: Metric,
) -> Result<Option<NaiveDate>, DeriveError> {
    let rows = dataset.filter(&columns.country, &Value::from(country))?;
    require_columns(&rows, &[&columns.date, columns.metric(metric)])?;
    match first_reaching(&rows, columns.metric(metric), threshold)? {
        Some(row) => Ok(Some(row_date(&rows, &columns.date, row, &columns.date_formats)?)),
        None => Ok(None),
    }
}

/// Trajectory of `country` from the day it reached `threshold`.
///
/// Offsets count rows from the threshold row, starting at 0.
pub fn align_to_day_zero(
    dataset: &TabularDataset,
    columns: &AggregatedColumns,
    country: &str,
    threshold: f64,
    metric: Metric,
) -> Result<DayZeroSeries, DeriveError> {
    let rows = dataset.filter(&columns.country, &Value::from(country))?;
    let value_column = columns.metric(metric);
    // A country with no rows still needs both columns
    require_columns(&rows, &[&columns.date, value_column])?;

    let start = first_reaching(&rows, value_column, threshold)?.ok_or_else(|| {
        DeriveError::ThresholdNotReached {
            country: country.to_string(),
            threshold,
            metric,
        }
    })?;
    let day_zero = row_date(&rows, &columns.date, start, &columns.date_formats)?;

    let mut series = TimeSeries::new(country);
    for (offset, row) in (start..rows.row_count()).enumerate() {
        let value = rows.numeric(value_column, row)?.unwrap_or(0.0);
        series.push(offset as i64, value);
    }

    Ok(DayZeroSeries { day_zero, series })
}

/// Align every listed country on its own day zero.
///
/// Countries that never reach the threshold are listed in `omitted`
/// instead of failing the comparison.
pub fn compare_from_day_zero(
    dataset: &TabularDataset,
    columns: &AggregatedColumns,
    countries: &[String],
    threshold: f64,
    metric: Metric,
) -> Result<DayZeroComparison, DeriveError> {
    let mut comparison = DayZeroComparison {
        threshold,
        metric: Some(metric),
        ..Default::default()
    };

    for country in countries {
        match align_to_day_zero(dataset, columns, country, threshold, metric) {
            Ok(aligned) => comparison.series.push(aligned),
            Err(DeriveError::ThresholdNotReached { .. }) => {
                warn!("{} never reached {} {}; leaving it out", country, threshold, metric);
                comparison.omitted.push(country.clone());
            }
            Err(e) => return Err(e),
        }
    }

    Ok(comparison)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 3, day).unwrap()
    }

    fn aggregated() -> TabularDataset {
        let mut rows = Vec::new();
        for (i, confirmed) in [10, 50, 120, 300].into_iter().enumerate() {
            let day = date(i as u32 + 1);
            rows.push(vec![
                Value::Date(day),
                "Italy".into(),
                Value::Int(confirmed),
                Value::Int(0),
                Value::Int(confirmed / 10),
            ]);
            rows.push(vec![
                Value::Date(day),
                "Japan".into(),
                Value::Int(i as i64),
                Value::Null,
                Value::Int(0),
            ]);
        }
        TabularDataset::from_rows(&["Date", "Country", "Confirmed", "Recovered", "Deaths"], rows).unwrap()
    }

    #[test]
    fn test_xth_date() {
        let cols = AggregatedColumns::default();
        let ds = aggregated();

        assert_eq!(xth_date(&ds, &cols, "Italy", 100.0, Metric::Cases).unwrap(), Some(date(3)));
        assert_eq!(xth_date(&ds, &cols, "Italy", 10.0, Metric::Cases).unwrap(), Some(date(1)));
        assert_eq!(xth_date(&ds, &cols, "Italy", 5.0, Metric::Deaths).unwrap(), Some(date(2)));
        assert_eq!(xth_date(&ds, &cols, "Japan", 100.0, Metric::Cases).unwrap(), None);
        assert_eq!(xth_date(&ds, &cols, "Narnia", 1.0, Metric::Cases).unwrap(), None);
    }

    #[test]
    fn test_align_to_day_zero() {
        let aligned = align_to_day_zero(&aggregated(), &AggregatedColumns::default(), "Italy", 100.0, Metric::Cases).unwrap();

        assert_eq!(aligned.day_zero, date(3));
        assert_eq!(aligned.series.x, vec![0, 1]);
        assert_eq!(aligned.series.y, vec![120.0, 300.0]);
    }

    #[test]
    fn test_threshold_not_reached() {
        let result = align_to_day_zero(&aggregated(), &AggregatedColumns::default(), "Japan", 100.0, Metric::Cases);
        match result {
            Err(DeriveError::ThresholdNotReached { country, metric, .. }) => {
                assert_eq!(country, "Japan");
                assert_eq!(metric, Metric::Cases);
            }
            other => panic!("expected ThresholdNotReached, got {:?}", other),
        }
    }

    #[test]
    fn test_comparison_omits_countries_below_threshold() {
        let countries = vec!["Italy".to_string(), "Japan".to_string()];
        let comparison =
            compare_from_day_zero(&aggregated(), &AggregatedColumns::default(), &countries, 100.0, Metric::Cases).unwrap();

        assert_eq!(comparison.series.len(), 1);
        assert_eq!(comparison.series[0].series.name, "Italy");
        assert_eq!(comparison.omitted, vec!["Japan".to_string()]);
    }

    #[test]
    fn test_country_trajectory_treats_null_as_zero() {
        let cols = AggregatedColumns::default();
        let japan = country_trajectory(&aggregated(), &cols, "Japan", Metric::Recoveries).unwrap();

        assert_eq!(japan.name, "Japan");
        assert_eq!(japan.x, vec![date(1), date(2), date(3), date(4)]);
        assert_eq!(japan.y, vec![0.0; 4]);
    }

    #[test]
    fn test_worldwide_trajectory() {
        let worldwide = TabularDataset::from_rows(
            &["Date", "Confirmed", "Recovered", "Deaths"],
            vec![
                vec!["2020-01-22".into(), 555.into(), 28.into(), 17.into()],
                vec!["2020-01-23".into(), 654.into(), 30.into(), 18.into()],
            ],
        )
        .unwrap();
        let deaths = worldwide_trajectory(&worldwide, &AggregatedColumns::default(), Metric::Deaths).unwrap();

        assert_eq!(deaths.name, "deaths");
        assert_eq!(
            deaths.x,
            vec![
                NaiveDate::from_ymd_opt(2020, 1, 22).unwrap(),
                NaiveDate::from_ymd_opt(2020, 1, 23).unwrap()
            ]
        );
        assert_eq!(deaths.y, vec![17.0, 18.0]);
    }

    #[test]
    fn test_missing_metric_column() {
        let ds = aggregated().select_columns(&["Date", "Country", "Confirmed"]).unwrap();
        assert!(matches!(
            country_trajectory(&ds, &AggregatedColumns::default(), "Italy", Metric::Deaths),
            Err(DeriveError::Data(DataError::ColumnNotFound(c))) if c == "Deaths"
        ));
    }

    #[test]
    fn test_missing_metric_column_for_unknown_country() {
        let ds = aggregated().select_columns(&["Date", "Country", "Confirmed"]).unwrap();
        let cols = AggregatedColumns::default();

        assert!(matches!(
            align_to_day_zero(&ds, &cols, "Narnia", 1.0, Metric::Deaths),
            Err(DeriveError::Data(DataError::ColumnNotFound(c))) if c == "Deaths"
        ));
        assert!(matches!(
            xth_date(&ds, &cols, "Narnia", 1.0, Metric::Deaths),
            Err(DeriveError::Data(DataError::ColumnNotFound(c))) if c == "Deaths"
        ));
        assert!(matches!(
            compare_from_day_zero(&ds, &cols, &["Narnia".to_string()], 1.0, Metric::Deaths),
            Err(DeriveError::Data(DataError::ColumnNotFound(c))) if c == "Deaths"
        ));

        let no_dates = aggregated().select_columns(&["Country", "Confirmed"]).unwrap();
        assert!(matches!(
            xth_date(&no_dates, &cols, "Narnia", 1.0, Metric::Cases),
            Err(DeriveError::Data(DataError::ColumnNotFound(c))) if c == "Date"
        ));
    }

    #[test]
    fn test_text_dates_follow_configured_layouts() {
        let worldwide = |dates: [&str; 2]| {
            TabularDataset::from_rows(
                &["Date", "Confirmed", "Recovered", "Deaths"],
                vec![
                    vec![dates[0].into(), 555.into(), 28.into(), 17.into()],
                    vec![dates[1].into(), 654.into(), 30.into(), 18.into()],
                ],
            )
            .unwrap()
        };
        let expected = vec![
            NaiveDate::from_ymd_opt(2020, 1, 22).unwrap(),
            NaiveDate::from_ymd_opt(2020, 1, 23).unwrap(),
        ];

        let slashed = worldwide(["2020/01/22", "2020/01/23"]);
        let cases = worldwide_trajectory(&slashed, &AggregatedColumns::default(), Metric::Cases).unwrap();
        assert_eq!(cases.x, expected);

        // Only ISO dates are accepted once the slash layout is dropped
        let iso_only = AggregatedColumns::default().with_date_formats(vec!["%Y-%m-%d".to_string()]);
        assert!(matches!(
            worldwide_trajectory(&slashed, &iso_only, Metric::Cases),
            Err(DeriveError::Data(DataError::TypeMismatch { row: 0, .. }))
        ));

        let dotted = AggregatedColumns::default().with_date_formats(vec!["%d.%m.%Y".to_string()]);
        let deaths = worldwide_trajectory(&worldwide(["22.01.2020", "23.01.2020"]), &dotted, Metric::Deaths).unwrap();
        assert_eq!(deaths.x, expected);
        assert_eq!(deaths.y, vec![17.0, 18.0]);
    }
}
