//! Death-rate ranking for the horizontal bar chart

use ct_data::{DataError, TabularDataset};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::utils::{compress_label, percent_label};
use crate::DeriveError;

/// Category of the aggregate entry present in every ranking
pub const AVERAGE_LABEL: &str = "Average";

/// Grouping, filtering and trimming rules for a ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingSpec {
    pub label_column: String,
    pub cases_column: String,
    pub deaths_column: String,
    /// Locations need at least this many cases
    pub min_cases: f64,
    /// Locations need at least this many deaths
    pub min_deaths: f64,
    /// Cap on the number of bars, the Average included
    pub max_rows: Option<usize>,
}

impl RankingSpec {
    /// Ranking over the flattened locations feed
    pub fn locations() -> Self {
        Self {
            label_column: "country".to_string(),
            cases_column: "latest.confirmed".to_string(),
            deaths_column: "latest.deaths".to_string(),
            min_cases: 0.0,
            min_deaths: 0.0,
            max_rows: None,
        }
    }

    pub fn with_thresholds(mut self, min_cases: f64, min_deaths: f64) -> Self {
        self.min_cases = min_cases;
        self.min_deaths = min_deaths;
        self
    }

    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = Some(max_rows);
        self
    }
}

/// Non-fatal observations made while ranking
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RankingDiagnostic {
    /// The Average fell below the cap and displaced the lowest surviving entry
    AverageOmitted { evicted: String },
    /// Rows dropped for a missing label or unreadable counts
    InvalidRows { count: usize },
}

/// Bars sorted ascending by rate
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RankedSeries {
    pub categories: Vec<String>,
    pub rates: Vec<f64>,
    pub display_labels: Vec<String>,
    pub diagnostics: Vec<RankingDiagnostic>,
}

impl RankedSeries {
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Rate of the Average entry
    pub fn average(&self) -> Option<f64> {
        self.categories
            .iter()
            .position(|c| c == AVERAGE_LABEL)
            .map(|i| self.rates[i])
    }
}

#[derive(Default)]
struct Totals {
    cases: f64,
    deaths: f64,
}

fn death_rate(deaths: f64, cases: f64) -> f64 {
    (deaths / cases.max(1.0)).clamp(0.0, 1.0)
}

/// Rank locations by death rate with a guaranteed Average bar.
///
/// Rows sharing a label are summed first. The Average covers every location
/// that passed the thresholds, not only those left after trimming.
pub fn rank_death_rates(dataset: &TabularDataset, spec: &RankingSpec) -> Result<RankedSeries, DeriveError> {
    for column in [&spec.label_column, &spec.cases_column, &spec.deaths_column] {
        if !dataset.has_column(column) {
            return Err(DataError::ColumnNotFound(column.clone()).into());
        }
    }

    // Group by location
    let mut groups: IndexMap<String, Totals> = IndexMap::new();
    let mut invalid = 0;
    for row in 0..dataset.row_count() {
        let label = match dataset.text(&spec.label_column, row)? {
            Some(label) if !label.trim().is_empty() => label,
            _ => {
                invalid += 1;
                continue;
            }
        };
        let cases = read_count(dataset, &spec.cases_column, row)?;
        let deaths = read_count(dataset, &spec.deaths_column, row)?;
        let (cases, deaths) = match (cases, deaths) {
            (Some(c), Some(d)) => (c, d),
            _ => {
                invalid += 1;
                continue;
            }
        };
        let totals = groups.entry(label).or_default();
        totals.cases += cases;
        totals.deaths += deaths;
    }

    let passing: Vec<(String, Totals)> = groups
        .into_iter()
        .filter(|(_, t)| t.cases >= spec.min_cases && t.deaths >= spec.min_deaths)
        .collect();
    if passing.is_empty() {
        return Err(DataError::EmptyDataset(format!(
            "no location has at least {} cases and {} deaths",
            spec.min_cases, spec.min_deaths
        ))
        .into());
    }

    let total_cases: f64 = passing.iter().map(|(_, t)| t.cases).sum();
    let total_deaths: f64 = passing.iter().map(|(_, t)| t.deaths).sum();

    let mut entries: Vec<(String, f64)> = passing
        .into_iter()
        .map(|(label, t)| (label, death_rate(t.deaths, t.cases)))
        .collect();
    entries.push((AVERAGE_LABEL.to_string(), death_rate(total_deaths, total_cases)));

    // Stable: equal rates keep first-seen order, Average last among equals
    entries.sort_by(|a, b| a.1.total_cmp(&b.1));

    let mut diagnostics = Vec::new();
    if invalid > 0 {
        debug!("Ranking skipped {} invalid rows", invalid);
        diagnostics.push(RankingDiagnostic::InvalidRows { count: invalid });
    }

    if let Some(cap) = spec.max_rows {
        let cap = cap.max(1);
        if entries.len() > cap {
            let cut = entries.len() - cap;
            let average_dropped = entries[..cut].iter().any(|(label, _)| label == AVERAGE_LABEL);
            let mut kept = entries.split_off(cut);
            if average_dropped {
                let average = entries
                    .into_iter()
                    .find(|(label, _)| label == AVERAGE_LABEL);
                if let Some(average) = average {
                    let evicted = kept.remove(0).0;
                    warn!(
                        "Average rate is below the top {} entries; evicting '{}' to keep it",
                        cap, evicted
                    );
                    diagnostics.push(RankingDiagnostic::AverageOmitted { evicted });
                    kept.insert(0, average);
                }
            }
            entries = kept;
        }
    }

    let mut series = RankedSeries {
        diagnostics,
        ..Default::default()
    };
    for (label, rate) in entries {
        series.categories.push(compress_label(&label));
        series.display_labels.push(percent_label(rate));
        series.rates.push(rate);
    }

    debug!("Ranked {} locations plus the Average", series.len() - 1);
    Ok(series)
}

/// Null reads as zero; unparseable text marks the row invalid
fn read_count(dataset: &TabularDataset, column: &str, row: usize) -> Result<Option<f64>, DataError> {
    match dataset.numeric(column, row) {
        Ok(Some(v)) if v.is_finite() => Ok(Some(v)),
        Ok(Some(_)) => Ok(None),
        Ok(None) => Ok(Some(0.0)),
        Err(DataError::TypeMismatch { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}
