//! Per-country summaries from the locations feed

use ct_data::{DataError, TabularDataset};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Column names of the flattened locations feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationColumns {
    pub country: String,
    pub province: String,
    pub population: String,
    pub latitude: String,
    pub longitude: String,
    pub confirmed: String,
    pub deaths: String,
    pub recovered: String,
}

impl Default for LocationColumns {
    fn default() -> Self {
        Self {
            country: "country".to_string(),
            province: "province".to_string(),
            population: "country_population".to_string(),
            latitude: "coordinates.latitude".to_string(),
            longitude: "coordinates.longitude".to_string(),
            confirmed: "latest.confirmed".to_string(),
            deaths: "latest.deaths".to_string(),
            recovered: "latest.recovered".to_string(),
        }
    }
}

/// One location's headline figures
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountrySummary {
    pub country: String,
    pub population: Option<u64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub confirmed: f64,
    pub deaths: f64,
    /// Deaths per 100k inhabitants, when the population is known
    pub deaths_per_100k: Option<f64>,
}

fn per_100k(count: f64, population: Option<u64>) -> Option<f64> {
    match population {
        Some(p) if p > 0 => Some(count / p as f64 * 100_000.0),
        _ => None,
    }
}

/// Summaries in feed order.
///
/// The population column is optional; rows without a country are skipped.
pub fn country_summaries(dataset: &TabularDataset, columns: &LocationColumns) -> Result<Vec<CountrySummary>, DataError> {
    for column in [&columns.country, &columns.latitude, &columns.longitude, &columns.confirmed, &columns.deaths] {
        if !dataset.has_column(column) {
            return Err(DataError::ColumnNotFound(column.clone()));
        }
    }
    let has_population = dataset.has_column(&columns.population);

    let mut summaries = Vec::with_capacity(dataset.row_count());
    for row in 0..dataset.row_count() {
        let country = match dataset.text(&columns.country, row)? {
            Some(c) if !c.trim().is_empty() => c,
            _ => continue,
        };
        let population = if has_population {
            dataset
                .numeric(&columns.population, row)?
                .filter(|p| *p >= 0.0)
                .map(|p| p as u64)
        } else {
            None
        };

        let deaths = dataset.numeric(&columns.deaths, row)?.unwrap_or(0.0);
        summaries.push(CountrySummary {
            country,
            population,
            latitude: dataset.numeric(&columns.latitude, row)?,
            longitude: dataset.numeric(&columns.longitude, row)?,
            confirmed: dataset.numeric(&columns.confirmed, row)?.unwrap_or(0.0),
            deaths,
            deaths_per_100k: per_100k(deaths, population),
        });
    }

    debug!("Built {} country summaries", summaries.len());
    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ct_core::Value;
    use pretty_assertions::assert_eq;

    fn locations() -> TabularDataset {
        TabularDataset::from_rows(
            &[
                "country",
                "country_population",
                "coordinates.latitude",
                "coordinates.longitude",
                "latest.confirmed",
                "latest.deaths",
            ],
            vec![
                vec!["Afghanistan".into(), 37_172_386.into(), "33.0".into(), "65.0".into(), 1.into(), 0.into()],
                vec!["Canada".into(), Value::Null, "51.2538".into(), "-85.3232".into(), 2.into(), 1.into()],
                vec![Value::Null, Value::Null, Value::Null, Value::Null, 7.into(), 7.into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_country_summaries() {
        let summaries = country_summaries(&locations(), &LocationColumns::default()).unwrap();

        assert_eq!(summaries.len(), 2);
        assert_eq!(
            summaries[0],
            CountrySummary {
                country: "Afghanistan".to_string(),
                population: Some(37_172_386),
                latitude: Some(33.0),
                longitude: Some(65.0),
                confirmed: 1.0,
                deaths: 0.0,
                deaths_per_100k: Some(0.0),
            }
        );
        assert_eq!(summaries[1].population, None);
        assert_eq!(summaries[1].longitude, Some(-85.3232));
    }

    #[test]
    fn test_population_column_is_optional() {
        let ds = locations()
            .select_columns(&[
                "country",
                "coordinates.latitude",
                "coordinates.longitude",
                "latest.confirmed",
                "latest.deaths",
            ])
            .unwrap();
        let summaries = country_summaries(&ds, &LocationColumns::default()).unwrap();

        assert!(summaries.iter().all(|s| s.population.is_none()));
        assert!(summaries.iter().all(|s| s.deaths_per_100k.is_none()));
    }

    #[test]
    fn test_deaths_per_100k() {
        let ds = TabularDataset::from_rows(
            &[
                "country",
                "country_population",
                "coordinates.latitude",
                "coordinates.longitude",
                "latest.confirmed",
                "latest.deaths",
            ],
            vec![
                vec!["Malta".into(), 500_000.into(), "35.9".into(), "14.4".into(), 100.into(), 10.into()],
                vec!["Nowhere".into(), 0.into(), "0".into(), "0".into(), 1.into(), 1.into()],
            ],
        )
        .unwrap();
        let summaries = country_summaries(&ds, &LocationColumns::default()).unwrap();

        assert_eq!(summaries[0].deaths_per_100k, Some(2.0));
        assert_eq!(summaries[1].deaths_per_100k, None);
    }
}
