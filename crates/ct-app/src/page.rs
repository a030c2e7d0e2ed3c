//! Page assembly: one panel per chart, each degrading on its own

use anyhow::{anyhow, Result};
use ct_core::Value;
use ct_data::context::Snapshot;
use ct_data::{DataContext, TabularDataset};
use ct_views::{
    compare_from_day_zero, country_summaries, country_trajectory, latest_snapshot, point_series,
    rank_death_rates, sorted_table_model, worldwide_trajectory, DerivedSeries, MarkerScale, Metric,
    PointSpec, RankingSpec,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::DashboardConfig;

/// The model handed to the renderer
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub title: String,
    pub panels: Vec<Panel>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Panel {
    pub id: &'static str,
    pub title: String,
    pub content: PanelContent,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PanelContent {
    Ready { series: DerivedSeries },
    Placeholder { reason: String },
}

impl Panel {
    fn build(id: &'static str, title: impl Into<String>, derive: impl FnOnce() -> Result<DerivedSeries>) -> Self {
        let title = title.into();
        let content = match derive() {
            Ok(series) => {
                info!("Panel '{}' ready", id);
                PanelContent::Ready { series }
            }
            Err(e) => {
                warn!("Panel '{}' degraded to a placeholder: {:#}", id, e);
                PanelContent::Placeholder {
                    reason: format!("{:#}", e),
                }
            }
        };
        Self { id, title, content }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.content, PanelContent::Ready { .. })
    }
}

#[cfg(test)]
impl Page {
    pub fn panel(&self, id: &str) -> Option<&Panel> {
        self.panels.iter().find(|p| p.id == id)
    }
}

fn dataset<'a>(slot: &'a Snapshot<TabularDataset>, name: &str) -> Result<&'a TabularDataset> {
    slot.as_ref().map_err(|e| anyhow!("{} data unavailable: {}", name, e))
}

/// Build every panel from the fetched data
pub fn build_page(context: &DataContext, config: &DashboardConfig) -> Page {
    let cols = &config
        .columns
        .clone()
        .with_date_formats(config.source.date_formats.clone());
    let locs = &config.location_columns;

    let point_spec = |metric_column: &str, scale: MarkerScale| PointSpec {
        label_column: locs.country.clone(),
        sub_region_column: Some(locs.province.clone()),
        longitude_column: locs.longitude.clone(),
        latitude_column: locs.latitude.clone(),
        metric_column: metric_column.to_string(),
        scale,
    };

    let mut panels = Vec::new();

    for (id, title, column, scale) in [
        ("map-confirmed", "Confirmed cases", &locs.confirmed, config.markers.confirmed),
        ("map-deaths", "Deaths", &locs.deaths, config.markers.deaths),
        ("map-recovered", "Recovered", &locs.recovered, config.markers.recovered),
    ] {
        panels.push(Panel::build(id, title, || {
            let locations = dataset(&context.locations, "locations")?;
            Ok(DerivedSeries::Points(point_series(locations, &point_spec(column.as_str(), scale))?))
        }));
    }

    panels.push(Panel::build("death-rates", "Death rate by country", || {
        let countries = dataset(&context.countries, "countries")?;
        let latest = latest_snapshot(countries, &cols.date, None)?;
        let spec = RankingSpec {
            label_column: cols.country.clone(),
            cases_column: cols.confirmed.clone(),
            deaths_column: cols.deaths.clone(),
            min_cases: config.ranking.min_cases,
            min_deaths: config.ranking.min_deaths,
            max_rows: config.ranking.max_rows,
        };
        let ranked = rank_death_rates(&latest, &spec)?;
        for diagnostic in &ranked.diagnostics {
            warn!("Death-rate ranking: {:?}", diagnostic);
        }
        Ok(DerivedSeries::Ranked(ranked))
    }));

    panels.push(Panel::build("worldwide", "Worldwide", || {
        let worldwide = dataset(&context.worldwide, "worldwide")?;
        let series = [Metric::Cases, Metric::Recoveries, Metric::Deaths]
            .into_iter()
            .map(|metric| worldwide_trajectory(worldwide, cols, metric))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(DerivedSeries::Dated(series))
    }));

    panels.push(Panel::build("trajectories", "Confirmed cases by country", || {
        let countries = dataset(&context.countries, "countries")?;
        let known = countries.distinct(&cols.country)?;
        let mut series = Vec::new();
        for country in &config.comparison_countries {
            if !known.contains(&Value::from(country.as_str())) {
                warn!("No rows for '{}'; leaving it out", country);
                continue;
            }
            series.push(country_trajectory(countries, cols, country, Metric::Cases)?);
        }
        Ok(DerivedSeries::Dated(series))
    }));

    let day_zero = &config.day_zero;
    panels.push(Panel::build(
        "day-zero",
        format!("Days since {} {}", day_zero.threshold, day_zero.metric),
        || {
            let countries = dataset(&context.countries, "countries")?;
            let comparison = compare_from_day_zero(
                countries,
                cols,
                &config.comparison_countries,
                day_zero.threshold,
                day_zero.metric,
            )?;
            Ok(DerivedSeries::DayZero(comparison))
        },
    ));

    panels.push(Panel::build("raw-data", "Raw data", || {
        let countries = dataset(&context.countries, "countries")?;
        let latest = latest_snapshot(countries, &cols.date, None)?;
        Ok(DerivedSeries::Table(sorted_table_model(&latest, &config.table)?))
    }));

    panels.push(Panel::build("countries", "Countries", || {
        let locations = dataset(&context.locations, "locations")?;
        Ok(DerivedSeries::Countries(country_summaries(locations, locs)?))
    }));

    let ready = panels.iter().filter(|p| p.is_ready()).count();
    info!("Built page with {} of {} panels ready", ready, panels.len());

    Page {
        title: config.title.clone(),
        panels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use ct_core::StaticTransport;
    use ct_data::{DataError, EndpointConfig};
    use ct_views::RankingDiagnostic;
    use pretty_assertions::assert_eq;

    const MANIFEST_URL: &str = "https://datahub.example/covid-19/datapackage.json";
    const LOCATIONS_URL: &str = "https://tracker.example/v2/locations";
    const COUNTRIES_URL: &str = "https://datahub.example/covid-19/countries-aggregated.csv";
    const WORLDWIDE_URL: &str = "https://datahub.example/covid-19/worldwide-aggregated.csv";

    const MANIFEST: &str = r#"{"resources": [
        {"name": "countries-aggregated", "path": "https://datahub.example/covid-19/countries-aggregated.csv"},
        {"name": "worldwide-aggregated", "path": "https://datahub.example/covid-19/worldwide-aggregated.csv"}
    ]}"#;

    const COUNTRIES: &str = "Date,Country,Confirmed,Recovered,Deaths
2020-03-01,Italy,1694,83,34
2020-03-01,US,30,7,1
2020-03-02,Italy,2036,149,52
2020-03-02,US,53,7,6
";

    const WORLDWIDE: &str = "Date,Confirmed,Recovered,Deaths
2020-03-01,88371,42716,3050
2020-03-02,90309,45602,3117
";

    const LOCATIONS: &str = r#"{"locations": [
        {"country": "Italy", "country_population": 60431283, "province": "",
         "coordinates": {"latitude": "43", "longitude": "12"},
         "latest": {"confirmed": 2036, "deaths": 52, "recovered": 149}},
        {"country": "Canada", "country_population": 37058856, "province": "Ontario",
         "coordinates": {"latitude": "51.2538", "longitude": "-85.3232"},
         "latest": {"confirmed": 3, "deaths": 0, "recovered": 0}}
    ]}"#;

    fn endpoints() -> EndpointConfig {
        EndpointConfig {
            manifest_url: MANIFEST_URL.to_string(),
            locations_url: LOCATIONS_URL.to_string(),
            ..EndpointConfig::default()
        }
    }

    fn config() -> DashboardConfig {
        let mut config = DashboardConfig {
            endpoints: endpoints(),
            comparison_countries: vec!["Italy".to_string(), "US".to_string()],
            ..DashboardConfig::default()
        };
        config.ranking.min_cases = 0.0;
        config.ranking.min_deaths = 0.0;
        config
    }

    fn transport() -> StaticTransport {
        StaticTransport::new()
            .with(MANIFEST_URL, MANIFEST)
            .with(COUNTRIES_URL, COUNTRIES)
            .with(WORLDWIDE_URL, WORLDWIDE)
            .with(LOCATIONS_URL, LOCATIONS)
    }

    async fn load(transport: StaticTransport, config: &DashboardConfig) -> DataContext {
        DataContext::load(transport.into_shared(), &config.endpoints, config.source.clone()).await
    }

    fn ready(page: &Page, id: &str) -> DerivedSeries {
        match page.panel(id).map(|p| &p.content) {
            Some(PanelContent::Ready { series }) => series.clone(),
            other => panic!("panel '{}' not ready: {:?}", id, other),
        }
    }

    #[tokio::test]
    async fn test_full_page() {
        let config = config();
        let page = build_page(&load(transport(), &config).await, &config);

        assert_eq!(page.title, "Covid-19 tracker");
        assert!(page.panels.iter().all(|p| p.is_ready()), "{:#?}", page.panels);

        match ready(&page, "raw-data") {
            DerivedSeries::Table(table) => {
                assert_eq!(table.columns, vec!["Date", "Country", "Confirmed", "Recovered", "Deaths"]);
                assert_eq!(
                    table.rows,
                    vec![
                        vec!["2020-03-02", "Italy", "2036", "149", "52"],
                        vec!["2020-03-02", "US", "53", "7", "6"],
                    ]
                    .into_iter()
                    .map(|r| r.into_iter().map(String::from).collect::<Vec<_>>())
                    .collect::<Vec<_>>()
                );
            }
            other => panic!("unexpected series {:?}", other),
        }

        match ready(&page, "day-zero") {
            DerivedSeries::DayZero(comparison) => {
                assert_eq!(comparison.series.len(), 1);
                assert_eq!(comparison.series[0].series.x, vec![0, 1]);
                assert_eq!(comparison.omitted, vec!["US".to_string()]);
            }
            other => panic!("unexpected series {:?}", other),
        }

        match ready(&page, "map-deaths") {
            DerivedSeries::Points(points) => {
                assert_eq!(points.labels, vec!["Italy".to_string()]);
                assert_eq!(points.skipped.zero_metric, 1);
            }
            other => panic!("unexpected series {:?}", other),
        }

        match ready(&page, "death-rates") {
            DerivedSeries::Ranked(ranked) => {
                assert_eq!(ranked.categories.iter().filter(|c| *c == "Average").count(), 1);
                assert!(ranked.diagnostics.iter().all(|d| !matches!(d, RankingDiagnostic::InvalidRows { .. })));
            }
            other => panic!("unexpected series {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failed_feed_degrades_only_its_panels() {
        let config = config();
        let transport = StaticTransport::new()
            .with(MANIFEST_URL, MANIFEST)
            .with(COUNTRIES_URL, COUNTRIES)
            .with(WORLDWIDE_URL, WORLDWIDE);
        let page = build_page(&load(transport, &config).await, &config);

        for id in ["map-confirmed", "map-deaths", "map-recovered", "countries"] {
            let panel = page.panel(id).unwrap();
            match &panel.content {
                PanelContent::Placeholder { reason } => assert!(reason.contains("locations"), "{}", reason),
                other => panic!("panel '{}' should be a placeholder: {:?}", id, other),
            }
        }
        for id in ["death-rates", "worldwide", "trajectories", "day-zero", "raw-data"] {
            assert!(page.panel(id).unwrap().is_ready(), "panel '{}'", id);
        }
    }

    #[tokio::test]
    async fn test_latest_snapshot_of_one_country() {
        let transport = StaticTransport::new()
            .with(
                MANIFEST_URL,
                r#"{"resources":[{"name":"countries-aggregated","path":"https://datahub.example/covid-19/x.csv"}]}"#,
            )
            .with(
                "https://datahub.example/covid-19/x.csv",
                "Date,Country,Confirmed,Recovered,Deaths\n2020-03-01,US,30,7,1\n2020-03-02,US,53,7,6\n",
            );
        let context = load(transport, &config()).await;

        let us = context.countries.as_ref().unwrap().filter("Country", &Value::from("US")).unwrap();
        let latest = latest_snapshot(&us, "Date", None).unwrap();

        assert_eq!(latest.row_count(), 1);
        assert_eq!(
            latest.row(0).unwrap(),
            vec![
                Value::Date(chrono::NaiveDate::from_ymd_opt(2020, 3, 2).unwrap()),
                Value::from("US"),
                Value::Int(53),
                Value::Int(7),
                Value::Int(6),
            ]
        );
        assert!(context.worldwide.is_err());
    }

    #[test]
    fn test_trajectories_skip_unknown_countries() {
        let countries = TabularDataset::from_rows(
            &["Date", "Country", "Confirmed", "Recovered", "Deaths"],
            vec![vec!["2020/03/01".into(), "Italy".into(), 1694.into(), 83.into(), 34.into()]],
        )
        .unwrap();
        let context = DataContext::from_parts(
            Err(Arc::new(DataError::EmptyDataset("no catalog".to_string()))),
            Ok(countries),
            Err(Arc::new(DataError::UnknownResource("worldwide-aggregated".to_string()))),
            Err(Arc::new(DataError::EmptyDataset("no locations".to_string()))),
        );
        let page = build_page(&context, &config());

        match ready(&page, "trajectories") {
            DerivedSeries::Dated(series) => {
                assert_eq!(series.len(), 1);
                assert_eq!(series[0].name, "Italy");
                assert_eq!(series[0].x, vec![chrono::NaiveDate::from_ymd_opt(2020, 3, 1).unwrap()]);
            }
            other => panic!("unexpected series {:?}", other),
        }
    }

    #[test]
    fn test_derivation_error_becomes_placeholder() {
        let countries = TabularDataset::from_rows(&["Day", "Country"], vec![vec!["2020-03-01".into(), "Italy".into()]])
            .unwrap();
        let missing = Err(Arc::new(DataError::UnknownResource("worldwide-aggregated".to_string())));
        let context = DataContext::from_parts(
            Err(Arc::new(DataError::EmptyDataset("no catalog".to_string()))),
            Ok(countries),
            missing,
            Err(Arc::new(DataError::EmptyDataset("no locations".to_string()))),
        );
        let page = build_page(&context, &config());

        assert!(page.panels.iter().all(|p| !p.is_ready()));
        match &page.panel("raw-data").unwrap().content {
            PanelContent::Placeholder { reason } => assert_eq!(reason, "column 'Date' not found"),
            other => panic!("unexpected content {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_page_serializes_to_json() {
        let config = config();
        let page = build_page(&load(transport(), &config).await, &config);
        let json = serde_json::to_value(&page).unwrap();

        assert_eq!(json["panels"][0]["id"], "map-confirmed");
        assert_eq!(json["panels"][0]["content"]["status"], "ready");
        assert_eq!(json["panels"][0]["content"]["series"]["kind"], "points");
        assert_eq!(json["panels"][3]["content"]["series"]["data"]["categories"].as_array().unwrap().len(), 3);
    }
}
