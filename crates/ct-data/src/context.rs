//! The data snapshot a dashboard build works from

use std::sync::Arc;

use ct_core::Transport;
use tracing::{info, warn};

use crate::catalog::ResourceCatalog;
use crate::config::{EndpointConfig, SourceConfig};
use crate::dataset::TabularDataset;
use crate::sources::{DecodeOptions, SourceAdapter};
use crate::DataError;

/// Outcome of loading one upstream dataset
pub type Snapshot<T> = Result<T, Arc<DataError>>;

/// Every dataset the dashboard reads, fetched once at startup.
///
/// Each slot fails independently so that panels depending on a healthy
/// source can still be built.
#[derive(Debug, Clone)]
pub struct DataContext {
    pub catalog: Snapshot<ResourceCatalog>,
    /// Daily per-country series (`Date, Country, Confirmed, Recovered, Deaths`)
    pub countries: Snapshot<TabularDataset>,
    /// Daily worldwide series
    pub worldwide: Snapshot<TabularDataset>,
    /// Per-location coordinates and latest counts
    pub locations: Snapshot<TabularDataset>,
    /// Combined per-country series, when an endpoint names one
    pub combined: Option<Snapshot<TabularDataset>>,
}

impl DataContext {
    /// Fetch everything the dashboard needs.
    ///
    /// The catalog-backed series and the locations feed come from unrelated
    /// hosts and are fetched concurrently.
    pub async fn load(
        transport: Arc<dyn Transport>,
        endpoints: &EndpointConfig,
        source_config: SourceConfig,
    ) -> Self {
        let adapter = SourceAdapter::new(transport, source_config);

        let aggregated = Self::load_aggregated(&adapter, endpoints);
        let locations_options = DecodeOptions::default()
            .with_format(endpoints.locations_format)
            .with_record_path(endpoints.locations_record_path.clone());
        let locations = adapter.fetch_and_decode_with(&endpoints.locations_url, &locations_options);

        let ((catalog, countries, worldwide, combined), locations) = tokio::join!(aggregated, locations);
        let locations = locations.map_err(Arc::new);

        let context = Self {
            catalog,
            countries,
            worldwide,
            locations,
            combined,
        };
        context.log_summary();
        context
    }

    async fn load_aggregated(
        adapter: &SourceAdapter,
        endpoints: &EndpointConfig,
    ) -> (
        Snapshot<ResourceCatalog>,
        Snapshot<TabularDataset>,
        Snapshot<TabularDataset>,
        Option<Snapshot<TabularDataset>>,
    ) {
        let catalog = match ResourceCatalog::load(adapter.transport().as_ref(), &endpoints.manifest_url).await {
            Ok(catalog) => catalog,
            Err(e) => {
                let e = Arc::new(e);
                let combined = endpoints.combined_resource.as_ref().map(|_| Err(e.clone()));
                return (Err(e.clone()), Err(e.clone()), Err(e), combined);
            }
        };

        let countries = Self::load_resource(adapter, &catalog, &endpoints.countries_resource);
        let worldwide = Self::load_resource(adapter, &catalog, &endpoints.worldwide_resource);
        let combined = async {
            match &endpoints.combined_resource {
                Some(name) => Some(Self::load_resource(adapter, &catalog, name).await),
                None => None,
            }
        };
        let (countries, worldwide, combined) = tokio::join!(countries, worldwide, combined);

        (Ok(catalog), countries, worldwide, combined)
    }

    async fn load_resource(
        adapter: &SourceAdapter,
        catalog: &ResourceCatalog,
        name: &str,
    ) -> Snapshot<TabularDataset> {
        let path = catalog.resolve(name).map_err(Arc::new)?;
        adapter.fetch_and_decode(path).await.map_err(Arc::new)
    }

    /// Build a context from datasets that are already in hand.
    ///
    /// No combined series is attached.
    pub fn from_parts(
        catalog: Snapshot<ResourceCatalog>,
        countries: Snapshot<TabularDataset>,
        worldwide: Snapshot<TabularDataset>,
        locations: Snapshot<TabularDataset>,
    ) -> Self {
        Self {
            catalog,
            countries,
            worldwide,
            locations,
            combined: None,
        }
    }

    fn log_summary(&self) {
        let slots = [
            ("countries", Some(&self.countries)),
            ("worldwide", Some(&self.worldwide)),
            ("locations", Some(&self.locations)),
            ("combined", self.combined.as_ref()),
        ];
        for (name, slot) in slots.into_iter().filter_map(|(name, slot)| slot.map(|s| (name, s))) {
            match slot {
                Ok(ds) => info!("Dataset '{}' ready with {} rows", name, ds.row_count()),
                Err(e) => warn!("Dataset '{}' unavailable: {}", name, e),
            }
        }
    }
}
