//! # afolu-adapter-virtual
//!
//! Deterministic in-process [`ImageryPlatform`] for running the services
//! without cloud credentials, and for end-to-end tests.
//!
//! ## Simulated datasets
//!
//! | Collection | Content |
//! |------------|---------|
//! | `MODIS/006/MOD17A3HGF` | Uniform raw `Npp` value |
//! | `ESA/WorldCover/v200` | Fixed class fractions of any region |
//! | `COPERNICUS/S2_SR_HARMONIZED` | Three scenes a month, 2019 to 2024 |
//!
//! Imagery is spatially uniform: every region sees the same values, scaled
//! by its geodesic area where relevant.
//!
//! ## Dependency rule
//!
//! Depends on `afolu-app` (port traits) and `afolu-domain` only.

mod area;
mod scenes;

use std::time::Duration;

use afolu_app::ports::imagery::{
    Collection, GeometryHandle, Image, ImageryPlatform, NormalizedDifference, PropertyFilter,
    Reducer, SeriesRequest,
};
use afolu_domain::error::AnalysisError;
use afolu_domain::geometry::GeometryInput;
use afolu_domain::ndvi::SceneSample;
use afolu_domain::statistics::RawStatistics;
use afolu_domain::units::SQUARE_METERS_PER_HECTARE;
use afolu_domain::{biomass, land_cover, ndvi};
use serde_json::{Map, Value, json};

pub use scenes::Scene;

/// Raw (unscaled) MODIS NPP of the simulated region: 0.45 kg C/m²/yr.
pub const DEFAULT_RAW_NPP: f64 = 4500.0;

/// Class code and share of the region.
pub const DEFAULT_LAND_COVER: [(u32, f64); 4] =
    [(10, 0.55), (30, 0.25), (40, 0.15), (80, 0.05)];

/// Spatial standard deviation of the index within a region.
pub const DEFAULT_NDVI_SPREAD: f64 = 0.08;

/// Simulated imagery platform.
#[derive(Debug, Clone)]
pub struct VirtualPlatform {
    raw_npp: f64,
    land_cover: Vec<(u32, f64)>,
    scenes: Vec<Scene>,
    ndvi_spread: f64,
    latency: Duration,
}

impl Default for VirtualPlatform {
    fn default() -> Self {
        Self {
            raw_npp: DEFAULT_RAW_NPP,
            land_cover: DEFAULT_LAND_COVER.to_vec(),
            scenes: scenes::catalogue(),
            ndvi_spread: DEFAULT_NDVI_SPREAD,
            latency: Duration::ZERO,
        }
    }
}

impl VirtualPlatform {
    #[must_use]
    pub fn with_raw_npp(mut self, raw_npp: f64) -> Self {
        self.raw_npp = raw_npp;
        self
    }

    /// Replace the class fractions; they need not sum to one.
    #[must_use]
    pub fn with_land_cover(mut self, classes: Vec<(u32, f64)>) -> Self {
        self.land_cover = classes;
        self
    }

    #[must_use]
    pub fn with_scenes(mut self, scenes: Vec<Scene>) -> Self {
        self.scenes = scenes;
        self
    }

    /// Delay every platform call by `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    async fn round_trip(&self, operation: &'static str) {
        tracing::debug!(operation, "virtual platform call");
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn known(collection: &Collection) -> Result<(), AnalysisError> {
        match collection.id.as_str() {
            biomass::DATASET | land_cover::DATASET | ndvi::COLLECTION => Ok(()),
            other => Err(AnalysisError::platform(format!(
                "Collection asset '{other}' not found."
            ))),
        }
    }

    /// Scenes left after the collection's date and property filters.
    ///
    /// Only the optical collection has scenes. Bounds never exclude anything
    /// since the simulated imagery covers the globe.
    fn scenes<'a>(&'a self, collection: &'a Collection) -> impl Iterator<Item = &'a Scene> + 'a {
        let optical = collection.id == ndvi::COLLECTION;
        self.scenes
            .iter()
            .filter(move |_| optical)
            .filter(move |scene| {
                collection.dates.as_ref().is_none_or(|range| {
                    let date = scene.date.as_str();
                    date >= calendar_day(&range.start) && date < calendar_day(&range.end)
                })
            })
            .filter(move |scene| {
                collection.filters.iter().all(|filter| match filter {
                    PropertyFilter::LessThan { property, value } => {
                        property == ndvi::CLOUD_PROPERTY && scene.cloud_pct < *value
                    }
                })
            })
    }

    fn property(scene: &Scene, property: &str) -> Option<f64> {
        (property == ndvi::CLOUD_PROPERTY).then_some(scene.cloud_pct)
    }

    fn band_means(&self, bands: &[String]) -> Map<String, Value> {
        bands
            .iter()
            .filter(|band| band.as_str() == biomass::NPP_BAND)
            .map(|band| (band.clone(), json!(self.raw_npp)))
            .collect()
    }

    #[allow(clippy::cast_precision_loss)]
    fn index_stats(
        &self,
        collection: &Collection,
        index: &NormalizedDifference,
        reducer: &Reducer,
    ) -> Result<Map<String, Value>, AnalysisError> {
        let values: Vec<f64> = self.scenes(collection).filter_map(|scene| scene.ndvi).collect();
        let mean = (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64);
        let spread = mean.map(|_| self.ndvi_spread);

        let mut stats = Map::new();
        match reducer {
            Reducer::Mean => {
                stats.insert(index.name.clone(), json!(mean));
            }
            Reducer::MeanAndStdDev => {
                stats.insert(format!("{}_mean", index.name), json!(mean));
                stats.insert(format!("{}_stdDev", index.name), json!(spread));
            }
            Reducer::GroupedSum { .. } => {
                return Err(AnalysisError::platform(
                    "Reducer.group: index images have no class band",
                ));
            }
        }
        Ok(stats)
    }

    fn class_groups(
        &self,
        clip: &GeometryHandle,
        group_name: &str,
    ) -> Result<Map<String, Value>, AnalysisError> {
        let area_ha = area::geometry_area(clip.input())? / SQUARE_METERS_PER_HECTARE;
        let groups: Vec<Value> = self
            .land_cover
            .iter()
            .filter(|(_, fraction)| *fraction > 0.0)
            .map(|(code, fraction)| {
                let mut group = Map::new();
                group.insert(group_name.to_string(), json!(code));
                group.insert(land_cover::SUM_KEY.to_string(), json!(area_ha * fraction));
                Value::Object(group)
            })
            .collect();
        let mut stats = Map::new();
        stats.insert(land_cover::GROUPS_KEY.to_string(), Value::Array(groups));
        Ok(stats)
    }
}

/// `YYYY-MM-DD` prefix of an ISO date or timestamp. Scenes are dated by day.
fn calendar_day(iso: &str) -> &str {
    iso.get(..10).unwrap_or(iso)
}

impl ImageryPlatform for VirtualPlatform {
    async fn geometry(&self, input: &GeometryInput) -> Result<GeometryHandle, AnalysisError> {
        self.round_trip("geometry").await;
        let kind = input.check()?;
        Ok(GeometryHandle::new(input.clone(), kind))
    }

    async fn area(&self, geometry: &GeometryHandle) -> Result<f64, AnalysisError> {
        self.round_trip("area").await;
        Ok(area::geometry_area(geometry.input())?)
    }

    async fn reduce_region(
        &self,
        image: &Image,
        _geometry: &GeometryHandle,
        reducer: &Reducer,
        _scale: f64,
    ) -> Result<RawStatistics, AnalysisError> {
        self.round_trip("reduce_region").await;
        let stats = match (image, reducer) {
            (Image::CollectionMean { collection, bands }, Reducer::Mean) => {
                Self::known(collection)?;
                self.band_means(bands)
            }
            (Image::IndexMean { collection, index }, reducer) => {
                Self::known(collection)?;
                self.index_stats(collection, index, reducer)?
            }
            (
                Image::FirstWithPixelArea { collection, clip },
                Reducer::GroupedSum { group_name, .. },
            ) => {
                Self::known(collection)?;
                self.class_groups(clip, group_name)?
            }
            (image, reducer) => {
                return Err(AnalysisError::platform(format!(
                    "virtual platform cannot reduce {image:?} with {reducer:?}"
                )));
            }
        };
        Ok(RawStatistics::new(stats))
    }

    async fn collection_size(&self, collection: &Collection) -> Result<u64, AnalysisError> {
        self.round_trip("collection_size").await;
        Self::known(collection)?;
        Ok(self.scenes(collection).count() as u64)
    }

    #[allow(clippy::cast_precision_loss)]
    async fn aggregate_mean(
        &self,
        collection: &Collection,
        property: &str,
    ) -> Result<Option<f64>, AnalysisError> {
        self.round_trip("aggregate_mean").await;
        Self::known(collection)?;
        let values: Vec<f64> = self
            .scenes(collection)
            .filter_map(|scene| Self::property(scene, property))
            .collect();
        if values.is_empty() {
            return Ok(None);
        }
        Ok(Some(values.iter().sum::<f64>() / values.len() as f64))
    }

    async fn sample_series(
        &self,
        request: &SeriesRequest,
    ) -> Result<Vec<SceneSample>, AnalysisError> {
        self.round_trip("sample_series").await;
        Self::known(&request.collection)?;
        Ok(self
            .scenes(&request.collection)
            .map(|scene| SceneSample {
                date: scene.date.clone(),
                ndvi: scene.ndvi,
                cloud_pct: Self::property(scene, &request.property),
            })
            .collect())
    }
}
