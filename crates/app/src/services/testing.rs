//! In-memory platform stub shared by the service tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use afolu_domain::error::{AnalysisError, GeometryError};
use afolu_domain::geometry::GeometryInput;
use afolu_domain::ndvi::SceneSample;
use afolu_domain::statistics::RawStatistics;
use serde_json::{Value, json};

use crate::ports::imagery::{
    Collection, GeometryHandle, Image, ImageryPlatform, Reducer, SeriesRequest,
};

/// A reduction the stub was asked to perform.
#[derive(Debug, Clone)]
pub(crate) struct Reduction {
    pub image: Image,
    pub reducer: Reducer,
    pub scale: f64,
}

#[derive(Default)]
pub(crate) struct StubPlatform {
    pub area_m2: f64,
    pub stats: RawStatistics,
    pub size: u64,
    pub cloud_mean: Option<f64>,
    pub samples: Vec<SceneSample>,
    pub reject_geometry: bool,
    pub reduce_failure: Option<&'static str>,
    pub delay: Option<Duration>,
    pub(crate) calls: Arc<Mutex<Vec<&'static str>>>,
    pub(crate) reductions: Arc<Mutex<Vec<Reduction>>>,
}

impl StubPlatform {
    /// Names of the platform methods called so far, in order.
    pub fn calls(&self) -> Arc<Mutex<Vec<&'static str>>> {
        Arc::clone(&self.calls)
    }

    pub fn reductions(&self) -> Arc<Mutex<Vec<Reduction>>> {
        Arc::clone(&self.reductions)
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }
}

impl ImageryPlatform for StubPlatform {
    async fn geometry(&self, input: &GeometryInput) -> Result<GeometryHandle, AnalysisError> {
        self.record("geometry");
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.reject_geometry {
            return Err(GeometryError::Rejected("self-intersecting ring".to_string()).into());
        }
        let kind = input.check()?;
        Ok(GeometryHandle::new(input.clone(), kind))
    }

    async fn area(&self, _geometry: &GeometryHandle) -> Result<f64, AnalysisError> {
        self.record("area");
        Ok(self.area_m2)
    }

    async fn reduce_region(
        &self,
        image: &Image,
        _geometry: &GeometryHandle,
        reducer: &Reducer,
        scale: f64,
    ) -> Result<RawStatistics, AnalysisError> {
        self.record("reduce_region");
        self.reductions.lock().unwrap().push(Reduction {
            image: image.clone(),
            reducer: reducer.clone(),
            scale,
        });
        match self.reduce_failure {
            Some(message) => Err(AnalysisError::platform(message)),
            None => Ok(self.stats.clone()),
        }
    }

    async fn collection_size(&self, _collection: &Collection) -> Result<u64, AnalysisError> {
        self.record("collection_size");
        Ok(self.size)
    }

    async fn aggregate_mean(
        &self,
        _collection: &Collection,
        _property: &str,
    ) -> Result<Option<f64>, AnalysisError> {
        self.record("aggregate_mean");
        Ok(self.cloud_mean)
    }

    async fn sample_series(
        &self,
        _request: &SeriesRequest,
    ) -> Result<Vec<SceneSample>, AnalysisError> {
        self.record("sample_series");
        Ok(self.samples.clone())
    }
}

pub(crate) fn polygon_body() -> Value {
    json!({
        "geometry": {
            "type": "Polygon",
            "coordinates": [[[-74.1, 4.6], [-74.1, 4.7], [-74.0, 4.7], [-74.0, 4.6], [-74.1, 4.6]]]
        }
    })
}

pub(crate) fn statistics(value: Value) -> RawStatistics {
    serde_json::from_value(value).unwrap()
}
