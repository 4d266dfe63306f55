//! [`ImageryPlatform`] over the Earth Engine REST API.

use std::sync::Arc;

use afolu_app::ports::auth::{AuthError, CredentialStrategy};
use afolu_app::ports::imagery::{
    Collection, GeometryHandle, Image, ImageryPlatform, Reducer, SeriesRequest,
};
use afolu_app::services::SessionManager;
use afolu_domain::error::AnalysisError;
use afolu_domain::geometry::GeometryInput;
use afolu_domain::ndvi::SceneSample;
use afolu_domain::statistics::RawStatistics;
use serde::Deserialize;
use serde_json::Value;

use crate::compute::ComputeClient;
use crate::encode;
use crate::error::EarthEngineError;
use crate::expr::{Expression, call, constant};

#[derive(Deserialize)]
struct Feature<P> {
    properties: P,
}

#[derive(Deserialize)]
struct FeatureCollection<P> {
    #[serde(default = "Vec::new")]
    features: Vec<Feature<P>>,
}

/// Earth Engine, authenticated through `S`.
pub struct EarthEngine<S> {
    compute: ComputeClient,
    sessions: Arc<SessionManager<S>>,
}

impl<S: CredentialStrategy> EarthEngine<S> {
    pub fn new(compute: ComputeClient, sessions: Arc<SessionManager<S>>) -> Self {
        Self { compute, sessions }
    }

    /// Authenticate before serving; see [`SessionManager::establish`].
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] when no credential strategy succeeds.
    pub async fn establish_session(&self) -> Result<&'static str, AuthError> {
        self.sessions.establish().await
    }

    async fn evaluate(
        &self,
        expr: Expression,
        result: Value,
        operation: &'static str,
    ) -> Result<Value, AnalysisError> {
        let token = self.sessions.access_token().await?;
        let request = expr.into_request(result);
        tracing::debug!(operation, url = self.compute.url(), "evaluating expression");
        Ok(self.compute.compute(&token, &request).await?)
    }
}

fn number(value: &Value, operation: &'static str) -> Result<f64, AnalysisError> {
    value.as_f64().ok_or_else(|| {
        EarthEngineError::decode(operation, format!("expected a number, got {value}")).into()
    })
}

impl<S: CredentialStrategy> ImageryPlatform for EarthEngine<S> {
    async fn geometry(&self, input: &GeometryInput) -> Result<GeometryHandle, AnalysisError> {
        // Constructors are lazy server-side. Local shape errors surface here,
        // the server's own rejections when the geometry is first evaluated.
        let kind = input.check()?;
        Ok(GeometryHandle::new(input.clone(), kind))
    }

    async fn area(&self, geometry: &GeometryHandle) -> Result<f64, AnalysisError> {
        let node = call("Geometry.area", [("geometry", encode::geometry(geometry))]);
        let value = self.evaluate(Expression::new(), node, "Geometry.area").await?;
        number(&value, "Geometry.area")
    }

    async fn reduce_region(
        &self,
        image: &Image,
        geometry: &GeometryHandle,
        reducer: &Reducer,
        scale: f64,
    ) -> Result<RawStatistics, AnalysisError> {
        let mut expr = Expression::new();
        let image = encode::image(&mut expr, image);
        let node = encode::reduce_region(image, geometry, encode::reducer(reducer), scale);
        let value = self.evaluate(expr, node, "Image.reduceRegion").await?;
        match value {
            Value::Object(stats) => Ok(RawStatistics::new(stats)),
            Value::Null => Ok(RawStatistics::default()),
            other => Err(EarthEngineError::decode(
                "Image.reduceRegion",
                format!("expected a dictionary, got {other}"),
            )
            .into()),
        }
    }

    async fn collection_size(&self, collection: &Collection) -> Result<u64, AnalysisError> {
        let node = call(
            "Collection.size",
            [("collection", encode::collection(collection))],
        );
        let value = self.evaluate(Expression::new(), node, "Collection.size").await?;
        value.as_u64().ok_or_else(|| {
            EarthEngineError::decode("Collection.size", format!("expected a count, got {value}"))
                .into()
        })
    }

    async fn aggregate_mean(
        &self,
        collection: &Collection,
        property: &str,
    ) -> Result<Option<f64>, AnalysisError> {
        let node = call(
            "AggregateFeatureCollection.mean",
            [
                ("collection", encode::collection(collection)),
                ("property", constant(property)),
            ],
        );
        let value = self
            .evaluate(Expression::new(), node, "AggregateFeatureCollection.mean")
            .await?;
        if value.is_null() {
            return Ok(None);
        }
        number(&value, "AggregateFeatureCollection.mean").map(Some)
    }

    async fn sample_series(
        &self,
        request: &SeriesRequest,
    ) -> Result<Vec<SceneSample>, AnalysisError> {
        let mut expr = Expression::new();
        let node = encode::series(&mut expr, request);
        let value = self.evaluate(expr, node, "Collection.map").await?;
        let features: FeatureCollection<SceneSample> = serde_json::from_value(value)
            .map_err(|err| EarthEngineError::decode("Collection.map", err))?;
        Ok(features
            .features
            .into_iter()
            .map(|feature| feature.properties)
            .collect())
    }
}
