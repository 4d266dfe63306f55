//! NDVI analysis: index statistics and per-scene series over a date range.

use afolu_domain::error::{AnalysisError, NoDataError, ValidationError};
use afolu_domain::ndvi::{self, NdviObservation, NdviReport, NdviRequest};
use afolu_domain::service::ServiceKind;
use serde_json::Value;

use crate::ports::imagery::{
    Collection, Image, ImageryPlatform, NormalizedDifference, Reducer, SeriesRequest,
};
use crate::services::pipeline::Analysis;

/// Backs `POST /calculate-ndvi`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NdviAnalysis;

fn ndvi_index() -> NormalizedDifference {
    NormalizedDifference {
        first: ndvi::NIR_BAND.to_string(),
        second: ndvi::RED_BAND.to_string(),
        name: ndvi::INDEX_BAND.to_string(),
    }
}

impl Analysis for NdviAnalysis {
    type Request = NdviRequest;
    type Report = NdviReport;

    fn kind(&self) -> ServiceKind {
        ServiceKind::Ndvi
    }

    fn parse(&self, body: Option<&Value>) -> Result<NdviRequest, ValidationError> {
        NdviRequest::from_body(body)
    }

    async fn run<P: ImageryPlatform>(
        &self,
        platform: &P,
        request: &NdviRequest,
    ) -> Result<NdviReport, AnalysisError> {
        let region = platform.geometry(&request.geometry).await?;
        let scenes = Collection::load(ndvi::COLLECTION)
            .filter_bounds(&region)
            .filter_date(&request.start_date, &request.end_date)
            .filter_less_than(ndvi::CLOUD_PROPERTY, request.cloud_threshold);

        let image_count = platform.collection_size(&scenes).await?;
        if image_count == 0 {
            tracing::info!("no scenes match the request");
            return Err(NoDataError::default().into());
        }

        let mean_index = Image::IndexMean {
            collection: scenes.clone(),
            index: ndvi_index(),
        };
        let stats = platform
            .reduce_region(&mean_index, &region, &Reducer::MeanAndStdDev, request.scale)
            .await?;

        let samples = platform
            .sample_series(&SeriesRequest {
                collection: scenes.clone(),
                index: ndvi_index(),
                geometry: region.clone(),
                scale: request.scale,
                date_format: ndvi::DATE_FORMAT.to_string(),
                property: ndvi::CLOUD_PROPERTY.to_string(),
            })
            .await?;

        let mean_cloud_pct = platform
            .aggregate_mean(&scenes, ndvi::CLOUD_PROPERTY)
            .await?;
        let area_m2 = platform.area(&region).await?;
        tracing::debug!(image_count, samples = samples.len(), "ndvi observed");

        Ok(NdviReport::compose(
            NdviObservation {
                stats,
                samples,
                mean_cloud_pct,
                image_count,
                area_m2,
            },
            request,
        ))
    }
}
