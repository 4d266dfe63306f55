//! Land cover analysis: class areas of the first classification image.

use afolu_domain::error::{AnalysisError, ValidationError};
use afolu_domain::land_cover::{self, LandCoverReport, LandCoverRequest};
use afolu_domain::service::ServiceKind;
use serde_json::Value;

use crate::ports::imagery::{Collection, Image, ImageryPlatform, Reducer};
use crate::services::pipeline::Analysis;

/// Backs `POST /get-landcover`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LandCoverAnalysis;

impl Analysis for LandCoverAnalysis {
    type Request = LandCoverRequest;
    type Report = LandCoverReport;

    fn kind(&self) -> ServiceKind {
        ServiceKind::Landcover
    }

    fn parse(&self, body: Option<&Value>) -> Result<LandCoverRequest, ValidationError> {
        LandCoverRequest::from_body(body)
    }

    async fn run<P: ImageryPlatform>(
        &self,
        platform: &P,
        request: &LandCoverRequest,
    ) -> Result<LandCoverReport, AnalysisError> {
        let region = platform.geometry(&request.geometry).await?;

        let classified = Image::FirstWithPixelArea {
            collection: Collection::load(land_cover::DATASET),
            clip: region.clone(),
        };
        let reducer = Reducer::GroupedSum {
            group_field: 0,
            group_name: land_cover::GROUP_NAME.to_string(),
        };
        let stats = platform
            .reduce_region(&classified, &region, &reducer, land_cover::SCALE_M)
            .await?;

        let areas = land_cover::class_areas(&stats)?;
        tracing::debug!(classes = areas.len(), "class areas reduced");
        Ok(LandCoverReport::compose(&areas, request))
    }
}
