//! Biomass analysis: mean annual NPP over the geometry, converted to carbon.

use afolu_domain::biomass::{self, BiomassReport, BiomassRequest};
use afolu_domain::error::{AnalysisError, ValidationError};
use afolu_domain::service::ServiceKind;
use serde_json::Value;

use crate::ports::imagery::{Collection, Image, ImageryPlatform, Reducer};
use crate::services::pipeline::Analysis;

/// Backs `POST /calculate-biomass`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BiomassAnalysis;

impl Analysis for BiomassAnalysis {
    type Request = BiomassRequest;
    type Report = BiomassReport;

    fn kind(&self) -> ServiceKind {
        ServiceKind::Biomass
    }

    fn parse(&self, body: Option<&Value>) -> Result<BiomassRequest, ValidationError> {
        BiomassRequest::from_body(body)
    }

    async fn run<P: ImageryPlatform>(
        &self,
        platform: &P,
        request: &BiomassRequest,
    ) -> Result<BiomassReport, AnalysisError> {
        let region = platform.geometry(&request.geometry).await?;
        let area_m2 = platform.area(&region).await?;

        let npp = Image::CollectionMean {
            collection: Collection::load(biomass::DATASET)
                .filter_date(request.start_date(), request.end_date()),
            bands: vec![biomass::NPP_BAND.to_string()],
        };
        let stats = platform
            .reduce_region(&npp, &region, &Reducer::Mean, biomass::SCALE_M)
            .await?;
        tracing::debug!(raw_npp = ?stats.number(biomass::NPP_BAND), area_m2, "npp reduced");

        Ok(BiomassReport::compute(
            biomass::raw_npp(&stats),
            area_m2,
            request,
        ))
    }
}
