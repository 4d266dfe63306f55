//! JSON handlers: analysis endpoint, health check and service metadata.

use std::collections::BTreeMap;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

use afolu_app::ports::ImageryPlatform;
use afolu_app::services::Analysis;

use crate::error::ApiError;
use crate::state::AppState;

/// Version advertised by `GET /`.
pub const API_VERSION: &str = "1.0.0";

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    /// RFC 3339, UTC.
    pub timestamp: String,
}

/// Body of `GET /`.
#[derive(Debug, Serialize)]
pub struct ServiceMetadata {
    pub service: &'static str,
    pub version: &'static str,
    /// Path → one-line description.
    pub endpoints: BTreeMap<&'static str, &'static str>,
}

/// Parse the raw body. An empty or non-JSON body counts as absent.
fn parse_body(bytes: &[u8]) -> Option<Value> {
    serde_json::from_slice(bytes).ok()
}

/// `POST /calculate-biomass`, `POST /get-landcover` or `POST /calculate-ndvi`
///
/// # Errors
///
/// Returns [`ApiError`] for every [`AnalysisError`](afolu_domain::error::AnalysisError).
pub async fn analyze<A, P>(
    State(state): State<AppState<A, P>>,
    body: Bytes,
) -> Result<Json<A::Report>, ApiError>
where
    A: Analysis + 'static,
    P: ImageryPlatform + 'static,
{
    let body = parse_body(&body);
    let report = state.analysis.handle(body.as_ref()).await?;
    Ok(Json(report))
}

/// `GET /health`
pub async fn health<A, P>(State(state): State<AppState<A, P>>) -> Json<HealthResponse>
where
    A: Analysis + 'static,
    P: ImageryPlatform + 'static,
{
    Json(HealthResponse {
        status: "healthy",
        service: state.analysis.kind().health_name(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
    })
}

/// `GET /`
pub async fn metadata<A, P>(State(state): State<AppState<A, P>>) -> Json<ServiceMetadata>
where
    A: Analysis + 'static,
    P: ImageryPlatform + 'static,
{
    let kind = state.analysis.kind();
    Json(ServiceMetadata {
        service: kind.title(),
        version: API_VERSION,
        endpoints: BTreeMap::from([
            (kind.endpoint(), kind.summary()),
            ("/health", "GET - Health check"),
        ]),
    })
}
