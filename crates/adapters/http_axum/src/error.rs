//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use afolu_domain::error::AnalysisError;

/// JSON error body returned by the analysis endpoints.
///
/// Every failure carries `error`; server-side failures add `message`.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_count: Option<u64>,
}

impl ErrorBody {
    fn client(error: String) -> Self {
        Self {
            error,
            message: None,
            image_count: None,
        }
    }

    fn server(error: &str, message: String) -> Self {
        Self {
            error: error.to_string(),
            message: Some(message),
            image_count: None,
        }
    }
}

/// Maps [`AnalysisError`] to an HTTP response with appropriate status code.
pub struct ApiError(AnalysisError);

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self.0 {
            AnalysisError::Validation(err) => {
                tracing::warn!(error = %err, "invalid request");
                (StatusCode::BAD_REQUEST, ErrorBody::client(err.to_string()))
            }
            AnalysisError::NoData(err) => {
                tracing::warn!("no imagery matches the request");
                (
                    StatusCode::NOT_FOUND,
                    ErrorBody {
                        image_count: Some(err.image_count),
                        ..ErrorBody::client(err.to_string())
                    },
                )
            }
            AnalysisError::Geometry(err) => {
                tracing::error!(error = %err, "geometry rejected");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::server("Invalid geometry", err.to_string()),
                )
            }
            AnalysisError::Platform(err) => {
                tracing::error!(error = %err, "platform error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::server("Earth Engine error", err.to_string()),
                )
            }
            AnalysisError::Statistics(err) => {
                tracing::error!(error = %err, "unexpected statistics");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::server("Internal server error", err.to_string()),
                )
            }
            AnalysisError::Timeout(deadline) => {
                tracing::error!(?deadline, "analysis timed out");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::server("Internal server error", self.0.to_string()),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
