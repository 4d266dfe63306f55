//! Earth Engine adapter error types.

use afolu_domain::error::{AnalysisError, GeometryError};

/// Errors specific to the Earth Engine adapter.
#[derive(Debug, thiserror::Error)]
pub enum EarthEngineError {
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),

    /// The request never produced a response.
    #[error("request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status.
    ///
    /// Displays the service's own message, which is what callers report.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// A service-account assertion could not be signed.
    #[error("failed to sign service account assertion")]
    Signing(#[source] jsonwebtoken::errors::Error),

    /// The response body did not have the expected shape.
    #[error("unexpected response from {context}: {reason}")]
    Decode {
        context: &'static str,
        reason: String,
    },
}

impl EarthEngineError {
    pub(crate) fn decode(context: &'static str, reason: impl ToString) -> Self {
        Self::Decode {
            context,
            reason: reason.to_string(),
        }
    }
}

/// Whether an API message reports a shape the geometry constructors refused.
///
/// Earth Engine answers `Invalid GeoJSON geometry.` for unparseable input and
/// prefixes constructor and geometry-operation failures with their function
/// name (`GeometryConstructors.Polygon: ...`, `Geometry.area: ...`).
fn rejects_geometry(message: &str) -> bool {
    message.contains("GeoJSON") || message.starts_with("Geometry")
}

impl From<EarthEngineError> for AnalysisError {
    fn from(err: EarthEngineError) -> Self {
        match err {
            EarthEngineError::Api { message, .. } if rejects_geometry(&message) => {
                GeometryError::Rejected(message).into()
            }
            err => Self::platform(err),
        }
    }
}
