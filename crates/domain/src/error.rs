//! Error taxonomy shared by every layer.
//!
//! Each failure class has its own typed error. [`AnalysisError`] is the
//! umbrella that crosses port boundaries; adapters convert their own errors
//! into [`AnalysisError::Platform`] via `From`.

use std::time::Duration;

/// Boxed error used to carry collaborator failures across layers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Client input is missing or malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The body is absent, not JSON, or not a JSON object.
    #[error("No JSON data provided")]
    MissingBody,

    /// A required field is absent.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// A field is present but has the wrong JSON type.
    #[error("Field '{field}' must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    /// A date field could not be read as an ISO date.
    #[error("Field '{field}' must be an ISO date (YYYY-MM-DD), got '{value}'")]
    InvalidDate { field: &'static str, value: String },
}

/// The geometry was rejected by the imagery platform.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeometryError {
    #[error("geometry must be a GeoJSON object with a 'type' member")]
    MissingType,

    #[error("unsupported geometry type '{0}'")]
    UnsupportedType(String),

    /// The members do not form a GeoJSON geometry of the declared type.
    #[error("malformed {kind} geometry: {reason}")]
    Malformed { kind: &'static str, reason: String },

    #[error("invalid coordinates for {kind}: {reason}")]
    InvalidCoordinates {
        kind: &'static str,
        reason: &'static str,
    },

    /// The platform itself rejected the shape after construction.
    #[error("geometry rejected by platform: {0}")]
    Rejected(String),
}

/// The platform holds no imagery matching the request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("No images found for the specified criteria")]
pub struct NoDataError {
    /// Always zero; carried so the HTTP layer can echo it.
    pub image_count: u64,
}

impl Default for NoDataError {
    fn default() -> Self {
        Self { image_count: 0 }
    }
}

/// The platform answered, but not in the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StatisticsError {
    #[error("statistics are missing key '{0}'")]
    MissingKey(&'static str),

    #[error("statistics key '{key}' has an unexpected shape")]
    Malformed { key: &'static str },
}

/// Umbrella error for a single pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    NoData(#[from] NoDataError),

    #[error(transparent)]
    Statistics(#[from] StatisticsError),

    /// Any other failure reported by the imagery platform or its session.
    #[error("{0}")]
    Platform(#[source] BoxError),

    #[error("analysis did not complete within {0:?}")]
    Timeout(Duration),
}

impl AnalysisError {
    /// Wrap an arbitrary collaborator error.
    pub fn platform(err: impl Into<BoxError>) -> Self {
        Self::Platform(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_name_missing_field_in_message() {
        let err = ValidationError::MissingField("start_date");
        assert_eq!(err.to_string(), "Missing required field: start_date");
    }

    #[test]
    fn should_default_no_data_to_zero_images() {
        assert_eq!(NoDataError::default().image_count, 0);
    }

    #[test]
    fn should_keep_inner_message_when_converting_validation_error() {
        let err: AnalysisError = ValidationError::MissingBody.into();
        assert!(matches!(err, AnalysisError::Validation(_)));
        assert_eq!(err.to_string(), "No JSON data provided");
    }

    #[test]
    fn should_display_platform_source_message() {
        let err = AnalysisError::platform("quota exceeded");
        assert_eq!(err.to_string(), "quota exceeded");
    }
}
