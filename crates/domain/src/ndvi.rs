//! NDVI statistics and time series over surface-reflectance imagery.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ValidationError;
use crate::geometry::GeometryInput;
use crate::request::{DefaultValue, FieldKind, OptionalField, RequestSchema, RequiredField};
use crate::statistics::RawStatistics;
use crate::units::{round_index, round_quantity, square_meters_to_hectares};

pub const COLLECTION: &str = "COPERNICUS/S2_SR_HARMONIZED";
/// Per-image cloud cover property, filtered with a strict "less than".
pub const CLOUD_PROPERTY: &str = "CLOUDY_PIXEL_PERCENTAGE";
pub const NIR_BAND: &str = "B8";
pub const RED_BAND: &str = "B4";
pub const INDEX_BAND: &str = "NDVI";
pub const MEAN_KEY: &str = "NDVI_mean";
pub const STD_DEV_KEY: &str = "NDVI_stdDev";
/// Capture date pattern, in the platform's date-format syntax.
pub const DATE_FORMAT: &str = "YYYY-MM-dd";

pub const DEFAULT_CLOUD_THRESHOLD: f64 = 20.0;
pub const DEFAULT_SCALE_M: f64 = 10.0;

pub const SCHEMA: RequestSchema = RequestSchema {
    geometry_field: "geometry",
    required: &[
        RequiredField {
            name: "start_date",
            kind: FieldKind::Date,
        },
        RequiredField {
            name: "end_date",
            kind: FieldKind::Date,
        },
    ],
    optional: &[
        OptionalField {
            name: "cloud_threshold",
            kind: FieldKind::Number,
            default: DefaultValue::Number(DEFAULT_CLOUD_THRESHOLD),
        },
        OptionalField {
            name: "scale",
            kind: FieldKind::Number,
            default: DefaultValue::Number(DEFAULT_SCALE_M),
        },
    ],
};

/// A validated NDVI request.
#[derive(Debug, Clone, PartialEq)]
pub struct NdviRequest {
    pub geometry: GeometryInput,
    pub start_date: String,
    pub end_date: String,
    pub cloud_threshold: f64,
    pub scale: f64,
}

impl NdviRequest {
    /// Validate a raw body against [`SCHEMA`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] naming the first of `geometry`,
    /// `start_date`, `end_date` that is missing, or the first mistyped field.
    pub fn from_body(body: Option<&Value>) -> Result<Self, ValidationError> {
        let request = SCHEMA.validate(body)?;
        Ok(Self {
            start_date: request.text("start_date")?,
            end_date: request.text("end_date")?,
            cloud_threshold: request.number("cloud_threshold")?,
            scale: request.number("scale")?,
            geometry: request.geometry,
        })
    }
}

/// What the platform reported for one image of the filtered collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneSample {
    pub date: String,
    /// `None` when the index could not be computed, typically because the
    /// scene is fully clouded over the geometry.
    pub ndvi: Option<f64>,
    pub cloud_pct: Option<f64>,
}

/// One entry of `ndvi_time_series`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: String,
    pub ndvi: f64,
    pub cloud_pct: Option<f64>,
}

/// Drop samples without an index value and order the rest by date.
///
/// Dates are ISO strings, so lexicographic order is chronological. The sort
/// is stable: same-day scenes keep platform order.
#[must_use]
pub fn time_series(samples: Vec<SceneSample>) -> Vec<SeriesPoint> {
    let mut points: Vec<SeriesPoint> = samples
        .into_iter()
        .filter_map(|sample| {
            sample.ndvi.map(|ndvi| SeriesPoint {
                date: sample.date,
                ndvi: round_index(ndvi),
                cloud_pct: sample.cloud_pct.map(round_quantity),
            })
        })
        .collect();
    points.sort_by(|a, b| a.date.cmp(&b.date));
    points
}

/// Everything the platform returned for a non-empty collection.
#[derive(Debug, Clone, PartialEq)]
pub struct NdviObservation {
    /// Mean/stdDev reduction of the temporal-mean index image.
    pub stats: RawStatistics,
    pub samples: Vec<SceneSample>,
    /// Aggregate mean of [`CLOUD_PROPERTY`]; `None` when no image carries it.
    pub mean_cloud_pct: Option<f64>,
    pub image_count: u64,
    pub area_m2: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Period {
    pub start: String,
    pub end: String,
}

/// Response payload of `POST /calculate-ndvi`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NdviReport {
    pub ndvi_mean: f64,
    pub ndvi_std: f64,
    pub ndvi_time_series: Vec<SeriesPoint>,
    pub cloud_coverage_pct: f64,
    pub image_count: u64,
    pub period: Period,
    pub area_ha: f64,
}

impl NdviReport {
    #[must_use]
    pub fn compose(observation: NdviObservation, request: &NdviRequest) -> Self {
        Self {
            ndvi_mean: round_index(observation.stats.number(MEAN_KEY).unwrap_or(0.0)),
            ndvi_std: round_index(observation.stats.number(STD_DEV_KEY).unwrap_or(0.0)),
            ndvi_time_series: time_series(observation.samples),
            cloud_coverage_pct: observation.mean_cloud_pct.map_or(0.0, round_quantity),
            image_count: observation.image_count,
            period: Period {
                start: request.start_date.clone(),
                end: request.end_date.clone(),
            },
            area_ha: round_quantity(square_meters_to_hectares(observation.area_m2)),
        }
    }
}
