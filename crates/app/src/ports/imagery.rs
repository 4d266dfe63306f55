//! Imagery platform port: the narrow capability set the analyses rely on.
//!
//! Collections and images are *descriptions*: building a [`Collection`] or an
//! [`Image`] performs no IO. Only the [`ImageryPlatform`] methods talk to the
//! platform, and each one is a single round trip.

use std::future::Future;

use afolu_domain::error::AnalysisError;
use afolu_domain::geometry::{GeometryInput, GeometryKind};
use afolu_domain::ndvi::SceneSample;
use afolu_domain::statistics::RawStatistics;

/// A geometry the platform has accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryHandle {
    input: GeometryInput,
    kind: GeometryKind,
}

impl GeometryHandle {
    /// Only platforms should construct handles, after checking the shape.
    #[must_use]
    pub fn new(input: GeometryInput, kind: GeometryKind) -> Self {
        Self { input, kind }
    }

    #[must_use]
    pub fn input(&self) -> &GeometryInput {
        &self.input
    }

    #[must_use]
    pub fn kind(&self) -> GeometryKind {
        self.kind
    }
}

/// Half-open `[start, end)` date range, ISO strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

/// Metadata predicate applied to every image of a collection.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyFilter {
    /// Keep images whose `property` is strictly less than `value`.
    LessThan { property: String, value: f64 },
}

/// A lazily filtered image collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    pub id: String,
    pub bounds: Option<GeometryHandle>,
    pub dates: Option<DateRange>,
    pub filters: Vec<PropertyFilter>,
}

impl Collection {
    /// Refer to a platform collection by id, unfiltered.
    #[must_use]
    pub fn load(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            bounds: None,
            dates: None,
            filters: Vec::new(),
        }
    }

    /// Keep images intersecting `geometry`.
    #[must_use]
    pub fn filter_bounds(mut self, geometry: &GeometryHandle) -> Self {
        self.bounds = Some(geometry.clone());
        self
    }

    /// Keep images captured in `[start, end)`.
    #[must_use]
    pub fn filter_date(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.dates = Some(DateRange {
            start: start.into(),
            end: end.into(),
        });
        self
    }

    /// Keep images whose `property` is strictly less than `value`.
    #[must_use]
    pub fn filter_less_than(mut self, property: impl Into<String>, value: f64) -> Self {
        self.filters.push(PropertyFilter::LessThan {
            property: property.into(),
            value,
        });
        self
    }
}

/// `(first - second) / (first + second)`, renamed to `name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedDifference {
    pub first: String,
    pub second: String,
    pub name: String,
}

/// An image to reduce over a region.
#[derive(Debug, Clone, PartialEq)]
pub enum Image {
    /// Per-pixel temporal mean of `bands` across the collection.
    CollectionMean {
        collection: Collection,
        bands: Vec<String>,
    },
    /// Per-pixel temporal mean of an index computed on every image.
    IndexMean {
        collection: Collection,
        index: NormalizedDifference,
    },
    /// First image of the collection clipped to `clip`, with a pixel-area
    /// band (in hectares) appended after its own bands.
    FirstWithPixelArea {
        collection: Collection,
        clip: GeometryHandle,
    },
}

/// How pixels are aggregated by [`ImageryPlatform::reduce_region`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reducer {
    /// Mean of every band, keyed by band name.
    Mean,
    /// Mean and standard deviation over shared inputs, keyed
    /// `<band>_mean` and `<band>_stdDev`.
    MeanAndStdDev,
    /// Sum of the last band grouped by the integer value of band
    /// `group_field`, returned under `groups` as `[{<group_name>, sum}]`.
    GroupedSum {
        group_field: u32,
        group_name: String,
    },
}

/// Per-image areal mean of an index, with capture date and one property.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesRequest {
    pub collection: Collection,
    pub index: NormalizedDifference,
    pub geometry: GeometryHandle,
    pub scale: f64,
    /// Date pattern in the platform's syntax, e.g. `YYYY-MM-dd`.
    pub date_format: String,
    /// Image property reported alongside each sample.
    pub property: String,
}

/// The external imagery analysis platform.
///
/// Implementations live in adapter crates (`adapter_earth_engine`,
/// `adapter_virtual`). Every method fails with
/// [`AnalysisError::Platform`] for transport or platform errors.
pub trait ImageryPlatform: Send + Sync {
    /// Construct a platform geometry from GeoJSON.
    ///
    /// Fails with [`AnalysisError::Geometry`] when the shape is rejected.
    fn geometry(
        &self,
        input: &GeometryInput,
    ) -> impl Future<Output = Result<GeometryHandle, AnalysisError>> + Send;

    /// Geodesic area of a geometry in square metres.
    fn area(
        &self,
        geometry: &GeometryHandle,
    ) -> impl Future<Output = Result<f64, AnalysisError>> + Send;

    /// Reduce `image` over `geometry` at `scale` metres per pixel.
    fn reduce_region(
        &self,
        image: &Image,
        geometry: &GeometryHandle,
        reducer: &Reducer,
        scale: f64,
    ) -> impl Future<Output = Result<RawStatistics, AnalysisError>> + Send;

    /// Number of images left after filtering.
    fn collection_size(
        &self,
        collection: &Collection,
    ) -> impl Future<Output = Result<u64, AnalysisError>> + Send;

    /// Mean of an image property across the collection, `None` when no image
    /// carries it.
    fn aggregate_mean(
        &self,
        collection: &Collection,
        property: &str,
    ) -> impl Future<Output = Result<Option<f64>, AnalysisError>> + Send;

    /// One sample per image of `request.collection`, in platform order.
    fn sample_series(
        &self,
        request: &SeriesRequest,
    ) -> impl Future<Output = Result<Vec<SceneSample>, AnalysisError>> + Send;
}
