//! Translation of port descriptions into Earth Engine value nodes.

use afolu_app::ports::imagery::{
    Collection, GeometryHandle, Image, NormalizedDifference, PropertyFilter, Reducer,
    SeriesRequest,
};
use afolu_domain::geometry::{GeometryInput, GeometryKind};
use afolu_domain::units::SQUARE_METERS_PER_HECTARE;
use serde_json::Value;

use crate::expr::{Expression, argument, array, call, constant, dictionary, nullary};

/// Pixel budget for every region reduction.
pub const MAX_PIXELS: f64 = 1e9;

/// Start time property used by date filters.
const TIME_START: &str = "system:time_start";

/// Lambda parameter name for per-image functions.
const IMAGE_VAR: &str = "_MAPPING_VAR_0_0";

fn constructor(kind: GeometryKind) -> &'static str {
    match kind {
        GeometryKind::Point => "GeometryConstructors.Point",
        GeometryKind::MultiPoint => "GeometryConstructors.MultiPoint",
        GeometryKind::LineString => "GeometryConstructors.LineString",
        GeometryKind::MultiLineString => "GeometryConstructors.MultiLineString",
        GeometryKind::Polygon => "GeometryConstructors.Polygon",
        GeometryKind::MultiPolygon => "GeometryConstructors.MultiPolygon",
        GeometryKind::GeometryCollection => "GeometryConstructors.MultiGeometry",
    }
}

/// A checked GeoJSON geometry as a constructor call.
#[must_use]
pub fn geometry(handle: &GeometryHandle) -> Value {
    let object = handle.input().as_object();
    if handle.kind() == GeometryKind::GeometryCollection {
        let members = object
            .get("geometries")
            .and_then(Value::as_array)
            .map(|members| {
                members
                    .iter()
                    .filter_map(Value::as_object)
                    .filter_map(|member| {
                        let input = GeometryInput::new(member.clone());
                        let kind = input.check().ok()?;
                        Some(geometry(&GeometryHandle::new(input, kind)))
                    })
                    .collect()
            })
            .unwrap_or_default();
        return call(constructor(handle.kind()), [("geometries", array(members))]);
    }
    let coordinates = handle.input().coordinates().cloned().unwrap_or(Value::Null);
    call(constructor(handle.kind()), [("coordinates", constant(coordinates))])
}

fn filter(collection: Value, predicate: Value) -> Value {
    call(
        "Collection.filter",
        [("collection", collection), ("filter", predicate)],
    )
}

/// A filtered image collection.
#[must_use]
pub fn collection(description: &Collection) -> Value {
    let mut node = call(
        "ImageCollection.load",
        [("id", constant(description.id.as_str()))],
    );
    if let Some(bounds) = &description.bounds {
        node = filter(
            node,
            call(
                "Filter.intersects",
                [
                    ("leftField", constant(".all")),
                    ("rightValue", geometry(bounds)),
                ],
            ),
        );
    }
    if let Some(dates) = &description.dates {
        let range = call(
            "DateRange",
            [
                ("start", constant(dates.start.as_str())),
                ("end", constant(dates.end.as_str())),
            ],
        );
        node = filter(
            node,
            call(
                "Filter.dateRangeContains",
                [("leftValue", range), ("rightField", constant(TIME_START))],
            ),
        );
    }
    for predicate in &description.filters {
        let PropertyFilter::LessThan { property, value } = predicate;
        node = filter(
            node,
            call(
                "Filter.lessThan",
                [
                    ("leftField", constant(property.as_str())),
                    ("rightValue", constant(*value)),
                ],
            ),
        );
    }
    node
}

fn select(image: Value, bands: &[&str]) -> Value {
    call(
        "Image.select",
        [("input", image), ("bandSelectors", constant(bands))],
    )
}

fn index_of(image: Value, index: &NormalizedDifference) -> Value {
    let difference = call(
        "Image.normalizedDifference",
        [
            ("input", image),
            (
                "bandNames",
                constant(vec![index.first.as_str(), index.second.as_str()]),
            ),
        ],
    );
    call(
        "Image.rename",
        [("input", difference), ("names", constant(vec![index.name.as_str()]))],
    )
}

/// The collection with `index` replacing every image's bands.
fn map_index(expr: &mut Expression, scenes: &Collection, index: &NormalizedDifference) -> Value {
    let body = index_of(argument(IMAGE_VAR), index);
    let mapper = expr.function(IMAGE_VAR, body);
    call(
        "Collection.map",
        [("collection", collection(scenes)), ("baseAlgorithm", mapper)],
    )
}

/// An image description as a node.
pub fn image(expr: &mut Expression, description: &Image) -> Value {
    match description {
        Image::CollectionMean {
            collection: scenes,
            bands,
        } => {
            let bands: Vec<&str> = bands.iter().map(String::as_str).collect();
            let mean = call("reduce.mean", [("collection", collection(scenes))]);
            select(mean, &bands)
        }
        Image::IndexMean {
            collection: scenes,
            index,
        } => {
            let indexed = map_index(expr, scenes, index);
            call("reduce.mean", [("collection", indexed)])
        }
        Image::FirstWithPixelArea {
            collection: scenes,
            clip,
        } => {
            let first = call("Collection.first", [("collection", collection(scenes))]);
            let clipped = call(
                "Image.clip",
                [("input", first), ("geometry", geometry(clip))],
            );
            let hectares = call(
                "Image.divide",
                [
                    ("image1", nullary("Image.pixelArea")),
                    (
                        "image2",
                        call(
                            "Image.constant",
                            [("value", constant(SQUARE_METERS_PER_HECTARE))],
                        ),
                    ),
                ],
            );
            call(
                "Image.addBands",
                [("dstImg", clipped), ("srcImg", hectares)],
            )
        }
    }
}

#[must_use]
pub fn reducer(description: &Reducer) -> Value {
    match description {
        Reducer::Mean => nullary("Reducer.mean"),
        Reducer::MeanAndStdDev => call(
            "Reducer.combine",
            [
                ("reducer1", nullary("Reducer.mean")),
                ("reducer2", nullary("Reducer.stdDev")),
                ("sharedInputs", constant(true)),
            ],
        ),
        Reducer::GroupedSum {
            group_field,
            group_name,
        } => call(
            "Reducer.group",
            [
                ("reducer", nullary("Reducer.sum")),
                ("groupField", constant(*group_field)),
                ("groupName", constant(group_name.as_str())),
            ],
        ),
    }
}

/// `Image.reduceRegion` over `region` at `scale`.
#[must_use]
pub fn reduce_region(image: Value, region: &GeometryHandle, reducer: Value, scale: f64) -> Value {
    call(
        "Image.reduceRegion",
        [
            ("image", image),
            ("reducer", reducer),
            ("geometry", geometry(region)),
            ("scale", constant(scale)),
            ("maxPixels", constant(MAX_PIXELS)),
        ],
    )
}

/// A feature collection with one `{date, ndvi, cloud_pct}` feature per image.
pub fn series(expr: &mut Expression, request: &SeriesRequest) -> Value {
    let index_name = request.index.name.as_str();
    let scene = argument(IMAGE_VAR);
    let mean = reduce_region(
        index_of(scene.clone(), &request.index),
        &request.geometry,
        nullary("Reducer.mean"),
        request.scale,
    );
    let properties = dictionary([
        (
            "date",
            call(
                "Date.format",
                [
                    ("date", call("Image.date", [("image", scene.clone())])),
                    ("format", constant(request.date_format.as_str())),
                ],
            ),
        ),
        (
            "ndvi",
            call(
                "Dictionary.get",
                [("dictionary", mean), ("key", constant(index_name))],
            ),
        ),
        (
            "cloud_pct",
            call(
                "Element.get",
                [
                    ("object", scene),
                    ("property", constant(request.property.as_str())),
                ],
            ),
        ),
    ]);
    let feature = call(
        "Feature",
        [("geometry", constant(Value::Null)), ("metadata", properties)],
    );
    let mapper = expr.function(IMAGE_VAR, feature);
    call(
        "Collection.map",
        [
            ("collection", collection(&request.collection)),
            ("baseAlgorithm", mapper),
        ],
    )
}
