//! GeoJSON geometry input and its structural checks.
//!
//! The request validator only checks that `geometry` is a JSON object.
//! Whether the shape is acceptable is decided when the imagery platform
//! constructs it. [`GeometryInput::check`] parses the members with `geojson`
//! and adds the rules platforms apply client-side before anything is sent
//! over the wire.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::GeometryError;

/// Supported GeoJSON geometry types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
    Point,
    MultiPoint,
    LineString,
    MultiLineString,
    Polygon,
    MultiPolygon,
    GeometryCollection,
}

impl GeometryKind {
    /// The GeoJSON `type` member for this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Point => "Point",
            Self::MultiPoint => "MultiPoint",
            Self::LineString => "LineString",
            Self::MultiLineString => "MultiLineString",
            Self::Polygon => "Polygon",
            Self::MultiPolygon => "MultiPolygon",
            Self::GeometryCollection => "GeometryCollection",
        }
    }

    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "Point" => Self::Point,
            "MultiPoint" => Self::MultiPoint,
            "LineString" => Self::LineString,
            "MultiLineString" => Self::MultiLineString,
            "Polygon" => Self::Polygon,
            "MultiPolygon" => Self::MultiPolygon,
            "GeometryCollection" => Self::GeometryCollection,
            _ => return None,
        })
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A GeoJSON-shaped geometry exactly as the caller sent it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct GeometryInput(Map<String, Value>);

impl GeometryInput {
    /// Wrap a JSON object. Shape is not checked here.
    #[must_use]
    pub fn new(object: Map<String, Value>) -> Self {
        Self(object)
    }

    /// Borrow the raw GeoJSON members.
    #[must_use]
    pub fn as_object(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Clone into a [`Value`], e.g. to embed in a platform request.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    /// The `coordinates` member, if any.
    #[must_use]
    pub fn coordinates(&self) -> Option<&Value> {
        self.0.get("coordinates")
    }

    /// Check the GeoJSON structure and return its kind.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError`] for an unknown type, members that do not
    /// parse as GeoJSON, positions with the wrong arity, or polygon rings
    /// that are too short or not closed.
    pub fn check(&self) -> Result<GeometryKind, GeometryError> {
        self.parse().map(|(kind, _)| kind)
    }

    /// Convert into a [`geo_types::Geometry`] for planar or geodesic maths.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError`] when [`check`](Self::check) would.
    pub fn to_geo(&self) -> Result<geo_types::Geometry<f64>, GeometryError> {
        let (kind, geometry) = self.parse()?;
        geo_types::Geometry::try_from(geometry).map_err(|err| GeometryError::Malformed {
            kind: kind.as_str(),
            reason: err.to_string(),
        })
    }

    fn parse(&self) -> Result<(GeometryKind, geojson::Geometry), GeometryError> {
        let name = self
            .0
            .get("type")
            .and_then(Value::as_str)
            .ok_or(GeometryError::MissingType)?;
        let kind = GeometryKind::parse(name)
            .ok_or_else(|| GeometryError::UnsupportedType(name.to_string()))?;
        let geometry = geojson::Geometry::from_json_object(self.0.clone()).map_err(|err| {
            GeometryError::Malformed {
                kind: kind.as_str(),
                reason: err.to_string(),
            }
        })?;
        check_value(&geometry.value)?;
        Ok((kind, geometry))
    }
}

fn kind_of(value: &geojson::Value) -> GeometryKind {
    match value {
        geojson::Value::Point(_) => GeometryKind::Point,
        geojson::Value::MultiPoint(_) => GeometryKind::MultiPoint,
        geojson::Value::LineString(_) => GeometryKind::LineString,
        geojson::Value::MultiLineString(_) => GeometryKind::MultiLineString,
        geojson::Value::Polygon(_) => GeometryKind::Polygon,
        geojson::Value::MultiPolygon(_) => GeometryKind::MultiPolygon,
        geojson::Value::GeometryCollection(_) => GeometryKind::GeometryCollection,
    }
}

/// Rules the GeoJSON parser leaves to the consumer.
fn check_value(value: &geojson::Value) -> Result<(), GeometryError> {
    let invalid = |reason: &'static str| GeometryError::InvalidCoordinates {
        kind: kind_of(value).as_str(),
        reason,
    };
    match value {
        geojson::Value::Point(position) => check_position(position).map_err(invalid),
        geojson::Value::MultiPoint(positions) => positions
            .iter()
            .try_for_each(|position| check_position(position))
            .map_err(invalid),
        geojson::Value::LineString(line) => check_line(line).map_err(invalid),
        geojson::Value::MultiLineString(lines) => lines
            .iter()
            .try_for_each(|line| check_line(line))
            .map_err(invalid),
        geojson::Value::Polygon(rings) => check_polygon(rings).map_err(invalid),
        geojson::Value::MultiPolygon(polygons) => polygons
            .iter()
            .try_for_each(|rings| check_polygon(rings))
            .map_err(invalid),
        geojson::Value::GeometryCollection(members) => members
            .iter()
            .try_for_each(|member| check_value(&member.value)),
    }
}

fn check_position(axes: &[f64]) -> Result<(), &'static str> {
    if !(2..=3).contains(&axes.len()) {
        return Err("position must have 2 or 3 numbers");
    }
    if !axes.iter().all(|axis| axis.is_finite()) {
        return Err("position members must be finite numbers");
    }
    Ok(())
}

fn check_line(positions: &[Vec<f64>]) -> Result<(), &'static str> {
    if positions.len() < 2 {
        return Err("line must have at least 2 positions");
    }
    positions.iter().try_for_each(|position| check_position(position))
}

fn check_polygon(rings: &[Vec<Vec<f64>>]) -> Result<(), &'static str> {
    if rings.is_empty() {
        return Err("polygon must have at least one ring");
    }
    for ring in rings {
        if ring.len() < 4 {
            return Err("ring must have at least 4 positions");
        }
        ring.iter().try_for_each(|position| check_position(position))?;
        if ring.first() != ring.last() {
            return Err("ring must be closed");
        }
    }
    Ok(())
}
