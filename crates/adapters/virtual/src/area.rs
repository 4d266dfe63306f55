//! Geodesic area of GeoJSON geometries on the WGS84 ellipsoid.

use afolu_domain::error::GeometryError;
use afolu_domain::geometry::GeometryInput;
use geo::algorithm::orient::{Direction, Orient};
use geo::{GeodesicArea, Geometry};

/// Area in square metres. Points and lines have none.
pub(crate) fn geometry_area(input: &GeometryInput) -> Result<f64, GeometryError> {
    Ok(measure(&input.to_geo()?))
}

// Unsigned geodesic area of a clockwise exterior is the rest of the globe,
// so polygons are oriented first.
fn measure(geometry: &Geometry<f64>) -> f64 {
    match geometry {
        Geometry::Polygon(polygon) => polygon
            .orient(Direction::Default)
            .geodesic_area_unsigned(),
        Geometry::MultiPolygon(polygons) => polygons
            .orient(Direction::Default)
            .geodesic_area_unsigned(),
        Geometry::GeometryCollection(members) => members.iter().map(measure).sum(),
        _ => 0.0,
    }
}
