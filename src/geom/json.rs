use geo::{Coord, Geometry, LineString, MultiPoint, MultiPolygon, Point, Polygon};
use serde_json::Value;

use super::GeometryError;

/// Parse a GeoJSON geometry object. `null` geometries yield `None`.
/// Only point and polygon families are meaningful for polling data; other types yield `None`.
pub(crate) fn parse_geometry(value: &Value) -> Result<Option<Geometry<f64>>, GeometryError> {
    if value.is_null() {
        return Ok(None);
    }
    let coords = value.get("coordinates");
    let geometry: Geometry<f64> = match (value["type"].as_str(), coords) {
        (Some("Point"), Some(c)) => parse_point(c)?.into(),
        (Some("MultiPoint"), Some(c)) => MultiPoint(
            as_array(c)?.iter().map(parse_point).collect::<Result<Vec<_>, _>>()?
        ).into(),
        (Some("Polygon"), Some(c)) => parse_polygon(c)?.into(),
        (Some("MultiPolygon"), Some(c)) => MultiPolygon(
            as_array(c)?.iter().map(parse_polygon).collect::<Result<Vec<_>, _>>()?
        ).into(),
        (Some("Point" | "MultiPoint" | "Polygon" | "MultiPolygon"), None) => {
            return Err(GeometryError::MalformedCoordinates("geometry has no coordinates".into()));
        }
        _ => return Ok(None),
    };
    Ok(Some(geometry))
}

fn as_array(value: &Value) -> Result<&Vec<Value>, GeometryError> {
    value.as_array()
        .ok_or_else(|| GeometryError::MalformedCoordinates(format!("expected an array, found {value}")))
}

/// Parse a position: [x, y] or [x, y, z].
fn parse_coord(value: &Value) -> Result<Coord<f64>, GeometryError> {
    match as_array(value)?.as_slice() {
        [x, y, ..] => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => Ok(Coord { x, y }),
            _ => Err(GeometryError::MalformedCoordinates(format!("non-numeric position {value}"))),
        },
        _ => Err(GeometryError::MalformedCoordinates(format!("position needs two values, found {value}"))),
    }
}

fn parse_point(value: &Value) -> Result<Point<f64>, GeometryError> {
    parse_coord(value).map(Point::from)
}

/// Parse a ring, closing it if the source left it open.
fn parse_ring(value: &Value) -> Result<LineString<f64>, GeometryError> {
    let mut points = as_array(value)?.iter().map(parse_coord).collect::<Result<Vec<_>, _>>()?;

    // Ensure ring is closed (first point == last point)
    if let (Some(&first), Some(&last)) = (points.first(), points.last()) {
        if first != last {
            points.push(first);
        }
    }

    Ok(LineString(points))
}

/// Parse polygon coordinates: exterior ring followed by any holes.
fn parse_polygon(value: &Value) -> Result<Polygon<f64>, GeometryError> {
    let mut rings = as_array(value)?.iter().map(parse_ring);
    let exterior = rings.next()
        .ok_or_else(|| GeometryError::MalformedCoordinates("polygon has no exterior ring".into()))??;
    Ok(Polygon::new(exterior, rings.collect::<Result<Vec<_>, _>>()?))
}
