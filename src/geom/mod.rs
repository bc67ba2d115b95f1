//! Geometry conversion, validation and reprojection for source records.
mod json;
mod proj;
mod shape;

use geo::{Area, BooleanOps, Centroid, Geometry, MultiPolygon, Point};
use thiserror::Error;

pub(crate) use json::parse_geometry;
pub(crate) use proj::Reprojector;
pub use proj::{reproject_multipolygon, reproject_point};
pub(crate) use shape::shape_to_geometry;

/// Problems found in source geometry. These are surfaced, never repaired.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("malformed coordinates: {0}")]
    MalformedCoordinates(String),
    #[error("invalid polygon: {0}")]
    InvalidPolygon(String),
    #[error("unsupported spatial reference EPSG:{0}")]
    UnsupportedSrid(u32),
    #[error("reprojection from EPSG:{from} to EPSG:{to} failed: {reason}")]
    Reprojection { from: u32, to: u32, reason: String },
}

/// Normalize an areal geometry to a multi-polygon. Non-areal geometries yield `None`.
pub(crate) fn to_multipolygon(geometry: Geometry<f64>) -> Option<MultiPolygon<f64>> {
    match geometry {
        Geometry::Polygon(p) => Some(MultiPolygon(vec![p])),
        Geometry::MultiPolygon(mp) => Some(mp),
        _ => None,
    }
}

/// A station location derived from source geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum StationPoint {
    /// The geometry was a single point.
    Exact(Point<f64>),
    /// The geometry was reduced to its centroid, losing its extent.
    Centroid(Point<f64>),
}

/// Reduce a station geometry to a single point.
pub(crate) fn station_point(geometry: &Geometry<f64>) -> Option<StationPoint> {
    match geometry {
        Geometry::Point(p) => Some(StationPoint::Exact(*p)),
        Geometry::MultiPoint(mp) if mp.0.len() == 1 => Some(StationPoint::Exact(mp.0[0])),
        other => other.centroid().map(StationPoint::Centroid),
    }
}

/// Reject polygons that cannot take part in area computations.
pub(crate) fn validate_multipolygon(shape: &MultiPolygon<f64>) -> Result<(), GeometryError> {
    if shape.0.is_empty() {
        return Err(GeometryError::InvalidPolygon("empty geometry".into()));
    }
    for (i, polygon) in shape.0.iter().enumerate() {
        for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
            if ring.0.len() < 4 {
                return Err(GeometryError::InvalidPolygon(format!("polygon {i} has a ring with {} points", ring.0.len())));
            }
            if ring.0.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
                return Err(GeometryError::InvalidPolygon(format!("polygon {i} has non-finite coordinates")));
            }
        }
        if polygon.exterior().0.windows(2).all(|w| w[0] == w[1]) {
            return Err(GeometryError::InvalidPolygon(format!("polygon {i} is degenerate")));
        }
    }
    if shape.unsigned_area() == 0.0 {
        return Err(GeometryError::InvalidPolygon("zero area".into()));
    }
    Ok(())
}

/// Percentage of `shape`'s area lying inside `boundary`, in `[0, 100]`.
pub fn overlap_percentage(shape: &MultiPolygon<f64>, boundary: &MultiPolygon<f64>) -> Result<f64, GeometryError> {
    validate_multipolygon(shape)?;
    validate_multipolygon(boundary)?;

    let inside = shape.intersection(boundary).unsigned_area();
    Ok((inside / shape.unsigned_area() * 100.0).clamp(0.0, 100.0))
}
