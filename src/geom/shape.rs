use geo::{Coord, Geometry, LineString, MultiPoint, MultiPolygon, Point, Polygon};
use shapefile::{PolygonRing, Shape};

/// Convert a shapefile shape into a `geo` geometry.
/// Null shapes and shape kinds with no polling meaning (lines, patches) yield `None`.
pub(crate) fn shape_to_geometry(shape: Shape) -> Option<Geometry<f64>> {
    match shape {
        Shape::Point(p) => Some(Point::new(p.x, p.y).into()),
        Shape::PointM(p) => Some(Point::new(p.x, p.y).into()),
        Shape::PointZ(p) => Some(Point::new(p.x, p.y).into()),
        Shape::Multipoint(mp) => Some(MultiPoint(mp.points().iter().map(|p| Point::new(p.x, p.y)).collect()).into()),
        Shape::MultipointM(mp) => Some(MultiPoint(mp.points().iter().map(|p| Point::new(p.x, p.y)).collect()).into()),
        Shape::MultipointZ(mp) => Some(MultiPoint(mp.points().iter().map(|p| Point::new(p.x, p.y)).collect()).into()),
        Shape::Polygon(p) => Some(rings_to_multipolygon(p.rings(), |pt| Coord { x: pt.x, y: pt.y }).into()),
        Shape::PolygonM(p) => Some(rings_to_multipolygon(p.rings(), |pt| Coord { x: pt.x, y: pt.y }).into()),
        Shape::PolygonZ(p) => Some(rings_to_multipolygon(p.rings(), |pt| Coord { x: pt.x, y: pt.y }).into()),
        _ => None,
    }
}

/// Group shapefile rings into polygons: each outer ring owns the inner rings that follow it.
fn rings_to_multipolygon<P>(rings: &[PolygonRing<P>], xy: impl Fn(&P) -> Coord<f64>) -> MultiPolygon<f64> {
    /// Ensure first and last are the same for geo::LineString coords
    fn closed(mut coords: Vec<Coord<f64>>) -> LineString<f64> {
        if let (Some(&first), Some(&last)) = (coords.first(), coords.last()) {
            if first != last {
                coords.push(first);
            }
        }
        LineString(coords)
    }

    let mut polys: Vec<Polygon<f64>> = Vec::new();
    let mut current_exterior: Option<LineString<f64>> = None;
    let mut current_holes: Vec<LineString<f64>> = Vec::new();

    for ring in rings {
        let ls = closed(ring.points().iter().map(&xy).collect());
        match ring {
            PolygonRing::Outer(_) => {
                // flush previous polygon
                if let Some(ext) = current_exterior.take() {
                    polys.push(Polygon::new(ext, std::mem::take(&mut current_holes)));
                }
                current_exterior = Some(ls);
            }
            // A hole before any outer ring is a mis-wound exterior.
            PolygonRing::Inner(_) if current_exterior.is_none() => current_exterior = Some(ls),
            PolygonRing::Inner(_) => current_holes.push(ls),
        }
    }
    if let Some(ext) = current_exterior {
        polys.push(Polygon::new(ext, current_holes));
    }

    MultiPolygon(polys)
}
