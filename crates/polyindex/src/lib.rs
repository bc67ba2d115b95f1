//! Interior point-in-polygon lookups over a fixed set of keyed multi-polygons.
//!
//! Containment is strict: a point lying on a polygon's boundary is *not*
//! contained by it. Overlapping polygons are allowed, so a point may be
//! contained by zero, one or several entries.
use geo::coordinate_position::{CoordPos, CoordinatePosition};
use geo::{BoundingRect, MultiPolygon, Point};
use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{RTree, AABB};

/// Bounding rectangle of an indexed shape, tagged with its position.
type Envelope = GeomWithData<Rectangle<[f64; 2]>, usize>;

/// Returns true if `point` lies in the interior of `shape` (boundary excluded).
#[inline]
pub fn contains_interior(shape: &MultiPolygon<f64>, point: &Point<f64>) -> bool {
    shape.coordinate_position(&point.0) == CoordPos::Inside
}

/// Returns true if `point` lies in the interior of `shape` or on its boundary.
#[inline]
pub fn covers(shape: &MultiPolygon<f64>, point: &Point<f64>) -> bool {
    shape.coordinate_position(&point.0) != CoordPos::Outside
}

/// A collection of keyed multi-polygons indexed by bounding box.
#[derive(Debug, Clone)]
pub struct PolygonIndex<K> {
    keys: Vec<K>,
    shapes: Vec<MultiPolygon<f64>>,
    rtree: RTree<Envelope>,
}

impl<K> PolygonIndex<K> {
    /// Build an index from `(key, shape)` pairs. Empty shapes are kept but never match.
    pub fn new(items: impl IntoIterator<Item = (K, MultiPolygon<f64>)>) -> Self {
        let (keys, shapes): (Vec<K>, Vec<MultiPolygon<f64>>) = items.into_iter().unzip();
        let rtree = RTree::bulk_load(
            shapes.iter().enumerate()
                .filter_map(|(i, shape)| {
                    let rect = shape.bounding_rect()?;
                    Some(Envelope::new(Rectangle::from_corners(rect.min().into(), rect.max().into()), i))
                })
                .collect()
        );

        Self { keys, shapes, rtree }
    }

    /// Get the number of indexed shapes.
    #[inline] pub fn len(&self) -> usize { self.shapes.len() }

    /// Check if the index holds no shapes.
    #[inline] pub fn is_empty(&self) -> bool { self.shapes.is_empty() }

    /// Iterate over all keys in insertion order.
    #[inline] pub fn keys(&self) -> impl Iterator<Item = &K> { self.keys.iter() }

    /// Positions of the shapes whose interior contains `point`, in insertion order.
    pub fn containing_positions(&self, point: &Point<f64>) -> Vec<usize> {
        let envelope = AABB::from_point([point.x(), point.y()]);
        let mut hits: Vec<usize> = self.rtree.locate_in_envelope_intersecting(&envelope)
            .map(|envelope| envelope.data)
            .filter(|&idx| contains_interior(&self.shapes[idx], point))
            .collect();

        // R-tree traversal order is unspecified; callers rely on a stable order.
        hits.sort_unstable();
        hits
    }

    /// Keys of the shapes whose interior contains `point`, in insertion order.
    pub fn containing(&self, point: &Point<f64>) -> Vec<&K> {
        self.containing_positions(point).into_iter()
            .map(|idx| &self.keys[idx])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, MultiPolygon};

    fn unit_square() -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![(x: 0.0, y: 0.0), (x: 0.0, y: 1.0), (x: 1.0, y: 1.0), (x: 1.0, y: 0.0), (x: 0.0, y: 0.0)]])
    }

    #[test]
    fn interior_point_is_contained() {
        assert!(contains_interior(&unit_square(), &Point::new(0.5, 0.5)));
    }

    #[test]
    fn edge_and_vertex_points_are_not_contained() {
        let square = unit_square();
        assert!(!contains_interior(&square, &Point::new(0.0, 0.5)));
        assert!(!contains_interior(&square, &Point::new(1.0, 1.0)));
        assert!(!contains_interior(&square, &Point::new(0.5, 0.0)));
    }

    #[test]
    fn boundary_points_are_covered() {
        let square = unit_square();
        assert!(covers(&square, &Point::new(0.0, 0.5)));
        assert!(covers(&square, &Point::new(1.0, 1.0)));
        assert!(covers(&square, &Point::new(0.5, 0.5)));
        assert!(!covers(&square, &Point::new(1.5, 0.5)));
    }

    #[test]
    fn exterior_point_is_not_contained() {
        assert!(!contains_interior(&unit_square(), &Point::new(1.5, 0.5)));
    }

    #[test]
    fn empty_index() {
        let index: PolygonIndex<&str> = PolygonIndex::new(Vec::new());
        assert!(index.is_empty());
        assert!(index.containing(&Point::new(0.0, 0.0)).is_empty());
    }

    #[test]
    fn empty_shape_never_matches() {
        let index = PolygonIndex::new(vec![("empty", MultiPolygon::<f64>(vec![])), ("square", unit_square())]);
        assert_eq!(index.len(), 2);
        assert_eq!(index.containing(&Point::new(0.5, 0.5)), vec![&"square"]);
    }
}
