use geo::{Coord, MapCoords, MultiPolygon, Point};
use proj4rs::{proj::Proj as Proj4, transform::transform};

use super::GeometryError;

/// PROJ.4 definition for an EPSG code, and whether it is a lon/lat system.
fn proj4_for_epsg(epsg: u32) -> Result<(&'static str, bool), GeometryError> {
    match epsg {
        4326 => Ok(("+proj=longlat +datum=WGS84 +no_defs +type=crs", true)),
        4258 => Ok(("+proj=longlat +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +no_defs +type=crs", true)),
        // OSGB36 / British National Grid
        27700 => Ok((
            "+proj=tmerc +lat_0=49 +lon_0=-2 +k=0.9996012717 +x_0=400000 +y_0=-100000 +ellps=airy \
             +towgs84=446.448,-125.157,542.06,0.15,0.247,0.842,-20.489 +units=m +no_defs +type=crs",
            false,
        )),
        // TM65 / Irish Grid, used by Northern Ireland exports
        29902 => Ok((
            "+proj=tmerc +lat_0=53.5 +lon_0=-8 +k=1.000035 +x_0=200000 +y_0=250000 +ellps=mod_airy \
             +towgs84=482.5,-130.6,564.6,-1.042,-0.214,-0.631,8.15 +units=m +no_defs +type=crs",
            false,
        )),
        3857 => Ok((
            "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +no_defs +type=crs",
            false,
        )),
        other => Err(GeometryError::UnsupportedSrid(other)),
    }
}

/// Coordinate transform between two EPSG spatial references.
pub(crate) struct Reprojector {
    from_epsg: u32,
    to_epsg: u32,
    from: Proj4,
    to: Proj4,
    from_geographic: bool,
    to_geographic: bool,
}

impl std::fmt::Debug for Reprojector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Reprojector(EPSG:{} -> EPSG:{})", self.from_epsg, self.to_epsg)
    }
}

impl Reprojector {
    /// Build a transform from `from` to `to`; `None` when they are the same reference.
    pub(crate) fn between(from: u32, to: u32) -> Result<Option<Self>, GeometryError> {
        if from == to {
            return Ok(None);
        }

        let build = |epsg: u32| -> Result<(Proj4, bool), GeometryError> {
            let (definition, geographic) = proj4_for_epsg(epsg)?;
            let proj = Proj4::from_proj_string(definition)
                .map_err(|e| GeometryError::Reprojection { from, to, reason: format!("EPSG:{epsg}: {e}") })?;
            Ok((proj, geographic))
        };
        let (from_proj, from_geographic) = build(from)?;
        let (to_proj, to_geographic) = build(to)?;

        Ok(Some(Self { from_epsg: from, to_epsg: to, from: from_proj, to: to_proj, from_geographic, to_geographic }))
    }

    fn coord(&self, coord: Coord<f64>) -> Result<Coord<f64>, GeometryError> {
        // Lon/lat systems take and produce radians.
        let mut point = if self.from_geographic {
            (coord.x.to_radians(), coord.y.to_radians(), 0.0)
        } else {
            (coord.x, coord.y, 0.0)
        };
        transform(&self.from, &self.to, &mut point)
            .map_err(|e| GeometryError::Reprojection { from: self.from_epsg, to: self.to_epsg, reason: e.to_string() })?;

        Ok(if self.to_geographic {
            Coord { x: point.0.to_degrees(), y: point.1.to_degrees() }
        } else {
            Coord { x: point.0, y: point.1 }
        })
    }

    pub(crate) fn point(&self, point: Point<f64>) -> Result<Point<f64>, GeometryError> {
        self.coord(point.0).map(Point::from)
    }

    pub(crate) fn multipolygon(&self, shape: &MultiPolygon<f64>) -> Result<MultiPolygon<f64>, GeometryError> {
        shape.try_map_coords(|coord| self.coord(coord))
    }
}

/// Reproject a point from `from` to `to` (no-op when equal).
pub fn reproject_point(point: Point<f64>, from: u32, to: u32) -> Result<Point<f64>, GeometryError> {
    match Reprojector::between(from, to)? {
        Some(reprojector) => reprojector.point(point),
        None => Ok(point),
    }
}

/// Reproject a multi-polygon from `from` to `to` (no-op when equal).
pub fn reproject_multipolygon(shape: MultiPolygon<f64>, from: u32, to: u32) -> Result<MultiPolygon<f64>, GeometryError> {
    match Reprojector::between(from, to)? {
        Some(reprojector) => reprojector.multipolygon(&shape),
        None => Ok(shape),
    }
}
