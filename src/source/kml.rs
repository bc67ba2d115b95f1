use std::path::Path;

use geo::{Coord, Geometry, LineString, MultiPoint, MultiPolygon, Point, Polygon};
use log::warn;
use quick_xml::{escape::resolve_predefined_entity, events::Event, Reader};

use super::{archive, Fields, RawRecord, SourceError};

/// Read placemarks from a `.kml` file.
///
/// The first failed attempt is retried once: reads of freshly written KML
/// have been seen to fail spuriously and succeed on the second try.
pub(super) fn read_kml(path: &Path) -> Result<Vec<RawRecord>, SourceError> {
    parse_placemarks(path).or_else(|first| {
        warn!("Retrying KML read of {} after error: {first}", path.display());
        parse_placemarks(path)
    })
}

/// Read placemarks from the `doc.kml` packaged in a `.kmz` archive.
pub(super) fn read_kmz(path: &Path) -> Result<Vec<RawRecord>, SourceError> {
    // The parser reads from disk, so the document is unpacked to a scratch file first.
    let kml = archive::extract_member(path, "doc.kml")?;
    read_kml(kml.path())
}

/// Geometry and attributes gathered for the placemark being parsed.
#[derive(Default)]
struct PlacemarkBuilder {
    properties: Fields,
    points: Vec<Point<f64>>,
    polygons: Vec<Polygon<f64>>,
    outer: Option<LineString<f64>>,
    inners: Vec<LineString<f64>>,
    data_name: Option<String>,
}

impl PlacemarkBuilder {
    fn finish(self) -> RawRecord {
        let geometry = match (self.points.len(), self.polygons.len()) {
            (0, 0) => None,
            (1, 0) => self.points.into_iter().next().map(Geometry::Point),
            (_, 0) => Some(Geometry::MultiPoint(MultiPoint(self.points))),
            (0, 1) => self.polygons.into_iter().next().map(Geometry::Polygon),
            (0, _) => Some(Geometry::MultiPolygon(MultiPolygon(self.polygons))),
            // Mixed collections keep the areal part.
            _ => Some(Geometry::MultiPolygon(MultiPolygon(self.polygons))),
        };
        RawRecord::Feature { geometry, properties: self.properties }
    }
}

/// Parse a KML coordinate list: whitespace-separated `lon,lat[,alt]` tuples.
fn parse_coordinates(text: &str) -> Result<Vec<Coord<f64>>, String> {
    text.split_whitespace()
        .map(|tuple| {
            let mut parts = tuple.split(',').map(str::parse::<f64>);
            match (parts.next(), parts.next()) {
                (Some(Ok(x)), Some(Ok(y))) => Ok(Coord { x, y }),
                _ => Err(format!("bad coordinate tuple {tuple:?}")),
            }
        })
        .collect()
}

fn ring(coords: Vec<Coord<f64>>) -> LineString<f64> {
    let mut ring = LineString(coords);
    ring.close();
    ring
}

fn parse_placemarks(path: &Path) -> Result<Vec<RawRecord>, SourceError> {
    let xml_err = |source| SourceError::Kml { source, path: path.to_path_buf() };
    let mut reader = Reader::from_file(path).map_err(xml_err)?;

    let mut records = Vec::new();
    let mut stack: Vec<String> = Vec::new();
    let mut text = String::new();
    let mut placemark: Option<PlacemarkBuilder> = None;
    let mut buf = Vec::new();

    loop {
        let event = reader.read_event_into(&mut buf).map_err(xml_err)?;
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                text.clear();
                if name == "Placemark" {
                    placemark = Some(PlacemarkBuilder::default());
                }
                if let (Some(builder), "Data" | "SimpleData") = (placemark.as_mut(), name.as_str()) {
                    builder.data_name = e.attributes().flatten()
                        .find(|attr| attr.key.local_name().as_ref() == b"name")
                        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned());
                }
                if matches!(event, Event::Start(_)) {
                    stack.push(name);
                } else {
                    close_element(&name, &stack, "", &mut placemark, &mut records, path)?;
                }
            }
            Event::Text(ref t) => text.push_str(&String::from_utf8_lossy(t)),
            Event::CData(ref t) => text.push_str(&String::from_utf8_lossy(t)),
            Event::GeneralRef(ref r) => {
                if let Ok(Some(ch)) = r.resolve_char_ref() {
                    text.push(ch);
                } else if let Some(resolved) = resolve_predefined_entity(&String::from_utf8_lossy(r)) {
                    text.push_str(resolved);
                }
            }
            Event::End(_) => {
                let name = stack.pop().unwrap_or_default();
                close_element(&name, &stack, text.trim(), &mut placemark, &mut records, path)?;
                text.clear();
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(records)
}

/// Apply the effect of a closing element. `parents` excludes the element itself.
fn close_element(
    name: &str,
    parents: &[String],
    text: &str,
    placemark: &mut Option<PlacemarkBuilder>,
    records: &mut Vec<RawRecord>,
    path: &Path,
) -> Result<(), SourceError> {
    let Some(builder) = placemark.as_mut() else { return Ok(()) };
    let parent = parents.last().map(String::as_str);
    let within = |ancestor: &str| parents.iter().any(|p| p == ancestor);

    match name {
        "Placemark" => {
            if let Some(done) = placemark.take() {
                records.push(done.finish());
            }
        }
        "name" | "description" if parent == Some("Placemark") => {
            builder.properties.insert(name.to_string(), text.to_string());
        }
        "value" if parent == Some("Data") => {
            if let Some(key) = builder.data_name.clone() {
                builder.properties.insert(key, text.to_string());
            }
        }
        "SimpleData" => {
            if let Some(key) = builder.data_name.take() {
                builder.properties.insert(key, text.to_string());
            }
        }
        "coordinates" => {
            let coords = parse_coordinates(text).map_err(|reason| SourceError::malformed(path, reason))?;
            if within("outerBoundaryIs") {
                builder.outer = Some(ring(coords));
            } else if within("innerBoundaryIs") {
                builder.inners.push(ring(coords));
            } else if parent == Some("Point") {
                builder.points.extend(coords.into_iter().map(Point::from));
            }
        }
        "Polygon" => {
            let inners = std::mem::take(&mut builder.inners);
            if let Some(outer) = builder.outer.take() {
                builder.polygons.push(Polygon::new(outer, inners));
            }
        }
        _ => {}
    }
    Ok(())
}
