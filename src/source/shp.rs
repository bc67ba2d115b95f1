use std::path::Path;

use shapefile::{dbase::{Date, FieldValue}, Reader};

use crate::geom::shape_to_geometry;
use super::{archive, Fields, RawRecord, SourceError};

/// Reads all shapes + attribute records from a given `.shp` file path.
pub(super) fn read_shapefile(path: &Path) -> Result<Vec<RawRecord>, SourceError> {
    let shapefile_err = |source| SourceError::Shapefile { source, path: path.to_path_buf() };
    let mut reader = Reader::from_path(path).map_err(shapefile_err)?;

    let mut items = Vec::with_capacity(reader.shape_count().map_err(shapefile_err)?);
    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result.map_err(shapefile_err)?;
        let properties: Fields = record.into_iter()
            .map(|(field, value)| (field, field_to_string(value)))
            .collect();
        items.push(RawRecord::Feature { geometry: shape_to_geometry(shape), properties });
    }
    Ok(items)
}

/// Reads the single shapefile packaged in a `.zip` archive.
pub(super) fn read_zipped_shapefile(zip_path: &Path) -> Result<Vec<RawRecord>, SourceError> {
    let scratch = archive::extract_to_scratch(zip_path)?;
    match archive::find_with_extension(scratch.path(), "shp").as_slice() {
        [shp] => read_shapefile(shp),
        found => Err(SourceError::malformed(zip_path, format!("found {} shapefiles in archive", found.len()))),
    }
}

/// Render a dBase attribute as text; empty values become the empty string.
fn field_to_string(value: FieldValue) -> String {
    match value {
        FieldValue::Character(s) => s.map(|s| s.trim().to_string()).unwrap_or_default(),
        FieldValue::Numeric(n) => n.map(|n| n.to_string()).unwrap_or_default(),
        FieldValue::Float(f) => f.map(|f| f.to_string()).unwrap_or_default(),
        FieldValue::Logical(b) => b.map(|b| b.to_string()).unwrap_or_default(),
        FieldValue::Integer(i) => i.to_string(),
        FieldValue::Double(d) => d.to_string(),
        FieldValue::Currency(c) => c.to_string(),
        FieldValue::Memo(s) => s,
        FieldValue::Date(d) => d.map(|d| date_to_string(&d)).unwrap_or_default(),
        FieldValue::DateTime(dt) => {
            let time = dt.time();
            format!("{} {:02}:{:02}:{:02}", date_to_string(&dt.date()), time.hours(), time.minutes(), time.seconds())
        }
    }
}

fn date_to_string(date: &Date) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day())
}
