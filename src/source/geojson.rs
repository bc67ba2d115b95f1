use std::{fs::File, io::BufReader, path::Path};

use serde_json::{Map, Value};

use crate::geom::parse_geometry;
use super::{Fields, RawRecord, SourceError};

/// Render a GeoJSON property as text. `null` becomes the empty string.
fn property_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn properties_to_fields(properties: Option<&Map<String, Value>>) -> Fields {
    properties
        .map(|props| props.iter().map(|(k, v)| (k.clone(), property_to_string(v))).collect())
        .unwrap_or_default()
}

/// Read a GeoJSON FeatureCollection: one record per feature.
pub(super) fn read_geojson(path: &Path) -> Result<Vec<RawRecord>, SourceError> {
    let file = File::open(path).map_err(SourceError::io(path))?;
    let value: Value = serde_json::from_reader(BufReader::new(file))
        .map_err(|source| SourceError::Json { source, path: path.to_path_buf() })?;

    let features = value["features"].as_array()
        .ok_or_else(|| SourceError::malformed(path, "not a FeatureCollection: no features array"))?;

    features.iter().enumerate()
        .map(|(i, feature)| {
            let geometry = parse_geometry(&feature["geometry"])
                .map_err(|e| SourceError::malformed(path, format!("feature {i}: {e}")))?;
            Ok(RawRecord::Feature { geometry, properties: properties_to_fields(feature["properties"].as_object()) })
        })
        .collect()
}
