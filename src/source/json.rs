use std::{fs::File, io::BufReader, path::Path};

use serde_json::Value;

use super::{RawRecord, SourceError};

/// Read a JSON document whose top level is an array: one record per element.
/// Element contents are passed through untouched.
pub(super) fn read_json(path: &Path) -> Result<Vec<RawRecord>, SourceError> {
    let file = File::open(path).map_err(SourceError::io(path))?;
    let value: Value = serde_json::from_reader(BufReader::new(file))
        .map_err(|source| SourceError::Json { source, path: path.to_path_buf() })?;

    match value {
        Value::Array(items) => Ok(items.into_iter().map(RawRecord::Json).collect()),
        other => Err(SourceError::malformed(path, format!("expected a JSON array, found {}", json_kind(&other)))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
