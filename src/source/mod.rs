//! FileSource: read one physical source file into raw records.
//!
//! Every supported format is a variant of [`SourceFormat`] and is dispatched
//! through [`read`]. Tabular formats produce [`RawRecord::Row`], spatial
//! formats [`RawRecord::Feature`] and plain JSON [`RawRecord::Json`].
mod archive;
mod csv;
mod error;
mod geojson;
mod json;
mod kml;
mod shp;

use std::{collections::BTreeMap, fmt, path::Path, str::FromStr};

use geo::Geometry;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use csv::normalize_header;
pub use error::SourceError;

/// Attribute name → value. Ordered so record dumps in logs are stable.
pub type Fields = BTreeMap<String, String>;

/// Declared type of a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceFormat {
    #[serde(rename = "csv")]
    DelimitedText,
    #[serde(rename = "shp")]
    Shapefile,
    #[serde(rename = "shp.zip")]
    ShapefileZip,
    #[serde(rename = "geojson")]
    GeoJson,
    #[serde(rename = "json")]
    Json,
    #[serde(rename = "kml")]
    Kml,
    #[serde(rename = "kmz")]
    Kmz,
}

impl SourceFormat {
    pub const ALL: [Self; 7] = [
        Self::DelimitedText, Self::Shapefile, Self::ShapefileZip, Self::GeoJson, Self::Json, Self::Kml, Self::Kmz,
    ];

    /// The type tag used in jurisdiction configuration.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::DelimitedText => "csv",
            Self::Shapefile => "shp",
            Self::ShapefileZip => "shp.zip",
            Self::GeoJson => "geojson",
            Self::Json => "json",
            Self::Kml => "kml",
            Self::Kmz => "kmz",
        }
    }

    /// Shapefile records carry geometry the mapper may leave to the collector.
    #[inline] pub fn is_shapefile(&self) -> bool { matches!(self, Self::Shapefile | Self::ShapefileZip) }

    /// Formats whose records carry a geometry alongside their attributes.
    #[inline] pub fn is_spatial(&self) -> bool { !matches!(self, Self::DelimitedText | Self::Json) }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for SourceFormat {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, SourceError> {
        Self::ALL.into_iter()
            .find(|format| format.tag().eq_ignore_ascii_case(s))
            .ok_or_else(|| SourceError::UnsupportedFileType(s.to_string()))
    }
}

/// Format options for delimited text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatOptions {
    /// Text encoding label, e.g. "utf-8", "windows-1252", "latin1".
    pub encoding: String,
    pub delimiter: char,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self { encoding: "utf-8".to_string(), delimiter: ',' }
    }
}

impl FormatOptions {
    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }
}

/// One raw record read from a source file.
#[derive(Debug, Clone, PartialEq)]
pub enum RawRecord {
    /// A delimited-text row keyed by normalized column names.
    Row(Fields),
    /// A spatial feature: its geometry (if any) and attributes.
    Feature { geometry: Option<Geometry<f64>>, properties: Fields },
    /// One element of a JSON array, untouched.
    Json(Value),
}

impl RawRecord {
    /// Look up an attribute by name. JSON records answer for top-level string members.
    pub fn get(&self, field: &str) -> Option<&str> {
        match self {
            Self::Row(fields) | Self::Feature { properties: fields, .. } => fields.get(field).map(String::as_str),
            Self::Json(value) => value.get(field).and_then(Value::as_str),
        }
    }

    /// Attribute value or empty string when absent.
    pub fn field(&self, field: &str) -> &str {
        self.get(field).unwrap_or("")
    }

    pub fn fields(&self) -> Option<&Fields> {
        match self {
            Self::Row(fields) | Self::Feature { properties: fields, .. } => Some(fields),
            Self::Json(_) => None,
        }
    }

    pub fn geometry(&self) -> Option<&Geometry<f64>> {
        match self {
            Self::Feature { geometry, .. } => geometry.as_ref(),
            _ => None,
        }
    }
}

/// Read every record of the file at `path`, interpreting it as `format`.
///
/// Scratch files created to unpack archives are removed before this returns,
/// including on error.
pub fn read(format: SourceFormat, path: &Path, options: &FormatOptions) -> Result<Vec<RawRecord>, SourceError> {
    match format {
        SourceFormat::DelimitedText => csv::read_delimited(path, options),
        SourceFormat::Shapefile => shp::read_shapefile(path),
        SourceFormat::ShapefileZip => shp::read_zipped_shapefile(path),
        SourceFormat::GeoJson => geojson::read_geojson(path),
        SourceFormat::Json => json::read_json(path),
        SourceFormat::Kml => kml::read_kml(path),
        SourceFormat::Kmz => kml::read_kmz(path),
    }
}

/// Read a file given its configuration type tag.
pub fn read_tagged(tag: &str, path: &Path, options: &FormatOptions) -> Result<Vec<RawRecord>, SourceError> {
    read(tag.parse()?, path, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tags_round_trip() {
        for format in SourceFormat::ALL {
            assert_eq!(format.tag().parse::<SourceFormat>().unwrap(), format);
        }
    }

    #[test]
    fn unknown_tag_is_unsupported() {
        let err = "xlsx".parse::<SourceFormat>().unwrap_err();
        assert!(matches!(err, SourceError::UnsupportedFileType(tag) if tag == "xlsx"));
    }

    #[test]
    fn read_tagged_rejects_unknown_tag_before_touching_disk() {
        let err = read_tagged("ods", Path::new("/does/not/exist"), &FormatOptions::default()).unwrap_err();
        assert!(matches!(err, SourceError::UnsupportedFileType(_)));
    }

    #[test]
    fn serde_uses_tags() {
        assert_eq!(serde_json::to_value(SourceFormat::ShapefileZip).unwrap(), json!("shp.zip"));
        let format: SourceFormat = serde_json::from_value(json!("geojson")).unwrap();
        assert_eq!(format, SourceFormat::GeoJson);
    }

    #[test]
    fn record_field_access() {
        let row = RawRecord::Row(Fields::from([("uprn".to_string(), "42".to_string())]));
        assert_eq!(row.get("uprn"), Some("42"));
        assert_eq!(row.field("missing"), "");
        assert!(row.geometry().is_none());

        let json = RawRecord::Json(json!({"id": "7", "n": 3}));
        assert_eq!(json.get("id"), Some("7"));
        assert_eq!(json.get("n"), None);
        assert!(json.fields().is_none());
    }
}
