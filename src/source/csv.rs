use std::{io::Cursor, path::Path, sync::LazyLock};

use encoding_rs::Encoding;
use polars::{io::SerReader, prelude::{CsvReadOptions, DataFrame, PolarsResult}};
use regex::Regex;

use super::{Fields, FormatOptions, RawRecord, SourceError};

static REPEATED_UNDERSCORES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("_{2,}").expect("static regex is valid"));

/// Turn a column heading into a stable field identifier.
///
/// Trims, lowercases, maps spaces, dots and dashes to `_`, drops parentheses
/// and collapses runs of underscores: `" Polling Station (No.) "` becomes
/// `"polling_station_no_"`. Existing jurisdiction mappings depend on these
/// exact identifiers.
pub fn normalize_header(raw: &str) -> String {
    let replaced: String = raw.trim().to_lowercase().chars()
        .filter_map(|c| match c {
            ' ' | '-' | '.' => Some('_'),
            '(' | ')' => None,
            c => Some(c),
        })
        .collect();
    REPEATED_UNDERSCORES.replace_all(&replaced, "_").into_owned()
}

/// Read a file in the given encoding as UTF-8 text, dropping any byte-order mark.
fn decode_file(path: &Path, label: &str) -> Result<String, SourceError> {
    let encoding = Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| SourceError::Encoding { encoding: label.to_string(), path: path.to_path_buf() })?;
    let bytes = std::fs::read(path).map_err(SourceError::io(path))?;

    let (text, _, had_errors) = encoding.decode(&bytes);
    if had_errors {
        return Err(SourceError::Encoding { encoding: encoding.name().to_string(), path: path.to_path_buf() });
    }
    Ok(text.into_owned())
}

/// Read delimited text with a header row into one record per row.
pub(super) fn read_delimited(path: &Path, options: &FormatOptions) -> Result<Vec<RawRecord>, SourceError> {
    let delimiter = u8::try_from(options.delimiter).ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| SourceError::malformed(path, format!("delimiter {:?} is not a single-byte character", options.delimiter)))?;
    let text = decode_file(path, &options.encoding)?;

    // Every column is read as a string: identifiers such as UPRNs and
    // district codes must keep their exact source spelling.
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .map_parse_options(|po| po.with_separator(delimiter))
        .into_reader_with_file_handle(Cursor::new(text.into_bytes()))
        .finish()
        .map_err(|source| SourceError::Csv { source, path: path.to_path_buf() })?;

    rows_from_dataframe(&df, path)
}

fn rows_from_dataframe(df: &DataFrame, path: &Path) -> Result<Vec<RawRecord>, SourceError> {
    let mut names: Vec<String> = Vec::with_capacity(df.width());
    for raw in df.get_column_names() {
        let name = normalize_header(raw.as_str());
        if names.contains(&name) {
            return Err(SourceError::malformed(path, format!("column {raw:?} normalizes to duplicate field {name:?}")));
        }
        names.push(name);
    }

    let columns = df.get_columns().iter()
        .map(|column| column.str())
        .collect::<PolarsResult<Vec<_>>>()
        .map_err(|source| SourceError::Csv { source, path: path.to_path_buf() })?;

    Ok((0..df.height())
        .map(|row| RawRecord::Row(
            names.iter().zip(&columns)
                .map(|(name, column)| (name.clone(), column.get(row).unwrap_or("").to_string()))
                .collect::<Fields>()
        ))
        .collect())
}
