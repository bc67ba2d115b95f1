use std::{fs::File, io, path::{Path, PathBuf}};

use tempfile::{NamedTempFile, TempDir};
use walkdir::WalkDir;
use zip::{result::ZipError, ZipArchive};

use super::SourceError;

fn open_archive(zip_path: &Path) -> Result<ZipArchive<File>, SourceError> {
    let file = File::open(zip_path).map_err(SourceError::io(zip_path))?;
    ZipArchive::new(file).map_err(|source| SourceError::Zip { source, path: zip_path.to_path_buf() })
}

/// Extracts the given `.zip` file into a fresh scratch directory.
/// The directory and its contents are removed when the returned guard drops.
pub(super) fn extract_to_scratch(zip_path: &Path) -> Result<TempDir, SourceError> {
    let mut archive = open_archive(zip_path)?;
    let scratch = TempDir::new().map_err(SourceError::io(std::env::temp_dir()))?;

    archive
        .extract(scratch.path())
        .map_err(|source| SourceError::Zip { source, path: zip_path.to_path_buf() })?;

    Ok(scratch)
}

/// Copy one named member of a `.zip` file to a scratch file removed on drop.
pub(super) fn extract_member(zip_path: &Path, member: &str) -> Result<NamedTempFile, SourceError> {
    let mut archive = open_archive(zip_path)?;
    let mut entry = archive.by_name(member).map_err(|source| match source {
        ZipError::FileNotFound => SourceError::malformed(zip_path, format!("archive has no {member}")),
        source => SourceError::Zip { source, path: zip_path.to_path_buf() },
    })?;

    let mut scratch = NamedTempFile::new().map_err(SourceError::io(std::env::temp_dir()))?;
    io::copy(&mut entry, &mut scratch).map_err(SourceError::io(scratch.path()))?;
    Ok(scratch)
}

/// All files under `dir` with the given extension (case-insensitive), sorted.
pub(super) fn find_with_extension(dir: &Path, extension: &str) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = WalkDir::new(dir).into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension)))
        .collect();
    found.sort();
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use zip::write::SimpleFileOptions;

    fn build_zip(entries: &[(&str, &[u8])]) -> NamedTempFile {
        let file = NamedTempFile::new().unwrap();
        let mut writer = zip::ZipWriter::new(file.reopen().unwrap());
        for (name, bytes) in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(bytes).unwrap();
        }
        writer.finish().unwrap();
        file
    }

    #[test]
    fn scratch_directory_is_removed_on_drop() {
        let zip = build_zip(&[("a/b.shp", b"x"), ("a/b.dbf", b"y")]);
        let scratch = extract_to_scratch(zip.path()).unwrap();
        let root = scratch.path().to_path_buf();

        assert_eq!(find_with_extension(&root, "shp"), vec![root.join("a").join("b.shp")]);
        drop(scratch);
        assert!(!root.exists());
    }

    #[test]
    fn extension_match_ignores_case() {
        let zip = build_zip(&[("ONE.SHP", b"x"), ("two.shp", b"y"), ("two.shx", b"z")]);
        let scratch = extract_to_scratch(zip.path()).unwrap();
        assert_eq!(find_with_extension(scratch.path(), "shp").len(), 2);
    }

    #[test]
    fn extracts_named_member() {
        let zip = build_zip(&[("doc.kml", b"<kml/>")]);
        let member = extract_member(zip.path(), "doc.kml").unwrap();
        let mut contents = String::new();
        member.reopen().unwrap().read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "<kml/>");
    }

    #[test]
    fn missing_member_is_malformed() {
        let zip = build_zip(&[("other.kml", b"<kml/>")]);
        let err = extract_member(zip.path(), "doc.kml").unwrap_err();
        assert!(matches!(err, SourceError::MalformedSource { .. }));
    }

    #[test]
    fn non_zip_is_an_archive_error() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"not a zip").unwrap();
        assert!(matches!(extract_to_scratch(file.path()).unwrap_err(), SourceError::Zip { .. }));
    }
}
