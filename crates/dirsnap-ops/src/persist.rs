//! Reading and writing snapshot documents on disk.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;
use tracing::debug;

use dirsnap_codec::Format;
use dirsnap_core::{Result, Snapshot, SnapshotError};

/// File extension of snapshot documents.
pub const DOCUMENT_EXTENSION: &str = ".json";

/// Default document name for a source directory.
///
/// `<dirname>_<timestamp>.json`, where the timestamp is UTC ISO-8601 with
/// `:` and `.` replaced by `-`, e.g. `project_2024-05-01T10-20-30-123Z.json`.
pub fn default_document_name(source: &Path, now: DateTime<Utc>) -> String {
    let dir_name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "snapshot".to_string());
    let stamp = now
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
        .replace([':', '.'], "-");
    format!("{dir_name}_{stamp}{DOCUMENT_EXTENSION}")
}

/// Append `.json` unless the path already ends with it.
pub fn ensure_json_extension(path: PathBuf) -> PathBuf {
    if path.to_string_lossy().ends_with(DOCUMENT_EXTENSION) {
        return path;
    }
    let mut name: OsString = path.into_os_string();
    name.push(DOCUMENT_EXTENSION);
    PathBuf::from(name)
}

/// Find the document to restore when none was named.
///
/// Picks the first `*.json` file in `dir` by file name. Fails with
/// `AmbiguousDefaultDocument` when there is none.
pub fn find_default_document(dir: &Path) -> Result<PathBuf> {
    let mut candidates = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| SnapshotError::io(dir, e))? {
        let entry = entry.map_err(|e| SnapshotError::io(dir, e))?;
        let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
        if is_file && entry.file_name().to_string_lossy().ends_with(DOCUMENT_EXTENSION) {
            candidates.push(entry.path());
        }
    }

    candidates.sort();
    candidates
        .into_iter()
        .next()
        .ok_or_else(|| SnapshotError::AmbiguousDefaultDocument {
            dir: dir.to_path_buf(),
        })
}

/// Encode `snapshot` and write it to `path` atomically.
///
/// The document is written to a temporary file next to `path` and renamed
/// into place, so a reader never sees a partial document.
pub fn write_snapshot(snapshot: &Snapshot, path: &Path, format: Format) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(parent).map_err(|e| SnapshotError::write(path, e))?;
    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        dirsnap_codec::encode_to_writer(snapshot, &mut writer, format)?;
        writer.flush().map_err(|e| SnapshotError::write(path, e))?;
    }
    temp.as_file()
        .sync_all()
        .map_err(|e| SnapshotError::write(path, e))?;

    debug!(temp = %temp.path().display(), path = %path.display(), "persisting document");
    temp.persist(path)
        .map_err(|e| SnapshotError::write(path, e.error))?;
    Ok(())
}

/// Read and decode the document at `path`.
pub fn read_snapshot(path: &Path) -> Result<Snapshot> {
    let file = File::open(path).map_err(|e| SnapshotError::io(path, e))?;
    dirsnap_codec::decode_reader(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use dirsnap_core::{Entry, Summary};
    use tempfile::TempDir;

    fn sample() -> Snapshot {
        let root = Entry::new_directory("r", "").with_child(Entry::new_file("a", "a", "1"));
        Snapshot::new(root, "/r", "note", Summary::new(1, 0)).unwrap()
    }

    #[test]
    fn test_default_document_name() {
        let now = Utc
            .with_ymd_and_hms(2024, 5, 1, 10, 20, 30)
            .unwrap()
            + chrono::Duration::milliseconds(123);
        let name = default_document_name(Path::new("/home/me/project"), now);
        assert_eq!(name, "project_2024-05-01T10-20-30-123Z.json");
    }

    #[test]
    fn test_ensure_json_extension() {
        assert_eq!(
            ensure_json_extension(PathBuf::from("out/backup")),
            PathBuf::from("out/backup.json")
        );
        assert_eq!(
            ensure_json_extension(PathBuf::from("backup.v1")),
            PathBuf::from("backup.v1.json")
        );
        assert_eq!(
            ensure_json_extension(PathBuf::from("done.json")),
            PathBuf::from("done.json")
        );
    }

    #[test]
    fn test_find_default_document() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            find_default_document(temp.path()),
            Err(SnapshotError::AmbiguousDefaultDocument { .. })
        ));

        fs::write(temp.path().join("notes.txt"), "").unwrap();
        fs::create_dir(temp.path().join("dir.json")).unwrap();
        fs::write(temp.path().join("b.json"), "{}").unwrap();
        fs::write(temp.path().join("a.json"), "{}").unwrap();

        let found = find_default_document(temp.path()).unwrap();
        assert_eq!(found, temp.path().join("a.json"));
    }

    #[test]
    fn test_write_then_read() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("snap.json");
        write_snapshot(&sample(), &path, Format::Pretty).unwrap();

        let loaded = read_snapshot(&path).unwrap();
        assert!(loaded.root.same_tree(&sample().root));
        assert_eq!(loaded.remark, "note");

        // Only the document remains; the temp file was renamed away.
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_replaces_existing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("snap.json");
        fs::write(&path, "old").unwrap();
        write_snapshot(&sample(), &path, Format::Compact).unwrap();
        assert!(fs::read_to_string(&path).unwrap().starts_with('{'));
    }

    #[test]
    fn test_write_into_missing_dir_fails() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("missing/snap.json");
        let err = write_snapshot(&sample(), &path, Format::Pretty).unwrap_err();
        assert!(matches!(err, SnapshotError::IoWriteFailure { .. }));
    }

    #[test]
    fn test_read_missing_document() {
        let temp = TempDir::new().unwrap();
        let err = read_snapshot(&temp.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, SnapshotError::PathNotFound { .. }));
    }
}
