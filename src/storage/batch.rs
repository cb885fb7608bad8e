//! Directory-wide processing of converted AsciiDoc files.
//!
//! Files are processed in parallel. Every file gets its own report, in input
//! order, and a failure on one file never stops the others.

use std::{
    ffi::OsStr,
    io,
    path::{Path, PathBuf},
};

use nonempty::NonEmpty;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use walkdir::WalkDir;

use crate::document::{FileReport, cleanup, icn_migration::migrate_inline_codes_within};

/// Extension of the files batch operations pick up.
pub const ADOC_EXTENSION: &str = "adoc";

/// Errors that stop a batch before any file is processed.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BatchError {
    /// There was nothing to process.
    #[error("no .adoc files to process")]
    EmptyInput,
}

/// Collects the `.adoc` files below `root`, sorted by path.
///
/// A `root` that is itself a file is returned as the only entry, whatever its
/// extension. Hidden directories are skipped.
#[must_use]
pub fn collect_adoc_files(root: &Path) -> Vec<PathBuf> {
    if root.is_file() {
        return vec![root.to_path_buf()];
    }

    let mut paths: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()))
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().extension() == Some(OsStr::new(ADOC_EXTENSION)))
        .map(walkdir::DirEntry::into_path)
        .collect();
    paths.sort();
    paths
}

fn is_hidden(name: &OsStr) -> bool {
    name.to_str().is_some_and(|name| name.starts_with('.'))
}

/// Migrates caption ICNs in every `.adoc` file below `root`.
///
/// # Errors
///
/// Returns [`BatchError::EmptyInput`] if there are no files to process.
/// Per-file failures are reported, not returned.
pub fn migrate_directory(
    root: &Path,
    window: usize,
    write: bool,
) -> Result<NonEmpty<FileReport>, BatchError> {
    migrate_files(&collect_adoc_files(root), window, write)
}

/// Migrates caption ICNs in each of the given files.
///
/// When `write` is false the files are left untouched and the reports
/// describe what would change.
///
/// # Errors
///
/// Returns [`BatchError::EmptyInput`] if `paths` is empty.
pub fn migrate_files(
    paths: &[PathBuf],
    window: usize,
    write: bool,
) -> Result<NonEmpty<FileReport>, BatchError> {
    let reports: Vec<FileReport> = paths
        .par_iter()
        .map(|path| migrate_file(path, window, write))
        .collect();

    NonEmpty::from_vec(reports).ok_or(BatchError::EmptyInput)
}

fn migrate_file(path: &Path, window: usize, write: bool) -> FileReport {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!("Failed to read {}: {e}", path.display());
            return FileReport::failed(path.to_path_buf(), e);
        }
    };

    let migration = migrate_inline_codes_within(&content, window);
    tracing::debug!(
        "{}: {} caption ICN(s) to migrate",
        path.display(),
        migration.change_count
    );

    if write && migration.change_count > 0 {
        if let Err(e) = std::fs::write(path, &migration.text) {
            tracing::warn!("Failed to write {}: {e}", path.display());
            return FileReport::failed(path.to_path_buf(), e);
        }
    }

    FileReport::migrated(path.to_path_buf(), &migration)
}

/// Normalises a file in place.
///
/// Returns whether the content changed; unchanged files are not rewritten.
///
/// # Errors
///
/// Returns an error if the file cannot be read or written.
pub fn cleanup_file(path: &Path) -> io::Result<bool> {
    let content = std::fs::read_to_string(path)?;
    let cleaned = cleanup(&content);
    if cleaned == content {
        tracing::debug!("{} is already clean", path.display());
        return Ok(false);
    }
    std::fs::write(path, cleaned)?;
    tracing::debug!("Cleaned {}", path.display());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::document::FileStatus;

    const WITH_PAIR: &str = "image::a.png[]\n.Caption ICN-AB12-CD34-000000001\n";
    const WITHOUT_PAIR: &str = "Just text.\n";

    fn setup() -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("b.adoc"), WITH_PAIR).unwrap();
        fs::write(tmp.path().join("a.adoc"), WITHOUT_PAIR).unwrap();
        fs::write(tmp.path().join("notes.txt"), WITH_PAIR).unwrap();
        fs::create_dir(tmp.path().join(".cache")).unwrap();
        fs::write(tmp.path().join(".cache").join("c.adoc"), WITH_PAIR).unwrap();
        fs::create_dir(tmp.path().join("sub")).unwrap();
        fs::write(tmp.path().join("sub").join("d.adoc"), WITH_PAIR).unwrap();
        tmp
    }

    #[test]
    fn collects_sorted_adoc_files_only() {
        let tmp = setup();
        let files = collect_adoc_files(tmp.path());
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(tmp.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("a.adoc"),
                PathBuf::from("b.adoc"),
                PathBuf::from("sub/d.adoc")
            ]
        );
    }

    #[test]
    fn migrate_directory_reports_in_order_and_writes() {
        let tmp = setup();
        let reports = migrate_directory(tmp.path(), 5, true).unwrap();

        let statuses: Vec<_> = reports.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![FileStatus::NoChanges, FileStatus::Success, FileStatus::Success]
        );
        let migrated = fs::read_to_string(tmp.path().join("b.adoc")).unwrap();
        assert!(migrated.starts_with("image::a.png[icn=ICN-AB12-CD34-000000001]"));
    }

    #[test]
    fn dry_run_leaves_files_alone() {
        let tmp = setup();
        let reports = migrate_directory(tmp.path(), 5, false).unwrap();
        assert_eq!(reports.iter().filter(|r| r.changes == 1).count(), 2);
        assert_eq!(
            fs::read_to_string(tmp.path().join("b.adoc")).unwrap(),
            WITH_PAIR
        );
    }

    #[test]
    fn failing_file_does_not_abort_batch() {
        let tmp = setup();
        let paths = vec![
            tmp.path().join("missing.adoc"),
            tmp.path().join("b.adoc"),
        ];
        let reports = migrate_files(&paths, 5, true).unwrap();

        assert_eq!(reports.head.status, FileStatus::Error);
        assert!(reports.head.message.is_some());
        assert_eq!(reports.tail[0].status, FileStatus::Success);
    }

    #[test]
    fn empty_input_is_an_error() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(
            migrate_directory(tmp.path(), 5, true).unwrap_err(),
            BatchError::EmptyInput
        );
    }

    #[test]
    fn cleanup_file_rewrites_only_when_changed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("doc.adoc");
        fs::write(&path, "Text +\n").unwrap();

        assert!(cleanup_file(&path).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "Text\n");
        assert!(!cleanup_file(&path).unwrap());
    }
}
