//! Reading rename mappings and renaming documents on disk.

use std::{
    collections::BTreeSet,
    ffi::OsStr,
    io,
    path::{Path, PathBuf},
};

use calamine::Reader;
use serde::Serialize;
use walkdir::WalkDir;

use crate::domain::rename::{Mapping, MappingError, RenameEntry, RenameStatus, preview};

/// Spreadsheet extensions read with `calamine`.
const SPREADSHEET_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Errors raised while reading a mapping table.
#[derive(Debug, thiserror::Error)]
pub enum MappingSourceError {
    /// The CSV file could not be read.
    #[error("failed to read {path} as CSV: {source}")]
    Csv {
        /// The mapping file.
        path: PathBuf,
        /// The underlying error.
        source: csv::Error,
    },

    /// The spreadsheet could not be read.
    #[error("failed to read {path} as a spreadsheet: {source}")]
    Spreadsheet {
        /// The mapping file.
        path: PathBuf,
        /// The underlying error.
        source: calamine::Error,
    },

    /// The spreadsheet has no sheet, or its first sheet has no header row.
    #[error("{0} has no header row")]
    Empty(PathBuf),

    /// The table lacks a required column.
    #[error("{path}: {source}")]
    Columns {
        /// The mapping file.
        path: PathBuf,
        /// The missing column.
        source: MappingError,
    },

    /// The file extension is not a supported table format.
    #[error("unsupported mapping format for {0}: expected .csv, .xlsx, .xlsm, .xlsb, .xls or .ods")]
    UnsupportedFormat(PathBuf),
}

/// Reads a mapping table from a CSV file or the first sheet of a spreadsheet.
///
/// # Errors
///
/// Returns an error if the file cannot be read, or lacks a document name or
/// DMC code column.
pub fn read_mapping(path: &Path) -> Result<Mapping, MappingSourceError> {
    let extension = path
        .extension()
        .and_then(OsStr::to_str)
        .map(str::to_ascii_lowercase);

    let (header, rows) = match extension.as_deref() {
        Some("csv") => read_csv(path).map_err(|source| MappingSourceError::Csv {
            path: path.to_path_buf(),
            source,
        })?,
        Some(ext) if SPREADSHEET_EXTENSIONS.contains(&ext) => read_spreadsheet(path)?,
        _ => return Err(MappingSourceError::UnsupportedFormat(path.to_path_buf())),
    };

    tracing::debug!("Read {} row(s) from {}", rows.len(), path.display());
    Mapping::from_table(&header, rows).map_err(|source| MappingSourceError::Columns {
        path: path.to_path_buf(),
        source,
    })
}

type Table = (Vec<String>, Vec<Vec<String>>);

fn read_csv(path: &Path) -> Result<Table, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let header = reader.headers()?.iter().map(str::to_string).collect();
    let rows = reader
        .records()
        .map(|record| record.map(|record| record.iter().map(str::to_string).collect()))
        .collect::<Result<Vec<Vec<String>>, _>>()?;
    Ok((header, rows))
}

fn read_spreadsheet(path: &Path) -> Result<Table, MappingSourceError> {
    let spreadsheet_error = |source: calamine::Error| MappingSourceError::Spreadsheet {
        path: path.to_path_buf(),
        source,
    };

    let mut workbook = calamine::open_workbook_auto(path).map_err(spreadsheet_error)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| MappingSourceError::Empty(path.to_path_buf()))?
        .map_err(spreadsheet_error)?;

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(ToString::to_string).collect::<Vec<String>>());
    let header = rows
        .next()
        .ok_or_else(|| MappingSourceError::Empty(path.to_path_buf()))?;
    Ok((header, rows.collect()))
}

/// Plans the rename of every file in `folder` with the given extension.
///
/// Only the folder itself is listed, not its subfolders. Files are taken in
/// name order and the extension is compared without case.
///
/// # Errors
///
/// Returns an error if the folder cannot be listed.
pub fn preview_directory(
    folder: &Path,
    mapping: &Mapping,
    extension: &str,
) -> io::Result<Vec<RenameEntry>> {
    let mut names = Vec::new();
    for entry in WalkDir::new(folder).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry?;
        if let Some(name) = entry.file_name().to_str() {
            names.push((name.to_string(), entry.file_type().is_file()));
        }
    }

    let existing: BTreeSet<String> = names.iter().map(|(name, _)| name.clone()).collect();
    let documents = names
        .iter()
        .filter(|(name, is_file)| *is_file && has_extension(name, extension))
        .map(|(name, _)| name.as_str());

    Ok(preview(documents, &existing, mapping))
}

fn has_extension(name: &str, extension: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension.trim_start_matches('.')))
}

/// Result of carrying out a rename plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenameOutcome {
    /// Number of files renamed.
    pub renamed: usize,
    /// One message per file that could not be renamed.
    pub errors: Vec<String>,
}

/// Renames the [`RenameStatus::Ready`] entries of a plan inside `folder`.
///
/// Entries that already carry their target name are skipped. When the target
/// was taken after the plan was made, `_1`, `_2`, … is appended to its stem.
/// A failure on one file is recorded and the others still go ahead.
pub fn execute(folder: &Path, entries: &[RenameEntry]) -> RenameOutcome {
    let mut outcome = RenameOutcome::default();

    for entry in entries {
        if entry.status != RenameStatus::Ready || entry.original_name == entry.new_name {
            continue;
        }
        if Path::new(&entry.new_name).file_name() != Some(OsStr::new(&entry.new_name)) {
            outcome.errors.push(format!(
                "Failed to rename {}: {} is not a plain file name",
                entry.original_name, entry.new_name
            ));
            continue;
        }

        let source = folder.join(&entry.original_name);
        let target = free_target(folder, &entry.new_name);
        match std::fs::rename(&source, &target) {
            Ok(()) => {
                tracing::debug!("Renamed {} to {}", source.display(), target.display());
                outcome.renamed += 1;
            }
            Err(e) => {
                tracing::warn!("Failed to rename {}: {e}", source.display());
                outcome
                    .errors
                    .push(format!("Failed to rename {}: {e}", entry.original_name));
            }
        }
    }

    outcome
}

/// The path for `name` in `folder`, with a numeric suffix if it is taken.
fn free_target(folder: &Path, name: &str) -> PathBuf {
    let target = folder.join(name);
    if !target.exists() {
        return target;
    }

    let path = Path::new(name);
    let stem = path
        .file_stem()
        .map_or_else(|| name.to_string(), |stem| stem.to_string_lossy().into_owned());
    let extension = path
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();

    (1..)
        .map(|n| folder.join(format!("{stem}_{n}{extension}")))
        .find(|candidate| !candidate.exists())
        .unwrap_or(target)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    const MAPPING: &str = "Doc Name,DMC Code,Notes\nBrakes,DMC-A-32-40,\nWheels,DMC-A-32-41,\n";

    fn setup(files: &[&str]) -> TempDir {
        let tmp = TempDir::new().unwrap();
        for file in files {
            fs::write(tmp.path().join(file), file.as_bytes()).unwrap();
        }
        tmp
    }

    #[test]
    fn reads_csv_mapping() {
        let tmp = setup(&[]);
        let path = tmp.path().join("map.csv");
        fs::write(&path, MAPPING).unwrap();

        let mapping = read_mapping(&path).unwrap();

        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.code_for("brakes"), Some("DMC-A-32-40"));
    }

    #[test]
    fn csv_without_code_column_is_rejected() {
        let tmp = setup(&[]);
        let path = tmp.path().join("map.csv");
        fs::write(&path, "File,Title\na,b\n").unwrap();

        assert!(matches!(
            read_mapping(&path),
            Err(MappingSourceError::Columns {
                source: MappingError::MissingDmcColumn,
                ..
            })
        ));
    }

    #[test]
    fn rejects_unknown_format() {
        let tmp = setup(&[]);
        let path = tmp.path().join("map.txt");
        fs::write(&path, MAPPING).unwrap();

        assert!(matches!(
            read_mapping(&path),
            Err(MappingSourceError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn unreadable_spreadsheet_is_an_error() {
        let tmp = setup(&[]);
        let path = tmp.path().join("map.xlsx");
        fs::write(&path, "not a workbook").unwrap();

        assert!(matches!(
            read_mapping(&path),
            Err(MappingSourceError::Spreadsheet { .. })
        ));
    }

    #[test]
    fn previews_matching_extension_only() {
        let tmp = setup(&["wheels.DOCX", "brakes.docx", "brakes.pdf", "DMC-A-32-41.DOCX"]);
        fs::create_dir(tmp.path().join("old.docx")).unwrap();
        let mapping = Mapping::from_table(
            &["doc_name".to_string(), "dmc".to_string()],
            [
                vec!["brakes".to_string(), "DMC-A-32-40".to_string()],
                vec!["wheels".to_string(), "DMC-A-32-41".to_string()],
            ],
        )
        .unwrap();

        let plan = preview_directory(tmp.path(), &mapping, "docx").unwrap();

        let names: Vec<_> = plan.iter().map(|e| e.original_name.as_str()).collect();
        assert_eq!(names, ["DMC-A-32-41.DOCX", "brakes.docx", "wheels.DOCX"]);
        assert_eq!(plan[0].status, RenameStatus::NoMapping);
        assert_eq!(plan[1].status, RenameStatus::Ready);
        assert_eq!(plan[2].new_name, "DMC-A-32-41.DOCX");
        assert_eq!(plan[2].status, RenameStatus::Exists);
    }

    #[test]
    fn executes_ready_entries_only() {
        let tmp = setup(&["brakes.docx", "wheels.docx", "DMC-A-32-41.docx", "notes.docx"]);
        let mapping_path = tmp.path().join("map.csv");
        fs::write(&mapping_path, MAPPING).unwrap();
        let mapping = read_mapping(&mapping_path).unwrap();

        let plan = preview_directory(tmp.path(), &mapping, "docx").unwrap();
        let outcome = execute(tmp.path(), &plan);

        assert_eq!(
            outcome,
            RenameOutcome {
                renamed: 1,
                errors: Vec::new()
            }
        );
        assert_eq!(
            fs::read_to_string(tmp.path().join("DMC-A-32-40.docx")).unwrap(),
            "brakes.docx"
        );
        assert!(tmp.path().join("wheels.docx").exists());
        assert!(tmp.path().join("notes.docx").exists());
    }

    #[test]
    fn conflicting_target_gets_numeric_suffix() {
        let tmp = setup(&["a.docx", "X.docx", "X_1.docx"]);
        let entry = RenameEntry {
            original_name: "a.docx".to_string(),
            new_name: "X.docx".to_string(),
            dmc_code: Some("X".to_string()),
            status: RenameStatus::Ready,
            available_matches: Vec::new(),
        };

        let outcome = execute(tmp.path(), &[entry]);

        assert_eq!(outcome.renamed, 1);
        assert_eq!(
            fs::read_to_string(tmp.path().join("X_2.docx")).unwrap(),
            "a.docx"
        );
        assert_eq!(
            fs::read_to_string(tmp.path().join("X.docx")).unwrap(),
            "X.docx"
        );
    }

    #[test]
    fn failures_are_collected() {
        let tmp = setup(&[]);
        let entries = [
            RenameEntry {
                original_name: "missing.docx".to_string(),
                new_name: "X.docx".to_string(),
                dmc_code: Some("X".to_string()),
                status: RenameStatus::Ready,
                available_matches: Vec::new(),
            },
            RenameEntry {
                original_name: "a.docx".to_string(),
                new_name: "../escape.docx".to_string(),
                dmc_code: Some("../escape".to_string()),
                status: RenameStatus::Ready,
                available_matches: Vec::new(),
            },
        ];

        let outcome = execute(tmp.path(), &entries);

        assert_eq!(outcome.renamed, 0);
        assert_eq!(outcome.errors.len(), 2);
        assert!(outcome.errors[0].starts_with("Failed to rename missing.docx"));
        assert!(outcome.errors[1].contains("not a plain file name"));
    }
}
