//! Renaming converted documents after their data module codes.
//!
//! A mapping table pairs document names with data module codes. [`preview`]
//! matches the documents in a folder against the table and decides, without
//! touching the filesystem, what each one would be renamed to.

use std::{
    collections::{BTreeMap, BTreeSet},
    path::Path,
};

use serde::Serialize;

/// Accepted headers for the document name column, compared without case.
pub const DOC_NAME_COLUMNS: [&str; 5] = ["doc_name", "doc name", "docname", "filename", "file"];

/// Accepted headers for the data module code column, compared without case.
pub const DMC_COLUMNS: [&str; 3] = ["dmc_code", "dmc code", "dmc"];

/// Mapping tables with at most this many rows are listed as suggestions for
/// unmapped documents.
const MAX_SUGGESTIONS: usize = 5;

/// The mapping table lacks a required column.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MappingError {
    /// No header names the document column.
    #[error("mapping lacks a document name column (one of: {})", DOC_NAME_COLUMNS.join(", "))]
    MissingDocNameColumn,

    /// No header names the code column.
    #[error("mapping lacks a DMC code column (one of: {})", DMC_COLUMNS.join(", "))]
    MissingDmcColumn,
}

/// One usable row of a mapping table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappingRow {
    /// Document name as written in the table, without extension.
    pub doc_name: String,
    /// Data module code the document is renamed to.
    pub dmc_code: String,
}

/// Document names mapped to data module codes.
///
/// Names are matched without case. When a name appears twice the later row
/// wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping {
    rows: Vec<MappingRow>,
    codes: BTreeMap<String, String>,
}

impl Mapping {
    /// Builds a mapping from a table's header row and data rows.
    ///
    /// Rows with an empty or `nan` cell in either column are skipped; such
    /// cells are what spreadsheet exports leave for missing values.
    ///
    /// # Errors
    ///
    /// Returns an error if the header has no document name or no DMC column.
    pub fn from_table<I>(header: &[String], rows: I) -> Result<Self, MappingError>
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        let doc_column =
            find_column(header, &DOC_NAME_COLUMNS).ok_or(MappingError::MissingDocNameColumn)?;
        let dmc_column = find_column(header, &DMC_COLUMNS).ok_or(MappingError::MissingDmcColumn)?;

        let mut mapping = Self::default();
        for row in rows {
            let (Some(doc_name), Some(dmc_code)) =
                (cell(&row, doc_column), cell(&row, dmc_column))
            else {
                continue;
            };
            mapping.insert(doc_name, dmc_code);
        }
        tracing::debug!("Read {} mapping row(s)", mapping.rows.len());
        Ok(mapping)
    }

    fn insert(&mut self, doc_name: &str, dmc_code: &str) {
        self.codes.insert(doc_name.to_lowercase(), dmc_code.to_string());
        self.rows.push(MappingRow {
            doc_name: doc_name.to_string(),
            dmc_code: dmc_code.to_string(),
        });
    }

    /// The usable rows, in table order.
    #[must_use]
    pub fn rows(&self) -> &[MappingRow] {
        &self.rows
    }

    /// The code mapped to a document name, ignoring case.
    #[must_use]
    pub fn code_for(&self, doc_name: &str) -> Option<&str> {
        self.codes.get(&doc_name.to_lowercase()).map(String::as_str)
    }

    /// Number of distinct document names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Whether the table had no usable rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Lower-cased document names in table order, without repeats.
    fn names(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        self.rows
            .iter()
            .map(|row| row.doc_name.to_lowercase())
            .filter(|name| seen.insert(name.clone()))
            .collect()
    }
}

fn find_column(header: &[String], names: &[&str]) -> Option<usize> {
    let header: Vec<String> = header.iter().map(|h| h.trim().to_lowercase()).collect();
    names
        .iter()
        .find_map(|name| header.iter().position(|h| h.as_str() == *name))
}

fn cell(row: &[String], column: usize) -> Option<&str> {
    let value = row.get(column)?.trim();
    (!value.is_empty() && !value.eq_ignore_ascii_case("nan")).then_some(value)
}

/// What renaming a document would do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenameStatus {
    /// The document can be renamed.
    Ready,
    /// Another file already has the target name.
    Exists,
    /// The mapping has no row for this document.
    NoMapping,
}

/// The planned rename of one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenameEntry {
    /// Current file name.
    pub original_name: String,
    /// File name after renaming; the current name when unmapped.
    pub new_name: String,
    /// The mapped code, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dmc_code: Option<String>,
    /// Whether the rename can go ahead.
    pub status: RenameStatus,
    /// Mapped document names offered as hints for an unmapped document, when
    /// the table is small enough to list.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub available_matches: Vec<String>,
}

/// Plans the rename of each document in `files`.
///
/// A document is matched on its file name without extension and keeps its
/// extension. `existing` holds every file name already in the folder; a
/// target that is taken by another file gets [`RenameStatus::Exists`]. A
/// document already carrying its target name is [`RenameStatus::Ready`] and
/// renaming it is a no-op.
///
/// ```
/// use std::collections::BTreeSet;
///
/// use dmforge::domain::rename::{Mapping, RenameStatus, preview};
///
/// let header = vec!["Doc Name".to_string(), "DMC".to_string()];
/// let rows = vec![vec!["Brakes".to_string(), "DMC-A-32-40".to_string()]];
/// let mapping = Mapping::from_table(&header, rows).unwrap();
///
/// let plan = preview(["brakes.docx"], &BTreeSet::new(), &mapping);
/// assert_eq!(plan[0].new_name, "DMC-A-32-40.docx");
/// assert_eq!(plan[0].status, RenameStatus::Ready);
/// ```
#[must_use]
pub fn preview<'a>(
    files: impl IntoIterator<Item = &'a str>,
    existing: &BTreeSet<String>,
    mapping: &Mapping,
) -> Vec<RenameEntry> {
    let suggestions = if mapping.len() <= MAX_SUGGESTIONS {
        mapping.names()
    } else {
        Vec::new()
    };

    files
        .into_iter()
        .map(|name| {
            let path = Path::new(name);
            let stem = path
                .file_stem()
                .map_or(name.into(), |stem| stem.to_string_lossy());
            let Some(code) = mapping.code_for(&stem) else {
                return RenameEntry {
                    original_name: name.to_string(),
                    new_name: name.to_string(),
                    dmc_code: None,
                    status: RenameStatus::NoMapping,
                    available_matches: suggestions.clone(),
                };
            };

            let new_name = match path.extension() {
                Some(extension) => format!("{code}.{}", extension.to_string_lossy()),
                None => code.to_string(),
            };
            let status = if new_name != name && existing.contains(&new_name) {
                RenameStatus::Exists
            } else {
                RenameStatus::Ready
            };
            RenameEntry {
                original_name: name.to_string(),
                new_name,
                dmc_code: Some(code.to_string()),
                status,
                available_matches: Vec::new(),
            }
        })
        .collect()
}
