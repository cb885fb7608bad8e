//! Filesystem access around the pure document and hierarchy operations.
//!
//! Everything here reads or writes files; the transformations themselves live
//! in [`crate::document`] and [`crate::domain`].

/// Batch processing of AsciiDoc files.
pub mod batch;
mod images;
/// Mapping tables and document renames.
pub mod rename;
mod source;

pub use batch::{BatchError, cleanup_file, collect_adoc_files, migrate_directory, migrate_files};
pub use images::{FileAudit, audit_directory, existing_images};
pub use rename::{MappingSourceError, RenameOutcome, preview_directory, read_mapping};
pub use source::{LoadedSource, SourceError, load_hierarchy};
