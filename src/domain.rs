//! Domain models for S1000D codes.
//!
//! This module contains the core code types (data module codes and their
//! layouts), the DMC upgrade and build rules, document-type classification,
//! ICN generation, the classification hierarchy, document rename planning and
//! configuration.

/// Hyphen-delimited code parsing and formatting.
pub mod code;
pub use code::{Code, FormatError, Layout};

mod config;
pub use config::{CONFIG_FILE_NAME, Config};

/// Legacy-to-canonical DMC upgrade and per-unit code building.
pub mod dmc;

mod doc_type;
pub use doc_type::{DocType, PROCEDURAL_INFO_CODE, UnknownDocTypeError};

pub mod hierarchy;
pub use hierarchy::HierarchyNode;

pub mod icn;

/// Planning document renames from a name-to-code mapping table.
pub mod rename;
