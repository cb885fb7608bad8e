//! S1000D data module tooling
//!
//! Derives and upgrades data module codes, assembles converted AsciiDoc bodies
//! into data modules, and repairs the artifacts format converters leave behind.

pub mod domain;
pub use domain::{Code, Config, DocType, FormatError, HierarchyNode, Layout};

/// Transformations applied to converted document bodies.
pub mod document;
pub use document::{ConversionResult, Document};

/// Filesystem access for batch operations and classification sources.
pub mod storage;
