//! Converted document bodies and the transformations applied to them.
//!
//! A converter hands over the raw body text of a data module. The body is
//! normalised ([`normalize::cleanup`]), ICN references in captions can be moved
//! into image attributes ([`icn_migration`]), and the result is wrapped in the
//! header and footer for its document type ([`assembler`]).

pub mod assembler;
pub mod icn_migration;
pub mod images;
pub mod normalize;

use serde::Serialize;

pub use assembler::{HeaderFields, assemble, footer, header, procedural_footer};
pub use icn_migration::{FileReport, FileStatus, Migration, migrate_inline_codes};
pub use images::{ImageAudit, audit_images, image_references};
pub use normalize::cleanup;

use crate::domain::{Code, DocType, FormatError, UnknownDocTypeError};

/// Errors raised while preparing a document for assembly.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The target code could not be parsed.
    #[error(transparent)]
    Code(#[from] FormatError),

    /// The requested document type is not known.
    #[error(transparent)]
    DocType(#[from] UnknownDocTypeError),
}

/// A converted body waiting to be assembled into a data module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    body: String,
    code: Code,
    doc_type: DocType,
}

impl Document {
    /// Creates a document record.
    #[must_use]
    pub const fn new(body: String, code: Code, doc_type: DocType) -> Self {
        Self {
            body,
            code,
            doc_type,
        }
    }

    /// Creates a document record from raw strings.
    ///
    /// When no document type selector is given, the type is classified from
    /// the code's information code.
    ///
    /// # Errors
    ///
    /// Returns an error if the code cannot be parsed or the selector is not a
    /// known document type.
    pub fn from_raw(body: String, code: &str, doc_type: Option<&str>) -> Result<Self, Error> {
        let code: Code = code.parse()?;
        let doc_type = match doc_type {
            Some(selector) => selector.parse()?,
            None => code.doc_type(),
        };
        Ok(Self::new(body, code, doc_type))
    }

    /// The target code.
    #[must_use]
    pub const fn code(&self) -> &Code {
        &self.code
    }

    /// The document type the body is assembled as.
    #[must_use]
    pub const fn doc_type(&self) -> DocType {
        self.doc_type
    }

    /// Assembles the final document using the given header values.
    #[must_use]
    pub fn assemble(self, fields: &HeaderFields) -> String {
        assembler::assemble_with(&self.body, &self.code, self.doc_type, fields)
    }

    /// Assembles the document and wraps the outcome for the caller.
    #[must_use]
    pub fn convert(self, fields: &HeaderFields) -> ConversionResult {
        let input_lines = self.body.lines().count();
        let doc_type = self.doc_type;
        let data = self.assemble(fields);
        let stats = ConversionStats {
            doc_type,
            input_lines,
            output_lines: data.lines().count(),
        };
        ConversionResult::ok(data, stats)
    }
}

/// Counters reported alongside a successful conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConversionStats {
    /// Document type the body was assembled as.
    pub doc_type: DocType,
    /// Lines in the converted body before assembly.
    pub input_lines: usize,
    /// Lines in the assembled document.
    pub output_lines: usize,
}

/// Terminal outcome of one conversion, as reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionResult {
    /// Whether the conversion produced a document.
    pub success: bool,
    /// The assembled document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    /// Why the conversion failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Conversion counters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<ConversionStats>,
}

impl ConversionResult {
    /// A successful conversion.
    #[must_use]
    pub const fn ok(data: String, stats: ConversionStats) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            stats: Some(stats),
        }
    }

    /// A failed conversion.
    #[must_use]
    pub fn failed(error: impl ToString) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
            stats: None,
        }
    }
}

/// Converts a raw body into a complete data module.
///
/// Never fails: parse errors are reported in the returned result.
#[must_use]
pub fn convert(
    body: String,
    code: &str,
    doc_type: Option<&str>,
    fields: &HeaderFields,
) -> ConversionResult {
    match Document::from_raw(body, code, doc_type) {
        Ok(document) => document.convert(fields),
        Err(e) => {
            tracing::debug!("Conversion rejected: {e}");
            ConversionResult::failed(e)
        }
    }
}
