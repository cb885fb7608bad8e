//! Data module headers and footers.
//!
//! Each [`DocType`] maps to one template holding its schema name and the
//! section anchors that follow the header. Procedural document types also get
//! the skill level attribute and the closeout footer.

use std::fmt::Write;

use serde::{Deserialize, Serialize};

use super::normalize::cleanup;
use crate::domain::{Code, DocType};

const CLOSEOUT_FOOTER: &str = "[[closeout-requirements]]\n== Closeout Requirements\n";

/// Values for the attribute block at the top of every data module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderFields {
    /// Issue number of the data module.
    pub issue_number: String,
    /// In-work number of the data module.
    pub in_work: String,
    /// ISO 639 language code.
    pub language: String,
    /// ISO 3166 country code.
    pub country: String,
    /// Security classification code.
    pub security_classification: String,
    /// Name of the responsible partner company.
    pub responsible_partner_company: String,
    /// Enterprise code of the responsible partner company.
    pub enterprise_code: String,
    /// Name of the originator.
    pub originator: String,
    /// Applicability statement.
    pub applicability: String,
    /// Data module code of the business rules exchange module.
    pub brex_dmc: String,
    /// Reason for the update.
    pub reason_for_update: String,
    /// Skill level; only emitted for procedural documents.
    pub skill_level: String,
    /// Issue date; omitted from the header when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_date: Option<String>,
}

impl Default for HeaderFields {
    fn default() -> Self {
        Self {
            issue_number: "001".to_string(),
            in_work: "00".to_string(),
            language: "en".to_string(),
            country: "US".to_string(),
            security_classification: "01".to_string(),
            responsible_partner_company: String::new(),
            enterprise_code: String::new(),
            originator: String::new(),
            applicability: "All".to_string(),
            brex_dmc: "S1000D-A-04-10-0301-00A-022A-D".to_string(),
            reason_for_update: "Initial issue".to_string(),
            skill_level: "sk01".to_string(),
            issue_date: None,
        }
    }
}

/// A section anchor emitted after the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Anchor {
    id: &'static str,
    title: &'static str,
}

impl Anchor {
    const fn new(id: &'static str, title: &'static str) -> Self {
        Self { id, title }
    }
}

const PRELIMINARY_REQUIREMENTS: Anchor =
    Anchor::new("preliminary-requirements", "Preliminary Requirements");
const MAIN_PROCEDURE: Anchor = Anchor::new("main-procedure", "Main Procedure");
const FAULT_ISOLATION_PROCEDURE: Anchor =
    Anchor::new("fault-isolation-procedure", "Fault Isolation Procedure");
const PARTS_CATALOG: Anchor =
    Anchor::new("illustrated-parts-catalog", "Illustrated Parts Catalog");

/// The document-specific part of a data module header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Template {
    /// S1000D schema name written into the header.
    schema: &'static str,
    anchors: &'static [Anchor],
}

static DESCRIPTIVE: Template = Template {
    schema: "descript",
    anchors: &[],
};

static PROCEDURAL: Template = Template {
    schema: "proced",
    anchors: &[PRELIMINARY_REQUIREMENTS, MAIN_PROCEDURE],
};

static FAULT_ISOLATION: Template = Template {
    schema: "fault",
    anchors: &[PRELIMINARY_REQUIREMENTS, FAULT_ISOLATION_PROCEDURE],
};

static ILLUSTRATED_PARTS: Template = Template {
    schema: "ipd",
    anchors: &[PARTS_CATALOG],
};

const fn template(doc_type: DocType) -> &'static Template {
    match doc_type {
        DocType::Descriptive => &DESCRIPTIVE,
        DocType::Procedural => &PROCEDURAL,
        DocType::FaultIsolation => &FAULT_ISOLATION,
        DocType::IllustratedParts => &ILLUSTRATED_PARTS,
    }
}

/// The fixed closeout section of procedural documents.
#[must_use]
pub const fn procedural_footer() -> &'static str {
    CLOSEOUT_FOOTER
}

/// The footer appended for `doc_type`, if any.
#[must_use]
pub const fn footer(doc_type: DocType) -> Option<&'static str> {
    if doc_type.is_procedural() {
        Some(CLOSEOUT_FOOTER)
    } else {
        None
    }
}

/// The header for a data module, using the default header values.
#[must_use]
pub fn header(code: &Code, doc_type: DocType) -> String {
    header_with(code, doc_type, &HeaderFields::default())
}

/// The header for a data module.
///
/// The attribute block is followed by a blank line and, for document types
/// that have them, the section anchors the body is written under.
#[must_use]
pub fn header_with(code: &Code, doc_type: DocType, fields: &HeaderFields) -> String {
    let template = template(doc_type);
    let mut out = String::new();

    let mut attribute = |name: &str, value: &str| {
        // Writing to a String cannot fail.
        let _ = writeln!(out, ":{name}: {value}");
    };

    attribute("dmc", &code.to_string());
    attribute("dm-schema", template.schema);
    attribute("issue-number", &fields.issue_number);
    attribute("in-work", &fields.in_work);
    attribute("language", &fields.language);
    attribute("country", &fields.country);
    if let Some(date) = &fields.issue_date {
        attribute("issue-date", date);
    }
    attribute("security-classification", &fields.security_classification);
    attribute("rpc-name", &fields.responsible_partner_company);
    attribute("rpc-enterprise-code", &fields.enterprise_code);
    attribute("originator", &fields.originator);
    attribute("applicability", &fields.applicability);
    attribute("brex-dmc", &fields.brex_dmc);
    attribute("reason-for-update", &fields.reason_for_update);
    if doc_type.is_procedural() {
        attribute("skill-level", &fields.skill_level);
    }

    out.push('\n');
    for anchor in template.anchors {
        let _ = write!(out, "[[{}]]\n== {}\n\n", anchor.id, anchor.title);
    }
    out
}

/// Assembles a data module with the default header values.
#[must_use]
pub fn assemble(body: &str, code: &Code, doc_type: DocType) -> String {
    assemble_with(body, code, doc_type, &HeaderFields::default())
}

/// Assembles a data module: header, normalised body, then the footer if the
/// document type has one.
///
/// The body is normalised on its own before concatenation so that cleanup
/// never touches the anchors in the header or footer.
#[must_use]
pub fn assemble_with(
    body: &str,
    code: &Code,
    doc_type: DocType,
    fields: &HeaderFields,
) -> String {
    let mut out = header_with(code, doc_type, fields);
    out.push_str(&cleanup(body));

    if let Some(footer) = footer(doc_type) {
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out.push('\n');
        out.push_str(footer);
    }
    out
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn code() -> Code {
        "MODEL-SDC-SYS-1-2-00-AB-1-040-A-E".parse().unwrap()
    }

    #[test_case(DocType::Descriptive, "descript"; "descriptive")]
    #[test_case(DocType::Procedural, "proced"; "procedural")]
    #[test_case(DocType::FaultIsolation, "fault"; "fault isolation")]
    #[test_case(DocType::IllustratedParts, "ipd"; "illustrated parts")]
    fn every_doc_type_has_a_template(doc_type: DocType, schema: &str) {
        assert_eq!(template(doc_type).schema, schema);
        let header = header(&code(), doc_type);
        assert!(header.contains(&format!(":dm-schema: {schema}\n")));
    }

    #[test]
    fn procedural_anchors_follow_doc_type() {
        for doc_type in DocType::ALL {
            let anchors = template(doc_type).anchors;
            assert_eq!(
                anchors.contains(&PRELIMINARY_REQUIREMENTS),
                doc_type.is_procedural(),
                "{doc_type}"
            );
        }
    }

    #[test_case(DocType::Descriptive, false; "descriptive")]
    #[test_case(DocType::Procedural, true; "procedural")]
    #[test_case(DocType::FaultIsolation, true; "fault isolation")]
    #[test_case(DocType::IllustratedParts, false; "illustrated parts")]
    fn procedural_family_gets_preliminary_requirements(doc_type: DocType, expected: bool) {
        let header = header(&code(), doc_type);
        assert_eq!(header.contains("== Preliminary Requirements"), expected);
        assert_eq!(header.contains(":skill-level: sk01"), expected);
        assert_eq!(footer(doc_type).is_some(), expected);
    }

    #[test]
    fn procedural_header_has_main_procedure_anchor() {
        let header = header(&code(), DocType::Procedural);
        assert!(header.contains("[[main-procedure]]\n== Main Procedure\n"));
        assert!(header.starts_with(":dmc: MODEL-SDC-SYS-1-2-00-AB-1-040-A-E\n"));
    }

    #[test]
    fn descriptive_header_is_attributes_only() {
        let header = header(&code(), DocType::Descriptive);
        assert!(header.ends_with(":reason-for-update: Initial issue\n\n"));
        assert!(!header.contains("[["));
    }

    #[test]
    fn header_uses_configured_fields() {
        let fields = HeaderFields {
            language: "de".to_string(),
            issue_date: Some("2024-05-01".to_string()),
            ..HeaderFields::default()
        };
        let header = header_with(&code(), DocType::Descriptive, &fields);
        assert!(header.contains(":language: de\n"));
        assert!(header.contains(":issue-date: 2024-05-01\n"));
    }

    #[test]
    fn assemble_descriptive_is_header_then_body() {
        let body = "Text.\n";
        let assembled = assemble(body, &code(), DocType::Descriptive);
        assert_eq!(
            assembled,
            format!("{}{body}", header(&code(), DocType::Descriptive))
        );
    }

    #[test]
    fn assemble_procedural_appends_footer() {
        let assembled = assemble("Step one.", &code(), DocType::Procedural);
        assert!(assembled.ends_with(
            "Step one.\n\n[[closeout-requirements]]\n== Closeout Requirements\n"
        ));
    }

    #[test]
    fn assemble_normalises_body_only() {
        let assembled = assemble("Line +\n%%PLUS%%\n", &code(), DocType::Descriptive);
        assert!(assembled.ends_with("Line\n+\n"));
    }
}
