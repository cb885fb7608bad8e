use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Information code that marks a data module as procedural.
pub const PROCEDURAL_INFO_CODE: &str = "000";

/// The S1000D document type a data module is assembled as.
///
/// Each variant selects one entry of the assembler's template table. The
/// selector strings (`descript`, `proced`, `fault`, `ipd`) are what the
/// orchestration layer passes in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DocType {
    /// Descriptive data module.
    #[default]
    #[serde(rename = "descript")]
    Descriptive,
    /// Procedural data module.
    #[serde(rename = "proced")]
    Procedural,
    /// Fault isolation data module.
    #[serde(rename = "fault")]
    FaultIsolation,
    /// Illustrated parts data module.
    #[serde(rename = "ipd")]
    IllustratedParts,
}

impl DocType {
    /// All document types, in selector order.
    pub const ALL: [Self; 4] = [
        Self::Descriptive,
        Self::Procedural,
        Self::FaultIsolation,
        Self::IllustratedParts,
    ];

    /// Classifies an information code: `000` is procedural, anything else is
    /// descriptive.
    #[must_use]
    pub fn from_info_code(info_code: &str) -> Self {
        if info_code == PROCEDURAL_INFO_CODE {
            Self::Procedural
        } else {
            Self::Descriptive
        }
    }

    /// The selector string for this document type.
    #[must_use]
    pub const fn selector(self) -> &'static str {
        match self {
            Self::Descriptive => "descript",
            Self::Procedural => "proced",
            Self::FaultIsolation => "fault",
            Self::IllustratedParts => "ipd",
        }
    }

    /// Whether this document type carries preliminary and closeout
    /// requirements.
    #[must_use]
    pub const fn is_procedural(self) -> bool {
        matches!(self, Self::Procedural | Self::FaultIsolation)
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.selector())
    }
}

impl FromStr for DocType {
    type Err = UnknownDocTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "descript" | "descriptive" => Ok(Self::Descriptive),
            "proced" | "procedural" => Ok(Self::Procedural),
            "fault" | "fault-isolation" => Ok(Self::FaultIsolation),
            "ipd" | "illustrated-parts" => Ok(Self::IllustratedParts),
            _ => Err(UnknownDocTypeError(s.to_string())),
        }
    }
}

/// Error returned when a document type selector is not recognised.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Unknown document type '{0}': expected one of descript, proced, fault, ipd")]
pub struct UnknownDocTypeError(String);

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("000", DocType::Procedural; "procedural")]
    #[test_case("040", DocType::Descriptive; "descriptive")]
    #[test_case("00", DocType::Descriptive; "short code")]
    #[test_case("", DocType::Descriptive; "empty")]
    fn classify(info_code: &str, expected: DocType) {
        assert_eq!(DocType::from_info_code(info_code), expected);
    }

    #[test]
    fn selectors_round_trip() {
        for doc_type in DocType::ALL {
            assert_eq!(doc_type.selector().parse::<DocType>(), Ok(doc_type));
            assert_eq!(doc_type.to_string(), doc_type.selector());
        }
    }

    #[test]
    fn unknown_selector_fails() {
        assert!("manual".parse::<DocType>().is_err());
    }

    #[test]
    fn serde_uses_selectors() {
        assert_eq!(
            serde_json::to_string(&DocType::FaultIsolation).unwrap(),
            "\"fault\""
        );
    }
}
