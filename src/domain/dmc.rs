//! Conversion between legacy and canonical data module codes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{
    Code, DocType, FormatError,
    code::{Layout, split_variant},
};

/// The unit segment used when no units are requested.
pub const DEFAULT_UNIT: &str = "00";

/// The disassembly code used for units without an explicit one.
pub const DEFAULT_DISASSEMBLY_CODE: &str = "00";

/// Result of upgrading a code to the canonical layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Upgraded {
    /// The canonical code, or the input unchanged when it was not legacy.
    pub code: Code,
    /// Document type classified from the information code.
    pub doc_type: DocType,
}

/// Upgrades a 9-segment legacy code to the 11-segment canonical layout.
///
/// The combined subsystem segment splits into its two characters (a missing
/// character becomes an empty segment, it is never zero padded). The
/// disassembly and information segments split into all-but-last character and
/// the trailing variant.
///
/// Codes that are not legacy pass through unchanged and are reported as
/// descriptive.
///
/// ```
/// use dmforge::{Code, DocType, domain::dmc::upgrade};
///
/// let legacy: Code = "DMC-MODEL-SDC-SYS-12-00-AB1-CD2-E".parse().unwrap();
/// let upgraded = upgrade(&legacy);
/// assert_eq!(upgraded.code.to_string(), "MODEL-SDC-SYS-1-2-00-AB-1-CD-2-E");
/// assert_eq!(upgraded.doc_type, DocType::Descriptive);
/// ```
#[must_use]
pub fn upgrade(code: &Code) -> Upgraded {
    if code.layout() != Layout::Legacy {
        return Upgraded {
            code: code.clone(),
            doc_type: DocType::Descriptive,
        };
    }

    let segments = code.segments();
    let mut subsystem = segments[4].chars().map(String::from);
    let (subsystem, sub_subsystem) = (
        subsystem.next().unwrap_or_default(),
        subsystem.next().unwrap_or_default(),
    );
    let (disassembly, disassembly_variant) = split_variant(&segments[6]);
    let (info_code, info_variant) = split_variant(&segments[7]);

    let doc_type = DocType::from_info_code(info_code);

    let canonical = vec![
        segments[1].clone(),
        segments[2].clone(),
        segments[3].clone(),
        subsystem,
        sub_subsystem,
        segments[5].clone(),
        disassembly.to_string(),
        disassembly_variant.to_string(),
        info_code.to_string(),
        info_variant.to_string(),
        segments[8].clone(),
    ];

    tracing::debug!(legacy = %code, "upgraded legacy code");

    Upgraded {
        code: Code::from_trusted(Layout::Canonical, canonical),
        doc_type,
    }
}

/// Result of upgrading a raw code string, such as a filename stem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpgradedName {
    /// The canonical code string, or the input verbatim when it had no
    /// legacy shape.
    pub code: String,
    /// Document type classified from the information code.
    pub doc_type: DocType,
    /// Whether the input was recognised as a legacy code and upgraded.
    pub upgraded: bool,
}

/// Upgrades a raw string that may or may not hold a legacy code.
///
/// Strings that do not split into exactly 9 hyphen-delimited pieces are
/// returned verbatim as descriptive: filenames are not guaranteed to carry a
/// code at all.
///
/// # Errors
///
/// Returns [`FormatError`] when the string has 9 pieces but one of them fails
/// validation.
pub fn upgrade_str(raw: &str) -> Result<UpgradedName, FormatError> {
    if raw.split('-').count() != Layout::Legacy.segment_count() {
        tracing::debug!(raw, "not a legacy code, passing through");
        return Ok(UpgradedName {
            code: raw.to_string(),
            doc_type: DocType::Descriptive,
            upgraded: false,
        });
    }

    let legacy: Code = raw.parse()?;
    let Upgraded { code, doc_type } = upgrade(&legacy);
    Ok(UpgradedName {
        code: code.to_string(),
        doc_type,
        upgraded: true,
    })
}

/// Inputs for [`build_codes`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildParams {
    /// Model identification code.
    pub model: String,
    /// System difference code.
    pub sdc: String,
    /// System code.
    pub system: String,
    /// Combined subsystem and sub-subsystem code.
    pub subsystem: String,
    /// Number of units to generate codes for. Zero yields a single code with
    /// unit `00`.
    pub units: usize,
    /// Disassembly codes entered for specific units, keyed by unit number.
    ///
    /// Key `0` applies to the single code produced when `units` is zero.
    #[serde(default)]
    pub disassembly_codes: BTreeMap<usize, String>,
    /// Disassembly code variant.
    pub dm_variant: String,
    /// Information code.
    pub info_code: String,
    /// Information code variant.
    pub info_variant: String,
    /// Item location code.
    pub item_location: String,
}

impl BuildParams {
    fn disassembly_code(&self, unit: usize) -> String {
        let entered = self
            .disassembly_codes
            .get(&unit)
            .map(|dc| dc.trim())
            .filter(|dc| !dc.is_empty())
            .unwrap_or(DEFAULT_DISASSEMBLY_CODE);
        format!("{entered:0>2}")
    }

    fn code_for(&self, unit: usize, unit_segment: &str) -> String {
        format!(
            "DMC-{}-{}-{}-{}-{}-{}{}-{}{}-{}",
            self.model,
            self.sdc,
            self.system,
            self.subsystem,
            unit_segment,
            self.disassembly_code(unit),
            self.dm_variant,
            self.info_code,
            self.info_variant,
            self.item_location,
        )
    }
}

/// Builds one legacy-layout code per requested unit.
///
/// With no units a single code with unit `00` is produced; otherwise units are
/// numbered `01..=N`.
///
/// ```
/// use dmforge::domain::dmc::{BuildParams, build_codes};
///
/// let params = BuildParams {
///     model: "MODEL".into(),
///     sdc: "A".into(),
///     system: "21".into(),
///     subsystem: "10".into(),
///     units: 2,
///     dm_variant: "A".into(),
///     info_code: "040".into(),
///     info_variant: "A".into(),
///     item_location: "D".into(),
///     ..BuildParams::default()
/// };
/// assert_eq!(
///     build_codes(&params),
///     vec![
///         "DMC-MODEL-A-21-10-01-00A-040A-D",
///         "DMC-MODEL-A-21-10-02-00A-040A-D",
///     ]
/// );
/// ```
#[must_use]
pub fn build_codes(params: &BuildParams) -> Vec<String> {
    if params.units == 0 {
        return vec![params.code_for(0, DEFAULT_UNIT)];
    }

    (1..=params.units)
        .map(|unit| params.code_for(unit, &format!("{unit:02}")))
        .collect()
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn params(units: usize) -> BuildParams {
        BuildParams {
            model: "MODEL".to_string(),
            sdc: "SDC".to_string(),
            system: "SYS".to_string(),
            subsystem: "12".to_string(),
            units,
            disassembly_codes: BTreeMap::new(),
            dm_variant: "A".to_string(),
            info_code: "040".to_string(),
            info_variant: "A".to_string(),
            item_location: "D".to_string(),
        }
    }

    #[test]
    fn upgrade_splits_combined_segments() {
        let legacy: Code = "DMC-MODEL-SDC-SYS-12-00-AB1-CD2-E".parse().unwrap();
        let Upgraded { code, doc_type } = upgrade(&legacy);

        assert_eq!(
            code.segments(),
            ["MODEL", "SDC", "SYS", "1", "2", "00", "AB", "1", "CD", "2", "E"]
        );
        assert_eq!(code.layout(), Layout::Canonical);
        assert_eq!(doc_type, DocType::Descriptive);
    }

    #[test_case("DMC-MODEL-SDC-SYS-12-00-AB1-0001-E", DocType::Procedural; "info code 000")]
    #[test_case("DMC-MODEL-SDC-SYS-12-00-AB1-040A-E", DocType::Descriptive; "info code 040")]
    #[test_case("DMC-MODEL-SDC-SYS-12-00-AB1-00A-E", DocType::Descriptive; "info code 00")]
    fn upgrade_classifies_doc_type(raw: &str, expected: DocType) {
        let legacy: Code = raw.parse().unwrap();
        assert_eq!(upgrade(&legacy).doc_type, expected);
    }

    #[test]
    fn upgrade_single_char_subsystem_leaves_empty_segment() {
        let legacy: Code = "DMC-MODEL-SDC-SYS-1-00-AB1-CD2-E".parse().unwrap();
        let upgraded = upgrade(&legacy);
        assert_eq!(upgraded.code.segments()[3], "1");
        assert_eq!(upgraded.code.segments()[4], "");
        assert_eq!(
            upgraded.code.to_string(),
            "MODEL-SDC-SYS-1--00-AB-1-CD-2-E"
        );
        // The canonical form still parses back to the same code.
        assert_eq!(
            upgraded.code.to_string().parse::<Code>().unwrap(),
            upgraded.code
        );
    }

    #[test]
    fn upgrade_single_char_disassembly_has_empty_code() {
        let legacy: Code = "DMC-MODEL-SDC-SYS-12-00-A-CD2-E".parse().unwrap();
        let upgraded = upgrade(&legacy);
        assert_eq!(upgraded.code.segments()[6], "");
        assert_eq!(upgraded.code.segments()[7], "A");
    }

    #[test]
    fn upgrade_canonical_is_passthrough() {
        let canonical: Code = "MODEL-SDC-SYS-1-2-00-AB-1-000-2-E".parse().unwrap();
        let upgraded = upgrade(&canonical);
        assert_eq!(upgraded.code, canonical);
        assert_eq!(upgraded.doc_type, DocType::Descriptive);
    }

    #[test_case("report-final"; "no code")]
    #[test_case("MODEL-SDC-SYS-12-00-AB1-CD2-E"; "eight pieces")]
    #[test_case("MODEL-SDC-SYS-1-2-00-AB-1-CD-2-E"; "already canonical")]
    fn upgrade_str_passes_through_non_legacy(raw: &str) {
        let result = upgrade_str(raw).unwrap();
        assert_eq!(result.code, raw);
        assert_eq!(result.doc_type, DocType::Descriptive);
        assert!(!result.upgraded);
    }

    #[test]
    fn upgrade_str_upgrades_legacy() {
        let result = upgrade_str("DMC-MODEL-SDC-SYS-12-00-AB1-0001-E").unwrap();
        assert_eq!(result.code, "MODEL-SDC-SYS-1-2-00-AB-1-000-1-E");
        assert_eq!(result.doc_type, DocType::Procedural);
        assert!(result.upgraded);
    }

    #[test]
    fn upgrade_str_rejects_malformed_legacy() {
        let result = upgrade_str("DMC-MODEL-SDC-SYS-12-00-AB1-CD2-e");
        assert!(matches!(result, Err(FormatError::Segment { .. })));
    }

    #[test]
    fn build_without_units_uses_unit_00() {
        let codes = build_codes(&params(0));
        assert_eq!(codes, vec!["DMC-MODEL-SDC-SYS-12-00-00A-040A-D"]);
    }

    #[test]
    fn build_three_units_differ_only_in_unit() {
        let codes = build_codes(&params(3));
        assert_eq!(
            codes,
            vec![
                "DMC-MODEL-SDC-SYS-12-01-00A-040A-D",
                "DMC-MODEL-SDC-SYS-12-02-00A-040A-D",
                "DMC-MODEL-SDC-SYS-12-03-00A-040A-D",
            ]
        );
    }

    #[test]
    fn build_pads_entered_disassembly_codes() {
        let mut params = params(3);
        params.disassembly_codes.insert(2, "5".to_string());
        params.disassembly_codes.insert(3, " ".to_string());

        let codes = build_codes(&params);
        assert_eq!(codes[0], "DMC-MODEL-SDC-SYS-12-01-00A-040A-D");
        assert_eq!(codes[1], "DMC-MODEL-SDC-SYS-12-02-05A-040A-D");
        assert_eq!(codes[2], "DMC-MODEL-SDC-SYS-12-03-00A-040A-D");
    }

    #[test]
    fn built_codes_upgrade_cleanly() {
        for raw in build_codes(&params(2)) {
            let upgraded = upgrade_str(&raw).unwrap();
            assert!(upgraded.upgraded);
            assert_eq!(upgraded.doc_type, DocType::Descriptive);
        }
    }
}
