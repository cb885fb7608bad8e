//! Illustration Control Numbers.
//!
//! ICNs identify illustration assets. They are derived from the data module
//! code of the document the illustration belongs to, plus a handful of
//! producer-assigned fields and a running sequence number.

use std::{path::Path, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

/// An ICN embedded in running text, such as a figure caption.
pub static ICN_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bICN-[A-Z0-9]+(?:-[A-Z0-9]+)+\b").expect("valid regex"));

/// An ICN label in extracted document text; Word may split the label after
/// the prefix, so whitespace is tolerated there.
static ICN_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ICN-\s*([\w\-.]+)").expect("valid regex"));

/// Characters that cannot appear in file names on common platforms.
static UNSAFE_FILE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*]"#).expect("valid regex"));

/// Producer-assigned ICN fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IcnParams {
    /// Responsible partner company code.
    pub kpc: String,
    /// Originator code.
    pub xyz: String,
    /// Variant code.
    pub icv: String,
    /// Issue number.
    pub issue: String,
    /// Security classification.
    pub security: String,
}

impl Default for IcnParams {
    fn default() -> Self {
        Self {
            kpc: "1".to_string(),
            xyz: "00000".to_string(),
            icv: "A".to_string(),
            issue: "001".to_string(),
            security: "01".to_string(),
        }
    }
}

/// Generates an ICN for an illustration in the document identified by `dmc`.
///
/// A code with at least seven hyphen-delimited parts contributes its model,
/// system difference and the concatenated system/subsystem/unit parts. Anything
/// shorter is embedded verbatim.
///
/// ```
/// use dmforge::domain::icn::{IcnParams, generate_icn};
///
/// let icn = generate_icn("DMC-MODEL-A-21-10-00-00A-040A-D", &IcnParams::default(), "0001");
/// assert_eq!(icn, "ICN-MODEL-A-2110-1-00000-0001-A-001-01");
/// ```
#[must_use]
pub fn generate_icn(dmc: &str, params: &IcnParams, sequence: &str) -> String {
    let parts: Vec<&str> = dmc.split('-').collect();
    let tail = format!(
        "{}-{}-{sequence}-{}-{}-{}",
        params.kpc, params.xyz, params.icv, params.issue, params.security
    );

    if parts.len() < 7 {
        return format!("ICN-{dmc}-{tail}");
    }

    let middle = parts[3..parts.len() - 4].concat();
    format!("ICN-{}-{}-{middle}-{tail}", parts[1], parts[2])
}

/// A running ICN sequence number.
///
/// Numbers are zero padded to the width of the starting value, so a sequence
/// started at `"0001"` yields `0001`, `0002`, …
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IcnSequence {
    next: u64,
    width: usize,
}

impl IcnSequence {
    /// Starts a sequence at the given value.
    ///
    /// # Errors
    ///
    /// Returns an error if `start` is not a non-negative integer.
    pub fn new(start: &str) -> Result<Self, InvalidSequenceStart> {
        let trimmed = start.trim();
        let next = trimmed
            .parse()
            .map_err(|_| InvalidSequenceStart(start.to_string()))?;
        Ok(Self {
            next,
            width: trimmed.len(),
        })
    }
}

impl Iterator for IcnSequence {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next;
        self.next = self.next.checked_add(1)?;
        Some(format!("{current:0width$}", width = self.width))
    }
}

/// Error returned when an ICN sequence start is not a number.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Invalid ICN sequence start '{0}': expected a non-negative integer")]
pub struct InvalidSequenceStart(String);

/// Extracts every ICN label from plain document text, in order of appearance.
#[must_use]
pub fn extract_icn_labels(text: &str) -> Vec<String> {
    ICN_LABEL
        .captures_iter(text)
        .map(|caps| format!("ICN-{}", &caps[1]))
        .collect()
}

/// Names extracted media files after the ICN labels found in the document.
///
/// The n-th media file takes the n-th label; files beyond the last label are
/// named `image_{n}`. The media file's extension is kept and characters that
/// are unsafe in file names are replaced with `_`.
#[must_use]
pub fn label_media(media: &[String], labels: &[String]) -> Vec<String> {
    media
        .iter()
        .enumerate()
        .map(|(index, file)| {
            let label = labels
                .get(index)
                .cloned()
                .unwrap_or_else(|| format!("image_{}", index + 1));
            let safe = UNSAFE_FILE_CHARS.replace_all(&label, "_");
            match Path::new(file).extension().and_then(|ext| ext.to_str()) {
                Some(ext) => format!("{safe}.{ext}"),
                None => safe.into_owned(),
            }
        })
        .collect()
}
