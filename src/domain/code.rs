use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::DocType;

/// The two segment layouts a data module code can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Layout {
    /// The 9-segment layout found in legacy filenames.
    ///
    /// `DMC-MODEL-SDC-SYS-12-00-AB1-CD2-E`: the subsystem and sub-subsystem
    /// share one segment, and the disassembly and info codes carry their
    /// variants as a trailing character.
    Legacy,

    /// The 11-segment layout with every S1000D field in its own segment.
    ///
    /// `MODEL-SDC-SYS-1-2-00-AB-1-CD-2-E`
    Canonical,
}

impl Layout {
    /// Number of hyphen-delimited segments in this layout.
    #[must_use]
    pub const fn segment_count(self) -> usize {
        self.rules().len()
    }

    const fn rules(self) -> &'static [SegmentRule] {
        match self {
            Self::Legacy => &LEGACY_RULES,
            Self::Canonical => &CANONICAL_RULES,
        }
    }

    const fn from_segment_count(count: usize) -> Option<Self> {
        match count {
            9 => Some(Self::Legacy),
            11 => Some(Self::Canonical),
            _ => None,
        }
    }
}

/// Name and length window of one code segment.
#[derive(Debug, Clone, Copy)]
struct SegmentRule {
    name: &'static str,
    min: usize,
    max: usize,
}

impl SegmentRule {
    const fn new(name: &'static str, min: usize, max: usize) -> Self {
        Self { name, min, max }
    }

    fn check(&self, value: &str) -> Result<(), String> {
        if !value
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        {
            return Err("only uppercase letters and digits are allowed".to_string());
        }
        let len = value.len();
        if len < self.min || len > self.max {
            return Err(if self.min == self.max {
                format!("expected {} characters, found {len}", self.min)
            } else {
                format!(
                    "expected {} to {} characters, found {len}",
                    self.min, self.max
                )
            });
        }
        Ok(())
    }
}

const LEGACY_RULES: [SegmentRule; 9] = [
    SegmentRule::new("prefix", 1, 4),
    SegmentRule::new("model identification", 1, 14),
    SegmentRule::new("system difference", 1, 4),
    SegmentRule::new("system", 1, 3),
    SegmentRule::new("subsystem", 1, 2),
    SegmentRule::new("unit", 1, 4),
    SegmentRule::new("disassembly", 1, 6),
    SegmentRule::new("information", 1, 4),
    SegmentRule::new("item location", 1, 1),
];

// The split-derived segments may be empty: upgrading "1" yields subsystem "1"
// and an empty sub-subsystem.
const CANONICAL_RULES: [SegmentRule; 11] = [
    SegmentRule::new("model identification", 1, 14),
    SegmentRule::new("system difference", 1, 4),
    SegmentRule::new("system", 1, 3),
    SegmentRule::new("subsystem", 0, 1),
    SegmentRule::new("sub-subsystem", 0, 1),
    SegmentRule::new("unit", 1, 4),
    SegmentRule::new("disassembly", 0, 5),
    SegmentRule::new("disassembly variant", 1, 3),
    SegmentRule::new("information", 0, 3),
    SegmentRule::new("information variant", 1, 1),
    SegmentRule::new("item location", 1, 1),
];

/// A validated data module code.
///
/// Codes are hyphen-delimited and come in one of two [`Layout`]s. Parsing is
/// strict: the segment count must be exactly 9 or 11 and every segment must
/// match its character class and length.
///
/// ```
/// use dmforge::Code;
///
/// let code: Code = "DMC-MODEL-SDC-SYS-12-00-AB1-CD2-E".parse().unwrap();
/// assert_eq!(code.segments().len(), 9);
/// assert_eq!(code.to_string(), "DMC-MODEL-SDC-SYS-12-00-AB1-CD2-E");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Code {
    layout: Layout,
    segments: Vec<String>,
}

impl Code {
    /// Builds a code from segments already known to satisfy the layout rules.
    pub(crate) fn from_trusted(layout: Layout, segments: Vec<String>) -> Self {
        debug_assert_eq!(segments.len(), layout.segment_count());
        Self { layout, segments }
    }

    /// Builds a code from individual segments, validating each one.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError`] if the number of segments is not 9 or 11, or if
    /// any segment fails validation.
    pub fn from_segments<S: Into<String>>(
        segments: impl IntoIterator<Item = S>,
    ) -> Result<Self, FormatError> {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        let raw = segments.join("-");

        let layout =
            Layout::from_segment_count(segments.len()).ok_or(FormatError::SegmentCount {
                code: raw.clone(),
                found: segments.len(),
            })?;

        for (rule, value) in layout.rules().iter().zip(&segments) {
            rule.check(value).map_err(|reason| FormatError::Segment {
                code: raw.clone(),
                segment: rule.name,
                value: value.clone(),
                reason,
            })?;
        }

        Ok(Self { layout, segments })
    }

    /// The layout of this code.
    #[must_use]
    pub const fn layout(&self) -> Layout {
        self.layout
    }

    /// All segments, in order.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The model identification code.
    #[must_use]
    pub fn model(&self) -> &str {
        match self.layout {
            Layout::Legacy => &self.segments[1],
            Layout::Canonical => &self.segments[0],
        }
    }

    /// The system code.
    #[must_use]
    pub fn system(&self) -> &str {
        match self.layout {
            Layout::Legacy => &self.segments[3],
            Layout::Canonical => &self.segments[2],
        }
    }

    /// The information code, without its variant.
    ///
    /// For legacy codes this is everything but the last character of the
    /// combined information segment.
    #[must_use]
    pub fn info_code(&self) -> &str {
        match self.layout {
            Layout::Legacy => split_variant(&self.segments[7]).0,
            Layout::Canonical => &self.segments[8],
        }
    }

    /// Classifies the document type from the information code.
    ///
    /// `000` is procedural, anything else descriptive.
    #[must_use]
    pub fn doc_type(&self) -> DocType {
        DocType::from_info_code(self.info_code())
    }
}

/// Splits a combined code+variant segment into all-but-last and last character.
pub(crate) fn split_variant(segment: &str) -> (&str, &str) {
    segment
        .char_indices()
        .last()
        .map_or(("", ""), |(idx, _)| segment.split_at(idx))
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.segments.join("-"))
    }
}

impl FromStr for Code {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_segments(s.split('-'))
    }
}

impl TryFrom<&str> for Code {
    type Error = FormatError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::from_str(value)
    }
}

impl Serialize for Code {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Code {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors produced when a code string does not match the segment grammar.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FormatError {
    /// The code does not have 9 or 11 segments.
    #[error("Invalid code '{code}': expected 9 or 11 segments, found {found}")]
    SegmentCount {
        /// The offending code.
        code: String,
        /// Number of segments found.
        found: usize,
    },

    /// A segment failed its character-class or length check.
    #[error("Invalid {segment} segment '{value}' in code '{code}': {reason}")]
    Segment {
        /// The offending code.
        code: String,
        /// Name of the segment that failed.
        segment: &'static str,
        /// The segment value.
        value: String,
        /// Why the segment was rejected.
        reason: String,
    },
}
