//! Moves ICNs from figure captions into image attribute lists.
//!
//! Converters leave the ICN of an illustration in the caption text below the
//! image. Downstream tooling expects it as an `icn=` attribute on the image
//! macro instead:
//!
//! ```text
//! image::a.png[]                       image::a.png[icn=ICN-AB12-CD34-000000001]
//! .Caption ICN-AB12-CD34-000000001  →  .Caption
//! ```

use std::{ops::Range, path::PathBuf, sync::LazyLock};

use regex::Regex;
use serde::Serialize;

use crate::domain::icn::ICN_TOKEN;

/// Number of lines after an image line searched for a caption ICN.
pub const DEFAULT_WINDOW: usize = 5;

/// A block image macro: indent, target, and an optional attribute list that
/// must close the line.
static IMAGE_MACRO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\s*)image::([^\[\]\s]+)(?:\[([^\]]*)\])?\s*$").expect("valid regex")
});

/// The outcome of migrating one text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    /// The migrated text; identical to the input when nothing changed.
    pub text: String,
    /// Number of image/caption pairs that were rewritten.
    pub change_count: usize,
}

/// Migrates caption ICNs using the default search window.
///
/// ```
/// use dmforge::document::migrate_inline_codes;
///
/// let migration = migrate_inline_codes("image::a.png[]\n.Caption ICN-AB12-CD34-000000001\n");
/// assert_eq!(migration.text, "image::a.png[icn=ICN-AB12-CD34-000000001]\n.Caption\n");
/// assert_eq!(migration.change_count, 1);
/// ```
#[must_use]
pub fn migrate_inline_codes(text: &str) -> Migration {
    migrate_inline_codes_within(text, DEFAULT_WINDOW)
}

/// Migrates caption ICNs, searching up to `window` lines after each image.
///
/// For every `image::` line without an `icn=` attribute, the following lines
/// are searched until the window ends or another image line starts. The first
/// ICN found is prepended to the image's attributes and removed from its
/// line; the rest of that line is kept. Line endings are preserved. Image
/// lines that are not a plain `image::target[attributes]` macro, such as one
/// followed by more text, are left alone but still end the previous image's
/// search window.
#[must_use]
pub fn migrate_inline_codes_within(text: &str, window: usize) -> Migration {
    let mut lines: Vec<String> = text.split_inclusive('\n').map(String::from).collect();
    let mut change_count = 0;

    for image in 0..lines.len() {
        if !is_image_line(&lines[image]) {
            continue;
        }
        match has_icn_attribute(&lines[image]) {
            Some(false) => {}
            Some(true) => continue,
            None => {
                tracing::debug!("Skipping unrecognised image macro on line {}", image + 1);
                continue;
            }
        }

        let end = lines.len().min(image + 1 + window);
        for caption in image + 1..end {
            if is_image_line(&lines[caption]) {
                break;
            }
            let Some((icn, stripped)) = ICN_TOKEN.find(&lines[caption]).map(|found| {
                (
                    found.as_str().to_string(),
                    remove_range(&lines[caption], found.range()),
                )
            }) else {
                continue;
            };
            if is_image_line(&stripped) {
                tracing::debug!("Leaving {icn} on line {}: it prefixes an image", caption + 1);
                break;
            }
            if let Some(rewritten) = with_icn_attribute(&lines[image], &icn) {
                tracing::trace!("Moved {icn} into image on line {}", image + 1);
                lines[image] = rewritten;
                lines[caption] = stripped;
                change_count += 1;
            }
            break;
        }
    }

    if change_count == 0 {
        return Migration {
            text: text.to_string(),
            change_count,
        };
    }

    Migration {
        text: lines.concat(),
        change_count,
    }
}

fn is_image_line(line: &str) -> bool {
    line.trim_start().starts_with("image::")
}

/// Whether an image line already carries `icn=`, or `None` when the line is
/// not a well-formed image macro.
fn has_icn_attribute(line: &str) -> Option<bool> {
    let caps = IMAGE_MACRO.captures(split_line_ending(line).0)?;
    Some(caps.get(3).is_some_and(|attrs| {
        attrs
            .as_str()
            .split(',')
            .any(|attr| attr.trim_start().starts_with("icn="))
    }))
}

/// Splits a line into its content and its line ending.
fn split_line_ending(line: &str) -> (&str, &str) {
    let content = line.trim_end_matches(['\n', '\r']);
    line.split_at(content.len())
}

/// Rewrites an image line with `icn=` prepended to its attributes.
fn with_icn_attribute(line: &str, icn: &str) -> Option<String> {
    let (content, ending) = split_line_ending(line);
    let caps = IMAGE_MACRO.captures(content)?;
    let indent = &caps[1];
    let target = &caps[2];
    let attributes = caps.get(3).map_or("", |m| m.as_str()).trim();

    let attributes = if attributes.is_empty() {
        format!("icn={icn}")
    } else {
        format!("icn={icn},{attributes}")
    };
    Some(format!("{indent}image::{target}[{attributes}]{ending}"))
}

/// Removes a token from a line, leaving at most one space where it was.
fn remove_range(line: &str, range: Range<usize>) -> String {
    let before = line[..range.start].trim_end();
    let (after, ending) = split_line_ending(&line[range.end..]);
    let after = after.trim_start();
    let separator = if before.is_empty() || after.is_empty() {
        ""
    } else {
        " "
    };
    format!("{before}{separator}{after}{ending}")
}

/// Per-file outcome of a batch migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// The file was rewritten.
    Success,
    /// The file held no image/caption pairs to migrate.
    NoChanges,
    /// The file could not be read or written.
    Error,
}

/// Result of migrating one file in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    /// The file that was processed.
    pub file: PathBuf,
    /// What happened to it.
    pub status: FileStatus,
    /// Number of pairs rewritten.
    pub changes: usize,
    /// Error details, for failed files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FileReport {
    /// A report for a file whose migration ran.
    #[must_use]
    pub fn migrated(file: PathBuf, migration: &Migration) -> Self {
        let status = if migration.change_count == 0 {
            FileStatus::NoChanges
        } else {
            FileStatus::Success
        };
        Self {
            file,
            status,
            changes: migration.change_count,
            message: None,
        }
    }

    /// A report for a file that failed.
    #[must_use]
    pub fn failed(file: PathBuf, message: impl ToString) -> Self {
        Self {
            file,
            status: FileStatus::Error,
            changes: 0,
            message: Some(message.to_string()),
        }
    }
}
