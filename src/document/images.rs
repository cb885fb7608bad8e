//! Cross-checks between image references and image files.

use std::{collections::BTreeSet, sync::LazyLock};

use regex::Regex;
use serde::Serialize;

static IMAGE_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)image:?:?(.+?)\[").expect("valid regex"));

/// Every image target referenced by block or inline image macros.
#[must_use]
pub fn image_references(text: &str) -> BTreeSet<String> {
    IMAGE_REFERENCE
        .captures_iter(text)
        .map(|caps| caps[1].trim().to_string())
        .filter(|target| !target.is_empty())
        .collect()
}

/// Overall verdict of an image audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    /// Every reference resolves and every image is used.
    Ok,
    /// Some references are missing or some images are unused.
    Warning,
}

/// Differences between the images a document references and those on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageAudit {
    /// Referenced images with no matching file.
    pub missing: Vec<String>,
    /// Image files nothing references.
    pub unused: Vec<String>,
    /// Overall verdict.
    pub status: AuditStatus,
}

/// Compares referenced image paths against existing image paths.
///
/// Both sides are relative paths using `/` separators. Results are sorted.
#[must_use]
pub fn audit_images(referenced: &BTreeSet<String>, existing: &BTreeSet<String>) -> ImageAudit {
    let missing: Vec<String> = referenced.difference(existing).cloned().collect();
    let unused: Vec<String> = existing.difference(referenced).cloned().collect();
    let status = if missing.is_empty() && unused.is_empty() {
        AuditStatus::Ok
    } else {
        AuditStatus::Warning
    };
    ImageAudit {
        missing,
        unused,
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn finds_block_and_inline_references() {
        let text = "image::fig/a.png[]\nSee image:b.svg[icon] and IMAGE:: c.jpg [x].\n";
        assert_eq!(image_references(text), set(&["b.svg", "c.jpg", "fig/a.png"]));
    }

    #[test]
    fn clean_audit_is_ok() {
        let audit = audit_images(&set(&["a.png"]), &set(&["a.png"]));
        assert_eq!(audit.status, AuditStatus::Ok);
        assert!(audit.missing.is_empty());
        assert!(audit.unused.is_empty());
    }

    #[test]
    fn differences_are_warnings() {
        let audit = audit_images(&set(&["a.png", "b.png"]), &set(&["b.png", "c.png"]));
        assert_eq!(audit.status, AuditStatus::Warning);
        assert_eq!(audit.missing, vec!["a.png"]);
        assert_eq!(audit.unused, vec!["c.png"]);
        assert_eq!(serde_json::to_value(&audit).unwrap()["status"], "warning");
    }
}
