//! Auditing documents against their image folders.
//!
//! The images of a document live in a folder named after the document's file
//! stem, below a common images directory:
//!
//! ```text
//! adoc/DMC-A-00-00-00-00A-040A-D.adoc
//! images/DMC-A-00-00-00-00A-040A-D/fig1.png
//! ```

use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use serde::Serialize;
use walkdir::WalkDir;

use super::batch::collect_adoc_files;
use crate::document::{ImageAudit, audit_images, image_references};

/// The audit of one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileAudit {
    /// The audited document.
    pub file: PathBuf,
    /// The comparison, when the document could be read.
    #[serde(flatten)]
    pub audit: Option<ImageAudit>,
    /// Why the document could not be audited.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Lists the files below an image folder as `/`-separated relative paths.
///
/// Hidden files are ignored. A missing folder has no images.
#[must_use]
pub fn existing_images(folder: &Path) -> BTreeSet<String> {
    if !folder.is_dir() {
        return BTreeSet::new();
    }

    WalkDir::new(folder)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            !entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with('.'))
        })
        .filter_map(|entry| {
            let relative = entry.path().strip_prefix(folder).ok()?;
            let parts: Vec<String> = relative
                .components()
                .map(|part| part.as_os_str().to_string_lossy().into_owned())
                .collect();
            Some(parts.join("/"))
        })
        .collect()
}

/// Audits every `.adoc` file below `adoc_dir` against its image folder in
/// `images_dir`.
#[must_use]
pub fn audit_directory(adoc_dir: &Path, images_dir: &Path) -> Vec<FileAudit> {
    collect_adoc_files(adoc_dir)
        .par_iter()
        .map(|path| audit_file(path, images_dir))
        .collect()
}

fn audit_file(path: &Path, images_dir: &Path) -> FileAudit {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!("Failed to read {}: {e}", path.display());
            return FileAudit {
                file: path.to_path_buf(),
                audit: None,
                error: Some(e.to_string()),
            };
        }
    };

    let stem = path.file_stem().unwrap_or_default();
    let folder = images_dir.join(stem);
    let audit = audit_images(&image_references(&content), &existing_images(&folder));
    tracing::debug!(
        "{}: {} missing, {} unused",
        path.display(),
        audit.missing.len(),
        audit.unused.len()
    );

    FileAudit {
        file: path.to_path_buf(),
        audit: Some(audit),
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::document::images::AuditStatus;

    #[test]
    fn lists_nested_images_with_forward_slashes() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("fig")).unwrap();
        fs::write(tmp.path().join("fig").join("a.png"), "").unwrap();
        fs::write(tmp.path().join("b.png"), "").unwrap();
        fs::write(tmp.path().join(".DS_Store"), "").unwrap();

        let images: Vec<_> = existing_images(tmp.path()).into_iter().collect();
        assert_eq!(images, vec!["b.png", "fig/a.png"]);
    }

    #[test]
    fn audits_each_document_against_its_folder() {
        let tmp = TempDir::new().unwrap();
        let adoc = tmp.path().join("adoc");
        let images = tmp.path().join("images");
        fs::create_dir_all(&adoc).unwrap();
        fs::create_dir_all(images.join("DM1")).unwrap();

        fs::write(adoc.join("DM1.adoc"), "image::a.png[]\nimage::b.png[]\n").unwrap();
        fs::write(images.join("DM1").join("a.png"), "").unwrap();
        fs::write(images.join("DM1").join("c.png"), "").unwrap();
        fs::write(adoc.join("DM2.adoc"), "No images.\n").unwrap();

        let audits = audit_directory(&adoc, &images);

        assert_eq!(audits.len(), 2);
        let first = audits[0].audit.as_ref().unwrap();
        assert_eq!(first.missing, vec!["b.png"]);
        assert_eq!(first.unused, vec!["c.png"]);
        assert_eq!(first.status, AuditStatus::Warning);
        assert_eq!(audits[1].audit.as_ref().unwrap().status, AuditStatus::Ok);
    }
}
