//! Loading classification sources from disk.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::domain::hierarchy::{self, BuildReport, SourceSchema};

/// Errors raised while loading a classification source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The source file.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },

    /// The file is not valid JSON.
    #[error("failed to parse {path} as JSON: {source}")]
    Json {
        /// The source file.
        path: PathBuf,
        /// The underlying error.
        source: serde_json::Error,
    },

    /// The file is not valid YAML.
    #[error("failed to parse {path} as YAML: {source}")]
    Yaml {
        /// The source file.
        path: PathBuf,
        /// The underlying error.
        source: serde_yaml::Error,
    },

    /// The file extension is not one of `json`, `yaml` or `yml`.
    #[error("unsupported source format for {0}: expected .json, .yaml or .yml")]
    UnsupportedFormat(PathBuf),
}

/// A classification source built into a tree.
#[derive(Debug, Clone)]
pub struct LoadedSource {
    /// The schema the source was read with.
    pub schema: SourceSchema,
    /// The tree and any skipped entries.
    pub report: BuildReport,
}

/// Reads a classification source and builds its tree.
///
/// The schema is sniffed from the file name and content unless one is given.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed. Entries that do not
/// fit the schema are not errors; they are listed in the report.
pub fn load_hierarchy(
    path: &Path,
    schema: Option<SourceSchema>,
) -> Result<LoadedSource, SourceError> {
    let content = std::fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    let data: Value = match extension.as_deref() {
        Some("json") => serde_json::from_str(&content).map_err(|source| SourceError::Json {
            path: path.to_path_buf(),
            source,
        })?,
        Some("yaml" | "yml") => {
            serde_yaml::from_str(&content).map_err(|source| SourceError::Yaml {
                path: path.to_path_buf(),
                source,
            })?
        }
        _ => return Err(SourceError::UnsupportedFormat(path.to_path_buf())),
    };

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default();
    let schema = schema.unwrap_or_else(|| SourceSchema::sniff(&file_name, &data));
    tracing::debug!("Loading {} as {schema} source", path.display());

    let report = hierarchy::build(schema, &data);
    tracing::info!(
        "Loaded {} group(s) from {} ({} skipped)",
        report.nodes.len(),
        path.display(),
        report.skipped.len()
    );

    Ok(LoadedSource { schema, report })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn loads_json_and_sniffs_schema() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("gsv_codes.json");
        fs::write(
            &path,
            r#"{"gsv": [{"letter": "A", "title": "Chassis",
                 "systems": [{"sns": "10", "title": "Frame"}]}]}"#,
        )
        .unwrap();

        let loaded = load_hierarchy(&path, None).unwrap();

        assert_eq!(loaded.schema, SourceSchema::Gsv);
        assert_eq!(loaded.report.nodes.len(), 1);
        assert_eq!(loaded.report.nodes[0].children()[0].code(), "10");
    }

    #[test]
    fn loads_yaml_flat_list() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("systems.yaml");
        fs::write(
            &path,
            "- system_id: \"21\"\n  title: Air conditioning\n  group: Airframe\n- title: No code\n",
        )
        .unwrap();

        let loaded = load_hierarchy(&path, None).unwrap();

        assert_eq!(loaded.schema, SourceSchema::Flat);
        assert_eq!(loaded.report.nodes[0].title(), "Airframe");
        assert_eq!(loaded.report.skipped.len(), 1);
    }

    #[test]
    fn yaml_keyed_groups_keep_file_order() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("sns.yaml");
        fs::write(
            &path,
            "Zeta:\n  \"9\": { title: Nine }\n  \"10\": { title: Ten }\nAlpha: {}\n",
        )
        .unwrap();

        let loaded = load_hierarchy(&path, None).unwrap();

        assert_eq!(loaded.schema, SourceSchema::Legacy);
        let nodes = &loaded.report.nodes;
        assert_eq!(nodes[0].title(), "Zeta");
        assert_eq!(nodes[1].title(), "Alpha");
        assert_eq!(nodes[0].children()[0].code(), "9");
        assert_eq!(nodes[0].children()[1].code(), "10");
    }

    #[test]
    fn explicit_schema_overrides_sniffing() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("gsv.json");
        fs::write(&path, "[]").unwrap();

        let loaded = load_hierarchy(&path, Some(SourceSchema::Flat)).unwrap();
        assert_eq!(loaded.schema, SourceSchema::Flat);
    }

    #[test]
    fn rejects_unknown_extension() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("systems.csv");
        fs::write(&path, "").unwrap();

        assert!(matches!(
            load_hierarchy(&path, None),
            Err(SourceError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn reports_invalid_json() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("systems.json");
        fs::write(&path, "{").unwrap();

        assert!(matches!(
            load_hierarchy(&path, None),
            Err(SourceError::Json { .. })
        ));
    }
}
