use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{document::HeaderFields, domain::icn::IcnParams};

/// The conventional name of the configuration file.
pub const CONFIG_FILE_NAME: &str = "dmforge.toml";

/// Project-wide defaults for generated documents and codes.
///
/// Every field has a default, so an empty file (or no file at all) yields a
/// usable configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// Values written into document headers.
    pub header: HeaderFields,

    /// Producer-assigned ICN fields used when generating ICNs.
    pub icn: IcnParams,

    /// How many lines after an image line are searched for a caption ICN.
    migration_window: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            header: HeaderFields::default(),
            icn: IcnParams::default(),
            migration_window: default_migration_window(),
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Loads the configuration if the file exists, otherwise returns the
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> Result<Self, String> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("No config file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// Returns the caption search window for ICN migration.
    #[must_use]
    pub const fn migration_window(&self) -> usize {
        self.migration_window
    }

    /// Sets the caption search window. A window of zero is raised to one.
    pub fn set_migration_window(&mut self, window: usize) {
        self.migration_window = window.max(1);
    }
}

const fn default_migration_window() -> usize {
    5
}

/// The serialized versions of the configuration.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_migration_window")]
        migration_window: usize,

        #[serde(default)]
        header: HeaderFields,

        #[serde(default)]
        icn: IcnParams,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                migration_window,
                header,
                icn,
            } => Self {
                header,
                icn,
                migration_window: migration_window.max(1),
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            migration_window: config.migration_window,
            header: config.header,
            icn: config.icn,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn load_reads_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            b"_version = \"1\"\nmigration_window = 8\n\n[header]\nlanguage = \"fr\"\ncountry = \"FR\"\n\n[icn]\nkpc = \"2\"\n",
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.migration_window(), 8);
        assert_eq!(config.header.language, "fr");
        assert_eq!(config.header.country, "FR");
        assert_eq!(config.header.issue_number, HeaderFields::default().issue_number);
        assert_eq!(config.icn.kpc, "2");
        assert_eq!(config.icn.xyz, IcnParams::default().xyz);
    }

    #[test]
    fn load_missing_file_returns_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.toml");

        let error = Config::load(&missing).unwrap_err();
        assert!(error.starts_with("Failed to read config file:"));
    }

    #[test]
    fn load_or_default_tolerates_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(&tmp.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn load_invalid_toml_returns_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"_version = \"1\"\nmigration_window = \"five\"\n")
            .unwrap();

        let error = Config::load(file.path()).unwrap_err();
        assert!(error.starts_with("Failed to parse config file:"));
    }

    #[test]
    fn empty_file_returns_default() {
        let expected = Config::default();
        let actual: Config = toml::from_str(r#"_version = "1""#).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn save_then_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);

        let mut config = Config::default();
        config.header.originator = "ACME".to_string();
        config.set_migration_window(0);
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.migration_window(), 1);
    }
}
