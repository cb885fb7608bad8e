use std::path::Path;

use dmforge::domain::dmc::{UpgradedName, upgrade_str};
use serde::Serialize;
use tracing::instrument;

use super::{OutputFormat, print_json, terminal::Colorize};

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// Codes or file names to upgrade
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    output: OutputFormat,
}

#[derive(Debug, Serialize)]
struct Row {
    input: String,
    #[serde(flatten)]
    result: Option<UpgradedName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl Command {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self) -> anyhow::Result<()> {
        let rows: Vec<Row> = self.inputs.iter().map(|input| upgrade_input(input)).collect();
        let failures = rows.iter().filter(|row| row.error.is_some()).count();

        match self.output {
            OutputFormat::Json => print_json(&rows)?,
            OutputFormat::Text => {
                for row in &rows {
                    match (&row.result, &row.error) {
                        (Some(name), _) if name.upgraded => {
                            println!(
                                "{} → {} ({})",
                                row.input,
                                name.code.as_str().success(),
                                name.doc_type
                            );
                        }
                        (Some(name), _) => {
                            println!("{} {}", name.code, "(unchanged)".dim());
                        }
                        (None, Some(error)) => eprintln!("{}", error.error()),
                        (None, None) => {}
                    }
                }
            }
        }

        if failures > 0 {
            anyhow::bail!("{failures} input(s) could not be upgraded");
        }
        Ok(())
    }
}

/// Upgrades a code, or the stem of a file name that carries one.
fn upgrade_input(input: &str) -> Row {
    let path = Path::new(input);
    let stem = if path.extension().is_some() {
        path.file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(input)
    } else {
        input
    };

    match upgrade_str(stem) {
        Ok(name) => Row {
            input: input.to_string(),
            result: Some(name),
            error: None,
        },
        Err(e) => Row {
            input: input.to_string(),
            result: None,
            error: Some(e.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use dmforge::DocType;
    use test_case::test_case;

    use super::*;

    #[test_case("DMC-MODEL-SDC-SYS-12-00-AB1-CD2-E", "MODEL-SDC-SYS-1-2-00-AB-1-CD-2-E"; "bare code")]
    #[test_case("out/DMC-MODEL-SDC-SYS-12-00-AB1-0001-E.adoc", "MODEL-SDC-SYS-1-2-00-AB-1-000-1-E"; "file name")]
    fn upgrades_codes_and_file_names(input: &str, expected: &str) {
        let row = upgrade_input(input);
        assert_eq!(row.result.unwrap().code, expected);
    }

    #[test]
    fn file_name_classifies_procedural() {
        let row = upgrade_input("DMC-MODEL-SDC-SYS-12-00-AB1-0001-E.adoc");
        assert_eq!(row.result.unwrap().doc_type, DocType::Procedural);
    }

    #[test]
    fn malformed_legacy_code_is_reported() {
        let row = upgrade_input("DMC-model-SDC-SYS-12-00-AB1-CD2-E");
        assert!(row.result.is_none());
        assert!(row.error.is_some());
    }
}
