use std::path::PathBuf;

use dmforge::{
    domain::{
        dmc::{BuildParams, build_codes},
        hierarchy::{Selection, find},
    },
    storage::load_hierarchy,
};
use non_empty_string::NonEmptyString;
use tracing::instrument;

use super::{OutputFormat, print_json};

fn parse_non_empty(s: &str) -> Result<NonEmptyString, String> {
    NonEmptyString::new(s.trim().to_uppercase()).map_err(|_| "value must not be empty".to_string())
}

/// Parses a `UNIT=CODE` disassembly code override.
fn parse_disassembly(s: &str) -> Result<(usize, String), String> {
    let (unit, code) = s
        .split_once('=')
        .ok_or_else(|| format!("expected UNIT=CODE, found '{s}'"))?;
    let unit = unit
        .trim()
        .parse()
        .map_err(|e| format!("invalid unit number '{unit}': {e}"))?;
    Ok((unit, code.trim().to_uppercase()))
}

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// Model identification code
    #[arg(long, value_parser = parse_non_empty)]
    model: NonEmptyString,

    /// System difference code
    #[arg(long, default_value = "A")]
    sdc: String,

    /// System code
    #[arg(long, required_unless_present = "select")]
    system: Option<String>,

    /// Combined subsystem and sub-subsystem code
    #[arg(long, default_value = "00")]
    subsystem: String,

    /// Number of units; zero builds a single code with unit 00
    #[arg(long, default_value_t = 0)]
    units: usize,

    /// Disassembly code for one unit, as UNIT=CODE (repeatable)
    #[arg(long = "dc", value_name = "UNIT=CODE", value_parser = parse_disassembly)]
    disassembly_codes: Vec<(usize, String)>,

    /// Disassembly code variant
    #[arg(long, default_value = "A")]
    dm_variant: String,

    /// Information code
    #[arg(long, default_value = "040")]
    info_code: String,

    /// Information code variant
    #[arg(long, default_value = "A")]
    info_variant: String,

    /// Item location code
    #[arg(long, default_value = "D")]
    item_location: String,

    /// Classification source used with --select
    #[arg(long, requires = "select")]
    hierarchy: Option<PathBuf>,

    /// Full code of the system or subsystem to take codes from, e.g. 32-40
    #[arg(long, requires = "hierarchy")]
    select: Option<String>,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    output: OutputFormat,
}

impl Command {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self) -> anyhow::Result<()> {
        let output = self.output;
        let params = self.params()?;
        let codes = build_codes(&params);

        match output {
            OutputFormat::Json => print_json(&codes)?,
            OutputFormat::Text => {
                for code in &codes {
                    println!("{code}");
                }
            }
        }
        Ok(())
    }

    fn params(self) -> anyhow::Result<BuildParams> {
        let mut params = BuildParams {
            model: self.model.as_str().to_string(),
            sdc: self.sdc,
            system: self.system.unwrap_or_default(),
            subsystem: self.subsystem,
            units: self.units,
            disassembly_codes: self.disassembly_codes.into_iter().collect(),
            dm_variant: self.dm_variant,
            info_code: self.info_code,
            info_variant: self.info_variant,
            item_location: self.item_location,
        };

        if let (Some(source), Some(full_code)) = (self.hierarchy, self.select) {
            let loaded = load_hierarchy(&source, None)?;
            let tree = &loaded.report.nodes;
            let selection = find(tree, &full_code)
                .and_then(|path| Selection::from_path(tree, &path))
                .ok_or_else(|| {
                    anyhow::anyhow!("No node with code '{full_code}' in {}", source.display())
                })?;
            tracing::info!(?selection, "selected from hierarchy");
            selection.apply(&mut params);
        }

        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Debug, Parser)]
    struct Wrapper {
        #[command(flatten)]
        command: Command,
    }

    fn parse(args: &[&str]) -> Command {
        let mut argv = vec!["build"];
        argv.extend_from_slice(args);
        Wrapper::try_parse_from(argv).unwrap().command
    }

    #[test]
    fn disassembly_overrides_are_keyed_by_unit() {
        let params = parse(&[
            "--model", "m", "--system", "21", "--units", "2", "--dc", "2=5",
        ])
        .params()
        .unwrap();

        assert_eq!(params.model, "M");
        assert_eq!(
            build_codes(&params),
            vec![
                "DMC-M-A-21-00-01-00A-040A-D",
                "DMC-M-A-21-00-02-05A-040A-D",
            ]
        );
    }

    #[test]
    fn rejects_malformed_disassembly_override() {
        assert!(parse_disassembly("05").is_err());
        assert!(parse_disassembly("x=05").is_err());
    }

    #[test]
    fn selection_fills_system_and_subsystem() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("systems.json");
        std::fs::write(
            &source,
            r#"[{"system_id": "32", "title": "Landing gear",
                 "subsystems": [{"subsystem_id": "40", "title": "Brakes"}]}]"#,
        )
        .unwrap();

        let params = parse(&[
            "--model",
            "M",
            "--hierarchy",
            source.to_str().unwrap(),
            "--select",
            "32-40",
        ])
        .params()
        .unwrap();

        assert_eq!(params.system, "32");
        assert_eq!(params.subsystem, "40");
    }

    #[test]
    fn unknown_selection_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("systems.json");
        std::fs::write(&source, "[]").unwrap();

        let result = parse(&[
            "--model",
            "M",
            "--hierarchy",
            source.to_str().unwrap(),
            "--select",
            "99",
        ])
        .params();
        assert!(result.is_err());
    }
}
