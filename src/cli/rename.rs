use std::path::PathBuf;

use anyhow::Context;
use dmforge::{
    domain::rename::{MappingRow, RenameEntry, RenameStatus},
    storage::{self, RenameOutcome},
};
use serde::Serialize;
use tracing::instrument;

use super::{OutputFormat, confirm, print_json, terminal::Colorize};

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// Mapping table (.csv, .xlsx, .xlsm, .xlsb, .xls or .ods) with document
    /// name and DMC code columns
    mapping: PathBuf,

    /// Folder holding the documents to rename
    folder: PathBuf,

    /// Extension of the documents to rename
    #[arg(long, default_value = "docx")]
    extension: String,

    /// Rename the files; without this only the preview is shown
    #[arg(long)]
    execute: bool,

    /// Skip the confirmation prompt
    #[arg(long, short)]
    yes: bool,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    output: OutputFormat,
}

#[derive(Debug, Serialize)]
struct Report<'a> {
    preview: &'a [RenameEntry],
    mapping: &'a [MappingRow],
    #[serde(skip_serializing_if = "Option::is_none")]
    outcome: Option<&'a RenameOutcome>,
}

impl Command {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self) -> anyhow::Result<()> {
        let mapping = storage::read_mapping(&self.mapping)?;
        if mapping.is_empty() {
            tracing::warn!("{} has no usable rows", self.mapping.display());
        }
        let preview = storage::preview_directory(&self.folder, &mapping, &self.extension)
            .with_context(|| format!("Failed to list {}", self.folder.display()))?;

        let ready = preview
            .iter()
            .filter(|entry| entry.status == RenameStatus::Ready)
            .filter(|entry| entry.original_name != entry.new_name)
            .count();

        if self.output == OutputFormat::Text {
            print_preview(&preview);
        }

        let outcome = if self.execute && ready > 0 {
            if !self.yes {
                confirm(&format!("Rename {ready} file(s)?"))?;
            }
            Some(storage::rename::execute(&self.folder, &preview))
        } else {
            None
        };

        match self.output {
            OutputFormat::Json => print_json(&Report {
                preview: &preview,
                mapping: mapping.rows(),
                outcome: outcome.as_ref(),
            })?,
            OutputFormat::Text => match &outcome {
                Some(outcome) => print_outcome(outcome),
                None if self.execute => println!("Nothing to rename"),
                None => println!("{ready} file(s) ready; run with --execute to rename"),
            },
        }

        if let Some(outcome) = outcome {
            if !outcome.errors.is_empty() {
                anyhow::bail!("{} file(s) could not be renamed", outcome.errors.len());
            }
        }
        Ok(())
    }
}

fn print_preview(preview: &[RenameEntry]) {
    if preview.is_empty() {
        println!("No documents found");
        return;
    }

    for entry in preview {
        match entry.status {
            RenameStatus::Ready => println!(
                "{}",
                format!("✓ {} → {}", entry.original_name, entry.new_name).success()
            ),
            RenameStatus::Exists => println!(
                "{}",
                format!("⚠ {} → {} (exists)", entry.original_name, entry.new_name).warning()
            ),
            RenameStatus::NoMapping if entry.available_matches.is_empty() => println!(
                "{}",
                format!("⚠ {}: no mapping", entry.original_name).warning()
            ),
            RenameStatus::NoMapping => println!(
                "{}",
                format!(
                    "⚠ {}: no mapping (mapped names: {})",
                    entry.original_name,
                    entry.available_matches.join(", ")
                )
                .warning()
            ),
        }
    }
}

fn print_outcome(outcome: &RenameOutcome) {
    for error in &outcome.errors {
        eprintln!("{}", format!("❌ {error}").error());
    }
    println!("{}", format!("✅ Renamed {} file(s)", outcome.renamed).success());
}
