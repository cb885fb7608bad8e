use std::path::PathBuf;

use dmforge::{
    Config,
    document::{FileReport, FileStatus},
    storage,
};
use serde::Serialize;
use tracing::instrument;

use super::{OutputFormat, confirm, print_json, terminal::Colorize};

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// A directory of .adoc files, or a single file
    path: PathBuf,

    /// Lines after each image searched for a caption ICN [default: from config]
    #[arg(long)]
    window: Option<usize>,

    /// Report what would change without writing
    #[arg(long)]
    dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(long, short)]
    yes: bool,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    output: OutputFormat,
}

#[derive(Debug, Serialize)]
struct Summary<'a> {
    total_files: usize,
    processed: usize,
    total_changes: usize,
    results: &'a [FileReport],
}

impl Command {
    #[instrument(level = "debug", skip(self, config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let window = self.window.unwrap_or_else(|| config.migration_window()).max(1);
        let files = storage::collect_adoc_files(&self.path);

        let write = !self.dry_run;
        if write && !self.yes && self.output == OutputFormat::Text && !files.is_empty() {
            confirm(&format!(
                "Migrate caption ICNs in {} file(s) in place?",
                files.len()
            ))?;
        }

        let reports: Vec<FileReport> = storage::migrate_files(&files, window, write)?.into();

        let summary = Summary {
            total_files: reports.len(),
            processed: reports
                .iter()
                .filter(|r| r.status != FileStatus::Error)
                .count(),
            total_changes: reports.iter().map(|r| r.changes).sum(),
            results: &reports,
        };

        match self.output {
            OutputFormat::Json => print_json(&summary)?,
            OutputFormat::Text => print_text(&summary, self.dry_run),
        }

        if summary.processed < summary.total_files {
            anyhow::bail!(
                "{} file(s) could not be processed",
                summary.total_files - summary.processed
            );
        }
        Ok(())
    }
}

fn print_text(summary: &Summary<'_>, dry_run: bool) {
    for report in summary.results {
        let file = report.file.display();
        match report.status {
            FileStatus::Success => println!(
                "{}",
                format!("✅ {file}: {} ICN(s) moved", report.changes).success()
            ),
            FileStatus::NoChanges => println!("{}", format!("   {file}: no changes").dim()),
            FileStatus::Error => eprintln!(
                "{}",
                format!(
                    "❌ {file}: {}",
                    report.message.as_deref().unwrap_or("unknown error")
                )
                .error()
            ),
        }
    }

    let verb = if dry_run { "Would move" } else { "Moved" };
    println!();
    println!(
        "{verb} {} ICN(s) across {} file(s)",
        summary.total_changes, summary.total_files
    );
}
