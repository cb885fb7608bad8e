use std::path::{Path, PathBuf};

mod assemble;
mod audit;
mod build;
mod cleanup;
mod generate;
mod hierarchy;
mod init;
mod migrate;
mod rename;
mod terminal;
mod upgrade;

use clap::ArgAction;
use dmforge::{Config, domain::CONFIG_FILE_NAME};

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The path to the configuration file
    #[arg(short, long, default_value = CONFIG_FILE_NAME, global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);
        self.command.run(&self.config)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Write a configuration file with default values
    Init(init::Command),

    /// Upgrade legacy codes (or file names) to the 11-part layout
    Upgrade(upgrade::Command),

    /// Build data module codes, one per unit
    Build(build::Command),

    /// Wrap a converted body in the header and footer for its document type
    Assemble(assemble::Command),

    /// Repair conversion artifacts in AsciiDoc files
    Cleanup(cleanup::Command),

    /// Move ICNs from figure captions into image attributes
    #[command(name = "migrate-icn")]
    MigrateIcn(migrate::Command),

    /// Generate ICNs for the illustrations of a data module
    #[command(name = "generate-icn")]
    GenerateIcn(generate::Command),

    /// Compare image references against image folders
    #[command(name = "audit-images")]
    AuditImages(audit::Command),

    /// Browse or search a classification source
    Hierarchy(hierarchy::Command),

    /// Rename documents after the DMCs in a mapping table
    Rename(rename::Command),
}

impl Command {
    fn run(self, config_path: &Path) -> anyhow::Result<()> {
        match self {
            Self::Init(command) => command.run(config_path)?,
            Self::Upgrade(command) => command.run()?,
            Self::Build(command) => command.run()?,
            Self::Assemble(command) => command.run(&load_config(config_path)?)?,
            Self::Cleanup(command) => command.run()?,
            Self::MigrateIcn(command) => command.run(&load_config(config_path)?)?,
            Self::GenerateIcn(command) => command.run(&load_config(config_path)?)?,
            Self::AuditImages(command) => command.run()?,
            Self::Hierarchy(command) => command.run()?,
            Self::Rename(command) => command.run()?,
        }
        Ok(())
    }
}

/// Output format shared by the reporting commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON, for the orchestration layer
    Json,
}

fn load_config(path: &Path) -> anyhow::Result<Config> {
    Config::load_or_default(path).map_err(anyhow::Error::msg)
}

/// Prints a value as pretty JSON on stdout.
fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Asks before files are modified in place.
///
/// Exits with status 130 when the user declines.
fn confirm(prompt: &str) -> anyhow::Result<()> {
    let proceed = dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?;
    if !proceed {
        println!("Cancelled");
        std::process::exit(130);
    }
    Ok(())
}

/// A progress bar for per-file work, hidden when there is only one file.
fn progress(len: usize) -> indicatif::ProgressBar {
    if len < 2 {
        return indicatif::ProgressBar::hidden();
    }
    let bar = indicatif::ProgressBar::new(len as u64);
    if let Ok(style) = indicatif::ProgressStyle::with_template("{bar:40} {pos}/{len} {wide_msg}") {
        bar.set_style(style);
    }
    bar
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn config_defaults_to_project_file() {
        let cli = Cli::try_parse_from(["dmforge", "upgrade", "DMC-A-B-C-1-00-00A-000A-D"]).unwrap();
        assert_eq!(cli.config, PathBuf::from(CONFIG_FILE_NAME));
        assert!(matches!(cli.command, Command::Upgrade(_)));
    }

    #[test]
    fn subcommands_parse() {
        for args in [
            vec!["dmforge", "migrate-icn", "docs"],
            vec!["dmforge", "generate-icn", "DMC-A-B-C-1-00-00A-040A-D"],
            vec!["dmforge", "audit-images", "adoc", "images"],
            vec!["dmforge", "rename", "map.xlsx", "docs", "--execute"],
        ] {
            assert!(Cli::try_parse_from(args).is_ok());
        }
    }
}
