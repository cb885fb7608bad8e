use std::path::{Path, PathBuf};

use anyhow::Context;
use dmforge::{
    Config,
    domain::icn::{IcnSequence, extract_icn_labels, generate_icn, label_media},
};
use serde::Serialize;
use tracing::instrument;

use super::{OutputFormat, print_json};

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// Data module code the illustrations belong to
    #[arg(required_unless_present = "from_text")]
    dmc: Option<String>,

    /// Number of ICNs to generate
    #[arg(long, short = 'n', default_value_t = 1)]
    count: usize,

    /// First sequence number; its width sets the zero padding
    #[arg(long, default_value = "0001")]
    start: String,

    /// Responsible partner company code [default: from config]
    #[arg(long)]
    kpc: Option<String>,

    /// Originator code [default: from config]
    #[arg(long)]
    xyz: Option<String>,

    /// Name media files after the ICN labels found in this plain-text export
    #[arg(long, conflicts_with = "dmc", requires = "media")]
    from_text: Option<PathBuf>,

    /// Media files to name, in document order (with --from-text)
    #[arg(long, num_args = 1..)]
    media: Vec<String>,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    output: OutputFormat,
}

#[derive(Debug, Serialize)]
struct Renamed<'a> {
    media: &'a str,
    name: String,
}

impl Command {
    #[instrument(level = "debug", skip(self, config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        if let Some(text) = &self.from_text {
            return self.name_media(text);
        }

        let icns = self.generate(config)?;
        match self.output {
            OutputFormat::Json => print_json(&icns)?,
            OutputFormat::Text => {
                for icn in &icns {
                    println!("{icn}");
                }
            }
        }
        Ok(())
    }

    fn generate(&self, config: &Config) -> anyhow::Result<Vec<String>> {
        let dmc = self.dmc.as_deref().unwrap_or_default().trim();
        let mut params = config.icn.clone();
        if let Some(kpc) = &self.kpc {
            params.kpc.clone_from(kpc);
        }
        if let Some(xyz) = &self.xyz {
            params.xyz.clone_from(xyz);
        }

        Ok(IcnSequence::new(&self.start)?
            .take(self.count)
            .map(|sequence| generate_icn(dmc, &params, &sequence))
            .collect())
    }

    fn name_media(&self, text: &Path) -> anyhow::Result<()> {
        let content = std::fs::read_to_string(text)
            .with_context(|| format!("Failed to read {}", text.display()))?;
        let labels = extract_icn_labels(&content);
        tracing::info!("Found {} ICN label(s) in {}", labels.len(), text.display());

        let names = label_media(&self.media, &labels);
        let renamed: Vec<Renamed<'_>> = self
            .media
            .iter()
            .zip(names)
            .map(|(media, name)| Renamed { media, name })
            .collect();

        match self.output {
            OutputFormat::Json => print_json(&renamed)?,
            OutputFormat::Text => {
                for entry in &renamed {
                    println!("{} → {}", entry.media, entry.name);
                }
            }
        }
        Ok(())
    }
}
