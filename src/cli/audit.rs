use std::path::PathBuf;

use dmforge::{document::images::AuditStatus, storage};
use tracing::instrument;

use super::{OutputFormat, print_json, terminal::Colorize};

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// Directory of .adoc files
    adoc_dir: PathBuf,

    /// Directory holding one image folder per document
    images_dir: PathBuf,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    output: OutputFormat,
}

impl Command {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self) -> anyhow::Result<()> {
        let audits = storage::audit_directory(&self.adoc_dir, &self.images_dir);
        if audits.is_empty() {
            anyhow::bail!(storage::BatchError::EmptyInput);
        }

        if self.output == OutputFormat::Json {
            return print_json(&audits);
        }

        let mut warnings = 0;
        for audit in &audits {
            let file = audit.file.display();
            match (&audit.audit, &audit.error) {
                (Some(result), _) if result.status == AuditStatus::Ok => {
                    println!("{}", format!("✅ {file}").success());
                }
                (Some(result), _) => {
                    warnings += 1;
                    println!("{}", format!("⚠️  {file}").warning());
                    for missing in &result.missing {
                        println!("    missing: {missing}");
                    }
                    for unused in &result.unused {
                        println!("    {}", format!("unused:  {unused}").dim());
                    }
                }
                (None, error) => {
                    warnings += 1;
                    eprintln!(
                        "{}",
                        format!("❌ {file}: {}", error.as_deref().unwrap_or("unreadable"))
                            .error()
                    );
                }
            }
        }

        println!();
        println!("{} of {} document(s) need attention", warnings, audits.len());
        Ok(())
    }
}
