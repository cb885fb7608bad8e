use std::{
    io::Read,
    path::{Path, PathBuf},
};

use anyhow::Context;
use dmforge::{Config, document::convert, domain::dmc::upgrade_str};
use tracing::instrument;

use super::{OutputFormat, print_json, terminal::Colorize};

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// The converted body; `-` reads from stdin
    body: PathBuf,

    /// Target data module code; legacy codes are upgraded first
    #[arg(long)]
    code: String,

    /// Document type (descript, proced, fault, ipd); classified from the
    /// code when omitted
    #[arg(long)]
    doc_type: Option<String>,

    /// Stamp today's date as the issue date
    #[arg(long)]
    today: bool,

    /// Write the data module here instead of stdout
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Output format; json prints the full conversion result
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    output: OutputFormat,
}

impl Command {
    #[instrument(level = "debug", skip(self, config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let body = read_body(&self.body)?;
        let code = upgrade_str(self.code.trim())?;

        let mut fields = config.header.clone();
        if self.today {
            fields.issue_date = Some(chrono::Local::now().format("%Y-%m-%d").to_string());
        }

        let result = convert(body, &code.code, self.doc_type.as_deref(), &fields);

        if self.output == OutputFormat::Json {
            print_json(&result)?;
            if !result.success {
                std::process::exit(1);
            }
            return Ok(());
        }

        let Some(data) = result.data else {
            anyhow::bail!(result.error.unwrap_or_else(|| "conversion failed".to_string()));
        };

        match &self.out {
            Some(path) => {
                std::fs::write(path, &data)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                eprintln!(
                    "{}",
                    format!("✅ Wrote {} ({})", path.display(), code.code).success()
                );
            }
            None => print!("{data}"),
        }
        Ok(())
    }
}

fn read_body(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut body = String::new();
        std::io::stdin().read_to_string(&mut body)?;
        return Ok(body);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_assembled_module() {
        let tmp = tempfile::tempdir().unwrap();
        let body = tmp.path().join("body.adoc");
        let out = tmp.path().join("dm.adoc");
        std::fs::write(&body, "Remove the panel. +\n").unwrap();

        Command {
            body,
            code: "DMC-MODEL-SDC-SYS-12-00-AB1-0001-E".to_string(),
            doc_type: None,
            today: false,
            out: Some(out.clone()),
            output: OutputFormat::Text,
        }
        .run(&Config::default())
        .unwrap();

        let assembled = std::fs::read_to_string(out).unwrap();
        assert!(assembled.starts_with(":dmc: MODEL-SDC-SYS-1-2-00-AB-1-000-1-E\n"));
        assert!(assembled.contains("Remove the panel.\n"));
        assert!(assembled.ends_with("== Closeout Requirements\n"));
    }

    #[test]
    fn rejects_unknown_doc_type() {
        let tmp = tempfile::tempdir().unwrap();
        let body = tmp.path().join("body.adoc");
        std::fs::write(&body, "").unwrap();

        let result = Command {
            body,
            code: "MODEL-SDC-SYS-1-2-00-AB-1-040-A-E".to_string(),
            doc_type: Some("manual".to_string()),
            today: false,
            out: None,
            output: OutputFormat::Text,
        }
        .run(&Config::default());

        assert!(result.is_err());
    }
}
