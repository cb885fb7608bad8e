use std::{
    io::Read,
    path::{Path, PathBuf},
};

use anyhow::Context;
use dmforge::{document::cleanup, storage};
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use tracing::instrument;

use super::{confirm, progress, terminal::Colorize};

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// Files or directories to clean; `-` filters stdin to stdout
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Only report files that need cleaning; exits non-zero if any do
    #[arg(long)]
    check: bool,

    /// Skip the confirmation prompt
    #[arg(long, short)]
    yes: bool,
}

impl Command {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self) -> anyhow::Result<()> {
        if self.paths.iter().any(|path| path == Path::new("-")) {
            return filter_stdin();
        }

        let files: Vec<PathBuf> = self
            .paths
            .iter()
            .flat_map(|path| storage::collect_adoc_files(path))
            .collect();
        if files.is_empty() {
            anyhow::bail!(storage::BatchError::EmptyInput);
        }

        if self.check {
            return check(&files);
        }

        if !self.yes {
            confirm(&format!("Clean {} file(s) in place?", files.len()))?;
        }

        let bar = progress(files.len());
        let results: Vec<(PathBuf, std::io::Result<bool>)> = files
            .par_iter()
            .map(|path| {
                let result = storage::cleanup_file(path);
                bar.inc(1);
                (path.clone(), result)
            })
            .collect();
        bar.finish_and_clear();

        let mut changed = 0;
        let mut failed = 0;
        for (path, result) in results {
            match result {
                Ok(true) => changed += 1,
                Ok(false) => {}
                Err(e) => {
                    failed += 1;
                    eprintln!("{}", format!("❌ {}: {e}", path.display()).error());
                }
            }
        }

        println!(
            "{}",
            format!("✅ Cleaned {changed} of {} file(s)", files.len()).success()
        );
        if failed > 0 {
            anyhow::bail!("{failed} file(s) could not be cleaned");
        }
        Ok(())
    }
}

fn filter_stdin() -> anyhow::Result<()> {
    let mut text = String::new();
    std::io::stdin().read_to_string(&mut text)?;
    print!("{}", cleanup(&text));
    Ok(())
}

fn check(files: &[PathBuf]) -> anyhow::Result<()> {
    let mut dirty = Vec::new();
    for path in files {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if cleanup(&content) != content {
            dirty.push(path);
        }
    }

    if dirty.is_empty() {
        println!("{}", "✅ All files are clean".success());
        return Ok(());
    }

    for path in &dirty {
        println!("{}", format!("⚠️  {} needs cleaning", path.display()).warning());
    }
    std::process::exit(1);
}
