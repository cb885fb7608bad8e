use std::path::Path;

use dmforge::Config;
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// Overwrite an existing configuration file
    #[arg(long)]
    force: bool,
}

impl Command {
    #[instrument]
    pub fn run(self, config_path: &Path) -> anyhow::Result<()> {
        if config_path.exists() && !self.force {
            anyhow::bail!(
                "Configuration already exists at {} (use --force to overwrite)",
                config_path.display()
            );
        }

        if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| anyhow::anyhow!("Failed to create {}: {e}", parent.display()))?;
        }

        Config::default()
            .save(config_path)
            .map_err(|e| anyhow::anyhow!("Failed to create {}: {e}", config_path.display()))?;

        println!(
            "{}",
            format!("✅ Created {}", config_path.display()).success()
        );
        println!();
        println!("Next steps:");
        println!("  Edit the [header] section with your project's values");
        println!("  dmforge assemble body.adoc --code <DMC>");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_default_config() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("dmforge.toml");

        Command { force: false }.run(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), Config::default());
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("dmforge.toml");
        std::fs::write(&path, "_version = \"1\"\nmigration_window = 9\n").unwrap();

        assert!(Command { force: false }.run(&path).is_err());
        Command { force: true }.run(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap().migration_window(), 5);
    }
}
