use super::ui;
use crate::core::config::AppConfig;
use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Bundled sample with the default schedule, three scenarios and a step replay.
const EXAMPLE_CONFIG: &str = include_str!("../../docs/example_config.yaml");

/// Writes the sample configuration to `config_path`, or to the platform
/// config directory when none is given, and reports where it went.
pub fn run(config_path: Option<&str>) -> Result<PathBuf> {
    let path = match config_path {
        Some(path) => PathBuf::from(path),
        None => AppConfig::default_config_path()?,
    };
    write_example_config(&path)?;
    println!(
        "Wrote sample scenarios to {}",
        ui::style_text(&path.display().to_string(), ui::StyleType::Title)
    );
    println!("Edit the scenarios, then run `reino compare` or `reino simulate`.");
    Ok(path)
}

/// Writes the sample configuration, creating parent directories. An existing
/// file is left untouched and reported as an error.
pub fn write_example_config(path: &Path) -> Result<()> {
    if path.exists() {
        bail!(
            "Configuration file already exists at {}; remove it or pass another --config-path",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, EXAMPLE_CONFIG)
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;

    info!(path = %path.display(), "Wrote sample configuration");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_run_writes_to_the_given_path() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("nested").join("config.yaml");

        let written = run(config_path.to_str())?;
        assert_eq!(written, config_path);

        let content = fs::read_to_string(&config_path)?;
        assert!(content.starts_with("# Example configuration file for reino"));
        assert!(content.contains("pricing_mode:"));
        assert!(content.contains("steps:"));

        Ok(())
    }

    #[test]
    fn test_existing_config_is_not_overwritten() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("config.yaml");
        fs::write(&config_path, "currency: USD")?;

        let err = write_example_config(&config_path).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(fs::read_to_string(&config_path)?, "currency: USD");

        Ok(())
    }

    #[test]
    fn test_example_config_is_valid() -> Result<()> {
        let config: AppConfig = serde_yaml::from_str(EXAMPLE_CONFIG)
            .context("Failed to parse example config as YAML")?;

        assert_eq!(config.currency, "BRL");
        assert_eq!(config.scenarios.len(), 3);
        let replay = config
            .scenarios
            .iter()
            .find(|s| !s.steps.is_empty())
            .context("No scenario with steps")?;
        assert_eq!(replay.steps.len(), 6);
        config.fee_calculator()?;

        Ok(())
    }
}
