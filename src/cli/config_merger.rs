//! Merges command-line overrides into file-based configuration.

use super::parser::Cli;
use crate::config::error::ConfigError;
use crate::config::{ConfigLoader, Settings};

/// CLI arguments take precedence over every configuration source.
pub struct ConfigurationMerger {
    base_config: Settings,
}

impl ConfigurationMerger {
    pub fn new(base_config: Settings) -> Self {
        Self { base_config }
    }

    /// Loads the base configuration the way the CLI asks for: an explicit
    /// `--config` file, or the layered directory, honouring `--env`.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let loader = match &cli.config {
            Some(path) => ConfigLoader::from_file(path),
            None => ConfigLoader::new()?,
        };
        let loader = match cli.env {
            Some(env) => loader.with_environment(env.into()),
            None => loader,
        };
        Ok(Self::new(loader.load()?))
    }

    pub fn merge_cli_args(&self, cli: &Cli) -> Result<Settings, ConfigError> {
        let mut config = self.base_config.clone();
        if cli.verbose {
            config.logger.level = "debug".to_string();
        } else if cli.quiet {
            config.logger.level = "error".to_string();
        }
        config.validate()?;
        Ok(config)
    }

    pub fn config(&self) -> &Settings {
        &self.base_config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_verbose_and_quiet() {
        let merger = ConfigurationMerger::new(Settings::default());
        assert_eq!(merger.config(), &Settings::default());

        let cli = Cli::try_parse_from(["tenant-billing", "--verbose", "check"]).unwrap();
        assert_eq!(merger.merge_cli_args(&cli).unwrap().logger.level, "debug");

        let cli = Cli::try_parse_from(["tenant-billing", "--quiet", "check"]).unwrap();
        assert_eq!(merger.merge_cli_args(&cli).unwrap().logger.level, "error");

        let cli = Cli::try_parse_from(["tenant-billing", "check"]).unwrap();
        assert_eq!(merger.merge_cli_args(&cli).unwrap().logger.level, "info");
    }

    #[test]
    fn test_from_cli_with_config_file() {
        let _lock = crate::config::loader::ENV_LOCK
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("billing.toml");
        std::fs::write(&path, "[listing]\ndefault_page_size = 7\n").unwrap();

        let config = path.to_str().unwrap();
        let cli = Cli::try_parse_from(["tenant-billing", "--config", config, "check"]).unwrap();
        let merger = ConfigurationMerger::from_cli(&cli).unwrap();
        assert_eq!(merger.config().listing.default_page_size, 7);
    }

    #[test]
    fn test_merged_settings_are_validated() {
        let mut base = Settings::default();
        base.listing.max_page_size = 0;
        let cli = Cli::try_parse_from(["tenant-billing", "check"]).unwrap();
        assert!(ConfigurationMerger::new(base).merge_cli_args(&cli).is_err());
    }
}
