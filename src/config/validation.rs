//! Validation of loaded settings. Each section reports the first problem it
//! finds under the dotted key of the offending setting.

use crate::config::error::ConfigError;
use crate::config::settings::{
    AuthorizationConfig, FileSettings, I18nConfig, ListingConfig, LoggerSettings,
    ProvidersConfig, Settings,
};

const VALID_LOG_FORMATS: &[&str] = &["full", "compact", "json"];

/// Upper bound for any page size, per entity caps included.
pub const PAGE_SIZE_CEILING: usize = 1000;

impl FileSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled && self.path.trim().is_empty() {
            return Err(ConfigError::validation(
                "logger.file.path",
                "File path is required when file logging is enabled.",
            ));
        }
        if !VALID_LOG_FORMATS.contains(&self.format.to_lowercase().as_str()) {
            return Err(ConfigError::validation(
                "logger.file.format",
                format!(
                    "Invalid log format '{}'. Valid formats are: {}",
                    self.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            ));
        }
        Ok(())
    }
}

impl LoggerSettings {
    /// The level may be a directive list, so only emptiness is checked here;
    /// unparsable directives fall back to `info` at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.level.trim().is_empty() {
            return Err(ConfigError::validation("logger.level", "Log level is required."));
        }
        if !self.console.enabled && !self.file.enabled {
            return Err(ConfigError::validation(
                "logger",
                "At least one output (console or file) must be enabled.",
            ));
        }
        self.file.validate()
    }
}

impl ListingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_page_size == 0 || self.max_page_size > PAGE_SIZE_CEILING {
            return Err(ConfigError::validation(
                "listing.max_page_size",
                format!("Max page size must be between 1 and {PAGE_SIZE_CEILING}."),
            ));
        }
        if self.default_page_size == 0 {
            return Err(ConfigError::validation(
                "listing.default_page_size",
                "Default page size must be greater than 0.",
            ));
        }
        if self.default_page_size > self.max_page_size {
            return Err(ConfigError::validation(
                "listing.default_page_size",
                format!(
                    "Default page size ({}) cannot exceed max page size ({}).",
                    self.default_page_size, self.max_page_size
                ),
            ));
        }
        Ok(())
    }
}

impl AuthorizationConfig {
    /// Every grant must look like `entity:action`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (user, grants) in &self.grants {
            if user.trim().is_empty() {
                return Err(ConfigError::validation(
                    "authorization.grants",
                    "Grant keys must be a user id or '*'.",
                ));
            }
            for grant in grants {
                let valid = grant
                    .split_once(':')
                    .is_some_and(|(entity, action)| {
                        !entity.is_empty() && !action.is_empty() && !action.contains(':')
                    });
                if !valid {
                    return Err(ConfigError::validation(
                        format!("authorization.grants.{user}"),
                        format!("Invalid grant '{grant}'. Expected 'entity:action'."),
                    ));
                }
            }
        }
        Ok(())
    }
}

impl ProvidersConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let names = [
            ("providers.authorization", &self.authorization),
            ("providers.transaction", &self.transaction),
            ("providers.id", &self.id),
            ("providers.repository", &self.repository),
        ];
        if let Some((field, _)) = names.iter().find(|(_, name)| name.trim().is_empty()) {
            return Err(ConfigError::validation(*field, "Provider name is required."));
        }
        if self.id == "sequential" && self.id_prefix.trim().is_empty() {
            return Err(ConfigError::validation(
                "providers.id_prefix",
                "Sequential ids need a non-empty prefix.",
            ));
        }
        Ok(())
    }
}

impl I18nConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_business_type.trim().is_empty() {
            return Err(ConfigError::validation(
                "i18n.default_business_type",
                "Default business type is required.",
            ));
        }
        if let Some(dir) = &self.catalog_dir {
            if !dir.is_dir() {
                return Err(ConfigError::validation(
                    "i18n.catalog_dir",
                    format!("Catalog directory '{}' does not exist.", dir.display()),
                ));
            }
        }
        Ok(())
    }
}

impl Settings {
    /// Returns the first validation error across all sections.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.logger.validate()?;
        self.listing.validate()?;
        self.authorization.validate()?;
        self.providers.validate()?;
        self.i18n.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn field_of(result: Result<(), ConfigError>) -> String {
        result
            .unwrap_err()
            .field()
            .map(str::to_string)
            .unwrap_or_default()
    }

    #[test]
    fn test_default_settings_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_logger_requires_an_output() {
        let mut logger = LoggerSettings::default();
        logger.console.enabled = false;
        assert_eq!(field_of(logger.validate()), "logger");

        logger.file.enabled = true;
        assert!(logger.validate().is_ok());

        logger.file.path = "  ".to_string();
        assert_eq!(field_of(logger.validate()), "logger.file.path");
    }

    #[test]
    fn test_logger_format_and_level() {
        let mut logger = LoggerSettings::default();
        logger.file.format = "yaml".to_string();
        assert_eq!(field_of(logger.validate()), "logger.file.format");

        let mut logger = LoggerSettings::default();
        logger.level = String::new();
        assert_eq!(field_of(logger.validate()), "logger.level");
    }

    #[test]
    fn test_listing_bounds() {
        let cases = [
            (20, 0, "listing.max_page_size"),
            (20, 1001, "listing.max_page_size"),
            (0, 100, "listing.default_page_size"),
            (150, 100, "listing.default_page_size"),
        ];
        for (default_page_size, max_page_size, field) in cases {
            let listing = ListingConfig {
                default_page_size,
                max_page_size,
            };
            assert_eq!(field_of(listing.validate()), field);
        }
        let ceiling = ListingConfig {
            default_page_size: 1000,
            max_page_size: 1000,
        };
        assert!(ceiling.validate().is_ok());
    }

    #[test]
    fn test_grant_format() {
        let mut authz = AuthorizationConfig::default();
        authz
            .grants
            .insert("alice".to_string(), vec!["*:*".to_string(), "invoice:read".to_string()]);
        assert!(authz.validate().is_ok());

        authz
            .grants
            .insert("bob".to_string(), vec!["invoice".to_string()]);
        assert_eq!(field_of(authz.validate()), "authorization.grants.bob");

        authz.grants.insert("bob".to_string(), vec!["a:b:c".to_string()]);
        assert_eq!(field_of(authz.validate()), "authorization.grants.bob");
    }

    #[test]
    fn test_providers() {
        let mut providers = ProvidersConfig::default();
        providers.transaction = String::new();
        assert_eq!(field_of(providers.validate()), "providers.transaction");

        let mut providers = ProvidersConfig::default();
        providers.id = "sequential".to_string();
        providers.id_prefix = String::new();
        assert_eq!(field_of(providers.validate()), "providers.id_prefix");
    }

    #[test]
    fn test_catalog_dir_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let mut i18n = I18nConfig {
            catalog_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        assert!(i18n.validate().is_ok());

        i18n.catalog_dir = Some(PathBuf::from("/definitely/not/here"));
        assert_eq!(field_of(i18n.validate()), "i18n.catalog_dir");
    }
}
