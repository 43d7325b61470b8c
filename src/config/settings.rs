//! Configuration settings loaded from TOML files and `BILLING_*` variables.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;
use crate::listing::PageLimits;
use crate::logger::{ConsoleConfig, FileConfig, LogFormat, LoggerConfig};

fn default_app_name() -> String {
    "tenant-billing".to_string()
}

fn default_app_version() -> String {
    crate::pkg_version().to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_path() -> String {
    "logs/tenant-billing.log".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_page_size() -> usize {
    20
}

fn default_max_page_size() -> usize {
    100
}

fn default_authorization_provider() -> String {
    "static".to_string()
}

fn default_transaction_provider() -> String {
    "noop".to_string()
}

fn default_id_provider() -> String {
    "uuid".to_string()
}

fn default_id_prefix() -> String {
    "id".to_string()
}

fn default_repository_provider() -> String {
    "memory".to_string()
}

fn default_business_type() -> String {
    crate::services::DEFAULT_BUSINESS_TYPE.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    #[serde(default = "default_app_name")]
    pub name: String,

    #[serde(default = "default_app_version")]
    pub version: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            version: default_app_version(),
        }
    }
}

// ============================================================================
// Logger
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_true")]
    pub colored: bool,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            colored: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSettings {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_log_path")]
    pub path: String,

    #[serde(default = "default_true")]
    pub append: bool,

    /// "full", "compact" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_log_path(),
            append: true,
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerSettings {
    /// Level name or `EnvFilter` directive list.
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub console: ConsoleSettings,

    #[serde(default)]
    pub file: FileSettings,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            console: ConsoleSettings::default(),
            file: FileSettings::default(),
        }
    }
}

impl LoggerSettings {
    /// Converts the file representation into the logger's runtime config.
    pub fn to_logger_config(&self) -> Result<LoggerConfig, ConfigError> {
        let format = self
            .file
            .format
            .parse::<LogFormat>()
            .map_err(|e| ConfigError::validation("logger.file.format", e.to_string()))?;
        let file = FileConfig::new(
            self.file.enabled,
            PathBuf::from(&self.file.path),
            self.file.append,
            format,
        )
        .map_err(|e| ConfigError::validation("logger.file", e.to_string()))?;
        let console = ConsoleConfig::new(self.console.enabled, self.console.colored);

        LoggerConfig::new(console, file, self.level.clone())
            .map_err(|e| ConfigError::validation("logger", e.to_string()))
    }
}

// ============================================================================
// Listing
// ============================================================================

/// Page size defaults for the list data processor. Entities may lower or
/// raise the maximum through their own page cap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingConfig {
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,

    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

impl ListingConfig {
    pub fn page_limits(&self) -> PageLimits {
        PageLimits {
            default_limit: self.default_page_size,
            max_limit: self.max_page_size,
        }
    }
}

// ============================================================================
// Authorization
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationConfig {
    /// When false every request is allowed regardless of provider.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// User id (or `*`) to `entity:action` permissions, `*` allowed on
    /// either side.
    #[serde(default)]
    pub grants: HashMap<String, Vec<String>>,
}

impl Default for AuthorizationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            grants: HashMap::new(),
        }
    }
}

// ============================================================================
// Providers
// ============================================================================

/// Provider names resolved through the provider registry at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// "static" or "disabled"
    #[serde(default = "default_authorization_provider")]
    pub authorization: String,

    /// "noop" or "serial"
    #[serde(default = "default_transaction_provider")]
    pub transaction: String,

    /// "uuid" or "sequential"
    #[serde(default = "default_id_provider")]
    pub id: String,

    /// Prefix for the sequential id provider.
    #[serde(default = "default_id_prefix")]
    pub id_prefix: String,

    /// "memory"
    #[serde(default = "default_repository_provider")]
    pub repository: String,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            authorization: default_authorization_provider(),
            transaction: default_transaction_provider(),
            id: default_id_provider(),
            id_prefix: default_id_prefix(),
            repository: default_repository_provider(),
        }
    }
}

// ============================================================================
// I18n
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct I18nConfig {
    /// Business type used when a request does not name one.
    #[serde(default = "default_business_type")]
    pub default_business_type: String,

    /// Directory of `<business_type>.json` catalogs layered over the
    /// embedded ones.
    #[serde(default)]
    pub catalog_dir: Option<PathBuf>,
}

impl Default for I18nConfig {
    fn default() -> Self {
        Self {
            default_business_type: default_business_type(),
            catalog_dir: None,
        }
    }
}

/// Complete application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub application: ApplicationConfig,

    #[serde(default)]
    pub logger: LoggerSettings,

    #[serde(default)]
    pub listing: ListingConfig,

    #[serde(default)]
    pub authorization: AuthorizationConfig,

    #[serde(default)]
    pub providers: ProvidersConfig,

    #[serde(default)]
    pub i18n: I18nConfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_logger_settings() -> impl Strategy<Value = LoggerSettings> {
        (
            prop::sample::select(vec!["trace", "debug", "info", "warn", "error"]),
            any::<bool>(),
            any::<bool>(),
            any::<bool>(),
            "[a-z]{1,8}/[a-z]{1,8}\\.log",
            prop::sample::select(vec!["full", "compact", "json"]),
        )
            .prop_map(|(level, colored, enabled, append, path, format)| LoggerSettings {
                level: level.to_string(),
                console: ConsoleSettings {
                    enabled: true,
                    colored,
                },
                file: FileSettings {
                    enabled,
                    path,
                    append,
                    format: format.to_string(),
                },
            })
    }

    fn arb_grants() -> impl Strategy<Value = HashMap<String, Vec<String>>> {
        prop::collection::hash_map(
            "[a-z]{1,8}",
            prop::collection::vec("(\\*|[a-z_]{1,12}):(\\*|[a-z]{1,8})", 0..4),
            0..4,
        )
    }

    fn arb_settings() -> impl Strategy<Value = Settings> {
        (
            "[a-z][a-z0-9-]{0,20}",
            arb_logger_settings(),
            (1usize..50, 50usize..1000),
            any::<bool>(),
            arb_grants(),
            prop::sample::select(vec!["noop", "serial"]),
            prop::sample::select(vec!["default", "education", "fitness_center"]),
        )
            .prop_map(
                |(name, logger, (default_page_size, max_page_size), enabled, grants, tx, bt)| {
                    Settings {
                        application: ApplicationConfig {
                            name,
                            ..Default::default()
                        },
                        logger,
                        listing: ListingConfig {
                            default_page_size,
                            max_page_size,
                        },
                        authorization: AuthorizationConfig { enabled, grants },
                        providers: ProvidersConfig {
                            transaction: tx.to_string(),
                            ..Default::default()
                        },
                        i18n: I18nConfig {
                            default_business_type: bt.to_string(),
                            catalog_dir: None,
                        },
                    }
                },
            )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_settings_toml_round_trip(settings in arb_settings()) {
            let text = toml::to_string(&settings).expect("Settings should serialize to TOML");
            let parsed: Settings = toml::from_str(&text).expect("TOML should parse back");
            prop_assert_eq!(settings, parsed);
        }
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.application.name, "tenant-billing");
        assert_eq!(settings.application.version, crate::pkg_version());
        assert_eq!(settings.listing.page_limits(), PageLimits::default());
        assert!(settings.authorization.enabled);
        assert_eq!(settings.providers.authorization, "static");
        assert_eq!(settings.providers.transaction, "noop");
        assert_eq!(settings.providers.id, "uuid");
        assert_eq!(settings.providers.repository, "memory");
        assert_eq!(settings.i18n.default_business_type, "default");
    }

    #[test]
    fn test_deserialize_partial() {
        let settings: Settings = toml::from_str(
            r#"
            [listing]
            max_page_size = 250

            [authorization.grants]
            alice = ["*:*"]
            "*" = ["workspace:read"]

            [providers]
            id = "sequential"
            id_prefix = "t"
            "#,
        )
        .expect("Failed to deserialize");

        assert_eq!(settings.listing.default_page_size, 20);
        assert_eq!(settings.listing.max_page_size, 250);
        assert_eq!(settings.authorization.grants["alice"], vec!["*:*"]);
        assert_eq!(settings.authorization.grants["*"], vec!["workspace:read"]);
        assert_eq!(settings.providers.id, "sequential");
        assert_eq!(settings.providers.id_prefix, "t");
        assert_eq!(settings.providers.transaction, "noop");
    }

    #[test]
    fn test_logger_settings_conversion() {
        let mut logger = LoggerSettings::default();
        logger.file.enabled = true;
        logger.file.format = "Compact".to_string();
        let config = logger.to_logger_config().unwrap();
        assert_eq!(config.file.format, LogFormat::Compact);
        assert_eq!(config.file.path, PathBuf::from("logs/tenant-billing.log"));

        logger.file.format = "xml".to_string();
        let err = logger.to_logger_config().unwrap_err();
        assert_eq!(err.field(), Some("logger.file.format"));
    }
}
