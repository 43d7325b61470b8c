//! Layered configuration: TOML files plus `BILLING_*` environment
//! overrides, validated before use.
//!
//! Priority, lowest first:
//! 1. `default.toml`
//! 2. `{environment}.toml` (`BILLING_APP_ENV`, development by default)
//! 3. `local.toml`
//! 4. `BILLING_*` environment variables

pub mod environment;
pub mod error;
pub mod loader;
pub mod settings;
pub mod validation;

pub use environment::Environment;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use settings::{
    ApplicationConfig, AuthorizationConfig, I18nConfig, ListingConfig, LoggerSettings,
    ProvidersConfig, Settings,
};
