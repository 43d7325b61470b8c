//! Tenant billing library
//!
//! Billing entities for multi-tenant workspaces, the use cases that guard
//! them, and the list data processor behind every list view.

use shadow_rs::shadow;
shadow!(build);

pub mod cli;
pub mod config;
pub mod error;
pub mod listing;
pub mod logger;
pub mod models;
pub mod registry;
pub mod repositories;
pub mod services;
pub mod state;
pub mod usecases;

pub use state::AppState;

pub fn pkg_version() -> &'static str {
    build::PKG_VERSION
}

pub fn clap_long_version() -> &'static str {
    build::CLAP_LONG_VERSION
}
