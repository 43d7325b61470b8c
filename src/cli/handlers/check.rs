//! `check`: validate configuration and resolve every provider.

use std::fmt::Write;

use super::render;
use crate::config::Settings;
use crate::error::AppResult;
use crate::state::AppState;

pub struct CheckCommandHandler {
    config: Settings,
}

impl CheckCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Settings {
        &self.config
    }

    /// Builds a full [`AppState`] so provider names and catalog overrides
    /// are checked too, not just the settings shape.
    pub fn execute(&self, show: bool) -> AppResult<String> {
        let state = AppState::from_settings(self.config.clone())?;
        let services = &state.services;
        let listing = &self.config.listing;

        let mut out = String::new();
        // Writing to a String cannot fail.
        let _ = writeln!(out, "✓ Configuration is valid");
        let _ = writeln!(
            out,
            "✓ Authorization: {}{}",
            services.authorization.name(),
            if services.authorization.is_enabled() { "" } else { " (checks skipped)" }
        );
        let _ = writeln!(
            out,
            "✓ Transactions: {}{}",
            services.transactions.name(),
            if services.transactions.supports_transactions() { "" } else { " (no unit of work)" }
        );
        let _ = writeln!(out, "✓ Ids: {}", services.ids.name());
        let _ = writeln!(out, "✓ Repository: {}", self.config.providers.repository);
        let _ = writeln!(
            out,
            "✓ Page size: default {}, max {}",
            listing.default_page_size, listing.max_page_size
        );
        let _ = write!(
            out,
            "✓ Default business type: {}",
            self.config.i18n.default_business_type
        );
        if show {
            let _ = write!(out, "\n{}", render(&self.config, false)?);
        }
        Ok(out)
    }
}
