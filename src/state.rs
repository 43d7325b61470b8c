//! Application state: the composition root.
//!
//! Settings go in, fully wired services, repositories and use cases come
//! out. Nothing here is global; build as many states as needed.

use std::sync::Arc;

use tracing::info;

use crate::config::Settings;
use crate::error::AppResult;
use crate::registry::ProviderRegistry;
use crate::repositories::Repositories;
use crate::services::{CatalogTranslationService, Services, TranslationService};
use crate::usecases::{RequestContext, UseCases};

/// Cloning is cheap; everything is shared behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub services: Services,
    pub repositories: Repositories,
    pub use_cases: Arc<UseCases>,
}

impl AppState {
    /// Builds the state with the built-in providers.
    pub fn from_settings(settings: Settings) -> AppResult<Self> {
        Self::with_registry(settings, &ProviderRegistry::with_builtin())
    }

    /// Builds the state resolving providers through `registry`.
    ///
    /// With `authorization.enabled = false` the `disabled` provider is used
    /// regardless of `providers.authorization`.
    pub fn with_registry(settings: Settings, registry: &ProviderRegistry) -> AppResult<Self> {
        settings.validate()?;

        let translation: Arc<dyn TranslationService> = match &settings.i18n.catalog_dir {
            Some(dir) => Arc::new(CatalogTranslationService::with_overrides(dir)?),
            None => Arc::new(CatalogTranslationService::embedded()?),
        };
        let authorization_name = if settings.authorization.enabled {
            settings.providers.authorization.as_str()
        } else {
            "disabled"
        };
        let authorization = registry.authorization(authorization_name, &settings)?;
        let transactions = registry.transaction(&settings.providers.transaction, &settings)?;
        let ids = registry.id(&settings.providers.id, &settings)?;
        let repositories = registry.repository(&settings.providers.repository, &settings)?;

        info!(
            authorization = authorization.name(),
            transaction = transactions.name(),
            id = ids.name(),
            repository = %settings.providers.repository,
            "Providers ready"
        );

        let services = Services::new(translation, authorization, transactions, ids);
        let use_cases = Arc::new(UseCases::new(&repositories, services.clone()));

        Ok(Self {
            settings: Arc::new(settings),
            services,
            repositories,
            use_cases,
        })
    }

    /// Request context for `user_id`, falling back to the configured
    /// default business type.
    pub fn context(&self, user_id: &str, business_type: Option<&str>) -> RequestContext {
        let business_type =
            business_type.unwrap_or(self.settings.i18n.default_business_type.as_str());
        RequestContext::new(user_id, business_type)
    }
}
