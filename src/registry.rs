//! Named provider factories for the pluggable collaborators.
//!
//! The composition root asks the registry for the provider named in
//! `[providers]`; nothing registers itself.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::config::Settings;
use crate::error::{AppError, AppResult};
use crate::listing::ListDataProcessor;
use crate::repositories::Repositories;
use crate::services::{
    AuthorizationService, DisabledAuthorizationService, IdService, NoOpTransactionService,
    SequentialIdService, SerialTransactionService, StaticAuthorizationService,
    TransactionService, UuidIdService,
};

type Factory<T> = Box<dyn Fn(&Settings) -> AppResult<T> + Send + Sync>;

/// Provider kinds, used in lookups and error values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Authorization,
    Transaction,
    Id,
    Repository,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Authorization => "authorization provider",
            ProviderKind::Transaction => "transaction provider",
            ProviderKind::Id => "id provider",
            ProviderKind::Repository => "repository provider",
        }
    }
}

#[derive(Default)]
pub struct ProviderRegistry {
    authorization: HashMap<String, Factory<Arc<dyn AuthorizationService>>>,
    transaction: HashMap<String, Factory<Arc<dyn TransactionService>>>,
    id: HashMap<String, Factory<Arc<dyn IdService>>>,
    repository: HashMap<String, Factory<Repositories>>,
}

impl ProviderRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in provider.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry
            .register_authorization("static", |s: &Settings| {
                Ok(Arc::new(StaticAuthorizationService::new(
                    s.authorization.grants.clone(),
                )) as Arc<dyn AuthorizationService>)
            })
            .register_authorization("disabled", |_: &Settings| {
                Ok(Arc::new(DisabledAuthorizationService) as Arc<dyn AuthorizationService>)
            })
            .register_transaction("noop", |_: &Settings| {
                Ok(Arc::new(NoOpTransactionService) as Arc<dyn TransactionService>)
            })
            .register_transaction("serial", |_: &Settings| {
                Ok(Arc::new(SerialTransactionService::new()) as Arc<dyn TransactionService>)
            })
            .register_id("uuid", |_: &Settings| {
                Ok(Arc::new(UuidIdService) as Arc<dyn IdService>)
            })
            .register_id("sequential", |s: &Settings| {
                Ok(Arc::new(SequentialIdService::new(s.providers.id_prefix.clone()))
                    as Arc<dyn IdService>)
            })
            .register_repository("memory", |s: &Settings| {
                let processor = ListDataProcessor::new(s.listing.page_limits());
                Ok(Repositories::in_memory(processor))
            });
        registry
    }

    pub fn register_authorization<F>(&mut self, name: &str, factory: F) -> &mut Self
    where
        F: Fn(&Settings) -> AppResult<Arc<dyn AuthorizationService>> + Send + Sync + 'static,
    {
        self.authorization.insert(name.to_string(), Box::new(factory));
        self
    }

    pub fn register_transaction<F>(&mut self, name: &str, factory: F) -> &mut Self
    where
        F: Fn(&Settings) -> AppResult<Arc<dyn TransactionService>> + Send + Sync + 'static,
    {
        self.transaction.insert(name.to_string(), Box::new(factory));
        self
    }

    pub fn register_id<F>(&mut self, name: &str, factory: F) -> &mut Self
    where
        F: Fn(&Settings) -> AppResult<Arc<dyn IdService>> + Send + Sync + 'static,
    {
        self.id.insert(name.to_string(), Box::new(factory));
        self
    }

    pub fn register_repository<F>(&mut self, name: &str, factory: F) -> &mut Self
    where
        F: Fn(&Settings) -> AppResult<Repositories> + Send + Sync + 'static,
    {
        self.repository.insert(name.to_string(), Box::new(factory));
        self
    }

    pub fn authorization(
        &self,
        name: &str,
        settings: &Settings,
    ) -> AppResult<Arc<dyn AuthorizationService>> {
        build(&self.authorization, ProviderKind::Authorization, name, settings)
    }

    pub fn transaction(
        &self,
        name: &str,
        settings: &Settings,
    ) -> AppResult<Arc<dyn TransactionService>> {
        build(&self.transaction, ProviderKind::Transaction, name, settings)
    }

    pub fn id(&self, name: &str, settings: &Settings) -> AppResult<Arc<dyn IdService>> {
        build(&self.id, ProviderKind::Id, name, settings)
    }

    pub fn repository(&self, name: &str, settings: &Settings) -> AppResult<Repositories> {
        build(&self.repository, ProviderKind::Repository, name, settings)
    }

    /// Registered names of one kind, sorted.
    pub fn names(&self, kind: ProviderKind) -> Vec<&str> {
        let mut names: Vec<&str> = match kind {
            ProviderKind::Authorization => self.authorization.keys().map(String::as_str).collect(),
            ProviderKind::Transaction => self.transaction.keys().map(String::as_str).collect(),
            ProviderKind::Id => self.id.keys().map(String::as_str).collect(),
            ProviderKind::Repository => self.repository.keys().map(String::as_str).collect(),
        };
        names.sort_unstable();
        names
    }
}

fn build<T>(
    factories: &HashMap<String, Factory<T>>,
    kind: ProviderKind,
    name: &str,
    settings: &Settings,
) -> AppResult<T> {
    let factory = factories.get(name).ok_or_else(|| AppError::NotFound {
        entity: kind.as_str().to_string(),
        field: "name".to_string(),
        value: name.to_string(),
    })?;
    debug!(kind = kind.as_str(), name, "Building provider");
    factory(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{Action, Permission};

    #[test]
    fn test_builtin_names() {
        let registry = ProviderRegistry::with_builtin();
        assert_eq!(registry.names(ProviderKind::Authorization), vec!["disabled", "static"]);
        assert_eq!(registry.names(ProviderKind::Transaction), vec!["noop", "serial"]);
        assert_eq!(registry.names(ProviderKind::Id), vec!["sequential", "uuid"]);
        assert_eq!(registry.names(ProviderKind::Repository), vec!["memory"]);
        assert!(ProviderRegistry::new().names(ProviderKind::Id).is_empty());
    }

    #[test]
    fn test_unknown_provider_is_not_found() {
        let registry = ProviderRegistry::with_builtin();
        match registry.transaction("postgres", &Settings::default()) {
            Err(AppError::NotFound { entity, value, .. }) => {
                assert_eq!(entity, "transaction provider");
                assert_eq!(value, "postgres");
            }
            Err(other) => panic!("Expected NotFound, got {other:?}"),
            Ok(_) => panic!("Expected NotFound"),
        }
    }

    #[test]
    fn test_factories_read_settings() {
        let registry = ProviderRegistry::with_builtin();
        let mut settings = Settings::default();
        settings.providers.id_prefix = "inv".to_string();

        let ids = registry.id("sequential", &settings).unwrap();
        assert_eq!(ids.generate_id(), "inv-1");
        assert_eq!(ids.name(), "sequential");

        let tx = registry.transaction("serial", &settings).unwrap();
        assert!(tx.supports_transactions());
        assert!(!registry.transaction("noop", &settings).unwrap().supports_transactions());
    }

    #[tokio::test]
    async fn test_static_authorization_uses_configured_grants() {
        let mut settings = Settings::default();
        settings
            .authorization
            .grants
            .insert("carol".to_string(), vec!["invoice:*".to_string()]);

        let authz = ProviderRegistry::with_builtin()
            .authorization("static", &settings)
            .unwrap();
        let read = Permission::new("invoice", Action::Read);
        let delete_role = Permission::new("role", Action::Delete);
        assert!(authz.has_permission("carol", &read).await.unwrap());
        assert!(!authz.has_permission("carol", &delete_role).await.unwrap());
    }

    #[test]
    fn test_custom_registration_replaces_builtin() {
        let mut registry = ProviderRegistry::with_builtin();
        registry.register_id("uuid", |_: &Settings| {
            Ok(Arc::new(SequentialIdService::new("fixed")) as Arc<dyn IdService>)
        });
        let ids = registry.id("uuid", &Settings::default()).unwrap();
        assert_eq!(ids.generate_id(), "fixed-1");
    }
}
