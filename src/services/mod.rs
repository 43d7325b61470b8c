//! Collaborator services used by the use-case layer.
//!
//! Each concern sits behind a trait so the composition root can pick an
//! implementation by name (see [`crate::registry`]).

pub mod authorization;
pub mod id;
pub mod transaction;
pub mod translation;

pub use authorization::{
    Action, AuthorizationService, DisabledAuthorizationService, Permission,
    StaticAuthorizationService,
};
pub use id::{IdService, SequentialIdService, UuidIdService};
pub use transaction::{
    NoOpTransactionService, SerialTransactionService, TransactionService, transactional,
};
pub use translation::{CatalogTranslationService, DEFAULT_BUSINESS_TYPE, TranslationService};

use std::sync::Arc;

/// Aggregates the collaborator services.
///
/// Cloning is cheap; every service is shared behind an `Arc`.
#[derive(Clone)]
pub struct Services {
    pub translation: Arc<dyn TranslationService>,
    pub authorization: Arc<dyn AuthorizationService>,
    pub transactions: Arc<dyn TransactionService>,
    pub ids: Arc<dyn IdService>,
}

impl Services {
    pub fn new(
        translation: Arc<dyn TranslationService>,
        authorization: Arc<dyn AuthorizationService>,
        transactions: Arc<dyn TransactionService>,
        ids: Arc<dyn IdService>,
    ) -> Self {
        Self {
            translation,
            authorization,
            transactions,
            ids,
        }
    }
}
