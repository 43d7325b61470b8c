//! Repository layer for entity storage.
//!
//! Use cases depend only on [`EntityRepository`]; the concrete adapter is
//! chosen by the provider registry.

mod entity_repo;
mod memory_repo;

pub use entity_repo::{EntityRepository, ItemPageData};
pub use memory_repo::InMemoryRepository;

use std::sync::Arc;

use crate::listing::ListDataProcessor;
use crate::models::{
    Balance, Invoice, License, PaymentMethod, Role, Subscription, Workspace,
};

/// Aggregates one repository per entity type.
///
/// Cloning is cheap; repositories are shared behind an `Arc`.
#[derive(Clone)]
pub struct Repositories {
    pub subscriptions: Arc<dyn EntityRepository<Subscription>>,
    pub licenses: Arc<dyn EntityRepository<License>>,
    pub invoices: Arc<dyn EntityRepository<Invoice>>,
    pub balances: Arc<dyn EntityRepository<Balance>>,
    pub payment_methods: Arc<dyn EntityRepository<PaymentMethod>>,
    pub workspaces: Arc<dyn EntityRepository<Workspace>>,
    pub roles: Arc<dyn EntityRepository<Role>>,
}

impl Repositories {
    /// One empty in-memory repository per entity, all sharing `processor`.
    pub fn in_memory(processor: ListDataProcessor) -> Self {
        Self {
            subscriptions: Arc::new(InMemoryRepository::new(processor)),
            licenses: Arc::new(InMemoryRepository::new(processor)),
            invoices: Arc::new(InMemoryRepository::new(processor)),
            balances: Arc::new(InMemoryRepository::new(processor)),
            payment_methods: Arc::new(InMemoryRepository::new(processor)),
            workspaces: Arc::new(InMemoryRepository::new(processor)),
            roles: Arc::new(InMemoryRepository::new(processor)),
        }
    }
}
