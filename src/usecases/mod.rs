//! Use-case layer.
//!
//! One struct per entity and operation, each composing authorization,
//! validation, business rules, enrichment, an optional unit of work and the
//! repository. Failures reaching the caller carry messages translated for
//! the workspace's business type.

mod crud;
mod license;
mod page_data;
mod pipeline;

pub use crud::{CreateEntity, DeleteEntity, ListEntities, ReadEntity, UpdateEntity};
pub use license::{
    AssignLicense, AssignLicenseInput, ReassignLicense, ReassignLicenseInput, TransitionLicense,
    TransitionLicenseInput,
};
pub use page_data::{GetItemPageData, GetListPageData};
pub use pipeline::Pipeline;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::models::{
    Balance, Entity, Invoice, License, PaymentMethod, Role, Subscription, Workspace,
};
use crate::repositories::{EntityRepository, Repositories};
use crate::services::{DEFAULT_BUSINESS_TYPE, Services};

/// Who is calling and which translation catalog applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    pub user_id: String,
    #[serde(default = "default_business_type")]
    pub business_type: String,
}

fn default_business_type() -> String {
    DEFAULT_BUSINESS_TYPE.to_string()
}

impl RequestContext {
    pub fn new(user_id: impl Into<String>, business_type: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            business_type: business_type.into(),
        }
    }
}

/// The generic use cases for one entity type.
pub struct EntityUseCases<E: Entity> {
    pub create: CreateEntity<E>,
    pub read: ReadEntity<E>,
    pub update: UpdateEntity<E>,
    pub delete: DeleteEntity<E>,
    pub list: ListEntities<E>,
    pub list_page_data: GetListPageData<E>,
    pub item_page_data: GetItemPageData<E>,
}

impl<E: Entity> EntityUseCases<E> {
    pub fn new(repo: Arc<dyn EntityRepository<E>>, pipeline: &Pipeline) -> Self {
        Self {
            create: CreateEntity::new(Arc::clone(&repo), pipeline.clone()),
            read: ReadEntity::new(Arc::clone(&repo), pipeline.clone()),
            update: UpdateEntity::new(Arc::clone(&repo), pipeline.clone()),
            delete: DeleteEntity::new(Arc::clone(&repo), pipeline.clone()),
            list: ListEntities::new(Arc::clone(&repo), pipeline.clone()),
            list_page_data: GetListPageData::new(Arc::clone(&repo), pipeline.clone()),
            item_page_data: GetItemPageData::new(repo, pipeline.clone()),
        }
    }
}

pub struct LicenseActions {
    pub assign: AssignLicense,
    pub reassign: ReassignLicense,
    pub transition: TransitionLicense,
}

/// Every use case, wired to one set of repositories and services.
pub struct UseCases {
    pub subscriptions: EntityUseCases<Subscription>,
    pub licenses: EntityUseCases<License>,
    pub license_actions: LicenseActions,
    pub invoices: EntityUseCases<Invoice>,
    pub balances: EntityUseCases<Balance>,
    pub payment_methods: EntityUseCases<PaymentMethod>,
    pub workspaces: EntityUseCases<Workspace>,
    pub roles: EntityUseCases<Role>,
}

impl UseCases {
    pub fn new(repos: &Repositories, services: Services) -> Self {
        let pipeline = Pipeline::new(services);
        Self {
            subscriptions: EntityUseCases::new(Arc::clone(&repos.subscriptions), &pipeline),
            licenses: EntityUseCases::new(Arc::clone(&repos.licenses), &pipeline),
            license_actions: LicenseActions {
                assign: AssignLicense::new(Arc::clone(&repos.licenses), pipeline.clone()),
                reassign: ReassignLicense::new(Arc::clone(&repos.licenses), pipeline.clone()),
                transition: TransitionLicense::new(Arc::clone(&repos.licenses), pipeline.clone()),
            },
            invoices: EntityUseCases::new(Arc::clone(&repos.invoices), &pipeline),
            balances: EntityUseCases::new(Arc::clone(&repos.balances), &pipeline),
            payment_methods: EntityUseCases::new(Arc::clone(&repos.payment_methods), &pipeline),
            workspaces: EntityUseCases::new(Arc::clone(&repos.workspaces), &pipeline),
            roles: EntityUseCases::new(Arc::clone(&repos.roles), &pipeline),
        }
    }
}
