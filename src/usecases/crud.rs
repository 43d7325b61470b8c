//! Create, read, update, delete and list, generic over the entity type.

use std::sync::Arc;

use jiff::Timestamp;
use tracing::{info, instrument};

use super::RequestContext;
use super::pipeline::Pipeline;
use crate::error::AppResult;
use crate::models::Entity;
use crate::repositories::EntityRepository;
use crate::services::{Action, transactional};

pub struct CreateEntity<E: Entity> {
    repo: Arc<dyn EntityRepository<E>>,
    pipeline: Pipeline,
}

impl<E: Entity> CreateEntity<E> {
    pub fn new(repo: Arc<dyn EntityRepository<E>>, pipeline: Pipeline) -> Self {
        Self { repo, pipeline }
    }

    /// Stores a new entity with a generated id and creation timestamps.
    #[instrument(skip_all, fields(entity = E::NAME, user = %ctx.user_id))]
    pub async fn execute(&self, ctx: &RequestContext, mut entity: E) -> AppResult<E> {
        self.pipeline.authorize(ctx, E::NAME, Action::Create).await?;
        self.pipeline.validate_entity(ctx, &entity)?;
        self.pipeline.enrich_new(&mut entity, Timestamp::now());

        let created = transactional(self.pipeline.services().transactions.as_ref(), async {
            self.repo.create(entity).await
        })
        .await
        .map_err(|e| self.pipeline.operation_failed(ctx, E::NAME, Action::Create, e))?;

        info!(id = created.id(), "Created {}", E::NAME);
        Ok(created)
    }
}

pub struct ReadEntity<E: Entity> {
    repo: Arc<dyn EntityRepository<E>>,
    pipeline: Pipeline,
}

impl<E: Entity> ReadEntity<E> {
    pub fn new(repo: Arc<dyn EntityRepository<E>>, pipeline: Pipeline) -> Self {
        Self { repo, pipeline }
    }

    #[instrument(skip_all, fields(entity = E::NAME, user = %ctx.user_id, id = %id))]
    pub async fn execute(&self, ctx: &RequestContext, id: &str) -> AppResult<E> {
        self.pipeline.authorize(ctx, E::NAME, Action::Read).await?;
        self.pipeline.require_id(ctx, E::NAME, id)?;

        self.repo
            .read(id)
            .await
            .map_err(|e| self.pipeline.operation_failed(ctx, E::NAME, Action::Read, e))?
            .ok_or_else(|| self.pipeline.not_found(ctx, E::NAME, id))
    }
}

pub struct UpdateEntity<E: Entity> {
    repo: Arc<dyn EntityRepository<E>>,
    pipeline: Pipeline,
}

impl<E: Entity> UpdateEntity<E> {
    pub fn new(repo: Arc<dyn EntityRepository<E>>, pipeline: Pipeline) -> Self {
        Self { repo, pipeline }
    }

    /// Replaces an existing entity, keeping its original creation time.
    #[instrument(skip_all, fields(entity = E::NAME, user = %ctx.user_id, id = entity.id()))]
    pub async fn execute(&self, ctx: &RequestContext, mut entity: E) -> AppResult<E> {
        self.pipeline.authorize(ctx, E::NAME, Action::Update).await?;
        self.pipeline.require_id(ctx, E::NAME, entity.id())?;
        self.pipeline.validate_entity(ctx, &entity)?;

        let updated = transactional(self.pipeline.services().transactions.as_ref(), async {
            let previous = self
                .repo
                .read(entity.id())
                .await?
                .ok_or_else(|| self.pipeline.not_found(ctx, E::NAME, entity.id()))?;
            entity
                .check_update(&previous)
                .map_err(|v| self.pipeline.rule_violation(ctx, v))?;
            if let Some(created_at) = previous.created_at() {
                entity.stamp_created(created_at);
            }
            entity.stamp_updated(Timestamp::now());
            self.repo.update(entity).await
        })
        .await
        .map_err(|e| self.pipeline.operation_failed(ctx, E::NAME, Action::Update, e))?;

        info!("Updated {}", E::NAME);
        Ok(updated)
    }
}

pub struct DeleteEntity<E: Entity> {
    repo: Arc<dyn EntityRepository<E>>,
    pipeline: Pipeline,
}

impl<E: Entity> DeleteEntity<E> {
    pub fn new(repo: Arc<dyn EntityRepository<E>>, pipeline: Pipeline) -> Self {
        Self { repo, pipeline }
    }

    #[instrument(skip_all, fields(entity = E::NAME, user = %ctx.user_id, id = %id))]
    pub async fn execute(&self, ctx: &RequestContext, id: &str) -> AppResult<()> {
        self.pipeline.authorize(ctx, E::NAME, Action::Delete).await?;
        self.pipeline.require_id(ctx, E::NAME, id)?;

        let removed = transactional(self.pipeline.services().transactions.as_ref(), async {
            self.repo.delete(id).await
        })
        .await
        .map_err(|e| self.pipeline.operation_failed(ctx, E::NAME, Action::Delete, e))?;

        if !removed {
            return Err(self.pipeline.not_found(ctx, E::NAME, id));
        }
        info!("Deleted {}", E::NAME);
        Ok(())
    }
}

pub struct ListEntities<E: Entity> {
    repo: Arc<dyn EntityRepository<E>>,
    pipeline: Pipeline,
}

impl<E: Entity> ListEntities<E> {
    pub fn new(repo: Arc<dyn EntityRepository<E>>, pipeline: Pipeline) -> Self {
        Self { repo, pipeline }
    }

    /// Every entity in storage order, unprocessed.
    #[instrument(skip_all, fields(entity = E::NAME, user = %ctx.user_id))]
    pub async fn execute(&self, ctx: &RequestContext) -> AppResult<Vec<E>> {
        self.pipeline.authorize(ctx, E::NAME, Action::List).await?;
        self.repo
            .list()
            .await
            .map_err(|e| self.pipeline.operation_failed(ctx, E::NAME, Action::List, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::fixtures::{invoice, subscription, ts};
    use crate::models::{Invoice, Subscription, SubscriptionStatus};
    use crate::usecases::test_support::{alice, memory_repo, pipeline};

    #[tokio::test]
    async fn test_create_generates_id_and_timestamps() {
        let repo = memory_repo::<Subscription>();
        let create = CreateEntity::new(repo.clone(), pipeline(true));
        let mut input = subscription("", "Pro", SubscriptionStatus::Active);
        input.created_at = None;

        let created = create.execute(&alice(), input).await.unwrap();
        assert_eq!(created.id, "id-1");
        assert!(created.created_at.is_some());
        assert_eq!(created.created_at, created.updated_at);
        assert!(repo.read("id-1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_create_keeps_supplied_id() {
        let repo = memory_repo::<Subscription>();
        let create = CreateEntity::new(repo, pipeline(true));
        let created = create
            .execute(&alice(), subscription("sub-42", "Pro", SubscriptionStatus::Active))
            .await
            .unwrap();
        assert_eq!(created.id, "sub-42");
    }

    #[tokio::test]
    async fn test_create_rejects_business_rule_before_storage() {
        let repo = memory_repo::<Invoice>();
        let create = CreateEntity::new(repo.clone(), pipeline(true));
        let err = create
            .execute(&alice(), invoice("", "INV-1", "10.00", "20.00"))
            .await
            .unwrap_err();
        match err {
            AppError::BusinessRule { rule, message } => {
                assert_eq!(rule, "invoice_overpaid");
                assert_eq!(message, "An invoice cannot be paid beyond its amount due");
            }
            other => panic!("Expected BusinessRule, got {other:?}"),
        }
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_reports_field_validation() {
        let create = CreateEntity::new(memory_repo::<Subscription>(), pipeline(true));
        let mut input = subscription("", "", SubscriptionStatus::Active);
        input.currency = "dollars".to_string();
        let err = create.execute(&alice(), input).await.unwrap_err();
        match err {
            AppError::ValidationErrors { errors } => {
                let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["currency", "plan_name"]);
            }
            other => panic!("Expected ValidationErrors, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_duplicate_create_is_client_error() {
        let repo = memory_repo::<Subscription>();
        let create = CreateEntity::new(repo, pipeline(true));
        let sub = subscription("sub-1", "Pro", SubscriptionStatus::Active);
        create.execute(&alice(), sub.clone()).await.unwrap();
        let err = create.execute(&alice(), sub).await.unwrap_err();
        assert!(matches!(err, AppError::Duplicate { .. }));
    }

    #[tokio::test]
    async fn test_read_missing_and_blank_id() {
        let read = ReadEntity::new(memory_repo::<Subscription>(), pipeline(true));
        assert!(matches!(
            read.execute(&alice(), "nope").await,
            Err(AppError::NotFound { .. })
        ));
        assert!(matches!(
            read.execute(&alice(), "  ").await,
            Err(AppError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_preserves_created_at() {
        let repo = memory_repo::<Subscription>();
        let p = pipeline(true);
        let created = CreateEntity::new(repo.clone(), p.clone())
            .execute(&alice(), subscription("sub-1", "Pro", SubscriptionStatus::Active))
            .await
            .unwrap();

        let mut change = created.clone();
        change.plan_name = "Enterprise".to_string();
        change.created_at = Some(ts("2000-01-01T00:00:00Z"));
        let updated = UpdateEntity::new(repo, p)
            .execute(&alice(), change)
            .await
            .unwrap();

        assert_eq!(updated.plan_name, "Enterprise");
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let update = UpdateEntity::new(memory_repo::<Subscription>(), pipeline(true));
        let err = update
            .execute(&alice(), subscription("sub-9", "Pro", SubscriptionStatus::Active))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_then_list() {
        let repo = memory_repo::<Subscription>();
        let p = pipeline(true);
        let create = CreateEntity::new(repo.clone(), p.clone());
        for name in ["A", "B", "C"] {
            create
                .execute(&alice(), subscription("", name, SubscriptionStatus::Active))
                .await
                .unwrap();
        }

        DeleteEntity::new(repo.clone(), p.clone())
            .execute(&alice(), "id-2")
            .await
            .unwrap();
        let err = DeleteEntity::new(repo.clone(), p.clone())
            .execute(&alice(), "id-2")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));

        let names: Vec<String> = ListEntities::new(repo, p)
            .execute(&alice())
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.plan_name)
            .collect();
        assert_eq!(names, vec!["A", "C"]);
    }
}
