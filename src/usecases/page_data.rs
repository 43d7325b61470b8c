//! List and detail page data, both served through the list data processor's
//! field tables.

use std::sync::Arc;

use tracing::{debug, instrument};

use super::RequestContext;
use super::pipeline::Pipeline;
use crate::error::AppResult;
use crate::listing::{ListRequest, PageResult};
use crate::models::Entity;
use crate::repositories::{EntityRepository, ItemPageData};
use crate::services::Action;

pub struct GetListPageData<E: Entity> {
    repo: Arc<dyn EntityRepository<E>>,
    pipeline: Pipeline,
}

impl<E: Entity> GetListPageData<E> {
    pub fn new(repo: Arc<dyn EntityRepository<E>>, pipeline: Pipeline) -> Self {
        Self { repo, pipeline }
    }

    /// Filters, searches, sorts and paginates the stored entities.
    ///
    /// Field names are checked against the entity's field table before the
    /// repository is called.
    #[instrument(skip_all, fields(entity = E::NAME, user = %ctx.user_id))]
    pub async fn execute(
        &self,
        ctx: &RequestContext,
        request: &ListRequest,
    ) -> AppResult<PageResult<E>> {
        self.pipeline.authorize(ctx, E::NAME, Action::List).await?;
        self.pipeline.validate_list_request::<E>(ctx, request)?;

        let page = self
            .repo
            .list_page_data(request)
            .await
            .map_err(|e| self.pipeline.operation_failed(ctx, E::NAME, Action::List, e))?;
        debug!(
            total = page.pagination.total_items,
            page = page.pagination.page,
            returned = page.items.len(),
            "List page ready"
        );
        Ok(page)
    }
}

pub struct GetItemPageData<E: Entity> {
    repo: Arc<dyn EntityRepository<E>>,
    pipeline: Pipeline,
}

impl<E: Entity> GetItemPageData<E> {
    pub fn new(repo: Arc<dyn EntityRepository<E>>, pipeline: Pipeline) -> Self {
        Self { repo, pipeline }
    }

    #[instrument(skip_all, fields(entity = E::NAME, user = %ctx.user_id, id = %id))]
    pub async fn execute(&self, ctx: &RequestContext, id: &str) -> AppResult<ItemPageData<E>> {
        self.pipeline.authorize(ctx, E::NAME, Action::Read).await?;
        self.pipeline.require_id(ctx, E::NAME, id)?;

        self.repo
            .item_page_data(id)
            .await
            .map_err(|e| self.pipeline.operation_failed(ctx, E::NAME, Action::Read, e))?
            .ok_or_else(|| self.pipeline.not_found(ctx, E::NAME, id))
    }
}
