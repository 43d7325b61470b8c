//! `list`: a list request against entities loaded from a file.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde_json::Value;

use super::{load_entities, render};
use crate::cli::parser::{EntityKind, ListArgs};
use crate::error::AppResult;
use crate::listing::{ListRequest, PaginationRequest, SearchRequest, SortRequest};
use crate::models::Entity;
use crate::repositories::EntityRepository;
use crate::state::AppState;
use crate::usecases::{EntityUseCases, RequestContext};

pub struct ListCommandHandler {
    state: AppState,
}

impl ListCommandHandler {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    pub async fn execute(&self, args: &ListArgs) -> AppResult<String> {
        let request = Self::build_request(args)?;
        let source = &args.source;
        let ctx = self
            .state
            .context(&source.user, source.business_type.as_deref());
        let repos = &self.state.repositories;
        let uc = &self.state.use_cases;
        let data = source.data.as_path();

        let page = match source.entity {
            EntityKind::Subscription => {
                list_page(&repos.subscriptions, &uc.subscriptions, &ctx, data, &request).await?
            }
            EntityKind::License => {
                list_page(&repos.licenses, &uc.licenses, &ctx, data, &request).await?
            }
            EntityKind::Invoice => {
                list_page(&repos.invoices, &uc.invoices, &ctx, data, &request).await?
            }
            EntityKind::Balance => {
                list_page(&repos.balances, &uc.balances, &ctx, data, &request).await?
            }
            EntityKind::PaymentMethod => {
                list_page(&repos.payment_methods, &uc.payment_methods, &ctx, data, &request)
                    .await?
            }
            EntityKind::Workspace => {
                list_page(&repos.workspaces, &uc.workspaces, &ctx, data, &request).await?
            }
            EntityKind::Role => list_page(&repos.roles, &uc.roles, &ctx, data, &request).await?,
        };
        render(&page, source.compact)
    }

    /// The request file (if any) with command-line flags applied on top.
    pub fn build_request(args: &ListArgs) -> AppResult<ListRequest> {
        let mut request = match &args.request {
            Some(path) => {
                let source = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read request file {}", path.display()))?;
                serde_json::from_str::<ListRequest>(&source)
                    .with_context(|| format!("{} is not a valid list request", path.display()))?
            }
            None => ListRequest::default(),
        };

        if args.page.is_some() || args.limit.is_some() || args.cursor.is_some() {
            let pagination = request
                .pagination
                .get_or_insert_with(PaginationRequest::default);
            if args.page.is_some() {
                pagination.page = args.page;
            }
            if args.limit.is_some() {
                pagination.limit = args.limit;
            }
            if args.cursor.is_some() {
                pagination.cursor = args.cursor.clone();
            }
        }

        if let Some(query) = &args.search {
            let max_results = request.search.as_ref().and_then(|s| s.max_results);
            request.search = Some(SearchRequest {
                query: query.clone(),
                fields: args.search_fields.clone(),
                max_results,
            });
        } else if let Some(search) = request.search.as_mut() {
            if !args.search_fields.is_empty() {
                search.fields = args.search_fields.clone();
            }
        }

        if !args.sort.is_empty() {
            request.sort = Some(SortRequest::by(args.sort.clone()));
        }
        Ok(request)
    }
}

async fn list_page<E: Entity>(
    repo: &Arc<dyn EntityRepository<E>>,
    use_cases: &EntityUseCases<E>,
    ctx: &RequestContext,
    data: &Path,
    request: &ListRequest,
) -> AppResult<Value> {
    load_entities(repo, data).await?;
    let page = use_cases.list_page_data.execute(ctx, request).await?;
    Ok(serde_json::to_value(&page).context("Failed to serialize page")?)
}
