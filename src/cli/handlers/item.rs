//! `item`: one entity with its neighbours and field values.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde_json::Value;

use super::{load_entities, render};
use crate::cli::parser::{EntityKind, ItemArgs};
use crate::error::AppResult;
use crate::models::Entity;
use crate::repositories::EntityRepository;
use crate::state::AppState;
use crate::usecases::{EntityUseCases, RequestContext};

pub struct ItemCommandHandler {
    state: AppState,
}

impl ItemCommandHandler {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    pub async fn execute(&self, args: &ItemArgs) -> AppResult<String> {
        let source = &args.source;
        let ctx = self
            .state
            .context(&source.user, source.business_type.as_deref());
        let repos = &self.state.repositories;
        let uc = &self.state.use_cases;
        let data = source.data.as_path();
        let id = args.id.as_str();

        let item = match source.entity {
            EntityKind::Subscription => {
                item_page(&repos.subscriptions, &uc.subscriptions, &ctx, data, id).await?
            }
            EntityKind::License => item_page(&repos.licenses, &uc.licenses, &ctx, data, id).await?,
            EntityKind::Invoice => item_page(&repos.invoices, &uc.invoices, &ctx, data, id).await?,
            EntityKind::Balance => item_page(&repos.balances, &uc.balances, &ctx, data, id).await?,
            EntityKind::PaymentMethod => {
                item_page(&repos.payment_methods, &uc.payment_methods, &ctx, data, id).await?
            }
            EntityKind::Workspace => {
                item_page(&repos.workspaces, &uc.workspaces, &ctx, data, id).await?
            }
            EntityKind::Role => item_page(&repos.roles, &uc.roles, &ctx, data, id).await?,
        };
        render(&item, source.compact)
    }
}

async fn item_page<E: Entity>(
    repo: &Arc<dyn EntityRepository<E>>,
    use_cases: &EntityUseCases<E>,
    ctx: &RequestContext,
    data: &Path,
    id: &str,
) -> AppResult<Value> {
    load_entities(repo, data).await?;
    let item = use_cases.item_page_data.execute(ctx, id).await?;
    Ok(serde_json::to_value(&item).context("Failed to serialize item")?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::handlers::test_support::{data_file, state};
    use crate::cli::parser::SourceArgs;
    use crate::error::AppError;
    use crate::models::fixtures::workspace;

    fn args(data: &Path, id: &str) -> ItemArgs {
        ItemArgs {
            source: SourceArgs {
                entity: EntityKind::Workspace,
                data: data.to_path_buf(),
                user: "admin".to_string(),
                business_type: None,
                compact: false,
            },
            id: id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_item_with_neighbours() {
        let dir = tempfile::tempdir().unwrap();
        let data = data_file(
            &dir,
            "workspaces.json",
            &[
                workspace("ws-1", "North Gym", "fitness_center"),
                workspace("ws-2", "Hill School", "education"),
                workspace("ws-3", "Acme", "default"),
            ],
        );

        let out = ItemCommandHandler::new(state())
            .execute(&args(&data, "ws-2"))
            .await
            .unwrap();
        let item: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(item["item"]["slug"], "hill-school");
        assert_eq!(item["position"], 2);
        assert_eq!(item["previous_id"], "ws-1");
        assert_eq!(item["next_id"], "ws-3");
        assert_eq!(item["total"], 3);
    }

    #[tokio::test]
    async fn test_missing_item() {
        let dir = tempfile::tempdir().unwrap();
        let data = data_file(&dir, "workspaces.json", &[workspace("ws-1", "Acme", "default")]);
        let result = ItemCommandHandler::new(state())
            .execute(&args(&data, "ws-9"))
            .await;
        assert!(matches!(result, Err(AppError::NotFound { .. })));
    }
}
