//! Storage contract shared by every entity type.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::AppResult;
use crate::listing::{FieldValue, ListRequest, PageResult};
use crate::models::Entity;

/// A single entity prepared for a detail view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemPageData<E> {
    pub item: E,
    /// Every registered field, read through the entity's field table.
    pub fields: BTreeMap<&'static str, FieldValue>,
    /// Neighbours in storage order, for previous/next navigation.
    pub previous_id: Option<String>,
    pub next_id: Option<String>,
    /// 1-based position in storage order.
    pub position: usize,
    pub total: usize,
}

/// Async CRUD plus the list and item page-data queries.
///
/// Implementations are shared across tasks, so they must be `Send + Sync`.
#[async_trait]
pub trait EntityRepository<E: Entity>: Send + Sync {
    /// Stores a new entity. Fails with `Duplicate` if the id is taken.
    async fn create(&self, entity: E) -> AppResult<E>;

    async fn read(&self, id: &str) -> AppResult<Option<E>>;

    /// Replaces an existing entity. Fails with `NotFound` if absent.
    async fn update(&self, entity: E) -> AppResult<E>;

    /// Returns whether an entity was removed.
    async fn delete(&self, id: &str) -> AppResult<bool>;

    /// All entities in storage order.
    async fn list(&self) -> AppResult<Vec<E>>;

    /// Runs the list data processor over the stored entities.
    async fn list_page_data(&self, request: &ListRequest) -> AppResult<PageResult<E>>;

    async fn item_page_data(&self, id: &str) -> AppResult<Option<ItemPageData<E>>>;

    /// Provider name for logging.
    fn name(&self) -> &'static str;
}
