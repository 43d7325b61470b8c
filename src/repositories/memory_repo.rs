//! In-memory repository backed by `dashmap`.
//!
//! Storage order is insertion order, tracked with a monotonically increasing
//! sequence number so listing stays deterministic across shards.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use super::entity_repo::{EntityRepository, ItemPageData};
use crate::error::{AppError, AppResult};
use crate::listing::{ListDataProcessor, ListRequest, PageResult};
use crate::models::Entity;

struct Stored<E> {
    seq: u64,
    entity: E,
}

pub struct InMemoryRepository<E> {
    rows: DashMap<String, Stored<E>>,
    next_seq: AtomicU64,
    processor: ListDataProcessor,
}

impl<E: Entity> InMemoryRepository<E> {
    pub fn new(processor: ListDataProcessor) -> Self {
        Self {
            rows: DashMap::new(),
            next_seq: AtomicU64::new(0),
            processor,
        }
    }

    /// Repository pre-populated with `entities`, kept in the given order.
    pub fn seeded(processor: ListDataProcessor, entities: Vec<E>) -> AppResult<Self> {
        let repo = Self::new(processor);
        for entity in entities {
            repo.insert_new(entity)?;
        }
        Ok(repo)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn insert_new(&self, entity: E) -> AppResult<E> {
        match self.rows.entry(entity.id().to_string()) {
            Entry::Occupied(_) => Err(AppError::Duplicate {
                entity: E::NAME.to_string(),
                field: "id".to_string(),
                value: entity.id().to_string(),
            }),
            Entry::Vacant(slot) => {
                let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
                slot.insert(Stored {
                    seq,
                    entity: entity.clone(),
                });
                Ok(entity)
            }
        }
    }

    fn snapshot(&self) -> Vec<E> {
        let mut rows: Vec<(u64, E)> = self
            .rows
            .iter()
            .map(|r| (r.seq, r.entity.clone()))
            .collect();
        rows.sort_by_key(|(seq, _)| *seq);
        rows.into_iter().map(|(_, e)| e).collect()
    }
}

#[async_trait]
impl<E: Entity> EntityRepository<E> for InMemoryRepository<E> {
    async fn create(&self, entity: E) -> AppResult<E> {
        let created = self.insert_new(entity)?;
        debug!(entity = E::NAME, id = created.id(), "Stored entity");
        Ok(created)
    }

    async fn read(&self, id: &str) -> AppResult<Option<E>> {
        Ok(self.rows.get(id).map(|r| r.entity.clone()))
    }

    async fn update(&self, entity: E) -> AppResult<E> {
        let mut row = self
            .rows
            .get_mut(entity.id())
            .ok_or_else(|| AppError::not_found(E::NAME, entity.id()))?;
        row.entity = entity.clone();
        debug!(entity = E::NAME, id = entity.id(), "Replaced entity");
        Ok(entity)
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        let removed = self.rows.remove(id).is_some();
        debug!(entity = E::NAME, id, removed, "Delete requested");
        Ok(removed)
    }

    async fn list(&self) -> AppResult<Vec<E>> {
        Ok(self.snapshot())
    }

    async fn list_page_data(&self, request: &ListRequest) -> AppResult<PageResult<E>> {
        let items = self.snapshot();
        let page = self.processor.process_request(&items, request)?;
        debug!(
            entity = E::NAME,
            total = page.pagination.total_items,
            returned = page.items.len(),
            "Processed list request"
        );
        Ok(page)
    }

    async fn item_page_data(&self, id: &str) -> AppResult<Option<ItemPageData<E>>> {
        let items = self.snapshot();
        let Some(index) = items.iter().position(|e| e.id() == id) else {
            return Ok(None);
        };
        let table = E::fields();
        let item = &items[index];
        let fields = table
            .names()
            .filter_map(|name| table.get(item, name).map(|value| (name, value)))
            .collect();

        Ok(Some(ItemPageData {
            fields,
            previous_id: index
                .checked_sub(1)
                .map(|i| items[i].id().to_string()),
            next_id: items.get(index + 1).map(|e| e.id().to_string()),
            position: index + 1,
            total: items.len(),
            item: item.clone(),
        }))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::{FieldValue, FilterRequest, PaginationRequest, TypedFilter};
    use crate::models::fixtures::{license, workspace};
    use crate::models::{LicenseStatus, Workspace};

    fn repo_with(names: &[&str]) -> InMemoryRepository<Workspace> {
        let items = names
            .iter()
            .enumerate()
            .map(|(i, n)| workspace(&format!("ws-{i}"), n, "default"))
            .collect();
        InMemoryRepository::seeded(ListDataProcessor::default(), items).unwrap()
    }

    #[tokio::test]
    async fn test_create_and_read() {
        let repo = InMemoryRepository::new(ListDataProcessor::default());
        repo.create(workspace("ws-1", "Acme", "default")).await.unwrap();
        let found = repo.read("ws-1").await.unwrap().unwrap();
        assert_eq!(found.name, "Acme");
        assert!(repo.read("ws-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let repo = repo_with(&["Acme"]);
        let err = repo
            .create(workspace("ws-0", "Other", "default"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Duplicate { ref value, .. } if value == "ws-0"));
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let repo = repo_with(&[]);
        let err = repo
            .update(workspace("ws-9", "Ghost", "default"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_keeps_storage_order() {
        let repo = repo_with(&["A", "B", "C"]);
        let mut first = repo.read("ws-0").await.unwrap().unwrap();
        first.name = "A2".to_string();
        repo.update(first).await.unwrap();

        let names: Vec<String> = repo.list().await.unwrap().into_iter().map(|w| w.name).collect();
        assert_eq!(names, vec!["A2", "B", "C"]);
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = repo_with(&["A", "B"]);
        assert!(repo.delete("ws-0").await.unwrap());
        assert!(!repo.delete("ws-0").await.unwrap());
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn test_list_page_data_runs_processor() {
        let repo = repo_with(&["A", "B", "C", "D", "E"]);
        let request = ListRequest {
            pagination: Some(PaginationRequest::page(2, 2)),
            ..Default::default()
        };
        let page = repo.list_page_data(&request).await.unwrap();
        let names: Vec<&str> = page.items.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["C", "D"]);
        assert_eq!(page.pagination.total_items, 5);
    }

    #[tokio::test]
    async fn test_license_page_cap_applies() {
        let licenses = (0..1200)
            .map(|i| license(&format!("lic-{i}"), LicenseStatus::Pending))
            .collect();
        let repo = InMemoryRepository::seeded(ListDataProcessor::default(), licenses).unwrap();
        let request = ListRequest {
            pagination: Some(PaginationRequest::page(1, 5000)),
            filter: Some(FilterRequest::all(vec![TypedFilter::string(
                "status",
                crate::listing::StringOp::Equals,
                "pending",
            )])),
            ..Default::default()
        };
        let page = repo.list_page_data(&request).await.unwrap();
        assert_eq!(page.items.len(), 1000);
        assert_eq!(page.pagination.total_items, 1200);
    }

    #[tokio::test]
    async fn test_item_page_data() {
        let repo = repo_with(&["A", "B", "C"]);
        let data = repo.item_page_data("ws-1").await.unwrap().unwrap();
        assert_eq!(data.position, 2);
        assert_eq!(data.total, 3);
        assert_eq!(data.previous_id.as_deref(), Some("ws-0"));
        assert_eq!(data.next_id.as_deref(), Some("ws-2"));
        assert_eq!(data.fields.get("name"), Some(&FieldValue::Text("B".to_string())));

        let first = repo.item_page_data("ws-0").await.unwrap().unwrap();
        assert!(first.previous_id.is_none());
        assert!(repo.item_page_data("missing").await.unwrap().is_none());
    }
}
