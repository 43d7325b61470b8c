//! The list data processor.
//!
//! Applies filter, search, sort and pagination to an in-memory collection
//! in that fixed order. Work is done over indices into the input slice; only
//! the items on the returned page are cloned.

use std::any::{Any, type_name};

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::error::{ListError, ListResult};
use super::fields::Listable;
use super::filter::FilterRequest;
use super::pagination::{PageLimits, PageWindow, PaginationRequest, PaginationResponse};
use super::search::{SearchMatcher, SearchRequest, SearchResult};
use super::sort::SortRequest;

/// All four optional stages of a list request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ListRequest {
    #[serde(default)]
    pub pagination: Option<PaginationRequest>,
    #[serde(default)]
    pub filter: Option<FilterRequest>,
    #[serde(default)]
    pub sort: Option<SortRequest>,
    #[serde(default)]
    pub search: Option<SearchRequest>,
}

/// One page of processed items.
///
/// `search_results` is parallel to `items`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult<E> {
    pub items: Vec<E>,
    pub pagination: PaginationResponse,
    pub search_results: Vec<SearchResult>,
}

struct Candidate {
    index: usize,
    search: SearchResult,
}

/// Stateless processor; holds only the configured page limits.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListDataProcessor {
    limits: PageLimits,
}

impl ListDataProcessor {
    pub fn new(limits: PageLimits) -> Self {
        Self { limits }
    }

    /// Page limits for a specific entity type.
    pub fn limits_for<E: Listable>(&self) -> PageLimits {
        match E::MAX_PAGE_SIZE {
            Some(max) => self.limits.with_max(max),
            None => self.limits,
        }
    }

    /// Convenience wrapper over [`Self::process`] taking a bundled request.
    ///
    /// # Errors
    /// See [`Self::process`].
    pub fn process_request<E>(
        &self,
        items: &[E],
        request: &ListRequest,
    ) -> ListResult<PageResult<E>>
    where
        E: Listable + Clone,
    {
        self.process(
            items,
            request.pagination.as_ref(),
            request.filter.as_ref(),
            request.sort.as_ref(),
            request.search.as_ref(),
        )
    }

    /// Filters, searches, sorts and paginates `items`.
    ///
    /// # Errors
    /// Returns `InvalidCursor` for undecodable continuation tokens and
    /// `InvalidPagination` when the requested window cannot be resolved.
    pub fn process<E>(
        &self,
        items: &[E],
        pagination: Option<&PaginationRequest>,
        filter: Option<&FilterRequest>,
        sort: Option<&SortRequest>,
        search: Option<&SearchRequest>,
    ) -> ListResult<PageResult<E>>
    where
        E: Listable + Clone,
    {
        let table = E::fields();
        let window = PageWindow::resolve(pagination, self.limits_for::<E>())?;

        let mut candidates: Vec<Candidate> = match filter.filter(|f| !f.is_empty()) {
            Some(filter) => items
                .iter()
                .enumerate()
                .filter(|(_, item)| filter.matches(table, *item))
                .map(|(index, _)| Candidate {
                    index,
                    search: SearchResult::default(),
                })
                .collect(),
            None => (0..items.len())
                .map(|index| Candidate {
                    index,
                    search: SearchResult::default(),
                })
                .collect(),
        };
        trace!(input = items.len(), kept = candidates.len(), "filter stage");

        if let Some(matcher) = search.and_then(|s| SearchMatcher::new(s, table)) {
            candidates = candidates
                .into_iter()
                .filter_map(|c| {
                    let result = matcher.score(table, &items[c.index]);
                    result.is_match().then_some(Candidate {
                        index: c.index,
                        search: result,
                    })
                })
                .collect();
            candidates.sort_by(|a, b| b.search.score.total_cmp(&a.search.score));
            if let Some(max) = search.and_then(|s| s.max_results) {
                candidates.truncate(max);
            }
            trace!(kept = candidates.len(), "search stage");
        }

        if let Some(sort) = sort.filter(|s| !s.is_empty()) {
            let mut keyed: Vec<_> = candidates
                .into_iter()
                .map(|c| (sort.key_of(table, &items[c.index]), c))
                .collect();
            keyed.sort_by(|(a, _), (b, _)| sort.compare_keys(a, b));
            candidates = keyed.into_iter().map(|(_, c)| c).collect();
        }

        let total = candidates.len();
        let page: Vec<Candidate> = candidates
            .into_iter()
            .skip(window.offset)
            .take(window.limit)
            .collect();
        let pagination = window.describe(total, page.len());

        let (page_items, search_results) = page
            .into_iter()
            .map(|c| (items[c.index].clone(), c.search))
            .unzip();

        Ok(PageResult {
            items: page_items,
            pagination,
            search_results,
        })
    }

    /// Processes a type-erased collection, reconstructing each element as `E`.
    ///
    /// # Errors
    /// `ItemShapeMismatch` when any element is not an `E`, plus everything
    /// [`Self::process`] can return.
    pub fn process_erased<E>(
        &self,
        items: Vec<Box<dyn Any + Send + Sync>>,
        request: &ListRequest,
    ) -> ListResult<PageResult<E>>
    where
        E: Listable + Clone,
    {
        let typed = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                item.downcast::<E>()
                    .map(|boxed| *boxed)
                    .map_err(|_| ListError::ItemShapeMismatch {
                        index,
                        expected: type_name::<E>(),
                    })
            })
            .collect::<ListResult<Vec<E>>>()?;
        self.process_request(&typed, request)
    }
}
