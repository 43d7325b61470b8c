//! Generic list processing shared by every entity type.
//!
//! The [`ListDataProcessor`] takes an in-memory slice of entities plus
//! optional filter, search, sort and pagination requests and produces a
//! [`PageResult`]. Stages always run in this order:
//!
//! 1. filter: narrow by the typed filter tree
//! 2. search: score, drop non-matches, rank by relevance
//! 3. sort: stable composite sort (overrides relevance order)
//! 4. paginate: count survivors, then cut the page
//!
//! Entities take part by implementing [`Listable`], which exposes a static
//! [`FieldTable`] of named getters.

pub mod error;
pub mod fields;
pub mod filter;
pub mod pagination;
pub mod processor;
pub mod search;
pub mod sort;
pub mod value;

pub use error::{ListError, ListResult};
pub use fields::{FieldTable, Listable};
pub use filter::{
    FilterRequest, LogicOperator, NumberOp, Predicate, StringOp, TimestampOp, TypedFilter,
};
pub use pagination::{PageLimits, PaginationRequest, PaginationResponse};
pub use processor::{ListDataProcessor, ListRequest, PageResult};
pub use search::{Highlight, SearchRequest, SearchResult};
pub use sort::{NullOrder, SortDirection, SortField, SortRequest};
pub use value::{FieldKind, FieldValue};
