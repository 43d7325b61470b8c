//! Per-entity field accessor tables.
//!
//! Each listable entity registers its fields once, as a table of
//! name → typed getter. Filtering, searching and sorting only ever read
//! entities through this table.

use super::value::{FieldKind, FieldValue};

/// Getter for a single named field.
pub type FieldGetter<T> = fn(&T) -> FieldValue;

/// One registered field.
pub struct FieldEntry<T> {
    pub name: &'static str,
    pub kind: FieldKind,
    pub searchable: bool,
    getter: FieldGetter<T>,
}

impl<T> FieldEntry<T> {
    pub fn read(&self, item: &T) -> FieldValue {
        (self.getter)(item)
    }
}

/// Field table for an entity type, built with the chained registration methods.
///
/// ```ignore
/// static FIELDS: LazyLock<FieldTable<Workspace>> = LazyLock::new(|| {
///     FieldTable::<Workspace>::new()
///         .text("id", |w| w.id.clone().into())
///         .searchable_text("name", |w| w.name.clone().into())
///         .boolean("active", |w| w.active.into())
/// });
/// ```
pub struct FieldTable<T> {
    entries: Vec<FieldEntry<T>>,
}

impl<T> FieldTable<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn register(
        mut self,
        name: &'static str,
        kind: FieldKind,
        searchable: bool,
        getter: FieldGetter<T>,
    ) -> Self {
        debug_assert!(
            self.entries.iter().all(|e| e.name != name),
            "field `{name}` registered twice"
        );
        self.entries.push(FieldEntry {
            name,
            kind,
            searchable,
            getter,
        });
        self
    }

    #[must_use]
    pub fn text(self, name: &'static str, getter: FieldGetter<T>) -> Self {
        self.register(name, FieldKind::Text, false, getter)
    }

    /// Text field that participates in default free-text search.
    #[must_use]
    pub fn searchable_text(self, name: &'static str, getter: FieldGetter<T>) -> Self {
        self.register(name, FieldKind::Text, true, getter)
    }

    #[must_use]
    pub fn integer(self, name: &'static str, getter: FieldGetter<T>) -> Self {
        self.register(name, FieldKind::Integer, false, getter)
    }

    #[must_use]
    pub fn float(self, name: &'static str, getter: FieldGetter<T>) -> Self {
        self.register(name, FieldKind::Float, false, getter)
    }

    #[must_use]
    pub fn boolean(self, name: &'static str, getter: FieldGetter<T>) -> Self {
        self.register(name, FieldKind::Bool, false, getter)
    }

    #[must_use]
    pub fn timestamp(self, name: &'static str, getter: FieldGetter<T>) -> Self {
        self.register(name, FieldKind::Timestamp, false, getter)
    }

    pub fn entry(&self, name: &str) -> Option<&FieldEntry<T>> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entry(name).is_some()
    }

    pub fn kind_of(&self, name: &str) -> Option<FieldKind> {
        self.entry(name).map(|e| e.kind)
    }

    /// Reads a field; `None` when the name is not registered.
    pub fn get(&self, item: &T, name: &str) -> Option<FieldValue> {
        self.entry(name).map(|e| e.read(item))
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|e| e.name)
    }

    /// Fields searched when a search request names none.
    pub fn default_search_fields(&self) -> Vec<&'static str> {
        self.entries
            .iter()
            .filter(|e| e.searchable)
            .map(|e| e.name)
            .collect()
    }
}

impl<T> Default for FieldTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Capability required by the list data processor.
pub trait Listable: Send + Sync + 'static {
    /// Per-entity override of the maximum page size.
    const MAX_PAGE_SIZE: Option<usize> = None;

    fn fields() -> &'static FieldTable<Self>
    where
        Self: Sized;
}
