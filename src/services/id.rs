use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

/// Source of identifiers for newly created entities.
pub trait IdService: Send + Sync {
    fn generate_id(&self) -> String;

    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdService;

impl IdService for UuidIdService {
    fn generate_id(&self) -> String {
        Uuid::new_v4().to_string()
    }

    fn name(&self) -> &'static str {
        "uuid"
    }
}

/// `<prefix>-<n>` with `n` counting up from 1. Deterministic, for fixtures
/// and local runs.
#[derive(Debug)]
pub struct SequentialIdService {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIdService {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl IdService for SequentialIdService {
    fn generate_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}-{n}", self.prefix)
    }

    fn name(&self) -> &'static str {
        "sequential"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_uuid_ids_are_unique() {
        let ids: HashSet<String> = (0..100).map(|_| UuidIdService.generate_id()).collect();
        assert_eq!(ids.len(), 100);
        assert!(ids.iter().all(|id| Uuid::parse_str(id).is_ok()));
    }

    #[test]
    fn test_sequential_ids() {
        let ids = SequentialIdService::new("lic");
        assert_eq!(ids.generate_id(), "lic-1");
        assert_eq!(ids.generate_id(), "lic-2");
    }
}
