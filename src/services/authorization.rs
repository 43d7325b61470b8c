//! Permission checks performed before any use case touches a repository.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;

/// Operation a permission applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
    List,
    Assign,
    Reassign,
    Transition,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::List => "list",
            Action::Assign => "assign",
            Action::Reassign => "reassign",
            Action::Transition => "transition",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Permission {
    pub entity: &'static str,
    pub action: Action,
}

impl Permission {
    pub const fn new(entity: &'static str, action: Action) -> Self {
        Self { entity, action }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.entity, self.action)
    }
}

/// Decides whether a user may perform an action on an entity type.
#[async_trait]
pub trait AuthorizationService: Send + Sync {
    async fn has_permission(&self, user_id: &str, permission: &Permission) -> AppResult<bool>;

    /// When `false`, use cases skip the authorization step entirely.
    fn is_enabled(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str;
}

/// Grants read from configuration: user id (or `*`) to `entity:action`
/// patterns, where either side of a pattern may be `*`.
#[derive(Debug, Clone, Default)]
pub struct StaticAuthorizationService {
    grants: HashMap<String, Vec<String>>,
}

impl StaticAuthorizationService {
    pub fn new(grants: HashMap<String, Vec<String>>) -> Self {
        Self { grants }
    }

    fn pattern_allows(pattern: &str, permission: &Permission) -> bool {
        match pattern.split_once(':') {
            Some((entity, action)) => {
                (entity == "*" || entity == permission.entity)
                    && (action == "*" || action == permission.action.as_str())
            }
            None => false,
        }
    }

    fn user_allows(&self, user_id: &str, permission: &Permission) -> bool {
        self.grants
            .get(user_id)
            .into_iter()
            .flatten()
            .any(|p| Self::pattern_allows(p, permission))
    }
}

#[async_trait]
impl AuthorizationService for StaticAuthorizationService {
    async fn has_permission(&self, user_id: &str, permission: &Permission) -> AppResult<bool> {
        Ok(self.user_allows(user_id, permission) || self.user_allows("*", permission))
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// Allows everything and reports itself as disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledAuthorizationService;

#[async_trait]
impl AuthorizationService for DisabledAuthorizationService {
    async fn has_permission(&self, _user_id: &str, _permission: &Permission) -> AppResult<bool> {
        Ok(true)
    }

    fn is_enabled(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grants(pairs: &[(&str, &[&str])]) -> HashMap<String, Vec<String>> {
        pairs
            .iter()
            .map(|(user, patterns)| {
                (
                    user.to_string(),
                    patterns.iter().map(|p| p.to_string()).collect(),
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn test_exact_grant() {
        let authz = StaticAuthorizationService::new(grants(&[("alice", &["license:assign"])]));
        let assign = Permission::new("license", Action::Assign);
        assert!(authz.has_permission("alice", &assign).await.unwrap());
        assert!(!authz.has_permission("bob", &assign).await.unwrap());
        assert!(
            !authz
                .has_permission("alice", &Permission::new("license", Action::Delete))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_wildcards() {
        let authz = StaticAuthorizationService::new(grants(&[
            ("*", &["*:read", "*:list"]),
            ("admin", &["*:*"]),
            ("billing", &["invoice:*"]),
        ]));
        assert!(
            authz
                .has_permission("anyone", &Permission::new("workspace", Action::List))
                .await
                .unwrap()
        );
        assert!(
            authz
                .has_permission("admin", &Permission::new("role", Action::Delete))
                .await
                .unwrap()
        );
        assert!(
            authz
                .has_permission("billing", &Permission::new("invoice", Action::Update))
                .await
                .unwrap()
        );
        assert!(
            !authz
                .has_permission("billing", &Permission::new("license", Action::Update))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_malformed_pattern_grants_nothing() {
        let authz = StaticAuthorizationService::new(grants(&[("alice", &["license"])]));
        assert!(
            !authz
                .has_permission("alice", &Permission::new("license", Action::Read))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_disabled_allows_everything() {
        let authz = DisabledAuthorizationService;
        assert!(!authz.is_enabled());
        assert!(
            authz
                .has_permission("nobody", &Permission::new("balance", Action::Delete))
                .await
                .unwrap()
        );
    }

    #[test]
    fn test_permission_display() {
        assert_eq!(
            Permission::new("payment_method", Action::Create).to_string(),
            "payment_method:create"
        );
    }
}
