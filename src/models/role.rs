use std::sync::LazyLock;

use jiff::Timestamp;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{Entity, RuleViolation};
use crate::listing::{FieldTable, Listable};

/// `entity:action`, either side may be `*`.
static PERMISSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-z_]+|\*):([a-z_]+|\*)$").unwrap());

const SYSTEM_PREFIX: &str = "system:";

/// A named set of permissions within a workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Role {
    #[serde(default)]
    pub id: String,
    #[validate(length(min = 1, max = 64, message = "Workspace id is required"))]
    pub workspace_id: String,
    #[validate(length(
        min = 1,
        max = 64,
        message = "Role name must be between 1 and 64 characters"
    ))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 512, message = "Description is too long"))]
    pub description: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub system: bool,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

static FIELDS: LazyLock<FieldTable<Role>> = LazyLock::new(|| {
    FieldTable::<Role>::new()
        .text("id", |r| r.id.clone().into())
        .text("workspace_id", |r| r.workspace_id.clone().into())
        .searchable_text("name", |r| r.name.clone().into())
        .searchable_text("description", |r| r.description.clone().into())
        .integer("permission_count", |r| (r.permissions.len() as i64).into())
        .boolean("system", |r| r.system.into())
        .timestamp("created_at", |r| r.created_at.into())
        .timestamp("updated_at", |r| r.updated_at.into())
});

impl Listable for Role {
    fn fields() -> &'static FieldTable<Self> {
        &FIELDS
    }
}

impl Entity for Role {
    const NAME: &'static str = "role";

    fn id(&self) -> &str {
        &self.id
    }

    fn assign_id(&mut self, id: String) {
        self.id = id;
    }

    fn created_at(&self) -> Option<Timestamp> {
        self.created_at
    }

    fn stamp_created(&mut self, at: Timestamp) {
        self.created_at = Some(at);
        self.updated_at = Some(at);
    }

    fn stamp_updated(&mut self, at: Timestamp) {
        self.updated_at = Some(at);
    }

    fn check_business_rules(&self) -> Result<(), RuleViolation> {
        if self.name.starts_with(SYSTEM_PREFIX) && !self.system {
            return Err(RuleViolation::new(
                "reserved_role_name",
                "name",
                "Only system roles may use the 'system:' prefix",
            ));
        }
        if !self.permissions.iter().all(|p| PERMISSION_PATTERN.is_match(p)) {
            return Err(RuleViolation::new(
                "permission_format",
                "permissions",
                "Permissions must look like 'entity:action'",
            ));
        }
        Ok(())
    }
}
