use std::sync::LazyLock;

use jiff::Timestamp;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{Entity, RuleViolation};
use crate::listing::{FieldTable, Listable};

/// Lower-case words joined by single hyphens.
static SLUG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap());

/// A tenant. `business_type` selects the translation catalog used for
/// messages shown to the workspace's users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Workspace {
    #[serde(default)]
    pub id: String,
    #[validate(length(min = 1, max = 128, message = "Name must be between 1 and 128 characters"))]
    pub name: String,
    #[validate(
        length(min = 2, max = 64, message = "Slug must be between 2 and 64 characters"),
        regex(
            path = *SLUG_PATTERN,
            message = "Slug may only contain lower-case letters, digits and hyphens"
        )
    )]
    pub slug: String,
    #[validate(length(min = 1, max = 64, message = "Business type is required"))]
    pub business_type: String,
    #[validate(length(min = 1, max = 64, message = "Owner is required"))]
    pub owner_user_id: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

fn default_active() -> bool {
    true
}

static FIELDS: LazyLock<FieldTable<Workspace>> = LazyLock::new(|| {
    FieldTable::<Workspace>::new()
        .text("id", |w| w.id.clone().into())
        .searchable_text("name", |w| w.name.clone().into())
        .searchable_text("slug", |w| w.slug.clone().into())
        .text("business_type", |w| w.business_type.clone().into())
        .text("owner_user_id", |w| w.owner_user_id.clone().into())
        .boolean("active", |w| w.active.into())
        .timestamp("created_at", |w| w.created_at.into())
        .timestamp("updated_at", |w| w.updated_at.into())
});

impl Listable for Workspace {
    fn fields() -> &'static FieldTable<Self> {
        &FIELDS
    }
}

impl Entity for Workspace {
    const NAME: &'static str = "workspace";

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
        if self.slug.starts_with("system") {
            return Err(RuleViolation::new(
                "reserved_slug",
                "slug",
                "Slugs starting with 'system' are reserved",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::workspace;

    #[test]
    fn test_slug_pattern() {
        let mut ws = workspace("ws-1", "Acme Corp", "default");
        assert!(ws.validate().is_ok());

        ws.slug = "Acme_Corp".to_string();
        assert!(ws.validate().unwrap_err().field_errors().contains_key("slug"));

        ws.slug = "acme--corp".to_string();
        assert!(ws.validate().is_err());
    }

    #[test]
    fn test_reserved_slug() {
        let mut ws = workspace("ws-1", "Acme", "default");
        ws.slug = "system-admin".to_string();
        assert_eq!(ws.check_business_rules().unwrap_err().rule, "reserved_slug");
    }

    #[test]
    fn test_active_defaults_to_true() {
        let ws: Workspace = serde_json::from_value(serde_json::json!({
            "name": "Gym",
            "slug": "gym",
            "business_type": "fitness_center",
            "owner_user_id": "user-1"
        }))
        .unwrap();
        assert!(ws.active);
        assert!(ws.id.is_empty());
    }
}
