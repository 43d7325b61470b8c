use std::sync::LazyLock;

use bigdecimal::BigDecimal;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{Entity, RuleViolation, money, validate_currency};
use crate::listing::{FieldTable, Listable};

/// Prepaid credit held by a workspace in one currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Balance {
    #[serde(default)]
    pub id: String,
    #[validate(length(min = 1, max = 64, message = "Workspace id is required"))]
    pub workspace_id: String,
    #[validate(custom(function = "validate_currency"))]
    pub currency: String,
    pub available: BigDecimal,
    pub pending: BigDecimal,
    pub credit_limit: BigDecimal,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

static FIELDS: LazyLock<FieldTable<Balance>> = LazyLock::new(|| {
    FieldTable::<Balance>::new()
        .text("id", |b| b.id.clone().into())
        .searchable_text("workspace_id", |b| b.workspace_id.clone().into())
        .searchable_text("currency", |b| b.currency.clone().into())
        .float("available", |b| money(&b.available))
        .float("pending", |b| money(&b.pending))
        .float("credit_limit", |b| money(&b.credit_limit))
        .timestamp("created_at", |b| b.created_at.into())
        .timestamp("updated_at", |b| b.updated_at.into())
});

impl Listable for Balance {
    fn fields() -> &'static FieldTable<Self> {
        &FIELDS
    }
}

impl Entity for Balance {
    const NAME: &'static str = "balance";

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
        let zero = BigDecimal::from(0);
        if self.credit_limit < zero {
            return Err(RuleViolation::new(
                "non_negative_credit_limit",
                "credit_limit",
                "Credit limit cannot be negative",
            ));
        }
        if self.pending < zero {
            return Err(RuleViolation::new(
                "non_negative_amount",
                "pending",
                "Pending amount cannot be negative",
            ));
        }
        if self.available < -&self.credit_limit {
            return Err(RuleViolation::new(
                "credit_limit_exceeded",
                "available",
                "Available balance is below the credit limit",
            ));
        }
        Ok(())
    }
}
