use std::sync::LazyLock;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{Entity, RuleViolation};
use crate::listing::{FieldTable, Listable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethodKind {
    Card,
    BankAccount,
    Wallet,
}

impl PaymentMethodKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethodKind::Card => "card",
            PaymentMethodKind::BankAccount => "bank_account",
            PaymentMethodKind::Wallet => "wallet",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct PaymentMethod {
    #[serde(default)]
    pub id: String,
    #[validate(length(min = 1, max = 64, message = "Workspace id is required"))]
    pub workspace_id: String,
    pub kind: PaymentMethodKind,
    #[validate(length(min = 1, max = 128, message = "Label must be between 1 and 128 characters"))]
    pub label: String,
    #[serde(default)]
    #[validate(length(equal = 4, message = "last4 must be exactly four digits"))]
    pub last4: Option<String>,
    #[serde(default)]
    #[validate(range(min = 1, max = 12, message = "Expiry month must be between 1 and 12"))]
    pub exp_month: Option<i64>,
    #[serde(default)]
    #[validate(range(min = 2000, max = 2200, message = "Expiry year is out of range"))]
    pub exp_year: Option<i64>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

static FIELDS: LazyLock<FieldTable<PaymentMethod>> = LazyLock::new(|| {
    FieldTable::<PaymentMethod>::new()
        .text("id", |p| p.id.clone().into())
        .text("workspace_id", |p| p.workspace_id.clone().into())
        .text("kind", |p| p.kind.as_str().into())
        .searchable_text("label", |p| p.label.clone().into())
        .searchable_text("last4", |p| p.last4.clone().into())
        .integer("exp_month", |p| p.exp_month.into())
        .integer("exp_year", |p| p.exp_year.into())
        .boolean("is_default", |p| p.is_default.into())
        .timestamp("created_at", |p| p.created_at.into())
        .timestamp("updated_at", |p| p.updated_at.into())
});

impl Listable for PaymentMethod {
    fn fields() -> &'static FieldTable<Self> {
        &FIELDS
    }
}

impl Entity for PaymentMethod {
    const NAME: &'static str = "payment_method";

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
        if self.kind != PaymentMethodKind::Card {
            return Ok(());
        }
        match &self.last4 {
            Some(digits) if digits.chars().all(|c| c.is_ascii_digit()) => {}
            _ => {
                return Err(RuleViolation::new(
                    "card_requires_last4",
                    "last4",
                    "Cards must carry the last four digits",
                ));
            }
        }
        if self.exp_month.is_none() || self.exp_year.is_none() {
            return Err(RuleViolation::new(
                "card_requires_expiry",
                "exp_month",
                "Cards must carry an expiry month and year",
            ));
        }
        Ok(())
    }
}
