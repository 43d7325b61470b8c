use std::fmt;
use std::sync::LazyLock;

use bigdecimal::BigDecimal;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{Entity, RuleViolation, money, validate_currency};
use crate::listing::{FieldTable, Listable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    #[default]
    Trialing,
    Active,
    PastDue,
    Cancelled,
    Expired,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Trialing => "trialing",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A workspace's subscription to a billing plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Subscription {
    #[serde(default)]
    pub id: String,
    #[validate(length(min = 1, max = 64, message = "Workspace id is required"))]
    pub workspace_id: String,
    #[validate(length(min = 1, max = 64, message = "Plan id is required"))]
    pub plan_id: String,
    #[validate(length(
        min = 1,
        max = 128,
        message = "Plan name must be between 1 and 128 characters"
    ))]
    pub plan_name: String,
    #[serde(default)]
    pub status: SubscriptionStatus,
    #[validate(range(min = 1, max = 100_000, message = "Seats must be between 1 and 100000"))]
    pub seats: i64,
    pub amount: BigDecimal,
    #[validate(custom(function = "validate_currency"))]
    pub currency: String,
    #[serde(default)]
    pub auto_renew: bool,
    pub current_period_start: Timestamp,
    pub current_period_end: Timestamp,
    #[serde(default)]
    pub cancelled_at: Option<Timestamp>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

static FIELDS: LazyLock<FieldTable<Subscription>> = LazyLock::new(|| {
    FieldTable::<Subscription>::new()
        .text("id", |s| s.id.clone().into())
        .text("workspace_id", |s| s.workspace_id.clone().into())
        .searchable_text("plan_id", |s| s.plan_id.clone().into())
        .searchable_text("plan_name", |s| s.plan_name.clone().into())
        .text("status", |s| s.status.as_str().into())
        .integer("seats", |s| s.seats.into())
        .float("amount", |s| money(&s.amount))
        .text("currency", |s| s.currency.clone().into())
        .boolean("auto_renew", |s| s.auto_renew.into())
        .timestamp("current_period_start", |s| s.current_period_start.into())
        .timestamp("current_period_end", |s| s.current_period_end.into())
        .timestamp("cancelled_at", |s| s.cancelled_at.into())
        .timestamp("created_at", |s| s.created_at.into())
        .timestamp("updated_at", |s| s.updated_at.into())
});

impl Listable for Subscription {
    fn fields() -> &'static FieldTable<Self> {
        &FIELDS
    }
}

impl Entity for Subscription {
    const NAME: &'static str = "subscription";

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
        if self.current_period_end <= self.current_period_start {
            return Err(RuleViolation::new(
                "subscription_period_order",
                "current_period_end",
                "Billing period must end after it starts",
            ));
        }
        if self.amount < BigDecimal::from(0) {
            return Err(RuleViolation::new(
                "non_negative_amount",
                "amount",
                "Amount cannot be negative",
            ));
        }
        if self.status == SubscriptionStatus::Cancelled && self.cancelled_at.is_none() {
            return Err(RuleViolation::new(
                "cancelled_requires_timestamp",
                "cancelled_at",
                "Cancelled subscriptions must record when they were cancelled",
            ));
        }
        Ok(())
    }
}
