use std::sync::LazyLock;

use bigdecimal::BigDecimal;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{Entity, RuleViolation, money, validate_currency};
use crate::listing::{FieldTable, Listable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    #[default]
    Draft,
    Open,
    Paid,
    Void,
    Uncollectible,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Open => "open",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Void => "void",
            InvoiceStatus::Uncollectible => "uncollectible",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Invoice {
    #[serde(default)]
    pub id: String,
    #[validate(length(min = 1, max = 64, message = "Invoice number is required"))]
    pub number: String,
    #[validate(length(min = 1, max = 64, message = "Workspace id is required"))]
    pub workspace_id: String,
    #[serde(default)]
    pub subscription_id: Option<String>,
    #[serde(default)]
    pub status: InvoiceStatus,
    pub amount_due: BigDecimal,
    pub amount_paid: BigDecimal,
    #[validate(custom(function = "validate_currency"))]
    pub currency: String,
    pub issued_at: Timestamp,
    pub due_at: Timestamp,
    #[serde(default)]
    pub paid_at: Option<Timestamp>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

impl Invoice {
    pub fn outstanding(&self) -> BigDecimal {
        &self.amount_due - &self.amount_paid
    }
}

static FIELDS: LazyLock<FieldTable<Invoice>> = LazyLock::new(|| {
    FieldTable::<Invoice>::new()
        .text("id", |i| i.id.clone().into())
        .searchable_text("number", |i| i.number.clone().into())
        .text("workspace_id", |i| i.workspace_id.clone().into())
        .text("subscription_id", |i| i.subscription_id.clone().into())
        .text("status", |i| i.status.as_str().into())
        .float("amount_due", |i| money(&i.amount_due))
        .float("amount_paid", |i| money(&i.amount_paid))
        .float("outstanding", |i| money(&i.outstanding()))
        .text("currency", |i| i.currency.clone().into())
        .timestamp("issued_at", |i| i.issued_at.into())
        .timestamp("due_at", |i| i.due_at.into())
        .timestamp("paid_at", |i| i.paid_at.into())
        .timestamp("created_at", |i| i.created_at.into())
        .timestamp("updated_at", |i| i.updated_at.into())
});

impl Listable for Invoice {
    const MAX_PAGE_SIZE: Option<usize> = Some(500);

    fn fields() -> &'static FieldTable<Self> {
        &FIELDS
    }
}

impl Entity for Invoice {
    const NAME: &'static str = "invoice";

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
        if self.amount_due < zero || self.amount_paid < zero {
            return Err(RuleViolation::new(
                "non_negative_amount",
                "amount_due",
                "Invoice amounts cannot be negative",
            ));
        }
        if self.amount_paid > self.amount_due {
            return Err(RuleViolation::new(
                "invoice_overpaid",
                "amount_paid",
                "Amount paid cannot exceed amount due",
            ));
        }
        if self.due_at < self.issued_at {
            return Err(RuleViolation::new(
                "invoice_due_before_issue",
                "due_at",
                "Due date cannot precede the issue date",
            ));
        }
        if self.status == InvoiceStatus::Paid && self.paid_at.is_none() {
            return Err(RuleViolation::new(
                "paid_requires_timestamp",
                "paid_at",
                "Paid invoices must record when they were paid",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::FieldValue;
    use crate::models::fixtures::{invoice, ts};

    #[test]
    fn test_overpayment_is_rejected() {
        let inv = invoice("inv-1", "INV-001", "100.00", "120.00");
        assert_eq!(
            inv.check_business_rules().unwrap_err().rule,
            "invoice_overpaid"
        );
    }

    #[test]
    fn test_due_date_ordering() {
        let mut inv = invoice("inv-1", "INV-001", "100.00", "0");
        inv.due_at = ts("2025-12-01T00:00:00Z");
        assert_eq!(inv.check_business_rules().unwrap_err().field, "due_at");
    }

    #[test]
    fn test_paid_status_needs_paid_at() {
        let mut inv = invoice("inv-1", "INV-001", "100.00", "100.00");
        inv.status = InvoiceStatus::Paid;
        assert!(inv.check_business_rules().is_err());
        inv.paid_at = Some(ts("2026-01-10T00:00:00Z"));
        assert!(inv.check_business_rules().is_ok());
    }

    #[test]
    fn test_outstanding_field() {
        let inv = invoice("inv-1", "INV-001", "100.00", "40.50");
        assert_eq!(
            Invoice::fields().get(&inv, "outstanding"),
            Some(FieldValue::Float(59.5))
        );
    }

    #[test]
    fn test_invoice_page_cap() {
        assert_eq!(Invoice::MAX_PAGE_SIZE, Some(500));
    }
}
