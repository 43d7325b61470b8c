//! Domain entities managed by the use-case layer.
//!
//! Every entity is serializable, validated with `validator`, listable through
//! its field table and carries its own business rules.

mod balance;
mod invoice;
mod license;
mod payment_method;
mod role;
mod subscription;
mod workspace;

use std::borrow::Cow;
use std::fmt::Debug;

use bigdecimal::{BigDecimal, ToPrimitive};
use jiff::Timestamp;
use serde::Serialize;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError};

use crate::listing::{FieldValue, Listable};

pub use balance::Balance;
pub use invoice::{Invoice, InvoiceStatus};
pub use license::{License, LicenseAction, LicenseError, LicenseHistoryEntry, LicenseStatus};
pub use payment_method::{PaymentMethod, PaymentMethodKind};
pub use role::Role;
pub use subscription::{Subscription, SubscriptionStatus};
pub use workspace::Workspace;

/// A business rule an entity failed.
///
/// `rule` doubles as the translation key suffix (`rules.<rule>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleViolation {
    pub rule: &'static str,
    pub field: &'static str,
    pub message: &'static str,
}

impl RuleViolation {
    pub const fn new(rule: &'static str, field: &'static str, message: &'static str) -> Self {
        Self {
            rule,
            field,
            message,
        }
    }
}

/// Behaviour shared by every persisted entity.
pub trait Entity:
    Listable + Clone + Debug + Validate + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Singular entity name, used for permissions, translations and logs.
    const NAME: &'static str;

    fn id(&self) -> &str;

    fn assign_id(&mut self, id: String);

    fn created_at(&self) -> Option<Timestamp>;

    /// Sets both creation and last-update time.
    fn stamp_created(&mut self, at: Timestamp);

    fn stamp_updated(&mut self, at: Timestamp);

    /// Cross-field rules that go beyond per-field validation.
    fn check_business_rules(&self) -> Result<(), RuleViolation> {
        Ok(())
    }

    /// Rules for replacing `previous` with `self` through a plain update.
    fn check_update(&self, _previous: &Self) -> Result<(), RuleViolation> {
        Ok(())
    }
}

/// Money amounts are compared as floats when filtering and sorting.
pub(crate) fn money(amount: &BigDecimal) -> FieldValue {
    amount.to_f64().map_or(FieldValue::Null, FieldValue::Float)
}

/// ISO 4217 style code: three upper-case ASCII letters.
pub(crate) fn validate_currency(code: &str) -> Result<(), ValidationError> {
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase()) {
        Ok(())
    } else {
        Err(ValidationError::new("currency")
            .with_message(Cow::Borrowed("Currency must be a three letter upper-case code")))
    }
}
