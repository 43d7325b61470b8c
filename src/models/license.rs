use std::fmt;
use std::sync::LazyLock;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

use super::{Entity, RuleViolation};
use crate::listing::{FieldTable, Listable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenseStatus {
    #[default]
    Pending,
    Active,
    Suspended,
    Revoked,
    Expired,
}

impl LicenseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LicenseStatus::Pending => "pending",
            LicenseStatus::Active => "active",
            LicenseStatus::Suspended => "suspended",
            LicenseStatus::Revoked => "revoked",
            LicenseStatus::Expired => "expired",
        }
    }

    /// Revoked and expired licenses never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LicenseStatus::Revoked | LicenseStatus::Expired)
    }

    pub fn can_transition_to(&self, next: LicenseStatus) -> bool {
        use LicenseStatus::*;
        matches!(
            (self, next),
            (Pending, Active)
                | (Pending, Revoked)
                | (Active, Suspended)
                | (Active, Revoked)
                | (Active, Expired)
                | (Suspended, Active)
                | (Suspended, Revoked)
                | (Suspended, Expired)
        )
    }
}

impl fmt::Display for LicenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to a license, as recorded in its history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenseAction {
    Assign,
    Reassign,
    Activate,
    Suspend,
    Revoke,
    Expire,
}

impl LicenseAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            LicenseAction::Assign => "assign",
            LicenseAction::Reassign => "reassign",
            LicenseAction::Activate => "activate",
            LicenseAction::Suspend => "suspend",
            LicenseAction::Revoke => "revoke",
            LicenseAction::Expire => "expire",
        }
    }

    /// Target status of a pure status transition; `None` for assignment actions.
    pub fn target_status(&self) -> Option<LicenseStatus> {
        match self {
            LicenseAction::Activate => Some(LicenseStatus::Active),
            LicenseAction::Suspend => Some(LicenseStatus::Suspended),
            LicenseAction::Revoke => Some(LicenseStatus::Revoked),
            LicenseAction::Expire => Some(LicenseStatus::Expired),
            LicenseAction::Assign | LicenseAction::Reassign => None,
        }
    }
}

impl fmt::Display for LicenseAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected license actions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LicenseError {
    #[error("License cannot move from {from} to {to}")]
    InvalidTransition {
        from: LicenseStatus,
        to: LicenseStatus,
    },

    #[error("License in status {status} cannot be assigned")]
    NotAssignable { status: LicenseStatus },

    #[error("License is already assigned to {user_id}")]
    AlreadyAssigned { user_id: String },

    #[error("License is not assigned to anyone")]
    NotAssigned,

    #[error("License is already assigned to {user_id}")]
    SameAssignee { user_id: String },

    #[error("{action} is not a status transition")]
    NotATransition { action: LicenseAction },
}

impl LicenseError {
    /// Translation key suffix for this error (`license.<key>`).
    pub fn key(&self) -> &'static str {
        match self {
            LicenseError::InvalidTransition { .. } => "invalid_transition",
            LicenseError::NotAssignable { .. } => "not_assignable",
            LicenseError::AlreadyAssigned { .. } => "already_assigned",
            LicenseError::NotAssigned => "not_assigned",
            LicenseError::SameAssignee { .. } => "same_assignee",
            LicenseError::NotATransition { .. } => "not_a_transition",
        }
    }
}

/// One audit record appended by every successful license action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LicenseHistoryEntry {
    pub at: Timestamp,
    pub actor: String,
    pub action: LicenseAction,
    pub from_status: LicenseStatus,
    pub to_status: LicenseStatus,
    #[serde(default)]
    pub from_assignee: Option<String>,
    #[serde(default)]
    pub to_assignee: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// A seat of a product granted by a subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct License {
    #[serde(default)]
    pub id: String,
    #[validate(length(min = 1, max = 64, message = "Subscription id is required"))]
    pub subscription_id: String,
    #[validate(length(min = 1, max = 64, message = "Workspace id is required"))]
    pub workspace_id: String,
    #[validate(length(
        min = 1,
        max = 128,
        message = "Product must be between 1 and 128 characters"
    ))]
    pub product: String,
    #[serde(default)]
    pub status: LicenseStatus,
    #[serde(default)]
    pub assignee_user_id: Option<String>,
    #[serde(default)]
    pub assigned_at: Option<Timestamp>,
    #[serde(default)]
    pub expires_at: Option<Timestamp>,
    #[serde(default)]
    pub history: Vec<LicenseHistoryEntry>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

impl License {
    /// Gives an unassigned license to `user_id`, activating it if pending.
    pub fn assign(
        &mut self,
        user_id: &str,
        actor: &str,
        at: Timestamp,
    ) -> Result<&LicenseHistoryEntry, LicenseError> {
        if !matches!(self.status, LicenseStatus::Pending | LicenseStatus::Active) {
            return Err(LicenseError::NotAssignable {
                status: self.status,
            });
        }
        if let Some(current) = &self.assignee_user_id {
            return Err(LicenseError::AlreadyAssigned {
                user_id: current.clone(),
            });
        }

        let from_status = self.status;
        self.status = LicenseStatus::Active;
        self.assignee_user_id = Some(user_id.to_string());
        self.assigned_at = Some(at);
        Ok(self.record(LicenseHistoryEntry {
            at,
            actor: actor.to_string(),
            action: LicenseAction::Assign,
            from_status,
            to_status: LicenseStatus::Active,
            from_assignee: None,
            to_assignee: Some(user_id.to_string()),
            reason: None,
        }))
    }

    /// Moves an active, assigned license to a different user.
    pub fn reassign(
        &mut self,
        user_id: &str,
        actor: &str,
        reason: Option<String>,
        at: Timestamp,
    ) -> Result<&LicenseHistoryEntry, LicenseError> {
        if self.status != LicenseStatus::Active {
            return Err(LicenseError::NotAssignable {
                status: self.status,
            });
        }
        let previous = match &self.assignee_user_id {
            None => return Err(LicenseError::NotAssigned),
            Some(current) if current == user_id => {
                return Err(LicenseError::SameAssignee {
                    user_id: current.clone(),
                });
            }
            Some(current) => current.clone(),
        };

        self.assignee_user_id = Some(user_id.to_string());
        self.assigned_at = Some(at);
        Ok(self.record(LicenseHistoryEntry {
            at,
            actor: actor.to_string(),
            action: LicenseAction::Reassign,
            from_status: LicenseStatus::Active,
            to_status: LicenseStatus::Active,
            from_assignee: Some(previous),
            to_assignee: Some(user_id.to_string()),
            reason,
        }))
    }

    /// Applies a status action (activate, suspend, revoke, expire).
    pub fn transition(
        &mut self,
        action: LicenseAction,
        actor: &str,
        reason: Option<String>,
        at: Timestamp,
    ) -> Result<&LicenseHistoryEntry, LicenseError> {
        let next = action
            .target_status()
            .ok_or(LicenseError::NotATransition { action })?;
        if !self.status.can_transition_to(next) {
            return Err(LicenseError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }

        let from_status = self.status;
        self.status = next;
        let assignee = self.assignee_user_id.clone();
        Ok(self.record(LicenseHistoryEntry {
            at,
            actor: actor.to_string(),
            action,
            from_status,
            to_status: next,
            from_assignee: assignee.clone(),
            to_assignee: assignee,
            reason,
        }))
    }

    fn record(&mut self, entry: LicenseHistoryEntry) -> &LicenseHistoryEntry {
        self.updated_at = Some(entry.at);
        self.history.push(entry);
        &self.history[self.history.len() - 1]
    }
}

static FIELDS: LazyLock<FieldTable<License>> = LazyLock::new(|| {
    FieldTable::<License>::new()
        .text("id", |l| l.id.clone().into())
        .text("subscription_id", |l| l.subscription_id.clone().into())
        .text("workspace_id", |l| l.workspace_id.clone().into())
        .searchable_text("product", |l| l.product.clone().into())
        .text("status", |l| l.status.as_str().into())
        .searchable_text("assignee_user_id", |l| l.assignee_user_id.clone().into())
        .boolean("assigned", |l| l.assignee_user_id.is_some().into())
        .timestamp("assigned_at", |l| l.assigned_at.into())
        .timestamp("expires_at", |l| l.expires_at.into())
        .integer("history_len", |l| (l.history.len() as i64).into())
        .timestamp("created_at", |l| l.created_at.into())
        .timestamp("updated_at", |l| l.updated_at.into())
});

impl Listable for License {
    const MAX_PAGE_SIZE: Option<usize> = Some(1000);

    fn fields() -> &'static FieldTable<Self> {
        &FIELDS
    }
}

impl Entity for License {
    const NAME: &'static str = "license";

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
        if self.status == LicenseStatus::Pending && self.assignee_user_id.is_some() {
            return Err(RuleViolation::new(
                "pending_license_unassigned",
                "assignee_user_id",
                "Pending licenses cannot have an assignee",
            ));
        }
        if self.assignee_user_id.is_some() != self.assigned_at.is_some() {
            return Err(RuleViolation::new(
                "assignment_consistency",
                "assigned_at",
                "Assignee and assignment time must be set together",
            ));
        }
        Ok(())
    }

    fn check_update(&self, previous: &Self) -> Result<(), RuleViolation> {
        if self.status != previous.status || self.assignee_user_id != previous.assignee_user_id {
            return Err(RuleViolation::new(
                "license_changes_via_actions",
                "status",
                "Status and assignee change only through license actions",
            ));
        }
        if self.history != previous.history {
            return Err(RuleViolation::new(
                "license_history_immutable",
                "history",
                "License history cannot be edited",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{license, ts};

    const ALL: [LicenseStatus; 5] = [
        LicenseStatus::Pending,
        LicenseStatus::Active,
        LicenseStatus::Suspended,
        LicenseStatus::Revoked,
        LicenseStatus::Expired,
    ];

    #[test]
    fn test_terminal_states_have_no_exits() {
        for from in ALL.iter().filter(|s| s.is_terminal()) {
            for to in ALL {
                assert!(!from.can_transition_to(to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_transition_table() {
        use LicenseStatus::*;
        assert!(Pending.can_transition_to(Active));
        assert!(Pending.can_transition_to(Revoked));
        assert!(!Pending.can_transition_to(Suspended));
        assert!(!Pending.can_transition_to(Expired));
        assert!(Active.can_transition_to(Suspended));
        assert!(Suspended.can_transition_to(Active));
        assert!(!Active.can_transition_to(Active));
    }

    #[test]
    fn test_assign_activates_pending_license() {
        let mut lic = license("lic-1", LicenseStatus::Pending);
        let at = ts("2026-03-01T10:00:00Z");
        let entry = lic.assign("user-1", "admin", at).unwrap().clone();

        assert_eq!(entry.from_status, LicenseStatus::Pending);
        assert_eq!(entry.to_status, LicenseStatus::Active);
        assert_eq!(entry.to_assignee.as_deref(), Some("user-1"));
        assert_eq!(lic.status, LicenseStatus::Active);
        assert_eq!(lic.assigned_at, Some(at));
        assert_eq!(lic.history.len(), 1);
        assert!(lic.check_business_rules().is_ok());
    }

    #[test]
    fn test_assign_rejects_taken_or_inactive_license() {
        let mut lic = license("lic-1", LicenseStatus::Pending);
        let at = ts("2026-03-01T10:00:00Z");
        lic.assign("user-1", "admin", at).unwrap();
        assert_eq!(
            lic.assign("user-2", "admin", at).unwrap_err(),
            LicenseError::AlreadyAssigned {
                user_id: "user-1".to_string()
            }
        );

        let mut suspended = license("lic-2", LicenseStatus::Suspended);
        assert!(matches!(
            suspended.assign("user-1", "admin", at),
            Err(LicenseError::NotAssignable { .. })
        ));
        assert!(suspended.history.is_empty());
    }

    #[test]
    fn test_reassign_moves_assignee_and_records_reason() {
        let mut lic = license("lic-1", LicenseStatus::Pending);
        lic.assign("user-1", "admin", ts("2026-03-01T10:00:00Z"))
            .unwrap();
        let entry = lic
            .reassign(
                "user-2",
                "admin",
                Some("left team".to_string()),
                ts("2026-03-02T10:00:00Z"),
            )
            .unwrap()
            .clone();

        assert_eq!(entry.from_assignee.as_deref(), Some("user-1"));
        assert_eq!(entry.to_assignee.as_deref(), Some("user-2"));
        assert_eq!(entry.reason.as_deref(), Some("left team"));
        assert_eq!(lic.assignee_user_id.as_deref(), Some("user-2"));
        assert_eq!(lic.history.len(), 2);
    }

    #[test]
    fn test_reassign_guards() {
        let at = ts("2026-03-01T10:00:00Z");
        let mut unassigned = license("lic-1", LicenseStatus::Active);
        assert_eq!(
            unassigned.reassign("user-2", "admin", None, at).unwrap_err(),
            LicenseError::NotAssigned
        );

        let mut lic = license("lic-2", LicenseStatus::Pending);
        lic.assign("user-1", "admin", at).unwrap();
        assert!(matches!(
            lic.reassign("user-1", "admin", None, at),
            Err(LicenseError::SameAssignee { .. })
        ));
    }

    #[test]
    fn test_transition_rejects_invalid_moves() {
        let mut lic = license("lic-1", LicenseStatus::Revoked);
        let err = lic
            .transition(LicenseAction::Activate, "admin", None, ts("2026-03-01T10:00:00Z"))
            .unwrap_err();
        assert_eq!(
            err,
            LicenseError::InvalidTransition {
                from: LicenseStatus::Revoked,
                to: LicenseStatus::Active
            }
        );
        assert_eq!(err.key(), "invalid_transition");
    }

    #[test]
    fn test_transition_suspend_and_resume() {
        let mut lic = license("lic-1", LicenseStatus::Active);
        let at = ts("2026-03-01T10:00:00Z");
        lic.transition(LicenseAction::Suspend, "admin", Some("billing".into()), at)
            .unwrap();
        assert_eq!(lic.status, LicenseStatus::Suspended);
        lic.transition(LicenseAction::Activate, "admin", None, at)
            .unwrap();
        assert_eq!(lic.status, LicenseStatus::Active);
        assert_eq!(lic.history.len(), 2);
        assert_eq!(lic.updated_at, Some(at));
    }

    #[test]
    fn test_assignment_actions_are_not_transitions() {
        let mut lic = license("lic-1", LicenseStatus::Active);
        assert!(matches!(
            lic.transition(LicenseAction::Assign, "admin", None, ts("2026-03-01T10:00:00Z")),
            Err(LicenseError::NotATransition { .. })
        ));
    }

    #[test]
    fn test_plain_update_cannot_change_status() {
        let previous = license("lic-1", LicenseStatus::Active);
        let mut next = previous.clone();
        next.product = "Renamed".to_string();
        assert!(next.check_update(&previous).is_ok());

        next.status = LicenseStatus::Revoked;
        assert_eq!(
            next.check_update(&previous).unwrap_err().rule,
            "license_changes_via_actions"
        );
    }

    #[test]
    fn test_pending_license_cannot_carry_assignee() {
        let mut lic = license("lic-1", LicenseStatus::Pending);
        lic.assignee_user_id = Some("user-1".to_string());
        lic.assigned_at = Some(ts("2026-03-01T10:00:00Z"));
        assert_eq!(
            lic.check_business_rules().unwrap_err().rule,
            "pending_license_unassigned"
        );
    }
}
