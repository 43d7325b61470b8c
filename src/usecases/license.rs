//! License actions: assignment, reassignment and guarded status changes.
//!
//! Every action loads the license inside the unit of work, applies the
//! state-machine method on [`License`], re-checks business rules and stores
//! the result with its new history entry.

use std::sync::Arc;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::RequestContext;
use super::pipeline::Pipeline;
use crate::error::{AppError, AppResult};
use crate::models::{Entity, License, LicenseAction, LicenseError};
use crate::repositories::EntityRepository;
use crate::services::{Action, transactional};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignLicenseInput {
    pub license_id: String,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReassignLicenseInput {
    pub license_id: String,
    pub user_id: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionLicenseInput {
    pub license_id: String,
    pub action: LicenseAction,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Loading and error shaping shared by the three actions.
#[derive(Clone)]
struct LicenseSteps {
    repo: Arc<dyn EntityRepository<License>>,
    pipeline: Pipeline,
}

impl LicenseSteps {
    async fn load(&self, ctx: &RequestContext, id: &str) -> AppResult<License> {
        self.repo
            .read(id)
            .await?
            .ok_or_else(|| self.pipeline.not_found(ctx, License::NAME, id))
    }

    fn require_user(&self, ctx: &RequestContext, user_id: &str) -> AppResult<()> {
        if user_id.trim().is_empty() {
            let label = self.pipeline.entity_label(ctx, License::NAME);
            return Err(AppError::Validation {
                field: "user_id".to_string(),
                reason: self.pipeline.services().translation.get(
                    &ctx.business_type,
                    "errors.invalid_request",
                    &[("entity", &label), ("reason", "user_id is required")],
                ),
            });
        }
        Ok(())
    }

    fn conflict(&self, ctx: &RequestContext, error: &LicenseError) -> AppError {
        let (from, to, status, user, action) = match error {
            LicenseError::InvalidTransition { from, to } => {
                (from.as_str(), to.as_str(), "", "", "")
            }
            LicenseError::NotAssignable { status } => ("", "", status.as_str(), "", ""),
            LicenseError::AlreadyAssigned { user_id } | LicenseError::SameAssignee { user_id } => {
                ("", "", "", user_id.as_str(), "")
            }
            LicenseError::NotATransition { action } => ("", "", "", "", action.as_str()),
            LicenseError::NotAssigned => ("", "", "", "", ""),
        };
        AppError::Conflict {
            message: self.pipeline.services().translation.get_with_default(
                &ctx.business_type,
                &format!("license.{}", error.key()),
                &error.to_string(),
                &[
                    ("from", from),
                    ("to", to),
                    ("status", status),
                    ("user", user),
                    ("action", action),
                ],
            ),
        }
    }

    /// Runs `apply` on the stored license and persists the result.
    async fn mutate<F>(
        &self,
        ctx: &RequestContext,
        license_id: &str,
        permission: Action,
        assignee: Option<&str>,
        apply: F,
    ) -> AppResult<License>
    where
        F: FnOnce(&mut License, Timestamp) -> Result<(), LicenseError> + Send,
    {
        self.pipeline.authorize(ctx, License::NAME, permission).await?;
        self.pipeline.require_id(ctx, License::NAME, license_id)?;
        if let Some(user_id) = assignee {
            self.require_user(ctx, user_id)?;
        }

        transactional(self.pipeline.services().transactions.as_ref(), async {
            let mut license = self.load(ctx, license_id).await?;
            apply(&mut license, Timestamp::now()).map_err(|e| self.conflict(ctx, &e))?;
            license
                .check_business_rules()
                .map_err(|v| self.pipeline.rule_violation(ctx, v))?;
            self.repo.update(license).await
        })
        .await
        .map_err(|e| {
            self.pipeline
                .operation_failed(ctx, License::NAME, permission, e)
        })
    }
}

pub struct AssignLicense {
    steps: LicenseSteps,
}

impl AssignLicense {
    pub fn new(repo: Arc<dyn EntityRepository<License>>, pipeline: Pipeline) -> Self {
        Self {
            steps: LicenseSteps { repo, pipeline },
        }
    }

    /// Gives an unassigned license to a user; a pending license becomes active.
    #[instrument(
        skip_all,
        fields(user = %ctx.user_id, license = %input.license_id, assignee = %input.user_id)
    )]
    pub async fn execute(
        &self,
        ctx: &RequestContext,
        input: &AssignLicenseInput,
    ) -> AppResult<License> {
        let assignee = Some(input.user_id.as_str());
        let license = self
            .steps
            .mutate(ctx, &input.license_id, Action::Assign, assignee, |license, at| {
                license
                    .assign(&input.user_id, &ctx.user_id, at)
                    .map(|_| ())
            })
            .await?;
        info!(status = %license.status, "License assigned");
        Ok(license)
    }
}

pub struct ReassignLicense {
    steps: LicenseSteps,
}

impl ReassignLicense {
    pub fn new(repo: Arc<dyn EntityRepository<License>>, pipeline: Pipeline) -> Self {
        Self {
            steps: LicenseSteps { repo, pipeline },
        }
    }

    /// Moves an active, assigned license to a different user.
    #[instrument(
        skip_all,
        fields(user = %ctx.user_id, license = %input.license_id, assignee = %input.user_id)
    )]
    pub async fn execute(
        &self,
        ctx: &RequestContext,
        input: &ReassignLicenseInput,
    ) -> AppResult<License> {
        let assignee = Some(input.user_id.as_str());
        let license = self
            .steps
            .mutate(ctx, &input.license_id, Action::Reassign, assignee, |license, at| {
                license
                    .reassign(&input.user_id, &ctx.user_id, input.reason.clone(), at)
                    .map(|_| ())
            })
            .await?;
        info!("License reassigned");
        Ok(license)
    }
}

pub struct TransitionLicense {
    steps: LicenseSteps,
}

impl TransitionLicense {
    pub fn new(repo: Arc<dyn EntityRepository<License>>, pipeline: Pipeline) -> Self {
        Self {
            steps: LicenseSteps { repo, pipeline },
        }
    }

    /// Activates, suspends, revokes or expires a license.
    #[instrument(
        skip_all,
        fields(user = %ctx.user_id, license = %input.license_id, action = %input.action)
    )]
    pub async fn execute(
        &self,
        ctx: &RequestContext,
        input: &TransitionLicenseInput,
    ) -> AppResult<License> {
        let license = self
            .steps
            .mutate(ctx, &input.license_id, Action::Transition, None, |license, at| {
                license
                    .transition(input.action, &ctx.user_id, input.reason.clone(), at)
                    .map(|_| ())
            })
            .await?;
        info!(status = %license.status, "License status changed");
        Ok(license)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LicenseStatus;
    use crate::models::fixtures::license;
    use crate::usecases::test_support::{alice, pipeline, seeded_repo};

    fn licenses() -> Arc<dyn EntityRepository<License>> {
        seeded_repo(vec![
            license("lic-pending", LicenseStatus::Pending),
            license("lic-active", LicenseStatus::Active),
            license("lic-revoked", LicenseStatus::Revoked),
        ])
    }

    fn assign_input(license_id: &str, user_id: &str) -> AssignLicenseInput {
        AssignLicenseInput {
            license_id: license_id.to_string(),
            user_id: user_id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_assign_activates_and_records_history() {
        let repo = licenses();
        let assign = AssignLicense::new(repo.clone(), pipeline(true));
        let lic = assign
            .execute(&alice(), &assign_input("lic-pending", "bob"))
            .await
            .unwrap();

        assert_eq!(lic.status, LicenseStatus::Active);
        assert_eq!(lic.assignee_user_id.as_deref(), Some("bob"));
        assert_eq!(lic.history.len(), 1);
        assert_eq!(lic.history[0].actor, "alice");

        let stored = repo.read("lic-pending").await.unwrap().unwrap();
        assert_eq!(stored, lic);
    }

    #[tokio::test]
    async fn test_assign_twice_is_translated_conflict() {
        let repo = licenses();
        let assign = AssignLicense::new(repo, pipeline(true));
        assign
            .execute(&alice(), &assign_input("lic-active", "bob"))
            .await
            .unwrap();

        let gym = RequestContext::new("alice", "fitness_center");
        let err = assign
            .execute(&gym, &assign_input("lic-active", "carol"))
            .await
            .unwrap_err();
        match err {
            AppError::Conflict { message } => {
                assert_eq!(message, "This membership already belongs to bob");
            }
            other => panic!("Expected Conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_assign_requires_user() {
        let assign = AssignLicense::new(licenses(), pipeline(true));
        let err = assign
            .execute(&alice(), &assign_input("lic-pending", " "))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "user_id"));
    }

    #[tokio::test]
    async fn test_reassign_flow() {
        let repo = licenses();
        let p = pipeline(true);
        AssignLicense::new(repo.clone(), p.clone())
            .execute(&alice(), &assign_input("lic-active", "bob"))
            .await
            .unwrap();

        let reassign = ReassignLicense::new(repo, p);
        let lic = reassign
            .execute(
                &alice(),
                &ReassignLicenseInput {
                    license_id: "lic-active".to_string(),
                    user_id: "carol".to_string(),
                    reason: Some("role change".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(lic.assignee_user_id.as_deref(), Some("carol"));
        let last = lic.history.last().unwrap();
        assert_eq!(last.from_assignee.as_deref(), Some("bob"));
        assert_eq!(last.reason.as_deref(), Some("role change"));
    }

    #[tokio::test]
    async fn test_reassign_unassigned_is_conflict() {
        let reassign = ReassignLicense::new(licenses(), pipeline(true));
        let err = reassign
            .execute(
                &alice(),
                &ReassignLicenseInput {
                    license_id: "lic-active".to_string(),
                    user_id: "carol".to_string(),
                    reason: None,
                },
            )
            .await
            .unwrap_err();
        match err {
            AppError::Conflict { message } => {
                assert_eq!(message, "This license is not assigned to anyone");
            }
            other => panic!("Expected Conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_terminal_license_cannot_transition() {
        let transition = TransitionLicense::new(licenses(), pipeline(true));
        let err = transition
            .execute(
                &alice(),
                &TransitionLicenseInput {
                    license_id: "lic-revoked".to_string(),
                    action: LicenseAction::Activate,
                    reason: None,
                },
            )
            .await
            .unwrap_err();
        match err {
            AppError::Conflict { message } => {
                assert_eq!(message, "A revoked license cannot become active");
            }
            other => panic!("Expected Conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_suspend_and_unknown_license() {
        let repo = licenses();
        let transition = TransitionLicense::new(repo, pipeline(true));
        let lic = transition
            .execute(
                &alice(),
                &TransitionLicenseInput {
                    license_id: "lic-active".to_string(),
                    action: LicenseAction::Suspend,
                    reason: Some("unpaid invoice".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(lic.status, LicenseStatus::Suspended);

        let err = transition
            .execute(
                &alice(),
                &TransitionLicenseInput {
                    license_id: "lic-missing".to_string(),
                    action: LicenseAction::Suspend,
                    reason: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_actions_require_permission() {
        let assign = AssignLicense::new(licenses(), pipeline(true));
        let err = assign
            .execute(
                &RequestContext::new("mallory", "default"),
                &assign_input("lic-pending", "mallory"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden { .. }));
    }
}
