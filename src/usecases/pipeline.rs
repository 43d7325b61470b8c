//! Steps shared by every use case: authorize, validate, check business
//! rules, enrich and shape failures.

use jiff::Timestamp;
use tracing::{debug, warn};

use super::RequestContext;
use crate::error::{AppError, AppResult};
use crate::listing::{FieldTable, ListRequest};
use crate::models::{Entity, RuleViolation};
use crate::services::{Action, Permission, Services};

#[derive(Clone)]
pub struct Pipeline {
    services: Services,
}

impl Pipeline {
    pub fn new(services: Services) -> Self {
        Self { services }
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    fn t(&self, ctx: &RequestContext, key: &str, params: &[(&str, &str)]) -> String {
        self.services
            .translation
            .get(&ctx.business_type, key, params)
    }

    /// Business-type specific display name of an entity.
    pub fn entity_label(&self, ctx: &RequestContext, entity: &str) -> String {
        self.services.translation.get_with_default(
            &ctx.business_type,
            &format!("entities.{entity}"),
            entity,
            &[],
        )
    }

    fn operation_label(&self, ctx: &RequestContext, action: Action) -> String {
        self.services.translation.get_with_default(
            &ctx.business_type,
            &format!("operations.{}", action.as_str()),
            action.as_str(),
            &[],
        )
    }

    /// Skipped entirely when the authorization provider is disabled.
    pub async fn authorize(
        &self,
        ctx: &RequestContext,
        entity: &'static str,
        action: Action,
    ) -> AppResult<()> {
        let authz = &self.services.authorization;
        if !authz.is_enabled() {
            return Ok(());
        }
        let permission = Permission::new(entity, action);
        let allowed = authz
            .has_permission(&ctx.user_id, &permission)
            .await
            .map_err(|e| self.operation_failed(ctx, entity, action, e))?;
        if allowed {
            return Ok(());
        }

        warn!(user = %ctx.user_id, %permission, "Permission denied");
        let operation = self.operation_label(ctx, action);
        let label = self.entity_label(ctx, entity);
        Err(AppError::Forbidden {
            message: self.t(
                ctx,
                "errors.forbidden",
                &[("operation", &operation), ("entity", &label)],
            ),
        })
    }

    /// Field validation, then the entity's own business rules.
    pub fn validate_entity<E: Entity>(&self, ctx: &RequestContext, entity: &E) -> AppResult<()> {
        entity.validate()?;
        entity
            .check_business_rules()
            .map_err(|v| self.rule_violation(ctx, v))
    }

    pub fn rule_violation(&self, ctx: &RequestContext, violation: RuleViolation) -> AppError {
        debug!(rule = violation.rule, field = violation.field, "Business rule rejected request");
        AppError::BusinessRule {
            rule: violation.rule.to_string(),
            message: self.services.translation.get_with_default(
                &ctx.business_type,
                &format!("rules.{}", violation.rule),
                violation.message,
                &[],
            ),
        }
    }

    pub fn require_id(
        &self,
        ctx: &RequestContext,
        entity: &'static str,
        id: &str,
    ) -> AppResult<()> {
        if id.trim().is_empty() {
            let label = self.entity_label(ctx, entity);
            return Err(AppError::Validation {
                field: "id".to_string(),
                reason: self.t(
                    ctx,
                    "errors.invalid_request",
                    &[("entity", &label), ("reason", "id is required")],
                ),
            });
        }
        Ok(())
    }

    /// Every field a list request names must exist in the entity's field
    /// table, and typed predicates must suit the field's kind.
    pub fn validate_list_request<E: Entity>(
        &self,
        ctx: &RequestContext,
        request: &ListRequest,
    ) -> AppResult<()> {
        let table: &FieldTable<E> = E::fields();
        let unknown = |field: &str| {
            let label = self.entity_label(ctx, E::NAME);
            AppError::Validation {
                field: field.to_string(),
                reason: self.t(
                    ctx,
                    "errors.invalid_field",
                    &[("field", field), ("entity", &label)],
                ),
            }
        };

        if let Some(filter) = &request.filter {
            for typed in filter.flatten() {
                let kind = table
                    .kind_of(&typed.field)
                    .ok_or_else(|| unknown(&typed.field))?;
                if !typed.predicate.accepts(kind) {
                    let label = self.entity_label(ctx, E::NAME);
                    let reason = format!("{} does not support this filter", typed.field);
                    return Err(AppError::Validation {
                        field: typed.field.clone(),
                        reason: self.t(
                            ctx,
                            "errors.invalid_request",
                            &[("entity", &label), ("reason", &reason)],
                        ),
                    });
                }
            }
        }
        if let Some(sort) = &request.sort {
            if let Some(bad) = sort.fields.iter().find(|s| !table.contains(&s.field)) {
                return Err(unknown(&bad.field));
            }
        }
        if let Some(search) = &request.search {
            if let Some(bad) = search.fields.iter().find(|f| !table.contains(f)) {
                return Err(unknown(bad));
            }
        }
        Ok(())
    }

    /// Generated id (when absent) plus creation timestamps.
    pub fn enrich_new<E: Entity>(&self, entity: &mut E, now: Timestamp) {
        if entity.id().trim().is_empty() {
            entity.assign_id(self.services.ids.generate_id());
        }
        entity.stamp_created(now);
    }

    pub fn not_found(&self, ctx: &RequestContext, entity: &'static str, id: &str) -> AppError {
        debug!(entity, id, business_type = %ctx.business_type, "Entity not found");
        AppError::not_found(entity, id)
    }

    /// Client errors pass through; everything else is wrapped with a
    /// translated "operation failed" message.
    pub fn operation_failed(
        &self,
        ctx: &RequestContext,
        entity: &'static str,
        action: Action,
        error: AppError,
    ) -> AppError {
        if error.is_client_error() {
            return error;
        }
        warn!(entity, action = %action, error = %error, "Operation failed");
        let operation = self.operation_label(ctx, action);
        let label = self.entity_label(ctx, entity);
        AppError::Operation {
            message: self.t(
                ctx,
                "errors.operation_failed",
                &[("operation", &operation), ("entity", &label)],
            ),
            source: anyhow::Error::from(error),
        }
    }
}
