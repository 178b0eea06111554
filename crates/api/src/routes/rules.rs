//! Approval rule and flow management routes (admin only).

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    AppState,
    middleware::AuthUser,
    routes::{database_error, require_role, workflow_error_response},
};
use expenza_core::workflow::{ApprovalRule, ApproverRole, RuleKind, WorkflowError};
use expenza_db::{
    RuleRepository, UserRepository,
    repositories::rule::{FlowStepInput, UpsertRuleInput},
};

/// Creates the rule management routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/approval-rule", get(get_rule))
        .route("/approval-rule", put(put_rule))
}

/// One flow step in a rule replacement request.
#[derive(Debug, Deserialize)]
pub struct FlowStepRequest {
    /// Position in the flow (1-based).
    pub sequence: i32,
    /// Required approver role.
    pub approver_role: ApproverRole,
    /// Whether the step can never be skipped.
    #[serde(default)]
    pub is_mandatory: bool,
}

/// Request body replacing a company's rule and flow together.
#[derive(Debug, Deserialize)]
pub struct PutRuleRequest {
    /// Kind of rule.
    pub kind: RuleKind,
    /// Threshold for percentage/hybrid rules.
    pub threshold: Option<Decimal>,
    /// Named approver for specific/hybrid rules.
    pub specific_approver_id: Option<Uuid>,
    /// Ordered flow steps.
    pub flow: Vec<FlowStepRequest>,
}

/// GET /approval-rule - The company's configured rule and flow.
async fn get_rule(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    if let Err(response) = require_admin(&auth) {
        return response;
    }

    let rule_repo = RuleRepository::new((*state.db).clone());

    let rule = match rule_repo.get_rule(auth.company_id()).await {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, "Failed to fetch approval rule");
            return database_error();
        }
    };
    let flow = match rule_repo.get_flow(auth.company_id()).await {
        Ok(f) => f,
        Err(e) => {
            error!(error = %e, "Failed to fetch approval flow");
            return database_error();
        }
    };

    (
        StatusCode::OK,
        Json(json!({ "rule": rule, "flow": flow })),
    )
        .into_response()
}

/// PUT /approval-rule - Replace the company's rule and flow.
///
/// The rule is validated before anything is written; submissions made
/// under the old configuration keep their already-compiled steps.
async fn put_rule(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<PutRuleRequest>,
) -> impl IntoResponse {
    if let Err(response) = require_admin(&auth) {
        return response;
    }

    let rule = ApprovalRule {
        kind: payload.kind,
        threshold: payload.threshold,
        specific_approver_id: payload.specific_approver_id,
    };
    if let Err(e) = rule.validate() {
        return workflow_error_response(&e);
    }
    if let Err(response) = validate_flow_request(&payload.flow) {
        return response;
    }

    // A named approver must exist in this company.
    if let Some(approver_id) = payload.specific_approver_id {
        match UserRepository::new((*state.db).clone())
            .find_by_id(auth.company_id(), approver_id)
            .await
        {
            Ok(Some(_)) => {}
            Ok(None) => {
                return workflow_error_response(&WorkflowError::InvalidRule(
                    "specific approver is not a member of this company".to_string(),
                ));
            }
            Err(e) => {
                error!(error = %e, "Failed to check specific approver");
                return database_error();
            }
        }
    }

    let rule_repo = RuleRepository::new((*state.db).clone());

    let stored_rule = match rule_repo
        .upsert_rule(UpsertRuleInput {
            company_id: auth.company_id(),
            kind: payload.kind.into(),
            threshold: payload.threshold,
            specific_approver_id: payload.specific_approver_id,
        })
        .await
    {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, "Failed to upsert approval rule");
            return database_error();
        }
    };

    let steps: Vec<FlowStepInput> = payload
        .flow
        .iter()
        .map(|step| FlowStepInput {
            sequence: step.sequence,
            approver_role: step.approver_role.into(),
            is_mandatory: step.is_mandatory,
        })
        .collect();

    let stored_flow = match rule_repo.replace_flow(auth.company_id(), &steps).await {
        Ok(f) => f,
        Err(e) => {
            error!(error = %e, "Failed to replace approval flow");
            return database_error();
        }
    };

    info!(
        company_id = %auth.company_id(),
        steps = stored_flow.len(),
        "Approval configuration replaced"
    );

    (
        StatusCode::OK,
        Json(json!({ "rule": stored_rule, "flow": stored_flow })),
    )
        .into_response()
}

/// Rejects non-positive and duplicate sequences before they hit the
/// unique constraint.
fn validate_flow_request(flow: &[FlowStepRequest]) -> Result<(), axum::response::Response> {
    let mut seen = std::collections::HashSet::new();
    for step in flow {
        if step.sequence <= 0 {
            return Err(invalid_flow("flow sequences must be positive"));
        }
        if !seen.insert(step.sequence) {
            return Err(invalid_flow("flow sequences must be unique"));
        }
    }
    Ok(())
}

fn invalid_flow(message: &str) -> axum::response::Response {
    workflow_error_response(&WorkflowError::InvalidFlow(message.to_string()))
}

fn require_admin(auth: &AuthUser) -> Result<(), axum::response::Response> {
    require_role(
        auth,
        |r| r.can_manage_rules(),
        "only admins can manage approval rules",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(sequence: i32) -> FlowStepRequest {
        FlowStepRequest {
            sequence,
            approver_role: ApproverRole::Manager,
            is_mandatory: true,
        }
    }

    #[test]
    fn test_validate_flow_request_accepts_ordered_steps() {
        assert!(validate_flow_request(&[step(1), step(2), step(3)]).is_ok());
        assert!(validate_flow_request(&[]).is_ok());
    }

    #[test]
    fn test_validate_flow_request_rejects_duplicates() {
        assert!(validate_flow_request(&[step(1), step(1)]).is_err());
    }

    #[test]
    fn test_validate_flow_request_rejects_non_positive() {
        assert!(validate_flow_request(&[step(0)]).is_err());
        assert!(validate_flow_request(&[step(-3)]).is_err());
    }
}
