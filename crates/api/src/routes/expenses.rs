//! Expense routes: submission, listing, and approval decisions.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, warn};
use uuid::Uuid;

use crate::{
    AppState,
    middleware::AuthUser,
    routes::{app_error_response, database_error, workflow_error_response},
};
use expenza_core::workflow::{Decision, ExpenseStatus, WorkflowError};
use expenza_shared::AppError;
use expenza_db::{
    ExpenseRepository, UserRepository, WorkflowRepository,
    entities::{expenses, users},
    repositories::SubmitExpenseInput,
};

/// Creates the expense routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/expenses", post(submit_expense))
        .route("/expenses", get(list_expenses))
        .route("/expenses/{expense_id}", get(get_expense))
        .route("/expenses/{expense_id}/approve", post(approve_expense))
        .route("/expenses/{expense_id}/reject", post(reject_expense))
}

/// Request body for submitting an expense.
#[derive(Debug, Deserialize)]
pub struct SubmitExpenseRequest {
    /// Amount in `currency`.
    pub amount: Decimal,
    /// ISO 4217 currency code of the amount.
    pub currency: String,
    /// Expense category.
    pub category: String,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Date the expense was incurred.
    pub expense_date: NaiveDate,
}

/// Request body for an approval decision.
#[derive(Debug, Default, Deserialize)]
pub struct DecisionRequest {
    /// Optional approver comments.
    pub comments: Option<String>,
}

/// Query parameters for expense listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// `company` widens the listing to every expense (admin only).
    pub scope: Option<String>,
}

/// POST /expenses - Submit an expense for approval.
async fn submit_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<SubmitExpenseRequest>,
) -> impl IntoResponse {
    if payload.amount <= Decimal::ZERO {
        return app_error_response(&AppError::Validation("amount must be positive".to_string()));
    }

    let workflow_repo = WorkflowRepository::new((*state.db).clone());
    let submitted = match workflow_repo
        .submit_expense(SubmitExpenseInput {
            company_id: auth.company_id(),
            employee_id: auth.user_id(),
            amount: payload.amount,
            currency: payload.currency.to_uppercase(),
            category: payload.category,
            description: payload.description,
            expense_date: payload.expense_date,
        })
        .await
    {
        Ok(s) => s,
        Err(e) => return workflow_error_response(&e),
    };

    // Best-effort: a failed notification never fails the submission.
    if let Some(approver_id) = submitted.expense.current_approver_id {
        notify_approver(&state, auth.company_id(), approver_id, &submitted.expense);
    }

    (
        StatusCode::CREATED,
        Json(json!({
            "data": submitted.expense,
            "steps": submitted.steps
        })),
    )
        .into_response()
}

/// GET /expenses - List own expenses, or every company expense for admins.
async fn list_expenses(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    let expense_repo = ExpenseRepository::new((*state.db).clone());

    let company_wide = query.scope.as_deref() == Some("company");
    if company_wide && !auth.user_role().is_some_and(|r| r.can_view_all_expenses()) {
        return app_error_response(&AppError::Forbidden(
            "only admins can list company expenses".to_string(),
        ));
    }

    let result = if company_wide {
        expense_repo.list_for_company(auth.company_id()).await
    } else {
        expense_repo.list_for_employee(auth.user_id()).await
    };

    match result {
        Ok(items) => (StatusCode::OK, Json(json!({ "data": items }))).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to list expenses");
            database_error()
        }
    }
}

/// GET /expenses/{id} - Expense detail with its approval steps.
async fn get_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(expense_id): Path<Uuid>,
) -> impl IntoResponse {
    let expense_repo = ExpenseRepository::new((*state.db).clone());

    let expense = match expense_repo.find_by_id(auth.company_id(), expense_id).await {
        Ok(Some(e)) => e,
        Ok(None) => return workflow_error_response(&WorkflowError::ExpenseNotFound(expense_id)),
        Err(e) => {
            error!(error = %e, "Failed to fetch expense");
            return database_error();
        }
    };

    let approvals = match expense_repo.list_approvals(expense_id).await {
        Ok(steps) => steps,
        Err(e) => {
            error!(error = %e, "Failed to fetch approvals");
            return database_error();
        }
    };

    // Visible to the submitter, any approver on it, and admins.
    let is_participant = expense.employee_id == auth.user_id()
        || approvals.iter().any(|a| a.approver_id == auth.user_id());
    if !is_participant && !auth.user_role().is_some_and(|r| r.can_view_all_expenses()) {
        // Hidden rather than forbidden so non-participants cannot probe.
        return workflow_error_response(&WorkflowError::ExpenseNotFound(expense_id));
    }

    (
        StatusCode::OK,
        Json(json!({
            "data": expense,
            "approvals": approvals
        })),
    )
        .into_response()
}

/// POST /expenses/{id}/approve - Approve the caller's pending step.
async fn approve_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(expense_id): Path<Uuid>,
    payload: Option<Json<DecisionRequest>>,
) -> impl IntoResponse {
    decide(state, auth, expense_id, Decision::Approve, payload).await
}

/// POST /expenses/{id}/reject - Reject the caller's pending step.
async fn reject_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(expense_id): Path<Uuid>,
    payload: Option<Json<DecisionRequest>>,
) -> impl IntoResponse {
    decide(state, auth, expense_id, Decision::Reject, payload).await
}

async fn decide(
    state: AppState,
    auth: AuthUser,
    expense_id: Uuid,
    decision: Decision,
    payload: Option<Json<DecisionRequest>>,
) -> axum::response::Response {
    let comments = payload.and_then(|Json(p)| p.comments);

    let workflow_repo = WorkflowRepository::new((*state.db).clone());
    let record = match workflow_repo
        .decide_expense(
            auth.company_id(),
            expense_id,
            auth.user_id(),
            decision,
            comments,
        )
        .await
    {
        Ok(r) => r,
        Err(e) => return workflow_error_response(&e),
    };

    if record.outcome.expense_status == ExpenseStatus::Pending {
        if let Some(next_id) = record.outcome.next_approver_id {
            notify_approver(&state, auth.company_id(), next_id, &record.expense);
        }
    } else {
        notify_submitter(&state, auth.company_id(), &record.expense);
    }

    (
        StatusCode::OK,
        Json(json!({
            "data": record.expense,
            "step": {
                "sequence": record.outcome.sequence,
                "status": record.outcome.step_status,
            }
        })),
    )
        .into_response()
}

/// Spawns a best-effort "waiting for your approval" email.
fn notify_approver(
    state: &AppState,
    company_id: Uuid,
    approver_id: Uuid,
    expense: &expenses::Model,
) {
    let state = state.clone();
    let expense_id = expense.id;
    let amount = expense.amount;
    let currency = expense.currency.clone();

    tokio::spawn(async move {
        let Some(user) = lookup_user(&state, company_id, approver_id).await else {
            return;
        };
        if let Err(e) = state
            .email_service
            .send_approval_request(&user.email, &user.name, expense_id, amount, &currency)
            .await
        {
            warn!(error = %e, expense_id = %expense_id, "Failed to notify approver");
        }
    });
}

/// Spawns a best-effort terminal-outcome email to the submitter.
fn notify_submitter(state: &AppState, company_id: Uuid, expense: &expenses::Model) {
    let state = state.clone();
    let expense_id = expense.id;
    let employee_id = expense.employee_id;
    let approved = ExpenseStatus::from(expense.status) == ExpenseStatus::Approved;

    tokio::spawn(async move {
        let Some(user) = lookup_user(&state, company_id, employee_id).await else {
            return;
        };
        if let Err(e) = state
            .email_service
            .send_expense_resolved(&user.email, &user.name, expense_id, approved)
            .await
        {
            warn!(error = %e, expense_id = %expense_id, "Failed to notify submitter");
        }
    });
}

async fn lookup_user(state: &AppState, company_id: Uuid, user_id: Uuid) -> Option<users::Model> {
    match UserRepository::new((*state.db).clone())
        .find_by_id(company_id, user_id)
        .await
    {
        Ok(user) => user,
        Err(e) => {
            warn!(error = %e, user_id = %user_id, "User lookup for notification failed");
            None
        }
    }
}

