use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use common::BudgetSummary;
use compute::{period, summary};
use model::entities::budget;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::AuthUser;
use crate::helpers::validation::money_amount;
use crate::schemas::{
    compute_error, database_error, not_found, validation_error, ApiError, ApiResponse, AppState,
};

/// Request body for creating a budget period
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateBudgetRequest {
    /// What the budget is for, e.g. "March groceries"
    #[validate(length(min = 1, max = 255))]
    pub purpose: String,
    /// Target balance at the end of the period
    #[validate(custom(function = "money_amount"))]
    pub goal: Decimal,
    /// First day of the period (inclusive)
    pub from_date: NaiveDate,
    /// Last day of the period (inclusive)
    pub to_date: NaiveDate,
}

/// Request body for updating a budget period; omitted fields keep their value
#[derive(Debug, Default, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateBudgetRequest {
    #[validate(length(min = 1, max = 255))]
    pub purpose: Option<String>,
    #[validate(custom(function = "money_amount"))]
    pub goal: Option<Decimal>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BudgetResponse {
    pub id: i32,
    pub purpose: String,
    pub goal: Decimal,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub created_at: NaiveDateTime,
}

impl From<budget::Model> for BudgetResponse {
    fn from(model: budget::Model) -> Self {
        Self {
            id: model.id,
            purpose: model.purpose,
            goal: model.goal,
            from_date: model.from_date,
            to_date: model.to_date,
            created_at: model.created_at,
        }
    }
}

/// A budget together with its derived figures
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BudgetDetailResponse {
    pub budget: BudgetResponse,
    pub summary: BudgetSummary,
}

/// Loads an active budget owned by `owner_id`.
///
/// Budgets of other users are reported as missing.
pub async fn find_owned_budget<C: ConnectionTrait>(
    db: &C,
    budget_id: i32,
    owner_id: i32,
) -> Result<budget::Model, ApiError> {
    trace!("Looking up budget {} for user {}", budget_id, owner_id);
    match budget::Entity::find_active()
        .filter(budget::Column::Id.eq(budget_id))
        .filter(budget::Column::OwnerId.eq(owner_id))
        .one(db)
        .await
    {
        Ok(Some(budget)) => Ok(budget),
        Ok(None) => {
            warn!("Budget {} not found for user {}", budget_id, owner_id);
            Err(not_found("Budget", budget_id))
        }
        Err(e) => Err(database_error("retrieve budget", e)),
    }
}

/// List the budgets of the authenticated user, newest first
#[utoipa::path(
    get,
    path = "/api/v1/budgets",
    tag = "budgets",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Budgets retrieved successfully", body = ApiResponse<Vec<BudgetResponse>>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn list_budgets(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<BudgetResponse>>>), ApiError> {
    trace!("Entering list_budgets function");

    let budgets = budget::Entity::find_active_owned(user.id)
        .all(&state.db)
        .await
        .map_err(|e| database_error("retrieve budgets", e))?;

    info!("Retrieved {} budgets for user {}", budgets.len(), user.id);
    let data = budgets.into_iter().map(BudgetResponse::from).collect();
    Ok((StatusCode::OK, Json(ApiResponse::ok(data, "Budgets retrieved successfully"))))
}

/// Create a budget period
#[utoipa::path(
    post,
    path = "/api/v1/budgets",
    tag = "budgets",
    security(("bearer_auth" = [])),
    request_body = CreateBudgetRequest,
    responses(
        (status = 201, description = "Budget created successfully", body = ApiResponse<BudgetResponse>),
        (status = 400, description = "Invalid request or overlapping period", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_budget(
    user: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<CreateBudgetRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BudgetResponse>>), ApiError> {
    trace!("Entering create_budget function");
    debug!(
        "Creating budget '{}' from {} to {} for user {}",
        request.purpose, request.from_date, request.to_date, user.id
    );
    request.validate().map_err(validation_error)?;

    period::ensure_no_overlap(&state.db, user.id, request.from_date, request.to_date, None)
        .await
        .map_err(|e| compute_error("create budget", e))?;

    let created = budget::ActiveModel {
        owner_id: Set(user.id),
        purpose: Set(request.purpose),
        goal: Set(request.goal),
        from_date: Set(request.from_date),
        to_date: Set(request.to_date),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| database_error("create budget", e))?;

    info!("Budget created successfully with ID: {}", created.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            BudgetResponse::from(created),
            "Budget created successfully",
        )),
    ))
}

/// Get a budget with its balance, remaining days and distance from the goal
#[utoipa::path(
    get,
    path = "/api/v1/budgets/{budget_id}",
    tag = "budgets",
    security(("bearer_auth" = [])),
    params(
        ("budget_id" = i32, Path, description = "Budget ID"),
    ),
    responses(
        (status = 200, description = "Budget retrieved successfully", body = ApiResponse<BudgetDetailResponse>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Budget not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_budget(
    user: AuthUser,
    Path(budget_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<BudgetDetailResponse>>), ApiError> {
    trace!("Entering get_budget function for budget_id: {}", budget_id);

    let budget = find_owned_budget(&state.db, budget_id, user.id).await?;
    let summary = summary::compute_summary(&state.db, &budget, Utc::now().date_naive())
        .await
        .map_err(|e| compute_error("summarize budget", e))?;

    info!(
        "Retrieved budget {} with balance {}",
        budget.id, summary.overall_balance
    );
    let data = BudgetDetailResponse {
        budget: BudgetResponse::from(budget),
        summary,
    };
    Ok((StatusCode::OK, Json(ApiResponse::ok(data, "Budget retrieved successfully"))))
}

/// Update a budget period
///
/// The new range may not overlap another period of the user, nor leave any
/// of the budget's entries outside of it.
#[utoipa::path(
    put,
    path = "/api/v1/budgets/{budget_id}",
    tag = "budgets",
    security(("bearer_auth" = [])),
    params(
        ("budget_id" = i32, Path, description = "Budget ID"),
    ),
    request_body = UpdateBudgetRequest,
    responses(
        (status = 200, description = "Budget updated successfully", body = ApiResponse<BudgetResponse>),
        (status = 400, description = "Invalid request, overlapping period or stranded entries", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Budget not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_budget(
    user: AuthUser,
    Path(budget_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdateBudgetRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BudgetResponse>>), ApiError> {
    trace!("Entering update_budget function for budget_id: {}", budget_id);
    request.validate().map_err(validation_error)?;

    let existing = find_owned_budget(&state.db, budget_id, user.id).await?;
    let from = request.from_date.unwrap_or(existing.from_date);
    let to = request.to_date.unwrap_or(existing.to_date);
    debug!("Budget {} range becomes {} - {}", budget_id, from, to);

    if from != existing.from_date || to != existing.to_date {
        period::ensure_no_overlap(&state.db, user.id, from, to, Some(budget_id))
            .await
            .map_err(|e| compute_error("update budget", e))?;
        period::ensure_entries_within(&state.db, budget_id, from, to)
            .await
            .map_err(|e| compute_error("update budget", e))?;
    }

    let mut active: budget::ActiveModel = existing.into();
    if let Some(purpose) = request.purpose {
        active.purpose = Set(purpose);
    }
    if let Some(goal) = request.goal {
        active.goal = Set(goal);
    }
    active.from_date = Set(from);
    active.to_date = Set(to);

    let updated = active
        .update(&state.db)
        .await
        .map_err(|e| database_error("update budget", e))?;

    info!("Budget {} updated successfully", updated.id);
    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(
            BudgetResponse::from(updated),
            "Budget updated successfully",
        )),
    ))
}

/// Delete a budget period
///
/// The budget is soft-deleted and disappears from listings.
#[utoipa::path(
    delete,
    path = "/api/v1/budgets/{budget_id}",
    tag = "budgets",
    security(("bearer_auth" = [])),
    params(
        ("budget_id" = i32, Path, description = "Budget ID"),
    ),
    responses(
        (status = 200, description = "Budget deleted successfully", body = ApiResponse<String>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Budget not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_budget(
    user: AuthUser,
    Path(budget_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<String>>), ApiError> {
    trace!("Entering delete_budget function for budget_id: {}", budget_id);

    let budget = find_owned_budget(&state.db, budget_id, user.id).await?;
    budget
        .soft_delete(&state.db, user.id, Utc::now().naive_utc())
        .await
        .map_err(|e| database_error("delete budget", e))?;

    info!("Budget {} deleted by user {}", budget_id, user.id);
    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(
            format!("Budget {} deleted", budget_id),
            "Budget deleted successfully",
        )),
    ))
}
