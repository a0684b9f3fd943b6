use axum::{http::StatusCode, response::Json};
use common::{BudgetSummary, EntryKind, Recurrence};
use compute::{ComputeError, OverflowScope};
use sea_orm::{DatabaseConnection, DbErr};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, warn};
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi, ToSchema,
};
use validator::ValidationErrors;

use crate::auth::TokenKeys;
use crate::handlers::{
    budgets::{BudgetDetailResponse, BudgetResponse, CreateBudgetRequest, UpdateBudgetRequest},
    categories::{CategoryResponse, CreateCategoryRequest, UpdateCategoryRequest},
    entries::{EntryRequest, EntryResponse, MaterializationResponse, ReloadResponse},
    health::CreditsResponse,
    users::{LoginRequest, RegisterRequest, TokenResponse, UserResponse},
};

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Token signing and verification keys
    pub auth: Arc<TokenKeys>,
    /// Which budgets receive recurring occurrences past the end of their own budget
    pub overflow_scope: OverflowScope,
}

/// API response wrapper
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success status
    pub success: bool,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
            success: true,
        }
    }
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

/// Error half of every handler result.
pub type ApiError = (StatusCode, Json<ErrorResponse>);

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: &str) -> Self {
        Self {
            error: error.into(),
            code: code.to_string(),
            success: false,
        }
    }
}

pub fn api_error(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse::new(message, code)))
}

pub fn not_found(entity: &str, id: i32) -> ApiError {
    api_error(
        StatusCode::NOT_FOUND,
        "NOT_FOUND",
        format!("{} with ID {} not found", entity, id),
    )
}

/// Logs a persistence failure and hides its details from the client.
pub fn database_error(action: &str, err: DbErr) -> ApiError {
    error!("Failed to {}: {}", action, err);
    api_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "DATABASE_ERROR",
        format!("Failed to {}", action),
    )
}

pub fn validation_error(errors: ValidationErrors) -> ApiError {
    warn!("Request validation failed: {}", errors);
    api_error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", errors.to_string())
}

/// Maps domain errors onto HTTP responses.
pub fn compute_error(action: &str, err: ComputeError) -> ApiError {
    let code = match &err {
        ComputeError::Database(_) => {
            error!("Failed to {}: {}", action, err);
            return api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                format!("Failed to {}", action),
            );
        }
        ComputeError::NotFound { .. } => {
            warn!("Failed to {}: {}", action, err);
            return api_error(StatusCode::NOT_FOUND, "NOT_FOUND", err.to_string());
        }
        ComputeError::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
        ComputeError::OverlappingBudget { .. } => "OVERLAPPING_BUDGET",
        ComputeError::DateOutsideBudget { .. } => "DATE_OUTSIDE_BUDGET",
        ComputeError::EntriesOutsideBudget { .. } => "ENTRIES_OUTSIDE_BUDGET",
        ComputeError::InvalidFrequency(_) => "INVALID_FREQUENCY",
    };
    warn!("Rejected request to {}: {}", action, err);
    api_error(StatusCode::BAD_REQUEST, code, err.to_string())
}

/// Health check response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::health::credits,
        crate::handlers::users::register,
        crate::handlers::users::login,
        crate::handlers::users::logout,
        crate::handlers::users::me,
        crate::handlers::budgets::list_budgets,
        crate::handlers::budgets::create_budget,
        crate::handlers::budgets::get_budget,
        crate::handlers::budgets::update_budget,
        crate::handlers::budgets::delete_budget,
        crate::handlers::export::export_budget,
        crate::handlers::entries::list_entries,
        crate::handlers::entries::create_income,
        crate::handlers::entries::get_income,
        crate::handlers::entries::update_income,
        crate::handlers::entries::delete_income,
        crate::handlers::entries::create_expense,
        crate::handlers::entries::get_expense,
        crate::handlers::entries::update_expense,
        crate::handlers::entries::delete_expense,
        crate::handlers::entries::load_recurrences,
        crate::handlers::categories::list_categories,
        crate::handlers::categories::create_category,
        crate::handlers::categories::get_category,
        crate::handlers::categories::update_category,
        crate::handlers::categories::delete_category,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            CreditsResponse,
            RegisterRequest,
            LoginRequest,
            TokenResponse,
            UserResponse,
            CreateBudgetRequest,
            UpdateBudgetRequest,
            BudgetResponse,
            BudgetDetailResponse,
            BudgetSummary,
            EntryRequest,
            EntryResponse,
            MaterializationResponse,
            ReloadResponse,
            EntryKind,
            Recurrence,
            CreateCategoryRequest,
            UpdateCategoryRequest,
            CategoryResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check and service information"),
        (name = "users", description = "Registration and authentication"),
        (name = "budgets", description = "Budget periods, summaries and export"),
        (name = "entries", description = "Incomes, expenses and recurring entries"),
        (name = "categories", description = "Entry categories"),
    ),
    info(
        title = "Budgeteer API",
        description = "Personal budget tracking: budget periods, incomes and expenses, recurring entries",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
