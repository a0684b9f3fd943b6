use crate::handlers::{
    budgets::{create_budget, delete_budget, get_budget, list_budgets, update_budget},
    categories::{create_category, delete_category, get_category, list_categories, update_category},
    entries::{
        create_expense, create_income, delete_expense, delete_income, get_expense, get_income,
        list_entries, load_recurrences, update_expense, update_income,
    },
    export::export_budget,
    health::{credits, health_check},
    users::{login, logout, me, register},
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        .route("/api/v1/credits", get(credits))
        // Authentication
        .route("/api/v1/register", post(register))
        .route("/api/v1/login", post(login))
        .route("/api/v1/logout", post(logout))
        .route("/api/v1/me", get(me))
        // Budget periods
        .route("/api/v1/budgets", get(list_budgets).post(create_budget))
        .route(
            "/api/v1/budgets/:budget_id",
            get(get_budget).put(update_budget).delete(delete_budget),
        )
        .route("/api/v1/budgets/:budget_id/export", get(export_budget))
        // Ledger entries
        .route("/api/v1/budgets/:budget_id/entries", get(list_entries))
        .route("/api/v1/budgets/:budget_id/incomes", post(create_income))
        .route(
            "/api/v1/budgets/:budget_id/incomes/:entry_id",
            get(get_income).put(update_income).delete(delete_income),
        )
        .route("/api/v1/budgets/:budget_id/expenses", post(create_expense))
        .route(
            "/api/v1/budgets/:budget_id/expenses/:entry_id",
            get(get_expense).put(update_expense).delete(delete_expense),
        )
        .route("/api/v1/budgets/:budget_id/load-recurrences", post(load_recurrences))
        // Categories
        .route("/api/v1/categories", get(list_categories).post(create_category))
        .route(
            "/api/v1/categories/:category_id",
            get(get_category).put(update_category).delete(delete_category),
        )
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
