use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
};
use chrono::Utc;
use compute::summary;
use model::entities::{category, ledger_entry};
use sea_orm::QueryOrder;
use tracing::{debug, error, info, instrument, trace};

use crate::auth::AuthUser;
use crate::handlers::budgets::find_owned_budget;
use crate::helpers::export::{export_filename, render_budget_csv, ExportEntry};
use crate::schemas::{api_error, compute_error, database_error, ApiError, AppState};

/// Export a budget, its summary and its entries as CSV
#[utoipa::path(
    get,
    path = "/api/v1/budgets/{budget_id}/export",
    tag = "budgets",
    security(("bearer_auth" = [])),
    params(
        ("budget_id" = i32, Path, description = "Budget ID"),
    ),
    responses(
        (status = 200, description = "CSV document", content_type = "text/csv", body = String),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Budget not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn export_budget(
    user: AuthUser,
    Path(budget_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    trace!("Entering export_budget function for budget_id: {}", budget_id);

    let budget = find_owned_budget(&state.db, budget_id, user.id).await?;
    let summary = summary::compute_summary(&state.db, &budget, Utc::now().date_naive())
        .await
        .map_err(|e| compute_error("export budget", e))?;

    let rows = ledger_entry::Entity::find_active_in_budget(budget.id, None)
        .order_by_asc(ledger_entry::Column::Date)
        .order_by_asc(ledger_entry::Column::Id)
        .find_also_related(category::Entity)
        .all(&state.db)
        .await
        .map_err(|e| database_error("load budget entries", e))?;
    debug!("Exporting {} entries of budget {}", rows.len(), budget.id);

    let (incomes, expenses): (Vec<_>, Vec<_>) = rows
        .into_iter()
        .partition(|(entry, _)| entry.kind == ledger_entry::EntryKind::Income);
    let to_lines = |rows: Vec<(ledger_entry::Model, Option<category::Model>)>| -> Vec<ExportEntry> {
        rows.into_iter()
            .map(|(entry, category)| ExportEntry {
                source: entry.source,
                amount: entry.amount,
                date: entry.date,
                category: category.map(|c| c.label),
            })
            .collect()
    };

    let document = render_budget_csv(&budget, &summary, &to_lines(incomes), &to_lines(expenses))
        .map_err(|e| {
            error!("Failed to render export of budget {}: {}", budget.id, e);
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "EXPORT_ERROR",
                "Failed to export budget",
            )
        })?;

    info!("Exported budget {} ({} bytes)", budget.id, document.len());
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", export_filename(budget.id)),
            ),
        ],
        document,
    ))
}
