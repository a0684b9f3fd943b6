//! Incomes and expenses of a budget.
//!
//! Incomes and expenses share one table and one set of handlers; the routes
//! only differ in the [`EntryKind`] they pin. Saving a recurring entry
//! regenerates its occurrences in the same transaction.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use common::{EntryKind, Page, Recurrence};
use compute::{ledger, recurrence, MaterializationReport};
use model::entities::{category, ledger_entry};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::auth::AuthUser;
use crate::handlers::budgets::find_owned_budget;
use crate::helpers::converters::{kind_from_model, kind_to_model, recurrence_from_model, recurrence_to_model};
use crate::helpers::validation::money_amount;
use crate::schemas::{
    api_error, compute_error, database_error, not_found, validation_error, ApiError, ApiResponse,
    AppState,
};

fn default_frequency() -> i32 {
    1
}

/// Request body for creating or replacing an income or expense
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct EntryRequest {
    /// Where the money comes from or goes to
    #[validate(length(min = 1, max = 255))]
    pub source: String,
    /// Amount with at most two decimals; positive expense amounts are stored negative
    #[validate(custom(function = "money_amount"))]
    pub amount: Decimal,
    /// Must lie within the budget period
    pub date: NaiveDate,
    pub category_id: Option<i32>,
    #[serde(default)]
    pub is_recurrent: bool,
    #[serde(default)]
    pub recurrence: Recurrence,
    /// Total number of occurrences, this entry included
    #[serde(default = "default_frequency")]
    #[validate(range(min = 1, max = 1000))]
    pub frequency: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EntryResponse {
    pub id: i32,
    pub budget_id: i32,
    pub kind: EntryKind,
    pub source: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub category_id: Option<i32>,
    pub is_recurrent: bool,
    pub recurrence: Recurrence,
    pub frequency: i32,
    /// Recurring entry this one was generated from
    pub parent_id: Option<i32>,
    pub created_at: NaiveDateTime,
}

impl From<ledger_entry::Model> for EntryResponse {
    fn from(model: ledger_entry::Model) -> Self {
        Self {
            id: model.id,
            budget_id: model.budget_id,
            kind: kind_from_model(model.kind),
            source: model.source,
            amount: model.amount,
            date: model.date,
            category_id: model.category_id,
            is_recurrent: model.is_recurrent,
            recurrence: recurrence_from_model(model.recurrence),
            frequency: model.frequency,
            parent_id: model.parent_id,
            created_at: model.created_at,
        }
    }
}

/// A saved entry and the occurrences generated from it
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MaterializationResponse {
    pub entry: EntryResponse,
    /// Occurrences created by this save
    pub generated: Vec<EntryResponse>,
    /// Occurrence dates not covered by any budget
    pub dropped_dates: Vec<NaiveDate>,
    /// Previously generated occurrences that were replaced
    pub discarded: u64,
}

impl MaterializationResponse {
    fn new(entry: ledger_entry::Model, report: MaterializationReport) -> Self {
        Self {
            entry: EntryResponse::from(entry),
            generated: report.created.into_iter().map(EntryResponse::from).collect(),
            dropped_dates: report.dropped,
            discarded: report.discarded,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReloadResponse {
    /// Recurring entries that were re-materialized
    pub entries: usize,
    pub created: usize,
    pub dropped: usize,
    pub discarded: u64,
}

/// Query parameters for listing entries
#[derive(Debug, Deserialize, ToSchema, IntoParams, Validate)]
pub struct EntriesQuery {
    /// Page number (default: 1)
    #[validate(range(min = 1, max = 10000))]
    pub page: Option<u64>,
    /// Page size (default: 20)
    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<u64>,
    /// Only incomes or only expenses
    pub kind: Option<EntryKind>,
}

async fn begin(state: &AppState) -> Result<DatabaseTransaction, ApiError> {
    state
        .db
        .begin()
        .await
        .map_err(|e| database_error("start transaction", e))
}

async fn commit(txn: DatabaseTransaction, action: &str) -> Result<(), ApiError> {
    txn.commit().await.map_err(|e| database_error(action, e))
}

/// Loads an active entry of `kind` in one of the user's budgets.
async fn find_owned_entry<C: ConnectionTrait>(
    db: &C,
    owner_id: i32,
    budget_id: i32,
    entry_id: i32,
    kind: EntryKind,
) -> Result<ledger_entry::Model, ApiError> {
    let entity = capitalized(kind);
    match ledger_entry::Entity::find_active_in_budget(budget_id, Some(kind_to_model(kind)))
        .filter(ledger_entry::Column::Id.eq(entry_id))
        .filter(ledger_entry::Column::OwnerId.eq(owner_id))
        .one(db)
        .await
    {
        Ok(Some(entry)) => Ok(entry),
        Ok(None) => {
            warn!("{} {} not found in budget {} for user {}", entity, entry_id, budget_id, owner_id);
            Err(not_found(entity, entry_id))
        }
        Err(e) => Err(database_error("retrieve entry", e)),
    }
}

/// Rejects categories that do not exist or belong to someone else.
async fn ensure_owned_category<C: ConnectionTrait>(
    db: &C,
    owner_id: i32,
    category_id: Option<i32>,
) -> Result<(), ApiError> {
    let Some(category_id) = category_id else {
        return Ok(());
    };
    let found = category::Entity::find_by_id(category_id)
        .filter(category::Column::OwnerId.eq(owner_id))
        .one(db)
        .await
        .map_err(|e| database_error("retrieve category", e))?;
    if found.is_none() {
        warn!("Category {} not available to user {}", category_id, owner_id);
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "INVALID_CATEGORY",
            format!("Category with ID {} not found", category_id),
        ));
    }
    Ok(())
}

/// Checks that apply to both creating and replacing an entry.
fn validate_entry(request: &EntryRequest) -> Result<(), ApiError> {
    request.validate().map_err(validation_error)?;
    ledger::ensure_valid_frequency(request.frequency)
        .map_err(|e| compute_error("save entry", e))?;
    if request.is_recurrent && request.recurrence == Recurrence::OneOff && request.frequency > 1 {
        warn!("Recurring entry without a recurrence period");
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "INVALID_RECURRENCE",
            "A recurring entry needs a daily, weekly, monthly or yearly recurrence",
        ));
    }
    Ok(())
}

async fn create_entry(
    state: AppState,
    user: AuthUser,
    budget_id: i32,
    kind: EntryKind,
    request: EntryRequest,
) -> Result<(StatusCode, Json<ApiResponse<MaterializationResponse>>), ApiError> {
    debug!(
        "Creating {} '{}' of {} on {} in budget {}",
        kind, request.source, request.amount, request.date, budget_id
    );
    validate_entry(&request)?;

    let txn = begin(&state).await?;
    let budget = find_owned_budget(&txn, budget_id, user.id).await?;
    ledger::ensure_date_within(&budget, request.date)
        .map_err(|e| compute_error("create entry", e))?;
    ensure_owned_category(&txn, user.id, request.category_id).await?;

    let now = Utc::now().naive_utc();
    let stored_kind = kind_to_model(kind);
    let entry = ledger_entry::ActiveModel {
        owner_id: Set(user.id),
        budget_id: Set(budget.id),
        kind: Set(stored_kind),
        source: Set(request.source),
        amount: Set(ledger::normalize_amount(stored_kind, request.amount)),
        date: Set(request.date),
        category_id: Set(request.category_id),
        is_recurrent: Set(request.is_recurrent),
        recurrence: Set(recurrence_to_model(request.recurrence)),
        frequency: Set(request.frequency),
        parent_id: Set(None),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| database_error("create entry", e))?;

    let report = recurrence::materialize(&txn, &entry, user.id, state.overflow_scope, now)
        .await
        .map_err(|e| compute_error("generate recurring entries", e))?;
    commit(txn, "create entry").await?;

    info!(
        "{} {} created with {} generated occurrences",
        kind,
        entry.id,
        report.created.len()
    );
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            MaterializationResponse::new(entry, report),
            format!("{} saved for {}", capitalized(kind), budget.purpose),
        )),
    ))
}

async fn get_entry(
    state: AppState,
    user: AuthUser,
    budget_id: i32,
    entry_id: i32,
    kind: EntryKind,
) -> Result<(StatusCode, Json<ApiResponse<EntryResponse>>), ApiError> {
    find_owned_budget(&state.db, budget_id, user.id).await?;
    let entry = find_owned_entry(&state.db, user.id, budget_id, entry_id, kind).await?;
    info!("Retrieved {} {}", kind, entry.id);
    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(
            EntryResponse::from(entry),
            format!("{} retrieved successfully", capitalized(kind)),
        )),
    ))
}

async fn update_entry(
    state: AppState,
    user: AuthUser,
    budget_id: i32,
    entry_id: i32,
    kind: EntryKind,
    request: EntryRequest,
) -> Result<(StatusCode, Json<ApiResponse<MaterializationResponse>>), ApiError> {
    debug!("Replacing {} {} in budget {}", kind, entry_id, budget_id);
    validate_entry(&request)?;

    let txn = begin(&state).await?;
    let budget = find_owned_budget(&txn, budget_id, user.id).await?;
    let existing = find_owned_entry(&txn, user.id, budget_id, entry_id, kind).await?;
    if existing.is_generated() && request.is_recurrent {
        warn!("Generated {} {} cannot become recurrent", kind, entry_id);
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "GENERATED_ENTRY",
            "An occurrence of a recurring entry cannot recur itself",
        ));
    }
    ledger::ensure_date_within(&budget, request.date)
        .map_err(|e| compute_error("update entry", e))?;
    ensure_owned_category(&txn, user.id, request.category_id).await?;

    let stored_kind = existing.kind;
    let mut active: ledger_entry::ActiveModel = existing.into();
    active.source = Set(request.source);
    active.amount = Set(ledger::normalize_amount(stored_kind, request.amount));
    active.date = Set(request.date);
    active.category_id = Set(request.category_id);
    active.is_recurrent = Set(request.is_recurrent);
    active.recurrence = Set(recurrence_to_model(request.recurrence));
    active.frequency = Set(request.frequency);

    let entry = active
        .update(&txn)
        .await
        .map_err(|e| database_error("update entry", e))?;

    let now = Utc::now().naive_utc();
    let report = if entry.is_generated() {
        MaterializationReport::default()
    } else {
        recurrence::materialize(&txn, &entry, user.id, state.overflow_scope, now)
            .await
            .map_err(|e| compute_error("generate recurring entries", e))?
    };
    commit(txn, "update entry").await?;

    info!(
        "{} {} updated, {} occurrences replaced by {}",
        kind,
        entry.id,
        report.discarded,
        report.created.len()
    );
    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(
            MaterializationResponse::new(entry, report),
            format!("{} saved for {}", capitalized(kind), budget.purpose),
        )),
    ))
}

async fn delete_entry(
    state: AppState,
    user: AuthUser,
    budget_id: i32,
    entry_id: i32,
    kind: EntryKind,
) -> Result<(StatusCode, Json<ApiResponse<String>>), ApiError> {
    let txn = begin(&state).await?;
    find_owned_budget(&txn, budget_id, user.id).await?;
    let entry = find_owned_entry(&txn, user.id, budget_id, entry_id, kind).await?;

    let now = Utc::now().naive_utc();
    let discarded = recurrence::discard_occurrences(&txn, entry.id, user.id, now)
        .await
        .map_err(|e| compute_error("delete entry", e))?;
    entry
        .soft_delete(&txn, user.id, now)
        .await
        .map_err(|e| database_error("delete entry", e))?;
    commit(txn, "delete entry").await?;

    info!(
        "{} {} deleted together with {} occurrences",
        kind, entry_id, discarded
    );
    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(
            format!("{} {} deleted", capitalized(kind), entry_id),
            format!("{} deleted!", capitalized(kind)),
        )),
    ))
}

fn capitalized(kind: EntryKind) -> &'static str {
    match kind {
        EntryKind::Income => "Income",
        EntryKind::Expense => "Expense",
    }
}

/// List the entries of a budget, newest first
#[utoipa::path(
    get,
    path = "/api/v1/budgets/{budget_id}/entries",
    tag = "entries",
    security(("bearer_auth" = [])),
    params(
        ("budget_id" = i32, Path, description = "Budget ID"),
        EntriesQuery
    ),
    responses(
        (status = 200, description = "Entries retrieved successfully", body = ApiResponse<Page<EntryResponse>>),
        (status = 400, description = "Invalid paging parameters", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Budget not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn list_entries(
    user: AuthUser,
    Path(budget_id): Path<i32>,
    State(state): State<AppState>,
    Valid(Query(query)): Valid<Query<EntriesQuery>>,
) -> Result<(StatusCode, Json<ApiResponse<Page<EntryResponse>>>), ApiError> {
    trace!("Entering list_entries function for budget_id: {}", budget_id);

    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(20);
    debug!("Fetching entries - page: {}, limit: {}, kind: {:?}", page, limit, query.kind);

    let budget = find_owned_budget(&state.db, budget_id, user.id).await?;
    let paginator = ledger_entry::Entity::find_active_in_budget(budget.id, query.kind.map(kind_to_model))
        .order_by_desc(ledger_entry::Column::Date)
        .order_by_desc(ledger_entry::Column::Id)
        .paginate(&state.db, limit);

    let totals = paginator
        .num_items_and_pages()
        .await
        .map_err(|e| database_error("count entries", e))?;
    let entries = paginator
        .fetch_page(page - 1)
        .await
        .map_err(|e| database_error("retrieve entries", e))?;

    info!(
        "Retrieved {} of {} entries of budget {}",
        entries.len(),
        totals.number_of_items,
        budget.id
    );
    let data = Page {
        items: entries,
        page,
        limit,
        total_items: totals.number_of_items,
        total_pages: totals.number_of_pages,
    }
    .map(EntryResponse::from);
    Ok((StatusCode::OK, Json(ApiResponse::ok(data, "Entries retrieved successfully"))))
}

/// Register an income
#[utoipa::path(
    post,
    path = "/api/v1/budgets/{budget_id}/incomes",
    tag = "entries",
    security(("bearer_auth" = [])),
    params(("budget_id" = i32, Path, description = "Budget ID")),
    request_body = EntryRequest,
    responses(
        (status = 201, description = "Income saved, occurrences generated", body = ApiResponse<MaterializationResponse>),
        (status = 400, description = "Invalid request or date outside the budget", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Budget not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_income(
    user: AuthUser,
    Path(budget_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<EntryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<MaterializationResponse>>), ApiError> {
    trace!("Entering create_income function");
    create_entry(state, user, budget_id, EntryKind::Income, request).await
}

/// Get an income
#[utoipa::path(
    get,
    path = "/api/v1/budgets/{budget_id}/incomes/{entry_id}",
    tag = "entries",
    security(("bearer_auth" = [])),
    params(
        ("budget_id" = i32, Path, description = "Budget ID"),
        ("entry_id" = i32, Path, description = "Income ID"),
    ),
    responses(
        (status = 200, description = "Income retrieved successfully", body = ApiResponse<EntryResponse>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Budget or income not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_income(
    user: AuthUser,
    Path((budget_id, entry_id)): Path<(i32, i32)>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<EntryResponse>>), ApiError> {
    trace!("Entering get_income function");
    get_entry(state, user, budget_id, entry_id, EntryKind::Income).await
}

/// Replace an income and regenerate its occurrences
#[utoipa::path(
    put,
    path = "/api/v1/budgets/{budget_id}/incomes/{entry_id}",
    tag = "entries",
    security(("bearer_auth" = [])),
    params(
        ("budget_id" = i32, Path, description = "Budget ID"),
        ("entry_id" = i32, Path, description = "Income ID"),
    ),
    request_body = EntryRequest,
    responses(
        (status = 200, description = "Income saved, occurrences regenerated", body = ApiResponse<MaterializationResponse>),
        (status = 400, description = "Invalid request or date outside the budget", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Budget or income not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_income(
    user: AuthUser,
    Path((budget_id, entry_id)): Path<(i32, i32)>,
    State(state): State<AppState>,
    Json(request): Json<EntryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<MaterializationResponse>>), ApiError> {
    trace!("Entering update_income function");
    update_entry(state, user, budget_id, entry_id, EntryKind::Income, request).await
}

/// Delete an income and the occurrences generated from it
#[utoipa::path(
    delete,
    path = "/api/v1/budgets/{budget_id}/incomes/{entry_id}",
    tag = "entries",
    security(("bearer_auth" = [])),
    params(
        ("budget_id" = i32, Path, description = "Budget ID"),
        ("entry_id" = i32, Path, description = "Income ID"),
    ),
    responses(
        (status = 200, description = "Income deleted", body = ApiResponse<String>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Budget or income not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_income(
    user: AuthUser,
    Path((budget_id, entry_id)): Path<(i32, i32)>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<String>>), ApiError> {
    trace!("Entering delete_income function");
    delete_entry(state, user, budget_id, entry_id, EntryKind::Income).await
}

/// Register an expense
///
/// Positive amounts are stored negative.
#[utoipa::path(
    post,
    path = "/api/v1/budgets/{budget_id}/expenses",
    tag = "entries",
    security(("bearer_auth" = [])),
    params(("budget_id" = i32, Path, description = "Budget ID")),
    request_body = EntryRequest,
    responses(
        (status = 201, description = "Expense saved, occurrences generated", body = ApiResponse<MaterializationResponse>),
        (status = 400, description = "Invalid request or date outside the budget", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Budget not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_expense(
    user: AuthUser,
    Path(budget_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<EntryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<MaterializationResponse>>), ApiError> {
    trace!("Entering create_expense function");
    create_entry(state, user, budget_id, EntryKind::Expense, request).await
}

/// Get an expense
#[utoipa::path(
    get,
    path = "/api/v1/budgets/{budget_id}/expenses/{entry_id}",
    tag = "entries",
    security(("bearer_auth" = [])),
    params(
        ("budget_id" = i32, Path, description = "Budget ID"),
        ("entry_id" = i32, Path, description = "Expense ID"),
    ),
    responses(
        (status = 200, description = "Expense retrieved successfully", body = ApiResponse<EntryResponse>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Budget or expense not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_expense(
    user: AuthUser,
    Path((budget_id, entry_id)): Path<(i32, i32)>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<EntryResponse>>), ApiError> {
    trace!("Entering get_expense function");
    get_entry(state, user, budget_id, entry_id, EntryKind::Expense).await
}

/// Replace an expense and regenerate its occurrences
#[utoipa::path(
    put,
    path = "/api/v1/budgets/{budget_id}/expenses/{entry_id}",
    tag = "entries",
    security(("bearer_auth" = [])),
    params(
        ("budget_id" = i32, Path, description = "Budget ID"),
        ("entry_id" = i32, Path, description = "Expense ID"),
    ),
    request_body = EntryRequest,
    responses(
        (status = 200, description = "Expense saved, occurrences regenerated", body = ApiResponse<MaterializationResponse>),
        (status = 400, description = "Invalid request or date outside the budget", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Budget or expense not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_expense(
    user: AuthUser,
    Path((budget_id, entry_id)): Path<(i32, i32)>,
    State(state): State<AppState>,
    Json(request): Json<EntryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<MaterializationResponse>>), ApiError> {
    trace!("Entering update_expense function");
    update_entry(state, user, budget_id, entry_id, EntryKind::Expense, request).await
}

/// Delete an expense and the occurrences generated from it
#[utoipa::path(
    delete,
    path = "/api/v1/budgets/{budget_id}/expenses/{entry_id}",
    tag = "entries",
    security(("bearer_auth" = [])),
    params(
        ("budget_id" = i32, Path, description = "Budget ID"),
        ("entry_id" = i32, Path, description = "Expense ID"),
    ),
    responses(
        (status = 200, description = "Expense deleted", body = ApiResponse<String>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Budget or expense not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_expense(
    user: AuthUser,
    Path((budget_id, entry_id)): Path<(i32, i32)>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<String>>), ApiError> {
    trace!("Entering delete_expense function");
    delete_entry(state, user, budget_id, entry_id, EntryKind::Expense).await
}

/// Regenerate the occurrences of every recurring entry of a budget
#[utoipa::path(
    post,
    path = "/api/v1/budgets/{budget_id}/load-recurrences",
    tag = "entries",
    security(("bearer_auth" = [])),
    params(("budget_id" = i32, Path, description = "Budget ID")),
    responses(
        (status = 200, description = "Recurring entries reloaded", body = ApiResponse<ReloadResponse>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Budget not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn load_recurrences(
    user: AuthUser,
    Path(budget_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<ReloadResponse>>), ApiError> {
    trace!("Entering load_recurrences function for budget_id: {}", budget_id);

    let txn = begin(&state).await?;
    let budget = find_owned_budget(&txn, budget_id, user.id).await?;
    let totals = recurrence::reload_budget(
        &txn,
        budget.id,
        user.id,
        state.overflow_scope,
        Utc::now().naive_utc(),
    )
    .await
    .map_err(|e| compute_error("reload recurring entries", e))?;
    commit(txn, "reload recurring entries").await?;

    info!(
        "Reloaded {} recurring entries of budget {}",
        totals.entries, budget.id
    );
    let data = ReloadResponse {
        entries: totals.entries,
        created: totals.created,
        dropped: totals.dropped,
        discarded: totals.discarded,
    };
    Ok((StatusCode::OK, Json(ApiResponse::ok(data, "Recurring entries reloaded"))))
}
