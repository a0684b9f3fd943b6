use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use model::entities::category;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::AuthUser;
use crate::helpers::validation::money_amount;
use crate::schemas::{database_error, not_found, validation_error, ApiError, ApiResponse, AppState};

/// Request structure for creating a new category
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateCategoryRequest {
    /// The label shown next to entries
    #[validate(length(min = 1, max = 100))]
    pub label: String,
    /// Amount planned for this category
    #[serde(default)]
    #[validate(custom(function = "money_amount"))]
    pub budgeted_amount: Decimal,
}

/// Request structure for updating an existing category
#[derive(Debug, Default, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 100))]
    pub label: Option<String>,
    #[validate(custom(function = "money_amount"))]
    pub budgeted_amount: Option<Decimal>,
}

/// Response structure for category operations
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponse {
    pub id: i32,
    pub label: String,
    pub budgeted_amount: Decimal,
}

impl From<category::Model> for CategoryResponse {
    fn from(model: category::Model) -> Self {
        Self {
            id: model.id,
            label: model.label,
            budgeted_amount: model.budgeted_amount,
        }
    }
}

async fn find_owned_category(
    state: &AppState,
    category_id: i32,
    owner_id: i32,
) -> Result<category::Model, ApiError> {
    match category::Entity::find_by_id(category_id)
        .filter(category::Column::OwnerId.eq(owner_id))
        .one(&state.db)
        .await
    {
        Ok(Some(category)) => Ok(category),
        Ok(None) => {
            warn!("Category {} not found for user {}", category_id, owner_id);
            Err(not_found("Category", category_id))
        }
        Err(e) => Err(database_error("retrieve category", e)),
    }
}

/// List the categories of the authenticated user
#[utoipa::path(
    get,
    path = "/api/v1/categories",
    tag = "categories",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Categories retrieved successfully", body = ApiResponse<Vec<CategoryResponse>>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn list_categories(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<CategoryResponse>>>), ApiError> {
    trace!("Entering list_categories function");

    let categories = category::Entity::find_owned(user.id)
        .all(&state.db)
        .await
        .map_err(|e| database_error("retrieve categories", e))?;

    info!("Retrieved {} categories", categories.len());
    let data = categories.into_iter().map(CategoryResponse::from).collect();
    Ok((StatusCode::OK, Json(ApiResponse::ok(data, "Categories retrieved successfully"))))
}

/// Create a new category
#[utoipa::path(
    post,
    path = "/api/v1/categories",
    tag = "categories",
    security(("bearer_auth" = [])),
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created successfully", body = ApiResponse<CategoryResponse>),
        (status = 400, description = "Invalid request data", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_category(
    user: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CategoryResponse>>), ApiError> {
    trace!("Entering create_category function");
    debug!("Creating category with label: {}", request.label);
    request.validate().map_err(validation_error)?;

    let created = category::ActiveModel {
        owner_id: Set(user.id),
        label: Set(request.label),
        budgeted_amount: Set(request.budgeted_amount),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| database_error("create category", e))?;

    info!("Category created successfully with ID: {}", created.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            CategoryResponse::from(created),
            "Category created successfully",
        )),
    ))
}

/// Get a category by ID
#[utoipa::path(
    get,
    path = "/api/v1/categories/{category_id}",
    tag = "categories",
    security(("bearer_auth" = [])),
    params(
        ("category_id" = i32, Path, description = "Category ID"),
    ),
    responses(
        (status = 200, description = "Category retrieved successfully", body = ApiResponse<CategoryResponse>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_category(
    user: AuthUser,
    Path(category_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<CategoryResponse>>), ApiError> {
    trace!("Entering get_category function for category_id: {}", category_id);

    let category = find_owned_category(&state, category_id, user.id).await?;
    info!("Retrieved category {}", category.id);
    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(
            CategoryResponse::from(category),
            "Category retrieved successfully",
        )),
    ))
}

/// Update a category
#[utoipa::path(
    put,
    path = "/api/v1/categories/{category_id}",
    tag = "categories",
    security(("bearer_auth" = [])),
    params(
        ("category_id" = i32, Path, description = "Category ID"),
    ),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Category updated successfully", body = ApiResponse<CategoryResponse>),
        (status = 400, description = "Invalid request data", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_category(
    user: AuthUser,
    Path(category_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdateCategoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CategoryResponse>>), ApiError> {
    trace!("Entering update_category function for category_id: {}", category_id);
    request.validate().map_err(validation_error)?;

    let existing = find_owned_category(&state, category_id, user.id).await?;
    let mut active: category::ActiveModel = existing.into();
    if let Some(label) = request.label {
        debug!("Updating label to: {}", label);
        active.label = Set(label);
    }
    if let Some(amount) = request.budgeted_amount {
        active.budgeted_amount = Set(amount);
    }

    let updated = active
        .update(&state.db)
        .await
        .map_err(|e| database_error("update category", e))?;

    info!("Category {} updated successfully", updated.id);
    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(
            CategoryResponse::from(updated),
            "Category updated successfully",
        )),
    ))
}

/// Delete a category
///
/// Entries keep existing and lose their category.
#[utoipa::path(
    delete,
    path = "/api/v1/categories/{category_id}",
    tag = "categories",
    security(("bearer_auth" = [])),
    params(
        ("category_id" = i32, Path, description = "Category ID"),
    ),
    responses(
        (status = 200, description = "Category deleted successfully", body = ApiResponse<String>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_category(
    user: AuthUser,
    Path(category_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<String>>), ApiError> {
    trace!("Entering delete_category function for category_id: {}", category_id);

    let category = find_owned_category(&state, category_id, user.id).await?;
    let result = category
        .delete(&state.db)
        .await
        .map_err(|e| database_error("delete category", e))?;
    debug!("Delete operation completed. Rows affected: {}", result.rows_affected);

    info!("Category {} deleted successfully", category_id);
    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(
            format!("Category {} deleted", category_id),
            "Category deleted successfully",
        )),
    ))
}
