use axum::{extract::State, http::StatusCode, response::Json};
use chrono::Utc;
use model::entities::user;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, SqlErr};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::auth::{hash_password, verify_password, AuthError, AuthUser, IssuedToken};
use crate::schemas::{api_error, database_error, validation_error, ApiError, ApiResponse, AppState};

fn not_entirely_numeric(password: &str) -> Result<(), ValidationError> {
    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        let mut error = ValidationError::new("entirely_numeric");
        error.message = Some("This password is entirely numeric".into());
        return Err(error);
    }
    Ok(())
}

/// Request body for registering a new user
#[derive(Deserialize, Serialize, ToSchema, Validate)]
pub struct RegisterRequest {
    /// Username (must be unique)
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[validate(length(min = 1, max = 254))]
    pub first_name: String,
    #[validate(length(min = 1, max = 254))]
    pub last_name: String,
    #[validate(email, length(max = 254))]
    pub email: String,
    /// At least 8 characters, not entirely numeric
    #[validate(length(min = 8), custom(function = "not_entirely_numeric"))]
    pub password: String,
    /// Must repeat `password`
    #[validate(must_match(other = "password"))]
    pub password_confirmation: String,
}

// Passwords stay out of the logs
impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Request body for logging in
#[derive(Deserialize, Serialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// User response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            first_name: model.first_name,
            last_name: model.last_name,
            email: model.email,
        }
    }
}

/// Bearer token handed out on registration and login
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    /// Seconds until the token expires
    pub expires_in: i64,
    pub user: UserResponse,
}

impl TokenResponse {
    fn new(issued: IssuedToken, user: user::Model) -> Self {
        Self {
            access_token: issued.token,
            token_type: "Bearer".to_string(),
            expires_in: issued.expires_in,
            user: UserResponse::from(user),
        }
    }
}

fn username_taken(username: &str) -> ApiError {
    warn!("Username '{}' already exists", username);
    api_error(
        StatusCode::CONFLICT,
        "USERNAME_ALREADY_EXISTS",
        format!("Username '{}' already exists", username),
    )
}

/// Register a new user and log them in
#[utoipa::path(
    post,
    path = "/api/v1/register",
    tag = "users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered and logged in", body = ApiResponse<TokenResponse>),
        (status = 400, description = "Invalid registration data", body = ErrorResponse),
        (status = 409, description = "Username already exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TokenResponse>>), ApiError> {
    trace!("Entering register function");
    debug!("Registering user with username: {}", request.username);
    request.validate().map_err(validation_error)?;

    let existing = user::Entity::find()
        .filter(user::Column::Username.eq(request.username.as_str()))
        .one(&state.db)
        .await
        .map_err(|e| database_error("check username", e))?;
    if existing.is_some() {
        return Err(username_taken(&request.username));
    }

    let password_hash = hash_password(&request.password).map_err(AuthError::into_api_error)?;
    let created = match (user::ActiveModel {
        username: Set(request.username.clone()),
        first_name: Set(request.first_name),
        last_name: Set(request.last_name),
        email: Set(request.email),
        password_hash: Set(password_hash),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    })
    .insert(&state.db)
    .await
    {
        Ok(created) => created,
        // Lost a race against a concurrent registration
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            return Err(username_taken(&request.username));
        }
        Err(e) => return Err(database_error("create user", e)),
    };

    let issued = state.auth.issue(created.id).map_err(AuthError::into_api_error)?;
    info!(
        "User created successfully with ID: {}, username: {}",
        created.id, created.username
    );
    let message = format!("Account created for {}!", created.first_name);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(TokenResponse::new(issued, created), message)),
    ))
}

/// Log in with username and password
#[utoipa::path(
    post,
    path = "/api/v1/login",
    tag = "users",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = ApiResponse<TokenResponse>),
        (status = 401, description = "Invalid username or password", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TokenResponse>>), ApiError> {
    trace!("Entering login function");

    let found = user::Entity::find()
        .filter(user::Column::Username.eq(request.username.as_str()))
        .one(&state.db)
        .await
        .map_err(|e| database_error("retrieve user", e))?;
    let Some(found) = found else {
        warn!("Login attempt for unknown user '{}'", request.username);
        return Err(AuthError::InvalidCredentials.into_api_error());
    };

    if let Err(e) = verify_password(&request.password, &found.password_hash) {
        warn!("Error logging in as {}: {}", request.username, e);
        return Err(e.into_api_error());
    }

    let issued = state.auth.issue(found.id).map_err(AuthError::into_api_error)?;
    info!("User {} logged in", found.id);
    let message = format!("Welcome {}!", found.first_name);
    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(TokenResponse::new(issued, found), message)),
    ))
}

/// Log out
///
/// Tokens are stateless; the client discards its token.
#[utoipa::path(
    post,
    path = "/api/v1/logout",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Logged out", body = ApiResponse<String>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn logout(user: AuthUser) -> (StatusCode, Json<ApiResponse<String>>) {
    trace!("Entering logout function");
    info!("User {} logged out", user.id);
    (
        StatusCode::OK,
        Json(ApiResponse::ok(
            user.username,
            "You have been logged out.",
        )),
    )
}

/// Profile of the authenticated user
#[utoipa::path(
    get,
    path = "/api/v1/me",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User retrieved successfully", body = ApiResponse<UserResponse>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn me(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), ApiError> {
    trace!("Entering me function");

    match user::Entity::find_by_id(user.id).one(&state.db).await {
        Ok(Some(model)) => {
            info!("Retrieved profile of user {}", model.id);
            Ok((
                StatusCode::OK,
                Json(ApiResponse::ok(
                    UserResponse::from(model),
                    "User retrieved successfully",
                )),
            ))
        }
        Ok(None) => {
            warn!("User {} disappeared after authentication", user.id);
            Err(AuthError::Unauthorized.into_api_error())
        }
        Err(e) => Err(database_error("retrieve user", e)),
    }
}
