//! Account creation and login.
//!
//! # Endpoints
//!
//! - `POST /register`       – create a student account
//! - `POST /admin/register` – create an admin account (needs the admin key)
//! - `POST /login`          – exchange credentials for a bearer token

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post};
use clubs_core::credentials::verify_secret_blocking;
use clubs_core::directory::NewUser;
use clubs_core::entities::UserRole;
use clubs_core::entities::users::User;
use clubs_sdk::objects::{AdminRegisterRequest, LoginRequest, RegisterRequest, TokenResponse};
use clubs_sdk::token::TOKEN_TYPE;

use crate::api::error::ApiError;
use crate::api::user_to_response;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/admin/register", post(admin_register))
        .route("/login", post(login))
}

async fn token_response(state: &AppState, user: &User) -> TokenResponse {
    let access_token = state.config.auth().await.issue(user.id);
    TokenResponse {
        access_token,
        token_type: TOKEN_TYPE.to_string(),
        user: user_to_response(user),
    }
}

/// `POST /register`
async fn register(
    state: State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .directory()
        .create(
            NewUser {
                email: payload.email,
                password: payload.password,
                full_name: payload.full_name,
                group: payload.group,
            },
            UserRole::Student,
        )
        .await?;
    tracing::info!(user_id = user.id, "Student account created");
    Ok((StatusCode::CREATED, Json(token_response(&state, &user).await)))
}

/// `POST /admin/register`
///
/// The plaintext `secret_key` is checked against the argon2 hash of the
/// configured admin key.
async fn admin_register(
    state: State<AppState>,
    Json(payload): Json<AdminRegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let secret_hash = state.config.admin().await.secret_hash.clone();
    let authorized = verify_secret_blocking(payload.secret_key, secret_hash).await;
    if !authorized {
        tracing::warn!("Admin registration with an invalid secret key");
        return Err(ApiError::Forbidden("invalid admin secret key"));
    }

    let user = state
        .directory()
        .create(
            NewUser {
                email: payload.email,
                password: payload.password,
                full_name: payload.full_name,
                group: None,
            },
            UserRole::Admin,
        )
        .await?;
    tracing::info!(user_id = user.id, "Admin account created");
    Ok((StatusCode::CREATED, Json(token_response(&state, &user).await)))
}

/// `POST /login`
async fn login(
    state: State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = state
        .directory()
        .authenticate(&payload.email, &payload.password)
        .await?
        .ok_or(ApiError::Unauthorized("incorrect email or password"))?;
    Ok(Json(token_response(&state, &user).await))
}
