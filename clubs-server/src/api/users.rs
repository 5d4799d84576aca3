//! Account profiles.
//!
//! # Endpoints
//!
//! - `GET /me` – the caller's profile
//! - `PUT /me` – update name or group
//! - `GET /`   – list accounts (admin)

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use clubs_core::directory::ProfilePatch;
use clubs_sdk::objects::{ListUsersQuery, UpdateProfileRequest, UserResponse};

use crate::api::error::ApiError;
use crate::api::extractors::{AdminUser, AuthUser};
use crate::api::user_to_response;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(me).put(update_me))
        .route("/", get(list_users))
}

/// `GET /me`
async fn me(AuthUser(user): AuthUser) -> Json<UserResponse> {
    Json(user_to_response(&user))
}

/// `PUT /me`
async fn update_me(
    state: State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let updated = state
        .directory()
        .update_profile(
            user.id,
            ProfilePatch {
                full_name: payload.full_name,
                group: payload.group,
            },
        )
        .await?;
    Ok(Json(user_to_response(&updated)))
}

/// `GET /?skip=&limit=`
async fn list_users(
    state: State<AppState>,
    _admin: AdminUser,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state.directory().list(query.skip, query.limit).await?;
    Ok(Json(users.iter().map(user_to_response).collect()))
}
