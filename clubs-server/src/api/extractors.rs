//! Custom Axum extractors for request authentication.
//!
//! Provides:
//! - `AuthUser` resolves the bearer token in the `Authorization` header to
//!   the account that owns it.
//! - `AdminUser` does the same and additionally requires the admin role.
//!
//! Token cryptography is delegated to [`clubs_sdk::token`].

use axum::{extract::FromRequestParts, http::request::Parts};
use clubs_core::entities::UserRole;
use clubs_core::entities::users::User;
use clubs_core::{ClubError, Resource};
use clubs_sdk::token::{AUTHORIZATION_HEADER, strip_bearer};

use crate::api::error::ApiError;
use crate::state::AppState;

/// The account behind a valid bearer token.
///
/// The user is loaded on every request, so deleted accounts lose access
/// immediately and role changes apply to live tokens.
pub struct AuthUser(pub User);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(AUTHORIZATION_HEADER)
            .ok_or(ApiError::Unauthorized("missing bearer token"))?
            .to_str()
            .map_err(|_| ApiError::Unauthorized("invalid authorization header"))?;
        let token = strip_bearer(header_value)
            .map_err(|_| ApiError::Unauthorized("invalid authorization header"))?;

        let auth = state.config.auth().await;
        let claims = auth.verify(token).map_err(|e| {
            tracing::debug!(error = %e, "Rejected bearer token");
            ApiError::Unauthorized("could not validate credentials")
        })?;
        drop(auth);

        match state.directory().get_by_id(claims.user_id).await {
            Ok(user) => Ok(AuthUser(user)),
            Err(ClubError::NotFound(Resource::User)) => {
                Err(ApiError::Unauthorized("could not validate credentials"))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// An authenticated account with the admin role.
pub struct AdminUser(pub User);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if user.role != UserRole::Admin {
            return Err(ApiError::Forbidden("admin access required"));
        }
        Ok(AdminUser(user))
    }
}
