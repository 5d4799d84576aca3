//! Error responses shared by every API handler.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use clubs_core::export::ExportError;
use clubs_core::{ClubError, ErrorKind, StoreError};
use clubs_sdk::objects::ApiErrorBody;

/// Errors that can occur in API handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Club(#[from] ClubError),
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("export failed: {0}")]
    Export(#[from] ExportError),
}

impl ApiError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        ApiError::Club(ClubError::Validation(message.into()))
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Club(err.into())
    }
}

fn status_of(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::InvalidState => StatusCode::BAD_REQUEST,
        ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Club(e) => {
                let kind = e.kind();
                let status = status_of(kind);
                let message = if kind == ErrorKind::Internal {
                    tracing::error!(error = %e, "API internal error");
                    "internal server error".to_string()
                } else {
                    e.to_string()
                };
                (
                    status,
                    ApiErrorBody {
                        error: kind.as_str().to_string(),
                        reason: e.reason().map(str::to_string),
                        message,
                    },
                )
            }
            ApiError::Unauthorized(message) => (
                StatusCode::UNAUTHORIZED,
                ApiErrorBody {
                    error: "unauthorized".to_string(),
                    reason: None,
                    message: message.to_string(),
                },
            ),
            ApiError::Forbidden(message) => (
                StatusCode::FORBIDDEN,
                ApiErrorBody {
                    error: "forbidden".to_string(),
                    reason: None,
                    message: message.to_string(),
                },
            ),
            ApiError::Export(e) => {
                tracing::error!(error = %e, "API export error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorBody {
                        error: ErrorKind::Internal.as_str().to_string(),
                        reason: None,
                        message: "internal server error".to_string(),
                    },
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clubs_core::{ConflictReason, Resource};

    async fn body_of(response: Response) -> ApiErrorBody {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_full_event_maps_to_conflict() {
        let response = ApiError::from(ClubError::Conflict(ConflictReason::Full)).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = body_of(response).await;
        assert_eq!(body.error, "conflict");
        assert_eq!(body.reason.as_deref(), Some("full"));
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let cases = [
            (ClubError::NotFound(Resource::Event), StatusCode::NOT_FOUND),
            (ClubError::Finished, StatusCode::BAD_REQUEST),
            (
                ClubError::Validation("title must not be blank".to_string()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(ApiError::from(error).into_response().status(), status);
        }
        assert_eq!(
            ApiError::Unauthorized("missing bearer token")
                .into_response()
                .status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Forbidden("admin access required")
                .into_response()
                .status(),
            StatusCode::FORBIDDEN
        );
    }
}
