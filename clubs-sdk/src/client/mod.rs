//! HTTP clients for the club activities API.
//!
//! Gated behind the `client` cargo feature so downstream crates that only
//! need the shared types do not pull in `reqwest`.

mod admin;
mod student;

pub use admin::AdminClient;
pub use student::StudentClient;

use reqwest::StatusCode;

use crate::objects::ApiErrorBody;
use crate::token::TokenError;

/// Errors produced by the SDK HTTP clients.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure (DNS, TLS, connection reset, …).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// A session token could not be parsed.
    #[error("token error: {0}")]
    Token(#[from] TokenError),

    /// The server returned a non-2xx status code.
    ///
    /// `error` holds the decoded JSON error body when the server sent one.
    #[error("api error: status {status}, body: {body}")]
    Api {
        status: StatusCode,
        body: String,
        error: Option<ApiErrorBody>,
    },

    /// Response body could not be deserialized.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The base URL could not be joined with the endpoint path.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

impl ClientError {
    /// The stable error kind reported by the server, if any.
    pub fn kind(&self) -> Option<&str> {
        match self {
            ClientError::Api {
                error: Some(body), ..
            } => Some(body.error.as_str()),
            _ => None,
        }
    }

    /// The conflict/invalid-state reason reported by the server, if any.
    pub fn reason(&self) -> Option<&str> {
        match self {
            ClientError::Api {
                error: Some(body), ..
            } => body.reason.as_deref(),
            _ => None,
        }
    }
}

async fn api_error(resp: reqwest::Response) -> ClientError {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    let error = serde_json::from_str::<ApiErrorBody>(&body).ok();
    ClientError::Api {
        status,
        body,
        error,
    }
}

async fn parse_response<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, ClientError> {
    if !resp.status().is_success() {
        return Err(api_error(resp).await);
    }
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(ClientError::Json)
}

async fn expect_success(resp: reqwest::Response) -> Result<(), ClientError> {
    if !resp.status().is_success() {
        return Err(api_error(resp).await);
    }
    Ok(())
}

async fn read_text(resp: reqwest::Response) -> Result<String, ClientError> {
    if !resp.status().is_success() {
        return Err(api_error(resp).await);
    }
    Ok(resp.text().await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_accessors() {
        let err = ClientError::Api {
            status: StatusCode::CONFLICT,
            body: String::new(),
            error: Some(ApiErrorBody {
                error: "conflict".to_string(),
                reason: Some("full".to_string()),
                message: "event is full".to_string(),
            }),
        };
        assert_eq!(err.kind(), Some("conflict"));
        assert_eq!(err.reason(), Some("full"));

        let err = ClientError::Token(TokenError::Expired);
        assert_eq!(err.kind(), None);
        assert_eq!(err.reason(), None);
    }
}
