//! Student-facing API client.
//!
//! Every request after login carries the bearer token returned by
//! `/api/auth/login` or `/api/auth/register`.

use reqwest::Client;
use url::Url;

use super::{ClientError, expect_success, parse_response};
use crate::objects::search::{SearchEventsQuery, SearchResponse, SuggestionsResponse};
use crate::objects::stats::{Leaderboard, MyStats};
use crate::objects::{
    EventListResponse, EventResponse, ListEventsQuery, LoginRequest, RegisterRequest,
    RegistrationResponse, TokenResponse, UpdateProfileRequest, UserResponse,
};
use crate::token::{AUTHORIZATION_HEADER, SessionToken, bearer_header};

/// Typed HTTP client for the endpoints available to any signed-in user.
#[derive(Debug, Clone)]
pub struct StudentClient {
    http: Client,
    base_url: Url,
    token: String,
}

impl StudentClient {
    /// Create a client from an already issued access token.
    pub fn new(base_url: Url, token: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url,
            token: token.into(),
        }
    }

    /// Replace the default `reqwest::Client` with a custom one.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// `POST /api/auth/login` – exchange credentials for a client.
    pub async fn login(
        base_url: Url,
        request: &LoginRequest,
    ) -> Result<(Self, UserResponse), ClientError> {
        let http = Client::new();
        let url = base_url.join("/api/auth/login")?;
        let resp = http.post(url).json(request).send().await?;
        let token: TokenResponse = parse_response(resp).await?;
        let client = Self {
            http,
            base_url,
            token: token.access_token,
        };
        Ok((client, token.user))
    }

    /// `POST /api/auth/register` – create a student account and sign in.
    pub async fn register(
        base_url: Url,
        request: &RegisterRequest,
    ) -> Result<(Self, UserResponse), ClientError> {
        let http = Client::new();
        let url = base_url.join("/api/auth/register")?;
        let resp = http.post(url).json(request).send().await?;
        let token: TokenResponse = parse_response(resp).await?;
        let client = Self {
            http,
            base_url,
            token: token.access_token,
        };
        Ok((client, token.user))
    }

    /// The raw access token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Decode the (unverified) claims of the access token.
    pub fn session(&self) -> Result<SessionToken, ClientError> {
        let (claims, _) = SessionToken::parse(&self.token)?;
        Ok(claims)
    }

    fn authorization(&self) -> String {
        bearer_header(&self.token)
    }

    /// `GET /api/users/me`
    pub async fn me(&self) -> Result<UserResponse, ClientError> {
        let url = self.base_url.join("/api/users/me")?;
        let resp = self
            .http
            .get(url)
            .header(AUTHORIZATION_HEADER, self.authorization())
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `PUT /api/users/me`
    pub async fn update_profile(
        &self,
        request: &UpdateProfileRequest,
    ) -> Result<UserResponse, ClientError> {
        let url = self.base_url.join("/api/users/me")?;
        let resp = self
            .http
            .put(url)
            .header(AUTHORIZATION_HEADER, self.authorization())
            .json(request)
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `GET /api/events` – one page of events.
    pub async fn list_events(
        &self,
        query: &ListEventsQuery,
    ) -> Result<EventListResponse, ClientError> {
        let url = self.base_url.join("/api/events")?;
        let resp = self
            .http
            .get(url)
            .header(AUTHORIZATION_HEADER, self.authorization())
            .query(query)
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `GET /api/events/{event_id}`
    pub async fn get_event(&self, event_id: i64) -> Result<EventResponse, ClientError> {
        let url = self.base_url.join(&format!("/api/events/{event_id}"))?;
        let resp = self
            .http
            .get(url)
            .header(AUTHORIZATION_HEADER, self.authorization())
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `POST /api/registrations/{event_id}` – attempt to take a spot.
    ///
    /// A full event is reported as an [`ClientError::Api`] with kind
    /// `conflict` and reason `full`.
    pub async fn register_for_event(
        &self,
        event_id: i64,
    ) -> Result<RegistrationResponse, ClientError> {
        let url = self
            .base_url
            .join(&format!("/api/registrations/{event_id}"))?;
        let resp = self
            .http
            .post(url)
            .header(AUTHORIZATION_HEADER, self.authorization())
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `DELETE /api/registrations/{event_id}` – give the spot back.
    pub async fn cancel_registration(&self, event_id: i64) -> Result<(), ClientError> {
        let url = self
            .base_url
            .join(&format!("/api/registrations/{event_id}"))?;
        let resp = self
            .http
            .delete(url)
            .header(AUTHORIZATION_HEADER, self.authorization())
            .send()
            .await?;
        expect_success(resp).await
    }

    /// `GET /api/registrations/my`
    pub async fn my_registrations(&self) -> Result<Vec<RegistrationResponse>, ClientError> {
        let url = self.base_url.join("/api/registrations/my")?;
        let resp = self
            .http
            .get(url)
            .header(AUTHORIZATION_HEADER, self.authorization())
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `GET /api/search/events`
    pub async fn search_events(
        &self,
        query: &SearchEventsQuery,
    ) -> Result<SearchResponse, ClientError> {
        let url = self.base_url.join("/api/search/events")?;
        let resp = self
            .http
            .get(url)
            .header(AUTHORIZATION_HEADER, self.authorization())
            .query(query)
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `GET /api/search/suggestions`
    pub async fn suggestions(&self) -> Result<SuggestionsResponse, ClientError> {
        let url = self.base_url.join("/api/search/suggestions")?;
        let resp = self
            .http
            .get(url)
            .header(AUTHORIZATION_HEADER, self.authorization())
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `GET /api/stats/my-stats`
    pub async fn my_stats(&self) -> Result<MyStats, ClientError> {
        let url = self.base_url.join("/api/stats/my-stats")?;
        let resp = self
            .http
            .get(url)
            .header(AUTHORIZATION_HEADER, self.authorization())
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `GET /api/stats/leaderboard`
    pub async fn leaderboard(&self) -> Result<Leaderboard, ClientError> {
        let url = self.base_url.join("/api/stats/leaderboard")?;
        let resp = self
            .http
            .get(url)
            .header(AUTHORIZATION_HEADER, self.authorization())
            .send()
            .await?;
        parse_response(resp).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_claims() {
        let token = SessionToken {
            user_id: 12,
            expires_at: 2_000_000_000,
        }
        .sign(b"client-side-does-not-verify");
        let client = StudentClient::new(Url::parse("http://localhost:8080").unwrap(), token);
        let claims = client.session().unwrap();
        assert_eq!(claims.user_id, 12);
        assert_eq!(claims.expires_at, 2_000_000_000);
        assert!(client.authorization().starts_with("Bearer 12."));
    }
}
