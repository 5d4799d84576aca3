//! Admin API client.

use reqwest::Client;
use url::Url;

use super::{ClientError, expect_success, parse_response, read_text};
use crate::objects::stats::{DashboardStats, EventStats, SystemReport};
use crate::objects::{
    AdminRegisterRequest, CreateEventRequest, EventResponse, ListUsersQuery,
    ParticipantResponse, TokenResponse, UpdateEventRequest, UserResponse,
};
use crate::token::{AUTHORIZATION_HEADER, bearer_header};

/// Typed HTTP client for the admin-only endpoints.
#[derive(Debug, Clone)]
pub struct AdminClient {
    http: Client,
    base_url: Url,
    token: String,
}

impl AdminClient {
    /// Create a client from an admin access token.
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

    /// `POST /api/auth/admin/register` – create an admin account using the
    /// server's admin secret and sign in.
    pub async fn register(
        base_url: Url,
        request: &AdminRegisterRequest,
    ) -> Result<(Self, UserResponse), ClientError> {
        let http = Client::new();
        let url = base_url.join("/api/auth/admin/register")?;
        let resp = http.post(url).json(request).send().await?;
        let token: TokenResponse = parse_response(resp).await?;
        let client = Self {
            http,
            base_url,
            token: token.access_token,
        };
        Ok((client, token.user))
    }

    fn authorization(&self) -> String {
        bearer_header(&self.token)
    }

    /// `POST /api/events`
    pub async fn create_event(
        &self,
        request: &CreateEventRequest,
    ) -> Result<EventResponse, ClientError> {
        let url = self.base_url.join("/api/events")?;
        let resp = self
            .http
            .post(url)
            .header(AUTHORIZATION_HEADER, self.authorization())
            .json(request)
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `PUT /api/events/{event_id}`
    pub async fn update_event(
        &self,
        event_id: i64,
        request: &UpdateEventRequest,
    ) -> Result<EventResponse, ClientError> {
        let url = self.base_url.join(&format!("/api/events/{event_id}"))?;
        let resp = self
            .http
            .put(url)
            .header(AUTHORIZATION_HEADER, self.authorization())
            .json(request)
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `DELETE /api/events/{event_id}` – delete an event and all of its
    /// registrations.
    pub async fn delete_event(&self, event_id: i64) -> Result<(), ClientError> {
        let url = self.base_url.join(&format!("/api/events/{event_id}"))?;
        let resp = self
            .http
            .delete(url)
            .header(AUTHORIZATION_HEADER, self.authorization())
            .send()
            .await?;
        expect_success(resp).await
    }

    /// `GET /api/events/{event_id}/participants`
    pub async fn participants(
        &self,
        event_id: i64,
    ) -> Result<Vec<ParticipantResponse>, ClientError> {
        let url = self
            .base_url
            .join(&format!("/api/events/{event_id}/participants"))?;
        let resp = self
            .http
            .get(url)
            .header(AUTHORIZATION_HEADER, self.authorization())
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `GET /api/users`
    pub async fn list_users(&self, query: &ListUsersQuery) -> Result<Vec<UserResponse>, ClientError> {
        let url = self.base_url.join("/api/users")?;
        let resp = self
            .http
            .get(url)
            .header(AUTHORIZATION_HEADER, self.authorization())
            .query(query)
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `GET /api/stats/dashboard`
    pub async fn dashboard(&self) -> Result<DashboardStats, ClientError> {
        let url = self.base_url.join("/api/stats/dashboard")?;
        let resp = self
            .http
            .get(url)
            .header(AUTHORIZATION_HEADER, self.authorization())
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `GET /api/stats/events/{event_id}/stats`
    pub async fn event_stats(&self, event_id: i64) -> Result<EventStats, ClientError> {
        let url = self
            .base_url
            .join(&format!("/api/stats/events/{event_id}/stats"))?;
        let resp = self
            .http
            .get(url)
            .header(AUTHORIZATION_HEADER, self.authorization())
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `GET /api/export/report`
    pub async fn report(&self) -> Result<SystemReport, ClientError> {
        let url = self.base_url.join("/api/export/report")?;
        let resp = self
            .http
            .get(url)
            .header(AUTHORIZATION_HEADER, self.authorization())
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `GET /api/export/events/csv` – the raw CSV document.
    pub async fn export_events_csv(&self) -> Result<String, ClientError> {
        let url = self.base_url.join("/api/export/events/csv")?;
        let resp = self
            .http
            .get(url)
            .header(AUTHORIZATION_HEADER, self.authorization())
            .send()
            .await?;
        read_text(resp).await
    }

    /// `GET /api/export/events/{event_id}/participants/csv`
    pub async fn export_participants_csv(&self, event_id: i64) -> Result<String, ClientError> {
        let url = self
            .base_url
            .join(&format!("/api/export/events/{event_id}/participants/csv"))?;
        let resp = self
            .http
            .get(url)
            .header(AUTHORIZATION_HEADER, self.authorization())
            .send()
            .await?;
        read_text(resp).await
    }

    /// `GET /api/export/users/csv`
    pub async fn export_users_csv(&self) -> Result<String, ClientError> {
        let url = self.base_url.join("/api/export/users/csv")?;
        let resp = self
            .http
            .get(url)
            .header(AUTHORIZATION_HEADER, self.authorization())
            .send()
            .await?;
        read_text(resp).await
    }
}
