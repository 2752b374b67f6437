//! Authentication endpoints.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use roster_shared::AuthResponse;
use roster_shared::dto::{HealthResponse, LoginRequest, RegisterRequest};

use crate::client::{ApiClient, RequestOptions, TOKEN_KEY};
use crate::domain::User;
use crate::error::ClientError;
use crate::ports::{AuthBackend, HttpMethod, RequestBody};

const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct AuthApi {
    client: ApiClient,
}

impl AuthApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// POST /auth/register
    #[tracing::instrument(skip(self, request), fields(username = %request.username))]
    pub async fn register(
        &self,
        request: RegisterRequest,
    ) -> Result<AuthResponse<User>, ClientError> {
        let response: AuthResponse<User> = self.client.post("/auth/register", &request).await?;
        self.remember_token(response.normalized()).await
    }

    /// POST /auth/login
    #[tracing::instrument(skip(self, request), fields(username = %request.username))]
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse<User>, ClientError> {
        let response: AuthResponse<User> = self.client.post("/auth/login", &request).await?;
        self.remember_token(response.normalized()).await
    }

    /// POST /auth/logout
    ///
    /// The stored token is removed whatever the server answers.
    #[tracing::instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), ClientError> {
        let result = self
            .client
            .post::<serde_json::Value, _>("/auth/logout", &json!({}))
            .await;

        if let Err(e) = self.client.store().delete(TOKEN_KEY).await {
            tracing::warn!(error = %e, "Failed to remove stored token");
        }

        result.map(|_| ())
    }

    /// GET /auth/me
    ///
    /// `Ok(None)` when there is no valid session.
    #[tracing::instrument(skip(self))]
    pub async fn me(&self) -> Result<Option<User>, ClientError> {
        if !self.client.store().exists(TOKEN_KEY).await {
            return Ok(None);
        }

        match self.client.get::<AuthResponse<User>>("/auth/me", &[]).await {
            Ok(response) => Ok(response.normalized().user),
            Err(ClientError::Http(e)) if e.status == 401 || e.status == 403 => {
                tracing::debug!(status = e.status, "Session is no longer valid");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// GET /health
    ///
    /// Single attempt with a short timeout. Accepts a bare body or an envelope.
    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        let options = RequestOptions::default()
            .with_retries(0)
            .with_timeout(HEALTH_TIMEOUT);
        let body: serde_json::Value = self
            .client
            .request(HttpMethod::Get, "/health", &[], RequestBody::Empty, options)
            .await?;

        let payload = match body.get("data") {
            Some(data) if data.is_object() => data.clone(),
            _ => body,
        };
        serde_json::from_value(payload).map_err(|e| ClientError::Decode(e.to_string()))
    }

    async fn remember_token(
        &self,
        response: AuthResponse<User>,
    ) -> Result<AuthResponse<User>, ClientError> {
        if let (true, Some(token)) = (response.success, response.token.as_deref()) {
            self.client.store().set(TOKEN_KEY, token, None).await?;
            tracing::info!("Session token stored");
        }
        Ok(response)
    }
}

#[async_trait]
impl AuthBackend for AuthApi {
    async fn login(&self, request: LoginRequest) -> Result<AuthResponse<User>, ClientError> {
        AuthApi::login(self, request).await
    }

    async fn register(&self, request: RegisterRequest) -> Result<AuthResponse<User>, ClientError> {
        AuthApi::register(self, request).await
    }

    async fn logout(&self) -> Result<(), ClientError> {
        AuthApi::logout(self).await
    }

    async fn current_user(&self) -> Result<Option<User>, ClientError> {
        self.me().await
    }
}
