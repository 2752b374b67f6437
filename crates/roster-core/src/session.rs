//! Process-wide "who is signed in" state.

use std::sync::Arc;

use tokio::sync::RwLock;

use roster_shared::AuthResponse;
use roster_shared::dto::{LoginRequest, RegisterRequest};

use crate::domain::User;
use crate::error::ClientError;
use crate::ports::AuthBackend;

/// Snapshot of the session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub user: Option<User>,
    pub loading: bool,
    pub error: Option<String>,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

/// Auth session over an [`AuthBackend`]. Constructed once and shared.
pub struct AuthSession {
    backend: Arc<dyn AuthBackend>,
    state: RwLock<SessionState>,
}

impl AuthSession {
    /// Session with no resolved user yet.
    pub fn new(backend: Arc<dyn AuthBackend>) -> Self {
        Self {
            backend,
            state: RwLock::new(SessionState::default()),
        }
    }

    /// Build the session and resolve the current user once.
    pub async fn start(backend: Arc<dyn AuthBackend>) -> Self {
        let session = Self::new(backend);
        session.check_auth().await;
        session
    }

    pub async fn state(&self) -> SessionState {
        self.state.read().await.clone()
    }

    pub async fn user(&self) -> Option<User> {
        self.state.read().await.user.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.is_authenticated()
    }

    pub async fn error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }

    pub async fn login(&self, username: &str, password: &str) -> bool {
        self.begin().await;
        let result = self
            .backend
            .login(LoginRequest {
                username: username.to_string(),
                password: password.to_string(),
            })
            .await;
        self.finish(result).await
    }

    pub async fn register(&self, username: &str, email: &str, password: &str) -> bool {
        self.begin().await;
        let result = self
            .backend
            .register(RegisterRequest {
                username: username.to_string(),
                email: email.to_string(),
                password: password.to_string(),
            })
            .await;
        self.finish(result).await
    }

    /// Sign out. The user is cleared even if the server call fails.
    pub async fn logout(&self) -> Result<(), ClientError> {
        self.begin().await;
        let result = self.backend.logout().await;

        let mut state = self.state.write().await;
        state.user = None;
        state.loading = false;
        if let Err(e) = &result {
            tracing::warn!(error = %e, "Logout request failed; session cleared locally");
        }
        result
    }

    /// Re-resolve the current user. Failures mean "signed out" and are not
    /// recorded as errors.
    pub async fn check_auth(&self) {
        self.state.write().await.loading = true;

        let user = match self.backend.current_user().await {
            Ok(user) => user,
            Err(e) => {
                tracing::debug!(error = %e, "Could not resolve current user");
                None
            }
        };

        let mut state = self.state.write().await;
        state.user = user;
        state.loading = false;
    }

    async fn begin(&self) {
        let mut state = self.state.write().await;
        state.loading = true;
        state.error = None;
    }

    async fn finish(&self, result: Result<AuthResponse<User>, ClientError>) -> bool {
        let outcome = match result {
            Ok(response) => {
                let response = response.normalized();
                match (response.success, response.user.clone()) {
                    (true, Some(user)) => Ok(user),
                    _ => Err(response.error_summary()),
                }
            }
            Err(e) => Err(e.messages().join(", ")),
        };

        let mut state = self.state.write().await;
        state.loading = false;
        match outcome {
            Ok(user) => {
                tracing::info!(username = %user.username, "Signed in");
                state.user = Some(user);
                state.error = None;
                true
            }
            Err(message) => {
                tracing::info!(error = %message, "Authentication failed");
                state.user = None;
                state.error = Some(message);
                false
            }
        }
    }
}
