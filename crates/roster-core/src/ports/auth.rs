//! Authentication backend port.

use async_trait::async_trait;

use roster_shared::AuthResponse;
use roster_shared::dto::{LoginRequest, RegisterRequest};

use crate::domain::User;
use crate::error::ClientError;

/// What the auth session needs from the server.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn login(&self, request: LoginRequest) -> Result<AuthResponse<User>, ClientError>;

    async fn register(&self, request: RegisterRequest) -> Result<AuthResponse<User>, ClientError>;

    async fn logout(&self) -> Result<(), ClientError>;

    /// The user behind the stored session, if any.
    async fn current_user(&self) -> Result<Option<User>, ClientError>;
}
