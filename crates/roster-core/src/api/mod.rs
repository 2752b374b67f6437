//! Resource APIs - one function per REST endpoint, on top of [`ApiClient`].
//!
//! [`ApiClient`]: crate::client::ApiClient

mod auth;
mod people;

pub use auth::AuthApi;
pub use people::PeopleApi;

use roster_shared::ApiResponse;

use crate::error::ClientError;

/// Unwrap the payload of a successful envelope.
pub(crate) fn into_data<T>(response: ApiResponse<T>) -> Result<T, ClientError> {
    let response = response.normalized();
    if !response.success {
        return Err(ClientError::Rejected {
            message: response.message,
            errors: response.errors,
        });
    }
    response
        .data
        .ok_or_else(|| ClientError::Decode("response envelope has no data".to_string()))
}

/// Like [`into_data`] for endpoints whose payload is irrelevant.
pub(crate) fn ensure_success<T>(response: ApiResponse<T>) -> Result<(), ClientError> {
    let response = response.normalized();
    if response.success {
        Ok(())
    } else {
        Err(ClientError::Rejected {
            message: response.message,
            errors: response.errors,
        })
    }
}
