//! The uniform response envelope returned by every API call.

use serde::{Deserialize, Serialize};

/// Fallback text when a failed envelope carries neither errors nor a message.
pub const GENERIC_FAILURE: &str = "Request failed";

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Standard API response wrapper: `{success, data?, message?, errors?, timestamp}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    #[serde(default = "now_rfc3339")]
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: Vec::new(),
            timestamp: now_rfc3339(),
        }
    }

    pub fn ok_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::ok(data)
        }
    }

    /// Failed envelope. Always carries at least one error string.
    pub fn fail(message: impl Into<String>, errors: Vec<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
            errors,
            timestamp: now_rfc3339(),
        }
        .normalized()
    }

    /// Enforces the envelope invariant on a value received from the wire:
    /// a failed envelope has no payload and a non-empty error list.
    pub fn normalized(mut self) -> Self {
        if !self.success {
            self.data = None;
            if self.errors.is_empty() {
                let fallback = self
                    .message
                    .clone()
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| GENERIC_FAILURE.to_string());
                self.errors.push(fallback);
            }
        }
        self
    }

    /// Human-readable reason for a failed envelope.
    ///
    /// Prefers the joined field-level errors, then the message.
    pub fn error_summary(&self) -> String {
        summarize(&self.errors, self.message.as_deref())
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        ApiResponse {
            success: self.success,
            data: self.data.map(f),
            message: self.message,
            errors: self.errors,
            timestamp: self.timestamp,
        }
    }
}

/// Envelope returned by the `/auth/*` endpoints: the usual fields plus
/// the signed-in principal and a bearer token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse<U> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<U>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    #[serde(default = "now_rfc3339")]
    pub timestamp: String,
}

impl<U> AuthResponse<U> {
    pub fn signed_in(user: U, token: impl Into<String>) -> Self {
        Self {
            success: true,
            user: Some(user),
            token: Some(token.into()),
            message: None,
            errors: Vec::new(),
            timestamp: now_rfc3339(),
        }
    }

    pub fn fail(message: impl Into<String>, errors: Vec<String>) -> Self {
        Self {
            success: false,
            user: None,
            token: None,
            message: Some(message.into()),
            errors,
            timestamp: now_rfc3339(),
        }
        .normalized()
    }

    pub fn normalized(mut self) -> Self {
        if !self.success {
            self.user = None;
            self.token = None;
            if self.errors.is_empty() {
                let fallback = self
                    .message
                    .clone()
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| GENERIC_FAILURE.to_string());
                self.errors.push(fallback);
            }
        }
        self
    }

    pub fn error_summary(&self) -> String {
        summarize(&self.errors, self.message.as_deref())
    }
}

fn summarize(errors: &[String], message: Option<&str>) -> String {
    if !errors.is_empty() {
        return errors.join(", ");
    }
    match message {
        Some(m) if !m.trim().is_empty() => m.to_string(),
        _ => GENERIC_FAILURE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fail_always_has_an_error() {
        let resp: ApiResponse<()> = ApiResponse::fail("Person not found", vec![]);
        assert!(!resp.success);
        assert_eq!(resp.errors, vec!["Person not found".to_string()]);
    }

    #[test]
    fn test_normalized_drops_payload_of_failed_envelope() {
        let raw = r#"{"success":false,"data":{"id":"1"},"timestamp":"2024-01-01T00:00:00Z"}"#;
        let resp: ApiResponse<serde_json::Value> = serde_json::from_str(raw).unwrap();
        let resp = resp.normalized();

        assert!(resp.data.is_none());
        assert_eq!(resp.errors, vec![GENERIC_FAILURE.to_string()]);
    }

    #[test]
    fn test_missing_optional_fields_deserialize() {
        let resp: ApiResponse<u32> = serde_json::from_str(r#"{"success":true,"data":7}"#).unwrap();
        assert_eq!(resp.data, Some(7));
        assert!(resp.errors.is_empty());
        assert!(!resp.timestamp.is_empty());
    }

    #[test]
    fn test_error_summary_prefers_field_errors() {
        let resp: AuthResponse<()> = AuthResponse::fail(
            "Validation failed",
            vec!["Username taken".into(), "Email invalid".into()],
        );
        assert_eq!(resp.error_summary(), "Username taken, Email invalid");

        let resp: AuthResponse<()> = serde_json::from_str(
            r#"{"success":false,"message":"Invalid credentials"}"#,
        )
        .unwrap();
        assert_eq!(resp.error_summary(), "Invalid credentials");
    }
}
