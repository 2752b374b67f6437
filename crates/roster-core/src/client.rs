//! # Request wrapper
//!
//! Performs one logical HTTP call with bounded latency and bounded automatic
//! recovery: bearer token injection, per-attempt timeout, exponential backoff
//! on transient failures, and uniform parsing of success and error bodies.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;
use uuid::Uuid;

use roster_shared::ApiResponse;

use crate::error::{ApiError, ClientError};
use crate::network::NetworkMonitor;
use crate::ports::{
    Delay, FilePart, HttpMethod, HttpRequest, HttpResponse, HttpTransport, KeyValueStore,
    RequestBody, SelectedFile, TokioDelay, TransportError,
};
use crate::retry::RetryPolicy;

/// Store key holding the bearer token.
pub const TOKEN_KEY: &str = "roster.auth_token";

/// Header carrying a per-call correlation id.
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }
}

/// Per-call overrides of the client defaults.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub timeout: Option<Duration>,
    pub retries: Option<u32>,
    pub retry_delay: Option<Duration>,
    /// Replace headers of the same name.
    pub headers: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = Some(delay);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// HTTP client shared by the resource APIs. Cheap to clone.
#[derive(Clone)]
pub struct ApiClient {
    config: Arc<ClientConfig>,
    transport: Arc<dyn HttpTransport>,
    store: Arc<dyn KeyValueStore>,
    network: NetworkMonitor,
    delay: Arc<dyn Delay>,
}

impl ApiClient {
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn HttpTransport>,
        store: Arc<dyn KeyValueStore>,
        network: NetworkMonitor,
    ) -> Self {
        Self {
            config: Arc::new(config),
            transport,
            store,
            network,
            delay: Arc::new(TokioDelay),
        }
    }

    /// Replace the sleep used between retries.
    pub fn with_delay(mut self, delay: Arc<dyn Delay>) -> Self {
        self.delay = delay;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn network(&self) -> &NetworkMonitor {
        &self.network
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ClientError> {
        self.request(HttpMethod::Get, path, query, RequestBody::Empty, RequestOptions::default())
            .await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let body = RequestBody::Json(to_json(body)?);
        self.request(HttpMethod::Post, path, &[], body, RequestOptions::default())
            .await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let body = RequestBody::Json(to_json(body)?);
        self.request(HttpMethod::Put, path, &[], body, RequestOptions::default())
            .await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.request(HttpMethod::Delete, path, &[], RequestBody::Empty, RequestOptions::default())
            .await
    }

    /// Multipart `POST` with the file under form field `file`.
    pub async fn upload<T: DeserializeOwned>(
        &self,
        path: &str,
        file: SelectedFile,
    ) -> Result<T, ClientError> {
        let part = FilePart {
            field: "file".to_string(),
            file_name: file.name,
            mime: file.mime,
            bytes: file.bytes,
        };
        self.request(
            HttpMethod::Post,
            path,
            &[],
            RequestBody::Multipart(vec![part]),
            RequestOptions::default(),
        )
        .await
    }

    /// Issue a request, retrying transient failures per the effective policy.
    #[tracing::instrument(skip_all, fields(method = %method, path = %path))]
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: &str,
        query: &[(&str, &str)],
        body: RequestBody,
        options: RequestOptions,
    ) -> Result<T, ClientError> {
        let policy = self.effective_policy(&options);
        let timeout = options.timeout.unwrap_or(self.config.timeout);

        let request = HttpRequest {
            method,
            url: self.url(path, query)?,
            headers: self.headers(&body, &options.headers).await,
            body,
        };

        let mut retries = 0;
        loop {
            match self.attempt(&request, timeout).await {
                Ok(response) => {
                    self.network.reset_retries();
                    tracing::debug!(status = response.status, retries, "Request succeeded");
                    return decode_success(&response);
                }
                Err(err) if err.is_retryable() && policy.should_retry(retries) => {
                    retries += 1;
                    let delay = policy.delay_for(retries);
                    tracing::warn!(
                        error = %err,
                        attempt = retries,
                        max_retries = policy.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "Request failed, will retry"
                    );
                    self.network.record_retry();
                    self.delay.wait(delay).await;
                }
                Err(err) => {
                    tracing::debug!(error = %err, retries, "Request failed");
                    return Err(err);
                }
            }
        }
    }

    async fn attempt(
        &self,
        request: &HttpRequest,
        timeout: Duration,
    ) -> Result<HttpResponse, ClientError> {
        if !self.network.is_online() {
            return Err(ClientError::Offline);
        }

        // Dropping the send future on expiry aborts the in-flight call.
        let response = match tokio::time::timeout(timeout, self.transport.send(request.clone())).await
        {
            Err(_) | Ok(Err(TransportError::Timeout)) => return Err(ClientError::Timeout(timeout)),
            Ok(Err(TransportError::Connect(msg))) => return Err(ClientError::Connection(msg)),
            Ok(Err(TransportError::Other(msg))) => return Err(ClientError::Transport(msg)),
            Ok(Ok(response)) => response,
        };

        if response.is_success() {
            Ok(response)
        } else {
            Err(ClientError::Http(error_from_response(&response)))
        }
    }

    fn effective_policy(&self, options: &RequestOptions) -> RetryPolicy {
        let mut policy = self.config.retry;
        if let Some(retries) = options.retries {
            policy.max_retries = retries;
        }
        if let Some(delay) = options.retry_delay {
            policy.base_delay = delay;
        }
        policy
    }

    fn url(&self, path: &str, query: &[(&str, &str)]) -> Result<String, ClientError> {
        let raw = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);
        let mut url = Url::parse(&raw)
            .map_err(|e| ClientError::InvalidRequest(format!("{}: {}", raw, e)))?;

        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }

        Ok(url.into())
    }

    async fn headers(
        &self,
        body: &RequestBody,
        overrides: &[(String, String)],
    ) -> Vec<(String, String)> {
        let mut headers = Vec::new();

        if !matches!(body, RequestBody::Multipart(_)) {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }

        if let Some(token) = self.store.get(TOKEN_KEY).await {
            headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
        }

        headers.push((REQUEST_ID_HEADER.to_string(), Uuid::new_v4().to_string()));

        for (name, value) in overrides {
            headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
            headers.push((name.clone(), value.clone()));
        }

        headers
    }
}

fn to_json<B: Serialize>(body: &B) -> Result<serde_json::Value, ClientError> {
    serde_json::to_value(body).map_err(|e| ClientError::InvalidRequest(e.to_string()))
}

/// JSON bodies are decoded as-is; anything else (including an empty body)
/// is wrapped as `ApiResponse { success: true, data: <text> }`.
fn decode_success<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ClientError> {
    let value = if response.is_json() && !response.body.is_empty() {
        serde_json::from_slice(&response.body).map_err(|e| ClientError::Decode(e.to_string()))?
    } else {
        serde_json::to_value(ApiResponse::ok(response.body_text()))
            .map_err(|e| ClientError::Decode(e.to_string()))?
    };

    serde_json::from_value(value).map_err(|e| ClientError::Decode(e.to_string()))
}

fn error_from_response(response: &HttpResponse) -> ApiError {
    let status = response.status;
    let mut message = None;
    let mut errors = Vec::new();

    if response.is_json() {
        if let Ok(body) = serde_json::from_slice::<serde_json::Value>(&response.body) {
            message = body
                .get("message")
                .or_else(|| body.get("error"))
                .and_then(|m| m.as_str())
                .map(String::from);
            errors = body
                .get("errors")
                .and_then(|e| e.as_array())
                .map(|list| {
                    list.iter()
                        .filter_map(|e| e.as_str().map(String::from))
                        .collect()
                })
                .unwrap_or_default();
        }
    } else {
        let text = response.body_text();
        if !text.trim().is_empty() {
            message = Some(text.trim().to_string());
        }
    }

    let message = message.unwrap_or_else(|| format!("HTTP {}: {}", status, reason(status)));
    ApiError::from_status(status, message, errors)
}

fn reason(status: u16) -> &'static str {
    match status {
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        409 => "Conflict",
        413 => "Payload Too Large",
        422 => "Unprocessable Entity",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "Request Failed",
    }
}
