//! reqwest-backed HTTP transport.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method};

use roster_core::ports::{
    HttpMethod, HttpRequest, HttpResponse, HttpTransport, RequestBody, TransportError,
};

const USER_AGENT: &str = concat!("roster/", env!("CARGO_PKG_VERSION"));

/// Sends requests with a shared connection pool.
///
/// Per-attempt deadlines are enforced by the caller; reqwest's own timeout
/// is left unset.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self.client.request(method(request.method), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.body(value.to_string()),
            RequestBody::Multipart(parts) => {
                let mut form = Form::new();
                for part in parts {
                    let file = Part::bytes(part.bytes)
                        .file_name(part.file_name)
                        .mime_str(&part.mime)
                        .map_err(map_error)?;
                    form = form.part(part.field, file);
                }
                builder.multipart(form)
            }
        };

        let response = builder.send().await.map_err(map_error)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await.map_err(map_error)?.to_vec();

        tracing::trace!(status, bytes = body.len(), "Response received");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn map_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_connect() {
        TransportError::Connect(e.to_string())
    } else {
        TransportError::Other(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use roster_core::ports::FilePart;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn request(method: HttpMethod, url: String, body: RequestBody) -> HttpRequest {
        HttpRequest {
            method,
            url,
            headers: vec![
                ("Content-Type".into(), "application/json".into()),
                ("Authorization".into(), "Bearer tok-1".into()),
            ],
            body,
        }
    }

    #[tokio::test]
    async fn test_sends_json_and_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/people"))
            .and(header("authorization", "Bearer tok-1"))
            .and(body_json(json!({"name": "Ada"})))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({"success": true, "data": {"id": "1"}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new().unwrap();
        let response = transport
            .send(request(
                HttpMethod::Post,
                format!("{}/api/people", server.uri()),
                RequestBody::Json(json!({"name": "Ada"})),
            ))
            .await
            .unwrap();

        assert_eq!(response.status, 201);
        assert!(response.is_json());
        let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(body["data"]["id"], "1");
    }

    #[tokio::test]
    async fn test_error_status_is_not_a_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/people/9"))
            .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new().unwrap();
        let response = transport
            .send(request(
                HttpMethod::Get,
                format!("{}/api/people/9", server.uri()),
                RequestBody::Empty,
            ))
            .await
            .unwrap();

        assert_eq!(response.status, 404);
        assert_eq!(response.body_text(), "missing");
    }

    #[tokio::test]
    async fn test_multipart_upload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/upload"))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(json!({"success": true, "data": {"url": "/uploads/a.png"}})),
            )
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new().unwrap();
        let part = FilePart {
            field: "file".into(),
            file_name: "a.png".into(),
            mime: "image/png".into(),
            bytes: vec![0x89, b'P', b'N', b'G'],
        };
        let mut upload = request(
            HttpMethod::Post,
            format!("{}/api/upload", server.uri()),
            RequestBody::Multipart(vec![part]),
        );
        upload.headers.retain(|(name, _)| name != "Content-Type");

        let response = transport.send(upload).await.unwrap();
        assert_eq!(response.status, 201);

        let received = server.received_requests().await.unwrap();
        let content_type = received[0]
            .headers
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(content_type.starts_with("multipart/form-data; boundary="));

        let body = String::from_utf8_lossy(&received[0].body).to_lowercase();
        assert!(body.contains("name=\"file\""));
        assert!(body.contains("filename=\"a.png\""));
        assert!(body.contains("content-type: image/png"));
    }

    #[tokio::test]
    async fn test_refused_connection_maps_to_connect() {
        let transport = ReqwestTransport::new().unwrap();

        let err = transport
            .send(request(
                HttpMethod::Get,
                "http://127.0.0.1:1/health".into(),
                RequestBody::Empty,
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::Connect(_)));
    }
}
