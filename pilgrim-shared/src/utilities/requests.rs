use async_trait::async_trait;
use http::{Method, StatusCode};
use once_cell::sync::Lazy;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use crate::utilities::config;

static SHARED_CLIENT: Lazy<Client> = Lazy::new(Client::new);

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self { method: Method::GET, path: path.into(), body: None }
    }

    pub fn post<T: Serialize>(path: impl Into<String>, body: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            method: Method::POST,
            path: path.into(),
            body: Some(serde_json::to_value(body)?),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self { status, body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Performs one HTTP round-trip. Never fails: transport problems come back as a
/// non-2xx [`ApiResponse`].
#[async_trait]
pub trait RequestLayer: Send + Sync {
    async fn send(&self, request: ApiRequest) -> ApiResponse;
}

/// reqwest-backed implementation rooted at the API host.
pub struct HttpRequestLayer {
    base_url: String,
    client: Client,
}

impl HttpRequestLayer {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: SHARED_CLIENT.clone(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(config::get_api_base_url())
    }

    fn join_url(&self, path: &str) -> String {
        if path.is_empty() {
            self.base_url.clone()
        } else if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    async fn try_send(&self, url: &str, request: ApiRequest) -> Result<ApiResponse, reqwest::Error> {
        let mut builder = self.client.request(request.method.clone(), url);
        // Content-Type is only forced on requests that carry a body
        if request.method != Method::GET {
            builder = builder.json(&request.body.unwrap_or(Value::Null));
        }

        let res = builder.send().await?;
        let status = res.status().as_u16();
        let body = res.bytes().await?;
        Ok(ApiResponse::new(status, body.to_vec()))
    }
}

#[async_trait]
impl RequestLayer for HttpRequestLayer {
    async fn send(&self, request: ApiRequest) -> ApiResponse {
        let url = self.join_url(&request.path);
        log::debug!("{} {}", request.method, url);

        match self.try_send(&url, request).await {
            Ok(response) => response,
            Err(e) => {
                log::warn!("Network error calling {}: {}", url, e);
                let body = json!({
                    "message": "Network error",
                    "detail": e.to_string(),
                    "url": url,
                });
                ApiResponse::new(StatusCode::SERVICE_UNAVAILABLE.as_u16(), body.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url() {
        let layer = HttpRequestLayer::new("http://localhost:8000/");
        assert_eq!(layer.join_url("/api/v1/live"), "http://localhost:8000/api/v1/live");
        assert_eq!(layer.join_url("api/v1/live"), "http://localhost:8000/api/v1/live");
        assert_eq!(layer.join_url(""), "http://localhost:8000");
    }

    #[test]
    fn test_success_range() {
        assert!(ApiResponse::new(200, "").is_success());
        assert!(ApiResponse::new(204, "").is_success());
        assert!(!ApiResponse::new(304, "").is_success());
        assert!(!ApiResponse::new(503, "").is_success());
    }

    #[tokio::test]
    async fn test_transport_failure_becomes_503() {
        // Port 9 (discard) on localhost is not expected to accept HTTP
        let layer = HttpRequestLayer::new("http://127.0.0.1:9");
        let response = layer.send(ApiRequest::get("/api/v1/push/vapid-public-key")).await;

        assert_eq!(response.status, 503);
        let body: Value = response.json().unwrap();
        assert_eq!(body["message"], "Network error");
        assert_eq!(body["url"], "http://127.0.0.1:9/api/v1/push/vapid-public-key");
    }
}
