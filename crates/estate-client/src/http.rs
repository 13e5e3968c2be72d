//! reqwest-backed [`RestClient`]

use std::time::Duration;

use async_trait::async_trait;
use estate_types::{EstateError, Result};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use tracing::debug;

use crate::config::ClientConfig;
use crate::path::ResourcePath;
use crate::rest::RestClient;

pub struct HttpRestClient {
    base_url: String,
    client: Client,
}

impl HttpRestClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EstateError::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::new(config.base_url.clone(), config.request_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send(&self, method: Method, path: &ResourcePath, body: Option<Value>) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path.path());
        let is_write = method != Method::GET;
        debug!(method = %method, path = %path, "request");

        let mut request = self.client.request(method.clone(), &url);
        if !path.query().is_empty() {
            request = request.query(path.query());
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(|e| transport_error(&method, path, e))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| transport_error(&method, path, e))?;

        if !status.is_success() {
            return Err(status_error(status, is_write, path, &text));
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl RestClient for HttpRestClient {
    async fn get(&self, path: &ResourcePath) -> Result<Value> {
        self.send(Method::GET, path, None).await
    }

    async fn post(&self, path: &ResourcePath, body: Value) -> Result<Value> {
        self.send(Method::POST, path, Some(body)).await
    }

    async fn patch(&self, path: &ResourcePath, body: Value) -> Result<Value> {
        self.send(Method::PATCH, path, Some(body)).await
    }

    async fn put(&self, path: &ResourcePath, body: Value) -> Result<Value> {
        self.send(Method::PUT, path, Some(body)).await
    }

    async fn delete(&self, path: &ResourcePath) -> Result<Value> {
        self.send(Method::DELETE, path, None).await
    }
}

fn transport_error(method: &Method, path: &ResourcePath, err: reqwest::Error) -> EstateError {
    if err.is_timeout() {
        EstateError::Network(format!("{} {} timed out", method, path))
    } else {
        EstateError::Network(format!("{} {} failed: {}", method, path, err))
    }
}

/// Maps a non-success status onto the error taxonomy
fn status_error(status: StatusCode, is_write: bool, path: &ResourcePath, body: &str) -> EstateError {
    let detail = error_detail(body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    });
    match status {
        StatusCode::NOT_FOUND => EstateError::NotFound(path.path()),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => EstateError::Validation(detail),
        _ if is_write => EstateError::Mutation(format!("{} ({})", detail, status.as_u16())),
        _ => EstateError::Network(format!("{} returned {}: {}", path, status.as_u16(), detail)),
    }
}

/// `{"error": "..."}` or `{"message": "..."}` bodies
fn error_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["error", "message"]
        .iter()
        .find_map(|key| value.get(key).and_then(Value::as_str))
        .map(str::to_string)
}
