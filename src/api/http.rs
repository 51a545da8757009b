//! HTTP utilities for Access REST API calls

use crate::error::{api_status, ApiError};
use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use std::time::Duration;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut cut = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..cut], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// HTTP client wrapper for Access API calls
#[derive(Clone)]
pub struct AccessHttpClient {
    client: Client,
}

impl AccessHttpClient {
    /// Create a new HTTP client
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("access-projects/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Make a GET request
    pub async fn get(&self, url: &str, token: &str) -> Result<Value> {
        tracing::debug!("GET {}", url);
        let request = authorize(self.client.get(url), token);
        self.execute("GET", url, request).await
    }

    /// Make a POST request with a JSON body
    pub async fn post(&self, url: &str, token: &str, body: &Value) -> Result<Value> {
        tracing::debug!("POST {}", url);
        let request = authorize(self.client.post(url), token).json(body);
        self.execute("POST", url, request).await
    }

    /// Make a PUT request with a JSON body
    pub async fn put(&self, url: &str, token: &str, body: &Value) -> Result<Value> {
        tracing::debug!("PUT {}", url);
        let request = authorize(self.client.put(url), token).json(body);
        self.execute("PUT", url, request).await
    }

    /// Make a DELETE request
    pub async fn delete(&self, url: &str, token: &str) -> Result<Value> {
        tracing::debug!("DELETE {}", url);
        let request = authorize(self.client.delete(url), token);
        self.execute("DELETE", url, request).await
    }

    /// Make a HEAD request and return the status without treating 4xx/5xx as failures
    pub async fn head(&self, url: &str, token: &str) -> Result<StatusCode> {
        tracing::debug!("HEAD {}", url);

        let response = authorize(self.client.head(url), token)
            .send()
            .await
            .context("Failed to send request")?;

        Ok(response.status())
    }

    async fn execute(&self, method: &'static str, url: &str, request: RequestBuilder) -> Result<Value> {
        let response = request.send().await.context("Failed to send request")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            // Only the sanitized/truncated body is logged
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            return Err(ApiError {
                method,
                url: url.to_string(),
                status,
            }
            .into());
        }

        // Handle empty response
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).context("Failed to parse response JSON")
    }
}

fn authorize(request: RequestBuilder, token: &str) -> RequestBuilder {
    if token.is_empty() {
        request
    } else {
        request.bearer_auth(token)
    }
}

/// Format an Access API error for display
pub fn format_api_error(error: &anyhow::Error) -> String {
    if let Some(status) = api_status(error) {
        let message = match status.as_u16() {
            400 => "Invalid request. Check the resource attributes.",
            401 => "Authentication failed. Check PROJECTS_ACCESS_TOKEN.",
            403 => "Permission denied. The token needs platform admin or project admin rights.",
            404 => "Resource not found.",
            409 => "Resource conflict. The resource may already exist.",
            429 => "Rate limit exceeded. Please try again later.",
            500..=599 => "Access service temporarily unavailable. Please try again.",
            _ => "Request failed.",
        };
        return format!("{} ({})", message, status);
    }

    // Keep the full chain for validation, import and transport errors
    format!("{:#}", error)
}
