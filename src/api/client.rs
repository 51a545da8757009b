//! Access Client
//!
//! Main client for the JFrog Access API, combining the platform URL,
//! the access token and HTTP functionality.

use super::http::AccessHttpClient;
use anyhow::{anyhow, Context, Result};
use regex::Regex;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::LazyLock;
use std::time::Duration;
use url::Url;

static PATH_PARAM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\w+)\}").expect("valid regex"));

/// Main Access client
#[derive(Clone)]
pub struct AccessClient {
    pub http: AccessHttpClient,
    pub base_url: Url,
    access_token: String,
}

impl AccessClient {
    /// Create a new client for the platform at `base_url`
    pub fn new(base_url: &str, access_token: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid platform URL: {}", base_url))?;

        if base_url.cannot_be_a_base() {
            return Err(anyhow!("Platform URL cannot be used as a base: {}", base_url));
        }

        let http = AccessHttpClient::new(timeout)?;

        Ok(Self {
            http,
            base_url,
            access_token: access_token.to_string(),
        })
    }

    /// Build a full URL for an API path.
    /// Paths are resolved below the base URL whether or not they start with `/`.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// GET a path and deserialize the response body
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        let value = self.http.get(&url, &self.access_token).await?;
        serde_json::from_value(value)
            .with_context(|| format!("Failed to decode response from {}", url))
    }

    /// HEAD a path and report its status
    pub async fn head(&self, path: &str) -> Result<StatusCode> {
        self.http.head(&self.url(path), &self.access_token).await
    }

    /// POST a JSON body to a path
    pub async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<Value> {
        let body = serde_json::to_value(body).context("Failed to encode request body")?;
        self.http
            .post(&self.url(path), &self.access_token, &body)
            .await
    }

    /// PUT a JSON body to a path
    pub async fn put<B: Serialize>(&self, path: &str, body: &B) -> Result<Value> {
        let body = serde_json::to_value(body).context("Failed to encode request body")?;
        self.http
            .put(&self.url(path), &self.access_token, &body)
            .await
    }

    /// DELETE a path
    pub async fn delete(&self, path: &str) -> Result<Value> {
        self.http.delete(&self.url(path), &self.access_token).await
    }
}

/// Substitute `{param}` placeholders in a path template with percent-encoded values
pub fn expand_path(template: &str, params: &[(&str, &str)]) -> Result<String> {
    let mut missing = None;

    let expanded = PATH_PARAM_RE.replace_all(template, |caps: &regex::Captures| {
        let name = &caps[1];
        match params.iter().find(|(key, _)| *key == name) {
            Some((_, value)) => urlencoding::encode(value).into_owned(),
            None => {
                missing.get_or_insert_with(|| name.to_string());
                String::new()
            }
        }
    });

    match missing {
        Some(name) => Err(anyhow!("Missing path parameter {} for {}", name, template)),
        None => Ok(expanded.into_owned()),
    }
}
