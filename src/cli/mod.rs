mod appointments;
mod auth;
mod catalog;
mod config;
mod dashboard;

pub use appointments::*;
pub use auth::*;
pub use catalog::*;
pub use config::*;
pub use dashboard::*;

use anyhow::{Context, Result};
use reqwest::{Method, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};

use crate::models::LocalConfig;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

impl OutputFormat {
    pub fn print<T: Serialize + std::fmt::Display>(&self, value: &T) {
        match self {
            OutputFormat::Human => println!("{}", value),
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
            }
        }
    }
}

/// Success response
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub message: String,
}

impl std::fmt::Display for SuccessResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl SuccessResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Get the HTTP client for making requests to the server
pub fn get_http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .context("Failed to create HTTP client")
}

/// Get the server URL from config or default
pub fn get_server_url() -> String {
    LocalConfig::load()
        .ok()
        .and_then(|c| c.server_url)
        .unwrap_or_else(|| crate::DEFAULT_SERVER_URL.to_string())
}

/// Get the API key from local config
pub fn get_api_key() -> Result<String> {
    let config = LocalConfig::load()?;
    config
        .api_key
        .ok_or_else(|| anyhow::anyhow!("Not registered. Run 'salond register' first."))
}

/// Authenticated client for the salond API
pub struct ApiClient {
    http: reqwest::Client,
    server_url: String,
    api_key: String,
}

impl ApiClient {
    /// Client using the locally stored server URL and API key
    pub fn from_config() -> Result<Self> {
        Ok(Self {
            http: get_http_client()?,
            server_url: get_server_url(),
            api_key: get_api_key()?,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.server_url, path))
            .bearer_auth(&self.api_key)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        send(self.request(Method::GET, path), path).await
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        send(self.request(Method::POST, path).json(body), path).await
    }

    pub async fn patch<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        send(self.request(Method::PATCH, path).json(body), path).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        send(self.request(Method::DELETE, path), path).await
    }
}

/// Send a request and decode a JSON body, turning error responses into errors
async fn send<T: DeserializeOwned>(request: RequestBuilder, path: &str) -> Result<T> {
    let resp = request
        .send()
        .await
        .with_context(|| format!("Failed to reach server for {}", path))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("{} ({})", error_message(&body), status);
    }

    resp.json()
        .await
        .with_context(|| format!("Invalid response from {}", path))
}

/// The `error` field of a JSON error body, or the raw body
fn error_message(body: &str) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        error: String,
    }

    serde_json::from_str::<ErrorBody>(body)
        .map(|e| e.error)
        .unwrap_or_else(|_| body.trim().to_string())
}

/// Split a comma separated list, dropping empty entries
pub fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect()
}
