//! HTTP client shared foundation
//!
//! This module provides a shared HTTP client with:
//! - Configurable timeout and User-Agent
//! - Opt-in exponential backoff retry (disabled by default)
//! - Status code classification (404, 429, other failures)

use crate::error::RegistryError;
use crate::registry::Transport;
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;

/// Default timeout for HTTP requests (30 seconds)
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default User-Agent header
const DEFAULT_USER_AGENT: &str = concat!("list-dependents/", env!("CARGO_PKG_VERSION"));

/// Retries are off unless asked for
const DEFAULT_MAX_RETRIES: u32 = 0;

/// Base delay for exponential backoff (in milliseconds)
const BASE_DELAY_MS: u64 = 100;

const LOG_TARGET: &str = "list_dependents::http";

/// HTTP client wrapper
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: Client,
    max_retries: u32,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self, RegistryError> {
        Self::with_config(DEFAULT_TIMEOUT, DEFAULT_USER_AGENT)
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(timeout: Duration, user_agent: &str) -> Result<Self, RegistryError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| {
                RegistryError::network_error("", format!("failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    /// Set the maximum number of retries for transport failures and 429s
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Perform a GET request, classifying the response status
    pub async fn get(&self, url: &Url) -> Result<reqwest::Response, RegistryError> {
        let mut last_error = None;
        let mut delay = BASE_DELAY_MS;

        for attempt in 0..=self.max_retries {
            log::trace!(target: LOG_TARGET, "GET {} (attempt {})", url, attempt + 1);

            match self.client.get(url.clone()).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        last_error = Some(RegistryError::rate_limit_exceeded(url.as_str()));

                        if attempt < self.max_retries {
                            tokio::time::sleep(Duration::from_millis(delay)).await;
                            delay *= 2;
                            continue;
                        }
                        break;
                    }

                    if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(RegistryError::not_found(url.as_str()));
                    }

                    if !status.is_success() {
                        return Err(RegistryError::network_error(
                            url.as_str(),
                            format!("HTTP {}", status),
                        ));
                    }

                    return Ok(response);
                }
                Err(e) => {
                    last_error = Some(if e.is_timeout() {
                        RegistryError::timeout(url.as_str())
                    } else {
                        RegistryError::network_error(url.as_str(), e.to_string())
                    });

                    if attempt < self.max_retries {
                        tokio::time::sleep(Duration::from_millis(delay)).await;
                        delay *= 2;
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| RegistryError::network_error(url.as_str(), "unknown error")))
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn get_json(&self, url: &Url) -> Result<serde_json::Value, RegistryError> {
        let response = self.get(url).await?;

        response.json::<serde_json::Value>().await.map_err(|e| {
            RegistryError::invalid_response(url.as_str(), format!("failed to parse JSON: {}", e))
        })
    }

    async fn get_text(&self, url: &Url) -> Result<String, RegistryError> {
        let response = self.get(url).await?;

        response.text().await.map_err(|e| {
            RegistryError::invalid_response(
                url.as_str(),
                format!("failed to get text response: {}", e),
            )
        })
    }
}
