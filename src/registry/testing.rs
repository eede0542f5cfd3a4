//! In-memory transport for unit tests

use crate::error::RegistryError;
use crate::registry::Transport;
use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

/// Canned response for one URL
#[derive(Debug, Clone)]
pub enum MockResponse {
    Json(Value),
    Text(String),
    NetworkError,
}

/// Serves canned responses by exact URL and records every request.
///
/// Unknown URLs answer with `NotFound`.
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: HashMap<String, MockResponse>,
    requests: Mutex<Vec<String>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_json(mut self, url: &str, body: Value) -> Self {
        self.responses
            .insert(url.to_string(), MockResponse::Json(body));
        self
    }

    pub fn with_text(mut self, url: &str, body: impl Into<String>) -> Self {
        self.responses
            .insert(url.to_string(), MockResponse::Text(body.into()));
        self
    }

    pub fn with_network_error(mut self, url: &str) -> Self {
        self.responses
            .insert(url.to_string(), MockResponse::NetworkError);
        self
    }

    /// URLs requested so far, in request order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn respond(&self, url: &Url) -> Result<MockResponse, RegistryError> {
        self.requests.lock().unwrap().push(url.to_string());
        match self.responses.get(url.as_str()) {
            Some(MockResponse::NetworkError) => {
                Err(RegistryError::network_error(url.as_str(), "connection reset"))
            }
            Some(response) => Ok(response.clone()),
            None => Err(RegistryError::not_found(url.as_str())),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get_json(&self, url: &Url) -> Result<Value, RegistryError> {
        match self.respond(url)? {
            MockResponse::Json(body) => Ok(body),
            MockResponse::Text(body) => serde_json::from_str(&body)
                .map_err(|e| RegistryError::invalid_response(url.as_str(), e.to_string())),
            MockResponse::NetworkError => unreachable!(),
        }
    }

    async fn get_text(&self, url: &Url) -> Result<String, RegistryError> {
        match self.respond(url)? {
            MockResponse::Json(body) => Ok(body.to_string()),
            MockResponse::Text(body) => Ok(body),
            MockResponse::NetworkError => unreachable!(),
        }
    }
}
