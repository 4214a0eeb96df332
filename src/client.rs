//! HTTP client for the classroom table API.
//!
//! Every entity lives in a flat collection under `<base_url>/<collection>`;
//! the same five calls (list, get, create, update, delete) work for all of
//! them. Configuration comes from [`Settings`](crate::config::Settings) or,
//! for one-off tools, from the environment:
//! - `CLASSROOM_URL` - Base URL (default: `http://localhost:17020/api/v1`)
//! - `CLASSROOM_API_KEY` - API key for authentication (optional for local)

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::DEFAULT_API_URL;
use crate::models::Entity;

/// HTTP client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: API key required or invalid")]
    Unauthorized,

    #[error("Server error: {0}")]
    Server(String),
}

/// HTTP client for the classroom table API.
#[derive(Debug, Clone)]
pub struct ClassroomClient {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl ClassroomClient {
    /// Create client from environment variables.
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("CLASSROOM_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let api_key = std::env::var("CLASSROOM_API_KEY").ok();
        Self::new(base_url, api_key)
    }

    /// Create with explicit configuration.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a request with optional auth header.
    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.request(method, &url);
        if let Some(ref key) = self.api_key {
            req = req.bearer_auth(key);
        }
        req
    }

    /// Handle response, converting HTTP errors to ClientError.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            Err(Self::error_for(status, response).await)
        }
    }

    /// Handle response that may return empty body (204 No Content).
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<(), ClientError> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::error_for(status, response).await)
        }
    }

    async fn error_for(status: StatusCode, response: reqwest::Response) -> ClientError {
        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::NOT_FOUND => ClientError::NotFound(body),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                ClientError::BadRequest(body)
            }
            StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
            _ => ClientError::Server(format!("{}: {}", status, body)),
        }
    }

    // ============================================================
    // Collection Operations
    // ============================================================

    /// List rows of `E`, narrowed by `query`.
    pub async fn list<E: Entity>(&self, query: &E::Query) -> Result<Vec<E>, ClientError> {
        let response = self
            .request(Method::GET, &format!("/{}", E::COLLECTION))
            .query(query)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Get one row by id. A 404 is `Ok(None)`.
    pub async fn get<E: Entity>(&self, id: i64) -> Result<Option<E>, ClientError> {
        let response = self
            .request(Method::GET, &format!("/{}/{}", E::COLLECTION, id))
            .send()
            .await?;
        match self.handle_response(response).await {
            Ok(row) => Ok(Some(row)),
            Err(ClientError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Create a row; the server assigns the id.
    pub async fn create<E: Entity>(&self, input: &E::Create) -> Result<E, ClientError> {
        let response = self
            .request(Method::POST, &format!("/{}", E::COLLECTION))
            .json(input)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Apply a partial update and return the stored row.
    pub async fn update<E: Entity>(&self, id: i64, input: &E::Update) -> Result<E, ClientError> {
        let response = self
            .request(Method::PUT, &format!("/{}/{}", E::COLLECTION, id))
            .json(input)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Delete a row. A 404 is `Ok(false)`.
    pub async fn delete<E: Entity>(&self, id: i64) -> Result<bool, ClientError> {
        let response = self
            .request(Method::DELETE, &format!("/{}/{}", E::COLLECTION, id))
            .send()
            .await?;
        match self.handle_empty_response(response).await {
            Ok(()) => Ok(true),
            Err(ClientError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Check that the server is reachable.
    pub async fn ping(&self) -> Result<(), ClientError> {
        let response = self.request(Method::GET, "/health").send().await?;
        self.handle_empty_response(response).await
    }
}
