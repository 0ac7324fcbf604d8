//! HTTP client for the recruiting console's REST backend

use crate::{ProbeError, Result};
use aira_core::{BackendConfig, Credentials};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Longest response body kept in an error message
const MAX_ERROR_BODY: usize = 512;

/// User summary returned with a login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    /// Display name
    pub name: String,
}

/// Successful login response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Bearer token for later requests
    pub access_token: String,
    /// The authenticated user
    pub user: UserSummary,
}

/// Profile of the authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Display name
    pub name: String,
    /// Account email
    pub email: String,
    /// Role such as `admin` or `recruiter`
    pub role: String,
}

/// One page of candidates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateList {
    /// Total candidates on the backend
    pub total: u64,
    /// Candidates in this page
    pub candidates: Vec<serde_json::Value>,
}

/// One page of calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallList {
    /// Total calls on the backend
    pub total: u64,
    /// Calls in this page
    pub calls: Vec<serde_json::Value>,
}

/// Candidate dashboard counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateStats {
    /// All candidates
    pub total_candidates: u64,
    /// Candidates who expressed interest
    pub interested_candidates: u64,
    /// Candidates who declined
    pub not_interested_candidates: u64,
}

/// API client for the recruiting backend
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProbeError::Http {
                endpoint: "client".to_string(),
                source: e,
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Create a client from the backend configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &BackendConfig) -> Result<Self> {
        Self::new(
            config.base_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Set the bearer token for authenticated endpoints
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Base URL without a trailing slash
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether a bearer token is set
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Fetch the root endpoint
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not JSON.
    pub async fn root(&self) -> Result<serde_json::Value> {
        let request = self.client.get(self.url("/"));
        Self::send_json("/", request).await
    }

    /// Log in and return the token and user
    ///
    /// The credentials are validated locally before anything is sent.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed email, or an error if the
    /// backend rejects the login.
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginResponse> {
        credentials.check()?;

        tracing::debug!(email = %credentials.email, "Logging in");
        let request = self.client.post(self.url("/auth/login")).json(credentials);
        Self::send_json("/auth/login", request).await
    }

    /// Fetch the profile of the logged-in user
    ///
    /// # Errors
    ///
    /// Returns an error if not logged in or the request fails.
    pub async fn profile(&self) -> Result<Profile> {
        let request = self.authorized(self.client.get(self.url("/auth/me")))?;
        Self::send_json("/auth/me", request).await
    }

    /// Fetch one page of candidates
    ///
    /// # Errors
    ///
    /// Returns an error if not logged in or the request fails.
    pub async fn candidates(&self, limit: u32) -> Result<CandidateList> {
        let request = self.authorized(
            self.client
                .get(self.url("/candidates"))
                .query(&[("limit", limit)]),
        )?;
        Self::send_json("/candidates", request).await
    }

    /// Fetch one page of calls
    ///
    /// # Errors
    ///
    /// Returns an error if not logged in or the request fails.
    pub async fn calls(&self, limit: u32) -> Result<CallList> {
        let request = self.authorized(
            self.client
                .get(self.url("/calls"))
                .query(&[("limit", limit)]),
        )?;
        Self::send_json("/calls", request).await
    }

    /// Fetch the candidate dashboard counters
    ///
    /// # Errors
    ///
    /// Returns an error if not logged in or the request fails.
    pub async fn candidate_stats(&self) -> Result<CandidateStats> {
        let request = self.authorized(self.client.get(self.url("/candidates/stats")))?;
        Self::send_json("/candidates/stats", request).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        self.token
            .as_ref()
            .map(|token| request.bearer_auth(token))
            .ok_or(ProbeError::NotAuthenticated)
    }

    async fn send_json<T: DeserializeOwned>(endpoint: &str, request: RequestBuilder) -> Result<T> {
        let response = request.send().await.map_err(|e| ProbeError::Http {
            endpoint: endpoint.to_string(),
            source: e,
        })?;

        let response = Self::check_status(endpoint, response).await?;

        let body = response.bytes().await.map_err(|e| ProbeError::Http {
            endpoint: endpoint.to_string(),
            source: e,
        })?;

        serde_json::from_slice(&body).map_err(|e| ProbeError::InvalidResponse {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })
    }

    async fn check_status(endpoint: &str, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let mut body = response.text().await.unwrap_or_default();
        if body.len() > MAX_ERROR_BODY {
            let mut cut = MAX_ERROR_BODY;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
            body.push_str("...");
        }

        Err(ProbeError::UnexpectedStatus {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            body,
        })
    }
}
