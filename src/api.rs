use serde::Deserialize;
use thiserror::Error;

/// Shown when a failure carries no usable message of its own.
pub const GENERIC_ERROR: &str = "Sorry, something went wrong. Please try again.";

/// A query strategy offered by the backend (e.g. "naive", "hybrid").
/// Opaque to this client; the id is passed back verbatim on queries.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Mode {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A completed answer from the backend, together with the mode it reports
/// having used (which may differ from the one requested).
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub mode: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend answered 200 but flagged the payload as an error.
    #[error("{0}")]
    Backend(String),
    #[error("backend returned HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct QueryPayload {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    mode: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HealthPayload {
    status: String,
}

/// HTTP client for the question-answering backend.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the set of query modes the backend supports.
    pub async fn modes(&self) -> Result<Vec<Mode>, ApiError> {
        let response = self
            .http
            .get(format!("{}/modes", self.base_url))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::Status(response.status()));
        }

        Ok(response.json::<Vec<Mode>>().await?)
    }

    /// Ask one question with the given mode and wait for the full answer.
    ///
    /// A 200 response whose payload carries `status: "error"` is converted
    /// into `ApiError::Backend` with the payload's error text, so callers see
    /// application failures and transport failures through the same path.
    pub async fn query(&self, question: &str, mode: &str) -> Result<Answer, ApiError> {
        let response = self
            .http
            .get(format!("{}/query", self.base_url))
            .query(&[("question", question), ("mode", mode)])
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::error!(status = %response.status(), "query request failed");
            return Err(ApiError::Status(response.status()));
        }

        let payload: QueryPayload = response.json().await?;

        if payload.status.as_deref() == Some("error") {
            let message = payload
                .error
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| GENERIC_ERROR.to_string());
            tracing::error!(error = %message, "backend flagged query as failed");
            return Err(ApiError::Backend(message));
        }

        Ok(Answer {
            text: payload.response.unwrap_or_default(),
            mode: payload.mode.unwrap_or_else(|| mode.to_string()),
        })
    }

    /// Probe the backend's health endpoint. Result is informational only.
    pub async fn health(&self) -> Result<String, ApiError> {
        let response = self
            .http
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::Status(response.status()));
        }

        let payload: HealthPayload = response.json().await?;
        Ok(payload.status)
    }
}
