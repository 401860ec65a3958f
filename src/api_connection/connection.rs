use dotenv::dotenv;
use reqwest::Client;
use std::env;
use std::error::Error;
use std::fmt;

use super::endpoints::{GenerateContentRequest, GenerateContentResponse, GEMINI_API_BASE};

#[derive(Debug)]
pub enum ApiConnectionError {
    MissingApiKey(String),
    NetworkError(reqwest::Error),
    SerializationError(serde_json::Error),
    ApiError {
        status: reqwest::StatusCode,
        error_body: String,
    },
    EmptyResponse,
}

impl fmt::Display for ApiConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiConnectionError::MissingApiKey(key_name) => {
                write!(f, "API key not found in environment: {}", key_name)
            }
            ApiConnectionError::NetworkError(err) => write!(f, "Network error: {}", err),
            ApiConnectionError::SerializationError(err) => {
                write!(f, "Serialization error: {}", err)
            }
            ApiConnectionError::ApiError { status, error_body } => {
                write!(f, "API error {}: {}", status, error_body)
            }
            ApiConnectionError::EmptyResponse => {
                write!(f, "API response contained no usable content")
            }
        }
    }
}

impl Error for ApiConnectionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ApiConnectionError::NetworkError(err) => Some(err),
            ApiConnectionError::SerializationError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiConnectionError {
    fn from(err: reqwest::Error) -> Self {
        ApiConnectionError::NetworkError(err)
    }
}

impl From<serde_json::Error> for ApiConnectionError {
    fn from(err: serde_json::Error) -> Self {
        ApiConnectionError::SerializationError(err)
    }
}

/// Client for the Gemini `generateContent` endpoint. The credential is carried
/// by the client instance rather than read from ambient environment state at
/// call time.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    api_key: String,
    model: String,
    http: Client,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            http: Client::new(),
        }
    }

    /// Builds a client reading the API key from the named environment
    /// variable (loading `.env` first if present).
    pub fn from_env(api_key_env_var: &str, model: &str) -> Result<Self, ApiConnectionError> {
        dotenv().ok();
        let api_key = env::var(api_key_env_var)
            .map_err(|_| ApiConnectionError::MissingApiKey(api_key_env_var.to_string()))?;
        Ok(Self::new(api_key, model))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Single round trip, no retry.
    pub async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, ApiConnectionError> {
        let url = format!("{}/{}:generateContent", GEMINI_API_BASE, self.model);

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        if response.status().is_success() {
            let parsed = response.json::<GenerateContentResponse>().await?;
            Ok(parsed)
        } else {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            Err(ApiConnectionError::ApiError { status, error_body })
        }
    }
}
