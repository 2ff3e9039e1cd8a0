//! HTTP client for the Gemini `embedContent` and `generateContent` endpoints.

use std::time::Duration;

use annualcmp_core::AppConfig;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::RetrievalError;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// How an embedded text will be used; Gemini tunes the vector accordingly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    RetrievalDocument,
    RetrievalQuery,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

impl<'a> Content<'a> {
    fn text(text: &'a str) -> Self {
        Self {
            parts: vec![Part { text }],
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    model: String,
    content: Content<'a>,
    task_type: TaskType,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: Option<ContentEmbedding>,
}

#[derive(Deserialize)]
struct ContentEmbedding {
    #[serde(default)]
    values: Vec<f32>,
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Client for the Gemini REST API.
///
/// Use [`GeminiClient::new`] for production or [`GeminiClient::with_base_url`]
/// to point at a mock server in tests. The API key travels in the
/// `x-goog-api-key` header, never in the URL.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_key", &"[redacted]")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// # Errors
    ///
    /// Returns [`RetrievalError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, RetrievalError> {
        Self::with_base_url(api_key, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client against a custom API root (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError::Http`] if the `reqwest::Client` cannot be built.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, RetrievalError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("annualcmp/0.1")
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Build a client from configuration, or `None` when no API key is set.
    ///
    /// A client that cannot be constructed is logged and treated as absent.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Option<Self> {
        let api_key = config.gemini_api_key.as_deref()?;
        match Self::with_base_url(api_key, config.request_timeout_secs, &config.gemini_base_url) {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(error = %e, "failed to build Gemini client");
                None
            }
        }
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!("{}/models/{model}:{method}", self.base_url)
    }

    /// Embed one text with `model`.
    ///
    /// # Errors
    ///
    /// - [`RetrievalError::Http`] on network failure or an undecodable body.
    /// - [`RetrievalError::UnexpectedStatus`] on a non-2xx status.
    /// - [`RetrievalError::EmptyResponse`] if no vector values come back.
    pub async fn embed_content(
        &self,
        model: &str,
        text: &str,
        task_type: TaskType,
    ) -> Result<Vec<f32>, RetrievalError> {
        let url = self.model_url(model, "embedContent");
        let request = EmbedContentRequest {
            model: format!("models/{model}"),
            content: Content::text(text),
            task_type,
        };
        let response: EmbedContentResponse = self.post_json(&url, &request).await?;

        response
            .embedding
            .map(|e| e.values)
            .filter(|values| !values.is_empty())
            .ok_or(RetrievalError::EmptyResponse(url))
    }

    /// Generate a completion for `prompt` with `model`.
    ///
    /// Text parts of the first candidate are concatenated.
    ///
    /// # Errors
    ///
    /// - [`RetrievalError::Http`] on network failure or an undecodable body.
    /// - [`RetrievalError::UnexpectedStatus`] on a non-2xx status.
    /// - [`RetrievalError::EmptyResponse`] if the first candidate has no text.
    pub async fn generate_content(&self, model: &str, prompt: &str) -> Result<String, RetrievalError> {
        let url = self.model_url(model, "generateContent");
        let request = GenerateContentRequest {
            contents: vec![Content::text(prompt)],
        };
        let response: GenerateContentResponse = self.post_json(&url, &request).await?;

        let text: String = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(RetrievalError::EmptyResponse(url));
        }
        Ok(text)
    }

    async fn post_json<B, R>(&self, url: &str, body: &B) -> Result<R, RetrievalError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RetrievalError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.json::<R>().await?)
    }
}
