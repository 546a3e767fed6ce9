//! LLM integration for workout generation
//!
//! This module handles communication with the Gemini `generateContent` API.
//! The response is returned as raw text; shaping it into a workout script is
//! the normalizer's job.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::coach::WorkoutGenerator;
use crate::config::CoachConfig;

/// ---------------------------------------------------------------------------
/// Configuration
/// ---------------------------------------------------------------------------

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const GEMINI_MODEL: &str = "gemini-2.5-flash";

/// ---------------------------------------------------------------------------
/// Error Types
/// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum LlmError {
  #[error("Request failed: {0}")]
  Request(String),

  #[error("API error: {0}")]
  Api(String),

  #[error("Parse error: {0}")]
  Parse(String),
}

impl From<reqwest::Error> for LlmError {
  fn from(e: reqwest::Error) -> Self {
    LlmError::Request(e.to_string())
  }
}

/// ---------------------------------------------------------------------------
/// Gemini API Types
/// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct GenerateRequest {
  contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
  #[serde(default)]
  parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
  #[serde(default)]
  text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
  #[serde(default)]
  candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
  content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
  error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
  message: String,
}

/// ---------------------------------------------------------------------------
/// Gemini Client
/// ---------------------------------------------------------------------------

pub struct GeminiClient {
  client: Client,
  api_key: String,
  api_base: String,
  model: String,
}

impl GeminiClient {
  pub fn new(api_key: &str, api_base: &str, model: &str) -> Self {
    Self {
      client: Client::new(),
      api_key: api_key.to_string(),
      api_base: api_base.trim_end_matches('/').to_string(),
      model: model.to_string(),
    }
  }

  pub fn from_config(config: &CoachConfig) -> Self {
    Self::new(&config.gemini_api_key, &config.gemini_api_base, &config.gemini_model)
  }

  /// Send a single-turn prompt and return the first candidate's text
  pub async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
    let url = format!(
      "{}/v1beta/models/{}:generateContent",
      self.api_base, self.model
    );

    let request = GenerateRequest {
      contents: vec![Content {
        parts: vec![Part {
          text: Some(prompt.to_string()),
        }],
      }],
    };

    debug!(model = %self.model, prompt_chars = prompt.len(), "calling Gemini");

    let response = self
      .client
      .post(&url)
      .query(&[("key", self.api_key.as_str())])
      .json(&request)
      .send()
      .await?;

    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
      // Try to parse error response
      if let Ok(error_resp) = serde_json::from_str::<GeminiErrorResponse>(&body) {
        return Err(LlmError::Api(error_resp.error.message));
      }
      return Err(LlmError::Api(format!("HTTP {}: {}", status, body)));
    }

    let parsed: GenerateResponse =
      serde_json::from_str(&body).map_err(|e| LlmError::Parse(e.to_string()))?;

    parsed
      .candidates
      .into_iter()
      .next()
      .and_then(|c| c.content)
      .and_then(|c| c.parts.into_iter().find_map(|p| p.text))
      .ok_or_else(|| LlmError::Parse("No text content in response".to_string()))
  }
}

impl WorkoutGenerator for GeminiClient {
  async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
    self.complete(prompt).await
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
