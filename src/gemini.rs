use crate::config::Config;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, info};

const TEMPERATURE: f32 = 0.4;
const TOP_K: u32 = 32;
const TOP_P: f32 = 1.0;
const MAX_OUTPUT_TOKENS: u32 = 2048;
const GENERATE_CONTENT_METHOD: &str = "generateContent";

/// Failure of a single generation call. `Display` is the text shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("Please configure your API key in settings.")]
    MissingApiKey,
    #[error("Error: {message}<br><br>Endpoint: {endpoint}")]
    Rejected {
        status: u16,
        message: String,
        endpoint: String,
    },
    #[error("Error connecting to Gemini API. Please check your internet connection and API key.")]
    Transport(String),
    #[error("Error: Unexpected response from Gemini API.")]
    MalformedResponse,
}

/// Anything that turns a prompt into generated text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, api_key: &str) -> Result<String, GenerationError>;

    /// Models usable for generation, for operator inspection.
    async fn list_models(&self, _api_key: &str) -> Result<Vec<ModelInfo>> {
        Ok(Vec::new())
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CandidateContent {
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelInfo {
    pub name: String,
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    #[serde(default)]
    models: Vec<ModelData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelData {
    name: String,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_base: String,
    api_version: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_base: &str, api_version: &str, model: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            api_version: api_version.to_string(),
            model: model.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.api_base, &config.api_version, &config.model)
    }

    /// Generation URL without credentials, safe to show and log.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/{}/models/{}:{}",
            self.api_base, self.api_version, self.model, GENERATE_CONTENT_METHOD
        )
    }

    fn models_url(&self) -> String {
        format!("{}/{}/models", self.api_base, self.api_version)
    }

    /// Lists the models that support content generation. Diagnostic only.
    pub async fn fetch_models(&self, api_key: &str) -> Result<Vec<ModelInfo>> {
        if api_key.trim().is_empty() {
            return Err(anyhow!("API key is empty"));
        }
        let start = Instant::now();
        debug!("Fetching models from Gemini");

        let response = self
            .http
            .get(self.models_url())
            .query(&[("key", api_key)])
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .context("send Gemini models request")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(reqwest::Error::without_url)
            .context("read models response body")?;
        let duration_ms = start.elapsed().as_millis();

        if !status.is_success() {
            error!(
                status = %status,
                duration_ms,
                body_preview = %preview(&body, 400),
                "Gemini models request failed"
            );
            return Err(anyhow!("Gemini error {}: {}", status, body));
        }

        info!(status = %status, duration_ms, "Gemini models response received");

        let parsed: ModelsResponse = serde_json::from_str(&body).context("parse models response")?;
        let models: Vec<ModelInfo> = parsed
            .models
            .into_iter()
            .filter(|m| {
                m.supported_generation_methods
                    .iter()
                    .any(|method| method == GENERATE_CONTENT_METHOD)
            })
            .map(|m| ModelInfo {
                name: m.name,
                display_name: m.display_name,
            })
            .collect();

        for model in &models {
            info!(model = %model.name, "Model supports generateContent");
        }
        info!(count = models.len(), "Models parsed successfully");
        Ok(models)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn list_models(&self, api_key: &str) -> Result<Vec<ModelInfo>> {
        self.fetch_models(api_key).await
    }

    async fn generate(&self, prompt: &str, api_key: &str) -> Result<String, GenerationError> {
        if api_key.trim().is_empty() {
            return Err(GenerationError::MissingApiKey);
        }

        let endpoint = self.endpoint();
        info!(
            endpoint = %endpoint,
            prompt_len = prompt.len(),
            prompt_preview = %preview(prompt, 200),
            "Gemini request prepared"
        );
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                top_k: TOP_K,
                top_p: TOP_P,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };

        let start = Instant::now();
        let response = match self
            .http
            .post(&endpoint)
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let e = e.without_url();
                error!(
                    error = %e,
                    elapsed_ms = start.elapsed().as_millis(),
                    "Gemini request failed"
                );
                return Err(GenerationError::Transport(e.to_string()));
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                let e = e.without_url();
                error!(
                    error = %e,
                    status = %status,
                    elapsed_ms = start.elapsed().as_millis(),
                    "Gemini response read failed"
                );
                return Err(GenerationError::Transport(e.to_string()));
            }
        };
        let duration_ms = start.elapsed().as_millis();

        if !status.is_success() {
            error!(
                status = %status,
                duration_ms,
                endpoint = %endpoint,
                body_preview = %preview(&body, 400),
                "Gemini request rejected"
            );
            return Err(GenerationError::Rejected {
                status: status.as_u16(),
                message: rejection_message(&body),
                endpoint,
            });
        }

        info!(status = %status, duration_ms, "Gemini response received");

        let value: serde_json::Value = match serde_json::from_str(&body) {
            Ok(value) => value,
            Err(e) => {
                error!(
                    error = %e,
                    body_preview = %preview(&body, 400),
                    "Gemini response parse failed"
                );
                return Err(GenerationError::Transport(e.to_string()));
            }
        };

        let text = match extract_text(value) {
            Some(text) => text,
            None => {
                error!(
                    body_preview = %preview(&body, 400),
                    "Gemini response missing candidate text"
                );
                return Err(GenerationError::MalformedResponse);
            }
        };

        debug!(
            response_len = text.len(),
            response_preview = %preview(&text, 400),
            "Gemini response parsed"
        );
        Ok(text)
    }
}

fn rejection_message(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|parsed| parsed.error.message)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| "Failed to fetch data. Please check your API key.".to_string())
}

fn extract_text(value: serde_json::Value) -> Option<String> {
    let parsed: GenerateResponse = serde_json::from_value(value).ok()?;
    parsed
        .candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .next()?
        .text
}

fn preview(input: &str, limit: usize) -> String {
    let cleaned = input.replace(['\n', '\r'], " ");
    let mut out: String = cleaned.chars().take(limit).collect();
    if cleaned.chars().nth(limit).is_some() {
        out.push_str("...");
    }
    out
}
