//! Gemini API client.
//!
//! Discovery walks the stable API variant before the beta one and stops at
//! the first variant that reports at least one `generateContent`-capable
//! model. Generation posts the prompt with bounded output and low
//! temperature, and extracts the concatenated text parts of the first
//! candidate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{GenerativeBackend, ModelDescriptor};
use crate::config::GenAiConfig;
use crate::error::SummarizeError;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const API_VARIANTS: &[&str] = &["v1", "v1beta"];
const GENERATE_METHOD: &str = "generateContent";
// The credential travels in this header, never in the URL: reqwest error
// strings include the full URL and would leak a query-string key into logs.
const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelInfo {
    name: String,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
}

pub struct GeminiBackend {
    client: reqwest::Client,
    base_url: String,
    temperature: f32,
    max_output_tokens: u32,
}

impl GeminiBackend {
    pub fn new(config: &GenAiConfig) -> anyhow::Result<Self> {
        Self::with_base_url(config, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(config: &GenAiConfig, base_url: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        })
    }

    fn models_url(&self, variant: &str) -> String {
        format!("{}/{}/models", self.base_url, variant)
    }

    fn generate_url(&self, model: &ModelDescriptor) -> String {
        format!(
            "{}/{}/{}:{}",
            self.base_url, model.api_variant, model.name, GENERATE_METHOD
        )
    }

    async fn list_models(
        &self,
        credential: &str,
        variant: &str,
    ) -> Result<Vec<ModelDescriptor>, SummarizeError> {
        let response = self
            .client
            .get(self.models_url(variant))
            .header(API_KEY_HEADER, credential)
            .send()
            .await
            .map_err(|e| SummarizeError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SummarizeError::Transport(e.to_string()))?;

        if !status.is_success() {
            warn!("ListModels on {} failed with status {}", variant, status);
            return Err(SummarizeError::Transport(format!(
                "ListModels {} returned {}",
                variant, status
            )));
        }

        let parsed: ListModelsResponse = serde_json::from_str(&body)
            .map_err(|e| SummarizeError::Transport(format!("Bad ListModels payload: {e}")))?;

        let models: Vec<ModelDescriptor> = parsed
            .models
            .into_iter()
            .filter(|m| {
                m.supported_generation_methods
                    .iter()
                    .any(|method| method == GENERATE_METHOD)
            })
            .map(|m| ModelDescriptor {
                name: m.name,
                api_variant: variant.to_string(),
                supports_generation: true,
            })
            .collect();

        debug!(
            "ListModels on {} returned {} generation-capable model(s)",
            variant,
            models.len()
        );
        Ok(models)
    }
}

#[async_trait]
impl GenerativeBackend for GeminiBackend {
    async fn discover(&self, credential: &str) -> Result<Vec<ModelDescriptor>, SummarizeError> {
        // First variant with a qualifying model wins; later ones are not
        // tried. Transport failures fall through to the next variant.
        for variant in API_VARIANTS {
            match self.list_models(credential, variant).await {
                Ok(models) if !models.is_empty() => {
                    info!(
                        "Discovered {} model(s) via API variant {}",
                        models.len(),
                        variant
                    );
                    return Ok(models);
                }
                Ok(_) => debug!("API variant {} listed no qualifying models", variant),
                Err(e) => warn!("Discovery via {} failed: {}", variant, e),
            }
        }

        Err(SummarizeError::DiscoveryUnavailable)
    }

    async fn generate(
        &self,
        credential: &str,
        model: &ModelDescriptor,
        prompt: &str,
    ) -> Result<String, SummarizeError> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
            },
        };

        let response = self
            .client
            .post(self.generate_url(model))
            .header(API_KEY_HEADER, credential)
            .json(&request)
            .send()
            .await
            .map_err(|e| SummarizeError::Transport(e.to_string()))?;

        let body = response
            .text()
            .await
            .map_err(|e| SummarizeError::Transport(e.to_string()))?;

        let parsed: GenerateResponse = serde_json::from_str(&body)
            .map_err(|e| SummarizeError::Transport(format!("Bad generate payload: {e}")))?;

        if let Some(error) = parsed.error {
            return Err(SummarizeError::Generation(error.message));
        }

        let text = extract_text(&parsed);
        if text.is_empty() {
            return Err(SummarizeError::EmptyGeneration);
        }

        info!("Generated {} chars with {}", text.len(), model.name);
        Ok(text)
    }
}

/// Concatenate all text parts of the first candidate, trimmed.
fn extract_text(response: &GenerateResponse) -> String {
    let Some(content) = response.candidates.first().and_then(|c| c.content.as_ref()) else {
        return String::new();
    };

    content
        .parts
        .iter()
        .filter_map(|p| p.text.as_deref())
        .collect::<String>()
        .trim()
        .to_string()
}
