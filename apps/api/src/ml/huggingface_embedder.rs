use crate::error::{ApiError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

// Text processing limits
const MAX_TEXT_PREVIEW_LENGTH: usize = 100;

/// Turns text into an embedding vector
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn encode(&self, text: &str) -> Result<Vec<f32>>;
}

#[derive(Clone)]
pub struct HuggingFaceEmbedder {
    client: Client,
    api_key: String,
    model_url: String,
    model_name: String,
}

impl HuggingFaceEmbedder {
    /// Creates a client for the HuggingFace feature-extraction inference API
    pub fn new(
        api_key: &str,
        base_url: &str,
        model_name: &str,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(ApiError::ConfigError(
                "HuggingFace API key is empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .pool_max_idle_per_host(10)
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .build()
            .map_err(|e| ApiError::InternalError(format!("Failed to create HTTP client: {}", e)))?;

        let model_url = format!("{}/models/{}", base_url.trim_end_matches('/'), model_name);
        debug!("HuggingFace model URL: {}", model_url);

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            model_url,
            model_name: model_name.to_string(),
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn make_api_request(&self, input: &str) -> Result<reqwest::Response> {
        #[derive(Serialize)]
        struct Request<'a> {
            inputs: &'a str,
            options: Options,
        }

        #[derive(Serialize)]
        struct Options {
            wait_for_model: bool,
            use_cache: bool,
        }

        let request = Request {
            inputs: input,
            options: Options {
                wait_for_model: true,
                use_cache: true,
            },
        };

        let response = self
            .client
            .post(&self.model_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ApiError::Timeout(format!("Embedding request timed out: {}", e))
                } else {
                    ApiError::ModelError(format!("Failed to send request to model API: {}", e))
                }
            })?;

        Ok(response)
    }

    async fn process_api_response(&self, response: reqwest::Response) -> Result<Vec<f32>> {
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            return Err(match status.as_u16() {
                404 => ApiError::ModelError(format!(
                    "Model not found: {}. Please check the model name in your configuration.",
                    self.model_name
                )),
                401 | 403 => ApiError::ModelError(
                    "Authentication failed. Please check your HuggingFace API key.".to_string(),
                ),
                429 => ApiError::ModelError("HuggingFace rate limit exceeded".to_string()),
                _ => ApiError::ModelError(format!(
                    "HuggingFace API returned non-success status: {} - {}",
                    status, text
                )),
            });
        }

        let response_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ApiError::ModelError(format!("Failed to parse response as JSON: {}", e)))?;

        let embedding = extract_embedding(response_json)?;
        debug!(
            "Got embedding of size {} from HuggingFace API",
            embedding.len()
        );

        Ok(normalize_vector(&embedding))
    }
}

#[async_trait]
impl Embedder for HuggingFaceEmbedder {
    async fn encode(&self, text: &str) -> Result<Vec<f32>> {
        let preview_end = text
            .char_indices()
            .nth(MAX_TEXT_PREVIEW_LENGTH)
            .map(|(i, _)| i)
            .unwrap_or(text.len());
        debug!(
            "Encoding text (length: {}): {}{}",
            text.len(),
            &text[..preview_end],
            if preview_end < text.len() { "..." } else { "" }
        );

        let response = self.make_api_request(text.trim()).await?;
        self.process_api_response(response).await
    }
}

/// Pull the embedding out of the response shapes the inference API returns:
/// `[f32]`, `[[f32]]`, `{"embedding": [f32]}` or `{"embeddings": [[f32]]}`
fn extract_embedding(value: serde_json::Value) -> Result<Vec<f32>> {
    #[derive(Debug, Deserialize, Default)]
    struct EmbeddingResponse {
        #[serde(default)]
        embeddings: Vec<Vec<f32>>,

        #[serde(default)]
        embedding: Vec<f32>,
    }

    let to_floats = |values: &[serde_json::Value]| -> Vec<f32> {
        values
            .iter()
            .filter_map(|v| v.as_f64().map(|f| f as f32))
            .collect()
    };

    let embedding = match value {
        serde_json::Value::Array(array) => match array.first() {
            None => {
                return Err(ApiError::ModelError(
                    "Received empty array from model".to_string(),
                ))
            }
            Some(serde_json::Value::Array(first)) => to_floats(first),
            Some(_) => to_floats(&array),
        },
        serde_json::Value::Object(_) => {
            let parsed: EmbeddingResponse = serde_json::from_value(value).map_err(|e| {
                ApiError::ModelError(format!("Failed to parse embedding response: {}", e))
            })?;

            if !parsed.embedding.is_empty() {
                parsed.embedding
            } else {
                parsed.embeddings.into_iter().next().unwrap_or_default()
            }
        }
        _ => Vec::new(),
    };

    if embedding.is_empty() {
        return Err(ApiError::ModelError(
            "Failed to extract embedding from response".to_string(),
        ));
    }

    Ok(embedding)
}

/// Normalize a vector to unit length
fn normalize_vector(vector: &[f32]) -> Vec<f32> {
    let magnitude = vector.iter().map(|&x| x * x).sum::<f32>().sqrt();

    if magnitude > 0.0 {
        vector.iter().map(|&x| x / magnitude).collect()
    } else {
        vec![0.0; vector.len()]
    }
}
