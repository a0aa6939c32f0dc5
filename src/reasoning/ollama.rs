//! Ollama-compatible inference backend
//!
//! Talks to a locally hosted runtime over its HTTP API. Availability is
//! probed at construction so a misconfigured endpoint fails fast instead of
//! on the first page.

use crate::config::LlmConfig;
use crate::error::{Result, VigilError};
use crate::reasoning::{prompt, LlmEngine};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f64,
    num_ctx: usize,
    num_predict: usize,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// LLM backend speaking the Ollama generate API
pub struct OllamaEngine {
    client: Client,
    endpoint: String,
    model: String,
    temperature: f64,
    context_window: usize,
    max_tokens: usize,
}

impl OllamaEngine {
    /// Connects to the configured endpoint, probing that it is reachable
    pub async fn connect(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            // Local generation on CPU can be slow; allow generous time per call
            .timeout(Duration::from_secs(300))
            .build()?;

        let endpoint = config.endpoint.trim_end_matches('/').to_string();

        let probe = client
            .get(format!("{endpoint}/api/tags"))
            .timeout(Duration::from_secs(5))
            .send()
            .await;
        match probe {
            Ok(response) if response.status().is_success() => {
                info!("LLM runtime reachable at {endpoint} (model: {})", config.model);
            }
            Ok(response) => {
                return Err(VigilError::LlmUnavailable(format!(
                    "{endpoint} answered with status {}",
                    response.status()
                )));
            }
            Err(e) => {
                return Err(VigilError::LlmUnavailable(format!(
                    "{endpoint} not reachable: {e}"
                )));
            }
        }

        Ok(Self {
            client,
            endpoint,
            model: config.model.clone(),
            temperature: config.temperature,
            context_window: config.context_window,
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl LlmEngine for OllamaEngine {
    async fn generate(&self, request_prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            model: &self.model,
            prompt: request_prompt,
            system: prompt::SYSTEM_PROMPT,
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
                num_ctx: self.context_window,
                num_predict: self.max_tokens,
            },
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.endpoint))
            .json(&request)
            .send()
            .await
            .map_err(|e| VigilError::LlmError(format!("generate request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VigilError::LlmError(format!(
                "generate returned {status}: {body}"
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| VigilError::LlmError(format!("malformed generate response: {e}")))?;

        debug!("Model returned {} chars", parsed.response.len());
        Ok(parsed.response)
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
