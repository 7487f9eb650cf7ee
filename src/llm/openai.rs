use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use super::{CompletionProvider, CompletionRequest};
use crate::config::LlmConfig;
use crate::{CuratorError, Result};

/// Client for an OpenAI compatible `/chat/completions` endpoint
pub struct OpenAiClient {
    client: ClientWithMiddleware,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(concat!("TravelCurator/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CuratorError::config(format!("Failed to create HTTP client: {e}")))?;

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let client = ClientBuilder::new(http)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: config.resolve_api_key(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    fn name(&self) -> &str {
        "openai"
    }

    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            CuratorError::config("No API key configured. Set OPENAI_API_KEY or llm.api_key.")
        })?;

        let body = serde_json::to_string(request)
            .map_err(|e| CuratorError::api(format!("Failed to encode request: {e}")))?;
        debug!("Completion request body: {}", body);

        let start_time = Instant::now();
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        debug!("Raw completion response ({}): {}", status, text);

        if !status.is_success() {
            warn!("Completion endpoint returned {}", status);
            return Err(CuratorError::api_status(status.as_u16(), text));
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| CuratorError::api(format!("Failed to parse completion response: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(CuratorError::EmptyCompletion)?;

        info!(
            "Completion received in {:.3}s ({} chars)",
            start_time.elapsed().as_secs_f64(),
            content.len()
        );
        Ok(content)
    }
}
