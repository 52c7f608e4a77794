use crate::config::{Config, GenerationConfig};
use crate::error::{DocChatError, Result};
use crate::models::*;
use reqwest::Client;
use std::future::Future;

/// Anything that can turn a composed query into assistant text.
pub trait Completion {
    fn complete(&self, request: &QueryRequest) -> impl Future<Output = Result<String>> + Send;
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
///
/// One HTTP call per question. Failures are classified and returned; there
/// is no retry.
pub struct OpenAiService {
    client: Client,
    api_key: String,
    base_url: String,
    generation: GenerationConfig,
}

impl OpenAiService {
    pub fn new(config: &Config) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: &Config) -> Self {
        Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            generation: config.generation.clone(),
        }
    }

    pub async fn send(&self, request: &QueryRequest) -> Result<String> {
        let body = CompletionRequest {
            model: &self.generation.model,
            messages: &request.messages,
            temperature: self.generation.temperature,
            max_tokens: self.generation.max_tokens,
        };

        let url = format!("{}/chat/completions", self.base_url);
        log::info!(
            "Requesting completion from {} (model {}, document v{})",
            self.base_url,
            self.generation.model,
            request.document_version
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(DocChatError::ProviderError(format!("HTTP {}: {}", status, error_text)));
        }

        let completion: CompletionResponse = response.json().await?;
        first_choice_text(completion)
    }
}

impl Completion for OpenAiService {
    async fn complete(&self, request: &QueryRequest) -> Result<String> {
        self.send(request).await
    }
}

/// Reads `choices[0]`. A choice with no content is treated as an empty
/// answer rather than a failure.
pub fn first_choice_text(response: CompletionResponse) -> Result<String> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or(DocChatError::EmptyResponse)?;

    Ok(choice.message.content.unwrap_or_default().trim().to_string())
}
