use crate::agent::wire::{GenerateContentRequest, GenerateContentResponse};
use crate::chat::StructuredResponse;
use crate::config::Config;
use crate::fallback;
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, warn};

/// Seam between the session state machine and the network. The engine and
/// its tests only ever see this trait, so a scripted substitute can stand in
/// for the remote service.
#[async_trait]
pub trait AnswerBackend: Send + Sync {
    /// Produce a structured answer for `query` grounded in `corpus`.
    ///
    /// Never fails from the caller's perspective: all remote trouble is
    /// absorbed and resolves to a canned answer for the same query.
    async fn fetch_answer(&self, query: &str, corpus: &str) -> StructuredResponse;
}

pub struct AnswerClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl AnswerClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            endpoint: config.api_endpoint.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn compose_prompt(query: &str, corpus: &str) -> String {
        format!(
            "You are a helpful assistant for Binary Semantics. Answer the user's query based on the provided scraped website content.\n\n\
             Website Content:\n{corpus}\n\n\
             User Query: {query}\n\n\
             Provide a structured response."
        )
    }

    /// The fallible inner call: one request, strict schema, parsed payload.
    /// Every error path here funnels into the fallback in `fetch_answer`.
    async fn generate(&self, query: &str, corpus: &str) -> Result<StructuredResponse> {
        let api_key = self
            .api_key
            .as_deref()
            .context("No API credential configured")?;

        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.endpoint, self.model, api_key
        );
        let request = GenerateContentRequest::structured(Self::compose_prompt(query, corpus));

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Request to generative service failed")?
            .error_for_status()
            .context("Generative service returned an error status")?;

        let payload: GenerateContentResponse = response
            .json()
            .await
            .context("Failed to decode generative service payload")?;

        let text = payload
            .first_text()
            .context("No candidate text in generative service payload")?;

        serde_json::from_str(text).context("Candidate text does not match the answer schema")
    }
}

#[async_trait]
impl AnswerBackend for AnswerClient {
    async fn fetch_answer(&self, query: &str, corpus: &str) -> StructuredResponse {
        match self.generate(query, corpus).await {
            Ok(answer) => {
                debug!("Structured answer received for query: {}", query);
                answer
            }
            Err(e) => {
                warn!("Structured answer call failed, using canned response: {:#}", e);
                fallback::select(query)
            }
        }
    }
}
