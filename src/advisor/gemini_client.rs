use governor::{DefaultDirectRateLimiter, Quota};
use nonzero_ext::*;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::types::{GenerateContentRequest, GenerateContentResponse};
use crate::config::Config;
use crate::error::{DashboardError, Result};

const API_KEY_HEADER: &str = "x-goog-api-key";

struct GeminiRateLimiter {
    rate_limiter: Arc<DefaultDirectRateLimiter>,
}

impl reqwest_ratelimit::RateLimiter for GeminiRateLimiter {
    async fn acquire_permit(&self) {
        self.rate_limiter.until_ready().await;
    }
}

/// Client for the Gemini `generateContent` endpoint
#[derive(Clone)]
pub struct GeminiClient {
    http_client: ClientWithMiddleware,
    endpoint: Url,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let reqwest_client = reqwest_middleware::reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(Duration::from_millis(500), Duration::from_secs(4))
            .build_with_max_retries(3);

        let rate_limiter = GeminiRateLimiter {
            rate_limiter: Arc::new(DefaultDirectRateLimiter::direct(Quota::per_second(nonzero!(1u32)))),
        };

        let http_client = ClientBuilder::new(reqwest_client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .with(reqwest_ratelimit::all(rate_limiter))
            .build();

        Ok(Self {
            http_client,
            endpoint: generate_content_url(&config.gemini_base_url, &config.gemini_model)?,
            api_key: config.gemini_api_key.clone(),
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Sends `prompt` as a single user turn and returns the model's text
    #[instrument(skip(self, prompt), fields(prompt_chars = prompt.chars().count(), on_close = true))]
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let api_key = self.api_key.as_deref().ok_or(DashboardError::MissingApiKey)?;

        let response = self
            .http_client
            .post(self.endpoint.clone())
            .header(API_KEY_HEADER, api_key)
            .json(&GenerateContentRequest::from_prompt(prompt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "Gemini request rejected");
            return Err(DashboardError::Api(format!("{}: {}", status, body)));
        }

        let response: GenerateContentResponse = response.json().await?;
        debug!(?response, "Received Gemini response");

        match response.text() {
            Some(text) => {
                info!(chars = text.chars().count(), "Received Gemini recommendation");
                Ok(text)
            }
            None => {
                let reason = response
                    .prompt_feedback
                    .and_then(|f| f.block_reason)
                    .or_else(|| response.candidates.first().and_then(|c| c.finish_reason.clone()))
                    .unwrap_or_else(|| "empty response".to_string());
                Err(DashboardError::Api(reason))
            }
        }
    }
}

/// `{base}/v1beta/models/{model}:generateContent`
fn generate_content_url(base_url: &str, model: &str) -> Result<Url> {
    let mut base = base_url.trim().to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    Url::parse(&base)
        .and_then(|url| url.join(&format!("v1beta/models/{}:generateContent", model)))
        .map_err(|e| DashboardError::input("Gemini base URL", base_url, e.to_string()))
}
