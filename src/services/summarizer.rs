use crate::config::AppConfig;
use crate::models::{SummarizationResult, SummaryServiceRequest, SummaryServiceResponse};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("Summarization service did not respond within {0:?}")]
    Timeout(Duration),

    #[error("Summarization service responded with status {0}")]
    Status(StatusCode),

    #[error("Summarization request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Summarization response could not be decoded: {0}")]
    Decode(#[source] reqwest::Error),
}

/// Asks an external service to summarize a stored document.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Never fails: every error is folded into `success: false` with all
    /// content fields empty.
    async fn summarize(&self, public_key_pem: &str, storage_location: &str) -> SummarizationResult;
}

/// [`Summarizer`] that POSTs to an HTTP endpoint with a fixed deadline. One
/// attempt per call.
pub struct HttpSummarizer {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpSummarizer {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            timeout,
        })
    }

    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        Self::new(config.summarizer_url.clone(), config.summarizer_timeout)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn request(
        &self,
        public_key_pem: &str,
        storage_location: &str,
    ) -> Result<SummaryServiceResponse, SummarizeError> {
        let body = SummaryServiceRequest {
            pdf_doc_path: storage_location,
            public_key_pem,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify(e, SummarizeError::Transport))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SummarizeError::Status(status));
        }

        response
            .json::<SummaryServiceResponse>()
            .await
            .map_err(|e| self.classify(e, SummarizeError::Decode))
    }

    fn classify(
        &self,
        err: reqwest::Error,
        otherwise: fn(reqwest::Error) -> SummarizeError,
    ) -> SummarizeError {
        if err.is_timeout() {
            SummarizeError::Timeout(self.timeout)
        } else {
            otherwise(err)
        }
    }
}

#[async_trait]
impl Summarizer for HttpSummarizer {
    async fn summarize(&self, public_key_pem: &str, storage_location: &str) -> SummarizationResult {
        match self.request(public_key_pem, storage_location).await {
            Ok(response) => {
                let result = SummarizationResult::from(response);
                tracing::info!(
                    location = %storage_location,
                    result_location = ?result.result_location,
                    "Summary ready"
                );
                result
            }
            Err(e) => {
                match &e {
                    SummarizeError::Timeout(_) => {
                        tracing::warn!(location = %storage_location, "{}", e)
                    }
                    _ => tracing::error!(location = %storage_location, "{}", e),
                }
                let timed_out = matches!(e, SummarizeError::Timeout(_));
                SummarizationResult {
                    timed_out,
                    ..SummarizationResult::failure(e.to_string())
                }
            }
        }
    }
}
