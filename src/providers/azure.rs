use std::time::Duration;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, StatusCode, header};
use log::{debug, error};

use crate::app_config::SpeechConfig;
use crate::errors::ProviderError;
use crate::providers::SpeechProvider;
use crate::voice::VoiceId;

const USER_AGENT: &str = concat!("narrator/", env!("CARGO_PKG_VERSION"));

/// Azure client for the Cognitive Services text-to-speech REST API
#[derive(Debug)]
pub struct AzureSpeech {
    /// HTTP client for API requests
    client: Client,
    /// Subscription key
    api_key: String,
    /// Full synthesis URL
    endpoint: String,
    /// Audio encoding requested from the service
    output_format: String,
}

impl AzureSpeech {
    /// Create a new Azure client
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, output_format: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            output_format: output_format.into(),
        }
    }

    /// Create a client from the speech section of the configuration
    pub fn from_config(config: &SpeechConfig) -> Self {
        Self::new(
            config.api_key.clone(),
            config.get_endpoint(),
            config.output_format.clone(),
            config.timeout_secs,
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Wrap narration text in the SSML document the service expects
    pub fn build_ssml(text: &str, voice: &VoiceId) -> String {
        format!(
            "<speak version='1.0' xml:lang='{}'><voice name='{}'>{}</voice></speak>",
            voice.locale(),
            escape_xml(&voice.to_string()),
            escape_xml(text)
        )
    }

    fn map_status(status: StatusCode, retry_after_secs: Option<u64>, body: String) -> ProviderError {
        let message = if body.trim().is_empty() {
            status.canonical_reason().unwrap_or("no details").to_string()
        } else {
            body
        };
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::AuthenticationError(message),
            StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimitExceeded { message, retry_after_secs },
            _ => ProviderError::ApiError { status_code: status.as_u16(), message },
        }
    }
}

#[async_trait]
impl SpeechProvider for AzureSpeech {
    async fn synthesize(&self, text: &str, voice: &VoiceId) -> Result<Bytes, ProviderError> {
        let ssml = Self::build_ssml(text, voice);
        debug!("Azure synthesis request: {} chars of SSML for {}", ssml.len(), voice);

        let response = self.client.post(&self.endpoint)
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .header(header::CONTENT_TYPE, "application/ssml+xml")
            .header("X-Microsoft-OutputFormat", &self.output_format)
            .header(header::USER_AGENT, USER_AGENT)
            .body(ssml)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    ProviderError::ConnectionError(e.to_string())
                } else {
                    ProviderError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after_secs = response.headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            let error_text = response.text().await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Azure speech API error ({}): {}", status, error_text);
            return Err(Self::map_status(status, retry_after_secs, error_text));
        }

        let audio = response.bytes().await
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to read audio stream: {}", e)))?;
        if audio.is_empty() {
            return Err(ProviderError::EmptyAudio);
        }
        Ok(audio)
    }

    fn name(&self) -> &str {
        "azure"
    }
}

/// Escape the five XML special characters
pub fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
