use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::types::{ApiError, DetectRequest, Detection, TranslateRequest, TranslateResponse};
use crate::config::{ApiKey, TranslationConfig};

#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    #[error("TRANSLATE_API_URL not set; translation disabled")]
    ApiUrlNotSet,

    #[error("invalid translation endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    #[error("translation rate limit exceeded")]
    RateLimited,

    #[error("translation forbidden: {0}")]
    Forbidden(String),

    #[error("translation API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("unexpected translation response: {0}")]
    Decode(String),
}

/// Remote language services: detection and translation by language code.
/// Implemented by `HttpTranslator` for production; mock implementations used in tests.
pub trait TranslationClient {
    async fn detect_language(&self, text: &str) -> Result<String, TranslateError>;

    /// `source` may be `"auto"` to let the remote side detect it.
    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, TranslateError>;
}

/// Client for a LibreTranslate-compatible HTTP API.
#[derive(Clone, Debug)]
pub struct HttpTranslator {
    http: Client,
    base_url: String,
    api_key: Option<ApiKey>,
    timeout: Duration,
    max_retries: u32,
    initial_backoff: Duration,
}

impl HttpTranslator {
    pub fn from_config(http: Client, config: &TranslationConfig) -> Result<Self, TranslateError> {
        let raw = config
            .api_url
            .as_deref()
            .ok_or(TranslateError::ApiUrlNotSet)?;
        let base_url = url::Url::parse(raw)?;
        Ok(Self {
            http,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            timeout: config.timeout,
            max_retries: config.max_retries.max(1),
            initial_backoff: config.initial_backoff,
        })
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: None,
            timeout: Duration::from_secs(5),
            max_retries: 3,
            initial_backoff: Duration::from_millis(1),
        }
    }

    #[cfg(test)]
    pub(crate) fn request_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[cfg(test)]
    pub(crate) fn api_key(mut self, key: &str) -> Self {
        self.api_key = Some(ApiKey::new(key));
        self
    }

    fn key(&self) -> Option<&str> {
        self.api_key.as_ref().map(ApiKey::expose)
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, TranslateError> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .http
            .post(&url)
            .header("User-Agent", crate::USER_AGENT)
            .json(body)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!("translation API rate limited");
            return Err(TranslateError::RateLimited);
        }

        let text = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<ApiError>(&text)
                .ok()
                .and_then(|e| e.error)
                .unwrap_or_else(|| {
                    let end = text.floor_char_boundary(200);
                    format!("HTTP {status}: {}", &text[..end])
                });
            if status == reqwest::StatusCode::FORBIDDEN {
                return Err(TranslateError::Forbidden(message));
            }
            warn!(status = %status, "translation API error");
            return Err(TranslateError::Api {
                code: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&text).map_err(|e| TranslateError::Decode(e.to_string()))
    }

    async fn with_retry<T, F, Fut>(&self, mut call: F) -> Result<T, TranslateError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TranslateError>>,
    {
        let mut last_err = None;
        for attempt in 0..self.max_retries {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if is_retriable(&e) => {
                    last_err = Some(e);
                    if attempt + 1 < self.max_retries {
                        let delay_ms = jittered_backoff(self.initial_backoff, attempt);
                        debug!(
                            attempt = attempt + 1,
                            delay_ms, "retrying translation after transient error"
                        );
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    }
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_err.unwrap_or(TranslateError::RateLimited))
    }
}

impl TranslationClient for HttpTranslator {
    async fn detect_language(&self, text: &str) -> Result<String, TranslateError> {
        let body = DetectRequest {
            q: text,
            api_key: self.key(),
        };
        let body = &body;
        let detections: Vec<Detection> = self
            .with_retry(move || self.post("/detect", body))
            .await?;
        let best = detections
            .into_iter()
            .next()
            .ok_or_else(|| TranslateError::Decode("empty detection list".to_string()))?;
        debug!(language = %best.language, confidence = best.confidence, "remote detection");
        Ok(best.language)
    }

    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, TranslateError> {
        let body = TranslateRequest {
            q: text,
            source,
            target,
            format: "text",
            api_key: self.key(),
        };
        let body = &body;
        let response: TranslateResponse = self
            .with_retry(move || self.post("/translate", body))
            .await?;
        response
            .translated_text
            .ok_or_else(|| TranslateError::Decode("missing translatedText".to_string()))
    }
}

fn is_retriable(e: &TranslateError) -> bool {
    match e {
        TranslateError::RateLimited
        | TranslateError::Api {
            code: 500..=599, ..
        } => true,
        TranslateError::Network(err) => err.is_timeout() || err.is_connect(),
        _ => false,
    }
}

/// Equal jitter backoff: base/2 + rand(0, base/2).
fn jittered_backoff(initial: Duration, attempt: u32) -> u64 {
    let base = (initial.as_millis() as u64).saturating_mul(2u64.saturating_pow(attempt));
    let half = base / 2;
    half + fastrand::u64(..half.max(1))
}
