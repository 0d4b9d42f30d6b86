use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct TranslateRequest<'a> {
    pub q: &'a str,
    pub source: &'a str,
    pub target: &'a str,
    pub format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateResponse {
    pub translated_text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DetectRequest<'a> {
    pub q: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<&'a str>,
}

/// One candidate from `/detect`, which returns them best-first.
#[derive(Debug, Deserialize)]
pub struct Detection {
    pub language: String,
    #[serde(default)]
    pub confidence: f64,
}

/// Error body returned with non-2xx statuses.
#[derive(Debug, Deserialize)]
pub struct ApiError {
    pub error: Option<String>,
}
