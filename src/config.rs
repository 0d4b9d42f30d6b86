use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::corpus::DetectionBand;
use crate::index::Bm25Params;

const DEFAULT_DOCS_DIR: &str = "docs";
const DEFAULT_PATTERN: &str = "*.txt";
const DEFAULT_TOP_K: usize = 3;
const DEFAULT_READ_CONCURRENCY: usize = 8;
const DEFAULT_TRANSLATE_CONCURRENCY: usize = 4;
const DEFAULT_TRANSLATE_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(500);

#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Settings for the remote translation collaborator.
#[derive(Debug, Clone)]
pub struct TranslationConfig {
    /// Base URL of a LibreTranslate-compatible server. `None` disables translation.
    pub api_url: Option<String>,
    pub api_key: Option<ApiKey>,
    /// Maximum keyword translations in flight at once.
    pub concurrency: usize,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Attempts per call, including the first.
    pub max_retries: u32,
    pub initial_backoff: Duration,
    /// Strip punctuation before detection and submission.
    pub sanitize: bool,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            api_key: None,
            concurrency: DEFAULT_TRANSLATE_CONCURRENCY,
            timeout: DEFAULT_TRANSLATE_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            sanitize: true,
        }
    }
}

/// Search session configuration.
///
/// Environment variables:
/// - `DOCSEARCH_DOCS_DIR`: corpus folder (default `docs`)
/// - `DOCSEARCH_PATTERN`: file glob (default `*.txt`)
/// - `DOCSEARCH_TOP_K`: results per query (default 3)
/// - `DOCSEARCH_BM25_K1` / `DOCSEARCH_BM25_B`: BM25 tunables (default 1.5 / 0.75)
/// - `DOCSEARCH_REBUILD`: rebuild the index for every query (default false)
/// - `TRANSLATE_API_URL` / `TRANSLATE_API_KEY`: translation server (optional)
/// - `TRANSLATE_CONCURRENCY`, `TRANSLATE_TIMEOUT_SECS`, `TRANSLATE_MAX_RETRIES`,
///   `TRANSLATE_SANITIZE`
#[derive(Debug, Clone)]
pub struct Config {
    pub docs_dir: PathBuf,
    pub pattern: String,
    pub top_k: usize,
    pub bm25: Bm25Params,
    pub detection_band: DetectionBand,
    pub rebuild_per_query: bool,
    pub read_concurrency: usize,
    pub translation: TranslationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            docs_dir: PathBuf::from(DEFAULT_DOCS_DIR),
            pattern: DEFAULT_PATTERN.to_string(),
            top_k: DEFAULT_TOP_K,
            bm25: Bm25Params::default(),
            detection_band: DetectionBand::default(),
            rebuild_per_query: false,
            read_concurrency: DEFAULT_READ_CONCURRENCY,
            translation: TranslationConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable source; malformed values fall back
    /// to defaults with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let bm25 = Bm25Params {
            k1: parse_checked(
                &var,
                "DOCSEARCH_BM25_K1",
                defaults.bm25.k1,
                Bm25Params::valid_k1,
            ),
            b: parse_checked(&var, "DOCSEARCH_BM25_B", defaults.bm25.b, Bm25Params::valid_b),
        };

        let translation = TranslationConfig {
            api_url: var("TRANSLATE_API_URL"),
            api_key: var("TRANSLATE_API_KEY").map(ApiKey),
            concurrency: parse_or(
                &var,
                "TRANSLATE_CONCURRENCY",
                defaults.translation.concurrency,
            )
            .max(1),
            timeout: Duration::from_secs(parse_or(
                &var,
                "TRANSLATE_TIMEOUT_SECS",
                defaults.translation.timeout.as_secs(),
            )),
            max_retries: parse_or(
                &var,
                "TRANSLATE_MAX_RETRIES",
                defaults.translation.max_retries,
            )
            .max(1),
            initial_backoff: defaults.translation.initial_backoff,
            sanitize: parse_or(&var, "TRANSLATE_SANITIZE", defaults.translation.sanitize),
        };

        Self {
            docs_dir: var("DOCSEARCH_DOCS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.docs_dir),
            pattern: var("DOCSEARCH_PATTERN").unwrap_or(defaults.pattern),
            top_k: parse_or(&var, "DOCSEARCH_TOP_K", defaults.top_k),
            bm25,
            detection_band: defaults.detection_band,
            rebuild_per_query: parse_or(&var, "DOCSEARCH_REBUILD", defaults.rebuild_per_query),
            read_concurrency: defaults.read_concurrency,
            translation,
        }
    }
}

fn parse_or<T: FromStr>(var: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> T {
    match var(name) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(variable = name, value = %raw, "ignoring malformed setting");
            default
        }),
        None => default,
    }
}

/// Like `parse_or`, but a parsed value failing `valid` also falls back.
fn parse_checked<T: FromStr + Copy + std::fmt::Display>(
    var: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
    valid: impl Fn(T) -> bool,
) -> T {
    let value = parse_or(var, name, default);
    if valid(value) {
        value
    } else {
        warn!(variable = name, value = %value, "setting out of range, using default");
        default
    }
}
