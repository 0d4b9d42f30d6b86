//! Cross-lingual keyword reconciliation on top of a remote translation service.

pub mod client;
pub mod types;

use std::borrow::Cow;

use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

pub use client::{HttpTranslator, TranslateError, TranslationClient};

use crate::lang::LanguageCode;
use crate::text::{KeywordSet, LanguageDetector, extract_keywords, sanitize};

/// Translator composed from a language detector, an optional remote client
/// and a sanitize-before-send switch.
///
/// Without a client every call is pass-through. Source and target equal is
/// always pass-through and never reaches the client.
pub struct Translator<C, D> {
    client: Option<C>,
    detector: D,
    sanitize: bool,
    concurrency: usize,
}

impl<C: TranslationClient, D: LanguageDetector> Translator<C, D> {
    pub fn new(client: Option<C>, detector: D, sanitize: bool, concurrency: usize) -> Self {
        Self {
            client,
            detector,
            sanitize,
            concurrency: concurrency.max(1),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    #[cfg(test)]
    pub(crate) fn client(&self) -> Option<&C> {
        self.client.as_ref()
    }

    fn prepare<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if self.sanitize {
            Cow::Owned(sanitize(text))
        } else {
            Cow::Borrowed(text)
        }
    }

    /// Detect the language of `text` locally, asking the remote service
    /// when the local detector cannot decide.
    pub async fn detect_source(&self, text: &str) -> LanguageCode {
        let prepared = self.prepare(text);
        let local = self.detector.detect(&prepared);
        if local.is_supported() {
            return local;
        }
        let Some(client) = &self.client else {
            return local;
        };
        match client.detect_language(&prepared).await {
            Ok(code) => LanguageCode::from_code(&code),
            Err(e) => {
                debug!(error = %e, "remote language detection failed");
                LanguageCode::Unsupported
            }
        }
    }

    /// Translate `text` into `target`. A missing `source` is auto-detected.
    pub async fn translate(
        &self,
        text: &str,
        source: Option<LanguageCode>,
        target: LanguageCode,
    ) -> Result<String, TranslateError> {
        let (Some(client), Some(target_code)) = (&self.client, target.code()) else {
            return Ok(text.to_string());
        };
        if source == Some(target) {
            return Ok(text.to_string());
        }

        let prepared = self.prepare(text);
        if prepared.trim().is_empty() {
            return Ok(text.to_string());
        }

        let source = match source {
            Some(lang) if lang.is_supported() => lang,
            _ => self.detect_source(&prepared).await,
        };
        if source == target {
            return Ok(text.to_string());
        }

        let source_code = source.code().unwrap_or("auto");
        debug!(source = source_code, target = target_code, "translating");
        client.translate(&prepared, source_code, target_code).await
    }

    /// Translate each keyword independently into `target`.
    ///
    /// Multi-word translations are split into keywords of the target
    /// language. A keyword whose translation fails is kept as is.
    pub async fn translate_keywords(
        &self,
        keywords: &KeywordSet,
        source: Option<LanguageCode>,
        target: LanguageCode,
    ) -> KeywordSet {
        if !self.is_enabled() || !target.is_supported() || source == Some(target) {
            return keywords.clone();
        }

        let outcomes: Vec<(&String, Result<String, TranslateError>)> = stream::iter(keywords)
            .map(|keyword| async move { (keyword, self.translate(keyword, source, target).await) })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut translated = KeywordSet::new();
        for (keyword, outcome) in outcomes {
            match outcome {
                Ok(text) => {
                    let words = extract_keywords(&text, target);
                    if words.is_empty() {
                        translated.insert(keyword.clone());
                    } else {
                        translated.extend(words);
                    }
                }
                Err(e) => {
                    warn!(
                        keyword = %keyword,
                        source = %source.unwrap_or_default(),
                        target = %target,
                        error = %e,
                        "keyword translation failed, keeping original"
                    );
                    translated.insert(keyword.clone());
                }
            }
        }
        translated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MarkerDetector, MockTranslation};
    use crate::text::StopwordDetector;

    fn set(words: &[&str]) -> KeywordSet {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn translator(client: MockTranslation) -> Translator<MockTranslation, StopwordDetector> {
        Translator::new(Some(client), StopwordDetector, true, 4)
    }

    #[tokio::test]
    async fn same_language_is_identity_without_remote_call() {
        let t = translator(MockTranslation::default().with("kucing", "cat"));
        let out = t
            .translate("kucing", Some(LanguageCode::Indonesian), LanguageCode::Indonesian)
            .await
            .unwrap();
        assert_eq!(out, "kucing");
        assert!(t.client.as_ref().unwrap().calls().is_empty());
    }

    #[tokio::test]
    async fn detected_source_equal_to_target_is_identity() {
        let detector = MarkerDetector::default().marker("kucing", LanguageCode::Indonesian);
        let t = Translator::new(Some(MockTranslation::default()), detector, false, 2);
        let out = t
            .translate("kucing", None, LanguageCode::Indonesian)
            .await
            .unwrap();
        assert_eq!(out, "kucing");
        assert!(t.client.as_ref().unwrap().calls().is_empty());
    }

    #[tokio::test]
    async fn translates_with_explicit_source() {
        let t = translator(MockTranslation::default().with("mamalia", "mammals"));
        let out = t
            .translate("mamalia", Some(LanguageCode::Indonesian), LanguageCode::English)
            .await
            .unwrap();
        assert_eq!(out, "mammals");
        let calls = t.client.as_ref().unwrap().calls();
        assert_eq!(calls, vec![("mamalia".into(), "id".into(), "en".into())]);
    }

    #[tokio::test]
    async fn undetectable_source_falls_back_to_remote_detection() {
        let client = MockTranslation::default()
            .with("mamalia", "mammals")
            .detecting("mamalia", "id");
        let t = translator(client);
        let out = t.translate("mamalia", None, LanguageCode::English).await.unwrap();
        assert_eq!(out, "mammals");
        assert_eq!(t.client.as_ref().unwrap().calls()[0].1, "id");
    }

    #[tokio::test]
    async fn unknown_source_is_sent_as_auto() {
        let t = translator(MockTranslation::default().with("neko", "cat"));
        t.translate("neko", None, LanguageCode::English).await.unwrap();
        assert_eq!(t.client.as_ref().unwrap().calls()[0].1, "auto");
    }

    #[tokio::test]
    async fn sanitize_strips_punctuation_before_sending() {
        let t = translator(MockTranslation::default().with("mamalia", "mammals"));
        let out = t
            .translate("mamalia?!", Some(LanguageCode::Indonesian), LanguageCode::English)
            .await
            .unwrap();
        assert_eq!(out, "mammals");
        assert_eq!(t.client.as_ref().unwrap().calls()[0].0, "mamalia");
    }

    #[tokio::test]
    async fn disabled_translator_passes_through() {
        let t: Translator<MockTranslation, _> = Translator::new(None, StopwordDetector, true, 4);
        assert!(!t.is_enabled());
        let keywords = set(&["mamalia", "air"]);
        let out = t
            .translate_keywords(&keywords, Some(LanguageCode::Indonesian), LanguageCode::English)
            .await;
        assert_eq!(out, keywords);
    }

    #[tokio::test]
    async fn unsupported_target_passes_through() {
        let t = translator(MockTranslation::default().with("mamalia", "mammals"));
        let keywords = set(&["mamalia"]);
        let out = t
            .translate_keywords(&keywords, Some(LanguageCode::Indonesian), LanguageCode::Unsupported)
            .await;
        assert_eq!(out, keywords);
        assert!(t.client.as_ref().unwrap().calls().is_empty());
    }

    #[tokio::test]
    async fn keywords_are_translated_individually() {
        let client = MockTranslation::default()
            .with("mamalia", "mammals")
            .with("laut", "Sea");
        let t = translator(client);
        let out = t
            .translate_keywords(
                &set(&["mamalia", "laut"]),
                Some(LanguageCode::Indonesian),
                LanguageCode::English,
            )
            .await;
        assert_eq!(out, set(&["mammals", "sea"]));
        assert_eq!(t.client.as_ref().unwrap().calls().len(), 2);
    }

    #[tokio::test]
    async fn failed_keyword_passes_through() {
        let client = MockTranslation::default()
            .with("mamalia", "mammals")
            .failing("laut");
        let t = translator(client);
        let out = t
            .translate_keywords(
                &set(&["mamalia", "laut"]),
                Some(LanguageCode::Indonesian),
                LanguageCode::English,
            )
            .await;
        assert_eq!(out, set(&["mammals", "laut"]));
    }

    #[tokio::test]
    async fn colliding_translations_do_not_duplicate() {
        let client = MockTranslation::default()
            .with("kucing", "cat")
            .with("meong", "cat");
        let t = translator(client);
        let out = t
            .translate_keywords(
                &set(&["kucing", "meong"]),
                Some(LanguageCode::Indonesian),
                LanguageCode::English,
            )
            .await;
        assert_eq!(out, set(&["cat"]));
    }

    #[tokio::test]
    async fn multi_word_translation_is_split_and_filtered() {
        let t = translator(MockTranslation::default().with("singa laut", "the sea lion"));
        let out = t
            .translate_keywords(
                &set(&["singa laut"]),
                Some(LanguageCode::Indonesian),
                LanguageCode::English,
            )
            .await;
        assert_eq!(out, set(&["sea", "lion"]));
    }

    #[tokio::test]
    async fn concurrency_is_bounded() {
        let t = Translator::new(Some(MockTranslation::default()), StopwordDetector, false, 2);
        let keywords: KeywordSet = (0..10).map(|i| format!("kata{i}")).collect();
        t.translate_keywords(&keywords, Some(LanguageCode::Indonesian), LanguageCode::English)
            .await;
        let client = t.client.as_ref().unwrap();
        assert_eq!(client.calls().len(), 10);
        assert!(client.max_in_flight() <= 2, "max in flight {}", client.max_in_flight());
    }
}
