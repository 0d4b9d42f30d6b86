//! Test doubles shared across module tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use unicode_segmentation::UnicodeSegmentation;

use crate::lang::LanguageCode;
use crate::text::LanguageDetector;
use crate::translate::client::{TranslateError, TranslationClient};

/// Translation collaborator backed by a lookup table.
#[derive(Default)]
pub struct MockTranslation {
    table: HashMap<String, String>,
    failing: HashSet<String>,
    hanging: HashSet<String>,
    detections: HashMap<String, String>,
    calls: Mutex<Vec<(String, String, String)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockTranslation {
    pub fn with(mut self, from: &str, to: &str) -> Self {
        self.table.insert(from.to_string(), to.to_string());
        self
    }

    pub fn failing(mut self, word: &str) -> Self {
        self.failing.insert(word.to_string());
        self
    }

    /// Calls translating `word` never complete.
    pub fn hanging(mut self, word: &str) -> Self {
        self.hanging.insert(word.to_string());
        self
    }

    pub fn detecting(mut self, text: &str, code: &str) -> Self {
        self.detections.insert(text.to_string(), code.to_string());
        self
    }

    /// Recorded `(text, source, target)` translate calls.
    pub fn calls(&self) -> Vec<(String, String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl TranslationClient for MockTranslation {
    async fn detect_language(&self, text: &str) -> Result<String, TranslateError> {
        self.detections
            .get(text)
            .cloned()
            .ok_or_else(|| TranslateError::Decode(format!("cannot detect {text:?}")))
    }

    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, TranslateError> {
        self.calls
            .lock()
            .unwrap()
            .push((text.to_string(), source.to_string(), target.to_string()));

        if self.hanging.contains(text) {
            return std::future::pending().await;
        }

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(text) {
            return Err(TranslateError::Api {
                code: 503,
                message: "unavailable".into(),
            });
        }
        Ok(self
            .table
            .get(text)
            .cloned()
            .unwrap_or_else(|| text.to_string()))
    }
}

/// Detector that answers by marker words: the first marker found in the
/// sample decides the language.
#[derive(Default)]
pub struct MarkerDetector {
    markers: Vec<(String, LanguageCode)>,
}

impl MarkerDetector {
    pub fn marker(mut self, word: &str, language: LanguageCode) -> Self {
        self.markers.push((word.to_string(), language));
        self
    }
}

impl LanguageDetector for MarkerDetector {
    fn detect(&self, sample: &str) -> LanguageCode {
        let words: HashSet<String> = sample.unicode_words().map(str::to_lowercase).collect();
        self.markers
            .iter()
            .find(|(marker, _)| words.contains(marker))
            .map(|(_, lang)| *lang)
            .unwrap_or_default()
    }
}
