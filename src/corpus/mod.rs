//! Documents, the corpus that owns them, and corpus-language resolution.

pub mod loader;

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::debug;

pub use loader::{CorpusError, RawDocument, load_dir};

use crate::lang::LanguageCode;
use crate::text::{LanguageDetector, detection_sample, tokenize};

#[derive(Debug, Clone)]
pub struct Document {
    pub name: String,
    pub location: PathBuf,
    pub text: String,
    /// Case-folded, stopword-filtered tokens in document order.
    pub tokens: Vec<String>,
    pub language: LanguageCode,
}

/// Token-count band a document must fall strictly inside to decide the
/// corpus language: long enough to classify, short enough to be cheap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectionBand {
    pub min: usize,
    pub max: usize,
}

impl Default for DetectionBand {
    fn default() -> Self {
        Self { min: 10, max: 50 }
    }
}

impl DetectionBand {
    pub fn admits(&self, token_count: usize) -> bool {
        self.min < token_count && token_count < self.max
    }
}

#[derive(Debug, Default)]
pub struct Corpus {
    documents: Vec<Document>,
    language: LanguageCode,
}

impl Corpus {
    /// Detect each document's language on a leading sample, tokenize it,
    /// then resolve the corpus language.
    ///
    /// Documents are analyzed in parallel; their order is preserved.
    pub fn build(
        raw: Vec<RawDocument>,
        detector: &impl LanguageDetector,
        band: DetectionBand,
    ) -> Self {
        let documents: Vec<Document> = raw
            .into_par_iter()
            .map(|doc| {
                let language = detector.detect(&detection_sample(&doc.text));
                let tokens = tokenize(&doc.text, language);
                debug!(
                    document = %doc.name,
                    language = %language,
                    tokens = tokens.len(),
                    "document analyzed"
                );
                Document {
                    name: doc.name,
                    location: doc.location,
                    text: doc.text,
                    tokens,
                    language,
                }
            })
            .collect();

        let language = resolve_language(&documents, band);
        Self {
            documents,
            language,
        }
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn get(&self, doc: usize) -> Option<&Document> {
        self.documents.get(doc)
    }

    pub fn language(&self) -> LanguageCode {
        self.language
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Raw text of the document stored at `location`.
    pub fn text_at(&self, location: &Path) -> Option<&str> {
        self.documents
            .iter()
            .find(|d| d.location == location)
            .map(|d| d.text.as_str())
    }
}

/// First document inside `band` decides; otherwise the first document;
/// an empty corpus is `Unsupported`.
pub fn resolve_language(documents: &[Document], band: DetectionBand) -> LanguageCode {
    documents
        .iter()
        .find(|d| band.admits(d.tokens.len()))
        .or_else(|| documents.first())
        .map(|d| d.language)
        .unwrap_or_default()
}
