use unicode_segmentation::UnicodeSegmentation;

use crate::lang::LanguageCode;

/// Classifies a text sample into a language.
///
/// Implementations must be deterministic and must not fail: empty or
/// unclassifiable input yields [`LanguageCode::Unsupported`].
pub trait LanguageDetector: Send + Sync {
    fn detect(&self, sample: &str) -> LanguageCode;
}

/// Stopword-overlap detector.
///
/// Each supported language scores one point per sample word found in its
/// stopword list. The highest score wins; ties go to the earlier entry of
/// [`LanguageCode::SUPPORTED`]; a sample with no hits is `Unsupported`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StopwordDetector;

impl LanguageDetector for StopwordDetector {
    fn detect(&self, sample: &str) -> LanguageCode {
        let words: Vec<String> = sample.unicode_words().map(str::to_lowercase).collect();
        if words.is_empty() {
            return LanguageCode::Unsupported;
        }

        let mut best = (LanguageCode::Unsupported, 0usize);
        for lang in LanguageCode::SUPPORTED {
            let Some(stopwords) = lang.stopwords() else {
                continue;
            };
            let hits = words.iter().filter(|w| stopwords.contains(w.as_str())).count();
            if hits > best.1 {
                best = (lang, hits);
            }
        }
        best.0
    }
}

/// Minimum number of words handed to the detector per document.
pub const MIN_SAMPLE_WORDS: usize = 20;

/// Leading window of a document used for language detection: the first
/// quarter of its words, but never fewer than [`MIN_SAMPLE_WORDS`].
pub fn detection_sample(text: &str) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    let take = (words.len() / 4).max(MIN_SAMPLE_WORDS).min(words.len());
    words[..take].join(" ")
}
