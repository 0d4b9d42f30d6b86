//! Text processing: language detection, sanitization and tokenization.

pub mod detect;
pub mod sanitize;
pub mod tokenize;

pub use detect::{LanguageDetector, StopwordDetector, detection_sample};
pub use sanitize::sanitize;
pub use tokenize::{KeywordSet, extract_keywords, tokenize};
