use std::collections::BTreeSet;

use unicode_segmentation::UnicodeSegmentation;

use crate::lang::LanguageCode;

/// Deduplicated query keywords in a stable (lexicographic) order.
pub type KeywordSet = BTreeSet<String>;

/// Case-fold, split on Unicode word boundaries (UAX #29) and drop the
/// stopwords of `language`. Punctuation such as `?`, `!`, `.` or `,` never
/// forms a word, so `"mammals?"` yields `mammals`.
fn filtered_words(text: &str, language: LanguageCode) -> impl Iterator<Item = String> + '_ {
    let stopwords = language.stopwords();
    text.unicode_words()
        .map(str::to_lowercase)
        .filter(move |w| stopwords.is_none_or(|s| !s.contains(w.as_str())))
}

/// Tokenize document text, dropping stopwords of `language`.
///
/// Order and repeats are preserved: term frequency feeds the scorer.
/// An unsupported language passes every token through.
pub fn tokenize(text: &str, language: LanguageCode) -> Vec<String> {
    filtered_words(text, language).collect()
}

/// Extract the unique keywords of a question.
pub fn extract_keywords(question: &str, language: LanguageCode) -> KeywordSet {
    filtered_words(question, language).collect()
}
