use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::LazyLock;

use stop_words::{Language, lookup};

/// Languages the tokenizer, detector and translator understand.
///
/// Anything outside this table is `Unsupported`: stopword filtering and
/// translation are skipped for it, but nothing fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LanguageCode {
    English,
    Indonesian,
    German,
    French,
    Spanish,
    Italian,
    Dutch,
    Portuguese,
    #[default]
    Unsupported,
}

static STOPWORDS: LazyLock<HashMap<LanguageCode, HashSet<String>>> = LazyLock::new(|| {
    LanguageCode::SUPPORTED
        .iter()
        .filter_map(|&lang| {
            let list = lookup(lang.stopword_list()?)?;
            let words: HashSet<String> = list.iter().map(|s| s.to_lowercase()).collect();
            Some((lang, words))
        })
        .collect()
});

impl LanguageCode {
    /// Supported languages in detection tie-break order.
    pub const SUPPORTED: [LanguageCode; 8] = [
        LanguageCode::English,
        LanguageCode::Indonesian,
        LanguageCode::German,
        LanguageCode::French,
        LanguageCode::Spanish,
        LanguageCode::Italian,
        LanguageCode::Dutch,
        LanguageCode::Portuguese,
    ];

    /// Resolve an ISO 639-1 code (`"en"`, `"id"`, `"pt-BR"`) to a language.
    pub fn from_code(code: &str) -> Self {
        let primary = code
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match primary.as_str() {
            "en" => LanguageCode::English,
            "id" => LanguageCode::Indonesian,
            "de" => LanguageCode::German,
            "fr" => LanguageCode::French,
            "es" => LanguageCode::Spanish,
            "it" => LanguageCode::Italian,
            "nl" => LanguageCode::Dutch,
            "pt" => LanguageCode::Portuguese,
            _ => LanguageCode::Unsupported,
        }
    }

    pub fn code(self) -> Option<&'static str> {
        match self {
            LanguageCode::English => Some("en"),
            LanguageCode::Indonesian => Some("id"),
            LanguageCode::German => Some("de"),
            LanguageCode::French => Some("fr"),
            LanguageCode::Spanish => Some("es"),
            LanguageCode::Italian => Some("it"),
            LanguageCode::Dutch => Some("nl"),
            LanguageCode::Portuguese => Some("pt"),
            LanguageCode::Unsupported => None,
        }
    }

    pub fn is_supported(self) -> bool {
        self != LanguageCode::Unsupported
    }

    /// Lowercased stopword set, or `None` when filtering must be skipped.
    pub fn stopwords(self) -> Option<&'static HashSet<String>> {
        STOPWORDS.get(&self)
    }

    fn stopword_list(self) -> Option<Language> {
        match self {
            LanguageCode::English => Some(Language::English),
            LanguageCode::Indonesian => Some(Language::Indonesian),
            LanguageCode::German => Some(Language::German),
            LanguageCode::French => Some(Language::French),
            LanguageCode::Spanish => Some(Language::Spanish),
            LanguageCode::Italian => Some(Language::Italian),
            LanguageCode::Dutch => Some(Language::Dutch),
            LanguageCode::Portuguese => Some(Language::Portuguese),
            LanguageCode::Unsupported => None,
        }
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code().unwrap_or("unsupported"))
    }
}
