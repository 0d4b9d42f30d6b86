//! Query pipeline: load and index the corpus, reconcile the query language,
//! score and rank.

pub mod format;

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::corpus::{Corpus, CorpusError, load_dir};
use crate::index::{LexicalIndex, top_k};
use crate::lang::LanguageCode;
use crate::text::{KeywordSet, LanguageDetector, StopwordDetector, extract_keywords};
use crate::translate::{HttpTranslator, TranslationClient, Translator};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("{0}")]
    Corpus(#[from] CorpusError),
}

/// Where the last `search` call got to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    Idle,
    CorpusLoaded,
    LanguageResolved,
    Indexed,
    QueryReconciled,
    Scored,
    Ranked,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::CorpusLoaded => "corpus-loaded",
            Self::LanguageResolved => "language-resolved",
            Self::Indexed => "indexed",
            Self::QueryReconciled => "query-reconciled",
            Self::Scored => "scored",
            Self::Ranked => "ranked",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub name: String,
    pub location: String,
    pub score: f64,
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub query_language: LanguageCode,
    /// Keywords extracted from the question.
    pub keywords: KeywordSet,
    /// Keywords in the corpus language; equal to `keywords` when no
    /// translation was needed.
    pub reconciled: KeywordSet,
    pub results: Vec<SearchResult>,
}

impl SearchOutcome {
    pub fn was_translated(&self) -> bool {
        self.keywords != self.reconciled
    }
}

#[derive(Debug)]
struct IndexedCorpus {
    corpus: Corpus,
    index: LexicalIndex,
}

/// Per-session search state: configuration, the translator and the cached
/// corpus with its index.
pub struct SearchSession<C, D> {
    config: Config,
    translator: Translator<C, D>,
    indexed: Option<Arc<IndexedCorpus>>,
    stage: Stage,
}

impl SearchSession<HttpTranslator, StopwordDetector> {
    /// Session wired to the HTTP translation service named in `config`.
    /// Translation is disabled when no service is configured.
    pub fn from_config(config: Config) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(config.translation.timeout)
            .build()?;
        let client = HttpTranslator::from_config(http, &config.translation)
            .inspect_err(|e| warn!("translation not available: {e}"))
            .ok();
        let translator = Translator::new(
            client,
            StopwordDetector,
            config.translation.sanitize,
            config.translation.concurrency,
        );
        Ok(Self::new(config, translator))
    }
}

impl<C: TranslationClient, D: LanguageDetector> SearchSession<C, D> {
    pub fn new(config: Config, translator: Translator<C, D>) -> Self {
        Self {
            config,
            translator,
            indexed: None,
            stage: Stage::Idle,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Drop the cached corpus; the next search reads the folder again.
    pub fn reload(&mut self) {
        self.indexed = None;
        self.stage = Stage::Idle;
    }

    fn advance(&mut self, stage: Stage) {
        debug!(from = %self.stage, to = %stage, "search stage");
        self.stage = stage;
    }

    /// Rank the corpus against `question`.
    ///
    /// Dropping the returned future cancels the search; the cached corpus is
    /// only replaced once a full rebuild has finished.
    pub async fn search(&mut self, question: &str) -> Result<SearchOutcome, SearchError> {
        self.stage = Stage::Idle;
        let indexed = self.indexed_corpus().await?;
        let corpus_language = indexed.corpus.language();

        let query_language = self.translator.detect_source(question).await;
        let keywords = extract_keywords(question, query_language);
        debug!(
            language = %query_language,
            keywords = ?keywords,
            "query keywords"
        );

        let reconciled = if corpus_language.is_supported() && query_language != corpus_language {
            let source = Some(query_language).filter(|l| l.is_supported());
            self.translator
                .translate_keywords(&keywords, source, corpus_language)
                .await
        } else {
            keywords.clone()
        };
        self.advance(Stage::QueryReconciled);

        let scores = indexed.index.score(&reconciled);
        self.advance(Stage::Scored);

        let results: Vec<SearchResult> = top_k(&scores, self.config.top_k)
            .into_iter()
            .filter_map(|hit| {
                indexed.corpus.get(hit.doc).map(|doc| SearchResult {
                    name: doc.name.clone(),
                    location: doc.location.display().to_string(),
                    score: hit.score,
                })
            })
            .collect();
        self.advance(Stage::Ranked);

        info!(
            query_language = %query_language,
            corpus_language = %corpus_language,
            results = results.len(),
            "search complete"
        );
        self.advance(Stage::Done);

        Ok(SearchOutcome {
            query_language,
            keywords,
            reconciled,
            results,
        })
    }

    async fn indexed_corpus(&mut self) -> Result<Arc<IndexedCorpus>, SearchError> {
        if !self.config.rebuild_per_query
            && let Some(indexed) = &self.indexed
        {
            let indexed = Arc::clone(indexed);
            self.advance(Stage::CorpusLoaded);
            self.advance(Stage::LanguageResolved);
            self.advance(Stage::Indexed);
            return Ok(indexed);
        }

        let raw = load_dir(
            &self.config.docs_dir,
            &self.config.pattern,
            self.config.read_concurrency,
        )
        .await?;
        self.advance(Stage::CorpusLoaded);

        let corpus = Corpus::build(raw, self.translator.detector(), self.config.detection_band);
        if corpus.is_empty() {
            info!(dir = %self.config.docs_dir.display(), "corpus is empty");
        } else if !corpus.language().is_supported() {
            warn!("corpus language not recognized, translation disabled");
        }
        self.advance(Stage::LanguageResolved);

        let index = LexicalIndex::build(
            corpus.documents().iter().map(|d| &d.tokens),
            self.config.bm25,
        );
        info!(
            documents = corpus.len(),
            language = %corpus.language(),
            "corpus indexed"
        );
        self.advance(Stage::Indexed);

        let indexed = Arc::new(IndexedCorpus { corpus, index });
        self.indexed = Some(Arc::clone(&indexed));
        Ok(indexed)
    }

    /// Cached raw text of the document at `location`.
    pub fn document_text(&self, location: impl AsRef<Path>) -> Option<&str> {
        self.indexed
            .as_ref()
            .and_then(|i| i.corpus.text_at(location.as_ref()))
    }

    /// Texts of ranked documents, in rank order.
    pub fn context_for(&self, results: &[SearchResult]) -> Vec<&str> {
        results
            .iter()
            .filter_map(|r| self.document_text(&r.location))
            .collect()
    }
}
