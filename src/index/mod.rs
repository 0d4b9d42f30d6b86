//! BM25 lexical index over a tokenized corpus.
//!
//! Documents are addressed by their position in the corpus. The index is
//! built once and never mutated; a corpus change means a full rebuild.

pub mod rank;

use std::collections::HashMap;

use crate::text::KeywordSet;

pub use rank::top_k;

/// BM25 tunables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
    /// Term-frequency saturation.
    pub k1: f64,
    /// Length normalization strength, 0 disables it.
    pub b: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.5, b: 0.75 }
    }
}

impl Bm25Params {
    /// Saturation must be finite and non-negative for scores to stay
    /// non-negative reals.
    pub fn valid_k1(k1: f64) -> bool {
        k1.is_finite() && k1 >= 0.0
    }

    pub fn valid_b(b: f64) -> bool {
        (0.0..=1.0).contains(&b)
    }
}

#[derive(Debug, Clone, Copy)]
struct Posting {
    doc: usize,
    term_frequency: u32,
}

#[derive(Debug)]
pub struct LexicalIndex {
    postings: HashMap<String, Vec<Posting>>,
    doc_lengths: Vec<usize>,
    avg_doc_length: f64,
    params: Bm25Params,
}

impl LexicalIndex {
    /// Index token lists; the n-th list becomes document `n`.
    pub fn build<I, D>(documents: I, params: Bm25Params) -> Self
    where
        I: IntoIterator<Item = D>,
        D: IntoIterator,
        D::Item: AsRef<str>,
    {
        let mut postings: HashMap<String, Vec<Posting>> = HashMap::new();
        let mut doc_lengths = Vec::new();

        for (doc, tokens) in documents.into_iter().enumerate() {
            let mut length = 0;
            let mut tf_map: HashMap<String, u32> = HashMap::new();
            for token in tokens {
                length += 1;
                let token = token.as_ref();
                match tf_map.get_mut(token) {
                    Some(count) => *count += 1,
                    None => {
                        tf_map.insert(token.to_string(), 1);
                    }
                }
            }
            doc_lengths.push(length);

            for (term, term_frequency) in tf_map {
                postings.entry(term).or_default().push(Posting {
                    doc,
                    term_frequency,
                });
            }
        }

        let total: usize = doc_lengths.iter().sum();
        let avg_doc_length = if doc_lengths.is_empty() {
            0.0
        } else {
            total as f64 / doc_lengths.len() as f64
        };

        Self {
            postings,
            doc_lengths,
            avg_doc_length,
            params,
        }
    }

    pub fn doc_count(&self) -> usize {
        self.doc_lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc_lengths.is_empty()
    }

    /// Score every document against `keywords`.
    ///
    /// Returns one score per document in corpus order, so an empty index
    /// yields an empty vector. Terms outside the vocabulary add nothing.
    pub fn score(&self, keywords: &KeywordSet) -> Vec<f64> {
        let mut scores = vec![0.0; self.doc_count()];
        if self.is_empty() {
            return scores;
        }

        let n = self.doc_count() as f64;
        let Bm25Params { k1, b } = self.params;

        for keyword in keywords {
            let Some(postings) = self.postings.get(keyword) else {
                continue;
            };
            let df = postings.len() as f64;
            // IDF: ln((N - df + 0.5) / (df + 0.5) + 1), always positive
            let idf = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();

            for posting in postings {
                let tf = f64::from(posting.term_frequency);
                let length_ratio = if self.avg_doc_length > 0.0 {
                    self.doc_lengths[posting.doc] as f64 / self.avg_doc_length
                } else {
                    1.0
                };
                let tf_norm = (tf * (k1 + 1.0)) / (tf + k1 * (1.0 - b + b * length_ratio));
                scores[posting.doc] += idf * tf_norm;
            }
        }

        scores
    }
}
