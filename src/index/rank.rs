/// A document position in the corpus paired with its relevance score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredResult {
    pub doc: usize,
    pub score: f64,
}

/// Select the `k` best documents by descending score.
///
/// Equal scores keep corpus order, so identical input always ranks the
/// same way. `k` larger than the corpus returns every document.
pub fn top_k(scores: &[f64], k: usize) -> Vec<ScoredResult> {
    let mut ranked: Vec<ScoredResult> = scores
        .iter()
        .enumerate()
        .map(|(doc, &score)| ScoredResult { doc, score })
        .collect();
    // stable sort: ties stay in corpus order
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked.truncate(k);
    ranked
}
