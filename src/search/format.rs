use serde_json::json;

use super::SearchOutcome;
use crate::text::KeywordSet;

fn join(keywords: &KeywordSet) -> String {
    keywords
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Human-readable report of a search: keywords, then ranked documents.
pub fn format_outcome(outcome: &SearchOutcome) -> String {
    let mut output = format!(
        "Found keywords ({}): {}\n",
        outcome.query_language,
        join(&outcome.keywords)
    );
    if outcome.was_translated() {
        output.push_str(&format!("Translated keywords: {}\n", join(&outcome.reconciled)));
    }

    if outcome.results.is_empty() {
        output.push_str("No documents found.\n");
        return output;
    }

    output.push_str("Found top documents:\n");
    for (rank, result) in outcome.results.iter().enumerate() {
        output.push_str(&format!(
            "{}. {} (score {:.4})\n   {}\n",
            rank + 1,
            result.name,
            result.score,
            result.location
        ));
    }
    output
}

/// Ranked documents followed by their texts, separated by rules.
pub fn format_context(outcome: &SearchOutcome, texts: &[&str]) -> String {
    let mut output = format_outcome(outcome);
    for (result, text) in outcome.results.iter().zip(texts) {
        output.push_str(&format!("\n--- {} ---\n{}\n", result.name, text.trim_end()));
    }
    output
}

pub fn to_json(outcome: &SearchOutcome) -> serde_json::Value {
    json!({
        "query_language": outcome.query_language.to_string(),
        "keywords": outcome.keywords,
        "reconciled": outcome.reconciled,
        "results": outcome.results,
    })
}
