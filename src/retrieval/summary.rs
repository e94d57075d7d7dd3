//! Bounded text digest of an aggregated result, sized for an LLM prompt.

use super::orchestrator::AggregatedResult;

/// Maximum number of characters kept before truncation.
pub const SUMMARY_CHAR_LIMIT: usize = 3000;

/// Appended when the digest was cut.
pub const TRUNCATION_MARKER: &str = "\n... (truncated)";

const SAMPLE_ROWS: usize = 3;

/// Renders every entry of `result` and cuts the text at
/// [`SUMMARY_CHAR_LIMIT`] characters.
pub fn summarize(result: &AggregatedResult) -> String {
    let sections: Vec<String> = result
        .entries()
        .iter()
        .map(|entry| {
            format!(
                "\n--- {} ---\n{}",
                entry.description,
                entry.payload.describe(SAMPLE_ROWS)
            )
        })
        .collect();

    truncate_chars(sections.join("\n"), SUMMARY_CHAR_LIMIT)
}

fn truncate_chars(text: String, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => {
            let mut truncated = text[..cut].to_string();
            truncated.push_str(TRUNCATION_MARKER);
            truncated
        }
        None => text,
    }
}
