//! Upstream result classification and response post-processing.

use std::collections::HashSet;

use serde_json::Value;

use crate::catalog::{CatalogError, Endpoint};

/// Outcome of one upstream call.
#[derive(Debug, Clone)]
pub enum UpstreamResult {
    /// Upstream answered with results.
    Success(Value),
    /// Upstream answered but reported zero results.
    Empty(Value),
    /// Transport failure or non-2xx response.
    UpstreamError(CatalogError),
}

impl UpstreamResult {
    /// Classify a fetched payload for the endpoint that produced it.
    ///
    /// Keyword suggestions are refined before classification, so a list
    /// that only echoed the query term counts as empty.
    pub fn classify(endpoint: &Endpoint, fetched: Result<Value, CatalogError>) -> Self {
        let mut payload = match fetched {
            Ok(payload) => payload,
            Err(e) => return UpstreamResult::UpstreamError(e),
        };

        let empty = match endpoint {
            Endpoint::Search { .. } => search_total(&payload) == Some(0),
            Endpoint::Keywords { keyword } => refine_keyword_payload(&mut payload, keyword) == Some(0),
            Endpoint::Rank { .. } | Endpoint::Hot { .. } => is_empty_listing(&payload),
            Endpoint::Detail { .. } => false,
        };

        if empty { UpstreamResult::Empty(payload) } else { UpstreamResult::Success(payload) }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, UpstreamResult::Success(_))
    }
}

/// `data.total` of a search response.
fn search_total(payload: &Value) -> Option<u64> {
    payload.pointer("/data/total").and_then(Value::as_u64)
}

fn is_empty_listing(payload: &Value) -> bool {
    match payload.get("data") {
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Null) => true,
        _ => false,
    }
}

/// Clean a suggestion list for `original`.
///
/// Drops empty strings and the query term itself, removes duplicates, then
/// sorts by length. The sort is stable, so equal lengths keep first-seen order.
pub fn refine_keywords<I, S>(words: I, original: &str) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = HashSet::new();
    let mut refined: Vec<String> = words
        .into_iter()
        .map(Into::into)
        .filter(|w| !w.is_empty() && w != original)
        .filter(|w| seen.insert(w.clone()))
        .collect();
    refined.sort_by_key(|w| w.chars().count());
    refined
}

/// Refine `data[0].words` in place.
///
/// Returns the refined length, or `None` when the payload does not carry a
/// suggestion list (it is then left untouched).
fn refine_keyword_payload(payload: &mut Value, original: &str) -> Option<usize> {
    let words = payload.pointer_mut("/data/0/words")?.as_array_mut()?;
    let refined = refine_keywords(words.iter().filter_map(Value::as_str), original);
    let len = refined.len();
    *words = refined.into_iter().map(Value::String).collect();
    Some(len)
}
