

use std::collections::BTreeSet;

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {

    static ref WORD_TOKEN: Regex =
        Regex::new(r"[\p{L}\p{N}]+(?:'[\p{L}\p{N}]+)*").expect("valid token pattern");
}

/// Tokens below this similarity do not count as a fuzzy match.
pub const TOKEN_MATCH_FLOOR: f64 = 0.8;


/// Lower-cased word tokens, deduplicated. In-word apostrophes are kept (`y'all`).
pub fn tokenize(text: &str) -> BTreeSet<String> {
    let lowered = text.to_lowercase().replace(['\u{2018}', '\u{2019}'], "'");
    WORD_TOKEN
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}


fn best_token_match(token: &str, others: &BTreeSet<String>) -> f64 {
    others
        .iter()
        .map(|other| strsim::normalized_levenshtein(token, other))
        .filter(|sim| *sim >= TOKEN_MATCH_FLOOR)
        .fold(0.0, f64::max)
}

/// Soft token-set Dice score between two strings on a 0-100 scale.
///
/// Each token is credited with its closest counterpart on the other side,
/// or zero when nothing clears [`TOKEN_MATCH_FLOOR`]. Either side empty scores 0.
pub fn token_set_score(query: &str, candidate: &str) -> u8 {
    let query_tokens = tokenize(query);
    let candidate_tokens = tokenize(candidate);

    if query_tokens.is_empty() || candidate_tokens.is_empty() {
        return 0;
    }

    let forward: f64 = query_tokens
        .iter()
        .map(|t| best_token_match(t, &candidate_tokens))
        .sum();
    let backward: f64 = candidate_tokens
        .iter()
        .map(|t| best_token_match(t, &query_tokens))
        .sum();

    let total = (query_tokens.len() + candidate_tokens.len()) as f64;
    let score = 100.0 * (forward + backward) / total;
    score.round().clamp(0.0, 100.0) as u8
}


/// Best-scoring candidate, first in order on ties.
pub fn best_match<'a, I>(query: &str, candidates: I) -> Option<(&'a str, u8)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(&'a str, u8)> = None;
    for candidate in candidates {
        let score = token_set_score(query, candidate);
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((candidate, score)),
        }
    }
    best
}
