use tracing::{debug, warn};

use super::lexicon::Lexicon;
use super::models::{CanonicalAnswerSet, SurveyResponse};
use super::similarity::best_match;
use crate::core::error::Result;
use crate::utils::safe_truncate_ellipsis;
use crate::{DEFAULT_FUZZY_THRESHOLD, OTHER_ANSWER};


/// Maps free-text answers onto a question's accepted answers.
///
/// Exact case-insensitive matches win outright. Otherwise the best fuzzy
/// candidate is taken when it scores at least `threshold`, else `"other"`.
/// Ties go to the candidate listed first in the lexicon.
#[derive(Debug, Clone)]
pub struct AnswerNormalizer {
    lexicon: Lexicon,
    threshold: u8,
}

impl AnswerNormalizer {
    #[must_use]
    pub fn new(lexicon: Lexicon) -> Self {
        Self::with_threshold(lexicon, DEFAULT_FUZZY_THRESHOLD)
    }


    #[must_use]
    pub fn with_threshold(lexicon: Lexicon, threshold: u8) -> Self {
        Self { lexicon, threshold }
    }


    #[must_use]
    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }


    #[must_use]
    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    pub fn normalize(&self, question_id: &str, raw_text: &str) -> Result<String> {
        let question = self.lexicon.get(question_id)?;
        let lowered = raw_text.trim().to_lowercase();

        if let Some(exact) = question.answers.iter().find(|a| a.to_lowercase() == lowered) {
            debug!(question = question_id, answer = %exact, "Exact answer match");
            return Ok(exact.clone());
        }

        if lowered == OTHER_ANSWER {
            return Ok(OTHER_ANSWER.to_string());
        }

        match best_match(&lowered, question.answers.iter().map(String::as_str)) {
            Some((candidate, score)) if score >= self.threshold => {
                debug!(
                    question = question_id,
                    raw = %safe_truncate_ellipsis(raw_text, 40),
                    answer = candidate,
                    score,
                    "Fuzzy answer match"
                );
                Ok(candidate.to_string())
            }
            best => {
                warn!(
                    question = question_id,
                    raw = %safe_truncate_ellipsis(raw_text, 40),
                    best_score = best.map_or(0, |(_, s)| s),
                    threshold = self.threshold,
                    "No accepted answer close enough, using '{}'",
                    OTHER_ANSWER
                );
                Ok(OTHER_ANSWER.to_string())
            }
        }
    }

    /// Normalizes every answered question; unanswered ones are left out.
    pub fn normalize_response(&self, response: &SurveyResponse) -> Result<CanonicalAnswerSet> {
        let mut canonical = CanonicalAnswerSet::default();
        for (question_id, raw_text) in response.iter() {
            let answer = self.normalize(question_id, raw_text)?;
            canonical.insert(question_id.to_string(), answer);
        }
        Ok(canonical)
    }
}
