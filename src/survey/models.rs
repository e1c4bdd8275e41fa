use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::lexicon::Lexicon;


/// Raw answers keyed by question id, as collected by the dialogue layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct SurveyResponse {
    answers: HashMap<String, String>,
}

impl SurveyResponse {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-asking a question overwrites the earlier answer.
    pub fn record(&mut self, question_id: impl Into<String>, raw_text: impl Into<String>) {
        self.answers.insert(question_id.into(), raw_text.into());
    }


    #[must_use]
    pub fn get(&self, question_id: &str) -> Option<&str> {
        self.answers.get(question_id).map(String::as_str)
    }


    #[must_use]
    pub fn missing(&self, lexicon: &Lexicon) -> Vec<String> {
        lexicon
            .questions()
            .filter(|q| !self.answers.contains_key(&q.id))
            .map(|q| q.id.clone())
            .collect()
    }


    #[must_use]
    pub fn is_complete(&self, lexicon: &Lexicon) -> bool {
        lexicon.questions().all(|q| self.answers.contains_key(&q.id))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.answers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.answers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SurveyResponse {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            answers: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}


/// Canonical answers keyed by question id.
///
/// Only [`AnswerNormalizer`](super::AnswerNormalizer) inserts entries, so every
/// value is an accepted answer of its question or the `"other"` sentinel.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct CanonicalAnswerSet {
    answers: BTreeMap<String, String>,
}

impl CanonicalAnswerSet {
    pub(crate) fn insert(&mut self, question_id: String, canonical: String) {
        self.answers.insert(question_id, canonical);
    }


    #[must_use]
    pub fn get(&self, question_id: &str) -> Option<&str> {
        self.answers.get(question_id).map(String::as_str)
    }


    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.answers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }


    #[must_use]
    pub fn len(&self) -> usize {
        self.answers.len()
    }


    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_overwrites() {
        let mut response = SurveyResponse::new();
        response.record("beverage", "soda");
        response.record("beverage", "pop");
        assert_eq!(response.get("beverage"), Some("pop"));
        assert_eq!(response.len(), 1);
    }

    #[test]
    fn test_missing_in_lexicon_order() {
        let lexicon = Lexicon::default_dialect();
        let mut response = SurveyResponse::new();
        response.record("bug", "roly poly");
        response.record("second_person_plural", "y'all");

        let missing = response.missing(&lexicon);
        assert_eq!(missing.len(), 18);
        assert_eq!(missing[0], "beverage");
        assert_eq!(missing[1], "cot_caught");
        assert!(!response.is_complete(&lexicon));
    }

    #[test]
    fn test_complete_response() {
        let lexicon = Lexicon::default_dialect();
        let response: SurveyResponse = lexicon
            .questions()
            .map(|q| (q.id.clone(), "other"))
            .collect();
        assert!(response.is_complete(&lexicon));
        assert!(response.missing(&lexicon).is_empty());
    }

    #[test]
    fn test_response_deserializes_from_flat_map() {
        let response: SurveyResponse =
            serde_json::from_str(r#"{"beverage": "Soda", "lawyer": "boy"}"#).unwrap();
        assert_eq!(response.get("beverage"), Some("Soda"));
        assert_eq!(response.len(), 2);
    }
}
