use serde::Serialize;
use tracing::{debug, warn};

use super::schema::TrainingSchema;
use crate::core::error::{DialectError, Result};
use crate::survey::{CanonicalAnswerSet, Lexicon};


/// One-hot answer encoding, laid out exactly as the training schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    values: Vec<f32>,
}

impl FeatureVector {
    #[must_use]
    pub fn from_values(values: Vec<f32>) -> Self {
        Self { values }
    }


    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }


    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }


    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }


    pub fn active_slots(&self) -> impl Iterator<Item = usize> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter(|(_, v)| **v != 0.0)
            .map(|(idx, _)| idx)
    }
}

/// Encodes a complete answer set against the training schema.
///
/// Categories the schema never saw leave their question's block all-zero.
pub fn encode(
    answers: &CanonicalAnswerSet,
    schema: &TrainingSchema,
    lexicon: &Lexicon,
) -> Result<FeatureVector> {
    for (question_id, _) in answers.iter() {
        lexicon.get(question_id)?;
    }

    let required: Vec<&str> = lexicon
        .questions()
        .filter(|q| q.is_classifying() || schema.covers(&q.id))
        .map(|q| q.id.as_str())
        .collect();

    let missing: Vec<String> = required
        .iter()
        .filter(|id| answers.get(id).is_none())
        .map(|id| (*id).to_string())
        .collect();
    if !missing.is_empty() {
        return Err(DialectError::IncompleteAnswers { missing });
    }

    let mut values = vec![0.0_f32; schema.len()];
    for question_id in required {
        let Some(answer) = answers.get(question_id) else {
            continue;
        };
        match schema.slot(question_id, answer) {
            Some(idx) => values[idx] = 1.0,
            None => warn!(
                question = question_id,
                answer, "Category not present in training schema, encoding as zeros"
            ),
        }
    }

    let vector = FeatureVector::from_values(values);
    debug!(
        width = vector.len(),
        active = vector.active_slots().count(),
        "Encoded answer set"
    );
    Ok(vector)
}
