

pub mod lexicon;
pub mod models;
pub mod normalizer;
pub mod similarity;

pub use lexicon::{Lexicon, Question};
pub use models::{CanonicalAnswerSet, SurveyResponse};
pub use normalizer::AnswerNormalizer;
pub use similarity::{best_match, token_set_score, tokenize};
