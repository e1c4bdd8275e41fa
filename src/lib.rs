pub mod classifier;
pub mod core;
pub mod pipeline;
pub mod survey;
pub mod utils;

pub use utils::safe_truncate_ellipsis;


pub use classifier::{ClassifierAdapter, ClassifierBackend, FeatureVector, Prediction, TrainingSchema};
pub use self::core::config::DialectConfig;
pub use self::core::error::{DialectError, Result};
pub use pipeline::{Classification, DialectPipeline, PipelineOptions};
pub use survey::{AnswerNormalizer, CanonicalAnswerSet, Lexicon, Question, SurveyResponse};

/// Sentinel canonical answer for anything outside a question's accepted set.
pub const OTHER_ANSWER: &str = "other";


pub const DEFAULT_FUZZY_THRESHOLD: u8 = 45;


pub const DEFAULT_TOP_K: usize = 3;


pub const DEFAULT_SCHEMA_PATH: &str = "model_bits/training_schema.json";


pub const DEFAULT_MODEL_PATH: &str = "model_bits/state_level_knn.json";
