use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::classifier::{
    encode, load_backend, ClassifierAdapter, ClassifierBackend, FeatureVector, Prediction,
    TrainingSchema,
};
use crate::core::config::DialectConfig;
use crate::core::error::{DialectError, Result};
use crate::survey::{AnswerNormalizer, CanonicalAnswerSet, Lexicon, SurveyResponse};
use crate::{DEFAULT_FUZZY_THRESHOLD, DEFAULT_TOP_K};


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    pub fuzzy_threshold: u8,
    pub top_k: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            top_k: DEFAULT_TOP_K,
        }
    }
}

impl From<&DialectConfig> for PipelineOptions {
    fn from(config: &DialectConfig) -> Self {
        Self {
            fuzzy_threshold: config.fuzzy_threshold,
            top_k: config.top_k,
        }
    }
}


#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    pub answers: CanonicalAnswerSet,
    pub prediction: Prediction,
}

impl Classification {
    #[must_use]
    pub fn sentence(&self) -> String {
        self.prediction.to_sentence()
    }
}


/// Lexicon, training schema and model, loaded once and shared read-only.
///
/// Construction checks that the schema width matches the model input, so a
/// built pipeline can only fail per request on bad input.
#[derive(Clone)]
pub struct DialectPipeline {
    normalizer: AnswerNormalizer,
    schema: Arc<TrainingSchema>,
    classifier: ClassifierAdapter,
    top_k: usize,
}

impl DialectPipeline {
    pub fn new(
        lexicon: Lexicon,
        schema: TrainingSchema,
        backend: Arc<dyn ClassifierBackend>,
        options: PipelineOptions,
    ) -> Result<Self> {
        if schema.len() != backend.input_width() {
            return Err(DialectError::schema_mismatch(
                format!("model input width {}", backend.input_width()),
                format!("training schema width {}", schema.len()),
            ));
        }
        let classes = backend.classes().len();
        if options.top_k == 0 || options.top_k > classes {
            return Err(DialectError::InvalidTopK {
                k: options.top_k,
                classes,
            });
        }

        Ok(Self {
            normalizer: AnswerNormalizer::with_threshold(lexicon, options.fuzzy_threshold),
            schema: Arc::new(schema),
            classifier: ClassifierAdapter::new(backend),
            top_k: options.top_k,
        })
    }

    /// Startup load of every artifact named by the configuration.
    pub fn load(config: &DialectConfig) -> Result<Self> {
        config.validate()?;

        let lexicon = match &config.lexicon_path {
            Some(path) => Lexicon::from_json_file(path)
                .map_err(|e| DialectError::model_unavailable(path, e))?,
            None => Lexicon::default_dialect(),
        };
        let schema = TrainingSchema::from_json_file(&config.schema_path, &lexicon)?;
        let backend = load_backend(&config.model_path)?;

        let pipeline = Self::new(lexicon, schema, backend, PipelineOptions::from(config))?;
        info!(
            questions = pipeline.lexicon().len(),
            slots = pipeline.schema.len(),
            backend = %pipeline.classifier.backend().kind(),
            top_k = pipeline.top_k,
            "Dialect pipeline ready"
        );
        Ok(pipeline)
    }


    #[must_use]
    pub fn lexicon(&self) -> &Lexicon {
        self.normalizer.lexicon()
    }


    #[must_use]
    pub fn schema(&self) -> &TrainingSchema {
        &self.schema
    }


    #[must_use]
    pub fn top_k(&self) -> usize {
        self.top_k
    }


    pub fn normalize(&self, question_id: &str, raw_text: &str) -> Result<String> {
        self.normalizer.normalize(question_id, raw_text)
    }


    pub fn normalize_response(&self, response: &SurveyResponse) -> Result<CanonicalAnswerSet> {
        self.normalizer.normalize_response(response)
    }


    pub fn encode(&self, answers: &CanonicalAnswerSet) -> Result<FeatureVector> {
        encode(answers, &self.schema, self.lexicon())
    }


    pub fn predict_top_k(&self, features: &FeatureVector, k: usize) -> Result<Prediction> {
        self.classifier.predict_top_k(features, k)
    }

    /// Normalize, encode and rank a fully collected survey response.
    pub fn classify(&self, response: &SurveyResponse) -> Result<Classification> {
        let answers = self.normalize_response(response)?;
        let features = self.encode(&answers)?;
        let prediction = self.predict_top_k(&features, self.top_k)?;
        debug!(top = ?prediction.top(), "Classified survey response");
        Ok(Classification {
            answers,
            prediction,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{
        BoostedTreesArtifact, BoostedTreesModel, KnnArtifact, KnnModel, KnnSample, KnnWeights,
    };
    use std::io::Write;

    const COLUMNS: &[&str] = &[
        "q50_other", "q50_y'all", "q50_you_guys", "q50_yinz",
        "q105_coke", "q105_pop", "q105_soda",
        "q58_garage_sale", "q58_tag_sale", "q58_yard_sale",
    ];

    fn one_hot(active: &[usize]) -> Vec<f32> {
        let mut row = vec![0.0; COLUMNS.len()];
        for &idx in active {
            row[idx] = 1.0;
        }
        row
    }

    fn knn_backend() -> Arc<dyn ClassifierBackend> {
        let samples = [
            ("Georgia", &[1, 4, 9][..]),
            ("Georgia", &[1, 4, 7]),
            ("Minnesota", &[2, 5, 7]),
            ("Minnesota", &[2, 5, 9]),
            ("Connecticut", &[2, 6, 8]),
            ("Connecticut", &[2, 6, 8]),
            ("Pennsylvania", &[3, 6, 7]),
        ];
        Arc::new(
            KnnModel::from_artifact(KnnArtifact {
                k: 3,
                weights: KnnWeights::Uniform,
                classes: None,
                samples: samples
                    .iter()
                    .map(|(label, active)| KnnSample {
                        label: (*label).to_string(),
                        features: one_hot(active),
                    })
                    .collect(),
            })
            .unwrap(),
        )
    }

    fn pipeline() -> DialectPipeline {
        let lexicon = Lexicon::default_dialect();
        let schema = TrainingSchema::from_column_names(COLUMNS, &lexicon).unwrap();
        DialectPipeline::new(lexicon, schema, knn_backend(), PipelineOptions::default()).unwrap()
    }

    fn full_response(overrides: &[(&str, &str)]) -> SurveyResponse {
        let lexicon = Lexicon::default_dialect();
        let mut response: SurveyResponse =
            lexicon.questions().map(|q| (q.id.clone(), "other")).collect();
        for (id, text) in overrides {
            response.record(*id, *text);
        }
        response
    }

    #[test]
    fn test_classify_southern_answers() {
        let p = pipeline();
        let response = full_response(&[
            ("second_person_plural", "Y'ALL"),
            ("beverage", "Coke"),
            ("yard_sale", "Yard Sale"),
        ]);

        let result = p.classify(&response).unwrap();
        assert_eq!(result.answers.get("second_person_plural"), Some("y'all"));
        assert_eq!(result.answers.get("beverage"), Some("coke"));
        assert_eq!(result.prediction.labels().len(), 3);
        assert_eq!(result.prediction.top(), Some("Georgia"));
        assert!(result.sentence().starts_with(
            "The state that most closely matches your language use is Georgia, followed by"
        ));
    }

    #[test]
    fn test_classify_all_other() {
        let p = pipeline();
        let response = full_response(&[]);

        let answers = p.normalize_response(&response).unwrap();
        assert!(answers.iter().all(|(_, a)| a == "other"));

        let features = p.encode(&answers).unwrap();
        assert_eq!(features.len(), COLUMNS.len());
        assert_eq!(features.active_slots().collect::<Vec<_>>(), vec![0]);

        let prediction = p.predict_top_k(&features, 3).unwrap();
        let labels = prediction.labels();
        assert_eq!(labels.len(), 3);
        assert!(labels[0] != labels[1] && labels[1] != labels[2] && labels[0] != labels[2]);
        assert!(prediction.probabilities().windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_free_text_is_normalized_before_encoding() {
        let p = pipeline();
        // "yinz" is not an accepted answer, so the q50_yinz column stays unused
        let response = full_response(&[("second_person_plural", "yinz")]);
        let answers = p.normalize_response(&response).unwrap();
        assert_eq!(answers.get("second_person_plural"), Some("other"));

        let features = p.encode(&answers).unwrap();
        assert_eq!(features.as_slice()[3], 0.0);
        assert_eq!(features.as_slice()[0], 1.0);
    }

    #[test]
    fn test_incomplete_response_is_rejected() {
        let p = pipeline();
        let mut response = SurveyResponse::new();
        response.record("second_person_plural", "y'all");
        assert!(matches!(
            p.classify(&response),
            Err(DialectError::IncompleteAnswers { .. })
        ));
    }

    #[test]
    fn test_schema_model_width_mismatch_is_caught_at_construction() {
        let lexicon = Lexicon::default_dialect();
        let schema = TrainingSchema::from_column_names(&COLUMNS[..5], &lexicon).unwrap();
        let result = DialectPipeline::new(lexicon, schema, knn_backend(), PipelineOptions::default());
        assert!(matches!(result, Err(DialectError::SchemaMismatch { .. })));
    }

    #[test]
    fn test_top_k_larger_than_class_count() {
        let lexicon = Lexicon::default_dialect();
        let schema = TrainingSchema::from_column_names(COLUMNS, &lexicon).unwrap();
        let options = PipelineOptions { top_k: 9, ..PipelineOptions::default() };
        let result = DialectPipeline::new(lexicon, schema, knn_backend(), options);
        assert!(matches!(result, Err(DialectError::InvalidTopK { k: 9, classes: 4 })));
    }

    #[test]
    fn test_backends_are_swappable() {
        let lexicon = Lexicon::default_dialect();
        let schema = TrainingSchema::from_column_names(COLUMNS, &lexicon).unwrap();
        let boosted = BoostedTreesModel::from_artifact(BoostedTreesArtifact {
            classes: vec!["Georgia".into(), "Minnesota".into(), "Oregon".into()],
            num_features: COLUMNS.len(),
            base_score: 0.0,
            trees: Vec::new(),
        })
        .unwrap();
        let p = DialectPipeline::new(lexicon, schema, Arc::new(boosted), PipelineOptions::default())
            .unwrap();

        let result = p.classify(&full_response(&[])).unwrap();
        // flat margins: ties resolve in class order
        assert_eq!(result.prediction.labels(), &["Georgia", "Minnesota", "Oregon"]);
    }

    #[test]
    fn test_pipeline_shared_across_threads() {
        let p = Arc::new(pipeline());
        let response = full_response(&[("second_person_plural", "you guys"), ("beverage", "pop")]);
        let expected = p.classify(&response).unwrap().prediction;

        std::thread::scope(|scope| {
            for _ in 0..4 {
                let p = Arc::clone(&p);
                let response = response.clone();
                let expected = expected.clone();
                scope.spawn(move || {
                    assert_eq!(p.classify(&response).unwrap().prediction, expected);
                });
            }
        });
    }

    #[test]
    fn test_load_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let schema_path = dir.path().join("schema.json");
        let model_path = dir.path().join("model.json");

        let mut schema_file = std::fs::File::create(&schema_path).unwrap();
        write!(schema_file, r#"{{"columns": ["q50_y'all", "q50_you_guys"]}}"#).unwrap();
        let mut model_file = std::fs::File::create(&model_path).unwrap();
        write!(
            model_file,
            r#"{{"kind": "knn", "k": 3, "weights": "distance", "samples": [
                {{"label": "Texas", "features": [1, 0]}},
                {{"label": "Ohio", "features": [0, 1]}},
                {{"label": "Iowa", "features": [0, 1]}}
            ]}}"#
        )
        .unwrap();

        let config = DialectConfig::new(&schema_path, &model_path);
        let p = DialectPipeline::load(&config).unwrap();
        assert_eq!(p.schema().len(), 2);
        assert_eq!(p.top_k(), 3);

        let result = p.classify(&full_response(&[("second_person_plural", "yall")])).unwrap();
        assert_eq!(result.prediction.top(), Some("Texas"));
    }

    #[test]
    fn test_load_without_model_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let schema_path = dir.path().join("schema.json");
        std::fs::write(&schema_path, r#"{"columns": ["q50_y'all"]}"#).unwrap();

        let config = DialectConfig::new(&schema_path, dir.path().join("missing.json"));
        let err = DialectPipeline::load(&config).err().unwrap();
        assert!(matches!(err, DialectError::ModelUnavailable(_)));
        assert!(err.is_fatal());
    }
}
