

pub mod boosted;
pub mod encoder;
pub mod knn;
pub mod loader;
pub mod schema;

pub use boosted::{BoostedTreesArtifact, BoostedTreesModel};
pub use encoder::{encode, FeatureVector};
pub use knn::{KnnArtifact, KnnModel, KnnSample, KnnWeights};
pub use loader::{load_backend, ModelArtifact};
pub use schema::{SchemaColumn, TrainingSchema};

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use strum::{Display, EnumString, IntoStaticStr};
use tracing::debug;

use crate::core::error::{DialectError, Result};


#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum BackendKind {
    Knn,
    BoostedTrees,
    Custom,
}

/// A trained model producing one probability per class for a feature vector.
///
/// Implementations are read-only after load and shared across threads.
pub trait ClassifierBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Class labels in the model's native order.
    fn classes(&self) -> &[String];

    fn input_width(&self) -> usize;

    fn predict_proba(&self, features: &[f32]) -> Result<Vec<f64>>;
}

/// A model whose inference needs exclusive access.
pub trait StatefulBackend: Send {
    fn classes(&self) -> Vec<String>;

    fn input_width(&self) -> usize;

    fn predict_proba(&mut self, features: &[f32]) -> Result<Vec<f64>>;
}

/// Serializes calls into a [`StatefulBackend`] behind a mutex.
pub struct LockedBackend<B> {
    inner: Mutex<B>,
    classes: Vec<String>,
    width: usize,
}

impl<B: StatefulBackend> LockedBackend<B> {
    pub fn new(backend: B) -> Self {
        Self {
            classes: backend.classes(),
            width: backend.input_width(),
            inner: Mutex::new(backend),
        }
    }
}

impl<B: StatefulBackend> ClassifierBackend for LockedBackend<B> {
    fn kind(&self) -> BackendKind {
        BackendKind::Custom
    }

    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn input_width(&self) -> usize {
        self.width
    }

    fn predict_proba(&self, features: &[f32]) -> Result<Vec<f64>> {
        self.inner.lock().predict_proba(features)
    }
}


/// Ranked region labels, most probable first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    labels: Vec<String>,
    probabilities: Vec<f64>,
}

impl Prediction {
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }


    #[must_use]
    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }


    #[must_use]
    pub fn top(&self) -> Option<&str> {
        self.labels.first().map(String::as_str)
    }

    /// "The state that most closely matches your language use is X, followed by Y and Z"
    #[must_use]
    pub fn to_sentence(&self) -> String {
        let mut sentence = String::from("The state that most closely matches your language use");
        match self.labels.as_slice() {
            [] => sentence.push_str(" could not be determined"),
            [first] => sentence.push_str(&format!(" is {first}")),
            [first, second] => sentence.push_str(&format!(" is {first}, followed by {second}")),
            [first, middle @ .., last] => {
                sentence.push_str(&format!(" is {first}, followed by {}", middle.join(", ")));
                sentence.push_str(&format!(" and {last}"));
            }
        }
        sentence
    }
}


/// Ranks a backend's class probabilities for one encoded answer set.
#[derive(Clone)]
pub struct ClassifierAdapter {
    backend: Arc<dyn ClassifierBackend>,
}

impl ClassifierAdapter {
    pub fn new(backend: Arc<dyn ClassifierBackend>) -> Self {
        Self { backend }
    }


    #[must_use]
    pub fn backend(&self) -> &dyn ClassifierBackend {
        self.backend.as_ref()
    }

    pub fn predict_top_k(&self, features: &FeatureVector, k: usize) -> Result<Prediction> {
        let width = self.backend.input_width();
        if features.len() != width {
            return Err(DialectError::schema_mismatch(
                format!("{width} features"),
                format!("{} features", features.len()),
            ));
        }

        let classes = self.backend.classes();
        if k == 0 || k > classes.len() {
            return Err(DialectError::InvalidTopK {
                k,
                classes: classes.len(),
            });
        }

        let proba = self.backend.predict_proba(features.as_slice())?;
        if proba.len() != classes.len() {
            return Err(DialectError::schema_mismatch(
                format!("{} class probabilities", classes.len()),
                format!("{} class probabilities", proba.len()),
            ));
        }

        let score = |idx: usize| if proba[idx].is_nan() { f64::NEG_INFINITY } else { proba[idx] };
        let mut order: Vec<usize> = (0..classes.len()).collect();
        // stable: equal probabilities keep the model's class order
        order.sort_by(|&a, &b| score(b).total_cmp(&score(a)));
        order.truncate(k);

        let prediction = Prediction {
            labels: order.iter().map(|&idx| classes[idx].clone()).collect(),
            probabilities: order.iter().map(|&idx| proba[idx]).collect(),
        };
        debug!(backend = %self.backend.kind(), labels = ?prediction.labels, "Ranked prediction");
        Ok(prediction)
    }
}
