use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};

use super::{BackendKind, ClassifierBackend};
use crate::core::error::{DialectError, Result};


#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, EnumString, IntoStaticStr, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum KnnWeights {
    #[default]
    Uniform,
    /// Inverse-distance votes; exact matches take all the weight.
    Distance,
}


#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnnSample {
    pub label: String,
    pub features: Vec<f32>,
}


#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnnArtifact {
    pub k: usize,
    #[serde(default)]
    pub weights: KnnWeights,
    /// Defaults to the sorted distinct sample labels.
    #[serde(default)]
    pub classes: Option<Vec<String>>,
    pub samples: Vec<KnnSample>,
}


/// Brute-force k-nearest-neighbor classifier over one-hot answer vectors.
#[derive(Debug, Clone)]
pub struct KnnModel {
    k: usize,
    weights: KnnWeights,
    classes: Vec<String>,
    width: usize,
    samples: Vec<(Vec<f32>, usize)>,
}

impl KnnModel {
    pub fn from_artifact(artifact: KnnArtifact) -> Result<Self> {
        let KnnArtifact {
            k,
            weights,
            classes,
            samples,
        } = artifact;

        if samples.is_empty() {
            return Err(DialectError::ModelUnavailable("knn model has no samples".to_string()));
        }
        if k == 0 || k > samples.len() {
            return Err(DialectError::ModelUnavailable(format!(
                "knn k={} must be within 1..={}",
                k,
                samples.len()
            )));
        }

        let classes = classes.unwrap_or_else(|| {
            samples
                .iter()
                .map(|s| s.label.clone())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        });
        if classes.iter().collect::<HashSet<_>>().len() != classes.len() {
            return Err(DialectError::ModelUnavailable(
                "knn classes contain duplicate labels".to_string(),
            ));
        }

        let width = samples[0].features.len();
        let mut indexed = Vec::with_capacity(samples.len());
        for (row, sample) in samples.into_iter().enumerate() {
            if sample.features.len() != width {
                return Err(DialectError::ModelUnavailable(format!(
                    "knn sample {} has {} features, expected {}",
                    row,
                    sample.features.len(),
                    width
                )));
            }
            let class_idx = classes
                .iter()
                .position(|c| *c == sample.label)
                .ok_or_else(|| {
                    DialectError::ModelUnavailable(format!(
                        "knn sample {} has unknown label '{}'",
                        row, sample.label
                    ))
                })?;
            indexed.push((sample.features, class_idx));
        }

        Ok(Self {
            k,
            weights,
            classes,
            width,
            samples: indexed,
        })
    }


    #[must_use]
    pub fn k(&self) -> usize {
        self.k
    }


    #[must_use]
    pub fn weights(&self) -> KnnWeights {
        self.weights
    }
}

fn squared_distance(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = f64::from(*x) - f64::from(*y);
            d * d
        })
        .sum()
}

impl ClassifierBackend for KnnModel {
    fn kind(&self) -> BackendKind {
        BackendKind::Knn
    }

    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn input_width(&self) -> usize {
        self.width
    }

    fn predict_proba(&self, features: &[f32]) -> Result<Vec<f64>> {
        if features.len() != self.width {
            return Err(DialectError::schema_mismatch(
                format!("{} features", self.width),
                format!("{} features", features.len()),
            ));
        }
        let mut neighbors: Vec<(f64, usize)> = self
            .samples
            .iter()
            .map(|(row, class_idx)| (squared_distance(row, features), *class_idx))
            .collect();
        // stable: equidistant neighbors keep training order
        neighbors.sort_by(|a, b| a.0.total_cmp(&b.0));
        neighbors.truncate(self.k);

        let mut votes = vec![0.0_f64; self.classes.len()];
        match self.weights {
            KnnWeights::Uniform => {
                for (_, class_idx) in &neighbors {
                    votes[*class_idx] += 1.0;
                }
            }
            KnnWeights::Distance => {
                let exact = neighbors.iter().any(|(d, _)| *d == 0.0);
                for (d, class_idx) in &neighbors {
                    votes[*class_idx] += match (exact, *d == 0.0) {
                        (true, true) => 1.0,
                        (true, false) => 0.0,
                        _ => 1.0 / d.sqrt(),
                    };
                }
            }
        }

        let total: f64 = votes.iter().sum();
        if total > 0.0 {
            for vote in &mut votes {
                *vote /= total;
            }
        }
        Ok(votes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(label: &str, features: &[f32]) -> KnnSample {
        KnnSample {
            label: label.to_string(),
            features: features.to_vec(),
        }
    }

    fn model(k: usize, weights: KnnWeights) -> KnnModel {
        KnnModel::from_artifact(KnnArtifact {
            k,
            weights,
            classes: None,
            samples: vec![
                sample("Texas", &[1.0, 0.0, 0.0]),
                sample("Texas", &[1.0, 0.0, 1.0]),
                sample("Ohio", &[0.0, 1.0, 0.0]),
                sample("Maine", &[0.0, 0.0, 1.0]),
            ],
        })
        .unwrap()
    }

    #[test]
    fn test_classes_default_to_sorted_labels() {
        let m = model(3, KnnWeights::Uniform);
        assert_eq!(m.classes(), &["Maine", "Ohio", "Texas"]);
        assert_eq!(m.input_width(), 3);
    }

    #[test]
    fn test_uniform_vote_shares() {
        let m = model(3, KnnWeights::Uniform);
        let proba = m.predict_proba(&[1.0, 0.0, 0.0]).unwrap();
        // neighbors: Texas (0), Texas (1), then Ohio/Maine at sqrt(2): Ohio first in training order
        assert_eq!(proba, vec![0.0, 1.0 / 3.0, 2.0 / 3.0]);
        assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_distance_weights_exact_match_takes_all() {
        let m = model(3, KnnWeights::Distance);
        let proba = m.predict_proba(&[0.0, 1.0, 0.0]).unwrap();
        assert_eq!(proba, vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_distance_weights_inverse() {
        let m = model(2, KnnWeights::Distance);
        let proba = m.predict_proba(&[0.5, 0.5, 0.0]).unwrap();
        // Texas(1,0,0) and Ohio(0,1,0) tie at sqrt(0.5)
        assert!((proba[1] - 0.5).abs() < 1e-9);
        assert!((proba[2] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_artifacts() {
        let too_big_k = KnnModel::from_artifact(KnnArtifact {
            k: 5,
            weights: KnnWeights::Uniform,
            classes: None,
            samples: vec![sample("Ohio", &[1.0])],
        });
        assert!(matches!(too_big_k, Err(DialectError::ModelUnavailable(_))));

        let ragged = KnnModel::from_artifact(KnnArtifact {
            k: 1,
            weights: KnnWeights::Uniform,
            classes: None,
            samples: vec![sample("Ohio", &[1.0]), sample("Iowa", &[1.0, 0.0])],
        });
        assert!(matches!(ragged, Err(DialectError::ModelUnavailable(_))));

        let unknown_label = KnnModel::from_artifact(KnnArtifact {
            k: 1,
            weights: KnnWeights::Uniform,
            classes: Some(vec!["Ohio".to_string()]),
            samples: vec![sample("Iowa", &[1.0])],
        });
        assert!(matches!(unknown_label, Err(DialectError::ModelUnavailable(_))));
    }

    #[test]
    fn test_rejects_duplicate_classes() {
        let duplicated = KnnModel::from_artifact(KnnArtifact {
            k: 1,
            weights: KnnWeights::Uniform,
            classes: Some(vec!["Ohio".to_string(), "Ohio".to_string(), "Iowa".to_string()]),
            samples: vec![sample("Ohio", &[1.0]), sample("Iowa", &[0.0])],
        });
        assert!(matches!(duplicated, Err(DialectError::ModelUnavailable(_))));
    }

    #[test]
    fn test_wrong_width_is_rejected() {
        let m = model(3, KnnWeights::Uniform);
        assert!(matches!(
            m.predict_proba(&[1.0, 0.0]),
            Err(DialectError::SchemaMismatch { .. })
        ));
        assert!(matches!(
            m.predict_proba(&[1.0, 0.0, 0.0, 0.0]),
            Err(DialectError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_weights_parse() {
        use std::str::FromStr;
        assert_eq!(KnnWeights::from_str("distance").unwrap(), KnnWeights::Distance);
        let name: &'static str = KnnWeights::Uniform.into();
        assert_eq!(name, "uniform");
    }
}
