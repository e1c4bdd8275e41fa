use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::{BackendKind, ClassifierBackend};
use crate::core::error::{DialectError, Result};


#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: usize,
    #[serde(default)]
    pub feature: Option<usize>,
    #[serde(default)]
    pub threshold: Option<f32>,
    #[serde(default)]
    pub yes: Option<usize>,
    #[serde(default)]
    pub no: Option<usize>,
    #[serde(default)]
    pub missing: Option<usize>,
    #[serde(default)]
    pub leaf: Option<f64>,
}


#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeSpec {
    /// Defaults to the tree's position modulo the class count.
    #[serde(default)]
    pub class_index: Option<usize>,
    pub nodes: Vec<NodeSpec>,
}


#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoostedTreesArtifact {
    pub classes: Vec<String>,
    pub num_features: usize,
    #[serde(default)]
    pub base_score: f64,
    pub trees: Vec<TreeSpec>,
}

#[derive(Debug, Clone)]
enum TreeNode {
    Split {
        feature: usize,
        threshold: f32,
        yes: usize,
        no: usize,
        missing: usize,
    },
    Leaf(f64),
}

#[derive(Debug, Clone)]
struct Tree {
    class_index: usize,
    nodes: Vec<TreeNode>,
}

impl Tree {
    fn score(&self, features: &[f32]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf(value) => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    yes,
                    no,
                    missing,
                } => {
                    let x = features[*feature];
                    idx = if x.is_nan() {
                        *missing
                    } else if x < *threshold {
                        *yes
                    } else {
                        *no
                    };
                }
            }
        }
    }
}


/// Multi-class gradient-boosted tree ensemble with softmax output.
#[derive(Debug, Clone)]
pub struct BoostedTreesModel {
    classes: Vec<String>,
    num_features: usize,
    base_score: f64,
    trees: Vec<Tree>,
}

impl BoostedTreesModel {
    pub fn from_artifact(artifact: BoostedTreesArtifact) -> Result<Self> {
        if artifact.classes.is_empty() {
            return Err(DialectError::ModelUnavailable(
                "boosted trees model has no classes".to_string(),
            ));
        }
        let num_classes = artifact.classes.len();
        if artifact.classes.iter().collect::<HashSet<_>>().len() != num_classes {
            return Err(DialectError::ModelUnavailable(
                "boosted trees classes contain duplicate labels".to_string(),
            ));
        }

        let trees = artifact
            .trees
            .into_iter()
            .enumerate()
            .map(|(position, spec)| {
                let class_index = spec.class_index.unwrap_or(position % num_classes);
                if class_index >= num_classes {
                    return Err(invalid_tree(position, format!("class_index {class_index} out of range")));
                }
                let nodes = build_nodes(position, &spec.nodes, artifact.num_features)?;
                Ok(Tree { class_index, nodes })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            classes: artifact.classes,
            num_features: artifact.num_features,
            base_score: artifact.base_score,
            trees,
        })
    }


    #[must_use]
    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }
}

fn invalid_tree(position: usize, reason: impl std::fmt::Display) -> DialectError {
    DialectError::ModelUnavailable(format!("tree {position}: {reason}"))
}

/// Children must have larger ids than their parent, so evaluation always ends at a leaf.
fn build_nodes(position: usize, specs: &[NodeSpec], num_features: usize) -> Result<Vec<TreeNode>> {
    let index: HashMap<usize, usize> = specs.iter().enumerate().map(|(i, n)| (n.id, i)).collect();
    if index.len() != specs.len() {
        return Err(invalid_tree(position, "duplicate node ids"));
    }
    if !index.contains_key(&0) {
        return Err(invalid_tree(position, "missing root node 0"));
    }

    // root first, then the rest in id order
    let mut ordered: Vec<&NodeSpec> = specs.iter().collect();
    ordered.sort_by_key(|n| n.id);
    let slot: HashMap<usize, usize> = ordered.iter().enumerate().map(|(i, n)| (n.id, i)).collect();

    let child = |parent: usize, id: Option<usize>| -> Result<usize> {
        let id = id.ok_or_else(|| invalid_tree(position, format!("node {parent} is missing a child")))?;
        if id <= parent {
            return Err(invalid_tree(position, format!("node {parent} points back to {id}")));
        }
        slot.get(&id)
            .copied()
            .ok_or_else(|| invalid_tree(position, format!("node {parent} references unknown node {id}")))
    };

    ordered
        .iter()
        .map(|spec| {
            if let Some(value) = spec.leaf {
                return Ok(TreeNode::Leaf(value));
            }
            let feature = spec
                .feature
                .ok_or_else(|| invalid_tree(position, format!("node {} has no feature", spec.id)))?;
            if feature >= num_features {
                return Err(invalid_tree(
                    position,
                    format!("node {} uses feature {feature} of {num_features}", spec.id),
                ));
            }
            let threshold = spec
                .threshold
                .ok_or_else(|| invalid_tree(position, format!("node {} has no threshold", spec.id)))?;
            let yes = child(spec.id, spec.yes)?;
            let no = child(spec.id, spec.no)?;
            let missing = match spec.missing {
                Some(_) => child(spec.id, spec.missing)?,
                None => yes,
            };
            Ok(TreeNode::Split {
                feature,
                threshold,
                yes,
                no,
                missing,
            })
        })
        .collect()
}

fn softmax(margins: &[f64]) -> Vec<f64> {
    let max = margins.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = margins.iter().map(|m| (m - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

impl ClassifierBackend for BoostedTreesModel {
    fn kind(&self) -> BackendKind {
        BackendKind::BoostedTrees
    }

    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn input_width(&self) -> usize {
        self.num_features
    }

    fn predict_proba(&self, features: &[f32]) -> Result<Vec<f64>> {
        if features.len() != self.num_features {
            return Err(DialectError::schema_mismatch(
                format!("{} features", self.num_features),
                format!("{} features", features.len()),
            ));
        }
        let mut margins = vec![self.base_score; self.classes.len()];
        for tree in &self.trees {
            margins[tree.class_index] += tree.score(features);
        }
        Ok(softmax(&margins))
    }
}
