use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use super::boosted::{BoostedTreesArtifact, BoostedTreesModel};
use super::knn::{KnnArtifact, KnnModel};
use super::ClassifierBackend;
use crate::core::error::{DialectError, Result};


#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    Knn(KnnArtifact),
    BoostedTrees(BoostedTreesArtifact),
}

impl ModelArtifact {
    pub fn into_backend(self) -> Result<Arc<dyn ClassifierBackend>> {
        Ok(match self {
            Self::Knn(artifact) => Arc::new(KnnModel::from_artifact(artifact)?),
            Self::BoostedTrees(artifact) => Arc::new(BoostedTreesModel::from_artifact(artifact)?),
        })
    }
}

/// Reads a model artifact once at startup. Every failure is `ModelUnavailable`.
pub fn load_backend(path: &Path) -> Result<Arc<dyn ClassifierBackend>> {
    let raw = std::fs::read_to_string(path).map_err(|e| DialectError::model_unavailable(path, e))?;
    let artifact: ModelArtifact =
        serde_json::from_str(&raw).map_err(|e| DialectError::model_unavailable(path, e))?;

    let backend = artifact.into_backend().map_err(|e| match e {
        DialectError::ModelUnavailable(reason) => DialectError::model_unavailable(path, reason),
        other => other,
    })?;

    info!(
        "Loaded {} model from {} ({} classes, {} features)",
        backend.kind(),
        path.display(),
        backend.classes().len(),
        backend.input_width()
    );
    Ok(backend)
}
