

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::{DialectError, Result};
use crate::{DEFAULT_FUZZY_THRESHOLD, DEFAULT_MODEL_PATH, DEFAULT_SCHEMA_PATH, DEFAULT_TOP_K};


#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DialectConfig {

    pub schema_path: PathBuf,
    pub model_path: PathBuf,
    /// Falls back to the built-in dialect lexicon when unset.
    pub lexicon_path: Option<PathBuf>,


    pub fuzzy_threshold: u8,
    pub top_k: usize,
}

impl DialectConfig {

    pub fn new(schema_path: impl Into<PathBuf>, model_path: impl Into<PathBuf>) -> Self {
        Self {
            schema_path: schema_path.into(),
            model_path: model_path.into(),
            lexicon_path: None,
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            top_k: DEFAULT_TOP_K,
        }
    }


    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("DIALECT_SCHEMA_PATH") {
            config.schema_path = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("DIALECT_MODEL_PATH") {
            config.model_path = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("DIALECT_LEXICON_PATH") {
            config.lexicon_path = Some(PathBuf::from(path));
        }
        if let Some(threshold) = std::env::var("DIALECT_FUZZY_THRESHOLD")
            .ok()
            .and_then(|t| t.parse().ok())
        {
            config.fuzzy_threshold = threshold;
        }
        if let Some(top_k) = std::env::var("DIALECT_TOP_K")
            .ok()
            .and_then(|k| k.parse().ok())
        {
            config.top_k = top_k;
        }

        config
    }

    /// Layers defaults, an optional settings file and `DIALECT_*` variables.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config: Self = builder
            .add_source(config::Environment::with_prefix("DIALECT").try_parsing(true))
            .build()
            .and_then(|settings| settings.try_deserialize())
            .map_err(|e| DialectError::Configuration(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }


    pub fn validate(&self) -> Result<()> {
        if self.fuzzy_threshold > 100 {
            return Err(DialectError::Configuration(format!(
                "fuzzy_threshold must be within 0..=100, got {}",
                self.fuzzy_threshold
            )));
        }
        if self.top_k == 0 {
            return Err(DialectError::Configuration("top_k must be at least 1".to_string()));
        }
        Ok(())
    }
}

impl Default for DialectConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SCHEMA_PATH, DEFAULT_MODEL_PATH)
    }
}
