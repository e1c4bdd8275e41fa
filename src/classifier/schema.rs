use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::error::{DialectError, Result};
use crate::survey::Lexicon;
use crate::utils::category_key;


/// One feature slot fixed at training time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchemaColumn {
    pub question: String,
    pub category: String,
}

impl SchemaColumn {
    pub fn new(question: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            category: category.into(),
        }
    }
}

/// Columns may be given explicitly or as one-hot column names (`q50_you_guys`).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ColumnSpec {
    Pair { question: String, category: String },
    Encoded(String),
}

#[derive(Debug, Deserialize)]
struct SchemaFile {
    columns: Vec<ColumnSpec>,
}


/// Ordered feature slots the classifier was trained on.
#[derive(Debug, Clone)]
pub struct TrainingSchema {
    columns: Vec<SchemaColumn>,
    slots: HashMap<(String, String), usize>,
    questions: HashSet<String>,
}

impl TrainingSchema {
    pub fn new(columns: Vec<SchemaColumn>, lexicon: &Lexicon) -> Result<Self> {
        let mut slots = HashMap::with_capacity(columns.len());
        let mut questions = HashSet::new();

        for (idx, column) in columns.iter().enumerate() {
            if !lexicon.contains(&column.question) {
                return Err(DialectError::UnknownQuestion(column.question.clone()));
            }
            let key = (column.question.clone(), category_key(&column.category));
            if let Some(previous) = slots.insert(key, idx) {
                return Err(DialectError::schema_mismatch(
                    format!("unique slot for {}={}", column.question, column.category),
                    format!("duplicate columns {previous} and {idx}"),
                ));
            }
            questions.insert(column.question.clone());
        }

        Ok(Self {
            columns,
            slots,
            questions,
        })
    }

    /// Resolves training column names such as `q50_you_guys` through survey codes.
    pub fn from_column_names<S: AsRef<str>>(names: &[S], lexicon: &Lexicon) -> Result<Self> {
        let columns = names
            .iter()
            .map(|name| resolve_column_name(name.as_ref(), lexicon))
            .collect::<Result<Vec<_>>>()?;
        Self::new(columns, lexicon)
    }


    pub fn from_json_file(path: &Path, lexicon: &Lexicon) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| DialectError::model_unavailable(path, e))?;
        let file: SchemaFile =
            serde_json::from_str(&raw).map_err(|e| DialectError::model_unavailable(path, e))?;

        let columns = file
            .columns
            .into_iter()
            .map(|spec| match spec {
                ColumnSpec::Pair { question, category } => Ok(SchemaColumn::new(question, category)),
                ColumnSpec::Encoded(name) => resolve_column_name(&name, lexicon),
            })
            .collect::<Result<Vec<_>>>()?;

        let schema = Self::new(columns, lexicon)?;
        info!(
            "Loaded training schema with {} slots over {} questions from {}",
            schema.len(),
            schema.questions.len(),
            path.display()
        );
        Ok(schema)
    }


    #[must_use]
    pub fn slot(&self, question_id: &str, category: &str) -> Option<usize> {
        self.slots
            .get(&(question_id.to_string(), category_key(category)))
            .copied()
    }


    #[must_use]
    pub fn covers(&self, question_id: &str) -> bool {
        self.questions.contains(question_id)
    }


    #[must_use]
    pub fn columns(&self) -> &[SchemaColumn] {
        &self.columns
    }


    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }


    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

fn resolve_column_name(name: &str, lexicon: &Lexicon) -> Result<SchemaColumn> {
    let (code, category) = name
        .split_once('_')
        .ok_or_else(|| DialectError::UnknownQuestion(name.to_string()))?;
    let question = lexicon
        .question_by_code(code)
        .ok_or_else(|| DialectError::UnknownQuestion(name.to_string()))?;
    Ok(SchemaColumn::new(question.id.clone(), category))
}
