//! Few-shot question/query pairs

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::DomainError;

/// A worked example shown to the generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FewShotExample {
    #[serde(rename = "user_question")]
    pub question: String,
    #[serde(rename = "sql_schema")]
    pub query: String,
}

impl FewShotExample {
    pub fn new(question: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            query: query.into(),
        }
    }
}

/// Ordered collection of few-shot examples
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FewShotExamples(Vec<FewShotExample>);

impl FewShotExamples {
    pub fn new(examples: Vec<FewShotExample>) -> Self {
        Self(examples)
    }

    /// Examples shipped with the service
    pub fn builtin() -> Self {
        Self(vec![
            FewShotExample::new(
                "Which phones have 5G?",
                "SELECT name, network_5g_bands FROM samsung_phones WHERE network_5g_bands != '' AND network_5g_bands IS NOT NULL LIMIT 5",
            ),
            FewShotExample::new(
                "Compare Galaxy S25 and S24 cameras",
                "SELECT name, main_camera, selfie_camera, main_camera_features FROM samsung_phones WHERE name ILIKE '%Galaxy S25%' OR name ILIKE '%Galaxy S24%'",
            ),
        ])
    }

    pub fn from_json_str(content: &str) -> Result<Self, DomainError> {
        let examples: Vec<FewShotExample> = serde_json::from_str(content)
            .map_err(|e| DomainError::configuration(format!("Invalid few-shot file: {}", e)))?;

        Ok(Self(examples))
    }

    /// Load examples from a JSON file, using the built-in set when the file is missing
    pub fn load_or_builtin(path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let path = path.as_ref();

        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_json_str(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "Few-shot file not found, using built-in examples");
                Ok(Self::builtin())
            }
            Err(e) => Err(DomainError::configuration(format!(
                "Failed to read few-shot file {}: {}",
                path.display(),
                e
            ))),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FewShotExample> {
        self.0.iter()
    }

    /// Prompt rendering, one "Question/SQL" pair per block
    pub fn render(&self) -> String {
        if self.0.is_empty() {
            return "No examples available.".to_string();
        }

        self.0
            .iter()
            .map(|ex| format!("Question: {}\nSQL: {}", ex.question, ex.query))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
