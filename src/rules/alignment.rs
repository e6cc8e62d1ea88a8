//! Employment type → acceptable source-of-funds table.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const DEFAULT_MATRIX: &[(&str, &[&str])] = &[
    (
        "Business Owner",
        &["Inheritance", "Savings", "Investments", "Pension", "Business Income"],
    ),
    (
        "Government Officer",
        &["Salary", "Inheritance", "Savings", "Investments", "Pension"],
    ),
    (
        "Self-Employed",
        &["Inheritance", "Savings", "Investments", "Pension", "Business Income"],
    ),
    (
        "State Enterprise Officer",
        &["Salary", "Inheritance", "Savings", "Investments", "Pension"],
    ),
    (
        "Freelancer",
        &["Inheritance", "Savings", "Investments", "Pension", "Salary"],
    ),
    ("Student", &["Inheritance", "Savings", "Investments"]),
    (
        "Company Employee",
        &["Salary", "Inheritance", "Savings", "Investments"],
    ),
    (
        "Politician",
        &["Salary", "Inheritance", "Savings", "Investments", "Pension"],
    ),
    (
        "Unemployed",
        &["Inheritance", "Savings", "Investments", "Pension"],
    ),
];

/// Outcome of looking up an (employment type, source) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alignment<'a> {
    Aligned,
    Misaligned { allowed: &'a [String] },
    UnknownEmploymentType,
}

/// Compliance policy data. Matching is exact after trimming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlignmentMatrix {
    allowed: BTreeMap<String, Vec<String>>,
}

impl Default for AlignmentMatrix {
    fn default() -> Self {
        Self {
            allowed: DEFAULT_MATRIX
                .iter()
                .map(|(kind, sources)| {
                    (
                        kind.to_string(),
                        sources.iter().map(|s| s.to_string()).collect(),
                    )
                })
                .collect(),
        }
    }
}

impl AlignmentMatrix {
    pub fn new(allowed: BTreeMap<String, Vec<String>>) -> Self {
        Self { allowed }
    }

    /// Load from a JSON object of `{"Employment type": ["Source", ...]}`.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let matrix: Self = serde_json::from_str(json)
            .map_err(|e| ConfigError::ParseError(format!("alignment matrix: {}", e)))?;
        if matrix.allowed.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "ALIGNMENT_MATRIX_PATH".into(),
                message: "alignment matrix has no employment types".into(),
            });
        }
        Ok(matrix)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let matrix = Self::from_json(&json)?;
        tracing::info!(
            path = %path.display(),
            employment_types = matrix.allowed.len(),
            "Loaded alignment matrix"
        );
        Ok(matrix)
    }

    pub fn check(&self, employment_type: &str, source_of_funds: &str) -> Alignment<'_> {
        match self.allowed.get(employment_type.trim()) {
            None => Alignment::UnknownEmploymentType,
            Some(allowed) if allowed.iter().any(|s| s == source_of_funds.trim()) => {
                Alignment::Aligned
            }
            Some(allowed) => Alignment::Misaligned { allowed },
        }
    }

    /// One line per employment type, for prompts.
    pub fn render(&self) -> String {
        self.allowed
            .iter()
            .map(|(kind, sources)| format!("- {}: {}", kind, sources.join(", ")))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_matrix_lookups() {
        let matrix = AlignmentMatrix::default();
        assert_eq!(matrix.check("Student", "Savings"), Alignment::Aligned);
        assert_eq!(matrix.check(" Company Employee ", "Salary "), Alignment::Aligned);
        assert!(matches!(
            matrix.check("Student", "Business Income"),
            Alignment::Misaligned { allowed } if allowed.len() == 3
        ));
        assert_eq!(
            matrix.check("Astronaut", "Salary"),
            Alignment::UnknownEmploymentType
        );
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let matrix = AlignmentMatrix::default();
        assert!(matches!(
            matrix.check("Student", "savings"),
            Alignment::Misaligned { .. }
        ));
    }

    #[test]
    fn test_render_lists_every_type() {
        let rendered = AlignmentMatrix::default().render();
        assert_eq!(rendered.lines().count(), 9);
        assert!(rendered.contains("- Student: Inheritance, Savings, Investments"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"Retiree": ["Pension", "Savings"]}}"#).unwrap();

        let matrix = AlignmentMatrix::load(file.path()).unwrap();

        assert_eq!(matrix.check("Retiree", "Pension"), Alignment::Aligned);
        assert_eq!(
            matrix.check("Student", "Savings"),
            Alignment::UnknownEmploymentType
        );
    }

    #[test]
    fn test_empty_or_malformed_matrix_is_rejected() {
        assert!(matches!(
            AlignmentMatrix::from_json("{}"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            AlignmentMatrix::from_json("[1, 2]"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AlignmentMatrix::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
