//! Model bundle manifest and training-time preprocessing artifacts

use crate::types::request::ModelChoice;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Ordered feature column layout the classifiers were fitted against.
///
/// Column order is fixed at fit time; it is never reordered or deduplicated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrainingSchema {
    columns: Vec<String>,
}

impl TrainingSchema {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    pub fn expected_columns(&self) -> &[String] {
        &self.columns
    }

    /// Position of a named column in the fitted layout
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.as_str() == name)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Class names in the order the label encoder assigned them at fit time
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn new(classes: Vec<String>) -> Self {
        Self { classes }
    }

    /// Human-readable name for a raw output class
    pub fn class_name(&self, class: i64) -> Option<&str> {
        usize::try_from(class)
            .ok()
            .and_then(|i| self.classes.get(i))
            .map(String::as_str)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}

/// Min-max scaler parameters captured at fit time.
///
/// Carried with the bundle; request vectors are fed to the classifiers
/// unscaled, matching the fitted prediction path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinMaxScaler {
    pub data_min: Vec<f32>,
    pub data_max: Vec<f32>,
}

impl MinMaxScaler {
    pub fn len(&self) -> usize {
        self.data_min.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data_min.is_empty()
    }
}

/// One classifier artifact entry in the bundle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEntry {
    /// Which classifier this artifact holds
    pub model: ModelChoice,
    /// File name relative to the bundle directory
    pub file: String,
}

/// Bundle manifest listing the classifier artifacts in their fixed order
/// plus the preprocessing state captured at training time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleManifest {
    pub models: Vec<ModelEntry>,
    pub expected_columns: TrainingSchema,
    pub label_encoder: LabelEncoder,
    pub scaler: MinMaxScaler,
}

impl BundleManifest {
    /// Load and validate the manifest from a bundle directory
    pub fn load<P: AsRef<Path>>(bundle_dir: P) -> Result<Self> {
        let path = bundle_dir.as_ref().join("bundle.json");

        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read bundle manifest {}", path.display()))?;

        let manifest: BundleManifest = serde_json::from_str(&raw)
            .with_context(|| format!("Malformed bundle manifest {}", path.display()))?;

        manifest.validate()?;
        Ok(manifest)
    }

    /// Structural checks that make the bundle unusable when violated
    fn validate(&self) -> Result<()> {
        if self.expected_columns.is_empty() {
            bail!("Bundle manifest has an empty expected-column list");
        }
        if self.models.is_empty() {
            bail!("Bundle manifest lists no classifier artifacts");
        }
        for choice in ModelChoice::ALL {
            if !self.models.iter().any(|m| m.model == choice) {
                bail!("Bundle manifest is missing the {} classifier", choice);
            }
        }
        Ok(())
    }

    /// Non-fatal drift between bundle artifacts, reported at startup
    pub fn consistency_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.scaler.data_min.len() != self.scaler.data_max.len() {
            warnings.push(format!(
                "Scaler min/max lengths differ: {} vs {}",
                self.scaler.data_min.len(),
                self.scaler.data_max.len()
            ));
        }
        if self.scaler.len() != self.expected_columns.len() {
            warnings.push(format!(
                "Scaler covers {} features but the schema has {} columns",
                self.scaler.len(),
                self.expected_columns.len()
            ));
        }
        if self.label_encoder.classes().is_empty() {
            warnings.push("Label encoder carries no class names".to_string());
        }

        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_manifest_json() -> &'static str {
        r#"{
            "models": [
                { "model": "knn", "file": "knn.onnx" },
                { "model": "decision_tree", "file": "decision_tree.onnx" },
                { "model": "neural_net", "file": "neural_net.onnx" }
            ],
            "expected_columns": [
                "age",
                "cartype_combi",
                "cartype_family",
                "cartype_minivan",
                "cartype_sport"
            ],
            "label_encoder": ["high", "low"],
            "scaler": {
                "data_min": [0.0, 0.0, 0.0, 0.0, 0.0],
                "data_max": [30.0, 1.0, 1.0, 1.0, 1.0]
            }
        }"#
    }

    #[test]
    fn test_load_valid_manifest() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bundle.json"), valid_manifest_json()).unwrap();

        let manifest = BundleManifest::load(dir.path()).unwrap();

        assert_eq!(manifest.models.len(), 3);
        assert_eq!(manifest.models[0].model, ModelChoice::Knn);
        assert_eq!(manifest.models[1].model, ModelChoice::DecisionTree);
        assert_eq!(manifest.models[2].model, ModelChoice::NeuralNet);
        assert_eq!(manifest.expected_columns.len(), 5);
        assert_eq!(manifest.expected_columns.position("cartype_sport"), Some(4));
        assert!(manifest.consistency_warnings().is_empty());
    }

    #[test]
    fn test_missing_manifest_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(BundleManifest::load(dir.path()).is_err());
    }

    #[test]
    fn test_empty_column_list_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let json = valid_manifest_json().replace(
            r#"[
                "age",
                "cartype_combi",
                "cartype_family",
                "cartype_minivan",
                "cartype_sport"
            ]"#,
            "[]",
        );
        std::fs::write(dir.path().join("bundle.json"), json).unwrap();

        assert!(BundleManifest::load(dir.path()).is_err());
    }

    #[test]
    fn test_missing_classifier_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let json =
            valid_manifest_json().replace(r#"{ "model": "knn", "file": "knn.onnx" },"#, "");
        std::fs::write(dir.path().join("bundle.json"), json).unwrap();

        assert!(BundleManifest::load(dir.path()).is_err());
    }

    #[test]
    fn test_scaler_drift_is_a_warning_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let json = valid_manifest_json()
            .replace("[0.0, 0.0, 0.0, 0.0, 0.0]", "[0.0, 0.0]")
            .replace("[30.0, 1.0, 1.0, 1.0, 1.0]", "[30.0, 1.0]");
        std::fs::write(dir.path().join("bundle.json"), json).unwrap();

        let manifest = BundleManifest::load(dir.path()).unwrap();
        let warnings = manifest.consistency_warnings();

        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("5 columns"));
    }

    #[test]
    fn test_label_encoder_class_names() {
        let encoder = LabelEncoder::new(vec!["high".to_string(), "low".to_string()]);

        assert_eq!(encoder.class_name(0), Some("high"));
        assert_eq!(encoder.class_name(1), Some("low"));
        assert_eq!(encoder.class_name(2), None);
        assert_eq!(encoder.class_name(-1), None);
    }
}
