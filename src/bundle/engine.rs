//! Prediction engine dispatching requests to the bundled classifiers

use crate::aligner::FeatureVector;
use crate::bundle::loader::{LoadedModel, ModelLoader};
use crate::bundle::manifest::{BundleManifest, LabelEncoder, MinMaxScaler, TrainingSchema};
use crate::config::AppConfig;
use crate::types::assessment::RiskLabel;
use crate::types::request::ModelChoice;
use anyhow::{Context, Result};
use std::sync::RwLock;
use tracing::{debug, info, warn};

/// Result of one classifier run
#[derive(Debug, Clone)]
pub struct Prediction {
    /// Risk label derived from the raw class
    pub label: RiskLabel,
    /// Raw output class from the classifier
    pub raw_class: i64,
    /// Classifier that produced the prediction
    pub model: ModelChoice,
}

/// Dispatches prediction requests to one of the three bundled classifiers.
///
/// Loaded once at startup and shared read-only across request tasks; the
/// sessions themselves sit behind `RwLock` because `run` needs mutable
/// access.
pub struct PredictionEngine {
    /// Loaded classifiers in bundle order
    models: Vec<RwLock<LoadedModel>>,
    /// Column layout the classifiers were fitted against
    schema: TrainingSchema,
    /// Class names from fitting
    encoder: LabelEncoder,
    /// Scaler parameters from fitting
    scaler: MinMaxScaler,
}

impl PredictionEngine {
    /// Create a new prediction engine from configuration
    pub fn new(config: &AppConfig) -> Result<Self> {
        Self::from_bundle_dir(&config.bundle.bundle_dir, config.bundle.onnx_threads)
    }

    /// Load the bundle from a specific directory
    pub fn from_bundle_dir(bundle_dir: &str, onnx_threads: usize) -> Result<Self> {
        let manifest = BundleManifest::load(bundle_dir)?;

        for warning in manifest.consistency_warnings() {
            warn!(warning = %warning, "Bundle artifact drift");
        }

        let loader = ModelLoader::with_threads(onnx_threads)?;
        let models: Vec<RwLock<LoadedModel>> = loader
            .load_bundle(bundle_dir, &manifest)?
            .into_iter()
            .map(RwLock::new)
            .collect();

        info!(
            models = models.len(),
            columns = manifest.expected_columns.len(),
            classes = manifest.label_encoder.classes().len(),
            "Prediction engine initialized"
        );

        Ok(Self {
            models,
            schema: manifest.expected_columns,
            encoder: manifest.label_encoder,
            scaler: manifest.scaler,
        })
    }

    /// Column layout requests must be aligned to
    pub fn schema(&self) -> &TrainingSchema {
        &self.schema
    }

    /// Label encoder state from fitting
    pub fn encoder(&self) -> &LabelEncoder {
        &self.encoder
    }

    /// Scaler parameters from fitting
    pub fn scaler(&self) -> &MinMaxScaler {
        &self.scaler
    }

    /// Get the number of loaded classifiers
    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    /// Get loaded classifier names
    pub fn model_names(&self) -> Vec<String> {
        self.models
            .iter()
            .filter_map(|m| m.read().ok().map(|m| m.choice.to_string()))
            .collect()
    }

    /// Run the selected classifier on an aligned feature vector
    pub fn predict(&self, choice: ModelChoice, features: &FeatureVector) -> Result<Prediction> {
        for model_lock in &self.models {
            let is_match = {
                let model = model_lock
                    .read()
                    .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;
                model.choice == choice
            };

            if !is_match {
                continue;
            }

            let mut model = model_lock
                .write()
                .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;

            let raw_class = self.run_single_model(&mut model, features.values())?;
            let label = RiskLabel::from_class(raw_class);

            debug!(
                model = %choice,
                raw_class = raw_class,
                class_name = ?self.encoder.class_name(raw_class),
                label = %label.as_str(),
                "Classifier run complete"
            );

            return Ok(Prediction {
                label,
                raw_class,
                model: choice,
            });
        }

        // Unreachable with a validated bundle; kept as a hard error.
        anyhow::bail!("No loaded classifier for {}", choice)
    }

    /// Run a single classifier on features
    fn run_single_model(&self, model: &mut LoadedModel, features: &[f32]) -> Result<i64> {
        use ort::value::Tensor;

        // Prepare input tensor - shape [1, num_features]
        let shape = vec![1_i64, features.len() as i64];
        let input_tensor =
            Tensor::from_array((shape, features.to_vec())).context("Failed to create input tensor")?;

        let choice = model.choice;

        // Run inference
        let outputs = model
            .session
            .run(ort::inputs![&model.input_name => input_tensor])?;

        self.extract_class(&outputs, &model.output_name, choice)
    }

    /// Extract the predicted class from classifier output.
    /// Handles int64 label tensors and probability tensors (argmax).
    fn extract_class(
        &self,
        outputs: &ort::session::SessionOutputs,
        output_name: &str,
        choice: ModelChoice,
    ) -> Result<i64> {
        // First, try the label output by name
        if let Some(output) = outputs.get(output_name) {
            if let Ok((_, data)) = output.try_extract_tensor::<i64>() {
                if let Some(&class) = data.first() {
                    debug!(model = %choice, class = class, "Extracted label tensor");
                    return Ok(class);
                }
            }

            if let Ok((_, data)) = output.try_extract_tensor::<f32>() {
                if let Some(class) = class_from_probabilities(data) {
                    debug!(model = %choice, class = class, "Extracted class from probabilities");
                    return Ok(class);
                }
            }
        }

        // Fallback: iterate all outputs, label tensors first
        for (name, output) in outputs.iter() {
            if let Ok((_, data)) = output.try_extract_tensor::<i64>() {
                if let Some(&class) = data.first() {
                    debug!(model = %choice, output = %name, class = class, "Extracted label tensor (fallback)");
                    return Ok(class);
                }
            }
        }

        for (name, output) in outputs.iter() {
            if let Ok((_, data)) = output.try_extract_tensor::<f32>() {
                if let Some(class) = class_from_probabilities(data) {
                    debug!(model = %choice, output = %name, class = class, "Extracted class from probabilities (fallback)");
                    return Ok(class);
                }
            }
        }

        anyhow::bail!("Could not extract a class label from {} output", choice)
    }
}

/// Index of the most probable class.
///
/// A single-column output holds the positive-class probability.
fn class_from_probabilities(probabilities: &[f32]) -> Option<i64> {
    if probabilities.is_empty() {
        return None;
    }
    if probabilities.len() == 1 {
        return Some(if probabilities[0] >= 0.5 { 1 } else { 0 });
    }

    let mut best = 0_usize;
    for (i, &p) in probabilities.iter().enumerate() {
        if p > probabilities[best] {
            best = i;
        }
    }
    Some(best as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_carries_label_convention() {
        let prediction = Prediction {
            label: RiskLabel::from_class(0),
            raw_class: 0,
            model: ModelChoice::DecisionTree,
        };

        assert_eq!(prediction.label, RiskLabel::HighRisk);
        assert_eq!(prediction.model, ModelChoice::DecisionTree);
    }

    #[test]
    fn test_class_from_probability_pair() {
        assert_eq!(class_from_probabilities(&[0.9, 0.1]), Some(0));
        assert_eq!(class_from_probabilities(&[0.2, 0.8]), Some(1));
    }

    #[test]
    fn test_class_from_single_probability() {
        assert_eq!(class_from_probabilities(&[0.7]), Some(1));
        assert_eq!(class_from_probabilities(&[0.3]), Some(0));
    }

    #[test]
    fn test_class_from_empty_output() {
        assert_eq!(class_from_probabilities(&[]), None);
    }
}
