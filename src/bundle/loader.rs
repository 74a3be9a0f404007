//! ONNX loader for the bundled classifiers

use crate::bundle::manifest::BundleManifest;
use crate::types::request::ModelChoice;
use anyhow::{Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::Path;
use tracing::info;

/// Loaded ONNX classifier with metadata
pub struct LoadedModel {
    /// Which classifier this session holds
    pub choice: ModelChoice,
    /// ONNX Runtime session
    pub session: Session,
    /// Input name for the model
    pub input_name: String,
    /// Output name for the class label
    pub output_name: String,
}

/// Loader for the bundled ONNX classifiers
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
}

impl ModelLoader {
    /// Create a new model loader with default settings (1 thread)
    pub fn new() -> Result<Self> {
        Self::with_threads(1)
    }

    /// Create a new model loader with specified number of threads
    pub fn with_threads(onnx_threads: usize) -> Result<Self> {
        // Initialize ONNX Runtime
        ort::init().commit()?;
        info!(onnx_threads = onnx_threads, "ONNX Runtime initialized");
        Ok(Self { onnx_threads })
    }

    /// Load a single ONNX classifier from file
    pub fn load_model<P: AsRef<Path>>(&self, path: P, choice: ModelChoice) -> Result<LoadedModel> {
        let path = path.as_ref();

        info!(model = %choice, path = %path.display(), threads = self.onnx_threads, "Loading ONNX classifier");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(self.onnx_threads)?
            .commit_from_file(path)
            .context(format!("Failed to load classifier from {:?}", path))?;

        // Get input/output names
        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("label"))
            .map(|o| o.name.clone())
            .unwrap_or_else(|| {
                session
                    .outputs
                    .first()
                    .map(|o| o.name.clone())
                    .unwrap_or_else(|| "output_label".to_string())
            });

        info!(
            model = %choice,
            input = %input_name,
            output = %output_name,
            "Classifier loaded successfully"
        );

        Ok(LoadedModel {
            choice,
            session,
            input_name,
            output_name,
        })
    }

    /// Load every classifier listed in the manifest, in manifest order.
    ///
    /// A missing or unloadable artifact is fatal: the bundle is a single
    /// container, and a hole in it means corruption.
    pub fn load_bundle<P: AsRef<Path>>(
        &self,
        bundle_dir: P,
        manifest: &BundleManifest,
    ) -> Result<Vec<LoadedModel>> {
        let bundle_dir = bundle_dir.as_ref();
        let mut models = Vec::with_capacity(manifest.models.len());

        for entry in &manifest.models {
            let path = bundle_dir.join(&entry.file);
            let model = self
                .load_model(&path, entry.model)
                .with_context(|| format!("Bundle artifact {} is missing or corrupt", path.display()))?;
            models.push(model);
        }

        info!(
            count = models.len(),
            "Loaded {} classifiers from {}",
            models.len(),
            bundle_dir.display()
        );

        Ok(models)
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self { onnx_threads: 1 }
    }
}
