//! Model bundle loading and inference components

pub mod engine;
pub mod loader;
pub mod manifest;

pub use engine::PredictionEngine;
pub use loader::ModelLoader;
pub use manifest::{BundleManifest, LabelEncoder, MinMaxScaler, TrainingSchema};
