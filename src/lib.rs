//! Vehicle Risk Pipeline Library
//!
//! A real-time vehicle insurance risk assessment service: aligns raw form
//! submissions to the training-time feature schema and dispatches them to
//! one of three bundled classifiers.

pub mod aligner;
pub mod bundle;
pub mod config;
pub mod consumer;
pub mod metrics;
pub mod producer;
pub mod types;

pub use aligner::{FeatureAligner, FeatureVector};
pub use bundle::engine::PredictionEngine;
pub use config::AppConfig;
pub use consumer::RequestConsumer;
pub use producer::AssessmentProducer;
pub use types::{assessment::RiskAssessment, request::PredictionRequest};
