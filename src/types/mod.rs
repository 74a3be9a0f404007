//! Type definitions for the vehicle risk pipeline

pub mod assessment;
pub mod request;

pub use assessment::{RiskAssessment, RiskLabel};
pub use request::{ModelChoice, PredictionRequest, VehicleCategory};
