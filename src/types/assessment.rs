//! Risk assessment data structures

use crate::types::request::ModelChoice;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Binary risk label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLabel {
    HighRisk,
    LowRisk,
}

impl RiskLabel {
    /// Map a classifier's raw output class to a label.
    ///
    /// Class 0 is the high-risk class in the training data; every other
    /// class maps to low risk.
    pub fn from_class(class: i64) -> Self {
        if class == 0 {
            RiskLabel::HighRisk
        } else {
            RiskLabel::LowRisk
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLabel::HighRisk => "high_risk",
            RiskLabel::LowRisk => "low_risk",
        }
    }
}

/// Assessment published for every prediction request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Unique assessment identifier
    pub assessment_id: String,

    /// Associated request ID
    pub request_id: String,

    /// Classifier that produced the assessment
    pub model: ModelChoice,

    /// Risk label, absent when inference failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<RiskLabel>,

    /// Raw output class from the classifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_class: Option<i64>,

    /// Error message when inference failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Assessment generation timestamp
    pub timestamp: DateTime<Utc>,
}

impl RiskAssessment {
    /// Create a successful assessment from a classifier's raw output class
    pub fn success(request_id: String, model: ModelChoice, raw_class: i64) -> Self {
        Self {
            assessment_id: uuid::Uuid::new_v4().to_string(),
            request_id,
            model,
            label: Some(RiskLabel::from_class(raw_class)),
            raw_class: Some(raw_class),
            error: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a failure assessment carrying the inference error
    pub fn failure(request_id: String, model: ModelChoice, error: String) -> Self {
        Self {
            assessment_id: uuid::Uuid::new_v4().to_string(),
            request_id,
            model,
            label: None,
            raw_class: None,
            error: Some(error),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_from_class() {
        assert_eq!(RiskLabel::from_class(0), RiskLabel::HighRisk);
        assert_eq!(RiskLabel::from_class(1), RiskLabel::LowRisk);
        assert_eq!(RiskLabel::from_class(2), RiskLabel::LowRisk);
        assert_eq!(RiskLabel::from_class(-1), RiskLabel::LowRisk);
    }

    #[test]
    fn test_assessment_serialization() {
        let assessment = RiskAssessment::success("req_123".to_string(), ModelChoice::Knn, 0);

        let json = serde_json::to_string(&assessment).unwrap();
        let deserialized: RiskAssessment = serde_json::from_str(&json).unwrap();

        assert_eq!(assessment.request_id, deserialized.request_id);
        assert_eq!(deserialized.label, Some(RiskLabel::HighRisk));
        assert_eq!(deserialized.raw_class, Some(0));
        assert!(deserialized.error.is_none());
    }

    #[test]
    fn test_failure_assessment() {
        let assessment = RiskAssessment::failure(
            "req_456".to_string(),
            ModelChoice::NeuralNet,
            "shape mismatch".to_string(),
        );

        assert!(assessment.label.is_none());
        assert!(assessment.raw_class.is_none());
        assert_eq!(assessment.error.as_deref(), Some("shape mismatch"));

        let json = serde_json::to_string(&assessment).unwrap();
        assert!(!json.contains("\"label\""));
        assert!(json.contains("shape mismatch"));
    }
}
