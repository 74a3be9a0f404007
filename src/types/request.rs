//! Prediction request data structures for vehicle risk assessment

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Vehicle category as offered by the submitting form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleCategory {
    Combi,
    Family,
    Sport,
    Minivan,
}

impl VehicleCategory {
    /// Categories known at training time, in a fixed order
    pub const ALL: [Self; 4] = [Self::Combi, Self::Family, Self::Sport, Self::Minivan];

    /// Indicator column name produced by the training-time dummy expansion
    pub fn indicator_column(&self) -> &'static str {
        match self {
            VehicleCategory::Combi => "cartype_combi",
            VehicleCategory::Family => "cartype_family",
            VehicleCategory::Sport => "cartype_sport",
            VehicleCategory::Minivan => "cartype_minivan",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleCategory::Combi => "combi",
            VehicleCategory::Family => "family",
            VehicleCategory::Sport => "sport",
            VehicleCategory::Minivan => "minivan",
        }
    }
}

impl fmt::Display for VehicleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifier selected by the submitter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelChoice {
    #[serde(alias = "KNN", alias = "Knn")]
    Knn,
    #[serde(alias = "DecisionTree", alias = "Dt", alias = "dt")]
    DecisionTree,
    #[serde(alias = "NeuralNet", alias = "Nn", alias = "nn")]
    NeuralNet,
}

impl ModelChoice {
    /// All selectable classifiers, in bundle order
    pub const ALL: [Self; 3] = [Self::Knn, Self::DecisionTree, Self::NeuralNet];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelChoice::Knn => "knn",
            ModelChoice::DecisionTree => "decision_tree",
            ModelChoice::NeuralNet => "neural_net",
        }
    }
}

impl fmt::Display for ModelChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One risk prediction request submitted by the form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRequest {
    /// Unique request identifier
    pub request_id: String,

    /// Vehicle age in years (bounded by the form, not by this service)
    pub age: u32,

    /// Vehicle category
    #[serde(alias = "cartype")]
    pub vehicle_category: VehicleCategory,

    /// Classifier to dispatch to
    #[serde(alias = "model")]
    pub model_choice: ModelChoice,

    /// Submission timestamp
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl PredictionRequest {
    /// Create a new prediction request
    pub fn new(
        request_id: String,
        age: u32,
        vehicle_category: VehicleCategory,
        model_choice: ModelChoice,
    ) -> Self {
        Self {
            request_id,
            age,
            vehicle_category,
            model_choice,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let request = PredictionRequest::new(
            "req_123".to_string(),
            5,
            VehicleCategory::Sport,
            ModelChoice::Knn,
        );

        let json = serde_json::to_string(&request).unwrap();
        let deserialized: PredictionRequest = serde_json::from_str(&json).unwrap();

        assert_eq!(request.request_id, deserialized.request_id);
        assert_eq!(request.age, deserialized.age);
        assert_eq!(request.vehicle_category, deserialized.vehicle_category);
        assert_eq!(request.model_choice, deserialized.model_choice);
    }

    #[test]
    fn test_model_choice_aliases() {
        let knn: ModelChoice = serde_json::from_str("\"KNN\"").unwrap();
        let tree: ModelChoice = serde_json::from_str("\"DecisionTree\"").unwrap();
        let nn: ModelChoice = serde_json::from_str("\"NeuralNet\"").unwrap();

        assert_eq!(knn, ModelChoice::Knn);
        assert_eq!(tree, ModelChoice::DecisionTree);
        assert_eq!(nn, ModelChoice::NeuralNet);
    }

    #[test]
    fn test_unknown_model_choice_rejected() {
        let result = serde_json::from_str::<ModelChoice>("\"gradient_boost\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_indicator_columns() {
        assert_eq!(VehicleCategory::Combi.indicator_column(), "cartype_combi");
        assert_eq!(VehicleCategory::Minivan.indicator_column(), "cartype_minivan");
        assert_eq!(VehicleCategory::ALL.len(), 4);
    }
}
