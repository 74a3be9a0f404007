//! Feature alignment for vehicle risk model inference.
//!
//! This module projects a raw prediction request onto the column layout
//! the classifiers were fitted against. Expansion matches the training
//! pipeline: a numeric age column plus one indicator column per vehicle
//! category.

use crate::bundle::manifest::TrainingSchema;
use crate::types::request::{PredictionRequest, VehicleCategory};

/// Numeric column holding the vehicle age
const AGE_COLUMN: &str = "age";

/// Feature vector in training-schema order.
///
/// Holds exactly the schema's columns, each exactly once, in schema order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    columns: Vec<String>,
    values: Vec<f32>,
}

impl FeatureVector {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at a named column, if the schema contains it
    pub fn get(&self, column: &str) -> Option<f32> {
        self.columns
            .iter()
            .position(|c| c.as_str() == column)
            .map(|i| self.values[i])
    }
}

/// Aligns raw requests to the training-time column layout.
pub struct FeatureAligner;

impl FeatureAligner {
    /// Create a new feature aligner.
    pub fn new() -> Self {
        Self
    }

    /// Expand a request into its pre-alignment feature set.
    ///
    /// One indicator per known category plus the raw age column, in
    /// expansion order.
    fn expand(record: &PredictionRequest) -> Vec<(&'static str, f32)> {
        let mut features = Vec::with_capacity(1 + VehicleCategory::ALL.len());
        features.push((AGE_COLUMN, record.age as f32));

        for category in VehicleCategory::ALL {
            let value = if category == record.vehicle_category {
                1.0
            } else {
                0.0
            };
            features.push((category.indicator_column(), value));
        }

        features
    }

    /// Align one request to the schema.
    ///
    /// The output has exactly the schema's columns, in schema order.
    /// Expected columns the expansion does not produce stay 0; expansion
    /// columns the schema does not expect are dropped.
    pub fn align(&self, record: &PredictionRequest, schema: &TrainingSchema) -> FeatureVector {
        let expanded = Self::expand(record);

        let mut values = vec![0.0_f32; schema.len()];
        for (name, value) in expanded {
            if let Some(pos) = schema.position(name) {
                values[pos] = value;
            }
        }

        FeatureVector {
            columns: schema.expected_columns().to_vec(),
            values,
        }
    }

    /// Expected columns that no request expansion can ever populate.
    ///
    /// Checked once at startup; such columns stay 0 for every request.
    pub fn check_schema(&self, schema: &TrainingSchema) -> Vec<String> {
        let mut producible = vec![AGE_COLUMN];
        producible.extend(VehicleCategory::ALL.iter().map(|c| c.indicator_column()));

        schema
            .expected_columns()
            .iter()
            .filter(|column| !producible.contains(&column.as_str()))
            .cloned()
            .collect()
    }
}

impl Default for FeatureAligner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::request::ModelChoice;

    fn schema(columns: &[&str]) -> TrainingSchema {
        TrainingSchema::new(columns.iter().map(|c| c.to_string()).collect())
    }

    fn request(age: u32, category: VehicleCategory) -> PredictionRequest {
        PredictionRequest::new("req_1".to_string(), age, category, ModelChoice::Knn)
    }

    #[test]
    fn test_alignment_matches_schema_order() {
        let schema = schema(&[
            "age",
            "cartype_combi",
            "cartype_family",
            "cartype_minivan",
            "cartype_sport",
        ]);
        let aligner = FeatureAligner::new();

        let vector = aligner.align(&request(5, VehicleCategory::Sport), &schema);

        assert_eq!(vector.columns(), schema.expected_columns());
        assert_eq!(vector.values(), &[5.0, 0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_schema_order_is_authoritative() {
        // Schema order differs from expansion order; output must follow the schema.
        let schema = schema(&["cartype_sport", "age"]);
        let aligner = FeatureAligner::new();

        let vector = aligner.align(&request(5, VehicleCategory::Sport), &schema);

        assert_eq!(vector.values(), &[1.0, 5.0]);
    }

    #[test]
    fn test_unknown_schema_column_zero_filled() {
        let schema = schema(&["age", "cartype_sport", "cartype_pickup"]);
        let aligner = FeatureAligner::new();

        let vector = aligner.align(&request(7, VehicleCategory::Sport), &schema);

        assert_eq!(vector.values(), &[7.0, 1.0, 0.0]);
    }

    #[test]
    fn test_untrained_category_degrades_silently() {
        // The schema was fitted without sport/minivan columns; a minivan
        // record yields an all-zero indicator block.
        let schema = schema(&["age", "cartype_combi", "cartype_family"]);
        let aligner = FeatureAligner::new();

        let vector = aligner.align(&request(3, VehicleCategory::Minivan), &schema);

        assert_eq!(vector.values(), &[3.0, 0.0, 0.0]);
    }

    #[test]
    fn test_alignment_is_deterministic() {
        let schema = schema(&["age", "cartype_combi", "cartype_sport"]);
        let aligner = FeatureAligner::new();
        let record = request(12, VehicleCategory::Combi);

        let first = aligner.align(&record, &schema);
        let second = aligner.align(&record, &schema);

        assert_eq!(first, second);
    }

    #[test]
    fn test_age_and_category_are_independent() {
        let schema = schema(&[
            "age",
            "cartype_combi",
            "cartype_family",
            "cartype_minivan",
            "cartype_sport",
        ]);
        let aligner = FeatureAligner::new();

        // Varying age never changes the indicator block.
        let young = aligner.align(&request(1, VehicleCategory::Family), &schema);
        let old = aligner.align(&request(29, VehicleCategory::Family), &schema);
        assert_eq!(young.values()[1..], old.values()[1..]);

        // Varying category never changes the age column.
        let family = aligner.align(&request(10, VehicleCategory::Family), &schema);
        let sport = aligner.align(&request(10, VehicleCategory::Sport), &schema);
        assert_eq!(family.get("age"), Some(10.0));
        assert_eq!(sport.get("age"), Some(10.0));
    }

    #[test]
    fn test_check_schema_flags_unreachable_columns() {
        let schema = schema(&["age", "cartype_combi", "cartype_pickup", "horsepower"]);
        let aligner = FeatureAligner::new();

        let unreachable = aligner.check_schema(&schema);

        assert_eq!(unreachable, vec!["cartype_pickup", "horsepower"]);
    }

    #[test]
    fn test_check_schema_clean_when_fully_producible() {
        let schema = schema(&[
            "age",
            "cartype_combi",
            "cartype_family",
            "cartype_minivan",
            "cartype_sport",
        ]);
        let aligner = FeatureAligner::new();

        assert!(aligner.check_schema(&schema).is_empty());
    }
}
