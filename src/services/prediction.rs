//! Car-price prediction over a serialized linear model.
//!
//! Unrelated to retrieval: a pre-trained artifact (feature names,
//! coefficients, intercept as JSON) is loaded once at startup and applied to
//! encoded tabular features. Every prediction is recorded.

use std::collections::HashMap;
use std::path::Path;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;
use crate::repositories::{Database, PredictionRecord, PredictionRepository};

/// Encoded feature vector for one vehicle. Field names mirror the training
/// pipeline's column names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionInput {
    #[serde(rename = "Milage_High")]
    pub milage_high: f64,
    #[serde(rename = "Milage_Medium")]
    pub milage_medium: f64,
    #[serde(rename = "Milage_Very High")]
    pub milage_very_high: f64,
    #[serde(rename = "Mileage_per_Year")]
    pub mileage_per_year: f64,
    #[serde(rename = "Accident_Impact")]
    pub accident_impact: f64,
    #[serde(rename = "Age_Mid")]
    pub age_mid: f64,
    #[serde(rename = "Age_Old")]
    pub age_old: f64,
    #[serde(rename = "Age_Very Old")]
    pub age_very_old: f64,
    #[serde(rename = "Vehicle_Age")]
    pub vehicle_age: f64,
    pub clean_title: f64,
    pub hp: f64,
    #[serde(rename = "engine displacement")]
    pub engine_displacement: f64,
    pub is_v_engine: f64,
    pub brand: f64,
    pub fuel_type: f64,
    pub transmission: f64,
}

impl PredictionInput {
    fn feature_map(&self) -> HashMap<&'static str, f64> {
        HashMap::from([
            ("Milage_High", self.milage_high),
            ("Milage_Medium", self.milage_medium),
            ("Milage_Very High", self.milage_very_high),
            ("Mileage_per_Year", self.mileage_per_year),
            ("Accident_Impact", self.accident_impact),
            ("Age_Mid", self.age_mid),
            ("Age_Old", self.age_old),
            ("Age_Very Old", self.age_very_old),
            ("Vehicle_Age", self.vehicle_age),
            ("clean_title", self.clean_title),
            ("hp", self.hp),
            ("engine displacement", self.engine_displacement),
            ("is_v_engine", self.is_v_engine),
            ("brand", self.brand),
            ("fuel_type", self.fuel_type),
            ("transmission", self.transmission),
        ])
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PredictionOutput {
    pub predicted_price: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct PriceModel {
    features: Vec<String>,
    coefficients: Vec<f64>,
    intercept: f64,
}

#[derive(Clone)]
pub struct PredictionService {
    model: PriceModel,
    repository: PredictionRepository,
}

impl PredictionService {
    pub fn load(artifact_path: &Path, db: &Database) -> Result<Self, ApiError> {
        let contents = std::fs::read_to_string(artifact_path).map_err(|e| {
            ApiError::Configuration(format!(
                "model artifact {} unavailable: {}",
                artifact_path.display(),
                e
            ))
        })?;

        let model: PriceModel = serde_json::from_str(&contents).map_err(|e| {
            ApiError::Configuration(format!("invalid model artifact: {}", e))
        })?;

        if model.features.len() != model.coefficients.len() {
            return Err(ApiError::Configuration(format!(
                "model artifact has {} features but {} coefficients",
                model.features.len(),
                model.coefficients.len()
            )));
        }

        Ok(Self {
            model,
            repository: db.predictions(),
        })
    }

    pub async fn predict(&self, input: PredictionInput) -> Result<PredictionOutput, ApiError> {
        let lookup = input.feature_map();

        let values: Vec<f64> = self
            .model
            .features
            .iter()
            .map(|name| {
                lookup.get(name.as_str()).copied().ok_or_else(|| {
                    ApiError::Configuration(format!("model expects unknown feature {}", name))
                })
            })
            .collect::<Result<_, _>>()?;

        let x = Array1::from(values);
        let w = Array1::from(self.model.coefficients.clone());
        let predicted_price = x.dot(&w) + self.model.intercept;

        let input_json = serde_json::to_value(&input).map_err(ApiError::internal)?;
        self.repository.create(&input_json, predicted_price).await?;

        Ok(PredictionOutput { predicted_price })
    }

    pub async fn history(&self) -> Result<Vec<PredictionRecord>, ApiError> {
        self.repository.find_all().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::test_database;

    fn sample_input() -> PredictionInput {
        PredictionInput {
            milage_high: 0.0,
            milage_medium: 1.0,
            milage_very_high: 0.0,
            mileage_per_year: 12000.0,
            accident_impact: 0.0,
            age_mid: 1.0,
            age_old: 0.0,
            age_very_old: 0.0,
            vehicle_age: 4.0,
            clean_title: 1.0,
            hp: 150.0,
            engine_displacement: 2.0,
            is_v_engine: 0.0,
            brand: 12.0,
            fuel_type: 1.0,
            transmission: 1.0,
        }
    }

    fn write_artifact(json: &serde_json::Value) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "roadmate-model-{}.json",
            uuid::Uuid::new_v4()
        ));
        std::fs::write(&path, serde_json::to_string(json).unwrap()).unwrap();
        path
    }

    #[tokio::test]
    async fn predicts_the_linear_combination_and_records_it() {
        let db = test_database().await;
        let path = write_artifact(&serde_json::json!({
            "features": ["hp", "Vehicle_Age", "clean_title"],
            "coefficients": [100.0, -500.0, 1000.0],
            "intercept": 2000.0,
        }));

        let service = PredictionService::load(&path, &db).unwrap();
        let output = service.predict(sample_input()).await.unwrap();

        // 150*100 - 4*500 + 1*1000 + 2000
        assert!((output.predicted_price - 16000.0).abs() < 1e-9);

        let history = service.history().await.unwrap();
        assert_eq!(history.len(), 1);
        assert!((history[0].predicted_price - 16000.0).abs() < 1e-9);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn load_rejects_missing_or_inconsistent_artifacts() {
        let db = test_database().await;

        let missing = std::env::temp_dir().join("roadmate-no-such-model.json");
        assert!(matches!(
            PredictionService::load(&missing, &db),
            Err(ApiError::Configuration(_))
        ));

        let path = write_artifact(&serde_json::json!({
            "features": ["hp"],
            "coefficients": [1.0, 2.0],
            "intercept": 0.0,
        }));
        assert!(matches!(
            PredictionService::load(&path, &db),
            Err(ApiError::Configuration(_))
        ));
        let _ = std::fs::remove_file(&path);
    }
}
