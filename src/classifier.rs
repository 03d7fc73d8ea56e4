use std::path::Path;

use serde::Deserialize;

use crate::error::ClassifierError;
use crate::models::{PredictionResult, StudentSnapshot, FEATURE_COLUMNS};

/// Scores a snapshot into (struggle, succeed) probabilities.
pub trait ClassifierGateway {
    fn predict_struggle_probability(
        &self,
        snapshot: &StudentSnapshot,
    ) -> Result<PredictionResult, ClassifierError>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeatureScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// Fitted logistic-regression classifier as exported to JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct LogisticModel {
    #[serde(default)]
    pub name: Option<String>,
    pub classes: Vec<String>,
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default)]
    pub scaler: Option<FeatureScaler>,
}

impl LogisticModel {
    pub fn from_json(contents: &str) -> Result<Self, ClassifierError> {
        let model: LogisticModel = serde_json::from_str(contents)?;
        model.validate()?;
        Ok(model)
    }

    pub fn load(path: &Path) -> Result<Self, ClassifierError> {
        if !path.exists() {
            return Err(ClassifierError::ArtifactMissing {
                path: path.to_path_buf(),
            });
        }

        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    fn validate(&self) -> Result<(), ClassifierError> {
        if self.classes.len() != 2 {
            return Err(invalid(format!(
                "expected 2 classes, found {}",
                self.classes.len()
            )));
        }

        if self.feature_names.len() != FEATURE_COLUMNS.len() {
            return Err(invalid(format!(
                "expected {} features, found {}",
                FEATURE_COLUMNS.len(),
                self.feature_names.len()
            )));
        }

        for (index, (found, expected)) in self
            .feature_names
            .iter()
            .zip(FEATURE_COLUMNS.iter())
            .enumerate()
        {
            if !feature_name_matches(found, expected) {
                return Err(invalid(format!(
                    "feature {index} is '{found}', expected '{expected}'"
                )));
            }
        }

        if self.coefficients.len() != FEATURE_COLUMNS.len() {
            return Err(invalid(format!(
                "expected {} coefficients, found {}",
                FEATURE_COLUMNS.len(),
                self.coefficients.len()
            )));
        }

        if let Some(scaler) = &self.scaler {
            if scaler.mean.len() != FEATURE_COLUMNS.len()
                || scaler.scale.len() != FEATURE_COLUMNS.len()
            {
                return Err(invalid("scaler must carry one mean and scale per feature"));
            }
        }

        Ok(())
    }

    pub fn decision_function(&self, features: &[f64; 5]) -> f64 {
        let mut z = self.intercept;
        for (index, (value, weight)) in features.iter().zip(self.coefficients.iter()).enumerate()
        {
            let value = match &self.scaler {
                Some(scaler) => {
                    let scale = if scaler.scale[index] == 0.0 {
                        1.0
                    } else {
                        scaler.scale[index]
                    };
                    (value - scaler.mean[index]) / scale
                }
                None => *value,
            };
            z += value * weight;
        }
        z
    }

    /// Probabilities in training class order: index 0 is the struggle class.
    /// Infinite scores saturate to 0 or 1; only NaN is rejected.
    pub fn predict_proba(&self, features: &[f64; 5]) -> Result<[f64; 2], ClassifierError> {
        let z = self.decision_function(features);
        if z.is_nan() {
            return Err(ClassifierError::UndefinedScore);
        }

        let positive = sigmoid(z);
        Ok([1.0 - positive, positive])
    }
}

fn feature_name_matches(found: &str, expected: &str) -> bool {
    found == expected
        || (expected == "avg_time_per_question_seconds" && found == "avg_time_per_question")
}

fn invalid(reason: impl Into<String>) -> ClassifierError {
    ClassifierError::InvalidArtifact {
        reason: reason.into(),
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Model loaded once at startup, or the reason it could not be.
#[derive(Debug)]
pub enum ModelHandle {
    Loaded(LogisticModel),
    Unavailable { reason: String },
}

impl ModelHandle {
    pub fn load(path: &Path) -> Self {
        match LogisticModel::load(path) {
            Ok(model) => {
                tracing::info!(
                    path = %path.display(),
                    name = model.name.as_deref().unwrap_or("unnamed"),
                    "model loaded"
                );
                ModelHandle::Loaded(model)
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "model unavailable");
                ModelHandle::Unavailable {
                    reason: err.to_string(),
                }
            }
        }
    }

    pub fn model(&self) -> Option<&LogisticModel> {
        match self {
            ModelHandle::Loaded(model) => Some(model),
            ModelHandle::Unavailable { .. } => None,
        }
    }
}

impl ClassifierGateway for ModelHandle {
    fn predict_struggle_probability(
        &self,
        snapshot: &StudentSnapshot,
    ) -> Result<PredictionResult, ClassifierError> {
        let model = self.model().ok_or(ClassifierError::Unavailable)?;
        let [p_struggle, p_succeed] = model.predict_proba(&snapshot.feature_vector())?;
        tracing::debug!(p_struggle, p_succeed, "scored snapshot");
        Ok(PredictionResult {
            p_struggle,
            p_succeed,
        })
    }
}
