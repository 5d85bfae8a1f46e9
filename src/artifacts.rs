use crate::analysis::features::feature_names;
use crate::analysis::logistic::TrainedModel;
use crate::analysis::metrics::TrainingMetrics;
use crate::analysis::scaler::ScalerState;
use crate::analysis::trainer::TrainingOutcome;
use crate::error::AppError;
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const ARTIFACT_VERSION: u32 = 1;

/// Scaler and classifier from one training run, reloaded for prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub version: u32,
    pub trained_at: DateTime<Utc>,
    pub feature_names: Vec<String>,
    pub scaler: ScalerState,
    pub model: TrainedModel,
    pub metrics: TrainingMetrics,
}

impl ModelArtifact {
    pub fn new(outcome: &TrainingOutcome) -> Self {
        ModelArtifact {
            version: ARTIFACT_VERSION,
            trained_at: Utc::now(),
            feature_names: feature_names(),
            scaler: outcome.scaler.clone(),
            model: outcome.model.clone(),
            metrics: outcome.metrics.clone(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), AppError> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir).map_err(|e| {
                    AppError::DataError(format!(
                        "cannot create artifact directory {}: {}",
                        dir.display(),
                        e
                    ))
                })?;
            }
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| {
            AppError::JsonError(format!("failed to serialize model artifact: {}", e))
        })?;
        fs::write(path, json).map_err(|e| {
            AppError::DataError(format!("cannot write artifact {}: {}", path.display(), e))
        })?;

        info!("Saved model artifact to {}", path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, AppError> {
        let content = fs::read_to_string(path).map_err(|e| {
            AppError::DataError(format!(
                "cannot read model artifact {} ({}); run `train` first",
                path.display(),
                e
            ))
        })?;
        let artifact: ModelArtifact = serde_json::from_str(&content).map_err(|e| {
            AppError::JsonError(format!("invalid model artifact {}: {}", path.display(), e))
        })?;
        artifact.validate(path)?;
        Ok(artifact)
    }

    /// The stored layout must match the feature vector this build produces.
    fn validate(&self, path: &Path) -> Result<(), AppError> {
        if self.version != ARTIFACT_VERSION {
            return Err(AppError::DataError(format!(
                "model artifact {} has version {}, expected {}",
                path.display(),
                self.version,
                ARTIFACT_VERSION
            )));
        }

        let expected = feature_names();
        if self.feature_names != expected {
            let drift = self
                .feature_names
                .iter()
                .zip(&expected)
                .position(|(stored, current)| stored != current)
                .unwrap_or_else(|| self.feature_names.len().min(expected.len()));
            return Err(AppError::DataError(format!(
                "model artifact {} was trained on a different feature layout (first difference at column {}); retrain",
                path.display(),
                drift
            )));
        }

        let width = expected.len();
        if self.scaler.means.len() != width
            || self.scaler.stds.len() != width
            || self.model.feature_count() != width
        {
            return Err(AppError::DataError(format!(
                "model artifact {} is inconsistent: {} features, {} scaler columns, {} coefficients",
                path.display(),
                width,
                self.scaler.means.len(),
                self.model.feature_count()
            )));
        }
        Ok(())
    }
}
