use super::features::{build_features, lookup, FEATURE_COUNT};
use super::logistic::TrainedModel;
use super::normalizer::NameNormalizer;
use super::scaler::ScalerState;
use crate::data::models::{BestOf, PlayerTable};
use crate::error::AppError;
use log::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub player_a: String,
    pub player_b: String,
    pub best_of: BestOf,
    /// Model output for (A, B).
    pub forward: f64,
    /// Model output for (B, A).
    pub reverse: f64,
    /// Symmetrised P(A beats B).
    pub probability: f64,
}

/// Read-only view over a trained model and the data it predicts from.
pub struct Predictor<'a> {
    model: &'a TrainedModel,
    scaler: &'a ScalerState,
    players: &'a PlayerTable,
    normalizer: &'a NameNormalizer,
}

impl<'a> Predictor<'a> {
    pub fn new(
        model: &'a TrainedModel,
        scaler: &'a ScalerState,
        players: &'a PlayerTable,
        normalizer: &'a NameNormalizer,
    ) -> Result<Self, AppError> {
        if model.feature_count() != FEATURE_COUNT || scaler.width() != FEATURE_COUNT {
            return Err(AppError::DataError(format!(
                "model has {} coefficients and scaler {} columns, expected {}",
                model.feature_count(),
                scaler.width(),
                FEATURE_COUNT
            )));
        }
        Ok(Predictor {
            model,
            scaler,
            players,
            normalizer,
        })
    }

    /// Probability that `player_a` beats `player_b`, averaged over both orderings.
    pub fn predict(
        &self,
        player_a: &str,
        player_b: &str,
        best_of: BestOf,
    ) -> Result<Prediction, AppError> {
        let a = self.normalizer.normalize(player_a);
        let b = self.normalizer.normalize(player_b);

        if a == b {
            return Err(AppError::LookupError(format!(
                "'{}' and '{}' are the same player ('{}')",
                player_a, player_b, a
            )));
        }
        lookup(self.players, &a)?;
        lookup(self.players, &b)?;

        let forward = self.forward_probability(&a, &b, best_of)?;
        let reverse = self.forward_probability(&b, &a, best_of)?;
        let probability = ((forward + (1.0 - reverse)) / 2.0).clamp(0.0, 1.0);
        debug!(
            "{} vs {} ({}): forward {:.4}, reverse {:.4}",
            a, b, best_of, forward, reverse
        );

        Ok(Prediction {
            player_a: a,
            player_b: b,
            best_of,
            forward,
            reverse,
            probability,
        })
    }

    fn forward_probability(&self, first: &str, second: &str, best_of: BestOf) -> Result<f64, AppError> {
        let features = build_features(first, second, best_of, self.players)?;
        let scaled = self.scaler.transform_row(&features.values)?;
        self.model.predict_proba(&scaled)
    }
}
