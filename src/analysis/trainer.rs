use super::features::{build_dataset, SkippedMatch};
use super::logistic::{self, SolverOptions, TrainedModel};
use super::metrics::TrainingMetrics;
use super::scaler::ScalerState;
use crate::config::TrainerConfig;
use crate::data::models::{MatchRecord, PlayerTable};
use crate::error::AppError;
use log::{info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub model: TrainedModel,
    pub scaler: ScalerState,
    pub metrics: TrainingMetrics,
    pub matches_used: usize,
    pub skipped: Vec<SkippedMatch>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Seeded split that keeps the label balance in both partitions.
///
/// Each class keeps at least one row in the training partition.
pub fn stratified_split(labels: &[u8], test_ratio: f64, seed: u64) -> Split {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut split = Split {
        train: Vec::new(),
        test: Vec::new(),
    };

    for class in [0u8, 1u8] {
        let mut members: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, l)| **l == class)
            .map(|(i, _)| i)
            .collect();
        members.shuffle(&mut rng);

        let n = members.len();
        let n_test = ((n as f64 * test_ratio).round() as usize).min(n.saturating_sub(1));
        split.test.extend_from_slice(&members[..n_test]);
        split.train.extend_from_slice(&members[n_test..]);
    }

    split
}

/// Build the two-orderings dataset, fit the scaler and classifier, and
/// evaluate on the held-out partition.
pub fn train(
    matches: &[MatchRecord],
    players: &PlayerTable,
    config: &TrainerConfig,
) -> Result<TrainingOutcome, AppError> {
    config.validate()?;

    let dataset = build_dataset(matches, players);
    if !dataset.skipped.is_empty() {
        warn!(
            "{} of {} matches skipped: player missing from player data",
            dataset.skipped.len(),
            matches.len()
        );
    }
    if dataset.rows.is_empty() {
        return Err(AppError::DataError(format!(
            "training set is empty: none of the {} matches have both players in the player data",
            matches.len()
        )));
    }

    let labels: Vec<u8> = dataset.rows.iter().map(|r| r.label).collect();
    let split = stratified_split(&labels, config.test_ratio, config.seed);

    let gather = |idx: &[usize]| -> (Vec<Vec<f64>>, Vec<u8>) {
        idx.iter()
            .map(|&i| (dataset.rows[i].features.values.clone(), labels[i]))
            .unzip()
    };
    let (train_x, train_y) = gather(&split.train);
    let (test_x, test_y) = gather(&split.test);

    let scaler = ScalerState::fit(&train_x)?;
    let train_x = scaler.transform(&train_x)?;
    let test_x = scaler.transform(&test_x)?;

    let model = logistic::fit(
        &train_x,
        &train_y,
        SolverOptions {
            inverse_regularization: config.inverse_regularization,
            max_iterations: config.max_iterations,
            tolerance: config.tolerance,
        },
    )?;
    if !model.converged {
        warn!(
            "Solver stopped after {} iterations without converging",
            model.iterations
        );
    }

    let probabilities = test_x
        .iter()
        .map(|row| model.predict_proba(row))
        .collect::<Result<Vec<f64>, AppError>>()?;
    let metrics = TrainingMetrics::evaluate(&test_y, &probabilities, train_x.len());
    info!("{}", metrics);

    Ok(TrainingOutcome {
        model,
        scaler,
        metrics,
        matches_used: dataset.matches_used(),
        skipped: dataset.skipped,
    })
}
