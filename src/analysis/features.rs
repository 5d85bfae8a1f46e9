use crate::data::models::{BestOf, H2HStats, MatchRecord, PlayerRecord, PlayerTable, StatColumn};
use crate::error::AppError;
use log::warn;

/// Head-to-head block, always in this order.
pub const H2H_FEATURE_NAMES: [&str; 6] = [
    "h2h_total_matches",
    "h2h_win_rate",
    "h2h_recent_win_rate",
    "h2h_avg_margin",
    "h2h_win_rate_b3",
    "h2h_win_rate_b5",
];

pub const BEST_OF_FEATURE: &str = "bestOf";

pub const DIFF_FEATURE_COUNT: usize = StatColumn::ALL.len();
pub const FEATURE_COUNT: usize = DIFF_FEATURE_COUNT + H2H_FEATURE_NAMES.len() + 1;

/// Column names in vector order: stat differences, head-to-head, format.
pub fn feature_names() -> Vec<String> {
    StatColumn::ALL
        .iter()
        .map(|c| c.json_name().to_string())
        .chain(H2H_FEATURE_NAMES.iter().map(|n| n.to_string()))
        .chain(std::iter::once(BEST_OF_FEATURE.to_string()))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    pub values: Vec<f64>,
}

impl FeatureVector {
    pub fn diffs(&self) -> &[f64] {
        &self.values[..DIFF_FEATURE_COUNT]
    }

    pub fn head_to_head(&self) -> &[f64] {
        &self.values[DIFF_FEATURE_COUNT..DIFF_FEATURE_COUNT + H2H_FEATURE_NAMES.len()]
    }

    pub fn best_of(&self) -> f64 {
        self.values[FEATURE_COUNT - 1]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// winner minus loser, label 1
    Forward,
    /// loser minus winner, label 0
    Reversed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRow {
    pub features: FeatureVector,
    pub label: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedMatch {
    pub index: usize,
    pub winner: String,
    pub loser: String,
    pub reason: String,
}

/// Rows that could be built plus the matches that had to be dropped.
#[derive(Debug, Clone, Default)]
pub struct DatasetBuild {
    pub rows: Vec<TrainingRow>,
    pub skipped: Vec<SkippedMatch>,
}

impl DatasetBuild {
    pub fn matches_used(&self) -> usize {
        self.rows.len() / 2
    }
}

pub fn lookup<'a>(players: &'a PlayerTable, name: &str) -> Result<&'a PlayerRecord, AppError> {
    players
        .get(name)
        .ok_or_else(|| AppError::LookupError(format!("player '{}' not found in player data", name)))
}

/// Feature vector for `first` against `second`.
///
/// Head-to-head values come only from `first`'s record against `second`;
/// the opponent's own log is not consulted.
pub fn build_features(
    first: &str,
    second: &str,
    best_of: BestOf,
    players: &PlayerTable,
) -> Result<FeatureVector, AppError> {
    let a = lookup(players, first)?;
    let b = lookup(players, second)?;

    let mut values = Vec::with_capacity(FEATURE_COUNT);
    for column in StatColumn::ALL {
        values.push(a.stat(column) - b.stat(column));
    }

    let h2h = a.head_to_head.get(second).cloned().unwrap_or_default();
    values.extend(head_to_head_features(&h2h));
    values.push(best_of.games() as f64);

    for v in values.iter_mut() {
        if !v.is_finite() {
            *v = 0.0;
        }
    }

    Ok(FeatureVector { values })
}

fn head_to_head_features(h2h: &H2HStats) -> [f64; 6] {
    [
        h2h.total_matches_played,
        h2h.win_rate,
        h2h.recent_win_rate(),
        h2h.average_margin,
        h2h.win_rate_best_of_3,
        h2h.win_rate_best_of_5,
    ]
}

pub fn build_training_row(
    record: &MatchRecord,
    orientation: Orientation,
    players: &PlayerTable,
) -> Result<TrainingRow, AppError> {
    let (first, second, label) = match orientation {
        Orientation::Forward => (&record.winner, &record.loser, 1),
        Orientation::Reversed => (&record.loser, &record.winner, 0),
    };
    let features = build_features(first, second, record.best_of, players)?;
    Ok(TrainingRow { features, label })
}

/// Two rows per usable match, forward then reversed.
///
/// A match whose players cannot both be found is recorded in `skipped` and
/// the rest of the log is still processed.
pub fn build_dataset(matches: &[MatchRecord], players: &PlayerTable) -> DatasetBuild {
    let mut build = DatasetBuild::default();

    for (index, record) in matches.iter().enumerate() {
        let pair = build_training_row(record, Orientation::Forward, players).and_then(|fwd| {
            build_training_row(record, Orientation::Reversed, players).map(|rev| (fwd, rev))
        });

        match pair {
            Ok((forward, reversed)) => {
                build.rows.push(forward);
                build.rows.push(reversed);
            }
            Err(e) => {
                warn!(
                    "Skipping match #{} ({} vs {}): {}",
                    index, record.winner, record.loser, e
                );
                build.skipped.push(SkippedMatch {
                    index,
                    winner: record.winner.clone(),
                    loser: record.loser.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    build
}
