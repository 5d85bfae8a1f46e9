use super::models::{BestOf, MatchRecord, RawMatch, RawPlayerTable};
use crate::analysis::normalizer::{AliasTable, NameNormalizer};
use crate::error::AppError;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T, AppError> {
    let body = fs::read_to_string(path).map_err(|e| {
        AppError::DataError(format!("cannot read {} file {}: {}", what, path.display(), e))
    })?;
    serde_json::from_str(&body).map_err(|e| {
        AppError::JsonError(format!("invalid {} file {}: {}", what, path.display(), e))
    })
}

/// Raw player entries, keyed by the names used in the file.
pub fn load_raw_players(path: &Path) -> Result<RawPlayerTable, AppError> {
    let table: RawPlayerTable = read_json(path, "player data")?;
    if table.is_empty() {
        warn!("{} contains no player entries", path.display());
    }
    debug!("Loaded {} raw player entries from {}", table.len(), path.display());
    Ok(table)
}

/// Alias file, or an empty table when the file does not exist.
pub fn load_aliases(path: &Path) -> Result<AliasTable, AppError> {
    match fs::metadata(path) {
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(
                "Name mappings file {} not found; continuing without aliases",
                path.display()
            );
            Ok(AliasTable::default())
        }
        _ => {
            let mappings: HashMap<String, String> = read_json(path, "name mappings")?;
            debug!("Loaded {} aliases from {}", mappings.len(), path.display());
            Ok(AliasTable::new(mappings))
        }
    }
}

/// Match log with both names canonicalised.
pub fn load_matches(path: &Path, normalizer: &NameNormalizer) -> Result<Vec<MatchRecord>, AppError> {
    let raw: Vec<RawMatch> = read_json(path, "match")?;
    let matches = canonicalize_matches(raw, normalizer)?;
    debug!("Loaded {} matches from {}", matches.len(), path.display());
    Ok(matches)
}

pub fn canonicalize_matches(
    raw: Vec<RawMatch>,
    normalizer: &NameNormalizer,
) -> Result<Vec<MatchRecord>, AppError> {
    raw.into_iter()
        .enumerate()
        .map(|(idx, m)| {
            let best_of = m.best_of.parse::<BestOf>().map_err(|_| {
                AppError::DataError(format!(
                    "match #{} ({} vs {}) has unsupported format '{}'",
                    idx, m.winner_name, m.loser_name, m.best_of
                ))
            })?;
            Ok(MatchRecord {
                winner: normalizer.normalize(&m.winner_name),
                loser: normalizer.normalize(&m.loser_name),
                best_of,
                winner_score: m.winner_score,
                loser_score: m.loser_score,
                completed_at: m.completed_at,
                tournament_name: m.tournament_name,
            })
        })
        .collect()
}
