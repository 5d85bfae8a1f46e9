pub mod loader;
pub mod models;

use crate::analysis::merger::merge;
use crate::analysis::normalizer::NameNormalizer;
use crate::config::Config;
use crate::error::AppError;
use log::info;
use models::{MatchRecord, PlayerTable};

/// Everything loaded for one run, read-only once built.
#[derive(Debug, Clone)]
pub struct DataSnapshot {
    pub normalizer: NameNormalizer,
    pub players: PlayerTable,
    pub matches: Vec<MatchRecord>,
}

impl DataSnapshot {
    pub fn load(config: &Config) -> Result<Self, AppError> {
        let aliases = loader::load_aliases(&config.name_mappings_path)?;
        let normalizer = NameNormalizer::new(&config.prefix_separator, aliases);

        let raw_players = loader::load_raw_players(&config.player_data_path)?;
        let players = merge(raw_players.iter(), &normalizer)?;
        let matches = loader::load_matches(&config.matches_path, &normalizer)?;

        info!(
            "Loaded {} players ({} raw entries) and {} matches",
            players.len(),
            raw_players.len(),
            matches.len()
        );

        Ok(DataSnapshot {
            normalizer,
            players,
            matches,
        })
    }
}
