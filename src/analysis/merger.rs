use super::normalizer::NameNormalizer;
use crate::data::models::{H2HStats, OrderedMap, PlayerRecord, PlayerTable, RawPlayerRecord};
use crate::error::AppError;
use log::debug;
use std::collections::HashMap;

/// Collapse raw player records onto canonical names.
///
/// The first record for a canonical name is taken as-is. Later duplicates
/// only add their match counters, after which `overallWinRate` is recomputed
/// from the summed counters. Head-to-head records and every other rate stay
/// as they were on the first record; they are not reconciled across aliases.
pub fn merge<'a, I>(records: I, normalizer: &NameNormalizer) -> Result<PlayerTable, AppError>
where
    I: IntoIterator<Item = (&'a String, &'a RawPlayerRecord)>,
{
    let mut merged: PlayerTable = HashMap::new();

    for (raw_name, raw) in records {
        let (matches_played, wins, losses) = required_counters(raw_name, raw)?;
        let canonical = normalizer.normalize(raw_name);

        match merged.get_mut(&canonical) {
            Some(existing) => {
                debug!("Merging '{}' into '{}'", raw_name, canonical);
                existing.total_matches_played += matches_played;
                existing.total_wins += wins;
                existing.total_losses += losses;
                existing.stats.overall_win_rate =
                    win_rate(existing.total_wins, existing.total_matches_played);
            }
            None => {
                let record = PlayerRecord {
                    name: canonical.clone(),
                    total_matches_played: matches_played,
                    total_wins: wins,
                    total_losses: losses,
                    stats: raw.stats.clone(),
                    head_to_head: canonical_head_to_head(&raw.head_to_head_records, normalizer),
                };
                merged.insert(canonical, record);
            }
        }
    }

    Ok(merged)
}

fn required_counters(name: &str, raw: &RawPlayerRecord) -> Result<(u32, u32, u32), AppError> {
    let missing = |field: &str| {
        AppError::DataError(format!("player '{}' is missing required field '{}'", name, field))
    };
    Ok((
        raw.total_matches_played.ok_or_else(|| missing("totalMatchesPlayed"))?,
        raw.total_wins.ok_or_else(|| missing("totalWins"))?,
        raw.total_losses.ok_or_else(|| missing("totalLosses"))?,
    ))
}

/// Percentage of matches won, 0 when no matches were played.
pub fn win_rate(wins: u32, matches_played: u32) -> f64 {
    if matches_played == 0 {
        0.0
    } else {
        wins as f64 / matches_played as f64 * 100.0
    }
}

// When two raw opponent keys collapse to one canonical name, the one listed
// first in the file wins.
fn canonical_head_to_head(
    records: &OrderedMap<H2HStats>,
    normalizer: &NameNormalizer,
) -> HashMap<String, H2HStats> {
    let mut out = HashMap::with_capacity(records.len());
    for (key, stats) in records.iter() {
        out.entry(normalizer.normalize(key))
            .or_insert_with(|| stats.clone());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::normalizer::AliasTable;
    use crate::data::models::RawPlayerTable;

    fn normalizer() -> NameNormalizer {
        let mut map = HashMap::new();
        map.insert("Crabby".to_string(), "GetCrabby".to_string());
        map.insert("crabby2".to_string(), "GetCrabby".to_string());
        NameNormalizer::new("| ", AliasTable::new(map))
    }

    fn table(json: &str) -> RawPlayerTable {
        serde_json::from_str(json).unwrap()
    }

    fn merge_table(t: &RawPlayerTable) -> Result<PlayerTable, AppError> {
        merge(t.iter(), &normalizer())
    }

    #[test]
    fn sums_counters_and_recomputes_win_rate() {
        let raw = table(
            r#"{
                "GetCrabby": {"totalMatchesPlayed": 10, "totalWins": 8, "totalLosses": 2,
                              "overallWinRate": 80, "winRateDecidingGames": 90,
                              "headToHeadRecords": {"WizP": {"totalMatchesPlayed": 3, "winRate": 66.7}}},
                "Crabby":    {"totalMatchesPlayed": 10, "totalWins": 2, "totalLosses": 8,
                              "overallWinRate": 20, "winRateDecidingGames": 10,
                              "headToHeadRecords": {"Other": {"totalMatchesPlayed": 1}}},
                "crabby2":   {"totalMatchesPlayed": 0, "totalWins": 0, "totalLosses": 0}
            }"#,
        );

        let merged = merge_table(&raw).unwrap();
        assert_eq!(merged.len(), 1);

        let p = &merged["GetCrabby"];
        assert_eq!(p.total_matches_played, 20);
        assert_eq!(p.total_wins, 10);
        assert_eq!(p.total_losses, 10);
        assert!((p.overall_win_rate() - 50.0).abs() < 1e-9);

        // non-counter fields stay with the first occurrence
        assert_eq!(p.stats.win_rate_deciding_games, 90.0);
        assert!(p.head_to_head.contains_key("WizP"));
        assert!(!p.head_to_head.contains_key("Other"));
    }

    #[test]
    fn merged_counters_equal_sum_of_sources() {
        let raw = table(
            r#"{
                "12 | Alpha": {"totalMatchesPlayed": 5, "totalWins": 3, "totalLosses": 2},
                "Alpha":      {"totalMatchesPlayed": 7, "totalWins": 1, "totalLosses": 6},
                "Beta":       {"totalMatchesPlayed": 4, "totalWins": 4, "totalLosses": 0},
                "Crabby":     {"totalMatchesPlayed": 9, "totalWins": 5, "totalLosses": 4},
                "crabby2":    {"totalMatchesPlayed": 1, "totalWins": 1, "totalLosses": 0}
            }"#,
        );
        let merged = merge_table(&raw).unwrap();
        let n = normalizer();

        let mut expected: HashMap<String, (u32, u32)> = HashMap::new();
        for (name, r) in &raw.entries {
            let e = expected.entry(n.normalize(name)).or_default();
            e.0 += r.total_wins.unwrap();
            e.1 += r.total_matches_played.unwrap();
        }

        assert_eq!(merged.len(), expected.len());
        for (name, (wins, played)) in expected {
            assert_eq!(merged[&name].total_wins, wins, "wins for {}", name);
            assert_eq!(merged[&name].total_matches_played, played, "played for {}", name);
        }
    }

    #[test]
    fn single_record_keeps_its_reported_rate() {
        let raw = table(
            r#"{"Beta": {"totalMatchesPlayed": 4, "totalWins": 1, "totalLosses": 3, "overallWinRate": 33.0}}"#,
        );
        let merged = merge_table(&raw).unwrap();
        assert_eq!(merged["Beta"].overall_win_rate(), 33.0);
    }

    #[test]
    fn missing_counter_is_a_data_error_naming_the_player() {
        let raw = table(r#"{"Beta": {"totalMatchesPlayed": 4, "totalLosses": 3}}"#);
        let err = merge_table(&raw).unwrap_err();
        assert!(err.is_data());
        let msg = err.to_string();
        assert!(msg.contains("Beta") && msg.contains("totalWins"), "{}", msg);
    }

    #[test]
    fn head_to_head_keys_are_canonicalised() {
        let raw = table(
            r#"{"Beta": {"totalMatchesPlayed": 1, "totalWins": 1, "totalLosses": 0,
                         "headToHeadRecords": {"Crabby": {"totalMatchesPlayed": 1, "winRate": 100}}}}"#,
        );
        let merged = merge_table(&raw).unwrap();
        assert_eq!(merged["Beta"].head_to_head["GetCrabby"].win_rate, 100.0);
    }

    #[test]
    fn colliding_head_to_head_keys_keep_file_order() {
        let raw = table(
            r#"{"Beta": {"totalMatchesPlayed": 1, "totalWins": 1, "totalLosses": 0,
                         "headToHeadRecords": {
                             "crabby2":   {"totalMatchesPlayed": 4, "winRate": 25},
                             "Crabby":    {"totalMatchesPlayed": 2, "winRate": 50},
                             "GetCrabby": {"totalMatchesPlayed": 1, "winRate": 100}}}}"#,
        );
        let merged = merge_table(&raw).unwrap();
        let h2h = &merged["Beta"].head_to_head;
        assert_eq!(h2h.len(), 1);
        assert_eq!(h2h["GetCrabby"].win_rate, 25.0);
        assert_eq!(h2h["GetCrabby"].total_matches_played, 4.0);
    }

    #[test]
    fn prefixed_alias_collapses_into_canonical_record() {
        let raw = table(
            r#"{
                "GetCrabby":      {"totalMatchesPlayed": 6, "totalWins": 3, "totalLosses": 3},
                "Team | Crabby":  {"totalMatchesPlayed": 4, "totalWins": 4, "totalLosses": 0},
                "T1 | crabby2 ":  {"totalMatchesPlayed": 2, "totalWins": 1, "totalLosses": 1}
            }"#,
        );
        let merged = merge_table(&raw).unwrap();
        assert_eq!(merged.len(), 1);
        assert!(!merged.contains_key("Crabby"));

        let p = &merged["GetCrabby"];
        assert_eq!(p.total_matches_played, 12);
        assert_eq!(p.total_wins, 8);
        assert!((p.overall_win_rate() - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn win_rate_handles_zero_matches() {
        assert_eq!(win_rate(0, 0), 0.0);
        assert!((win_rate(2, 3) - 66.666_666).abs() < 1e-4);
    }
}
