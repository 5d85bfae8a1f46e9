use crate::data::models::MatchRecord;
use log::debug;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct MatchupSummary {
    pub player_a: String,
    pub player_b: String,
    pub total_matches: usize,
    /// Percentages, player_a is the lexicographically smaller name.
    pub win_rate_a: f64,
    pub win_rate_b: f64,
}

#[derive(Debug, Clone, Default)]
struct MatchupTally {
    total: usize,
    wins_a: usize,
    wins_b: usize,
}

/// Counts meetings per unordered pair of canonical names.
pub struct MatchupTracker {
    tallies: HashMap<(String, String), MatchupTally>,
}

impl MatchupTracker {
    pub fn new() -> Self {
        MatchupTracker {
            tallies: HashMap::new(),
        }
    }

    pub fn add_match(&mut self, record: &MatchRecord) {
        if record.winner == record.loser {
            debug!("Ignoring self-matchup for '{}'", record.winner);
            return;
        }

        let key = pair_key(&record.winner, &record.loser);
        let winner_is_a = record.winner == key.0;
        let entry = self.tallies.entry(key).or_default();

        entry.total += 1;
        if winner_is_a {
            entry.wins_a += 1;
        } else {
            entry.wins_b += 1;
        }
    }

    /// Top `top_n` pairs by count, ties broken by pair name.
    pub fn most_played(&self, top_n: usize) -> Vec<MatchupSummary> {
        let mut pairs: Vec<(&(String, String), &MatchupTally)> = self.tallies.iter().collect();
        pairs.sort_by(|(ka, ta), (kb, tb)| tb.total.cmp(&ta.total).then_with(|| ka.cmp(kb)));

        pairs
            .into_iter()
            .take(top_n)
            .map(|((a, b), tally)| MatchupSummary {
                player_a: a.clone(),
                player_b: b.clone(),
                total_matches: tally.total,
                win_rate_a: percentage(tally.wins_a, tally.total),
                win_rate_b: percentage(tally.wins_b, tally.total),
            })
            .collect()
    }
}

impl Default for MatchupTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Most frequent pairings in a log of canonicalised matches.
pub fn most_played_matchups(matches: &[MatchRecord], top_n: usize) -> Vec<MatchupSummary> {
    let mut tracker = MatchupTracker::new();
    for record in matches {
        tracker.add_match(record);
    }
    tracker.most_played(top_n)
}

fn pair_key(x: &str, y: &str) -> (String, String) {
    if x <= y {
        (x.to_string(), y.to_string())
    } else {
        (y.to_string(), x.to_string())
    }
}

fn percentage(wins: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        wins as f64 / total as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::models::BestOf;

    #[test]
    fn collapses_both_orderings_into_one_bucket() {
        let matches = vec![
            MatchRecord::new("A", "B", BestOf::Three),
            MatchRecord::new("B", "A", BestOf::Three),
            MatchRecord::new("A", "B", BestOf::Five),
        ];
        let top = most_played_matchups(&matches, 10);

        assert_eq!(top.len(), 1);
        let m = &top[0];
        assert_eq!((m.player_a.as_str(), m.player_b.as_str()), ("A", "B"));
        assert_eq!(m.total_matches, 3);
        assert!((m.win_rate_a - 66.67).abs() < 0.01);
        assert!((m.win_rate_b - 33.33).abs() < 0.01);
    }

    #[test]
    fn orders_by_count_then_pair_name() {
        let matches = vec![
            MatchRecord::new("Zed", "Yan", BestOf::Three),
            MatchRecord::new("Cal", "Bo", BestOf::Three),
            MatchRecord::new("Bo", "Ann", BestOf::Three),
            MatchRecord::new("Yan", "Zed", BestOf::Five),
            MatchRecord::new("Ann", "Bo", BestOf::Five),
        ];
        let top = most_played_matchups(&matches, 2);

        assert_eq!(top.len(), 2);
        assert_eq!((top[0].player_a.as_str(), top[0].player_b.as_str()), ("Ann", "Bo"));
        assert_eq!((top[1].player_a.as_str(), top[1].player_b.as_str()), ("Yan", "Zed"));
        assert_eq!(top[1].win_rate_a, 50.0);
    }

    #[test]
    fn win_rates_of_a_bucket_sum_to_hundred() {
        let matches = vec![
            MatchRecord::new("Q", "P", BestOf::Three),
            MatchRecord::new("Q", "P", BestOf::Three),
            MatchRecord::new("P", "Q", BestOf::Three),
            MatchRecord::new("Q", "P", BestOf::Five),
        ];
        let m = &most_played_matchups(&matches, 1)[0];
        assert_eq!(m.player_a, "P");
        assert_eq!(m.win_rate_a, 25.0);
        assert_eq!(m.win_rate_a + m.win_rate_b, 100.0);
    }

    #[test]
    fn empty_log_and_self_matches_yield_nothing() {
        assert!(most_played_matchups(&[], 5).is_empty());
        let matches = vec![MatchRecord::new("A", "A", BestOf::Three)];
        assert!(most_played_matchups(&matches, 5).is_empty());
    }
}
