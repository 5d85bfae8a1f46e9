use crate::error::AppError;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

fn zero_if_null<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

// playerDataPoints.json entry, before alias merging
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct RawPlayerRecord {
    #[serde(default)]
    pub player_name: Option<String>,
    #[serde(default)]
    pub total_matches_played: Option<u32>,
    #[serde(default)]
    pub total_wins: Option<u32>,
    #[serde(default)]
    pub total_losses: Option<u32>,
    #[serde(flatten)]
    pub stats: PlayerStats,
    #[serde(default)]
    pub most_common_opponent: Option<String>,
    #[serde(default)]
    pub performance_trend: Option<String>,
    #[serde(default)]
    pub head_to_head_records: OrderedMap<H2HStats>,
}

/// Numeric columns of a player record other than the three counters.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    #[serde(default, deserialize_with = "zero_if_null")]
    pub overall_win_rate: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub total_games_played: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub total_games_won: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub total_games_lost: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub game_win_rate: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub average_games_per_match: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub win_rate_last_6_months: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub win_rate_last_3_months: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub win_rate_last_1_month: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub win_rate_last_10_days: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub matches_played_last_6_months: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub matches_played_last_3_months: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub matches_played_last_1_month: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub matches_played_last_10_days: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub current_win_streak: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub longest_win_streak: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub current_losing_streak: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub longest_losing_streak: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub win_rate_best_of_3: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub win_rate_best_of_5: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub win_rate_deciding_games: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub win_rate_straight_matches: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub average_opponent_win_rate: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub win_rate_against_higher_ranked: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub win_rate_against_lower_ranked: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub win_rate_against_most_common_opponent: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub total_events_participated: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub average_time_between_matches: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub time_since_last_match: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub win_rate_after_win: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub win_rate_after_loss: f64,
}

// headToHeadRecords[opponent]
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct H2HStats {
    #[serde(default, deserialize_with = "zero_if_null")]
    pub total_matches_played: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub wins: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub losses: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub win_rate: f64,
    #[serde(default)]
    pub recent_matchups: RecentMatchups,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub win_rate_best_of_3: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub win_rate_best_of_5: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub average_margin: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub days_since_last_match: f64,
    #[serde(default)]
    pub last_match_date: Option<String>,
    #[serde(default)]
    pub last_match_event: Option<String>,
    #[serde(default)]
    pub performance_trend: Option<String>,
}

impl H2HStats {
    /// Win rate over the last five meetings, 0 when never recorded.
    pub fn recent_win_rate(&self) -> f64 {
        self.recent_matchups
            .last_5_matches
            .as_ref()
            .map(|w| w.win_rate)
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecentMatchups {
    #[serde(default)]
    pub last_1_matches: Option<RecentWindow>,
    #[serde(default)]
    pub last_3_matches: Option<RecentWindow>,
    #[serde(default)]
    pub last_5_matches: Option<RecentWindow>,
    #[serde(default)]
    pub last_10_matches: Option<RecentWindow>,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecentWindow {
    #[serde(default, deserialize_with = "zero_if_null")]
    pub matches_played: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub wins: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub losses: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub win_rate: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub game_win_rate: f64,
}

/// A JSON object keyed by name, in the order the keys appear on disk.
#[derive(Debug, Clone)]
pub struct OrderedMap<V> {
    pub entries: Vec<(String, V)>,
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        OrderedMap {
            entries: Vec::new(),
        }
    }
}

impl<V> OrderedMap<V> {
    pub fn iter(&self) -> impl Iterator<Item = (&String, &V)> {
        self.entries.iter().map(|(name, value)| (name, value))
    }

    /// First entry stored under `key`.
    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'de, V> Deserialize<'de> for OrderedMap<V>
where
    V: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct OrderedVisitor<V>(PhantomData<V>);

        impl<'de, V> Visitor<'de> for OrderedVisitor<V>
        where
            V: Deserialize<'de>,
        {
            type Value = OrderedMap<V>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object keyed by player name")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((name, value)) = map.next_entry::<String, V>()? {
                    entries.push((name, value));
                }
                Ok(OrderedMap { entries })
            }
        }

        deserializer.deserialize_map(OrderedVisitor(PhantomData))
    }
}

/// Player file before alias merging.
pub type RawPlayerTable = OrderedMap<RawPlayerRecord>;

/// A merged player keyed by canonical name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerRecord {
    pub name: String,
    pub total_matches_played: u32,
    pub total_wins: u32,
    pub total_losses: u32,
    pub stats: PlayerStats,
    pub head_to_head: HashMap<String, H2HStats>,
}

impl PlayerRecord {
    pub fn overall_win_rate(&self) -> f64 {
        self.stats.overall_win_rate
    }

    pub fn stat(&self, column: StatColumn) -> f64 {
        let s = &self.stats;
        match column {
            StatColumn::TotalMatchesPlayed => self.total_matches_played as f64,
            StatColumn::TotalWins => self.total_wins as f64,
            StatColumn::TotalLosses => self.total_losses as f64,
            StatColumn::OverallWinRate => s.overall_win_rate,
            StatColumn::TotalGamesPlayed => s.total_games_played,
            StatColumn::TotalGamesWon => s.total_games_won,
            StatColumn::TotalGamesLost => s.total_games_lost,
            StatColumn::GameWinRate => s.game_win_rate,
            StatColumn::AverageGamesPerMatch => s.average_games_per_match,
            StatColumn::WinRateLast6Months => s.win_rate_last_6_months,
            StatColumn::WinRateLast3Months => s.win_rate_last_3_months,
            StatColumn::WinRateLast1Month => s.win_rate_last_1_month,
            StatColumn::WinRateLast10Days => s.win_rate_last_10_days,
            StatColumn::MatchesPlayedLast6Months => s.matches_played_last_6_months,
            StatColumn::MatchesPlayedLast3Months => s.matches_played_last_3_months,
            StatColumn::MatchesPlayedLast1Month => s.matches_played_last_1_month,
            StatColumn::MatchesPlayedLast10Days => s.matches_played_last_10_days,
            StatColumn::CurrentWinStreak => s.current_win_streak,
            StatColumn::LongestWinStreak => s.longest_win_streak,
            StatColumn::CurrentLosingStreak => s.current_losing_streak,
            StatColumn::LongestLosingStreak => s.longest_losing_streak,
            StatColumn::WinRateBestOf3 => s.win_rate_best_of_3,
            StatColumn::WinRateBestOf5 => s.win_rate_best_of_5,
            StatColumn::WinRateDecidingGames => s.win_rate_deciding_games,
            StatColumn::WinRateStraightMatches => s.win_rate_straight_matches,
            StatColumn::AverageOpponentWinRate => s.average_opponent_win_rate,
            StatColumn::WinRateAgainstHigherRanked => s.win_rate_against_higher_ranked,
            StatColumn::WinRateAgainstLowerRanked => s.win_rate_against_lower_ranked,
            StatColumn::WinRateAgainstMostCommonOpponent => {
                s.win_rate_against_most_common_opponent
            }
            StatColumn::TotalEventsParticipated => s.total_events_participated,
            StatColumn::AverageTimeBetweenMatches => s.average_time_between_matches,
            StatColumn::TimeSinceLastMatch => s.time_since_last_match,
            StatColumn::WinRateAfterWin => s.win_rate_after_win,
            StatColumn::WinRateAfterLoss => s.win_rate_after_loss,
        }
    }
}

/// Canonical name -> merged record.
pub type PlayerTable = HashMap<String, PlayerRecord>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatColumn {
    TotalMatchesPlayed,
    TotalWins,
    TotalLosses,
    OverallWinRate,
    TotalGamesPlayed,
    TotalGamesWon,
    TotalGamesLost,
    GameWinRate,
    AverageGamesPerMatch,
    WinRateLast6Months,
    WinRateLast3Months,
    WinRateLast1Month,
    WinRateLast10Days,
    MatchesPlayedLast6Months,
    MatchesPlayedLast3Months,
    MatchesPlayedLast1Month,
    MatchesPlayedLast10Days,
    CurrentWinStreak,
    LongestWinStreak,
    CurrentLosingStreak,
    LongestLosingStreak,
    WinRateBestOf3,
    WinRateBestOf5,
    WinRateDecidingGames,
    WinRateStraightMatches,
    AverageOpponentWinRate,
    WinRateAgainstHigherRanked,
    WinRateAgainstLowerRanked,
    WinRateAgainstMostCommonOpponent,
    TotalEventsParticipated,
    AverageTimeBetweenMatches,
    TimeSinceLastMatch,
    WinRateAfterWin,
    WinRateAfterLoss,
}

impl StatColumn {
    pub const ALL: [StatColumn; 34] = [
        StatColumn::TotalMatchesPlayed,
        StatColumn::TotalWins,
        StatColumn::TotalLosses,
        StatColumn::OverallWinRate,
        StatColumn::TotalGamesPlayed,
        StatColumn::TotalGamesWon,
        StatColumn::TotalGamesLost,
        StatColumn::GameWinRate,
        StatColumn::AverageGamesPerMatch,
        StatColumn::WinRateLast6Months,
        StatColumn::WinRateLast3Months,
        StatColumn::WinRateLast1Month,
        StatColumn::WinRateLast10Days,
        StatColumn::MatchesPlayedLast6Months,
        StatColumn::MatchesPlayedLast3Months,
        StatColumn::MatchesPlayedLast1Month,
        StatColumn::MatchesPlayedLast10Days,
        StatColumn::CurrentWinStreak,
        StatColumn::LongestWinStreak,
        StatColumn::CurrentLosingStreak,
        StatColumn::LongestLosingStreak,
        StatColumn::WinRateBestOf3,
        StatColumn::WinRateBestOf5,
        StatColumn::WinRateDecidingGames,
        StatColumn::WinRateStraightMatches,
        StatColumn::AverageOpponentWinRate,
        StatColumn::WinRateAgainstHigherRanked,
        StatColumn::WinRateAgainstLowerRanked,
        StatColumn::WinRateAgainstMostCommonOpponent,
        StatColumn::TotalEventsParticipated,
        StatColumn::AverageTimeBetweenMatches,
        StatColumn::TimeSinceLastMatch,
        StatColumn::WinRateAfterWin,
        StatColumn::WinRateAfterLoss,
    ];

    /// Key used in playerDataPoints.json.
    pub fn json_name(self) -> &'static str {
        match self {
            StatColumn::TotalMatchesPlayed => "totalMatchesPlayed",
            StatColumn::TotalWins => "totalWins",
            StatColumn::TotalLosses => "totalLosses",
            StatColumn::OverallWinRate => "overallWinRate",
            StatColumn::TotalGamesPlayed => "totalGamesPlayed",
            StatColumn::TotalGamesWon => "totalGamesWon",
            StatColumn::TotalGamesLost => "totalGamesLost",
            StatColumn::GameWinRate => "gameWinRate",
            StatColumn::AverageGamesPerMatch => "averageGamesPerMatch",
            StatColumn::WinRateLast6Months => "winRateLast6Months",
            StatColumn::WinRateLast3Months => "winRateLast3Months",
            StatColumn::WinRateLast1Month => "winRateLast1Month",
            StatColumn::WinRateLast10Days => "winRateLast10Days",
            StatColumn::MatchesPlayedLast6Months => "matchesPlayedLast6Months",
            StatColumn::MatchesPlayedLast3Months => "matchesPlayedLast3Months",
            StatColumn::MatchesPlayedLast1Month => "matchesPlayedLast1Month",
            StatColumn::MatchesPlayedLast10Days => "matchesPlayedLast10Days",
            StatColumn::CurrentWinStreak => "currentWinStreak",
            StatColumn::LongestWinStreak => "longestWinStreak",
            StatColumn::CurrentLosingStreak => "currentLosingStreak",
            StatColumn::LongestLosingStreak => "longestLosingStreak",
            StatColumn::WinRateBestOf3 => "winRateBestOf3",
            StatColumn::WinRateBestOf5 => "winRateBestOf5",
            StatColumn::WinRateDecidingGames => "winRateDecidingGames",
            StatColumn::WinRateStraightMatches => "winRateStraightMatches",
            StatColumn::AverageOpponentWinRate => "averageOpponentWinRate",
            StatColumn::WinRateAgainstHigherRanked => "winRateAgainstHigherRanked",
            StatColumn::WinRateAgainstLowerRanked => "winRateAgainstLowerRanked",
            StatColumn::WinRateAgainstMostCommonOpponent => "winRateAgainstMostCommonOpponent",
            StatColumn::TotalEventsParticipated => "totalEventsParticipated",
            StatColumn::AverageTimeBetweenMatches => "averageTimeBetweenMatches",
            StatColumn::TimeSinceLastMatch => "timeSinceLastMatch",
            StatColumn::WinRateAfterWin => "winRateAfterWin",
            StatColumn::WinRateAfterLoss => "winRateAfterLoss",
        }
    }
}

impl FromStr for StatColumn {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        StatColumn::ALL
            .iter()
            .copied()
            .find(|c| c.json_name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| AppError::LookupError(format!("unknown statistic '{}'", wanted)))
    }
}

impl fmt::Display for StatColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.json_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BestOf {
    Three,
    Five,
}

impl BestOf {
    pub fn games(self) -> u32 {
        match self {
            BestOf::Three => 3,
            BestOf::Five => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BestOf::Three => "Best of 3",
            BestOf::Five => "Best of 5",
        }
    }
}

impl FromStr for BestOf {
    type Err = AppError;

    /// Accepts the match-log spelling ("Best of 3") and the short forms "3", "bo3".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        match compact.as_str() {
            "bestof3" | "bo3" | "3" => Ok(BestOf::Three),
            "bestof5" | "bo5" | "5" => Ok(BestOf::Five),
            _ => Err(AppError::DataError(format!("unknown match format '{}'", s))),
        }
    }
}

impl fmt::Display for BestOf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// matches.json entry
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawMatch {
    pub winner_name: String,
    pub loser_name: String,
    pub best_of: String,
    #[serde(default)]
    pub winner_score: Option<u32>,
    #[serde(default)]
    pub loser_score: Option<u32>,
    #[serde(default)]
    pub completed_at: Option<i64>,
    #[serde(default)]
    pub tournament_name: Option<String>,
}

/// A finished match with canonical player names.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecord {
    pub winner: String,
    pub loser: String,
    pub best_of: BestOf,
    pub winner_score: Option<u32>,
    pub loser_score: Option<u32>,
    pub completed_at: Option<i64>,
    pub tournament_name: Option<String>,
}

impl MatchRecord {
    pub fn new(winner: &str, loser: &str, best_of: BestOf) -> Self {
        MatchRecord {
            winner: winner.to_string(),
            loser: loser.to_string(),
            best_of,
            winner_score: None,
            loser_score: None,
            completed_at: None,
            tournament_name: None,
        }
    }

    pub fn involves(&self, a: &str, b: &str) -> bool {
        (self.winner == a && self.loser == b) || (self.winner == b && self.loser == a)
    }

    /// Went the full distance (2-1 in a Bo3, 3-2 in a Bo5). False when unscored.
    pub fn is_deciding(&self) -> bool {
        match (self.winner_score, self.loser_score) {
            (Some(w), Some(l)) => w + l == self.best_of.games(),
            _ => false,
        }
    }
}
