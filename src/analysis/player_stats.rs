use crate::data::models::{PlayerRecord, PlayerTable, StatColumn};
use crate::error::AppError;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivedStat {
    /// winRateDecidingGames - overallWinRate
    ClutchFactor,
    /// winRateStraightMatches - overallWinRate
    StraightVsOverall,
}

/// A sortable/filterable per-player number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Column(StatColumn),
    Derived(DerivedStat),
}

impl Metric {
    pub fn value(self, player: &PlayerRecord) -> f64 {
        match self {
            Metric::Column(column) => player.stat(column),
            Metric::Derived(DerivedStat::ClutchFactor) => {
                player.stats.win_rate_deciding_games - player.overall_win_rate()
            }
            Metric::Derived(DerivedStat::StraightVsOverall) => {
                player.stats.win_rate_straight_matches - player.overall_win_rate()
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Metric::Column(column) => column.json_name(),
            Metric::Derived(DerivedStat::ClutchFactor) => "clutchFactor",
            Metric::Derived(DerivedStat::StraightVsOverall) => "straightVsOverall",
        }
    }
}

impl FromStr for Metric {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        if wanted.eq_ignore_ascii_case("clutchFactor") {
            return Ok(Metric::Derived(DerivedStat::ClutchFactor));
        }
        if wanted.eq_ignore_ascii_case("straightVsOverall") {
            return Ok(Metric::Derived(DerivedStat::StraightVsOverall));
        }
        wanted.parse::<StatColumn>().map(Metric::Column).map_err(|_| {
            AppError::LookupError(format!("statistic '{}' not found", wanted))
        })
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Descending,
    Ascending,
}

/// Inclusive range on one metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatFilter {
    pub metric: Metric,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl StatFilter {
    pub fn accepts(&self, player: &PlayerRecord) -> bool {
        let v = self.metric.value(player);
        self.min.map_or(true, |min| v >= min) && self.max.map_or(true, |max| v <= max)
    }

    /// Parse `name=value` into a lower bound.
    pub fn parse_min(spec: &str) -> Result<Self, AppError> {
        let (metric, value) = parse_bound(spec)?;
        Ok(StatFilter {
            metric,
            min: Some(value),
            max: None,
        })
    }

    /// Parse `name=value` into an upper bound.
    pub fn parse_max(spec: &str) -> Result<Self, AppError> {
        let (metric, value) = parse_bound(spec)?;
        Ok(StatFilter {
            metric,
            min: None,
            max: Some(value),
        })
    }
}

fn parse_bound(spec: &str) -> Result<(Metric, f64), AppError> {
    let (name, value) = spec.split_once('=').ok_or_else(|| {
        AppError::ConfigError(format!("filter '{}' must look like statName=value", spec))
    })?;
    let metric = name.parse::<Metric>()?;
    let value = value.trim().parse::<f64>().map_err(|_| {
        AppError::ConfigError(format!("filter '{}' has a non-numeric bound", spec))
    })?;
    Ok((metric, value))
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedPlayer {
    pub rank: usize,
    pub name: String,
    pub value: f64,
}

/// Players passing every filter, sorted by `metric`, ties by name.
pub fn rank_players(
    players: &PlayerTable,
    metric: Metric,
    order: SortOrder,
    top_n: usize,
    filters: &[StatFilter],
) -> Vec<RankedPlayer> {
    let mut rows: Vec<(&str, f64)> = players
        .values()
        .filter(|p| filters.iter().all(|f| f.accepts(p)))
        .map(|p| (p.name.as_str(), metric.value(p)))
        .collect();

    rows.sort_by(|(na, va), (nb, vb)| {
        let by_value = match order {
            SortOrder::Descending => vb.partial_cmp(va),
            SortOrder::Ascending => va.partial_cmp(vb),
        };
        by_value.unwrap_or(Ordering::Equal).then_with(|| na.cmp(nb))
    });

    rows.into_iter()
        .take(top_n)
        .enumerate()
        .map(|(idx, (name, value))| RankedPlayer {
            rank: idx + 1,
            name: name.to_string(),
            value,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::models::PlayerStats;
    use std::collections::HashMap;

    fn table() -> PlayerTable {
        let rows = [
            ("Alpha", 60.0, 75.0, 50.0),
            ("Beta", 40.0, 30.0, 45.0),
            ("Gamma", 60.0, 60.0, 80.0),
            ("Delta", 20.0, 35.0, 10.0),
        ];
        rows.iter()
            .map(|(name, overall, deciding, straight)| {
                let record = PlayerRecord {
                    name: name.to_string(),
                    total_matches_played: 10,
                    total_wins: (*overall / 10.0) as u32,
                    total_losses: 10 - (*overall / 10.0) as u32,
                    stats: PlayerStats {
                        overall_win_rate: *overall,
                        win_rate_deciding_games: *deciding,
                        win_rate_straight_matches: *straight,
                        ..PlayerStats::default()
                    },
                    head_to_head: HashMap::new(),
                };
                (name.to_string(), record)
            })
            .collect()
    }

    fn names(ranked: &[RankedPlayer]) -> Vec<&str> {
        ranked.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn sorts_descending_with_name_tiebreak() {
        let metric: Metric = "overallWinRate".parse().unwrap();
        let ranked = rank_players(&table(), metric, SortOrder::Descending, 10, &[]);
        assert_eq!(names(&ranked), vec!["Alpha", "Gamma", "Beta", "Delta"]);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[3].rank, 4);
    }

    #[test]
    fn ascending_and_top_n() {
        let metric: Metric = "overallWinRate".parse().unwrap();
        let ranked = rank_players(&table(), metric, SortOrder::Ascending, 2, &[]);
        assert_eq!(names(&ranked), vec!["Delta", "Beta"]);
    }

    #[test]
    fn clutch_factor_is_plain_difference() {
        let metric: Metric = "clutchFactor".parse().unwrap();
        let ranked = rank_players(&table(), metric, SortOrder::Descending, 10, &[]);
        // Alpha and Delta tie at +15
        assert_eq!(names(&ranked), vec!["Alpha", "Delta", "Gamma", "Beta"]);
        assert_eq!(ranked[1].value, 15.0);
        assert_eq!(ranked.last().unwrap().value, -10.0);
    }

    #[test]
    fn straight_vs_overall_ranks_gamma_first() {
        let metric = Metric::Derived(DerivedStat::StraightVsOverall);
        let ranked = rank_players(&table(), metric, SortOrder::Descending, 1, &[]);
        assert_eq!(ranked[0].name, "Gamma");
        assert_eq!(ranked[0].value, 20.0);
    }

    #[test]
    fn filters_are_inclusive_ranges() {
        let filters = vec![
            StatFilter::parse_min("overallWinRate=40").unwrap(),
            StatFilter::parse_max("winRateDecidingGames=60").unwrap(),
        ];
        let metric: Metric = "overallWinRate".parse().unwrap();
        let ranked = rank_players(&table(), metric, SortOrder::Descending, 10, &filters);
        assert_eq!(names(&ranked), vec!["Gamma", "Beta"]);
    }

    #[test]
    fn unknown_statistic_is_a_lookup_error() {
        assert!("bogus".parse::<Metric>().unwrap_err().is_lookup());
        assert!(StatFilter::parse_min("bogus=3").unwrap_err().is_lookup());
        assert!(matches!(
            StatFilter::parse_min("overallWinRate"),
            Err(AppError::ConfigError(_))
        ));
    }
}
