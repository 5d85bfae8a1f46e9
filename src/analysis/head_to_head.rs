use super::features::lookup;
use crate::data::models::{BestOf, H2HStats, MatchRecord, PlayerTable};
use crate::error::AppError;
use chrono::{DateTime, Duration, Months, NaiveDate, NaiveTime, Utc};
use std::fmt;
use std::str::FromStr;

/// `a`'s recorded history against `b`, zeroed when they never met.
pub fn head_to_head(players: &PlayerTable, a: &str, b: &str) -> Result<H2HStats, AppError> {
    let first = lookup(players, a)?;
    lookup(players, b)?;
    Ok(first.head_to_head.get(b).cloned().unwrap_or_default())
}

/// Preset look-back windows, measured back from "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeWindow {
    LastSixMonths,
    LastMonth,
    LastTenDays,
}

impl TimeWindow {
    /// Earliest `completedAt` (unix seconds) inside the window.
    pub fn since(self, now: DateTime<Utc>) -> i64 {
        let start = match self {
            TimeWindow::LastSixMonths => now.checked_sub_months(Months::new(6)),
            TimeWindow::LastMonth => now.checked_sub_months(Months::new(1)),
            TimeWindow::LastTenDays => now.checked_sub_signed(Duration::days(10)),
        };
        start.unwrap_or(DateTime::<Utc>::MIN_UTC).timestamp()
    }

    pub fn label(self) -> &'static str {
        match self {
            TimeWindow::LastSixMonths => "Last 6 Months",
            TimeWindow::LastMonth => "Last 1 Month",
            TimeWindow::LastTenDays => "Last 10 Days",
        }
    }
}

impl FromStr for TimeWindow {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        match key.trim_start_matches("last") {
            "6m" | "6months" => Ok(TimeWindow::LastSixMonths),
            "1m" | "1month" => Ok(TimeWindow::LastMonth),
            "10d" | "10days" => Ok(TimeWindow::LastTenDays),
            _ => Err(AppError::ConfigError(format!(
                "unknown time window '{}', expected 6m, 1m or 10d",
                s
            ))),
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Unix seconds at 00:00:00 UTC on `date`.
pub fn day_start(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

/// Unix seconds at 23:59:59 UTC on `date`.
pub fn day_end(date: NaiveDate) -> i64 {
    day_start(date) + 86_399
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct H2HFilter {
    pub best_of: Option<BestOf>,
    pub last_n: Option<usize>,
    /// Earliest `completedAt` kept, inclusive.
    pub since: Option<i64>,
    /// Latest `completedAt` kept, inclusive.
    pub until: Option<i64>,
    /// Only matches that went to the last game of the series.
    pub deciding_only: bool,
}

impl H2HFilter {
    /// Every condition except `last_n`. Undated matches fail any time bound.
    pub fn accepts(&self, m: &MatchRecord) -> bool {
        if self.best_of.map_or(false, |fmt| m.best_of != fmt) {
            return false;
        }
        if self.deciding_only && !m.is_deciding() {
            return false;
        }
        if self.since.is_none() && self.until.is_none() {
            return true;
        }
        match m.completed_at {
            Some(at) => {
                self.since.map_or(true, |since| at >= since)
                    && self.until.map_or(true, |until| at <= until)
            }
            None => false,
        }
    }
}

/// Meetings between `a` and `b` in the log, most recent first.
///
/// Undated meetings are treated as oldest. Between equal dates, the one
/// later in the file counts as more recent.
pub fn head_to_head_matches<'a>(
    matches: &'a [MatchRecord],
    a: &str,
    b: &str,
    filter: H2HFilter,
) -> Vec<&'a MatchRecord> {
    let mut selected: Vec<(usize, &MatchRecord)> = matches
        .iter()
        .enumerate()
        .filter(|(_, m)| m.involves(a, b) && filter.accepts(m))
        .collect();

    selected.sort_by(|(ia, ma), (ib, mb)| {
        mb.completed_at
            .cmp(&ma.completed_at)
            .then_with(|| ib.cmp(ia))
    });

    let limit = filter.last_n.unwrap_or(selected.len());
    selected.into_iter().take(limit).map(|(_, m)| m).collect()
}

/// (wins for `a`, wins for `b`) over a set of meetings.
pub fn tally_wins(meetings: &[&MatchRecord], a: &str) -> (usize, usize) {
    let a_wins = meetings.iter().filter(|m| m.winner == a).count();
    (a_wins, meetings.len() - a_wins)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::models::PlayerRecord;
    use std::collections::HashMap;

    fn players() -> PlayerTable {
        let mut alpha = PlayerRecord {
            name: "Alpha".to_string(),
            ..PlayerRecord::default()
        };
        alpha.head_to_head.insert(
            "Beta".to_string(),
            H2HStats {
                total_matches_played: 3.0,
                win_rate: 66.67,
                ..H2HStats::default()
            },
        );
        let beta = PlayerRecord {
            name: "Beta".to_string(),
            head_to_head: HashMap::new(),
            ..PlayerRecord::default()
        };
        let mut table = PlayerTable::new();
        table.insert("Alpha".to_string(), alpha);
        table.insert("Beta".to_string(), beta);
        table
    }

    fn dated(winner: &str, loser: &str, best_of: BestOf, at: Option<i64>) -> MatchRecord {
        MatchRecord {
            completed_at: at,
            ..MatchRecord::new(winner, loser, best_of)
        }
    }

    fn scored(best_of: BestOf, winner_score: u32, loser_score: u32) -> MatchRecord {
        MatchRecord {
            winner_score: Some(winner_score),
            loser_score: Some(loser_score),
            ..MatchRecord::new("Alpha", "Beta", best_of)
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn record_is_one_sided_and_zeroed_when_absent() {
        let table = players();
        assert_eq!(head_to_head(&table, "Alpha", "Beta").unwrap().win_rate, 66.67);
        assert_eq!(head_to_head(&table, "Beta", "Alpha").unwrap(), H2HStats::default());
    }

    #[test]
    fn unknown_player_is_a_lookup_error() {
        let table = players();
        assert!(head_to_head(&table, "Alpha", "Nobody").unwrap_err().is_lookup());
        assert!(head_to_head(&table, "Nobody", "Alpha").unwrap_err().is_lookup());
    }

    #[test]
    fn meetings_are_newest_first_with_file_order_tiebreak() {
        let log = vec![
            dated("Alpha", "Beta", BestOf::Three, Some(100)),
            dated("Beta", "Alpha", BestOf::Five, Some(300)),
            dated("Alpha", "Gamma", BestOf::Three, Some(400)),
            dated("Alpha", "Beta", BestOf::Five, Some(300)),
            dated("Beta", "Alpha", BestOf::Three, None),
        ];
        let found = head_to_head_matches(&log, "Alpha", "Beta", H2HFilter::default());
        let order: Vec<*const MatchRecord> = found.iter().map(|m| *m as *const _).collect();
        let expected: Vec<*const MatchRecord> =
            [3, 1, 0, 4].iter().map(|&i| &log[i] as *const _).collect();
        assert_eq!(order, expected);

        assert_eq!(tally_wins(&found, "Alpha"), (2, 2));
    }

    #[test]
    fn filters_by_format_and_limits_to_last_n() {
        let log = vec![
            dated("Alpha", "Beta", BestOf::Three, Some(1)),
            dated("Beta", "Alpha", BestOf::Three, Some(2)),
            dated("Alpha", "Beta", BestOf::Five, Some(3)),
            dated("Alpha", "Beta", BestOf::Three, Some(4)),
        ];
        let filter = H2HFilter {
            best_of: Some(BestOf::Three),
            last_n: Some(2),
            ..H2HFilter::default()
        };
        let found = head_to_head_matches(&log, "Beta", "Alpha", filter);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].completed_at, Some(4));
        assert_eq!(found[1].completed_at, Some(2));
    }

    #[test]
    fn date_range_is_inclusive_at_both_ends() {
        let from = date(2024, 3, 1);
        let to = date(2024, 3, 31);
        let log = vec![
            dated("Alpha", "Beta", BestOf::Three, Some(day_start(from) - 1)),
            dated("Alpha", "Beta", BestOf::Three, Some(day_start(from))),
            dated("Beta", "Alpha", BestOf::Three, Some(day_start(date(2024, 3, 15)))),
            dated("Alpha", "Beta", BestOf::Three, Some(day_end(to))),
            dated("Alpha", "Beta", BestOf::Three, Some(day_end(to) + 1)),
            dated("Alpha", "Beta", BestOf::Three, None),
        ];
        let filter = H2HFilter {
            since: Some(day_start(from)),
            until: Some(day_end(to)),
            ..H2HFilter::default()
        };
        let found = head_to_head_matches(&log, "Alpha", "Beta", filter);
        let stamps: Vec<Option<i64>> = found.iter().map(|m| m.completed_at).collect();
        assert_eq!(
            stamps,
            vec![
                Some(day_end(to)),
                Some(day_start(date(2024, 3, 15))),
                Some(day_start(from)),
            ]
        );
    }

    #[test]
    fn day_bounds_cover_the_whole_utc_day() {
        let d = date(2024, 1, 1);
        assert_eq!(day_start(d), 1_704_067_200);
        assert_eq!(day_end(d), 1_704_067_200 + 86_399);
    }

    #[test]
    fn deciding_only_keeps_full_length_series() {
        let log = vec![
            scored(BestOf::Three, 2, 1),
            scored(BestOf::Three, 2, 0),
            scored(BestOf::Five, 3, 2),
            scored(BestOf::Five, 3, 1),
            scored(BestOf::Five, 3, 0),
            MatchRecord::new("Alpha", "Beta", BestOf::Three),
        ];
        let filter = H2HFilter {
            deciding_only: true,
            ..H2HFilter::default()
        };
        let found = head_to_head_matches(&log, "Alpha", "Beta", filter);
        let scores: Vec<(BestOf, Option<u32>, Option<u32>)> = found
            .iter()
            .map(|m| (m.best_of, m.winner_score, m.loser_score))
            .collect();
        assert_eq!(
            scores,
            vec![
                (BestOf::Five, Some(3), Some(2)),
                (BestOf::Three, Some(2), Some(1)),
            ]
        );

        let bo5_only = H2HFilter {
            best_of: Some(BestOf::Five),
            ..filter
        };
        assert_eq!(head_to_head_matches(&log, "Alpha", "Beta", bo5_only).len(), 1);
    }

    #[test]
    fn preset_windows_count_back_from_now() {
        let now = date(2024, 8, 31).and_hms_opt(12, 0, 0).unwrap().and_utc();
        assert_eq!(
            TimeWindow::LastSixMonths.since(now),
            date(2024, 2, 29).and_hms_opt(12, 0, 0).unwrap().and_utc().timestamp()
        );
        assert_eq!(
            TimeWindow::LastMonth.since(now),
            date(2024, 7, 31).and_hms_opt(12, 0, 0).unwrap().and_utc().timestamp()
        );
        assert_eq!(TimeWindow::LastTenDays.since(now), now.timestamp() - 10 * 86_400);

        let log = vec![
            dated("Alpha", "Beta", BestOf::Three, Some(now.timestamp() - 11 * 86_400)),
            dated("Alpha", "Beta", BestOf::Three, Some(now.timestamp() - 10 * 86_400)),
            dated("Alpha", "Beta", BestOf::Three, Some(now.timestamp() - 86_400)),
        ];
        let filter = H2HFilter {
            since: Some(TimeWindow::LastTenDays.since(now)),
            ..H2HFilter::default()
        };
        assert_eq!(head_to_head_matches(&log, "Alpha", "Beta", filter).len(), 2);
    }

    #[test]
    fn time_window_names() {
        assert_eq!("6m".parse::<TimeWindow>().unwrap(), TimeWindow::LastSixMonths);
        assert_eq!("Last 6 Months".parse::<TimeWindow>().unwrap(), TimeWindow::LastSixMonths);
        assert_eq!("last-1-month".parse::<TimeWindow>().unwrap(), TimeWindow::LastMonth);
        assert_eq!("10d".parse::<TimeWindow>().unwrap(), TimeWindow::LastTenDays);
        assert_eq!(TimeWindow::LastTenDays.to_string(), "Last 10 Days");
        assert!(matches!(
            "2w".parse::<TimeWindow>(),
            Err(AppError::ConfigError(_))
        ));
    }
}
