use crate::analysis::features::SkippedMatch;
use crate::analysis::head_to_head::tally_wins;
use crate::analysis::matchups::MatchupSummary;
use crate::analysis::metrics::TrainingMetrics;
use crate::analysis::player_stats::{Metric, RankedPlayer};
use crate::analysis::predictor::Prediction;
use crate::data::models::{H2HStats, MatchRecord};
use chrono::{TimeZone, Utc};
use colored::*;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct MatchupRow {
    rank: String,
    matchup: String,
    matches: String,
    #[tabled(rename = "win rate A")]
    win_rate_a: String,
    #[tabled(rename = "win rate B")]
    win_rate_b: String,
}

#[derive(Tabled)]
struct RankingRow {
    rank: String,
    player: String,
    value: String,
}

#[derive(Tabled)]
struct ClassRow {
    class: String,
    precision: String,
    recall: String,
    f1: String,
    support: String,
}

#[derive(Tabled)]
struct MeetingRow {
    date: String,
    winner: String,
    loser: String,
    score: String,
    format: String,
    event: String,
}

fn header(title: &str, width: usize) {
    println!("\n{}", title.bold().cyan());
    println!("{}\n", "=".repeat(width).cyan());
}

pub fn display_matchups(matchups: &[MatchupSummary]) {
    header("⚔️  MOST PLAYED MATCHUPS", 60);

    if matchups.is_empty() {
        println!("{}", "No matches in the log".yellow());
        return;
    }

    let rows: Vec<MatchupRow> = matchups
        .iter()
        .enumerate()
        .map(|(idx, m)| MatchupRow {
            rank: format!("#{}", idx + 1),
            matchup: format!("{} vs {}", m.player_a, m.player_b),
            matches: m.total_matches.to_string(),
            win_rate_a: format!("{:.2}%", m.win_rate_a),
            win_rate_b: format!("{:.2}%", m.win_rate_b),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}\n", table);
}

pub fn display_rankings(title: &str, metric: Metric, ranked: &[RankedPlayer]) {
    header(&format!("📊 {} ({})", title, metric), 60);

    if ranked.is_empty() {
        println!("{}", "No players match the given filters".yellow());
        return;
    }

    let rows: Vec<RankingRow> = ranked
        .iter()
        .map(|r| RankingRow {
            rank: format!("#{}", r.rank),
            player: r.name.clone(),
            value: format!("{:.2}", r.value),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}\n", table);
}

pub fn display_training_report(metrics: &TrainingMetrics, matches_used: usize, skipped: &[SkippedMatch]) {
    header("🧠 TRAINING REPORT", 60);

    println!(
        "{} {} matches used, {} skipped ({} train rows / {} test rows)",
        "📈 Dataset:".bold(),
        matches_used.to_string().green(),
        skipped.len().to_string().yellow(),
        metrics.train_samples,
        metrics.test_samples
    );
    let auc = metrics
        .roc_auc
        .map(|a| format!("{:.2}", a))
        .unwrap_or_else(|| "n/a".to_string());
    println!(
        "{} accuracy {:.2}, ROC AUC {}\n",
        "🎯 Held-out:".bold(),
        metrics.accuracy,
        auc
    );

    let rows: Vec<ClassRow> = metrics
        .per_class
        .iter()
        .map(|c| ClassRow {
            class: if c.label == 1 { "win (1)" } else { "loss (0)" }.to_string(),
            precision: format!("{:.2}", c.precision),
            recall: format!("{:.2}", c.recall),
            f1: format!("{:.2}", c.f1),
            support: c.support.to_string(),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);

    if !skipped.is_empty() {
        println!("\n{}", "Skipped matches".bold().yellow());
        for s in skipped.iter().take(10) {
            println!("  #{} {} vs {}: {}", s.index, s.winner, s.loser, s.reason);
        }
        if skipped.len() > 10 {
            println!("  ... and {} more", skipped.len() - 10);
        }
    }
    println!();
}

pub fn display_prediction(prediction: &Prediction) {
    header(
        &format!(
            "🔮 {} vs {} ({})",
            prediction.player_a, prediction.player_b, prediction.best_of
        ),
        60,
    );

    let p = prediction.probability;
    let line = format!("{} wins with probability {:.2}", prediction.player_a, p);
    if p >= 0.5 {
        println!("{}", line.green().bold());
    } else {
        println!("{}", line.red().bold());
    }
    println!(
        "{} wins with probability {:.2}",
        prediction.player_b,
        1.0 - p
    );
    println!(
        "\n{}",
        format!(
            "raw model outputs: {:.2} as listed, {:.2} reversed",
            prediction.forward, prediction.reverse
        )
        .dimmed()
    );
    println!();
}

pub fn display_head_to_head(a: &str, b: &str, record: &H2HStats, meetings: &[&MatchRecord]) {
    header(&format!("🤝 {} vs {}", a, b), 60);

    println!("{}", format!("Recorded by {}", a).bold());
    println!("  Matches:        {}", record.total_matches_played);
    println!("  Win rate:       {:.2}%", record.win_rate);
    println!("  Last 5 win rate: {:.2}%", record.recent_win_rate());
    println!("  Avg margin:     {:.2}", record.average_margin);
    println!("  Best of 3:      {:.2}%", record.win_rate_best_of_3);
    println!("  Best of 5:      {:.2}%", record.win_rate_best_of_5);

    if meetings.is_empty() {
        println!("\n{}", "No meetings in the match log".yellow());
        println!();
        return;
    }

    let (a_wins, b_wins) = tally_wins(meetings, a);
    println!(
        "\n{} {} {} / {} {}\n",
        "📈 Match log:".bold(),
        a,
        a_wins.to_string().green(),
        b_wins.to_string().red(),
        b
    );

    let rows: Vec<MeetingRow> = meetings
        .iter()
        .map(|m| MeetingRow {
            date: m
                .completed_at
                .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".to_string()),
            winner: m.winner.clone(),
            loser: m.loser.clone(),
            score: match (m.winner_score, m.loser_score) {
                (Some(w), Some(l)) => format!("{}-{}", w, l),
                _ => "-".to_string(),
            },
            format: m.best_of.to_string(),
            event: m.tournament_name.clone().unwrap_or_default(),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}\n", table);
}

pub fn display_aliases(canonical: &str, aliases: &[String]) {
    if aliases.len() > 1 {
        display_info(&format!("{} is also known as: {}", canonical, aliases.join(", ")));
    }
}

pub fn display_error(error: &str) {
    eprintln!("{} {}", "❌ Error:".red().bold(), error);
}

pub fn display_warning(message: &str) {
    eprintln!("{} {}", "⚠️".yellow(), message);
}

pub fn display_info(message: &str) {
    println!("{} {}", "ℹ️".cyan(), message);
}

pub fn display_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}
