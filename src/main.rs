use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use indicatif::ProgressBar;
use matchup_predict::analysis::head_to_head::{
    day_end, day_start, head_to_head, head_to_head_matches, H2HFilter, TimeWindow,
};
use matchup_predict::analysis::matchups::most_played_matchups;
use matchup_predict::analysis::player_stats::{
    rank_players, DerivedStat, Metric, SortOrder, StatFilter,
};
use matchup_predict::analysis::predictor::Predictor;
use matchup_predict::analysis::trainer::train;
use matchup_predict::artifacts::ModelArtifact;
use matchup_predict::config::{Config, TrainerConfig};
use matchup_predict::data::models::BestOf;
use matchup_predict::data::DataSnapshot;
use matchup_predict::display::output::{
    display_aliases, display_error, display_head_to_head, display_info, display_matchups,
    display_prediction, display_rankings, display_success, display_training_report,
    display_warning,
};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "Matchup Predict")]
#[command(about = "Player statistics, matchup tables and win-probability predictions", long_about = None)]
struct Cli {
    #[command(flatten)]
    paths: PathArgs,

    #[command(subcommand)]
    command: Command,
}

/// Overrides for the paths read from the environment
#[derive(Args, Debug)]
struct PathArgs {
    /// Player statistics JSON
    #[arg(long, global = true)]
    players: Option<PathBuf>,

    /// Match log JSON
    #[arg(long, global = true)]
    matches: Option<PathBuf>,

    /// Raw name -> canonical name JSON
    #[arg(long, global = true)]
    aliases: Option<PathBuf>,

    /// Where the trained model is stored
    #[arg(long, global = true)]
    artifact: Option<PathBuf>,

    /// Token separating a team prefix from the player name
    #[arg(long, global = true)]
    separator: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train the classifier and save it
    Train {
        /// Held-out share of the dataset
        #[arg(long, default_value = "0.2")]
        test_ratio: f64,

        #[arg(long, default_value = "42")]
        seed: u64,

        /// Inverse L2 regularisation strength
        #[arg(short = 'c', long, default_value = "1.0")]
        inverse_regularization: f64,

        #[arg(long, default_value = "100")]
        max_iterations: usize,
    },

    /// Probability that PLAYER_A beats PLAYER_B
    Predict {
        player_a: String,
        player_b: String,

        /// Match format: 3 or 5 (also accepts "Best of 3")
        #[arg(short, long, default_value = "3")]
        best_of: BestOf,
    },

    /// Most frequent pairings in the match log
    Matchups {
        #[arg(short, long, default_value = "10")]
        top_n: usize,
    },

    /// Sort players by any statistic
    Rank {
        /// Statistic name, e.g. overallWinRate or clutchFactor
        stat: Metric,

        #[command(flatten)]
        view: ViewArgs,
    },

    /// Deciding-game win rate minus overall win rate
    Clutch {
        #[command(flatten)]
        view: ViewArgs,
    },

    /// Straight-match win rate minus overall win rate
    Straight {
        #[command(flatten)]
        view: ViewArgs,
    },

    /// Head-to-head record and meetings of two players
    H2h {
        player_a: String,
        player_b: String,

        /// Only meetings in this format
        #[arg(short, long)]
        best_of: Option<BestOf>,

        /// Only the most recent N meetings
        #[arg(short, long)]
        last: Option<usize>,

        /// Preset window: 6m, 1m or 10d
        #[arg(short, long, conflicts_with = "since")]
        window: Option<TimeWindow>,

        /// Earliest day kept, YYYY-MM-DD (inclusive)
        #[arg(long)]
        since: Option<NaiveDate>,

        /// Latest day kept, YYYY-MM-DD (inclusive)
        #[arg(long)]
        until: Option<NaiveDate>,

        /// Only matches that went the full distance (2-1, 3-2)
        #[arg(short, long)]
        deciding: bool,
    },
}

#[derive(Args, Debug)]
struct ViewArgs {
    #[arg(short, long, default_value = "10")]
    top_n: usize,

    /// Lowest first
    #[arg(long)]
    ascending: bool,

    /// Lower bound, e.g. --min totalMatchesPlayed=20 (repeatable)
    #[arg(long = "min")]
    min: Vec<String>,

    /// Upper bound, e.g. --max overallWinRate=60 (repeatable)
    #[arg(long = "max")]
    max: Vec<String>,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        display_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::from_env().context("Failed to load configuration")?;
    apply_overrides(&mut config, cli.paths);

    let snapshot = DataSnapshot::load(&config).context("Failed to load input data")?;

    match cli.command {
        Command::Train {
            test_ratio,
            seed,
            inverse_regularization,
            max_iterations,
        } => {
            let trainer_config = TrainerConfig {
                test_ratio,
                seed,
                inverse_regularization,
                max_iterations,
                ..TrainerConfig::default()
            };
            run_train(&config, &snapshot, &trainer_config)
        }
        Command::Predict {
            player_a,
            player_b,
            best_of,
        } => run_predict(&config, &snapshot, &player_a, &player_b, best_of),
        Command::Matchups { top_n } => {
            display_matchups(&most_played_matchups(&snapshot.matches, top_n));
            Ok(())
        }
        Command::Rank { stat, view } => run_rank(&snapshot, "PLAYER RANKING", stat, view),
        Command::Clutch { view } => run_rank(
            &snapshot,
            "CLUTCH FACTOR",
            Metric::Derived(DerivedStat::ClutchFactor),
            view,
        ),
        Command::Straight { view } => run_rank(
            &snapshot,
            "STRAIGHT VS OVERALL",
            Metric::Derived(DerivedStat::StraightVsOverall),
            view,
        ),
        Command::H2h {
            player_a,
            player_b,
            best_of,
            last,
            window,
            since,
            until,
            deciding,
        } => {
            let a = snapshot.normalizer.normalize(&player_a);
            let b = snapshot.normalizer.normalize(&player_b);
            let record = head_to_head(&snapshot.players, &a, &b)?;

            let since = match window {
                Some(w) => {
                    display_info(&format!("Meetings in the {}", w.label().to_lowercase()));
                    Some(w.since(Utc::now()))
                }
                None => since.map(day_start),
            };
            let filter = H2HFilter {
                best_of,
                last_n: last,
                since,
                until: until.map(day_end),
                deciding_only: deciding,
            };
            if let (Some(from), Some(to)) = (filter.since, filter.until) {
                if from > to {
                    display_warning("--since is after --until, no meeting can match");
                }
            }
            let meetings = head_to_head_matches(&snapshot.matches, &a, &b, filter);
            display_head_to_head(&a, &b, &record, &meetings);
            Ok(())
        }
    }
}

fn apply_overrides(config: &mut Config, paths: PathArgs) {
    if let Some(p) = paths.players {
        config.player_data_path = p;
    }
    if let Some(p) = paths.matches {
        config.matches_path = p;
    }
    if let Some(p) = paths.aliases {
        config.name_mappings_path = p;
    }
    if let Some(p) = paths.artifact {
        config.artifact_path = p;
    }
    if let Some(sep) = paths.separator.filter(|s| !s.trim().is_empty()) {
        config.prefix_separator = sep;
    }
}

fn run_train(config: &Config, snapshot: &DataSnapshot, trainer_config: &TrainerConfig) -> Result<()> {
    display_info(&format!(
        "Training on {} matches across {} players",
        snapshot.matches.len(),
        snapshot.players.len()
    ));

    let spinner = ProgressBar::new_spinner();
    spinner.set_message("Fitting logistic regression");
    spinner.enable_steady_tick(Duration::from_millis(100));
    let outcome = train(&snapshot.matches, &snapshot.players, trainer_config);
    spinner.finish_and_clear();
    let outcome = outcome.context("Training failed")?;

    if !outcome.skipped.is_empty() {
        display_warning(&format!(
            "{} matches skipped because a player is missing from the player data",
            outcome.skipped.len()
        ));
    }
    if !outcome.model.converged {
        display_warning("Solver hit the iteration limit before converging");
    }

    display_training_report(&outcome.metrics, outcome.matches_used, &outcome.skipped);

    let artifact = ModelArtifact::new(&outcome);
    artifact
        .save(&config.artifact_path)
        .with_context(|| format!("Failed to save model to {}", config.artifact_path.display()))?;
    display_success(&format!("Model saved to {}", config.artifact_path.display()));
    Ok(())
}

fn run_predict(
    config: &Config,
    snapshot: &DataSnapshot,
    player_a: &str,
    player_b: &str,
    best_of: BestOf,
) -> Result<()> {
    let artifact = ModelArtifact::load(&config.artifact_path).context("Failed to load model")?;
    display_info(&format!(
        "Using model trained {}",
        artifact.trained_at.format("%Y-%m-%d %H:%M UTC")
    ));

    let predictor = Predictor::new(
        &artifact.model,
        &artifact.scaler,
        &snapshot.players,
        &snapshot.normalizer,
    )?;
    let prediction = predictor.predict(player_a, player_b, best_of)?;

    for name in [&prediction.player_a, &prediction.player_b] {
        display_aliases(name, &snapshot.normalizer.aliases().aliases_of(name));
    }
    display_prediction(&prediction);
    Ok(())
}

fn run_rank(snapshot: &DataSnapshot, title: &str, metric: Metric, view: ViewArgs) -> Result<()> {
    let mut filters = Vec::new();
    for spec in &view.min {
        filters.push(StatFilter::parse_min(spec)?);
    }
    for spec in &view.max {
        filters.push(StatFilter::parse_max(spec)?);
    }

    let order = if view.ascending {
        SortOrder::Ascending
    } else {
        SortOrder::Descending
    };
    let ranked = rank_players(&snapshot.players, metric, order, view.top_n, &filters);
    display_rankings(title, metric, &ranked);
    Ok(())
}
