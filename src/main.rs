use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hoop_ledger::calculate::SeasonScope;
use hoop_ledger::config::AppConfig;
use hoop_ledger::extract::RawBoxScore;
use hoop_ledger::models::SeasonMeta;
use hoop_ledger::pipeline::{self, IngestRequest, IngestSummary};
use hoop_ledger::teams::resolve_teams;

#[derive(Parser)]
#[command(name = "hoop-ledger")]
#[command(about = "Basketball box-score ingestion and season statistics")]
#[command(version)]
struct Cli {
    /// Path to configuration file (optional)
    #[arg(long, default_value = "./ledger.toml")]
    config: PathBuf,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest one box-score export and rebuild derived views
    Ingest {
        /// Path to the exported HTML file
        file: PathBuf,

        /// Season label (e.g. "2025 Spring")
        #[arg(long)]
        season: String,

        /// Mark as a playoff game; `--playoff=false` clears a stored mark
        #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
        playoff: Option<bool>,

        /// Override the opponent's final score
        #[arg(long)]
        opp_score: Option<u32>,

        /// Game date when the export has none (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
    },

    /// Rebuild derived views from stored games
    Recompute {
        /// Only rebuild this season (label or key)
        #[arg(long, conflicts_with = "all")]
        season: Option<String>,

        /// Rebuild every season (default)
        #[arg(long)]
        all: bool,
    },

    /// Merge a curated player metadata file into players.json
    ImportPlayers {
        /// Seed file: a list of players or a map keyed by number
        seed: PathBuf,
    },

    /// Rewrite jersey numbers in every stored game and players.json
    RemapNumbers {
        /// JSON object of old number -> new number
        mapping: PathBuf,
    },

    /// Parse an export and print what was found, without writing anything
    Inspect {
        /// Path to the exported HTML file
        file: PathBuf,

        /// Game date when the export has none (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
    },
}

fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
    hoop_ledger::parse_game_date(s).ok_or_else(|| format!("invalid date {:?} (expected YYYY-MM-DD)", s))
}

fn init_tracing(level: &str, json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config {:?}", cli.config))?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    config.validate().context("Invalid configuration")?;

    init_tracing(&config.log_level, cli.json_logs);
    tracing::info!("Starting hoop-ledger v{}", env!("CARGO_PKG_VERSION"));
    tracing::debug!("Team directory {:?}", config.team_dir());

    match cli.command {
        Commands::Ingest {
            file,
            season,
            playoff,
            opp_score,
            date,
        } => {
            let request = IngestRequest::new(&file, season)
                .with_playoff(playoff)
                .with_opp_score(opp_score)
                .with_date(date);
            let summary = pipeline::ingest_export(&config, &request)
                .with_context(|| format!("Ingest of {:?} failed", file))?;
            print_ingest(&summary);
        }
        Commands::Recompute { season, all } => {
            let scope = match (season, all) {
                (Some(label), false) => match SeasonMeta::from_label(&label) {
                    Some(meta) => SeasonScope::one(&meta.key),
                    None => bail!("Invalid season label {:?}", label),
                },
                _ => SeasonScope::All,
            };
            let summary = pipeline::recompute(&config, &scope).context("Recompute failed")?;

            println!("\n=== Recompute Results ===");
            println!("Games:            {}", summary.games);
            println!("Seasons:          {}", summary.seasons.join(", "));
            println!("Files written:    {}", summary.files_written);
        }
        Commands::ImportPlayers { seed } => {
            let summary = pipeline::import_players(&config, &seed)
                .with_context(|| format!("Import of {:?} failed", seed))?;

            println!("\n=== Import Results ===");
            println!("Created:          {}", summary.seed.created);
            println!("Updated:          {}", summary.seed.updated);
            println!("Unchanged:        {}", summary.seed.unchanged);
            println!("Total players:    {}", summary.total_players);
            println!("Files written:    {}", summary.recompute.files_written);
        }
        Commands::RemapNumbers { mapping } => {
            let summary = pipeline::remap_numbers(&config, &mapping)
                .with_context(|| format!("Remap with {:?} failed", mapping))?;

            println!("\n=== Remap Results ===");
            println!("Games scanned:    {}", summary.games.games_scanned);
            println!("Games changed:    {}", summary.games.games_changed);
            println!("Players changed:  {}", summary.players_changed);
            println!("Files written:    {}", summary.recompute.files_written);
            if !summary.games.backups.is_empty() {
                println!("\nBackups:");
                for backup in &summary.games.backups {
                    println!("  - {}", backup.display());
                }
            }
        }
        Commands::Inspect { file, date } => {
            let box_score = pipeline::inspect(&file, date)
                .with_context(|| format!("Inspect of {:?} failed", file))?;
            print_inspect(&config, &box_score);
        }
    }

    Ok(())
}

fn print_ingest(summary: &IngestSummary) {
    println!("\n=== Ingest Results ===");
    println!("Game:             {} ({})", summary.game_id, summary.outcome);
    println!("Opponent:         {} ({})", summary.opponent, summary.home_away);
    println!(
        "Score:            {}-{} {}",
        summary.score.us, summary.score.them, summary.result
    );
    println!(
        "Playoff:          {}",
        if summary.is_playoff { "yes" } else { "no" }
    );
    println!(
        "Players:          {} ({} new, {} updated)",
        summary.players_in_game,
        summary.players_created.len(),
        summary.players_updated.len()
    );
    println!("Files written:    {}", summary.files_written);

    if !summary.players_created.is_empty() {
        println!("\nNew players:");
        for id in &summary.players_created {
            println!("  - {}", id);
        }
    }
    if !summary.warnings.is_empty() {
        println!("\nWarnings:");
        for warning in &summary.warnings {
            println!("  - {}", warning);
        }
    }
}

fn print_inspect(config: &AppConfig, box_score: &RawBoxScore) {
    println!("=== {} ===", box_score.title);
    println!("Date:             {}", box_score.date);
    println!(
        "Away:             {} {}",
        box_score.away_team, box_score.away_score
    );
    println!(
        "Home:             {} {}",
        box_score.home_team, box_score.home_score
    );

    match resolve_teams(box_score, &config.team.variants, None) {
        Ok(resolved) => println!(
            "Our side:         {} (table {})",
            resolved.home_away,
            resolved.our_roster.position + 1
        ),
        Err(e) => println!("Our side:         unresolved ({})", e),
    }

    for roster in &box_score.rosters {
        println!(
            "\nTable {} ({}): {} rows",
            roster.position + 1,
            roster.label.as_deref().unwrap_or("unlabelled"),
            roster.rows.len()
        );
        for row in &roster.rows {
            let c = &row.cells;
            println!(
                "  #{:<3} {:<22} {:>3} pts  FG {}-{}  3PT {}-{}  FT {}-{}",
                row.number,
                row.name,
                c.pts,
                c.fg.made(),
                c.fg.attempted(),
                c.three_pt.made(),
                c.three_pt.attempted(),
                c.ft.made(),
                c.ft.attempted()
            );
        }
    }

    if !box_score.warnings.is_empty() {
        println!("\nWarnings:");
        for warning in &box_score.warnings {
            println!("  - {}", warning);
        }
    }
}
