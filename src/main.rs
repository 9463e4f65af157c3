//! Plate appearance outcome model CLI
//!
//! Trains the outcome classifier from Statcast data and answers probability
//! queries against the saved artifacts.

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use pa_outcome_model::{
    client::{FetchCache, StatcastClient},
    config::{expand_path, Config},
    ingester::{CsvFileSource, PitchSource},
    model::ProbabilityServer,
    pipeline::{run_training, PlatoonModelOutcome},
    storage::ArtifactStore,
    types::{OutcomeProbs, PlatoonMatchup},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "pa-model")]
#[command(about = "Plate appearance outcome model: train on Statcast data, query probabilities")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch data, write rate tables and train models
    Train {
        /// First game date (YYYY-MM-DD), overrides config
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Last game date (YYYY-MM-DD), overrides config
        #[arg(long)]
        end: Option<NaiveDate>,
        /// Train from a local Statcast CSV export instead of fetching
        #[arg(long)]
        csv: Option<String>,
    },
    /// Outcome probabilities for a count
    Probs {
        #[arg(short, long, default_value = "0")]
        balls: u32,
        #[arg(short, long, default_value = "0")]
        strikes: u32,
        /// Batter and pitcher throw/bat with the same hand
        #[arg(long)]
        same_hand: bool,
        /// Use empirical rates even when a model is available
        #[arg(long)]
        empirical: bool,
        /// Prefer per-matchup model and rate files
        #[arg(long)]
        platoon_split: bool,
    },
    /// Show saved league rates
    Rates {
        /// Platoon matchup (same or opposite)
        #[arg(short, long)]
        matchup: Option<PlatoonMatchup>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Train { start, end, csv } => train(config, start, end, csv).await,
        Commands::Probs {
            balls,
            strikes,
            same_hand,
            empirical,
            platoon_split,
        } => show_probs(config, balls, strikes, same_hand, !empirical, platoon_split),
        Commands::Rates { matchup } => show_rates(config, matchup),
    }
}

async fn train(
    config: Config,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    csv: Option<String>,
) -> anyhow::Result<()> {
    let start = start.unwrap_or(config.statcast.start_date);
    let end = end.unwrap_or(config.statcast.end_date);

    let source: Box<dyn PitchSource> = match csv {
        Some(path) => {
            tracing::info!("Training from local file {}", path);
            Box::new(CsvFileSource::new(expand_path(&path)))
        }
        None => {
            tracing::info!("Fetching Statcast data {} to {}", start, end);
            let mut client =
                StatcastClient::new(&config.statcast.base_url, config.statcast.timeout_secs)?
                    .with_chunk_days(config.statcast.chunk_days)
                    .with_skip_offseason(config.statcast.skip_offseason);
            if let Some(dir) = config.cache.resolved_dir() {
                client = client.with_cache(FetchCache::new(dir));
            }
            Box::new(client)
        }
    };

    let report = run_training(&config, source.as_ref(), start, end)
        .await
        .context("training failed")?;

    if !report.has_data() {
        println!("No data returned for {} to {}. Nothing written.", start, end);
        return Ok(());
    }

    println!("Plate appearances: {}", report.plate_appearances);
    for (matchup, count) in &report.platoon_counts {
        println!("  {:<9} {}", matchup, count);
    }
    if let Some(path) = &report.rates_path {
        println!("Rates:   {}", path.display());
    }
    if let (Some(path), Some(accuracy)) = (&report.model_path, report.accuracy) {
        println!("Model:   {} (holdout accuracy {:.4})", path.display(), accuracy);
    }
    for (matchup, outcome) in &report.platoon_models {
        match outcome {
            PlatoonModelOutcome::Trained { path, accuracy } => {
                println!("  {:<9} {} (accuracy {:.4})", matchup, path.display(), accuracy)
            }
            PlatoonModelOutcome::Skipped { reason } => {
                println!("  {:<9} skipped ({})", matchup, reason)
            }
        }
    }
    if let Some(probs) = &report.example_probs {
        println!("\nExample probs (0-0, opposite hand):");
        print_probs(probs);
    }
    Ok(())
}

fn show_probs(
    config: Config,
    balls: u32,
    strikes: u32,
    same_hand: bool,
    use_model: bool,
    platoon_split: bool,
) -> anyhow::Result<()> {
    let server = ProbabilityServer::from_config(&config).with_platoon_split(platoon_split);
    let probs = server.get_outcome_probs(balls, strikes, same_hand, use_model)?;

    println!(
        "Count {}-{}, {} hand:",
        balls,
        strikes,
        PlatoonMatchup::from_same_hand(same_hand)
    );
    print_probs(&probs);
    Ok(())
}

fn show_rates(config: Config, matchup: Option<PlatoonMatchup>) -> anyhow::Result<()> {
    let store = ArtifactStore::new(config.artifacts.resolved_dir());
    let rates = match matchup {
        Some(m) => store.load_platoon_rates(m)?,
        None => store.load_rates()?,
    };

    match matchup {
        Some(m) => println!("League rates ({}):", m),
        None => println!("League rates:"),
    }
    print_probs(&rates);
    Ok(())
}

fn print_probs(probs: &OutcomeProbs) {
    for (outcome, p) in probs.iter() {
        println!("  {:<10} {:>7.4}", outcome.name(), p);
    }
    let on_base: f64 = probs
        .iter()
        .filter(|(o, _)| o.is_on_base())
        .map(|(_, p)| p)
        .sum();
    println!("  {:<10} {:>7.4}", "on base", on_base);
    if let Some(best) = probs.most_likely() {
        println!("  most likely: {}", best);
    }
}
