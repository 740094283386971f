use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};

use otm_tracker_core::{AppConfig, ConfigLoader};
use otm_tracker_engine::service::resolve_startup_state;
use otm_tracker_engine::TrackerService;
use otm_tracker_market_data::SinaMarketData;

#[derive(Parser)]
#[command(name = "otm-tracker")]
#[command(about = "Monthly out-of-the-money options pair tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the tracking loop
    Run {
        /// Config file path
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
        /// Override the tracking start date (YYYYMMDD)
        #[arg(long)]
        start_date: Option<String>,
    },
    /// Reconcile on-disk state once and print the resolved position
    Recover {
        /// Config file path
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
        /// Override the tracking start date (YYYYMMDD)
        #[arg(long)]
        start_date: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Commands::Run { config, start_date } => run_tracker(&config, start_date.as_deref()).await,
        Commands::Recover { config, start_date } => {
            run_recover(&config, start_date.as_deref()).await
        }
    }
}

fn load_config(path: &str, start_date: Option<&str>) -> Result<AppConfig> {
    let mut config = ConfigLoader::load(path).context("loading configuration")?;
    if let Some(raw) = start_date {
        config.storage.start_date = NaiveDate::parse_from_str(raw, "%Y%m%d")
            .with_context(|| format!("invalid start date {raw:?}, expected YYYYMMDD"))?;
    }
    Ok(config)
}

async fn run_tracker(config_path: &str, start_date: Option<&str>) -> Result<()> {
    let config = load_config(config_path, start_date)?;
    let market = SinaMarketData::new(&config.market_data, &config.tracker.underlying)
        .context("building market-data client")?;

    let today = Local::now().date_naive();
    let mut service = TrackerService::start(config, market, today).await?;
    service.run().await
}

async fn run_recover(config_path: &str, start_date: Option<&str>) -> Result<()> {
    let config = load_config(config_path, start_date)?;
    let market = SinaMarketData::new(&config.market_data, &config.tracker.underlying)
        .context("building market-data client")?;

    let today = Local::now().date_naive();
    let (outcome, _) = resolve_startup_state(&config, &market, today).await?;

    println!("source: {:?}", outcome.source);
    for issue in &outcome.inconsistencies {
        println!("inconsistency: {issue}");
    }
    println!(
        "{}",
        serde_json::to_string_pretty(&outcome.state.to_persisted())?
    );
    Ok(())
}
