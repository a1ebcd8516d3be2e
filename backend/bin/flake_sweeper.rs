use anyhow::Result;
use chrono::{Duration, NaiveDate, Utc};
use clap::Parser;
use duo::{
    db::{DatabaseConfig, PgStore, get_db_pool},
    lifecycle::run_flake_sweep,
    utils::{Config, init_logging, time::{next_occurrence, wait_until}},
};
use tracing::{error, info};

/// Marks the previous day's unfinished pairings as flaked and bumps streaks.
#[derive(Debug, Parser)]
#[command(name = "flake_sweeper")]
struct Args {
    /// Run a single sweep now and exit
    #[arg(long)]
    once: bool,

    /// Matching day to sweep (YYYY-MM-DD); defaults to yesterday in the matching zone
    #[arg(long)]
    date: Option<NaiveDate>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    info!("🧹 Starting Duo Flake Sweeper...");

    let config = Config::from_env()?;
    let db_config = DatabaseConfig::from_env()?;
    let pool = get_db_pool(&db_config).await?;
    let store = PgStore::new(pool);

    if args.once {
        return run_once(&store, &config, args.date).await;
    }

    loop {
        let next = next_occurrence(config.timezone, config.flake_sweep_time, Utc::now());
        info!("⏳ Next sweep at {} ({})", next.with_timezone(&config.timezone), next);
        wait_until(next).await;

        if let Err(e) = run_once(&store, &config, None).await {
            error!("❌ Flake sweep failed: {}", e);
        }
    }
}

async fn run_once(store: &PgStore, config: &Config, date: Option<NaiveDate>) -> Result<()> {
    let now = Utc::now();
    let schedule = config.schedule();
    let date = date.unwrap_or_else(|| schedule.local_date(now) - Duration::days(1));

    let report = run_flake_sweep(store, &schedule, date, now).await?;

    info!(
        "📊 Sweep {}: {} flaked of {} scanned, {} participants updated",
        report.date, report.flaked, report.scanned, report.participants_updated
    );

    Ok(())
}
