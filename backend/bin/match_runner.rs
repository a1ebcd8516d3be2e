use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use duo::{
    db::{DatabaseConfig, PgStore, get_db_pool},
    lifecycle::run_daily_match,
    notifications::{Notifier, notifier_from_config},
    utils::{Config, init_logging, time::{next_occurrence, wait_until}},
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{error, info};

/// Daily matching run: pairs eligible participants and waitlists the rest.
#[derive(Debug, Parser)]
#[command(name = "match_runner")]
struct Args {
    /// Run a single matching pass now and exit
    #[arg(long)]
    once: bool,

    /// Seed for the friend-candidate shuffle (fresh randomness when omitted)
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    info!("🎯 Starting Duo Match Runner...");

    let config = Config::from_env()?;
    let db_config = DatabaseConfig::from_env()?;
    let pool = get_db_pool(&db_config).await?;
    let store = PgStore::new(pool);
    let notifier = notifier_from_config(&config)?;

    if args.once {
        return run_once(&store, notifier.as_ref(), &config, args.seed).await;
    }

    loop {
        let next = next_occurrence(config.timezone, config.match_run_time, Utc::now());
        info!("⏳ Next matching run at {} ({})", next.with_timezone(&config.timezone), next);
        wait_until(next).await;

        // A failed run commits nothing; the next tick tries again.
        if let Err(e) = run_once(&store, notifier.as_ref(), &config, args.seed).await {
            error!("❌ Matching run failed: {}", e);
        }
    }
}

async fn run_once(store: &PgStore, notifier: &dyn Notifier, config: &Config, seed: Option<u64>) -> Result<()> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let report = run_daily_match(
        store,
        notifier,
        &config.schedule(),
        &config.match_settings(),
        Utc::now(),
        &mut rng,
    )
    .await?;

    info!(
        "📊 {}: {} eligible, {} pairs ({} friend), {} waitlisted | notifications sent {}, suppressed {}, failed {}",
        report.match_date,
        report.eligible,
        report.pairs,
        report.friend_pairs,
        report.waitlisted,
        report.notifications.sent,
        report.notifications.suppressed,
        report.notifications.failed
    );

    Ok(())
}
