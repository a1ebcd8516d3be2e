use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use duo::{
    db::{DatabaseConfig, PgStore, get_db_pool},
    lifecycle::run_reminders,
    notifications::{Notifier, notifier_from_config},
    utils::{Config, init_logging, time::{next_occurrence, wait_until}},
};
use tracing::{error, info};

/// Reminds participants who have not submitted for today's pairing yet.
#[derive(Debug, Parser)]
#[command(name = "reminder_sender")]
struct Args {
    /// Send one round of reminders now and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    info!("⏰ Starting Duo Reminder Sender...");

    let config = Config::from_env()?;
    let db_config = DatabaseConfig::from_env()?;
    let pool = get_db_pool(&db_config).await?;
    let store = PgStore::new(pool);
    let notifier = notifier_from_config(&config)?;

    if args.once {
        return run_once(&store, notifier.as_ref(), &config).await;
    }

    loop {
        let next = next_occurrence(config.timezone, config.reminder_time, Utc::now());
        info!("⏳ Next reminder round at {} ({})", next.with_timezone(&config.timezone), next);
        wait_until(next).await;

        if let Err(e) = run_once(&store, notifier.as_ref(), &config).await {
            error!("❌ Reminder round failed: {}", e);
        }
    }
}

async fn run_once(store: &PgStore, notifier: &dyn Notifier, config: &Config) -> Result<()> {
    let report = run_reminders(store, notifier, &config.schedule(), Utc::now()).await?;
    info!("📊 {} reminders due for {}", report.reminders, report.date);
    Ok(())
}
