use duo::db::DatabaseConfig;
use duo::{get_db_pool, utils};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    utils::init_logging();

    let db_config = DatabaseConfig::from_env()?;
    let pool = get_db_pool(&db_config).await?;

    info!("Running participant/pairing schema migrations...");
    duo::db::migrations::run_migrations(&pool).await?;
    info!("Migrations completed successfully!");

    Ok(())
}
