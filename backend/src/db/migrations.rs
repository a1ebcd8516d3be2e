use anyhow::Result;
use sqlx::PgPool;

/// Applies the schema embedded from `backend/migrations`.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    let migrator = sqlx::migrate!("./migrations");
    tracing::info!("🗄️ Applying {} embedded migrations", migrator.iter().count());
    migrator.run(pool).await?;
    Ok(())
}
