use anyhow::Context;
use yapee_store::db::{create_orm_conn, create_pool, run_migrations};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
    let pool = create_pool(&url).await?;
    let applied = run_migrations(&create_orm_conn(&pool), "./migrations").await?;
    println!("Migrations applied: {applied}");
    Ok(())
}
