use yapee_store::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    services::seed_service,
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,yapee_store=debug".into()),
        )
        .init();

    let config = AppConfig::from_env()?;
    let admin_email = config.admin_email.clone();
    let state = AppState::from_config(config).await?;
    if let Some(pool) = &state.pool {
        run_migrations(&create_orm_conn(pool), "./migrations").await?;
    }

    let report = seed_service::seed_if_empty(&state).await?;
    println!(
        "Seed completed on {} backend: {} categories, {} products, {} coupons",
        state.db.backend_name(),
        report.categories,
        report.products,
        report.coupons
    );
    if report.admin_created {
        println!("Admin account created: {admin_email}");
    }
    Ok(())
}
