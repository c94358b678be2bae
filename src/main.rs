use std::sync::Arc;

use cinelog::{AppState, app, config::Config, db, rate_limit};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,cinelog=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Config::from_env()?;
    let db = db::connect_and_migrate(&config.database_url).await?;

    let addr = config.addr;
    let state = Arc::new(AppState::new(config, db));

    rate_limit::spawn_retention(state.clone());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "listening");
    axum::serve(listener, app(state)).await?;

    Ok(())
}
