use compass_api::{
    api::{create_router, AppState},
    config::Config,
    services::providers,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "compass_api=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;

    let ai_provider = providers::build_provider(&config)?;
    let state = AppState::new(ai_provider);
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
