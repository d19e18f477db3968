use backend::{
    app::{Pollers, build_context},
    config::AppConfig,
};
use common::init_logger;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = AppConfig::from_env()?;
    init_logger("quote-poller", cfg.production);

    tracing::info!("Starting quote poller...");

    tracing::info!(
        symbols_url = %cfg.symbols_url(),
        quote_url = %cfg.quote_url(),
        follow_redirects = cfg.follow_redirects,
        "configuration loaded"
    );

    let ctx = build_context(&cfg)?;
    let pollers = Pollers::spawn(ctx);

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    pollers.shutdown().await;

    Ok(())
}
