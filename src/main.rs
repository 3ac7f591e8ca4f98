use anyhow::Context;
use dotenv::dotenv;
use sheet_trader::config::Config;
use sheet_trader::factory::build_cycle;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // Setup logger, filter from RUST_LOG
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;
    info!("Buy bot starting against {}", config.alpaca_base_url);

    let cycle = build_cycle(&config)
        .await
        .context("Failed to build the buy cycle")?;
    let summary = cycle.run().await.context("Buy cycle aborted")?;

    info!(
        "Buy cycle complete: {} candidates, {} accepted, {} rejected, {} skipped, {} errors, {} rows logged",
        summary.candidates,
        summary.accepted,
        summary.rejected,
        summary.skipped,
        summary.errors,
        summary.logged
    );
    Ok(())
}
