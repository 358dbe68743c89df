use anyhow::Result;
use tracing::{error, info};

use watch_pipeline::{WatchConfig, WatchPipeline};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config_path =
        std::env::var("WATCH_CONFIG").unwrap_or_else(|_| "config/watchlist.json".to_string());
    let config = WatchConfig::load(&config_path)?;
    info!(
        tickers = config.tickers.len(),
        config = %config_path,
        "starting spreadwatch pipeline"
    );

    let pipeline = WatchPipeline::from_config(config)?;
    let summary = pipeline.run().await;

    if summary.success.is_empty() && !summary.failed.is_empty() {
        error!(failed = ?summary.failed, "every ticker failed");
        std::process::exit(1);
    }

    Ok(())
}
