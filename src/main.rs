use anyhow::Result;
use tracing::{error, info};

mod browser;
mod classify;
mod collector;
mod config;
mod deal_finder;
mod extract;
mod models;
mod pipeline;
mod price;
mod store;
mod traits;

use config::ScraperConfig;
use deal_finder::DealFinder;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    info!("Starting Apple brand-shop deal tracker");

    let config = ScraperConfig::from_env()?;
    let mut finder = DealFinder::new(config)?;

    match finder.check_for_deals().await {
        Ok(result) => {
            info!("Run complete: {} products", result.total_products);
            Ok(())
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            Err(e)
        }
    }
}
