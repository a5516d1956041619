use std::time::Duration;

use dotenvy::dotenv;
use snafu::ResultExt;

mod config;
mod error;
mod ledger;
mod logger;
mod model;
mod monitor;
mod slack;
mod tiktok;

use config::Config;
use error::{ApplicationError, HttpClientSnafu, OpenLedgerSnafu};
use ledger::Ledger;
use monitor::Monitor;
use slack::Slack;
use tiktok::TikTok;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<(), ApplicationError> {
    dotenv().ok();

    let config = config::load()?;
    let _guard = logger::init(&config)?;

    banner(&config);

    let ledger = Ledger::open(&config.database).context(OpenLedgerSnafu)?;

    let client = reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .context(HttpClientSnafu)?;

    let tiktok = TikTok::new(client.clone(), config.scraper_url.clone());
    let slack = Slack::new(client, config.slack_webhook.clone());

    let monitor = Monitor::new(
        tiktok,
        slack,
        &ledger,
        config.threshold,
        config.account_delay(),
    );

    let report = monitor.run(&config.accounts()).await;

    tracing::info!(
        videos_checked = report.videos_checked,
        alerts_sent = report.alerts_sent,
        "monitoring complete"
    );

    Ok(())
}

fn banner(config: &Config) {
    tracing::info!(
        accounts = config.accounts().len(),
        threshold = config.threshold,
        scraper = %config.scraper_url,
        "monitor starting"
    );
}
