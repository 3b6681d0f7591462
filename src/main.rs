use anyhow::Context;
use tracing_subscriber::EnvFilter;

mod abstracts;
mod apis;
mod browser;
mod config;
mod output;
mod pipeline;

use apis::arxiv::ArxivClient;
use browser::BrowserSession;
use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let config = Config::from_env();
    tracing::info!(
        "Collecting up to {} papers from {} into {}",
        config.max_results,
        config.category,
        config.output_file.display()
    );

    let client =
        ArxivClient::new(config.feed_url.clone()).context("Failed to build HTTP client")?;
    let summary = pipeline::run(
        &config,
        &client,
        BrowserSession::launch(config.chrome_executable.as_deref()),
    )
    .await?;
    println!(
        "Saved {} papers to {}",
        summary.saved,
        summary.output_file.display()
    );
    Ok(())
}
