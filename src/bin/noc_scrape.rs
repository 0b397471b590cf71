use anyhow::{Context, Result};
use clap::Parser;
use noc_scrape::{run_scrape, Cli, Gazetteer, HttpFetcher};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let controls = cli.build_controls();
    if controls.nocs().is_empty() {
        anyhow::bail!("no NOC codes given");
    }

    let mut gazetteer = Gazetteer::builtin();
    if let Some(path) = controls.gazetteer() {
        gazetteer
            .extend_from_file(path)
            .with_context(|| format!("failed to load gazetteer {:?}", path))?;
    }

    let fetcher = HttpFetcher::new(controls.timeout()).context("failed to build HTTP client")?;
    run_scrape(&fetcher, &controls, gazetteer).context("scrape failed")?;
    Ok(())
}
