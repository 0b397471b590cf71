use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use noc_scrape::combine;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "noc-combine",
    about = "Concatenate per-NOC tables and drop duplicate rows"
)]
struct CombineCli {
    /// Directory holding `{NOC}.csv` tables
    #[arg(long, env = "NOC_SCRAPE_OUT_DIR", default_value = "data")]
    input: PathBuf,

    /// Combined output table
    #[arg(
        long,
        env = "NOC_COMBINE_OUTPUT",
        default_value = "full_deduplicated_dataset.csv"
    )]
    output: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = CombineCli::parse();
    let mut tables: Vec<PathBuf> = fs::read_dir(&cli.input)
        .with_context(|| format!("failed to list {:?}", cli.input))?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "csv"))
        .filter(|path| path != &cli.output)
        .collect();
    tables.sort();
    if tables.is_empty() {
        anyhow::bail!("no tables found in {:?}", cli.input);
    }

    let combined = combine(&tables).context("failed to combine tables")?;
    let output = fs::File::create(&cli.output)
        .with_context(|| format!("failed to create {:?}", cli.output))?;
    combined
        .write(std::io::BufWriter::new(output))
        .with_context(|| format!("failed to write {:?}", cli.output))?;

    println!("--- combine metrics ---");
    println!("tables: {}", tables.len());
    println!("rows written: {}", combined.rows.len());
    println!("duplicates dropped: {}", combined.duplicates);
    Ok(())
}
