use anyhow::Result;
use bloodline::checkpoint::CheckpointStore;
use bloodline::crawl::{Crawler, UNKNOWN_BIRTH_YEAR};
use bloodline::wikidata::WikidataClient;
use bloodline::Config;
use clap::Parser;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "crawl")]
#[command(about = "Build a genealogy graph from the configured root figures")]
struct Args {
    /// Override crawl.max_depth from config
    #[arg(short, long)]
    depth: Option<u32>,

    /// Additional root names (extends crawl.roots from config)
    #[arg(short, long)]
    root: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", "info")
    ).init();

    let args = Args::parse();

    log::info!("Starting Bloodline crawl");

    let config = Config::load()?;
    log::info!("Configuration loaded successfully");

    let mut roots = config.crawl.roots.clone();
    roots.extend(args.root);
    let max_depth = args.depth.unwrap_or(config.crawl.max_depth);

    log::info!("Roots: {}", roots.len());
    log::info!("Max depth: {}", max_depth);
    log::info!("Checkpoint directory: {}", config.checkpoint_dir().display());

    let client = WikidataClient::new(&config.wikidata);
    let checkpoints = CheckpointStore::new(config.checkpoint_dir());
    let crawler = Crawler::new(client, checkpoints, config.crawl.checkpoint_every);

    let start = Instant::now();
    let store = crawler.expand(&roots, max_depth).await?;
    let elapsed = start.elapsed();

    let with_birth_year = store
        .entities()
        .filter(|e| e.birth_year != UNKNOWN_BIRTH_YEAR)
        .count();

    log::info!("=== Crawl Complete ===");
    log::info!("Entities: {}", store.len());
    log::info!("Edges: {}", store.edge_count());
    log::info!("Birth years parsed: {}", with_birth_year);
    log::info!("Time: {:?}", elapsed);

    if store.is_empty() {
        log::warn!("No roots resolved. Check crawl.roots in config.toml.");
    }

    Ok(())
}
