use anyhow::Result;
use bloodline::checkpoint::CheckpointStore;
use bloodline::crawl::expand_from;
use bloodline::Config;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "family")]
#[command(about = "Carve a bounded family subgraph around one figure and save it")]
struct Args {
    /// Display name of the figure at the center of the family
    name: String,

    /// Number of edges away from the figure to include
    #[arg(short, long, default_value_t = 2)]
    depth: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", "info")
    ).init();

    let args = Args::parse();

    let config = Config::load()?;
    let store = CheckpointStore::load(config.graph_file())?;
    log::info!(
        "Graph loaded: {} entities, {} edges",
        store.len(),
        store.edge_count()
    );

    let ids = store.ids_for_name(&args.name);
    let root_id = match ids.first() {
        Some(id) => id.clone(),
        None => {
            println!("{:?} is not in the graph.", args.name);
            return Ok(());
        }
    };
    if ids.len() > 1 {
        log::info!(
            "{:?} matches {} entities ({}), using the first",
            args.name,
            ids.len(),
            ids.join(", ")
        );
    }

    // No network: relatives and birth years are copied from the loaded graph
    let family = expand_from(&store, &root_id, args.depth)?;

    let checkpoints = CheckpointStore::new(config.checkpoint_dir());
    let path = checkpoints.save(&family)?;

    println!(
        "Family of {} ({}) within {} edges: {} entities, {} edges",
        args.name,
        root_id,
        args.depth,
        family.len(),
        family.edge_count()
    );
    println!("Saved to {}", path.display());

    Ok(())
}
