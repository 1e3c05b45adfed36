use anyhow::Result;
use bloodline::checkpoint::CheckpointStore;
use bloodline::search::{race, Algorithm};
use bloodline::store::EntityStore;
use bloodline::Config;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Parser, Debug)]
#[command(name = "connect")]
#[command(about = "Race breadth-first against depth-first search between two figures")]
struct Args {
    /// Display name of the first figure
    name1: String,

    /// Display name of the second figure
    name2: String,

    /// Seed for the tie-break (overrides query.tie_seed from config)
    #[arg(short, long)]
    seed: Option<u64>,
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

    // A name that is not in the graph is a normal outcome, not a fault
    let id1 = match first_id_for_name(&store, &args.name1) {
        Some(id) => id,
        None => {
            println!("{:?} is not in the graph.", args.name1);
            return Ok(());
        }
    };
    let id2 = match first_id_for_name(&store, &args.name2) {
        Some(id) => id,
        None => {
            println!("{:?} is not in the graph.", args.name2);
            return Ok(());
        }
    };

    if id1 == id2 {
        println!(
            "{:?} and {:?} resolve to the same entity ({}).",
            args.name1, args.name2, id1
        );
        return Ok(());
    }

    let mut rng = match args.seed.or(config.query.tie_seed) {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let report = race(&store, &id1, &id2, &mut rng);

    println!("\n=== Royal Connections: Breadth-First vs. Depth-First ===\n");
    println!("{} ({})  <->  {} ({})\n", args.name1, id1, args.name2, id2);
    println!(
        "{:<16} {:>14} {:>12}",
        "Algorithm", "Time", "Path edges"
    );
    for (algorithm, outcome) in [
        (Algorithm::BreadthFirst, &report.breadth),
        (Algorithm::DepthFirst, &report.depth),
    ] {
        let edges = if outcome.found {
            format!("{}", outcome.path.len() - 1)
        } else {
            "-".to_string()
        };
        println!(
            "{:<16} {:>14} {:>12}",
            algorithm.to_string(),
            format!("{:?}", outcome.elapsed),
            edges
        );
    }

    let tied = report.breadth.elapsed == report.depth.elapsed;
    if tied {
        println!("\nA tie! Randomly showing the {} result.", report.winner);
    } else {
        println!("\n{} wins the race.", report.winner);
    }

    if report.found {
        println!("\nPath found by {}:", report.winner);
        for id in report.winning_path() {
            let entity = store.get(id).expect("path ids come from the store");
            println!("  {} ({})", entity.name, entity.id);
        }
    } else {
        println!("\nNo path found - the two figures are in disconnected components.");
    }

    Ok(())
}

/// First id in the store carrying this display name. Names are not unique;
/// additional matches are logged so the operator can tell an ambiguous query.
fn first_id_for_name(store: &EntityStore, name: &str) -> Option<String> {
    let ids = store.ids_for_name(name);
    if ids.len() > 1 {
        log::info!(
            "{:?} matches {} entities ({}), using the first",
            name,
            ids.len(),
            ids.join(", ")
        );
    }
    ids.into_iter().next()
}
