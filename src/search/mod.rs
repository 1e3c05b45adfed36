//! Dual-algorithm connectivity search: BFS vs. DFS, raced on the clock.
//!
//! Both variants treat parent and child edges as undirected neighbors and
//! carry the accumulated path alongside each frontier entry, so a hit on the
//! target returns the path immediately with no parent-pointer reconstruction.

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::time::{Duration, Instant};

use rand::Rng;

use crate::store::EntityStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    BreadthFirst,
    DepthFirst,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::BreadthFirst => write!(f, "Breadth-First"),
            Algorithm::DepthFirst => write!(f, "Depth-First"),
        }
    }
}

/// Result of one search variant: whether a path exists, the path itself
/// (empty when not found), and the wall-clock time taken.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub found: bool,
    pub path: Vec<String>,
    pub elapsed: Duration,
}

/// Outcome of racing both variants over the same query.
#[derive(Debug, Clone)]
pub struct RaceReport {
    pub found: bool,
    pub winner: Algorithm,
    pub breadth: SearchOutcome,
    pub depth: SearchOutcome,
}

impl RaceReport {
    /// The path reported to the user: the winning algorithm's.
    pub fn winning_path(&self) -> &[String] {
        match self.winner {
            Algorithm::BreadthFirst => &self.breadth.path,
            Algorithm::DepthFirst => &self.depth.path,
        }
    }
}

/// Search for a path between two entities.
///
/// The breadth-first variant pops the frontier FIFO and finds a shortest
/// edge-count path; the depth-first variant pops LIFO and finds *a* path.
/// An exhausted frontier means the entities live in disconnected components;
/// that is a normal `found = false` outcome, not an error.
///
/// # Panics
///
/// `id1 == id2` or an id absent from the store is a programming error and
/// panics immediately.
pub fn connect(store: &EntityStore, id1: &str, id2: &str, algorithm: Algorithm) -> SearchOutcome {
    assert_ne!(id1, id2, "connectivity query endpoints must differ");
    assert!(store.contains(id1), "query endpoint {} not in store", id1);
    assert!(store.contains(id2), "query endpoint {} not in store", id2);

    let start = Instant::now();

    let mut frontier: VecDeque<(String, Vec<String>)> = VecDeque::new();
    let mut visited: HashSet<String> = HashSet::new();
    frontier.push_back((id1.to_string(), vec![id1.to_string()]));
    visited.insert(id1.to_string());

    while let Some((id, path)) = match algorithm {
        Algorithm::BreadthFirst => frontier.pop_front(),
        Algorithm::DepthFirst => frontier.pop_back(),
    } {
        let entity = store.get(&id).expect("frontier ids originate from the store");
        for neighbor in entity.neighbors() {
            if neighbor == id2 {
                let mut path = path;
                path.push(neighbor.clone());
                return SearchOutcome {
                    found: true,
                    path,
                    elapsed: start.elapsed(),
                };
            }
            if visited.insert(neighbor.clone()) {
                let mut next_path = path.clone();
                next_path.push(neighbor.clone());
                frontier.push_back((neighbor.clone(), next_path));
            }
        }
    }

    SearchOutcome {
        found: false,
        path: Vec::new(),
        elapsed: start.elapsed(),
    }
}

/// Run both variants over the same query, each independently timed, and pick
/// the faster one. Equal times are a tie broken by the injected randomness
/// source, so outcomes are reproducible under a fixed seed.
pub fn race<R: Rng>(store: &EntityStore, id1: &str, id2: &str, rng: &mut R) -> RaceReport {
    let breadth = connect(store, id1, id2, Algorithm::BreadthFirst);
    let depth = connect(store, id1, id2, Algorithm::DepthFirst);

    // Correct traversals cannot disagree on reachability
    debug_assert_eq!(
        breadth.found, depth.found,
        "BFS and DFS disagree on connectivity"
    );

    let winner = pick_winner(&breadth, &depth, rng);
    let found = breadth.found;
    RaceReport {
        found,
        winner,
        breadth,
        depth,
    }
}

fn pick_winner<R: Rng>(breadth: &SearchOutcome, depth: &SearchOutcome, rng: &mut R) -> Algorithm {
    if breadth.elapsed == depth.elapsed {
        if rng.gen_bool(0.5) {
            Algorithm::BreadthFirst
        } else {
            Algorithm::DepthFirst
        }
    } else if breadth.elapsed < depth.elapsed {
        Algorithm::BreadthFirst
    } else {
        Algorithm::DepthFirst
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn linear_chain() -> EntityStore {
        let mut store = EntityStore::new();
        for id in ["QA", "QB", "QC", "QD"] {
            store.add_entity(id, &format!("Person {}", id), -1);
        }
        store.add_edge("QA", "QB").unwrap();
        store.add_edge("QB", "QC").unwrap();
        store.add_edge("QC", "QD").unwrap();
        store
    }

    fn disconnected_pairs() -> EntityStore {
        let mut store = EntityStore::new();
        for id in ["QA", "QB", "QC", "QD"] {
            store.add_entity(id, &format!("Person {}", id), -1);
        }
        store.add_edge("QA", "QB").unwrap();
        store.add_edge("QC", "QD").unwrap();
        store
    }

    /// Two routes from QA to QZ: direct via QM (2 edges) and a long detour.
    fn braided() -> EntityStore {
        let mut store = EntityStore::new();
        for id in ["QA", "QM", "QZ", "QX1", "QX2", "QX3"] {
            store.add_entity(id, &format!("Person {}", id), -1);
        }
        store.add_edge("QA", "QM").unwrap();
        store.add_edge("QM", "QZ").unwrap();
        store.add_edge("QA", "QX1").unwrap();
        store.add_edge("QX1", "QX2").unwrap();
        store.add_edge("QX2", "QX3").unwrap();
        store.add_edge("QX3", "QZ").unwrap();
        store
    }

    #[test]
    fn test_linear_chain_both_variants() {
        let store = linear_chain();
        for algorithm in [Algorithm::BreadthFirst, Algorithm::DepthFirst] {
            let outcome = connect(&store, "QA", "QD", algorithm);
            assert!(outcome.found, "{} failed to find the chain", algorithm);
            assert_eq!(outcome.path.len() - 1, 3, "{} path edge count", algorithm);
            assert_eq!(outcome.path.first().map(String::as_str), Some("QA"));
            assert_eq!(outcome.path.last().map(String::as_str), Some("QD"));
        }
    }

    #[test]
    fn test_disconnected_pair_both_variants() {
        let store = disconnected_pairs();
        for algorithm in [Algorithm::BreadthFirst, Algorithm::DepthFirst] {
            let outcome = connect(&store, "QA", "QC", algorithm);
            assert!(!outcome.found);
            assert!(outcome.path.is_empty());
        }
    }

    #[test]
    fn test_variants_agree_on_found() {
        for store in [linear_chain(), disconnected_pairs(), braided()] {
            let ids: Vec<_> = store.ids().cloned().collect();
            for id1 in &ids {
                for id2 in &ids {
                    if id1 == id2 {
                        continue;
                    }
                    let b = connect(&store, id1, id2, Algorithm::BreadthFirst);
                    let d = connect(&store, id1, id2, Algorithm::DepthFirst);
                    assert_eq!(b.found, d.found, "disagreement on {} -> {}", id1, id2);
                }
            }
        }
    }

    #[test]
    fn test_breadth_path_never_longer() {
        let store = braided();
        let b = connect(&store, "QA", "QZ", Algorithm::BreadthFirst);
        let d = connect(&store, "QA", "QZ", Algorithm::DepthFirst);
        assert!(b.found && d.found);
        assert_eq!(b.path.len() - 1, 2, "BFS must find the short route");
        assert!(b.path.len() <= d.path.len());
    }

    #[test]
    fn test_race_reports_agreeing_outcome() {
        let store = braided();
        let mut rng = StdRng::seed_from_u64(7);
        let report = race(&store, "QA", "QZ", &mut rng);
        assert!(report.found);
        assert_eq!(report.winning_path().first().map(String::as_str), Some("QA"));
        assert_eq!(report.winning_path().last().map(String::as_str), Some("QZ"));

        let report = race(&store, "QX1", "QM", &mut rng);
        assert!(report.found);
    }

    #[test]
    fn test_tie_break_is_seeded() {
        let outcome = |elapsed| SearchOutcome {
            found: true,
            path: vec!["QA".to_string(), "QB".to_string()],
            elapsed,
        };
        let tied_a = outcome(Duration::from_micros(10));
        let tied_b = outcome(Duration::from_micros(10));

        // Same seed, same sequence of tie-break choices
        let picks = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..16)
                .map(|_| pick_winner(&tied_a, &tied_b, &mut rng))
                .collect::<Vec<_>>()
        };
        assert_eq!(picks(42), picks(42));

        // Unequal times ignore the RNG entirely
        let slower = outcome(Duration::from_micros(99));
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            pick_winner(&tied_a, &slower, &mut rng),
            Algorithm::BreadthFirst
        );
        assert_eq!(
            pick_winner(&slower, &tied_b, &mut rng),
            Algorithm::DepthFirst
        );
    }

    #[test]
    #[should_panic(expected = "endpoints must differ")]
    fn test_same_endpoint_is_programming_error() {
        let store = linear_chain();
        connect(&store, "QA", "QA", Algorithm::BreadthFirst);
    }

    #[test]
    #[should_panic(expected = "not in store")]
    fn test_unknown_endpoint_is_programming_error() {
        let store = linear_chain();
        connect(&store, "QA", "Q404", Algorithm::DepthFirst);
    }
}
