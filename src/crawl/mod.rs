//! Frontier-driven graph construction.
//!
//! Expansion is breadth-first by construction: resolved roots are seeded at
//! depth 0 and relatives are enqueued one ring at a time until the configured
//! depth bound. Progress is checkpointed periodically so a long crawl against
//! a rate-limited source can be resumed from its newest snapshot.

use std::collections::{HashSet, VecDeque};

use crate::checkpoint::CheckpointStore;
use crate::error::{BloodlineError, Result};
use crate::store::EntityStore;
use crate::wikidata::KnowledgeSource;

/// Sentinel birth year for "unknown/unparsable".
pub const UNKNOWN_BIRTH_YEAR: i32 = -1;

/// An entity added to the graph whose relatives have not yet been fetched.
/// Consumed exactly once; only the resulting entities persist.
#[derive(Debug, Clone)]
struct FrontierEntry {
    /// Edges from the associated root at which this entity was discovered.
    depth: u32,
    id: String,
    name: String,
}

/// Parse a birth year from the source's date candidates.
///
/// Takes the first candidate and reads its leading 4 characters as a year if
/// they are all ASCII digits. Wikidata dates are noisy (missing, BCE,
/// precision markers), so anything else is unknown.
pub fn parse_birth_year(candidates: Option<&[String]>) -> i32 {
    let first = match candidates.and_then(|c| c.first()) {
        Some(first) => first,
        None => return UNKNOWN_BIRTH_YEAR,
    };
    let bytes = first.as_bytes();
    if bytes.len() >= 4 && bytes[..4].iter().all(u8::is_ascii_digit) {
        first[..4].parse().unwrap_or(UNKNOWN_BIRTH_YEAR)
    } else {
        UNKNOWN_BIRTH_YEAR
    }
}

/// Graph construction engine over a [`KnowledgeSource`].
pub struct Crawler<S> {
    source: S,
    checkpoints: CheckpointStore,
    /// Write a checkpoint once the store has grown by more than this many
    /// entities since the last one.
    checkpoint_every: usize,
}

impl<S: KnowledgeSource> Crawler<S> {
    pub fn new(source: S, checkpoints: CheckpointStore, checkpoint_every: usize) -> Self {
        Self {
            source,
            checkpoints,
            checkpoint_every,
        }
    }

    /// Build a graph outward from the given root names, bounded by
    /// `max_depth` edges from each root.
    ///
    /// Roots that do not resolve to an id are skipped with a warning - an
    /// unresolvable root contributes nothing. A final checkpoint is always
    /// written when the frontier empties, even for an empty store.
    pub async fn expand(&self, roots: &[String], max_depth: u32) -> Result<EntityStore> {
        let mut store = EntityStore::new();
        let mut frontier: VecDeque<FrontierEntry> = VecDeque::new();
        let mut enqueued: HashSet<String> = HashSet::new();

        for name in roots {
            let name = name.trim();
            match self.source.resolve_id(name).await? {
                Some(id) => {
                    log::info!("Root {:?} resolved to {}", name, id);
                    self.add_discovered(&mut store, &id, name).await?;
                    if enqueued.insert(id.clone()) {
                        frontier.push_back(FrontierEntry {
                            depth: 0,
                            id,
                            name: name.to_string(),
                        });
                    }
                }
                None => log::warn!("No match for root {:?}, skipping", name),
            }
        }

        let mut checkpoint_base = 0usize;
        while let Some(entry) = frontier.pop_front() {
            if store.len() - checkpoint_base > self.checkpoint_every {
                let path = self.checkpoints.save(&store)?;
                log::info!("Checkpoint at {} entities: {}", store.len(), path.display());
                checkpoint_base = store.len();
            }

            // Working depth: the distance of this entry's relatives from the root
            let depth = entry.depth + 1;
            if depth > max_depth {
                continue;
            }

            log::debug!("Expanding {} ({}) at depth {}", entry.name, entry.id, depth);
            self.expand_entity(&mut store, &entry.id, depth, &mut frontier, &mut enqueued)
                .await?;
        }

        let path = self.checkpoints.save(&store)?;
        log::info!(
            "Crawl complete: {} entities, {} edges, final checkpoint {}",
            store.len(),
            store.edge_count(),
            path.display()
        );
        Ok(store)
    }

    /// Fetch one entity's parent and child sets and fold them into the graph.
    ///
    /// Every relative is added if absent, linked with a matched edge pair, and
    /// enqueued for its own future expansion. A "no data" answer leaves the
    /// entity with an empty expansion - the crawl continues.
    async fn expand_entity(
        &self,
        store: &mut EntityStore,
        id: &str,
        depth: u32,
        frontier: &mut VecDeque<FrontierEntry>,
        enqueued: &mut HashSet<String>,
    ) -> Result<()> {
        if let Some(parents) = self.source.fetch_parents(id).await? {
            for (parent_id, parent_name) in parents {
                // Noisy source rows can list an entity as its own relative
                if parent_id == id {
                    log::debug!("Skipping self-referential parent row for {}", id);
                    continue;
                }
                self.add_discovered(store, &parent_id, &parent_name).await?;
                store.add_edge(&parent_id, id)?;
                if enqueued.insert(parent_id.clone()) {
                    frontier.push_back(FrontierEntry {
                        depth,
                        id: parent_id,
                        name: parent_name,
                    });
                }
            }
        }

        if let Some(children) = self.source.fetch_children(id).await? {
            for (child_id, child_name) in children {
                if child_id == id {
                    log::debug!("Skipping self-referential child row for {}", id);
                    continue;
                }
                self.add_discovered(store, &child_id, &child_name).await?;
                store.add_edge(id, &child_id)?;
                if enqueued.insert(child_id.clone()) {
                    frontier.push_back(FrontierEntry {
                        depth,
                        id: child_id,
                        name: child_name,
                    });
                }
            }
        }

        Ok(())
    }

    /// Add a newly discovered entity, looking up its birth year on first
    /// sight. Re-discovery through another path is a no-op.
    async fn add_discovered(&self, store: &mut EntityStore, id: &str, name: &str) -> Result<()> {
        if store.contains(id) {
            return Ok(());
        }
        let candidates = self.source.fetch_birth_years(id).await?;
        let birth_year = parse_birth_year(candidates.as_deref());
        store.add_entity(id, name, birth_year);
        Ok(())
    }
}

/// Carve a bounded family subgraph around `root_id` out of an
/// already-populated store.
///
/// Identical traversal to [`Crawler::expand`], but relatives and birth years
/// are copied from `source` instead of fetched - no network cost. Fails fast
/// if `root_id` is not in the source store.
pub fn expand_from(source: &EntityStore, root_id: &str, max_depth: u32) -> Result<EntityStore> {
    let root = source
        .get(root_id)
        .ok_or_else(|| BloodlineError::EntityMissing(root_id.to_string()))?;

    let mut out = EntityStore::new();
    out.add_entity(root_id, &root.name, root.birth_year);

    let mut frontier: VecDeque<FrontierEntry> = VecDeque::new();
    let mut enqueued: HashSet<String> = HashSet::new();
    frontier.push_back(FrontierEntry {
        depth: 0,
        id: root_id.to_string(),
        name: root.name.clone(),
    });
    enqueued.insert(root_id.to_string());

    while let Some(entry) = frontier.pop_front() {
        let depth = entry.depth + 1;
        if depth > max_depth {
            continue;
        }

        let current = source
            .get(&entry.id)
            .ok_or_else(|| BloodlineError::EntityMissing(entry.id.clone()))?;

        for parent_id in &current.parents {
            let parent = source
                .get(parent_id)
                .ok_or_else(|| BloodlineError::EntityMissing(parent_id.clone()))?;
            out.add_entity(parent_id, &parent.name, parent.birth_year);
            out.add_edge(parent_id, &entry.id)?;
            if enqueued.insert(parent_id.clone()) {
                frontier.push_back(FrontierEntry {
                    depth,
                    id: parent_id.clone(),
                    name: parent.name.clone(),
                });
            }
        }

        for child_id in &current.children {
            let child = source
                .get(child_id)
                .ok_or_else(|| BloodlineError::EntityMissing(child_id.clone()))?;
            out.add_entity(child_id, &child.name, child.birth_year);
            out.add_edge(&entry.id, child_id)?;
            if enqueued.insert(child_id.clone()) {
                frontier.push_back(FrontierEntry {
                    depth,
                    id: child_id.clone(),
                    name: child.name.clone(),
                });
            }
        }
    }

    Ok(out)
}
