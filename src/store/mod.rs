//! In-memory genealogy graph: an arena of entities keyed by Wikidata id.
//!
//! Relationships are stored as id sets and resolved through the store on
//! demand, which keeps the structure serializable and free of ownership
//! cycles even when the source data records two people as each other's
//! ancestor.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{BloodlineError, Result};

/// One historical figure in the graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Entity {
    /// Stable external identifier, e.g. `Q9682`. Format is owned by the
    /// knowledge source; the store treats it as opaque.
    pub id: String,
    /// Display name. Not unique - many figures share a name.
    pub name: String,
    /// Birth year, or `-1` when unknown/unparsable.
    pub birth_year: i32,
    /// Ids of this entity's parents within the same store.
    pub parents: BTreeSet<String>,
    /// Ids of this entity's children within the same store.
    pub children: BTreeSet<String>,
}

impl Entity {
    fn new(id: &str, name: &str, birth_year: i32) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            birth_year,
            parents: BTreeSet::new(),
            children: BTreeSet::new(),
        }
    }

    /// Parents and children as one undirected neighbor view.
    pub fn neighbors(&self) -> impl Iterator<Item = &String> {
        self.parents.union(&self.children)
    }
}

/// Arena of entities for one graph instance. Created empty, populated by the
/// crawl engine (or by subgraph extraction), never shrinks.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct EntityStore {
    entities: HashMap<String, Entity>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity. A second add with the same id is a no-op: the existing
    /// record and its relationship sets are left untouched.
    pub fn add_entity(&mut self, id: &str, name: &str, birth_year: i32) {
        self.entities
            .entry(id.to_string())
            .or_insert_with(|| Entity::new(id, name, birth_year));
    }

    /// Add the matched parent/child edge pair between two entities already in
    /// the store. Re-adding an existing edge is a no-op.
    ///
    /// Fails on a self-edge or an endpoint absent from the store - both would
    /// corrupt the symmetry invariant and indicate a bug in the caller.
    pub fn add_edge(&mut self, parent_id: &str, child_id: &str) -> Result<()> {
        if parent_id == child_id {
            return Err(BloodlineError::SelfEdge(parent_id.to_string()));
        }
        if !self.entities.contains_key(parent_id) {
            return Err(BloodlineError::EntityMissing(parent_id.to_string()));
        }
        if !self.entities.contains_key(child_id) {
            return Err(BloodlineError::EntityMissing(child_id.to_string()));
        }

        // Both endpoints verified above, so the pair is always written as a unit.
        self.entities
            .get_mut(parent_id)
            .expect("endpoint checked")
            .children
            .insert(child_id.to_string());
        self.entities
            .get_mut(child_id)
            .expect("endpoint checked")
            .parents
            .insert(parent_id.to_string());
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entities.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Number of parent/child edge pairs in the graph.
    pub fn edge_count(&self) -> usize {
        self.entities.values().map(|e| e.children.len()).sum()
    }

    pub fn ids(&self) -> impl Iterator<Item = &String> {
        self.entities.keys()
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// All ids whose entity has the given display name. Names are not unique,
    /// so this can return several matches (or none).
    pub fn ids_for_name(&self, name: &str) -> Vec<String> {
        let mut ids: Vec<String> = self
            .entities
            .values()
            .filter(|e| e.name == name)
            .map(|e| e.id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Re-check the structural invariants over the whole store. Used by the
    /// `verify` mode after loading a checkpoint and by tests.
    pub fn verify_invariants(&self) -> Result<()> {
        for entity in self.entities.values() {
            if entity.parents.contains(&entity.id) || entity.children.contains(&entity.id) {
                return Err(BloodlineError::SelfEdge(entity.id.clone()));
            }
            for parent_id in &entity.parents {
                let parent = self
                    .entities
                    .get(parent_id)
                    .ok_or_else(|| BloodlineError::EntityMissing(parent_id.clone()))?;
                if !parent.children.contains(&entity.id) {
                    return Err(BloodlineError::EntityMissing(format!(
                        "{} is a parent of {} but not vice versa",
                        parent_id, entity.id
                    )));
                }
            }
            for child_id in &entity.children {
                let child = self
                    .entities
                    .get(child_id)
                    .ok_or_else(|| BloodlineError::EntityMissing(child_id.clone()))?;
                if !child.parents.contains(&entity.id) {
                    return Err(BloodlineError::EntityMissing(format!(
                        "{} is a child of {} but not vice versa",
                        child_id, entity.id
                    )));
                }
            }
        }
        Ok(())
    }
}
