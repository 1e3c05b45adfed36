//! Durable snapshots of the entity store.
//!
//! A checkpoint is a JSON snapshot named by creation time and entity count,
//! e.g. `2021-04-12_18-03-55_graph_4211entities.json`. Saves go through a
//! temp-file-then-rename publish so a crash mid-write leaves at most the
//! previous checkpoint intact.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::error::{BloodlineError, Result};
use crate::store::EntityStore;

pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write a snapshot of the store and return its published location.
    pub fn save(&self, store: &EntityStore) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;

        let name = format!(
            "{}_graph_{}entities.json",
            Local::now().format("%Y-%m-%d_%H-%M-%S"),
            store.len()
        );
        let final_path = self.dir.join(name);
        let temp_path = final_path.with_extension("json.tmp");

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, store)
            .map_err(|e| BloodlineError::Parse(format!("Failed to serialize snapshot: {}", e)))?;
        writer.flush()?;

        // Fsync before rename: the rename is the commit point
        writer.get_ref().sync_all()?;
        fs::rename(&temp_path, &final_path)?;

        Ok(final_path)
    }

    /// Materialize a store from a snapshot.
    ///
    /// A missing file and an unreadable one fail with distinct errors; a
    /// caller never silently proceeds on an absent graph.
    pub fn load(path: &Path) -> Result<EntityStore> {
        if !path.exists() {
            return Err(BloodlineError::CheckpointMissing(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            BloodlineError::CheckpointCorrupt(format!("{}: {}", path.display(), e))
        })
    }

    /// Newest snapshot in this store's directory, by the lexicographically
    /// sortable timestamp prefix. Fails if there are no snapshots.
    pub fn latest(&self) -> Result<PathBuf> {
        let entries = fs::read_dir(&self.dir)
            .map_err(|_| BloodlineError::CheckpointMissing(self.dir.clone()))?;

        let mut newest: Option<PathBuf> = None;
        for entry in entries {
            let path = entry?.path();
            if path.extension().map(|e| e == "json").unwrap_or(false)
                && newest
                    .as_ref()
                    .map(|n| path.file_name() > n.file_name())
                    .unwrap_or(true)
            {
                newest = Some(path);
            }
        }
        newest.ok_or_else(|| BloodlineError::CheckpointMissing(self.dir.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_store() -> EntityStore {
        let mut store = EntityStore::new();
        store.add_entity("Q1", "Victoria", 1819);
        store.add_entity("Q2", "Edward VII", 1841);
        store.add_entity("Q3", "Unknown Cousin", -1);
        store.add_edge("Q1", "Q2").unwrap();
        store
    }

    fn assert_stores_equal(a: &EntityStore, b: &EntityStore) {
        assert_eq!(a.len(), b.len());
        for entity in a.entities() {
            assert_eq!(Some(entity), b.get(&entity.id));
        }
    }

    #[test]
    fn test_save_load_round_trip() {
        let temp = TempDir::new().unwrap();
        let checkpoints = CheckpointStore::new(temp.path());
        let store = sample_store();

        let path = checkpoints.save(&store).unwrap();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.contains("_graph_3entities"), "unexpected name: {}", name);

        let loaded = CheckpointStore::load(&path).unwrap();
        assert_stores_equal(&store, &loaded);
        assert!(loaded.verify_invariants().is_ok());
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let temp = TempDir::new().unwrap();
        let checkpoints = CheckpointStore::new(temp.path());
        checkpoints.save(&sample_store()).unwrap();

        let leftovers: Vec<_> = fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| p.extension().map(|e| e == "tmp").unwrap_or(false))
            .collect();
        assert!(leftovers.is_empty(), "temp files left: {:?}", leftovers);
    }

    #[test]
    fn test_load_missing_is_distinct_error() {
        let temp = TempDir::new().unwrap();
        let err = CheckpointStore::load(&temp.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, BloodlineError::CheckpointMissing(_)));
    }

    #[test]
    fn test_load_corrupt_is_distinct_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        let err = CheckpointStore::load(&path).unwrap_err();
        assert!(matches!(err, BloodlineError::CheckpointCorrupt(_)));
    }

    #[test]
    fn test_latest_picks_newest_snapshot() {
        let temp = TempDir::new().unwrap();
        let checkpoints = CheckpointStore::new(temp.path());

        let mut store = EntityStore::new();
        store.add_entity("Q1", "A", -1);
        checkpoints.save(&store).unwrap();
        store.add_entity("Q2", "B", -1);
        let second = checkpoints.save(&store).unwrap();

        assert_eq!(checkpoints.latest().unwrap(), second);
    }

    #[test]
    fn test_latest_empty_dir_fails() {
        let temp = TempDir::new().unwrap();
        let checkpoints = CheckpointStore::new(temp.path());
        assert!(matches!(
            checkpoints.latest().unwrap_err(),
            BloodlineError::CheckpointMissing(_)
        ));
    }
}
