//! File-backed ZoneStore: one JSON file per world.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use zone_core::{Zone, ZoneId};

use crate::store::file::{partition_files, partition_path, write_atomic};
use crate::store::{Result, StoreError, ZoneStore};

const PREFIX: &str = "zones";
const EXT: &str = "json";

/// Stores each world's zones as `zones_{hex(world)}.json`.
pub struct FileZoneStore {
    base_dir: PathBuf,
    // Serializes read-modify-write cycles; concurrent saves to the same
    // partition must not interleave.
    write_lock: Mutex<()>,
}

impl FileZoneStore {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    fn world_path(&self, world: &str) -> PathBuf {
        partition_path(&self.base_dir, PREFIX, world, EXT)
    }

    fn read_world(&self, path: &Path) -> Result<Vec<Zone>> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let bytes = fs::read(path).map_err(StoreError::Io)?;
        serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn write_world(&self, world: &str, zones: &[Zone]) -> Result<()> {
        let path = self.world_path(world);
        if zones.is_empty() {
            if path.exists() {
                fs::remove_file(&path).map_err(StoreError::Io)?;
            }
            return Ok(());
        }
        let bytes = serde_json::to_vec_pretty(zones)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        write_atomic(&path, &bytes)?;
        tracing::debug!("wrote {} zone(s) for world '{}'", zones.len(), world);
        Ok(())
    }
}

impl ZoneStore for FileZoneStore {
    fn initialize(&self) -> Result<()> {
        fs::create_dir_all(&self.base_dir).map_err(StoreError::Io)?;
        Ok(())
    }

    fn load_all(&self) -> Result<HashMap<String, Vec<Zone>>> {
        let mut all = HashMap::new();
        for (world, path) in partition_files(&self.base_dir, PREFIX, EXT)? {
            all.insert(world, self.read_world(&path)?);
        }
        Ok(all)
    }

    fn find_by_world(&self, world: &str) -> Result<Vec<Zone>> {
        let zones = self.read_world(&self.world_path(world))?;
        tracing::debug!("loaded {} zone(s) for world '{}'", zones.len(), world);
        Ok(zones)
    }

    fn save(&self, zone: &Zone) -> Result<()> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::LockPoisoned)?;
        let mut zones = self.read_world(&self.world_path(&zone.world))?;
        zones.retain(|z| z.id != zone.id);
        zones.push(zone.clone());
        self.write_world(&zone.world, &zones)
    }

    fn delete(&self, zone_id: &ZoneId) -> Result<()> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::LockPoisoned)?;
        // The id alone does not name a world, so scan partition files.
        for (world, path) in partition_files(&self.base_dir, PREFIX, EXT)? {
            let mut zones = self.read_world(&path)?;
            let before = zones.len();
            zones.retain(|z| &z.id != zone_id);
            if zones.len() != before {
                self.write_world(&world, &zones)?;
                break;
            }
        }
        Ok(())
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}
