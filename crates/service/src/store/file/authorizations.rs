//! File-backed AuthorizationStore: one bincode file per zone.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use zone_core::{ZoneAuthorization, ZoneId};

use crate::store::file::{partition_files, partition_path, write_atomic};
use crate::store::{AuthorizationStore, Result, StoreError};

const PREFIX: &str = "auths";
const EXT: &str = "bin";

/// Stores each zone's grants as `auths_{hex(zone_id)}.bin`.
pub struct FileAuthorizationStore {
    base_dir: PathBuf,
    // Serializes read-modify-write cycles; concurrent saves to the same
    // partition must not interleave.
    write_lock: Mutex<()>,
}

impl FileAuthorizationStore {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    fn zone_path(&self, zone_id: &ZoneId) -> PathBuf {
        partition_path(&self.base_dir, PREFIX, zone_id.as_str(), EXT)
    }

    fn read_zone(&self, path: &Path) -> Result<Vec<ZoneAuthorization>> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let bytes = fs::read(path).map_err(StoreError::Io)?;
        bincode::deserialize(&bytes).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn write_zone(&self, zone_id: &ZoneId, auths: &[ZoneAuthorization]) -> Result<()> {
        let path = self.zone_path(zone_id);
        if auths.is_empty() {
            if path.exists() {
                fs::remove_file(&path).map_err(StoreError::Io)?;
            }
            return Ok(());
        }
        let bytes =
            bincode::serialize(auths).map_err(|e| StoreError::Serialization(e.to_string()))?;
        write_atomic(&path, &bytes)?;
        Ok(())
    }
}

impl AuthorizationStore for FileAuthorizationStore {
    fn initialize(&self) -> Result<()> {
        fs::create_dir_all(&self.base_dir).map_err(StoreError::Io)?;
        Ok(())
    }

    fn load_all(&self) -> Result<HashMap<ZoneId, Vec<ZoneAuthorization>>> {
        let mut all = HashMap::new();
        for (zone_id, path) in partition_files(&self.base_dir, PREFIX, EXT)? {
            all.insert(ZoneId(zone_id), self.read_zone(&path)?);
        }
        Ok(all)
    }

    fn find_by_zone(&self, zone_id: &ZoneId) -> Result<Vec<ZoneAuthorization>> {
        let auths = self.read_zone(&self.zone_path(zone_id))?;
        tracing::debug!("loaded {} grant(s) for zone '{}'", auths.len(), zone_id);
        Ok(auths)
    }

    fn save(&self, auth: &ZoneAuthorization) -> Result<()> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::LockPoisoned)?;
        let mut auths = self.read_zone(&self.zone_path(&auth.zone_id))?;
        auths.retain(|a| a.id != auth.id);
        auths.push(auth.clone());
        self.write_zone(&auth.zone_id, &auths)
    }

    fn delete_player(&self, zone_id: &ZoneId, player_id: &str) -> Result<()> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::LockPoisoned)?;
        let mut auths = self.read_zone(&self.zone_path(zone_id))?;
        let before = auths.len();
        auths.retain(|a| a.player_id != player_id);
        if auths.len() != before {
            self.write_zone(zone_id, &auths)?;
        }
        Ok(())
    }

    fn delete_zone(&self, zone_id: &ZoneId) -> Result<()> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::LockPoisoned)?;
        let path = self.zone_path(zone_id);
        if path.exists() {
            fs::remove_file(&path).map_err(StoreError::Io)?;
        }
        Ok(())
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}
