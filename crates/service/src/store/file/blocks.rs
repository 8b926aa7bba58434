//! File-backed ReinforcedBlockStore: one bincode file per world.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use zone_core::{BlockId, BlockPos, ReinforcedBlock};

use crate::store::file::{partition_files, partition_path, write_atomic};
use crate::store::traits::in_area;
use crate::store::{ReinforcedBlockStore, Result, StoreError};

const PREFIX: &str = "blocks";
const EXT: &str = "bin";

/// Stores each world's reinforced blocks as `blocks_{hex(world)}.bin`.
pub struct FileReinforcedBlockStore {
    base_dir: PathBuf,
    // Serializes read-modify-write cycles; concurrent saves to the same
    // partition must not interleave.
    write_lock: Mutex<()>,
}

impl FileReinforcedBlockStore {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    fn world_path(&self, world: &str) -> PathBuf {
        partition_path(&self.base_dir, PREFIX, world, EXT)
    }

    fn read_world(&self, path: &Path) -> Result<HashMap<BlockId, ReinforcedBlock>> {
        if !path.exists() {
            return Ok(HashMap::new());
        }
        let bytes = fs::read(path).map_err(StoreError::Io)?;
        bincode::deserialize(&bytes).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn write_world(&self, world: &str, blocks: &HashMap<BlockId, ReinforcedBlock>) -> Result<()> {
        let path = self.world_path(world);
        if blocks.is_empty() {
            if path.exists() {
                fs::remove_file(&path).map_err(StoreError::Io)?;
            }
            return Ok(());
        }
        let bytes =
            bincode::serialize(blocks).map_err(|e| StoreError::Serialization(e.to_string()))?;
        write_atomic(&path, &bytes)?;
        tracing::debug!("wrote {} block record(s) for world '{}'", blocks.len(), world);
        Ok(())
    }
}

impl ReinforcedBlockStore for FileReinforcedBlockStore {
    fn initialize(&self) -> Result<()> {
        fs::create_dir_all(&self.base_dir).map_err(StoreError::Io)?;
        Ok(())
    }

    fn load_all(&self) -> Result<HashMap<String, HashMap<BlockId, ReinforcedBlock>>> {
        let mut all = HashMap::new();
        for (world, path) in partition_files(&self.base_dir, PREFIX, EXT)? {
            all.insert(world, self.read_world(&path)?);
        }
        Ok(all)
    }

    fn find_by_world(&self, world: &str) -> Result<HashMap<BlockId, ReinforcedBlock>> {
        let blocks = self.read_world(&self.world_path(world))?;
        tracing::debug!("loaded {} block record(s) for world '{}'", blocks.len(), world);
        Ok(blocks)
    }

    fn save(&self, block: &ReinforcedBlock) -> Result<()> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::LockPoisoned)?;
        let mut blocks = self.read_world(&self.world_path(&block.world))?;
        blocks.insert(block.id.clone(), block.clone());
        self.write_world(&block.world, &blocks)
    }

    fn delete(&self, block_id: &BlockId) -> Result<()> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::LockPoisoned)?;
        for (world, path) in partition_files(&self.base_dir, PREFIX, EXT)? {
            let mut blocks = self.read_world(&path)?;
            if blocks.remove(block_id).is_some() {
                self.write_world(&world, &blocks)?;
                break;
            }
        }
        Ok(())
    }

    fn delete_at(&self, world: &str, position: BlockPos) -> Result<()> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::LockPoisoned)?;
        let id = BlockId::for_position(world, position);
        let mut blocks = self.read_world(&self.world_path(world))?;
        if blocks.remove(&id).is_some() {
            self.write_world(world, &blocks)?;
        }
        Ok(())
    }

    fn delete_in_area(&self, world: &str, min: BlockPos, max: BlockPos) -> Result<()> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::LockPoisoned)?;
        let mut blocks = self.read_world(&self.world_path(world))?;
        let before = blocks.len();
        blocks.retain(|_, b| !in_area(b.position, min, max));
        if blocks.len() != before {
            self.write_world(world, &blocks)?;
        }
        Ok(())
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}
