//! Cached repository for reinforced blocks, partitioned by world name.

use std::collections::HashMap;
use std::sync::Arc;

use zone_core::{BlockId, BlockPos, ReinforcedBlock};

use crate::cached::PartitionCache;
use crate::store::{ReinforcedBlockStore, Result, in_area};

/// Lazy caching wrapper around a [`ReinforcedBlockStore`].
///
/// Position lookups go through the world partition and the deterministic
/// position-derived id, so they never scan.
pub struct CachedReinforcedBlockRepository {
    store: Arc<dyn ReinforcedBlockStore>,
    cache: PartitionCache<String, BlockId, ReinforcedBlock>,
}

impl CachedReinforcedBlockRepository {
    pub fn new(store: Arc<dyn ReinforcedBlockStore>) -> Self {
        Self {
            store,
            cache: PartitionCache::new(),
        }
    }

    pub fn initialize(&self) -> Result<()> {
        self.store.initialize()
    }

    /// Full load from the store, replacing the entire cache.
    pub fn load_all(&self) -> Result<HashMap<String, HashMap<BlockId, ReinforcedBlock>>> {
        let all = self.store.load_all()?;
        self.cache.replace_all(all.clone())?;
        Ok(all)
    }

    /// All reinforced blocks in a world, via the cache.
    pub fn find_by_world(&self, world: &str) -> Result<HashMap<BlockId, ReinforcedBlock>> {
        self.cache.get_or_load(&world.to_string(), || {
            let blocks = self.store.find_by_world(world)?;
            tracing::debug!("cached {} block record(s) for world '{}'", blocks.len(), world);
            Ok(blocks)
        })
    }

    /// The record at one position, via the cache.
    pub fn find_by_position(&self, world: &str, position: BlockPos) -> Result<Option<ReinforcedBlock>> {
        let id = BlockId::for_position(world, position);
        Ok(self.find_by_world(world)?.remove(&id))
    }

    /// Every record whose position lies within `[min, max]` inclusive.
    pub fn find_in_area(
        &self,
        world: &str,
        min: BlockPos,
        max: BlockPos,
    ) -> Result<HashMap<BlockId, ReinforcedBlock>> {
        let mut blocks = self.find_by_world(world)?;
        blocks.retain(|_, b| in_area(b.position, min, max));
        Ok(blocks)
    }

    /// Store-first save, mirrored into the world's partition if resident.
    pub fn save(&self, block: &ReinforcedBlock) -> Result<()> {
        self.store.save(block)?;
        self.cache
            .upsert(&block.world, block.id.clone(), block.clone())
    }

    /// Store-first delete by id; the cache prune scans resident worlds.
    pub fn delete(&self, block_id: &BlockId) -> Result<()> {
        self.store.delete(block_id)?;
        self.cache.remove_scanning(block_id)?;
        Ok(())
    }

    /// Store-first delete by position; the world is known, so the prune is
    /// a direct removal.
    pub fn delete_at(&self, world: &str, position: BlockPos) -> Result<()> {
        self.store.delete_at(world, position)?;
        let id = BlockId::for_position(world, position);
        self.cache.remove(&world.to_string(), &id)
    }

    /// Bulk delete within `[min, max]` inclusive.
    ///
    /// The store's bulk delete does not report which rows it removed, so the
    /// victim set is computed first, then deleted from the store, then
    /// pruned from the cache, in that order.
    pub fn delete_in_area(&self, world: &str, min: BlockPos, max: BlockPos) -> Result<()> {
        let victims: Vec<BlockId> = self.find_in_area(world, min, max)?.into_keys().collect();
        self.store.delete_in_area(world, min, max)?;
        self.cache.remove_many(&world.to_string(), &victims)
    }

    pub fn close(&self) -> Result<()> {
        self.store.close()?;
        self.cache.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryReinforcedBlockStore;

    fn repo() -> (
        Arc<MemoryReinforcedBlockStore>,
        CachedReinforcedBlockRepository,
    ) {
        let store = Arc::new(MemoryReinforcedBlockStore::new());
        let repo = CachedReinforcedBlockRepository::new(
            Arc::clone(&store) as Arc<dyn ReinforcedBlockStore>
        );
        (store, repo)
    }

    #[test]
    fn position_lookup_loads_the_world_once() {
        let (store, repo) = repo();
        repo.save(&ReinforcedBlock::create("overworld", BlockPos::new(1, 2, 3), 10))
            .unwrap();

        assert!(repo
            .find_by_position("overworld", BlockPos::new(1, 2, 3))
            .unwrap()
            .is_some());
        assert!(repo
            .find_by_position("overworld", BlockPos::new(9, 9, 9))
            .unwrap()
            .is_none());
        assert_eq!(store.load_count(), 1);
    }

    #[test]
    fn save_replaces_by_id_without_duplicates() {
        let (_store, repo) = repo();
        let block = ReinforcedBlock::create("overworld", BlockPos::new(0, 0, 0), 10);
        repo.find_by_world("overworld").unwrap();

        repo.save(&block).unwrap();
        repo.save(&block.with_reinforcement(9)).unwrap();

        let blocks = repo.find_by_world("overworld").unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[&block.id].reinforcement, 9);
    }

    #[test]
    fn area_delete_prunes_exactly_the_victims() {
        let (store, repo) = repo();
        for x in 0..5 {
            repo.save(&ReinforcedBlock::create("overworld", BlockPos::new(x, 0, 0), 5))
                .unwrap();
        }
        repo.find_by_world("overworld").unwrap();

        repo.delete_in_area("overworld", BlockPos::new(1, 0, 0), BlockPos::new(3, 0, 0))
            .unwrap();

        let left = repo.find_by_world("overworld").unwrap();
        assert_eq!(left.len(), 2);
        assert!(left.contains_key(&BlockId::for_position("overworld", BlockPos::new(0, 0, 0))));
        assert!(left.contains_key(&BlockId::for_position("overworld", BlockPos::new(4, 0, 0))));
        // The surviving records came from the cache, not a reload.
        assert_eq!(store.load_count(), 1);
    }

    #[test]
    fn failed_save_leaves_cache_untouched() {
        let (store, repo) = repo();
        let block = ReinforcedBlock::create("overworld", BlockPos::new(0, 0, 0), 10);
        repo.save(&block).unwrap();
        repo.find_by_world("overworld").unwrap();

        store.fail_writes(true);
        assert!(repo.save(&block.with_reinforcement(1)).is_err());
        store.fail_writes(false);

        let cached = repo
            .find_by_position("overworld", BlockPos::new(0, 0, 0))
            .unwrap()
            .unwrap();
        assert_eq!(cached.reinforcement, 10);
    }
}
