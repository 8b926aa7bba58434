//! In-memory store implementations for tests and local runs.
//!
//! Each store counts partition loads and can be switched to reject writes,
//! so tests can observe cache behavior: that a partition is fetched exactly
//! once, and that a failed write leaves the cache untouched.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use zone_core::{BlockId, BlockPos, ReinforcedBlock, Zone, ZoneAuthorization, ZoneId};

use crate::store::traits::in_area;
use crate::store::{
    AuthorizationStore, ReinforcedBlockStore, Result, StoreError, ZoneStore,
};

fn write_guard(fail_writes: &AtomicBool) -> Result<()> {
    if fail_writes.load(Ordering::SeqCst) {
        Err(StoreError::Backend("write rejected".to_string()))
    } else {
        Ok(())
    }
}

/// In-memory implementation of [`ZoneStore`].
#[derive(Default)]
pub struct MemoryZoneStore {
    zones: RwLock<HashMap<String, Vec<Zone>>>,
    loads: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MemoryZoneStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `find_by_world` round-trips performed so far.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Make every subsequent write fail with [`StoreError::Backend`].
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl ZoneStore for MemoryZoneStore {
    fn initialize(&self) -> Result<()> {
        Ok(())
    }

    fn load_all(&self) -> Result<HashMap<String, Vec<Zone>>> {
        let zones = self.zones.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(zones.clone())
    }

    fn find_by_world(&self, world: &str) -> Result<Vec<Zone>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let zones = self.zones.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(zones.get(world).cloned().unwrap_or_default())
    }

    fn save(&self, zone: &Zone) -> Result<()> {
        write_guard(&self.fail_writes)?;
        let mut zones = self.zones.write().map_err(|_| StoreError::LockPoisoned)?;
        // Upsert by id; the zone may have been saved under another world before.
        for list in zones.values_mut() {
            list.retain(|z| z.id != zone.id);
        }
        zones.entry(zone.world.clone()).or_default().push(zone.clone());
        Ok(())
    }

    fn delete(&self, zone_id: &ZoneId) -> Result<()> {
        write_guard(&self.fail_writes)?;
        let mut zones = self.zones.write().map_err(|_| StoreError::LockPoisoned)?;
        for list in zones.values_mut() {
            list.retain(|z| &z.id != zone_id);
        }
        Ok(())
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// In-memory implementation of [`AuthorizationStore`].
#[derive(Default)]
pub struct MemoryAuthorizationStore {
    auths: RwLock<HashMap<ZoneId, Vec<ZoneAuthorization>>>,
    loads: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MemoryAuthorizationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `find_by_zone` round-trips performed so far.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl AuthorizationStore for MemoryAuthorizationStore {
    fn initialize(&self) -> Result<()> {
        Ok(())
    }

    fn load_all(&self) -> Result<HashMap<ZoneId, Vec<ZoneAuthorization>>> {
        let auths = self.auths.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(auths.clone())
    }

    fn find_by_zone(&self, zone_id: &ZoneId) -> Result<Vec<ZoneAuthorization>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let auths = self.auths.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(auths.get(zone_id).cloned().unwrap_or_default())
    }

    fn save(&self, auth: &ZoneAuthorization) -> Result<()> {
        write_guard(&self.fail_writes)?;
        let mut auths = self.auths.write().map_err(|_| StoreError::LockPoisoned)?;
        let list = auths.entry(auth.zone_id.clone()).or_default();
        list.retain(|a| a.id != auth.id);
        list.push(auth.clone());
        Ok(())
    }

    fn delete_player(&self, zone_id: &ZoneId, player_id: &str) -> Result<()> {
        write_guard(&self.fail_writes)?;
        let mut auths = self.auths.write().map_err(|_| StoreError::LockPoisoned)?;
        if let Some(list) = auths.get_mut(zone_id) {
            list.retain(|a| a.player_id != player_id);
        }
        Ok(())
    }

    fn delete_zone(&self, zone_id: &ZoneId) -> Result<()> {
        write_guard(&self.fail_writes)?;
        let mut auths = self.auths.write().map_err(|_| StoreError::LockPoisoned)?;
        auths.remove(zone_id);
        Ok(())
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// In-memory implementation of [`ReinforcedBlockStore`].
#[derive(Default)]
pub struct MemoryReinforcedBlockStore {
    blocks: RwLock<HashMap<String, HashMap<BlockId, ReinforcedBlock>>>,
    loads: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MemoryReinforcedBlockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `find_by_world` round-trips performed so far.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl ReinforcedBlockStore for MemoryReinforcedBlockStore {
    fn initialize(&self) -> Result<()> {
        Ok(())
    }

    fn load_all(&self) -> Result<HashMap<String, HashMap<BlockId, ReinforcedBlock>>> {
        let blocks = self.blocks.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(blocks.clone())
    }

    fn find_by_world(&self, world: &str) -> Result<HashMap<BlockId, ReinforcedBlock>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let blocks = self.blocks.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(blocks.get(world).cloned().unwrap_or_default())
    }

    fn save(&self, block: &ReinforcedBlock) -> Result<()> {
        write_guard(&self.fail_writes)?;
        let mut blocks = self.blocks.write().map_err(|_| StoreError::LockPoisoned)?;
        blocks
            .entry(block.world.clone())
            .or_default()
            .insert(block.id.clone(), block.clone());
        Ok(())
    }

    fn delete(&self, block_id: &BlockId) -> Result<()> {
        write_guard(&self.fail_writes)?;
        let mut blocks = self.blocks.write().map_err(|_| StoreError::LockPoisoned)?;
        for map in blocks.values_mut() {
            if map.remove(block_id).is_some() {
                break;
            }
        }
        Ok(())
    }

    fn delete_at(&self, world: &str, position: BlockPos) -> Result<()> {
        write_guard(&self.fail_writes)?;
        let id = BlockId::for_position(world, position);
        let mut blocks = self.blocks.write().map_err(|_| StoreError::LockPoisoned)?;
        if let Some(map) = blocks.get_mut(world) {
            map.remove(&id);
        }
        Ok(())
    }

    fn delete_in_area(&self, world: &str, min: BlockPos, max: BlockPos) -> Result<()> {
        write_guard(&self.fail_writes)?;
        let mut blocks = self.blocks.write().map_err(|_| StoreError::LockPoisoned)?;
        if let Some(map) = blocks.get_mut(world) {
            map.retain(|_, b| !in_area(b.position, min, max));
        }
        Ok(())
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}
