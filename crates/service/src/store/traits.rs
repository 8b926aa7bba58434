//! Store contracts for the three persisted entity kinds.
//!
//! Every method is synchronous and may block on I/O. Implementations provide
//! upsert semantics keyed by each record's stable id and are expected to
//! enforce `(world, name)` uniqueness for zones and `(zone_id, player_id)`
//! uniqueness for authorizations.

use std::collections::HashMap;

use zone_core::{BlockId, BlockPos, ReinforcedBlock, Zone, ZoneAuthorization, ZoneId};

use crate::store::Result;

/// Durable storage for zones, partitioned by world name.
pub trait ZoneStore: Send + Sync {
    /// Prepare the backing storage (create tables, directories, ...).
    fn initialize(&self) -> Result<()>;

    /// Load every zone, grouped by world.
    fn load_all(&self) -> Result<HashMap<String, Vec<Zone>>>;

    /// All zones in one world.
    fn find_by_world(&self, world: &str) -> Result<Vec<Zone>>;

    /// Create or update a zone (upsert by id).
    fn save(&self, zone: &Zone) -> Result<()>;

    /// Delete a zone by id. Deleting an absent id is not an error.
    fn delete(&self, zone_id: &ZoneId) -> Result<()>;

    /// Release storage resources.
    fn close(&self) -> Result<()>;
}

/// Durable storage for authorizations, partitioned by zone id.
pub trait AuthorizationStore: Send + Sync {
    fn initialize(&self) -> Result<()>;

    /// Load every authorization, grouped by zone.
    fn load_all(&self) -> Result<HashMap<ZoneId, Vec<ZoneAuthorization>>>;

    /// All authorizations granted for one zone.
    fn find_by_zone(&self, zone_id: &ZoneId) -> Result<Vec<ZoneAuthorization>>;

    /// Create or update an authorization (upsert by id).
    fn save(&self, auth: &ZoneAuthorization) -> Result<()>;

    /// Remove one player's grant in a zone.
    fn delete_player(&self, zone_id: &ZoneId, player_id: &str) -> Result<()>;

    /// Remove every grant for a zone.
    fn delete_zone(&self, zone_id: &ZoneId) -> Result<()>;

    fn close(&self) -> Result<()>;
}

/// Durable storage for reinforced blocks, partitioned by world name.
pub trait ReinforcedBlockStore: Send + Sync {
    fn initialize(&self) -> Result<()>;

    /// Load every reinforced block, grouped by world and keyed by id.
    fn load_all(&self) -> Result<HashMap<String, HashMap<BlockId, ReinforcedBlock>>>;

    /// All reinforced blocks in one world, keyed by id.
    fn find_by_world(&self, world: &str) -> Result<HashMap<BlockId, ReinforcedBlock>>;

    /// Create or update a block record (upsert by id).
    fn save(&self, block: &ReinforcedBlock) -> Result<()>;

    /// Delete a block record by id.
    fn delete(&self, block_id: &BlockId) -> Result<()>;

    /// Delete the block record at a position, if any.
    fn delete_at(&self, world: &str, position: BlockPos) -> Result<()>;

    /// Delete every record whose position lies within `[min, max]`, inclusive
    /// on every axis. Does not report which rows were removed.
    fn delete_in_area(&self, world: &str, min: BlockPos, max: BlockPos) -> Result<()>;

    fn close(&self) -> Result<()>;
}

/// Inclusive containment used by area queries and bulk deletes.
pub(crate) fn in_area(pos: BlockPos, min: BlockPos, max: BlockPos) -> bool {
    pos.x >= min.x
        && pos.x <= max.x
        && pos.y >= min.y
        && pos.y <= max.y
        && pos.z >= min.z
        && pos.z <= max.z
}
