//! Business layer composing the three cached repositories.

mod results;

pub use results::{
    AuthorizeResult, BreakOutcome, CreateZoneResult, KitOutcome, UpdateZoneResult,
};

use std::collections::HashMap;
use std::sync::Arc;

use zone_core::{
    BlockId, BlockPos, RaidConfig, ReinforcedBlock, Vec3, Zone, ZoneAuthorization, ZoneId,
};

use crate::cached::{
    CachedAuthorizationRepository, CachedReinforcedBlockRepository, CachedZoneRepository,
};
use crate::store::{
    AuthorizationStore, ReinforcedBlockStore, Result, ZoneStore,
};

/// Configuration snapshot provider, read at call time so a reloaded config
/// takes effect on the next operation. Injected, never a global.
pub type ConfigProvider = Arc<dyn Fn() -> RaidConfig + Send + Sync>;

/// Orchestration layer for zones, authorizations and reinforced blocks.
///
/// The service owns no state of its own: it is a stateless composition of
/// the three cached repositories plus the configuration provider, and it
/// enforces the cross-entity invariants (zone overlap, grant uniqueness,
/// the reinforcement state machine) before anything reaches storage.
pub struct ZoneService {
    zones: CachedZoneRepository,
    authorizations: CachedAuthorizationRepository,
    blocks: CachedReinforcedBlockRepository,
    config: ConfigProvider,
}

impl ZoneService {
    pub fn new(
        zone_store: Arc<dyn ZoneStore>,
        auth_store: Arc<dyn AuthorizationStore>,
        block_store: Arc<dyn ReinforcedBlockStore>,
        config: ConfigProvider,
    ) -> Self {
        Self {
            zones: CachedZoneRepository::new(zone_store),
            authorizations: CachedAuthorizationRepository::new(auth_store),
            blocks: CachedReinforcedBlockRepository::new(block_store),
            config,
        }
    }

    // ==================== Lifecycle ====================

    /// Initialize all three stores. Lazy: no data is loaded here.
    pub fn initialize(&self) -> Result<()> {
        self.zones.initialize()?;
        self.authorizations.initialize()?;
        self.blocks.initialize()?;
        Ok(())
    }

    /// Release store resources and drop the caches.
    pub fn shutdown(&self) -> Result<()> {
        self.zones.close()?;
        self.authorizations.close()?;
        self.blocks.close()?;
        Ok(())
    }

    // ==================== Zone queries ====================

    pub fn zone_by_name(&self, world: &str, name: &str) -> Result<Option<Zone>> {
        self.zones.find_by_name(world, name)
    }

    pub fn zone_exists(&self, world: &str, name: &str) -> Result<bool> {
        Ok(self.zone_by_name(world, name)?.is_some())
    }

    pub fn zones_in_world(&self, world: &str) -> Result<Vec<Zone>> {
        self.zones.find_by_world(world)
    }

    /// The zone containing a position, if any. Zones never overlap, so at
    /// most one matches.
    pub fn zone_at(&self, world: &str, position: Vec3) -> Result<Option<Zone>> {
        let zones = self.zones.find_by_world(world)?;
        Ok(zones.into_iter().find(|z| z.contains(position)))
    }

    /// The zone whose center is nearest to `position`.
    ///
    /// `max_distance <= 0` means unbounded. Ties go to the first zone in
    /// iteration order.
    pub fn closest_zone(
        &self,
        world: &str,
        position: Vec3,
        max_distance: f64,
    ) -> Result<Option<Zone>> {
        self.closest_zone_excluding(world, position, max_distance, None)
    }

    fn closest_zone_excluding(
        &self,
        world: &str,
        position: Vec3,
        max_distance: f64,
        exclude: Option<&ZoneId>,
    ) -> Result<Option<Zone>> {
        let zones = self.zones.find_by_world(world)?;

        let mut closest: Option<(f64, Zone)> = None;
        for zone in zones {
            if exclude.is_some_and(|id| id == &zone.id) {
                continue;
            }
            let distance = zone.distance_to_center(position);
            if closest.as_ref().is_none_or(|(best, _)| distance < *best) {
                closest = Some((distance, zone));
            }
        }

        Ok(match closest {
            Some((distance, _)) if max_distance > 0.0 && distance > max_distance => None,
            Some((_, zone)) => Some(zone),
            None => None,
        })
    }

    // ==================== Zone writes ====================

    /// Persists a new zone after checking `(world, name)` uniqueness and
    /// scanning the whole world for overlap.
    pub fn create_zone(&self, zone: Zone) -> CreateZoneResult {
        match self.zone_exists(&zone.world, &zone.name) {
            Ok(true) => return CreateZoneResult::AlreadyExists,
            Ok(false) => {}
            Err(e) => return CreateZoneResult::Error(e),
        }

        let existing = match self.zones.find_by_world(&zone.world) {
            Ok(zones) => zones,
            Err(e) => return CreateZoneResult::Error(e),
        };
        if let Some(other) = existing.iter().find(|z| zone.overlaps(z)) {
            tracing::warn!(
                "zone '{}' would overlap '{}' in world '{}'",
                zone.name,
                other.name,
                zone.world
            );
            return CreateZoneResult::Overlaps;
        }

        match self.zones.save(&zone) {
            Ok(()) => {
                tracing::info!("created zone '{}' in world '{}'", zone.name, zone.world);
                CreateZoneResult::Created(zone)
            }
            Err(e) => {
                tracing::error!("failed to create zone '{}': {e}", zone.name);
                CreateZoneResult::Error(e)
            }
        }
    }

    /// Replaces a zone's bounds.
    ///
    /// Overlap is only re-checked against the zone closest to each new
    /// corner within [`RaidConfig::zone_search_radius`], not the whole
    /// world. A zone outside that radius that still intersects the new
    /// bounds slips through; the narrow check is kept deliberately cheap
    /// for interactive resizing. The zone being updated is excluded from
    /// the search.
    pub fn update_zone_bounds(
        &self,
        world: &str,
        name: &str,
        new_min: Vec3,
        new_max: Vec3,
    ) -> UpdateZoneResult {
        let existing = match self.zones.find_by_name(world, name) {
            Ok(Some(zone)) => zone,
            Ok(None) => return UpdateZoneResult::NotFound,
            Err(e) => return UpdateZoneResult::Error(e),
        };

        let updated = match existing.with_bounds(new_min, new_max) {
            Ok(zone) => zone,
            Err(e) => return UpdateZoneResult::InvalidBounds(e),
        };

        let radius = (self.config)().zone_search_radius();
        for corner in [updated.min, updated.max] {
            match self.closest_zone_excluding(world, corner, radius, Some(&updated.id)) {
                Ok(Some(near)) if updated.overlaps(&near) => {
                    tracing::warn!(
                        "updated bounds of zone '{}' would overlap '{}'",
                        name,
                        near.name
                    );
                    return UpdateZoneResult::Overlaps;
                }
                Ok(_) => {}
                Err(e) => return UpdateZoneResult::Error(e),
            }
        }

        match self.zones.save(&updated) {
            Ok(()) => {
                tracing::info!("updated bounds of zone '{}' in world '{}'", name, world);
                UpdateZoneResult::Updated(updated)
            }
            Err(e) => {
                tracing::error!("failed to update zone '{}': {e}", name);
                UpdateZoneResult::Error(e)
            }
        }
    }

    /// Deletes a zone by `(world, name)`. Idempotent: a missing zone is
    /// `Ok(false)`. Does NOT cascade to reinforced blocks; callers that
    /// want the cascade use [`Self::demolish_zone`].
    pub fn delete_zone(&self, world: &str, name: &str) -> Result<bool> {
        let Some(zone) = self.zones.find_by_name(world, name)? else {
            return Ok(false);
        };
        self.zones.delete(&zone.id)?;
        tracing::info!("deleted zone '{}' in world '{}'", name, world);
        Ok(true)
    }

    /// Deletes a zone and every reinforced block within its bounds, the
    /// cascade the break path runs when a zone's anchoring structure is
    /// destroyed. The two deletes are separate store operations; a crash in
    /// between leaves orphaned block records that the next demolish or area
    /// delete prunes.
    pub fn demolish_zone(&self, world: &str, name: &str) -> Result<bool> {
        let Some(zone) = self.zones.find_by_name(world, name)? else {
            return Ok(false);
        };
        self.zones.delete(&zone.id)?;
        self.blocks.delete_in_area(
            world,
            zone.min.to_block_pos(),
            zone.max.to_block_pos(),
        )?;
        tracing::info!("demolished zone '{}' in world '{}'", name, world);
        Ok(true)
    }

    // ==================== Authorizations ====================

    /// Grants a player access to a zone; duplicate grants are rejected.
    pub fn authorize_player(&self, zone_id: &ZoneId, player_id: &str) -> AuthorizeResult {
        match self.authorizations.contains(zone_id, player_id) {
            Ok(true) => return AuthorizeResult::AlreadyAuthorized,
            Ok(false) => {}
            Err(e) => return AuthorizeResult::Error(e),
        }

        let auth = ZoneAuthorization::create(zone_id.clone(), player_id);
        match self.authorizations.save(&auth) {
            Ok(()) => {
                tracing::info!("authorized player '{}' in zone '{}'", player_id, zone_id);
                AuthorizeResult::Authorized
            }
            Err(e) => {
                tracing::error!(
                    "failed to authorize player '{}' in zone '{}': {e}",
                    player_id,
                    zone_id
                );
                AuthorizeResult::Error(e)
            }
        }
    }

    /// Membership test; an absent player id is always unauthorized.
    pub fn is_authorized(&self, zone_id: &ZoneId, player_id: Option<&str>) -> Result<bool> {
        match player_id {
            Some(player_id) => self.authorizations.contains(zone_id, player_id),
            None => Ok(false),
        }
    }

    pub fn authorized_players(&self, zone_id: &ZoneId) -> Result<Vec<String>> {
        let auths = self.authorizations.find_by_zone(zone_id)?;
        Ok(auths.into_iter().map(|a| a.player_id).collect())
    }

    /// Revokes one player's grant. Returns whether a grant existed; the
    /// caller notifies the player if connected.
    pub fn revoke_authorization(&self, zone_id: &ZoneId, player_id: &str) -> Result<bool> {
        let had_grant = self.authorizations.contains(zone_id, player_id)?;
        self.authorizations.delete_player(zone_id, player_id)?;
        if had_grant {
            tracing::info!(
                "revoked authorization of player '{}' in zone '{}'",
                player_id,
                zone_id
            );
        }
        Ok(had_grant)
    }

    /// Removes every grant for a zone. Returns the affected player ids so
    /// the caller can notify anyone presently connected.
    pub fn clear_authorizations(&self, zone_id: &ZoneId) -> Result<Vec<String>> {
        let players = self.authorized_players(zone_id)?;
        self.authorizations.delete_zone(zone_id)?;
        tracing::info!(
            "cleared {} authorization(s) for zone '{}'",
            players.len(),
            zone_id
        );
        Ok(players)
    }

    // ==================== Reinforced block queries ====================

    pub fn reinforced_block_at(
        &self,
        world: &str,
        position: BlockPos,
    ) -> Result<Option<ReinforcedBlock>> {
        self.blocks.find_by_position(world, position)
    }

    /// Every record whose position lies within `[min, max]` inclusive.
    pub fn reinforced_blocks_in_area(
        &self,
        world: &str,
        min: BlockPos,
        max: BlockPos,
    ) -> Result<HashMap<BlockId, ReinforcedBlock>> {
        self.blocks.find_in_area(world, min, max)
    }

    pub fn reinforced_blocks_in_zone(
        &self,
        zone: &Zone,
    ) -> Result<HashMap<BlockId, ReinforcedBlock>> {
        self.blocks.find_in_area(
            &zone.world,
            zone.min.to_block_pos(),
            zone.max.to_block_pos(),
        )
    }

    // ==================== Reinforced block writes ====================

    /// Creates a record at a position. Returns `None` if one already exists.
    pub fn create_reinforced_block(
        &self,
        world: &str,
        position: BlockPos,
        reinforcement: u32,
    ) -> Result<Option<ReinforcedBlock>> {
        if self.blocks.find_by_position(world, position)?.is_some() {
            return Ok(None);
        }
        let block = ReinforcedBlock::create(world, position, reinforcement);
        self.blocks.save(&block)?;
        tracing::info!("created {block}");
        Ok(Some(block))
    }

    /// Replaces a record's counter, keeping the same id.
    pub fn update_reinforcement(
        &self,
        block: &ReinforcedBlock,
        reinforcement: u32,
    ) -> Result<ReinforcedBlock> {
        let updated = block.with_reinforcement(reinforcement);
        self.blocks.save(&updated)?;
        tracing::debug!("updated {updated}");
        Ok(updated)
    }

    /// Deletes the record at a position, if any.
    pub fn delete_reinforced_block(&self, world: &str, position: BlockPos) -> Result<bool> {
        if self.blocks.find_by_position(world, position)?.is_none() {
            return Ok(false);
        }
        self.blocks.delete_at(world, position)?;
        tracing::info!("deleted reinforced block at {position} in world '{world}'");
        Ok(true)
    }

    /// Bulk delete within `[min, max]` inclusive.
    pub fn delete_reinforced_blocks_in_area(
        &self,
        world: &str,
        min: BlockPos,
        max: BlockPos,
    ) -> Result<()> {
        self.blocks.delete_in_area(world, min, max)?;
        tracing::info!("deleted reinforced blocks in world '{world}' between {min} and {max}");
        Ok(())
    }

    // ==================== Reinforcement state machine ====================

    /// One unauthorized break attempt at a position.
    ///
    /// Unreinforced blocks gain a record at the configured initial amount
    /// minus the unit this attempt consumes, and the break is cancelled.
    /// A positive counter is decremented and the break cancelled. A zero
    /// counter means the reinforcement is exhausted: the record is deleted
    /// and the break goes through.
    pub fn handle_unauthorized_break(&self, world: &str, position: BlockPos) -> Result<BreakOutcome> {
        match self.blocks.find_by_position(world, position)? {
            None => {
                let initial = (self.config)().initial_reinforcement.saturating_sub(1);
                let block = ReinforcedBlock::create(world, position, initial);
                self.blocks.save(&block)?;
                tracing::info!("first unauthorized break, created {block}");
                Ok(BreakOutcome {
                    cancel_break: true,
                    remaining: Some(initial),
                })
            }
            Some(block) if block.reinforcement > 0 => {
                let remaining = block.reinforcement - 1;
                self.blocks.save(&block.with_reinforcement(remaining))?;
                Ok(BreakOutcome {
                    cancel_break: true,
                    remaining: Some(remaining),
                })
            }
            Some(block) => {
                self.blocks.delete(&block.id)?;
                tracing::info!("reinforcement exhausted, {block} breaks");
                Ok(BreakOutcome {
                    cancel_break: false,
                    remaining: None,
                })
            }
        }
    }

    /// Applies a reinforcement kit at a position.
    ///
    /// Adds the configured bonus, capped at the configured maximum. An
    /// unreinforced block starts from the initial amount. A counter already
    /// at the cap is left untouched and reported as `maxed`.
    pub fn apply_reinforcement_kit(&self, world: &str, position: BlockPos) -> Result<KitOutcome> {
        let config = (self.config)();
        match self.blocks.find_by_position(world, position)? {
            None => {
                let reinforcement = config
                    .initial_reinforcement
                    .saturating_add(config.kit_reinforcement_bonus)
                    .min(config.max_reinforcement);
                let block = ReinforcedBlock::create(world, position, reinforcement);
                self.blocks.save(&block)?;
                tracing::info!("kit applied to fresh block, created {block}");
                Ok(KitOutcome {
                    reinforcement,
                    maxed: false,
                })
            }
            Some(block) if block.reinforcement >= config.max_reinforcement => {
                Ok(KitOutcome {
                    reinforcement: block.reinforcement,
                    maxed: true,
                })
            }
            Some(block) => {
                let reinforcement = block
                    .reinforcement
                    .saturating_add(config.kit_reinforcement_bonus)
                    .min(config.max_reinforcement);
                self.blocks.save(&block.with_reinforcement(reinforcement))?;
                Ok(KitOutcome {
                    reinforcement,
                    maxed: false,
                })
            }
        }
    }
}
