//! Cached repository for zones, partitioned by world name.

use std::collections::HashMap;
use std::sync::Arc;

use zone_core::{Zone, ZoneId};

use crate::cached::PartitionCache;
use crate::store::{Result, ZoneStore};

/// Lazy caching wrapper around a [`ZoneStore`].
///
/// Zones are loaded from the store only when a world is first queried.
/// Writes reach the store first and are mirrored into memory only for
/// worlds that are already resident.
pub struct CachedZoneRepository {
    store: Arc<dyn ZoneStore>,
    cache: PartitionCache<String, ZoneId, Zone>,
}

impl CachedZoneRepository {
    pub fn new(store: Arc<dyn ZoneStore>) -> Self {
        Self {
            store,
            cache: PartitionCache::new(),
        }
    }

    /// Initialize the store. Lazy: no data is loaded here.
    pub fn initialize(&self) -> Result<()> {
        self.store.initialize()
    }

    /// Full load from the store, replacing the entire cache.
    ///
    /// Cold-start diagnostics and tools only; the hot path is
    /// [`Self::find_by_world`].
    pub fn load_all(&self) -> Result<HashMap<String, Vec<Zone>>> {
        let all = self.store.load_all()?;
        let by_id: HashMap<String, HashMap<ZoneId, Zone>> = all
            .iter()
            .map(|(world, zones)| {
                (
                    world.clone(),
                    zones.iter().map(|z| (z.id.clone(), z.clone())).collect(),
                )
            })
            .collect();
        self.cache.replace_all(by_id)?;
        Ok(all)
    }

    /// All zones in a world, via the cache.
    pub fn find_by_world(&self, world: &str) -> Result<Vec<Zone>> {
        let records = self.cache.get_or_load(&world.to_string(), || {
            let zones = self.store.find_by_world(world)?;
            tracing::debug!("cached {} zone(s) for world '{}'", zones.len(), world);
            Ok(zones.into_iter().map(|z| (z.id.clone(), z)).collect())
        })?;
        Ok(records.into_values().collect())
    }

    /// Zone lookup by `(world, name)`, via the cache.
    pub fn find_by_name(&self, world: &str, name: &str) -> Result<Option<Zone>> {
        let zones = self.find_by_world(world)?;
        Ok(zones.into_iter().find(|z| z.name == name))
    }

    /// Store-first save; the cache is updated only on confirmed success and
    /// only if the zone's world is resident.
    pub fn save(&self, zone: &Zone) -> Result<()> {
        self.store.save(zone)?;
        self.cache
            .upsert(&zone.world, zone.id.clone(), zone.clone())
    }

    /// Store-first delete by id. The id alone does not name a world, so the
    /// cache prune scans resident worlds and stops at the first match.
    pub fn delete(&self, zone_id: &ZoneId) -> Result<()> {
        self.store.delete(zone_id)?;
        self.cache.remove_scanning(zone_id)?;
        Ok(())
    }

    /// Release store resources and drop the cache. Writes are already
    /// through, so there is nothing to flush.
    pub fn close(&self) -> Result<()> {
        self.store.close()?;
        self.cache.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryZoneStore;
    use zone_core::Vec3;

    fn zone(name: &str, world: &str, x: f64) -> Zone {
        Zone::create(
            name,
            world,
            Vec3::new(x, 0.0, 0.0),
            Vec3::new(x + 5.0, 5.0, 5.0),
        )
        .unwrap()
    }

    fn repo_with(zones: &[Zone]) -> (Arc<MemoryZoneStore>, CachedZoneRepository) {
        let store = Arc::new(MemoryZoneStore::new());
        for z in zones {
            ZoneStore::save(store.as_ref(), z).unwrap();
        }
        let repo = CachedZoneRepository::new(Arc::clone(&store) as Arc<dyn ZoneStore>);
        (store, repo)
    }

    #[test]
    fn repeated_reads_hit_the_store_once() {
        let (store, repo) = repo_with(&[zone("a", "overworld", 0.0)]);

        let first = repo.find_by_world("overworld").unwrap();
        let second = repo.find_by_world("overworld").unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first, second);
        assert_eq!(store.load_count(), 1);
    }

    #[test]
    fn save_is_write_through_for_resident_worlds() {
        let (store, repo) = repo_with(&[zone("a", "overworld", 0.0)]);
        repo.find_by_world("overworld").unwrap();

        repo.save(&zone("b", "overworld", 10.0)).unwrap();

        let zones = repo.find_by_world("overworld").unwrap();
        assert_eq!(zones.len(), 2);
        // Still just the initial load; the save must not trigger another.
        assert_eq!(store.load_count(), 1);
    }

    #[test]
    fn save_does_not_seed_unloaded_worlds() {
        let (store, repo) = repo_with(&[zone("a", "overworld", 0.0)]);

        repo.save(&zone("b", "overworld", 10.0)).unwrap();
        assert_eq!(store.load_count(), 0);

        // First read still goes to the store and sees both zones.
        let zones = repo.find_by_world("overworld").unwrap();
        assert_eq!(zones.len(), 2);
        assert_eq!(store.load_count(), 1);
    }

    #[test]
    fn failed_save_leaves_cache_untouched() {
        let (store, repo) = repo_with(&[zone("a", "overworld", 0.0)]);
        repo.find_by_world("overworld").unwrap();

        store.fail_writes(true);
        assert!(repo.save(&zone("b", "overworld", 10.0)).is_err());
        store.fail_writes(false);

        let zones = repo.find_by_world("overworld").unwrap();
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].name, "a");
    }

    #[test]
    fn delete_prunes_the_resident_world() {
        let victim = zone("a", "overworld", 0.0);
        let (store, repo) = repo_with(&[victim.clone(), zone("b", "nether", 0.0)]);
        repo.find_by_world("overworld").unwrap();
        repo.find_by_world("nether").unwrap();

        repo.delete(&victim.id).unwrap();

        assert!(repo.find_by_world("overworld").unwrap().is_empty());
        assert_eq!(repo.find_by_world("nether").unwrap().len(), 1);
        assert_eq!(store.load_count(), 2);
    }

    #[test]
    fn load_all_returns_defensive_copy_and_resets_cache() {
        let (_store, repo) = repo_with(&[zone("a", "overworld", 0.0)]);
        repo.find_by_world("ghost-world").unwrap();

        let mut all = repo.load_all().unwrap();
        all.get_mut("overworld").unwrap().clear();

        // Mutating the returned map must not affect the cache.
        assert_eq!(repo.find_by_world("overworld").unwrap().len(), 1);
    }
}
