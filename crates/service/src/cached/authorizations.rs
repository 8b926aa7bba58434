//! Cached repository for authorizations, partitioned by zone id.

use std::collections::HashMap;
use std::sync::Arc;

use zone_core::{AuthorizationId, ZoneAuthorization, ZoneId};

use crate::cached::PartitionCache;
use crate::store::{AuthorizationStore, Result};

/// Lazy caching wrapper around an [`AuthorizationStore`].
pub struct CachedAuthorizationRepository {
    store: Arc<dyn AuthorizationStore>,
    cache: PartitionCache<ZoneId, AuthorizationId, ZoneAuthorization>,
}

impl CachedAuthorizationRepository {
    pub fn new(store: Arc<dyn AuthorizationStore>) -> Self {
        Self {
            store,
            cache: PartitionCache::new(),
        }
    }

    pub fn initialize(&self) -> Result<()> {
        self.store.initialize()
    }

    /// Full load from the store, replacing the entire cache.
    pub fn load_all(&self) -> Result<HashMap<ZoneId, Vec<ZoneAuthorization>>> {
        let all = self.store.load_all()?;
        let by_id: HashMap<ZoneId, HashMap<AuthorizationId, ZoneAuthorization>> = all
            .iter()
            .map(|(zone_id, auths)| {
                (
                    zone_id.clone(),
                    auths.iter().map(|a| (a.id.clone(), a.clone())).collect(),
                )
            })
            .collect();
        self.cache.replace_all(by_id)?;
        Ok(all)
    }

    /// All grants for one zone, via the cache.
    pub fn find_by_zone(&self, zone_id: &ZoneId) -> Result<Vec<ZoneAuthorization>> {
        let records = self.cache.get_or_load(zone_id, || {
            let auths = self.store.find_by_zone(zone_id)?;
            tracing::debug!("cached {} grant(s) for zone '{}'", auths.len(), zone_id);
            Ok(auths.into_iter().map(|a| (a.id.clone(), a)).collect())
        })?;
        Ok(records.into_values().collect())
    }

    /// Membership test for one player, via the cache.
    pub fn contains(&self, zone_id: &ZoneId, player_id: &str) -> Result<bool> {
        Ok(self
            .find_by_zone(zone_id)?
            .iter()
            .any(|a| a.player_id == player_id))
    }

    /// Store-first save, mirrored into the zone's partition if resident.
    pub fn save(&self, auth: &ZoneAuthorization) -> Result<()> {
        self.store.save(auth)?;
        self.cache
            .upsert(&auth.zone_id, auth.id.clone(), auth.clone())
    }

    /// Store-first removal of one player's grant.
    pub fn delete_player(&self, zone_id: &ZoneId, player_id: &str) -> Result<()> {
        self.store.delete_player(zone_id, player_id)?;
        // The record id is not known here, so find it in the resident
        // partition and remove by id.
        let ids: Vec<AuthorizationId> = self
            .cache
            .get_if_loaded(zone_id)?
            .map(|records| {
                records
                    .values()
                    .filter(|a| a.player_id == player_id)
                    .map(|a| a.id.clone())
                    .collect()
            })
            .unwrap_or_default();
        self.cache.remove_many(zone_id, &ids)
    }

    /// Store-first removal of every grant for a zone; the partition is
    /// dropped from the cache entirely.
    pub fn delete_zone(&self, zone_id: &ZoneId) -> Result<()> {
        self.store.delete_zone(zone_id)?;
        self.cache.remove_partition(zone_id)
    }

    pub fn close(&self) -> Result<()> {
        self.store.close()?;
        self.cache.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryAuthorizationStore;

    fn repo() -> (Arc<MemoryAuthorizationStore>, CachedAuthorizationRepository) {
        let store = Arc::new(MemoryAuthorizationStore::new());
        let repo =
            CachedAuthorizationRepository::new(Arc::clone(&store) as Arc<dyn AuthorizationStore>);
        (store, repo)
    }

    #[test]
    fn membership_reads_load_once_per_zone() {
        let (store, repo) = repo();
        let zone = ZoneId("z1".to_string());
        repo.save(&ZoneAuthorization::create(zone.clone(), "alice"))
            .unwrap();

        assert!(repo.contains(&zone, "alice").unwrap());
        assert!(!repo.contains(&zone, "bob").unwrap());
        assert_eq!(store.load_count(), 1);
    }

    #[test]
    fn save_after_load_is_visible_without_reload() {
        let (store, repo) = repo();
        let zone = ZoneId("z1".to_string());
        repo.find_by_zone(&zone).unwrap();

        repo.save(&ZoneAuthorization::create(zone.clone(), "alice"))
            .unwrap();

        assert!(repo.contains(&zone, "alice").unwrap());
        assert_eq!(store.load_count(), 1);
    }

    #[test]
    fn delete_player_removes_only_that_grant() {
        let (_store, repo) = repo();
        let zone = ZoneId("z1".to_string());
        repo.find_by_zone(&zone).unwrap();
        repo.save(&ZoneAuthorization::create(zone.clone(), "alice"))
            .unwrap();
        repo.save(&ZoneAuthorization::create(zone.clone(), "bob"))
            .unwrap();

        repo.delete_player(&zone, "alice").unwrap();

        assert!(!repo.contains(&zone, "alice").unwrap());
        assert!(repo.contains(&zone, "bob").unwrap());
    }

    #[test]
    fn delete_zone_drops_the_partition() {
        let (store, repo) = repo();
        let zone = ZoneId("z1".to_string());
        repo.save(&ZoneAuthorization::create(zone.clone(), "alice"))
            .unwrap();
        repo.find_by_zone(&zone).unwrap();

        repo.delete_zone(&zone).unwrap();

        // Partition gone: the next read loads again and finds nothing.
        assert!(repo.find_by_zone(&zone).unwrap().is_empty());
        assert_eq!(store.load_count(), 2);
    }
}
