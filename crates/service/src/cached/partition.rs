//! Generic per-partition cache with atomic get-or-load.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

use crate::store::{Result, StoreError};

/// One lazily loaded partition. The slot stays `None` until the first
/// successful load, so a failed load never leaves a partial entry behind.
struct Partition<I, R> {
    records: RwLock<Option<HashMap<I, R>>>,
}

impl<I, R> Partition<I, R> {
    fn empty() -> Self {
        Self {
            records: RwLock::new(None),
        }
    }

    fn loaded(records: HashMap<I, R>) -> Self {
        Self {
            records: RwLock::new(Some(records)),
        }
    }
}

/// Concurrent mapping from partition key to a lazily loaded record map.
///
/// Reads of a resident partition take only read locks. The first read of a
/// missing partition takes that partition's write lock for the duration of
/// the store load, so concurrent first reads of the same key perform exactly
/// one load while loads for different keys proceed independently; the outer
/// map's write lock is held only long enough to insert an empty slot.
pub struct PartitionCache<K, I, R> {
    partitions: RwLock<HashMap<K, Arc<Partition<I, R>>>>,
}

impl<K, I, R> PartitionCache<K, I, R>
where
    K: Eq + Hash + Clone,
    I: Eq + Hash + Clone,
    R: Clone,
{
    pub fn new() -> Self {
        Self {
            partitions: RwLock::new(HashMap::new()),
        }
    }

    /// The slot for `key`, inserting an unloaded one if absent.
    fn slot(&self, key: &K) -> Result<Arc<Partition<I, R>>> {
        if let Some(partition) = self
            .partitions
            .read()
            .map_err(|_| StoreError::LockPoisoned)?
            .get(key)
        {
            return Ok(Arc::clone(partition));
        }

        let mut partitions = self
            .partitions
            .write()
            .map_err(|_| StoreError::LockPoisoned)?;
        Ok(Arc::clone(
            partitions
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Partition::empty())),
        ))
    }

    /// The slot for `key` only if that partition has been loaded.
    ///
    /// Write-through helpers use this: a partition that was never read must
    /// not be created by a write, or it would shadow store contents.
    fn loaded_slot(&self, key: &K) -> Result<Option<Arc<Partition<I, R>>>> {
        let partitions = self
            .partitions
            .read()
            .map_err(|_| StoreError::LockPoisoned)?;
        Ok(partitions.get(key).map(Arc::clone))
    }

    /// Returns a copy of the partition's records, loading them through
    /// `load` on first access.
    pub fn get_or_load<F>(&self, key: &K, load: F) -> Result<HashMap<I, R>>
    where
        F: FnOnce() -> Result<HashMap<I, R>>,
    {
        let partition = self.slot(key)?;

        if let Some(records) = partition
            .records
            .read()
            .map_err(|_| StoreError::LockPoisoned)?
            .as_ref()
        {
            return Ok(records.clone());
        }

        let mut slot = partition
            .records
            .write()
            .map_err(|_| StoreError::LockPoisoned)?;
        // Another caller may have filled the slot while we waited.
        if let Some(records) = slot.as_ref() {
            return Ok(records.clone());
        }

        let records = load()?;
        *slot = Some(records.clone());
        Ok(records)
    }

    /// Snapshot of a partition's records if resident, without loading.
    pub fn get_if_loaded(&self, key: &K) -> Result<Option<HashMap<I, R>>> {
        match self.loaded_slot(key)? {
            Some(partition) => Ok(partition
                .records
                .read()
                .map_err(|_| StoreError::LockPoisoned)?
                .clone()),
            None => Ok(None),
        }
    }

    /// Inserts or replaces a record if its partition is resident.
    pub fn upsert(&self, key: &K, id: I, record: R) -> Result<()> {
        if let Some(partition) = self.loaded_slot(key)? {
            let mut slot = partition
                .records
                .write()
                .map_err(|_| StoreError::LockPoisoned)?;
            if let Some(records) = slot.as_mut() {
                records.insert(id, record);
            }
        }
        Ok(())
    }

    /// Removes a record from its partition if resident.
    pub fn remove(&self, key: &K, id: &I) -> Result<()> {
        if let Some(partition) = self.loaded_slot(key)? {
            let mut slot = partition
                .records
                .write()
                .map_err(|_| StoreError::LockPoisoned)?;
            if let Some(records) = slot.as_mut() {
                records.remove(id);
            }
        }
        Ok(())
    }

    /// Removes a set of records from one partition if resident.
    pub fn remove_many(&self, key: &K, ids: &[I]) -> Result<()> {
        if let Some(partition) = self.loaded_slot(key)? {
            let mut slot = partition
                .records
                .write()
                .map_err(|_| StoreError::LockPoisoned)?;
            if let Some(records) = slot.as_mut() {
                for id in ids {
                    records.remove(id);
                }
            }
        }
        Ok(())
    }

    /// Removes a record by id across resident partitions, stopping at the
    /// first hit. Bounded by the number of loaded partitions; relies on
    /// global id uniqueness.
    pub fn remove_scanning(&self, id: &I) -> Result<bool> {
        let partitions: Vec<Arc<Partition<I, R>>> = {
            let map = self
                .partitions
                .read()
                .map_err(|_| StoreError::LockPoisoned)?;
            map.values().map(Arc::clone).collect()
        };

        for partition in partitions {
            let mut slot = partition
                .records
                .write()
                .map_err(|_| StoreError::LockPoisoned)?;
            if let Some(records) = slot.as_mut()
                && records.remove(id).is_some()
            {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Drops a whole partition (loaded or not).
    pub fn remove_partition(&self, key: &K) -> Result<()> {
        self.partitions
            .write()
            .map_err(|_| StoreError::LockPoisoned)?
            .remove(key);
        Ok(())
    }

    /// Replaces the entire cache contents, clearing stale partitions.
    pub fn replace_all(&self, data: HashMap<K, HashMap<I, R>>) -> Result<()> {
        let mut partitions = self
            .partitions
            .write()
            .map_err(|_| StoreError::LockPoisoned)?;
        partitions.clear();
        for (key, records) in data {
            partitions.insert(key, Arc::new(Partition::loaded(records)));
        }
        Ok(())
    }

    /// Drops every partition.
    pub fn clear(&self) -> Result<()> {
        self.partitions
            .write()
            .map_err(|_| StoreError::LockPoisoned)?
            .clear();
        Ok(())
    }
}

impl<K, I, R> Default for PartitionCache<K, I, R>
where
    K: Eq + Hash + Clone,
    I: Eq + Hash + Clone,
    R: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn records(pairs: &[(&str, u32)]) -> HashMap<String, u32> {
        pairs
            .iter()
            .map(|(id, v)| (id.to_string(), *v))
            .collect()
    }

    #[test]
    fn get_or_load_loads_once() {
        let cache: PartitionCache<String, String, u32> = PartitionCache::new();
        let loads = AtomicUsize::new(0);
        let key = "overworld".to_string();

        for _ in 0..3 {
            let got = cache
                .get_or_load(&key, || {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok(records(&[("a", 1)]))
                })
                .unwrap();
            assert_eq!(got.len(), 1);
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_load_does_not_poison() {
        let cache: PartitionCache<String, String, u32> = PartitionCache::new();
        let key = "overworld".to_string();

        let err = cache.get_or_load(&key, || Err(StoreError::Backend("down".to_string())));
        assert!(err.is_err());

        // The next load must run (and can succeed) instead of returning a
        // cached partial result.
        let got = cache.get_or_load(&key, || Ok(records(&[("a", 1)]))).unwrap();
        assert_eq!(got.len(), 1);
    }

    #[test]
    fn upsert_skips_unloaded_partitions() {
        let cache: PartitionCache<String, String, u32> = PartitionCache::new();
        let key = "overworld".to_string();

        cache.upsert(&key, "a".to_string(), 1).unwrap();

        // The partition was never read, so the write must not have seeded it.
        let loads = AtomicUsize::new(0);
        let got = cache
            .get_or_load(&key, || {
                loads.fetch_add(1, Ordering::SeqCst);
                Ok(records(&[("b", 2)]))
            })
            .unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert_eq!(got.keys().collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn remove_scanning_stops_at_first_hit() {
        let cache: PartitionCache<String, String, u32> = PartitionCache::new();
        cache
            .get_or_load(&"a".to_string(), || Ok(records(&[("x", 1)])))
            .unwrap();
        cache
            .get_or_load(&"b".to_string(), || Ok(records(&[("y", 2)])))
            .unwrap();

        assert!(cache.remove_scanning(&"y".to_string()).unwrap());
        assert!(!cache.remove_scanning(&"y".to_string()).unwrap());
        let b = cache
            .get_or_load(&"b".to_string(), || unreachable!("partition resident"))
            .unwrap();
        assert!(b.is_empty());
    }

    #[test]
    fn replace_all_clears_stale_partitions() {
        let cache: PartitionCache<String, String, u32> = PartitionCache::new();
        cache
            .get_or_load(&"stale".to_string(), || Ok(records(&[("x", 1)])))
            .unwrap();

        let mut fresh = HashMap::new();
        fresh.insert("fresh".to_string(), records(&[("y", 2)]));
        cache.replace_all(fresh).unwrap();

        // The stale partition must be gone: reading it triggers a load again.
        let loads = AtomicUsize::new(0);
        cache
            .get_or_load(&"stale".to_string(), || {
                loads.fetch_add(1, Ordering::SeqCst);
                Ok(HashMap::new())
            })
            .unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn concurrent_first_reads_load_once() {
        use std::sync::Arc as StdArc;
        use std::sync::Barrier;

        let cache: StdArc<PartitionCache<String, String, u32>> =
            StdArc::new(PartitionCache::new());
        let loads = StdArc::new(AtomicUsize::new(0));
        let barrier = StdArc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = StdArc::clone(&cache);
                let loads = StdArc::clone(&loads);
                let barrier = StdArc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    cache
                        .get_or_load(&"overworld".to_string(), || {
                            loads.fetch_add(1, Ordering::SeqCst);
                            Ok(HashMap::from([("a".to_string(), 1u32)]))
                        })
                        .unwrap()
                })
            })
            .collect();

        for handle in handles {
            let got = handle.join().unwrap();
            assert_eq!(got.len(), 1);
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }
}
