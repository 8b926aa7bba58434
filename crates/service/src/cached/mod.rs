//! Lazy, write-through per-partition caches over the durable stores.
//!
//! A cached repository presents the same contract as its store but answers
//! repeat reads from memory. Each partition (world for zones and blocks,
//! zone id for authorizations) is loaded from the store at most once, on
//! first access; every write goes to the store first and is mirrored into
//! the cache only if that partition is already resident.

mod authorizations;
mod blocks;
mod partition;
mod zones;

pub use authorizations::CachedAuthorizationRepository;
pub use blocks::CachedReinforcedBlockRepository;
pub use partition::PartitionCache;
pub use zones::CachedZoneRepository;
