//! Durable-store contracts and backends.
//!
//! The store is the source of truth: slow, blocking, and assumed reliable.
//! Everything latency-sensitive goes through the caches in [`crate::cached`]
//! instead of calling these directly.

mod error;
mod file;
mod memory;
mod traits;

pub use error::{Result, StoreError};
pub(crate) use traits::in_area;
pub use file::{FileAuthorizationStore, FileReinforcedBlockStore, FileZoneStore};
pub use memory::{MemoryAuthorizationStore, MemoryReinforcedBlockStore, MemoryZoneStore};
pub use traits::{AuthorizationStore, ReinforcedBlockStore, ZoneStore};
