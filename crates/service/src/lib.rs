//! Storage and orchestration for world protection zones.
//!
//! This crate sits between fast in-memory reads performed from game and
//! network threads and a slow durable store. Consumers embed [`ZoneService`]
//! and inject concrete store backends; game-engine event handlers, commands
//! and UI pages stay outside as thin adapters.
//!
//! Modules are organized by responsibility:
//! - [`store`] defines the durable-store contracts plus the in-memory and
//!   file-backed implementations
//! - [`cached`] provides the lazy, write-through per-partition caches over
//!   those stores
//! - [`service`] composes the three cached repositories into the business
//!   operations and the reinforcement state machine

pub mod cached;
pub mod service;
pub mod store;

pub use cached::{
    CachedAuthorizationRepository, CachedReinforcedBlockRepository, CachedZoneRepository,
};
pub use service::{
    AuthorizeResult, BreakOutcome, ConfigProvider, CreateZoneResult, KitOutcome, UpdateZoneResult,
    ZoneService,
};
pub use store::{
    AuthorizationStore, FileAuthorizationStore, FileReinforcedBlockStore, FileZoneStore,
    MemoryAuthorizationStore, MemoryReinforcedBlockStore, MemoryZoneStore, ReinforcedBlockStore,
    Result, StoreError, ZoneStore,
};
