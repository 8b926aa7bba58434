//! Domain types for world protection zones.
//!
//! This crate holds the pure data model shared by the storage and service
//! layers: zone geometry, per-zone player authorizations, reinforced block
//! counters, and the tunable configuration snapshot. It performs no I/O;
//! everything stateful lives in `zone-service`.
//!
//! Modules are organized by entity:
//! - [`geometry`] provides the vector value types
//! - [`zone`] defines zones and their spatial predicates
//! - [`authorization`] defines per-zone player grants
//! - [`block`] defines position-keyed reinforcement counters
//! - [`config`] carries the tunables read by the service at call time

pub mod authorization;
pub mod block;
pub mod config;
pub mod error;
pub mod geometry;
pub mod zone;

pub use authorization::{AuthorizationId, ZoneAuthorization};
pub use block::{BlockId, ReinforcedBlock};
pub use config::RaidConfig;
pub use error::BoundsError;
pub use geometry::{BlockPos, Vec3};
pub use zone::{Zone, ZoneId};

/// Generates a fresh opaque identifier: 128 random bits, hex encoded.
pub(crate) fn fresh_id() -> String {
    hex::encode(rand::random::<u128>().to_be_bytes())
}
