//! Structured results returned across the service boundary.
//!
//! The service converts repository-level store failures into the `Error`
//! arm of these enums instead of propagating them; adapters decide what a
//! failure means for the player.

use zone_core::{BoundsError, Zone};

use crate::store::StoreError;

/// Outcome of [`crate::ZoneService::create_zone`].
#[derive(Debug, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum CreateZoneResult {
    /// The zone was persisted.
    Created(Zone),
    /// A zone with this `(world, name)` already exists.
    AlreadyExists,
    /// The candidate overlaps an existing zone in the same world.
    Overlaps,
    Error(StoreError),
}

impl CreateZoneResult {
    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Outcome of [`crate::ZoneService::update_zone_bounds`].
#[derive(Debug, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum UpdateZoneResult {
    Updated(Zone),
    NotFound,
    /// The new bounds overlap a nearby zone.
    Overlaps,
    /// The new bounds are malformed (`min < max` violated on some axis).
    InvalidBounds(BoundsError),
    Error(StoreError),
}

impl UpdateZoneResult {
    pub fn is_updated(&self) -> bool {
        matches!(self, Self::Updated(_))
    }
}

/// Outcome of [`crate::ZoneService::authorize_player`].
#[derive(Debug, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum AuthorizeResult {
    Authorized,
    AlreadyAuthorized,
    Error(StoreError),
}

impl AuthorizeResult {
    pub fn is_authorized(&self) -> bool {
        matches!(self, Self::Authorized)
    }
}

/// Outcome of one unauthorized break attempt at a position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BreakOutcome {
    /// Whether the break must be cancelled (the block survives).
    pub cancel_break: bool,
    /// Counter left on the record, or `None` once the record is gone.
    pub remaining: Option<u32>,
}

/// Outcome of applying a reinforcement kit at a position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KitOutcome {
    /// Counter on the record after the kit was applied.
    pub reinforcement: u32,
    /// True if the counter was already at the cap and nothing changed;
    /// adapters play the "maxed" effect instead of the apply effect.
    pub maxed: bool,
}
