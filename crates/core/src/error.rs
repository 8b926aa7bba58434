//! Invariant errors raised by entity constructors.

use thiserror::Error;

use crate::geometry::Vec3;

/// Malformed zone bounds: every axis must satisfy `min < max`.
#[derive(Clone, Debug, PartialEq, Error)]
#[error("invalid bounds: min {min} must be strictly below max {max} on every axis")]
pub struct BoundsError {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundsError {
    pub(crate) fn check(min: Vec3, max: Vec3) -> Result<(), BoundsError> {
        if min.x < max.x && min.y < max.y && min.z < max.z {
            Ok(())
        } else {
            Err(BoundsError { min, max })
        }
    }
}
