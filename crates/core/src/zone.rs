//! Named axis-aligned protection zones.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::BoundsError;
use crate::geometry::Vec3;

/// Opaque stable identifier for a zone (database primary key).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZoneId(pub String);

impl ZoneId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named axis-aligned box within one world, the unit of protection.
///
/// Zones are immutable by convention: bounds change only by replacing the
/// whole record via [`Zone::with_bounds`], keeping cache entries stable.
/// `min` is inclusive and `max` is the exclusive upper bound for
/// containment tests.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    /// User-facing name, unique within a world.
    pub name: String,
    pub world: String,
    pub min: Vec3,
    pub max: Vec3,
}

impl Zone {
    /// Creates a zone with a freshly generated id.
    ///
    /// Rejects bounds where any axis fails `min < max`.
    pub fn create(
        name: impl Into<String>,
        world: impl Into<String>,
        min: Vec3,
        max: Vec3,
    ) -> Result<Self, BoundsError> {
        BoundsError::check(min, max)?;
        Ok(Self {
            id: ZoneId(crate::fresh_id()),
            name: name.into(),
            world: world.into(),
            min,
            max,
        })
    }

    /// Copy with replaced bounds, keeping id, name and world.
    pub fn with_bounds(&self, min: Vec3, max: Vec3) -> Result<Self, BoundsError> {
        BoundsError::check(min, max)?;
        Ok(Self {
            min,
            max,
            ..self.clone()
        })
    }

    /// Half-open containment test: `min <= p < max` on every axis.
    pub fn contains(&self, p: Vec3) -> bool {
        p.x >= self.min.x
            && p.x < self.max.x
            && p.y >= self.min.y
            && p.y < self.max.y
            && p.z >= self.min.z
            && p.z < self.max.z
    }

    /// Separating-axis overlap test against another zone.
    ///
    /// Zones in different worlds never overlap. The per-axis comparison is
    /// inclusive, so boxes that merely touch at a face count as overlapping;
    /// protections must not gap at seams.
    pub fn overlaps(&self, other: &Zone) -> bool {
        if self.world != other.world {
            return false;
        }

        let x = self.min.x <= other.max.x && self.max.x >= other.min.x;
        let y = self.min.y <= other.max.y && self.max.y >= other.min.y;
        let z = self.min.z <= other.max.z && self.max.z >= other.min.z;

        x && y && z
    }

    /// Geometric center of the bounding box.
    pub fn center(&self) -> Vec3 {
        Vec3::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
            (self.min.z + self.max.z) / 2.0,
        )
    }

    /// Euclidean distance from a point to this zone's center.
    pub fn distance_to_center(&self, p: Vec3) -> f64 {
        p.distance_to(self.center())
    }

    /// The eight corner points of the bounding box.
    pub fn corners(&self) -> [Vec3; 8] {
        let (min, max) = (self.min, self.max);
        [
            Vec3::new(min.x, min.y, min.z),
            Vec3::new(max.x, min.y, min.z),
            Vec3::new(min.x, max.y, min.z),
            Vec3::new(max.x, max.y, min.z),
            Vec3::new(min.x, min.y, max.z),
            Vec3::new(max.x, min.y, max.z),
            Vec3::new(min.x, max.y, max.z),
            Vec3::new(max.x, max.y, max.z),
        ]
    }
}
