//! Position-keyed reinforcement counters.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::BlockPos;

/// Deterministic identifier derived from `(world, position)`.
///
/// The id encodes its inputs as `world|x|y|z`, so a lookup by position never
/// needs a scan and the coordinate can be recovered from the id alone.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockId(pub String);

impl BlockId {
    /// Derives the id for a block position in a world.
    pub fn for_position(world: &str, pos: BlockPos) -> Self {
        Self(format!("{}|{}|{}|{}", world, pos.x, pos.y, pos.z))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses the coordinate back out of the id.
    ///
    /// Returns `None` for ids not produced by [`BlockId::for_position`].
    pub fn position(&self) -> Option<BlockPos> {
        let mut parts = self.0.rsplit('|');
        let z = parts.next()?.parse().ok()?;
        let y = parts.next()?.parse().ok()?;
        let x = parts.next()?.parse().ok()?;
        Some(BlockPos::new(x, y, z))
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A decrementing counter attached to one block position.
///
/// The service guarantees the record is deleted once the counter is
/// exhausted; `reinforcement` itself only ever moves by whole-record
/// replacement via [`ReinforcedBlock::with_reinforcement`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReinforcedBlock {
    pub id: BlockId,
    pub world: String,
    pub position: BlockPos,
    pub reinforcement: u32,
}

impl ReinforcedBlock {
    /// Creates a record whose id is derived from the world and position.
    pub fn create(world: impl Into<String>, position: BlockPos, reinforcement: u32) -> Self {
        let world = world.into();
        Self {
            id: BlockId::for_position(&world, position),
            world,
            position,
            reinforcement,
        }
    }

    /// Copy with a replaced counter, keeping the same id.
    pub fn with_reinforcement(&self, reinforcement: u32) -> Self {
        Self {
            reinforcement,
            ..self.clone()
        }
    }
}

impl fmt::Display for ReinforcedBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "block {} in '{}' (reinforcement {})",
            self.position, self.world, self.reinforcement
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_derivation_is_deterministic() {
        let a = BlockId::for_position("overworld", BlockPos::new(1, -2, 3));
        let b = BlockId::for_position("overworld", BlockPos::new(1, -2, 3));
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "overworld|1|-2|3");
    }

    #[test]
    fn id_round_trips_position() {
        let pos = BlockPos::new(-14, 62, 1077);
        let id = BlockId::for_position("the|piped|world", pos);
        assert_eq!(id.position(), Some(pos));
    }

    #[test]
    fn malformed_id_has_no_position() {
        assert_eq!(BlockId("junk".to_string()).position(), None);
        assert_eq!(BlockId("w|1|2|x".to_string()).position(), None);
    }

    #[test]
    fn with_reinforcement_keeps_id() {
        let block = ReinforcedBlock::create("overworld", BlockPos::new(0, 64, 0), 50);
        let worn = block.with_reinforcement(49);
        assert_eq!(worn.id, block.id);
        assert_eq!(worn.reinforcement, 49);
    }
}
