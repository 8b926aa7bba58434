use serde::{Deserialize, Serialize};

/// Tunable parameters read by the service layer at call time.
///
/// The service does not cache this snapshot; callers inject a provider so a
/// reloaded configuration takes effect on the next operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaidConfig {
    /// Default zone footprint on the horizontal axes.
    pub zone_width: u32,
    /// Default zone extent on the vertical axis.
    pub zone_height: u32,
    /// Counter a block starts with on its first unauthorized break.
    pub initial_reinforcement: u32,
    /// Counter added per reinforcement-kit use.
    pub kit_reinforcement_bonus: u32,
    /// Hard cap on any block's counter.
    pub max_reinforcement: u32,
    /// Whether soft block types (soils etc.) are protected at all.
    pub protect_soft_blocks: bool,
    /// Whether block types normally exempt from protection are protected.
    pub protect_bypass_type_blocks: bool,
}

impl RaidConfig {
    pub const DEFAULT_ZONE_WIDTH: u32 = 15;
    pub const DEFAULT_ZONE_HEIGHT: u32 = 15;
    pub const DEFAULT_INITIAL_REINFORCEMENT: u32 = 50;
    pub const DEFAULT_KIT_REINFORCEMENT_BONUS: u32 = 10;
    pub const DEFAULT_MAX_REINFORCEMENT: u32 = 100;

    pub fn new() -> Self {
        Self {
            zone_width: Self::DEFAULT_ZONE_WIDTH,
            zone_height: Self::DEFAULT_ZONE_HEIGHT,
            initial_reinforcement: Self::DEFAULT_INITIAL_REINFORCEMENT,
            kit_reinforcement_bonus: Self::DEFAULT_KIT_REINFORCEMENT_BONUS,
            max_reinforcement: Self::DEFAULT_MAX_REINFORCEMENT,
            protect_soft_blocks: false,
            protect_bypass_type_blocks: false,
        }
    }

    /// Radius used when searching for zones nearest an updated corner.
    pub fn zone_search_radius(&self) -> f64 {
        self.zone_width.max(self.zone_height) as f64
    }
}

impl Default for RaidConfig {
    fn default() -> Self {
        Self::new()
    }
}
