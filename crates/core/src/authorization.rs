//! Per-zone player authorization records.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::zone::ZoneId;

/// Opaque stable identifier for an authorization record.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuthorizationId(pub String);

impl AuthorizationId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AuthorizationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Grants `player_id` permission to act inside `zone_id`.
///
/// `(zone_id, player_id)` is unique; the service layer rejects duplicate
/// grants before they reach storage. There is no ordering among the
/// authorizations of one zone.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZoneAuthorization {
    pub id: AuthorizationId,
    pub zone_id: ZoneId,
    pub player_id: String,
}

impl ZoneAuthorization {
    /// Creates a grant with a freshly generated id.
    pub fn create(zone_id: ZoneId, player_id: impl Into<String>) -> Self {
        Self {
            id: AuthorizationId(crate::fresh_id()),
            zone_id,
            player_id: player_id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_assigns_distinct_ids() {
        let zone = ZoneId("z".to_string());
        let a = ZoneAuthorization::create(zone.clone(), "alice");
        let b = ZoneAuthorization::create(zone, "alice");
        assert_ne!(a.id, b.id);
        assert_eq!(a.player_id, "alice");
    }
}
