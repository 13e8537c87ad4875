//! Handles for agents, claims, equipment, contracts, clouds, and timers.
//!
//! Each handle wraps a v7 [`Uuid`] in its own type, so a claim handle can
//! never be passed where an equipment handle is expected. Handles are only
//! compared for equality: anything that needs a stable order (lottery
//! registration, reference-claim selection, timer sequencing) keeps its
//! own insertion-ordered storage.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Declares a handle type. Serializes as the bare UUID string.
macro_rules! handle {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[serde(transparent)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(Uuid);

        impl $name {
            /// A fresh handle.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// The wrapped UUID.
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

handle! {
    /// An agent: a human player or a bot.
    AgentId
}

handle! {
    /// A land claim (plot).
    ClaimId
}

handle! {
    /// A miner or panel standing on a claim tile.
    EquipmentId
}

handle! {
    /// An energy-export contract.
    ContractId
}

handle! {
    /// A drifting cloud.
    CloudId
}

handle! {
    /// A repeating timer task.
    TaskId
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn fresh_handles_never_collide() {
        let claims: HashSet<ClaimId> = (0..256).map(|_| ClaimId::new()).collect();
        assert_eq!(claims.len(), 256);
        assert!(claims.iter().all(|claim| !claim.as_uuid().is_nil()));
    }

    #[test]
    fn handle_serializes_as_a_bare_uuid_string() {
        let contract = ContractId::new();
        let json = serde_json::to_string(&contract).unwrap();
        assert_eq!(json, format!("\"{}\"", contract.as_uuid()));
        let restored: ContractId = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, contract);
    }

    #[test]
    fn display_is_the_hyphenated_uuid() {
        let uuid = Uuid::nil();
        assert_eq!(
            EquipmentId::from(uuid).to_string(),
            "00000000-0000-0000-0000-000000000000"
        );
    }
}
