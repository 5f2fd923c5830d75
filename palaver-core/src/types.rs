//! Core identity types.
//!
//! Every identifier is a 128-bit UUID wrapped in a newtype so that a player id
//! can never be passed where an action id is expected. Dialog, button,
//! condition and action ids are *derived*: they are UUID v5 hashes of the
//! entry's label or field values, so they are stable across save/load.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Namespace for all derived identifiers.
const PALAVER_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_9a52_2d4e_4b0a_9e53_7c1d_04a8_b3f1);

/// Derive a stable UUID from arbitrary text.
#[must_use]
pub fn derive_uuid(text: &str) -> Uuid {
    Uuid::new_v5(&PALAVER_NAMESPACE, text.as_bytes())
}

macro_rules! uuid_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }
    };
}

uuid_newtype!(
    /// Stable identifier of a player.
    PlayerId
);
uuid_newtype!(
    /// Identifier of an NPC entity in the host world.
    NpcId
);
uuid_newtype!(
    /// Identifier of a dialog, derived from its label.
    DialogId
);
uuid_newtype!(
    /// Identifier of a dialog button, derived from its label.
    ButtonId
);
uuid_newtype!(
    /// Identifier of a condition, derived from its field values.
    ConditionId
);
uuid_newtype!(
    /// Key under which executions are rate-limited.
    ///
    /// Actions use their own derived id; dialogs and buttons reuse their id.
    ActionId
);
uuid_newtype!(
    /// Identifier of a quest tracked by the host.
    QuestId
);
uuid_newtype!(
    /// Identifier of a world/save; execution history never crosses worlds.
    WorldId
);

impl PlayerId {
    /// Create a new random player ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl NpcId {
    /// Create a new random NPC ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NpcId {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldId {
    /// Create a new random world ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for WorldId {
    fn default() -> Self {
        Self::new()
    }
}

impl DialogId {
    /// Derive the id of the dialog with the given label.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        Self(derive_uuid(&format!("dialog:{label}")))
    }
}

impl ButtonId {
    /// Derive the id of the button with the given label.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        Self(derive_uuid(&format!("button:{label}")))
    }
}

impl From<DialogId> for ActionId {
    fn from(value: DialogId) -> Self {
        Self(value.0)
    }
}

impl From<ButtonId> for ActionId {
    fn from(value: ButtonId) -> Self {
        Self(value.0)
    }
}

/// Wall-clock milliseconds since the Unix epoch, as reported by a [`crate::clock::Clock`].
pub type Millis = u64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_ids_are_stable() {
        assert_eq!(DialogId::from_label("welcome"), DialogId::from_label("welcome"));
        assert_ne!(DialogId::from_label("welcome"), DialogId::from_label("goodbye"));
    }

    #[test]
    fn dialog_and_button_namespaces_differ() {
        assert_ne!(
            DialogId::from_label("main").0,
            ButtonId::from_label("main").0
        );
    }

    #[test]
    fn ids_serialize_transparently() {
        let id = PlayerId(Uuid::nil());
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "\"00000000-0000-0000-0000-000000000000\"");
    }
}
