//! Identifiers and small value types shared across the simulation.

use serde::{Deserialize, Serialize};

/// Unique identifier for entities within a zone.
///
/// Assigned by the zone's entity storage and never reused there.
pub type EntityId = u64;

/// Index of a hardpoint in its hull's declaration order.
///
/// Behaviors are updated in ascending slot order, which makes the order of
/// heat and energy contributions reproducible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotId(pub u16);

impl SlotId {
    /// Create a new slot id.
    #[must_use]
    pub const fn new(index: u16) -> Self {
        Self(index)
    }

    /// Slot index as `usize`.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Owning faction of an entity. Entities of different factions are hostile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct FactionId(pub u32);

impl FactionId {
    /// Create a new faction id.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Whether two factions are hostile to each other.
    #[must_use]
    pub fn is_hostile_to(self, other: Self) -> bool {
        self != other
    }
}

/// Grid coordinate of a hardpoint on a hull.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct HardpointCoord {
    /// Column.
    pub x: i8,
    /// Row.
    pub y: i8,
}

impl HardpointCoord {
    /// Create a new coordinate.
    #[must_use]
    pub const fn new(x: i8, y: i8) -> Self {
        Self { x, y }
    }
}

/// What kind of simulated object an entity is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EntityKind {
    /// Free-flying ship: integrates its own velocity.
    #[default]
    Ship,
    /// Fixed emplacement: never moves on its own.
    Turret,
    /// Station bound to an orbit: follows the orbit position.
    Orbital,
}

impl EntityKind {
    /// Whether the entity integrates its own velocity.
    #[must_use]
    pub const fn is_mobile(self) -> bool {
        matches!(self, Self::Ship)
    }
}

/// Why an entity died.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CauseOfDeath {
    /// Hull durability reached zero.
    Combat,
    /// Temperature stayed above the lethal limit for too long.
    Heatstroke,
    /// Life support stayed unpowered for too long.
    Hypothermia,
}

impl std::fmt::Display for CauseOfDeath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Combat => write!(f, "destroyed in combat"),
            Self::Heatstroke => write!(f, "heatstroke"),
            Self::Hypothermia => write!(f, "hypothermia"),
        }
    }
}
