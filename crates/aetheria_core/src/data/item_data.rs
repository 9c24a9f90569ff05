//! Item definitions: hulls, gear, commodities and blueprints.

use serde::{Deserialize, Serialize};

use super::behavior_data::BehaviorData;
use crate::components::{EntityKind, HardpointCoord};

/// Identifier of an item definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u32);

impl ItemId {
    /// Create a new item id.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

/// Identifier of a blueprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlueprintId(pub u32);

impl BlueprintId {
    /// Create a new blueprint id.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

/// Mounting type of a hardpoint. Gear fits only hardpoints of its type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HardpointType {
    /// Reactors.
    Reactor,
    /// Radiators.
    Radiator,
    /// Shield generators.
    Shield,
    /// Thrusters.
    Thruster,
    /// Cockpits and life support.
    Cockpit,
    /// Sensor suites.
    Sensors,
    /// Kinetic projectile weapons.
    Ballistic,
    /// Missile launchers.
    Launcher,
    /// Beam weapons.
    Energy,
    /// Fabricators and other tools.
    Tool,
}

impl std::fmt::Display for HardpointType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// A hardpoint declared by a hull.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hardpoint {
    /// Mounting type.
    pub kind: HardpointType,
    /// Grid coordinate, unique per hull.
    pub position: HardpointCoord,
}

/// Hull definition.
///
/// # Example RON
///
/// ```ron
/// Hull((
///     id: 1,
///     name: "Skiff",
///     mass: 100.0,
///     durability: 400.0,
///     heat_capacity: 50.0,
///     heat_dissipation: 2.0,
///     hardpoints: [
///         (kind: Reactor, position: (x: 0, y: 0)),
///         (kind: Thruster, position: (x: 0, y: 1)),
///     ],
///     cargo_bays: [40.0],
/// ))
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HullData {
    /// Unique identifier.
    pub id: ItemId,
    /// Display name.
    pub name: String,
    /// Empty mass.
    pub mass: f32,
    /// Cargo volume taken when stored.
    #[serde(default = "default_size")]
    pub size: f32,
    /// Maximum hull durability. The entity dies in combat at zero.
    pub durability: f32,
    /// Heat needed to raise temperature by one degree.
    pub heat_capacity: f32,
    /// Passive heat loss per second.
    #[serde(default)]
    pub heat_dissipation: f32,
    /// Baseline signature seen by sensors.
    #[serde(default = "default_visibility")]
    pub visibility: f32,
    /// What kind of entity this hull becomes.
    #[serde(default)]
    pub kind: EntityKind,
    /// Hardpoints in declaration order; behaviors update in this order.
    #[serde(default)]
    pub hardpoints: Vec<Hardpoint>,
    /// Capacity of each cargo bay.
    #[serde(default)]
    pub cargo_bays: Vec<f32>,
    /// Number of docking bays offered to other ships.
    #[serde(default)]
    pub docking_bays: u32,
    /// Capacity of the transfer bay attached to each docking bay.
    #[serde(default = "default_docking_bay_capacity")]
    pub docking_bay_capacity: f32,
}

const fn default_size() -> f32 {
    1.0
}

const fn default_visibility() -> f32 {
    1.0
}

const fn default_docking_bay_capacity() -> f32 {
    20.0
}

/// Equippable gear definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GearData {
    /// Unique identifier.
    pub id: ItemId,
    /// Display name.
    pub name: String,
    /// Mass added to the carrying entity.
    pub mass: f32,
    /// Cargo volume taken when stored.
    #[serde(default = "default_size")]
    pub size: f32,
    /// Maximum durability.
    pub durability: f32,
    /// Hardpoint type this gear mounts on.
    pub hardpoint: HardpointType,
    /// Behaviors instantiated when equipped, in order.
    #[serde(default)]
    pub behaviors: Vec<BehaviorData>,
}

/// Tradeable bulk good.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommodityData {
    /// Unique identifier.
    pub id: ItemId,
    /// Display name.
    pub name: String,
    /// Mass per unit.
    pub mass: f32,
    /// Cargo volume per unit.
    #[serde(default = "default_size")]
    pub size: f32,
}

/// Any item definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ItemData {
    /// Hull.
    Hull(HullData),
    /// Gear.
    Gear(GearData),
    /// Commodity.
    Commodity(CommodityData),
}

impl ItemData {
    /// Item id.
    #[must_use]
    pub const fn id(&self) -> ItemId {
        match self {
            Self::Hull(h) => h.id,
            Self::Gear(g) => g.id,
            Self::Commodity(c) => c.id,
        }
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Hull(h) => &h.name,
            Self::Gear(g) => &g.name,
            Self::Commodity(c) => &c.name,
        }
    }

    /// Mass of one unit.
    #[must_use]
    pub const fn mass(&self) -> f32 {
        match self {
            Self::Hull(h) => h.mass,
            Self::Gear(g) => g.mass,
            Self::Commodity(c) => c.mass,
        }
    }

    /// Cargo volume of one unit.
    #[must_use]
    pub const fn size(&self) -> f32 {
        match self {
            Self::Hull(h) => h.size,
            Self::Gear(g) => g.size,
            Self::Commodity(c) => c.size,
        }
    }

    /// Kind name used in error messages.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Hull(_) => "hull",
            Self::Gear(_) => "gear",
            Self::Commodity(_) => "commodity",
        }
    }
}

/// One input of a blueprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    /// Commodity consumed.
    pub item: ItemId,
    /// Units consumed per produced item.
    pub quantity: u32,
}

/// Recipe produced by a factory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlueprintData {
    /// Unique identifier.
    pub id: BlueprintId,
    /// Display name.
    pub name: String,
    /// Item produced.
    pub item: ItemId,
    /// Units produced per cycle (commodities only; gear is always one).
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    /// Gear id of the factory able to produce this blueprint.
    pub factory_item: ItemId,
    /// Inputs consumed at the start of each cycle.
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    /// Seconds per cycle at zero quality and unit factory speed.
    pub production_time: f32,
}

const fn default_quantity() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hull_ron_defaults() {
        let hull: HullData = ron::from_str(
            r#"(
                id: 1,
                name: "Skiff",
                mass: 100.0,
                durability: 400.0,
                heat_capacity: 50.0,
                hardpoints: [(kind: Reactor, position: (x: 0, y: 0))],
            )"#,
        )
        .expect("valid hull");

        assert_eq!(hull.id, ItemId::new(1));
        assert_eq!(hull.kind, EntityKind::Ship);
        assert_eq!(hull.docking_bays, 0);
        assert!(hull.cargo_bays.is_empty());
        assert_eq!(hull.hardpoints[0].kind, HardpointType::Reactor);
    }

    #[test]
    fn test_item_data_accessors() {
        let item = ItemData::Commodity(CommodityData {
            id: ItemId::new(7),
            name: "Ore".to_string(),
            mass: 2.0,
            size: 0.5,
        });
        assert_eq!(item.id(), ItemId::new(7));
        assert_eq!(item.name(), "Ore");
        assert_eq!(item.mass(), 2.0);
        assert_eq!(item.size(), 0.5);
        assert_eq!(item.kind_name(), "commodity");
    }
}
