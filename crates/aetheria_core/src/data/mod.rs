//! Static game data.
//!
//! Pure data structures describing hulls, gear, commodities, blueprints and
//! the global tuning tables. All of them deserialize from RON files; the
//! [`ItemDatabase`] indexes them by id and validates cross references.
//!
//! **Note:** This module reads strings, never files. File loading is handled
//! by `aetheria_tools`.

mod behavior_data;
mod database;
mod global_data;
mod item_data;
mod zone_settings;

pub use behavior_data::{
    BeamWeaponData, BehaviorData, CockpitData, FactoryData, ProjectileKind, ProjectileWeaponData,
    RadiatorData, ReactorData, SensorData, ShieldData, ThrusterData,
};
pub use database::ItemDatabase;
pub use global_data::GlobalData;
pub use item_data::{
    BlueprintData, BlueprintId, CommodityData, GearData, Hardpoint, HardpointType, HullData,
    Ingredient, ItemData, ItemId,
};
pub use zone_settings::{
    FloatRange, PlanetClass, ResourceDistribution, SectorZone, ZoneId, ZoneSettings,
};
