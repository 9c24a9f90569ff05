//! # Aetheria Core
//!
//! Deterministic simulation core for the Aetheria space RPG.
//!
//! Ships, turrets and orbital stations carry gear whose behaviors
//! (weapons, shields, thrusters, reactors, radiators, factories, cockpits,
//! sensors) change heat, energy, cargo and velocity every tick. Stats
//! resolve through modifier lists, and zones are generated from a seed.
//!
//! This crate contains **only** simulation logic:
//! - No rendering
//! - No file IO (data arrives as strings, state leaves as pack bytes)
//! - No system randomness (every RNG is seeded)
//!
//! Same inputs, same ticks, same state hash.
//!
//! ## Crate Structure
//!
//! - [`data`] - Item database, global tuning and generation settings
//! - [`stats`] - Performance stat evaluation
//! - [`behaviors`] - Gear behaviors and the per-tick accumulator
//! - [`entity`] - Entities and their update loop
//! - [`zone`] - Zones, commands and the tick pipeline
//! - [`generation`] - Procedural orbits, planets and asteroid belts
//! - [`pack`] - Persisted entity and zone state

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod behaviors;
pub mod components;
pub mod context;
pub mod data;
pub mod docking;
pub mod entity;
pub mod error;
pub mod events;
pub mod generation;
pub mod items;
pub mod loadout;
pub mod math;
pub mod orbit;
pub mod pack;
pub mod stats;
pub mod zone;

#[cfg(test)]
pub(crate) mod test_fixtures;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::behaviors::{Activatable, Behavior, FactoryState};
    pub use crate::components::*;
    pub use crate::context::SimulationContext;
    pub use crate::data::{
        BlueprintId, GlobalData, HardpointType, ItemDatabase, ItemId, SectorZone, ZoneId,
        ZoneSettings,
    };
    pub use crate::docking::DockRejection;
    pub use crate::entity::Entity;
    pub use crate::error::{CommandRejection, Result, SimError};
    pub use crate::events::{DamageEvent, EntityEvent, EventDispatcher, TickEvents};
    pub use crate::generation::{generate_zone, GeneratedZone, GenerationError};
    pub use crate::items::{CargoBay, Gear, ItemInstance};
    pub use crate::loadout::LoadoutGenerator;
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::orbit::{OrbitData, OrbitId, PlanetData, PlanetId};
    pub use crate::pack::{EntityPack, ZonePack};
    pub use crate::stats::PerformanceStat;
    pub use crate::zone::Zone;
}
