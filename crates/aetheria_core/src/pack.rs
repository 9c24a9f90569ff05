//! Serialized entity and zone state.
//!
//! A pack is the persisted form of simulation state: enough to rebuild an
//! entity (hull, gear per hardpoint, cargo, kinematics, heat, energy,
//! docked children) or a whole zone. Packs are plain serde structs; the byte
//! format is bincode, like the replay files of the simulation.
//!
//! Runtime-only state does not survive a pack: weapon cooldowns, shield
//! charge, factory progress, exposure and detection results restart from
//! their defaults on unpack.

use serde::{Deserialize, Serialize};

use crate::components::{FactionId, SlotId};
use crate::data::{BlueprintId, ItemId, SectorZone};
use crate::error::{Result, SimError};
use crate::items::{CargoBay, Gear};
use crate::math::Vec2Fixed;
use crate::orbit::{OrbitData, OrbitId, PlanetData};

/// Bumped whenever the pack layout changes.
pub const PACK_VERSION: u32 = 1;

/// Persisted factory configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorySettings {
    /// Selected blueprint.
    pub blueprint: Option<BlueprintId>,
    /// Production quality, `0..=1`.
    pub quality: f32,
}

/// Gear mounted on one hardpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GearPack {
    /// Hardpoint index.
    pub slot: SlotId,
    /// Item instance.
    pub gear: Gear,
    /// Factory settings, for factory gear.
    pub factory: Option<FactorySettings>,
}

/// One entity and the entities docked with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityPack {
    /// Display name.
    pub name: String,
    /// Hull item.
    pub hull: ItemId,
    /// Owning faction.
    pub faction: FactionId,
    /// Position.
    pub position: Vec2Fixed,
    /// Velocity.
    pub velocity: Vec2Fixed,
    /// Facing in radians.
    pub direction: f32,
    /// Heat.
    pub heat: f32,
    /// Stored energy. `None` starts full.
    pub energy: Option<f32>,
    /// Hull durability. `None` starts undamaged.
    pub hull_durability: Option<f32>,
    /// Mounted gear.
    pub gear: Vec<GearPack>,
    /// Cargo bays. Empty means the hull's empty bays.
    pub cargo: Vec<CargoBay>,
    /// Docking bay transfer holds. Empty means the hull's empty bays.
    pub docking_bays: Vec<CargoBay>,
    /// Orbit the entity follows.
    pub orbit: Option<OrbitId>,
    /// Whether the entity updates.
    pub active: bool,
    /// Entities docked with this one.
    pub children: Vec<EntityPack>,
}

impl EntityPack {
    /// An empty hull at the origin.
    #[must_use]
    pub fn new(name: impl Into<String>, hull: ItemId) -> Self {
        Self {
            name: name.into(),
            hull,
            faction: FactionId::default(),
            position: Vec2Fixed::ZERO,
            velocity: Vec2Fixed::ZERO,
            direction: 0.0,
            heat: 0.0,
            energy: None,
            hull_durability: None,
            gear: Vec::new(),
            cargo: Vec::new(),
            docking_bays: Vec::new(),
            orbit: None,
            active: true,
            children: Vec::new(),
        }
    }

    /// Mount gear on a slot.
    #[must_use]
    pub fn with_gear(mut self, slot: SlotId, gear: Gear) -> Self {
        self.gear.push(GearPack {
            slot,
            gear,
            factory: None,
        });
        self
    }

    /// Set the faction.
    #[must_use]
    pub const fn with_faction(mut self, faction: FactionId) -> Self {
        self.faction = faction;
        self
    }

    /// Set the position.
    #[must_use]
    pub const fn at(mut self, position: Vec2Fixed) -> Self {
        self.position = position;
        self
    }

    /// This entity plus every nested child.
    #[must_use]
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Self::count).sum::<usize>()
    }

    /// Encode with bincode.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Pack`] if encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        encode(self)
    }

    /// Decode from bincode.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Pack`] if the bytes are not a valid pack.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        decode(bytes)
    }
}

/// A whole zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZonePack {
    /// Layout version, [`PACK_VERSION`] when written.
    pub version: u32,
    /// Sector the zone belongs to.
    pub sector: SectorZone,
    /// Simulation time in seconds.
    pub time: f64,
    /// Tick counter.
    pub tick: u64,
    /// Orbit tree.
    pub orbits: Vec<OrbitData>,
    /// Planets.
    pub planets: Vec<PlanetData>,
    /// Top-level entities; docked entities nest inside their hosts.
    pub entities: Vec<EntityPack>,
}

impl ZonePack {
    /// Encode with bincode.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Pack`] if encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        encode(self)
    }

    /// Decode from bincode.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Pack`] if the bytes are not a valid pack or
    /// were written by a different layout version.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let pack: Self = decode(bytes)?;
        if pack.version != PACK_VERSION {
            return Err(SimError::Pack(format!(
                "Unsupported zone pack version {} (expected {PACK_VERSION})",
                pack.version
            )));
        }
        Ok(pack)
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    bincode::serialize(value).map_err(|e| SimError::Pack(format!("Failed to encode pack: {e}")))
}

fn decode<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> Result<T> {
    bincode::deserialize(bytes).map_err(|e| SimError::Pack(format!("Failed to decode pack: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ZoneId;

    #[test]
    fn test_entity_pack_bytes() {
        let mut pack = EntityPack::new("Skiff", ItemId::new(100))
            .with_faction(FactionId::new(2))
            .at(Vec2Fixed::from_f32(1.5, -2.25));
        pack.children.push(EntityPack::new("Tender", ItemId::new(100)));
        let bytes = pack.to_bytes().expect("encodes");
        assert_eq!(EntityPack::from_bytes(&bytes).expect("decodes"), pack);
        assert_eq!(pack.count(), 2);
    }

    #[test]
    fn test_garbage_is_rejected() {
        let result = EntityPack::from_bytes(&[0xff, 0x01]);
        assert!(matches!(result, Err(SimError::Pack(_))));
    }

    #[test]
    fn test_zone_pack_version_checked() {
        let pack = ZonePack {
            version: PACK_VERSION + 1,
            sector: SectorZone::new(ZoneId::new(1), "Test", (0.0, 0.0), 1000.0),
            time: 0.0,
            tick: 0,
            orbits: vec![OrbitData::root(OrbitId::new(0))],
            planets: Vec::new(),
            entities: Vec::new(),
        };
        let bytes = pack.to_bytes().expect("encodes");
        assert!(matches!(ZonePack::from_bytes(&bytes), Err(SimError::Pack(_))));
    }
}
