//! Test fixtures and helpers.
//!
//! Loadouts and zones built from the data files in `assets/data`, for
//! consistent testing across crates.

use aetheria_core::components::{FactionId, SlotId};
use aetheria_core::context::SimulationContext;
use aetheria_core::data::{ItemId, SectorZone, ZoneId};
use aetheria_core::items::Gear;
use aetheria_core::math::Vec2Fixed;
use aetheria_core::pack::EntityPack;
use aetheria_core::zone::Zone;
use fixed::types::I32F32;

/// Item database shipped with the game.
pub const ITEMS_RON: &str = include_str!("../../../assets/data/items.ron");
/// Global tuning shipped with the game.
pub const GLOBAL_RON: &str = include_str!("../../../assets/data/global.ron");
/// Zone generation settings shipped with the game.
pub const ZONE_SETTINGS_RON: &str = include_str!("../../../assets/data/zone_settings.ron");

/// Ids defined in `assets/data/items.ron`.
pub mod ids {
    use aetheria_core::data::{BlueprintId, ItemId};

    /// Raw ore.
    pub const ORE: ItemId = ItemId::new(1);
    /// Alloy plate.
    pub const PLATE: ItemId = ItemId::new(2);
    /// Missile, launcher ammunition.
    pub const MISSILE: ItemId = ItemId::new(3);
    /// Ice.
    pub const ICE: ItemId = ItemId::new(4);

    /// Small ship hull.
    pub const SKIFF: ItemId = ItemId::new(100);
    /// Station hull with docking bays.
    pub const OUTPOST: ItemId = ItemId::new(101);
    /// Turret hull.
    pub const SENTRY: ItemId = ItemId::new(102);

    /// Reactor.
    pub const REACTOR: ItemId = ItemId::new(200);
    /// Thruster.
    pub const THRUSTER: ItemId = ItemId::new(201);
    /// Cockpit.
    pub const COCKPIT: ItemId = ItemId::new(202);
    /// Ballistic weapon.
    pub const AUTOCANNON: ItemId = ItemId::new(203);
    /// Shield.
    pub const DEFLECTOR: ItemId = ItemId::new(204);
    /// Radiator.
    pub const HEAT_SINK: ItemId = ItemId::new(205);
    /// Sensor.
    pub const SCANNER: ItemId = ItemId::new(206);
    /// Missile launcher.
    pub const MISSILE_RACK: ItemId = ItemId::new(207);
    /// Factory.
    pub const FABRICATOR: ItemId = ItemId::new(208);
    /// Beam weapon.
    pub const BEAM_LASER: ItemId = ItemId::new(209);

    /// Ore into alloy plates.
    pub const PLATES: BlueprintId = BlueprintId::new(1);
    /// Plates and ore into missiles.
    pub const MISSILES: BlueprintId = BlueprintId::new(2);
    /// Plates into an autocannon.
    pub const AUTOCANNON_BLUEPRINT: BlueprintId = BlueprintId::new(3);
}

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Position from integer coordinates.
#[must_use]
pub fn at(x: i32, y: i32) -> Vec2Fixed {
    Vec2Fixed::new(fixed(x), fixed(y))
}

/// Context with the shipped data.
///
/// # Panics
///
/// Panics if the shipped data does not parse.
#[must_use]
pub fn context() -> SimulationContext {
    SimulationContext::from_ron(ITEMS_RON, GLOBAL_RON, ZONE_SETTINGS_RON)
        .expect("shipped data files parse and validate")
}

/// Sector used by fixture zones.
#[must_use]
pub fn sector() -> SectorZone {
    SectorZone::new(ZoneId::new(1), "Fixture", (0.0, 0.0), 5000.0)
}

/// Pack with one piece of gear per hardpoint, in hardpoint order.
///
/// # Panics
///
/// Panics if a gear id is not gear.
#[must_use]
pub fn loadout(ctx: &SimulationContext, hull: ItemId, gear: &[ItemId]) -> EntityPack {
    let name = ctx
        .items
        .hull(hull)
        .map_or_else(|| "Fixture".to_string(), |h| h.name.clone());
    gear.iter()
        .enumerate()
        .fold(EntityPack::new(name, hull), |pack, (slot, id)| {
            let data = ctx.items.gear(*id).expect("fixture gear exists");
            pack.with_gear(SlotId::new(slot as u16), Gear::new(data))
        })
}

/// Fully equipped skiff.
#[must_use]
pub fn skiff(ctx: &SimulationContext, faction: FactionId, position: Vec2Fixed) -> EntityPack {
    loadout(
        ctx,
        ids::SKIFF,
        &[
            ids::REACTOR,
            ids::THRUSTER,
            ids::COCKPIT,
            ids::AUTOCANNON,
            ids::DEFLECTOR,
            ids::HEAT_SINK,
            ids::SCANNER,
            ids::MISSILE_RACK,
        ],
    )
    .with_faction(faction)
    .at(position)
}

/// Outpost with a fabricator in slot 1 and a beam laser in slot 2.
#[must_use]
pub fn outpost(ctx: &SimulationContext, faction: FactionId, position: Vec2Fixed) -> EntityPack {
    loadout(
        ctx,
        ids::OUTPOST,
        &[
            ids::REACTOR,
            ids::FABRICATOR,
            ids::BEAM_LASER,
            ids::DEFLECTOR,
            ids::COCKPIT,
            ids::SCANNER,
        ],
    )
    .with_faction(faction)
    .at(position)
}

/// Sentry turret with a beam laser in slot 1.
#[must_use]
pub fn sentry(ctx: &SimulationContext, faction: FactionId, position: Vec2Fixed) -> EntityPack {
    loadout(ctx, ids::SENTRY, &[ids::REACTOR, ids::BEAM_LASER, ids::SCANNER])
        .with_faction(faction)
        .at(position)
}

/// Two hostile squads facing each other: a sentry and two skiffs per
/// side, 400 units apart, every weapon switched on and targeting the
/// opposing sentry.
///
/// # Panics
///
/// Panics if the fixture loadouts do not unpack.
#[must_use]
pub fn skirmish(ctx: &SimulationContext) -> Zone {
    let mut zone = Zone::new(sector());
    let mut sides = Vec::new();
    for (faction, x) in [(FactionId::new(1), -200), (FactionId::new(2), 200)] {
        let mut squad = Vec::new();
        squad.push(zone.spawn(ctx, &sentry(ctx, faction, at(x, 0))).expect("sentry unpacks"));
        for y in [-40, 40] {
            squad.push(zone.spawn(ctx, &skiff(ctx, faction, at(x, y))).expect("skiff unpacks"));
        }
        sides.push(squad);
    }

    for (squad, enemies) in [(&sides[0], &sides[1]), (&sides[1], &sides[0])] {
        for &id in squad {
            zone.set_target(id, Some(enemies[0])).expect("enemy exists");
            let entity = zone.entity_mut(id).expect("spawned");
            for slot in 0..entity.slots().len() {
                let _ = entity.activate_slot(SlotId::new(slot as u16));
            }
        }
    }
    zone
}
