//! Shared fixtures for unit tests, built from the shipped data files.

use crate::components::SlotId;
use crate::context::SimulationContext;
use crate::entity::Entity;
use crate::items::Gear;
use crate::pack::EntityPack;

/// Ids from `assets/data/items.ron`.
pub mod ids {
    use crate::data::{BlueprintId, ItemId};

    pub const ORE: ItemId = ItemId::new(1);
    pub const PLATE: ItemId = ItemId::new(2);
    pub const MISSILE: ItemId = ItemId::new(3);

    pub const SKIFF: ItemId = ItemId::new(100);
    pub const OUTPOST: ItemId = ItemId::new(101);
    pub const SENTRY: ItemId = ItemId::new(102);

    pub const REACTOR: ItemId = ItemId::new(200);
    pub const THRUSTER: ItemId = ItemId::new(201);
    pub const COCKPIT: ItemId = ItemId::new(202);
    pub const AUTOCANNON: ItemId = ItemId::new(203);
    pub const DEFLECTOR: ItemId = ItemId::new(204);
    pub const HEAT_SINK: ItemId = ItemId::new(205);
    pub const SCANNER: ItemId = ItemId::new(206);
    pub const MISSILE_RACK: ItemId = ItemId::new(207);
    pub const FABRICATOR: ItemId = ItemId::new(208);
    pub const BEAM_LASER: ItemId = ItemId::new(209);

    pub const PLATES: BlueprintId = BlueprintId::new(1);
    pub const MISSILES: BlueprintId = BlueprintId::new(2);
}

pub fn context() -> SimulationContext {
    SimulationContext::from_ron(
        include_str!("../../../assets/data/items.ron"),
        include_str!("../../../assets/data/global.ron"),
        include_str!("../../../assets/data/zone_settings.ron"),
    )
    .expect("shipped data parses")
}

/// Pack for a hull with the given gear, one per hardpoint in order.
pub fn loadout(ctx: &SimulationContext, hull: crate::data::ItemId, gear: &[crate::data::ItemId]) -> EntityPack {
    gear.iter()
        .enumerate()
        .fold(EntityPack::new("Fixture", hull), |pack, (slot, id)| {
            let data = ctx.items.gear(*id).expect("fixture gear exists");
            pack.with_gear(SlotId::new(slot as u16), Gear::new(data))
        })
}

fn build(ctx: &SimulationContext, pack: &EntityPack) -> Entity {
    Entity::from_pack(&ctx.items, pack).expect("fixture loadout fits")
}

/// Fully equipped ship at the origin, energy full.
pub fn skiff(ctx: &SimulationContext) -> Entity {
    build(
        ctx,
        &loadout(
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
        ),
    )
}

/// Station with a fabricator and two docking bays.
pub fn outpost(ctx: &SimulationContext) -> Entity {
    build(
        ctx,
        &loadout(
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
        ),
    )
}

/// Turret with a beam laser.
pub fn sentry(ctx: &SimulationContext) -> Entity {
    build(
        ctx,
        &loadout(ctx, ids::SENTRY, &[ids::REACTOR, ids::BEAM_LASER, ids::SCANNER]),
    )
}
