//! Random loadouts for spawned ships, turrets and stations.
//!
//! The generator fills every hardpoint of a hull with a random piece of
//! gear that fits it, wears the gear down a little, and stocks launchers
//! with ammunition. Output is an [`EntityPack`] that the zone unpacks like
//! any saved entity. Same seed and database, same loadouts.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::components::{EntityKind, FactionId, SlotId};
use crate::data::{BehaviorData, GearData, HullData, ItemDatabase, ItemId, ProjectileKind};
use crate::error::Result;
use crate::items::{store_in, CargoBay, Gear, ItemInstance};
use crate::pack::EntityPack;

/// Units of ammunition stocked per launcher.
pub const AMMO_PER_LAUNCHER: u32 = 10;

/// Builds random loadouts from an item database.
#[derive(Debug, Clone)]
pub struct LoadoutGenerator<'a> {
    items: &'a ItemDatabase,
    rng: ChaCha8Rng,
    faction: FactionId,
    min_wear: f32,
}

impl<'a> LoadoutGenerator<'a> {
    /// Create a generator with its own seeded RNG.
    #[must_use]
    pub fn new(items: &'a ItemDatabase, seed: u64) -> Self {
        Self {
            items,
            rng: ChaCha8Rng::seed_from_u64(seed),
            faction: FactionId::default(),
            min_wear: 0.75,
        }
    }

    /// Faction assigned to generated entities.
    #[must_use]
    pub const fn with_faction(mut self, faction: FactionId) -> Self {
        self.faction = faction;
        self
    }

    /// Lowest starting durability fraction of generated gear.
    #[must_use]
    pub fn with_min_wear(mut self, min_wear: f32) -> Self {
        self.min_wear = min_wear.clamp(0.0, 1.0);
        self
    }

    /// Random ship whose hull passes `filter`.
    pub fn ship(&mut self, filter: impl Fn(&HullData) -> bool) -> Option<EntityPack> {
        self.random_hull(EntityKind::Ship, filter)
    }

    /// Random turret.
    pub fn turret(&mut self) -> Option<EntityPack> {
        self.random_hull(EntityKind::Turret, |_| true)
    }

    /// Loadout for a specific hull.
    ///
    /// # Errors
    ///
    /// Returns an error if the id does not name a hull.
    pub fn for_hull(&mut self, hull: ItemId) -> Result<EntityPack> {
        let hull = self.items.require_hull(hull)?;
        Ok(self.generate(hull))
    }

    fn random_hull(&mut self, kind: EntityKind, filter: impl Fn(&HullData) -> bool) -> Option<EntityPack> {
        let items = self.items;
        let hulls: Vec<&HullData> = items
            .hulls()
            .filter(|h| h.kind == kind && filter(h))
            .collect();
        let hull = *hulls.choose(&mut self.rng)?;
        Some(self.generate(hull))
    }

    /// Fill every hardpoint of `hull`. Hardpoints no gear fits stay empty.
    pub fn generate(&mut self, hull: &HullData) -> EntityPack {
        let items = self.items;
        let mut pack = EntityPack::new(hull.name.clone(), hull.id).with_faction(self.faction);
        let mut cargo: Vec<CargoBay> = hull.cargo_bays.iter().map(|&c| CargoBay::new(c)).collect();
        let mut stocked = false;

        for (index, hardpoint) in hull.hardpoints.iter().enumerate() {
            let candidates: Vec<&GearData> = items
                .gears()
                .filter(|g| g.hardpoint == hardpoint.kind)
                .collect();
            let Some(&data) = candidates.choose(&mut self.rng) else {
                continue;
            };
            let wear = self.rng.gen_range(self.min_wear..=1.0);
            pack = pack.with_gear(
                SlotId::new(index as u16),
                Gear::new(data).with_durability(data.durability * wear),
            );

            for ammo in launcher_ammo(data) {
                let stack = ItemInstance::Commodity {
                    item: ammo,
                    quantity: AMMO_PER_LAUNCHER,
                };
                match store_in(&mut cargo, stack, items) {
                    Ok(()) => stocked = true,
                    Err(_) => {
                        tracing::debug!(hull = hull.id.0, ammo = ammo.0, "No room for launcher ammunition");
                    }
                }
            }
        }

        if stocked {
            pack.cargo = cargo;
        }
        pack
    }
}

fn launcher_ammo(data: &GearData) -> impl Iterator<Item = ItemId> + '_ {
    data.behaviors.iter().filter_map(|b| match b {
        BehaviorData::ProjectileWeapon(w) if w.kind == ProjectileKind::Launcher => w.ammo,
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Entity;
    use crate::test_fixtures::{self, ids};

    #[test]
    fn test_same_seed_same_loadout() {
        let ctx = test_fixtures::context();
        let a = LoadoutGenerator::new(&ctx.items, 9).ship(|_| true);
        let b = LoadoutGenerator::new(&ctx.items, 9).ship(|_| true);
        assert!(a.is_some());
        assert_eq!(a, b);
    }

    #[test]
    fn test_ship_loadout_unpacks() {
        let ctx = test_fixtures::context();
        let mut generator = LoadoutGenerator::new(&ctx.items, 3).with_faction(FactionId::new(4));
        let pack = generator.ship(|h| h.name == "Skiff").expect("skiff exists");
        assert_eq!(pack.hull, ids::SKIFF);
        assert_eq!(pack.faction, FactionId::new(4));
        assert_eq!(pack.gear.len(), 8);

        let ship = Entity::from_pack(&ctx.items, &pack).expect("generated loadout fits");
        assert_eq!(ship.cargo()[0].count(ids::MISSILE), AMMO_PER_LAUNCHER);
        for gear in &pack.gear {
            assert!(gear.gear.durability >= gear.gear.max_durability * 0.75);
        }
    }

    #[test]
    fn test_turret_and_station() {
        let ctx = test_fixtures::context();
        let mut generator = LoadoutGenerator::new(&ctx.items, 1);
        let turret = generator.turret().expect("sentry exists");
        assert_eq!(turret.hull, ids::SENTRY);
        let station = generator.for_hull(ids::OUTPOST).expect("outpost is a hull");
        assert_eq!(station.gear.len(), 6);
        assert!(generator.for_hull(ids::ORE).is_err());
        assert!(generator.ship(|_| false).is_none());
    }
}
