//! Weapon behaviors.
//!
//! # Projectile weapons
//!
//! A projectile weapon is driven by a normalized cooldown (1 = a full
//! cooldown left, 0 = ready) and a nested burst:
//!
//! ```text
//! Idle ──activate──▶ Firing ──deactivate──▶ Idle
//!                      │
//!          cooldown hits zero, no burst running
//!                      ▼
//!     BurstIdle ──▶ BurstFiring(N) ──last shot──▶ BurstIdle
//! ```
//!
//! When the cooldown reaches zero while firing, the weapon snapshots its
//! burst count and burst time, fires the first shot at once and the rest at
//! `burst_time / burst_count` intervals. Deactivating lets a running burst
//! finish but starts no new one.
//!
//! Every shot adds to a firing signature that decays exponentially; once it
//! drops below [`VISIBILITY_EPSILON`] the weapon stops being a visibility
//! source of its entity.

use crate::data::{BeamWeaponData, ProjectileKind, ProjectileWeaponData};
use crate::events::EntityEvent;
use crate::items::count_in;

use super::{Activatable, BehaviorContext};

/// Shortest cooldown or burst interval, in seconds.
pub const MIN_COOLDOWN: f32 = 0.01;

/// Most shots a single burst can hold.
pub const MAX_BURST: u32 = 64;

/// Signature below which a weapon stops being a visibility source.
pub const VISIBILITY_EPSILON: f32 = 0.01;

/// Cooldown and burst driven weapon.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectileWeapon {
    data: ProjectileWeaponData,
    firing: bool,
    cooldown: f32,
    burst_remaining: u32,
    burst_timer: f32,
    burst_interval: f32,
    visibility: f32,
}

impl ProjectileWeapon {
    /// Create an idle weapon, ready to fire.
    #[must_use]
    pub fn new(data: ProjectileWeaponData) -> Self {
        Self {
            data,
            firing: false,
            cooldown: 0.0,
            burst_remaining: 0,
            burst_timer: 0.0,
            burst_interval: 0.0,
            visibility: 0.0,
        }
    }

    /// Weapon definition.
    #[must_use]
    pub const fn data(&self) -> &ProjectileWeaponData {
        &self.data
    }

    /// Normalized cooldown.
    #[must_use]
    pub const fn cooldown(&self) -> f32 {
        self.cooldown
    }

    /// Shots left in the running burst.
    #[must_use]
    pub const fn burst_remaining(&self) -> u32 {
        self.burst_remaining
    }

    /// Current firing signature.
    #[must_use]
    pub const fn visibility(&self) -> f32 {
        self.visibility
    }

    pub(super) fn update(&mut self, ctx: &mut BehaviorContext<'_>) {
        let cooldown_time = ctx.eval(&self.data.cooldown).max(MIN_COOLDOWN);
        self.cooldown -= ctx.delta / cooldown_time;

        if self.burst_remaining == 0 {
            if self.firing && self.cooldown <= 0.0 {
                self.cooldown = (self.cooldown + 1.0).max(0.0);
                let count = ctx
                    .eval(&self.data.burst_count)
                    .round()
                    .clamp(1.0, MAX_BURST as f32) as u32;
                let burst_time = ctx.eval(&self.data.burst_time).max(0.0);
                self.burst_remaining = count;
                self.burst_interval = burst_time / count as f32;
                self.burst_timer = 1.0;
                self.fire(ctx);
                if self.burst_interval < MIN_COOLDOWN {
                    while self.burst_remaining > 0 {
                        self.fire(ctx);
                    }
                }
            } else if self.cooldown < 0.0 {
                self.cooldown = 0.0;
            }
        } else {
            self.burst_timer -= ctx.delta / self.burst_interval.max(MIN_COOLDOWN);
            while self.burst_remaining > 0 && self.burst_timer <= 0.0 {
                self.fire(ctx);
                self.burst_timer += 1.0;
            }
        }

        if self.visibility > 0.0 {
            let decay = ctx.eval(&self.data.visibility_decay).clamp(0.0, 1.0);
            self.visibility *= decay.powf(ctx.delta);
            if self.visibility < VISIBILITY_EPSILON {
                self.visibility = 0.0;
                ctx.tick.set_visibility(ctx.slot, None);
            } else {
                ctx.tick.set_visibility(ctx.slot, Some(self.visibility));
            }
        }
    }

    fn fire(&mut self, ctx: &mut BehaviorContext<'_>) {
        self.burst_remaining = self.burst_remaining.saturating_sub(1);

        let ammo = match (self.data.kind, self.data.ammo) {
            (ProjectileKind::Launcher, Some(ammo)) => {
                if count_in(ctx.cargo, ammo) == 0 {
                    return;
                }
                Some(ammo)
            }
            _ => None,
        };
        let energy = ctx.eval(&self.data.energy);
        if !ctx.tick.try_draw_energy(energy) {
            return;
        }
        if let Some(ammo) = ammo {
            for bay in ctx.cargo.iter_mut() {
                if bay.remove_commodity(ammo, 1) == 1 {
                    break;
                }
            }
            ctx.tick.inventory_changed = true;
        }

        self.visibility += ctx.eval(&self.data.visibility).max(0.0);
        let heat = ctx.eval(&self.data.heat);
        ctx.tick.add_heat(heat);
        let event = EntityEvent::WeaponFired {
            entity: ctx.entity,
            slot: ctx.slot,
            target: ctx.target.map(|t| t.id),
            damage: ctx.eval(&self.data.damage),
            velocity: ctx.eval(&self.data.velocity),
            spread: ctx.eval(&self.data.spread),
            range: ctx.eval(&self.data.range),
        };
        ctx.events.push(event);
    }
}

impl Activatable for ProjectileWeapon {
    fn activate(&mut self) {
        self.firing = true;
    }

    fn deactivate(&mut self) {
        self.firing = false;
    }

    fn is_active(&self) -> bool {
        self.firing
    }
}

/// Continuous weapon that damages its target every tick while in range.
#[derive(Debug, Clone, PartialEq)]
pub struct BeamWeapon {
    data: BeamWeaponData,
    firing: bool,
    engaged: bool,
}

impl BeamWeapon {
    /// Create an idle beam.
    #[must_use]
    pub fn new(data: BeamWeaponData) -> Self {
        Self {
            data,
            firing: false,
            engaged: false,
        }
    }

    /// Beam definition.
    #[must_use]
    pub const fn data(&self) -> &BeamWeaponData {
        &self.data
    }

    /// Whether the beam hit something last tick.
    #[must_use]
    pub const fn is_engaged(&self) -> bool {
        self.engaged
    }

    pub(super) fn update(&mut self, ctx: &mut BehaviorContext<'_>) {
        let hit = self.firing && self.try_hit(ctx);
        if hit {
            let visibility = ctx.eval(&self.data.visibility).max(0.0);
            ctx.tick.set_visibility(ctx.slot, Some(visibility));
        } else if self.engaged {
            ctx.tick.set_visibility(ctx.slot, None);
        }
        self.engaged = hit;
    }

    fn try_hit(&self, ctx: &mut BehaviorContext<'_>) -> bool {
        let Some(target) = ctx.target else {
            return false;
        };
        if target.distance > ctx.eval(&self.data.range) {
            return false;
        }
        let energy = ctx.eval(&self.data.energy) * ctx.delta;
        if !ctx.tick.try_draw_energy(energy) {
            return false;
        }
        let heat = ctx.eval(&self.data.heat) * ctx.delta;
        let damage = ctx.eval(&self.data.damage).max(0.0) * ctx.delta;
        ctx.tick.add_heat(heat);
        ctx.tick.hits.push((target.id, damage));
        true
    }
}

impl Activatable for BeamWeapon {
    fn activate(&mut self) {
        self.firing = true;
    }

    fn deactivate(&mut self) {
        self.firing = false;
    }

    fn is_active(&self) -> bool {
        self.firing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behaviors::test_support::Harness;
    use crate::behaviors::{Behavior, TargetInfo};
    use crate::components::SlotId;
    use crate::data::{CommodityData, ItemData, ItemId};
    use crate::items::ItemInstance;
    use crate::stats::PerformanceStat;

    fn cannon(cooldown: f32, burst_count: f32, burst_time: f32) -> ProjectileWeaponData {
        ProjectileWeaponData {
            damage: PerformanceStat::constant(10.0),
            range: PerformanceStat::constant(300.0),
            heat: PerformanceStat::constant(2.0),
            visibility: PerformanceStat::constant(1.0),
            visibility_decay: PerformanceStat::constant(0.1),
            cooldown: PerformanceStat::constant(cooldown),
            burst_count: PerformanceStat::constant(burst_count),
            burst_time: PerformanceStat::constant(burst_time),
            ..ProjectileWeaponData::default()
        }
    }

    fn armed(data: ProjectileWeaponData) -> Behavior {
        let mut behavior = Behavior::ProjectileWeapon(ProjectileWeapon::new(data));
        behavior
            .as_activatable_mut()
            .expect("weapons are activatable")
            .activate();
        behavior
    }

    #[test]
    fn test_fires_once_per_cooldown() {
        let mut harness = Harness::new(100.0);
        let mut weapon = armed(cannon(1.0, 1.0, 0.0));
        for _ in 0..100 {
            harness.step(&mut weapon, 0.1);
        }
        let shots = harness.shots();
        assert!((9..=11).contains(&shots), "fired {shots} times in 10 s");
    }

    #[test]
    fn test_idle_weapon_never_fires() {
        let mut harness = Harness::new(100.0);
        let mut weapon = Behavior::ProjectileWeapon(ProjectileWeapon::new(cannon(1.0, 1.0, 0.0)));
        for _ in 0..50 {
            harness.step(&mut weapon, 0.1);
        }
        assert_eq!(harness.shots(), 0);
    }

    #[test]
    fn test_burst_spreads_shots() {
        let mut harness = Harness::new(100.0);
        let mut weapon = armed(cannon(10.0, 3.0, 0.3));

        harness.step(&mut weapon, 0.05);
        assert_eq!(harness.shots(), 1, "first shot is immediate");

        for _ in 0..8 {
            harness.step(&mut weapon, 0.05);
        }
        assert_eq!(harness.shots(), 3);

        for _ in 0..20 {
            harness.step(&mut weapon, 0.05);
        }
        assert_eq!(harness.shots(), 3, "cooldown blocks the next burst");
    }

    #[test]
    fn test_zero_burst_time_fires_all_at_once() {
        let mut harness = Harness::new(100.0);
        let mut weapon = armed(cannon(5.0, 4.0, 0.0));
        harness.step(&mut weapon, 0.1);
        assert_eq!(harness.shots(), 4);
        assert!((harness.heat - 8.0).abs() < 1e-4);
    }

    #[test]
    fn test_burst_count_is_capped() {
        let mut harness = Harness::new(100.0);
        let mut weapon = armed(cannon(5.0, 1.0e12, 0.0));
        harness.step(&mut weapon, 0.1);
        assert_eq!(harness.shots(), MAX_BURST as usize);
    }

    #[test]
    fn test_deactivate_finishes_burst() {
        let mut harness = Harness::new(100.0);
        let mut weapon = armed(cannon(0.5, 3.0, 0.3));
        harness.step(&mut weapon, 0.05);
        weapon
            .as_activatable_mut()
            .expect("activatable")
            .deactivate();
        for _ in 0..40 {
            harness.step(&mut weapon, 0.05);
        }
        assert_eq!(harness.shots(), 3);
    }

    #[test]
    fn test_activation_is_idempotent() {
        let mut weapon = ProjectileWeapon::new(cannon(1.0, 1.0, 0.0));
        weapon.activate();
        weapon.activate();
        assert!(weapon.is_active());
        weapon.deactivate();
        weapon.deactivate();
        assert!(!weapon.is_active());
    }

    #[test]
    fn test_visibility_decays_and_source_is_removed() {
        let mut harness = Harness::new(100.0);
        let mut weapon = armed(cannon(100.0, 1.0, 0.0));
        harness.step(&mut weapon, 0.1);
        assert!(matches!(
            harness.tick.visibility.get(&SlotId::new(0)),
            Some(Some(v)) if *v > 0.5
        ));

        weapon
            .as_activatable_mut()
            .expect("activatable")
            .deactivate();
        let mut removed = false;
        for _ in 0..40 {
            harness.step(&mut weapon, 0.1);
            if harness.tick.visibility.get(&SlotId::new(0)) == Some(&None) {
                removed = true;
            }
        }
        assert!(removed);
        match &weapon {
            Behavior::ProjectileWeapon(w) => assert_eq!(w.visibility(), 0.0),
            other => panic!("unexpected behavior {other:?}"),
        }
    }

    #[test]
    fn test_shot_fizzles_without_energy() {
        let mut harness = Harness::new(5.0);
        let mut data = cannon(1.0, 1.0, 0.0);
        data.energy = PerformanceStat::constant(10.0);
        let mut weapon = armed(data);
        harness.step(&mut weapon, 0.1);
        assert_eq!(harness.shots(), 0);
        assert_eq!(harness.heat, 0.0);
    }

    #[test]
    fn test_launcher_consumes_ammo() {
        let mut harness = Harness::new(100.0);
        let missile = ItemId::new(50);
        harness
            .items
            .register_item(ItemData::Commodity(CommodityData {
                id: missile,
                name: "Missile".to_string(),
                mass: 1.0,
                size: 1.0,
            }))
            .expect("unique");
        let stock = ItemInstance::Commodity {
            item: missile,
            quantity: 2,
        };
        harness.cargo[0]
            .try_store(stock, &harness.items)
            .expect("fits");

        let mut data = cannon(0.1, 1.0, 0.0);
        data.kind = ProjectileKind::Launcher;
        data.ammo = Some(missile);
        let mut launcher = armed(data);
        for _ in 0..20 {
            harness.step(&mut launcher, 0.1);
        }
        assert_eq!(harness.shots(), 2);
        assert_eq!(count_in(&harness.cargo, missile), 0);
    }

    #[test]
    fn test_beam_hits_only_in_range() {
        let data = BeamWeaponData {
            damage: PerformanceStat::constant(20.0),
            range: PerformanceStat::constant(100.0),
            energy: PerformanceStat::constant(5.0),
            heat: PerformanceStat::constant(3.0),
            visibility: PerformanceStat::constant(2.0),
        };
        let mut harness = Harness::new(100.0);
        let mut beam = Behavior::BeamWeapon(BeamWeapon::new(data));
        beam.as_activatable_mut().expect("activatable").activate();

        harness.target = Some(TargetInfo {
            id: 9,
            distance: 50.0,
        });
        harness.step(&mut beam, 0.5);
        assert_eq!(harness.tick.hits, vec![(9, 10.0)]);
        assert!((harness.heat - 1.5).abs() < 1e-5);

        harness.target = Some(TargetInfo {
            id: 9,
            distance: 150.0,
        });
        harness.step(&mut beam, 0.5);
        assert!(harness.tick.hits.is_empty());
        assert_eq!(harness.tick.visibility.get(&SlotId::new(0)), Some(&None));
    }
}
