//! Gear behaviors.
//!
//! A piece of gear owns one [`Behavior`] per entry of its data's behavior
//! list. Behaviors are a closed set of variants; the only capability shared
//! through a trait is the activation toggle ([`Activatable`]).
//!
//! Behaviors never touch their entity's aggregate state directly. During the
//! behavior pass they write into a [`TickAccumulator`], which the entity
//! applies after every behavior has run. That keeps the outcome independent
//! of which behavior happens to read heat or energy first.

mod factory;
mod ship_systems;
mod weapon;

use std::collections::BTreeMap;

use crate::components::{EntityId, SlotId};
use crate::data::{BehaviorData, ItemDatabase};
use crate::events::EntityEvent;
use crate::items::{CargoBay, ItemInstance};
use crate::stats::{EntityCondition, ItemCondition};

pub use factory::{Factory, FactoryState};
pub use ship_systems::{Cockpit, Radiator, Reactor, Sensor, Shield, Thruster};
pub use weapon::{BeamWeapon, ProjectileWeapon, MIN_COOLDOWN, VISIBILITY_EPSILON};

/// Toggle for behaviors the player switches on and off.
///
/// Both calls are idempotent.
pub trait Activatable {
    /// Switch on.
    fn activate(&mut self);
    /// Switch off.
    fn deactivate(&mut self);
    /// Whether switched on.
    fn is_active(&self) -> bool;
}

/// The current target as seen from the updating entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetInfo {
    /// Target entity.
    pub id: EntityId,
    /// Distance at tick start.
    pub distance: f32,
}

/// Contributions collected during one entity's behavior pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickAccumulator {
    /// Heat added.
    pub heat: f32,
    /// Heat removed per second by radiators.
    pub dissipation: f32,
    energy_start: f32,
    energy_drawn: f32,
    energy_produced: f32,
    /// Velocity change as `(x, y)`.
    pub velocity: (f32, f32),
    /// Highest speed any running thruster can hold.
    pub speed_limit: Option<f32>,
    /// Visibility source updates: `Some` sets, `None` removes.
    pub visibility: BTreeMap<SlotId, Option<f32>>,
    /// Damage dealt to other entities, applied after every entity updated.
    pub hits: Vec<(EntityId, f32)>,
    /// Best sensor on the entity as `(sensitivity, range)`.
    pub sensor: Option<(f32, f32)>,
    /// `Some(powered)` when the entity has life support.
    pub life_support: Option<bool>,
    /// Cargo changed.
    pub inventory_changed: bool,
}

impl TickAccumulator {
    /// Start a pass with the entity's stored energy.
    #[must_use]
    pub fn new(energy: f32) -> Self {
        Self {
            energy_start: energy,
            ..Self::default()
        }
    }

    /// Energy still available to draw this tick.
    #[must_use]
    pub fn energy_available(&self) -> f32 {
        (self.energy_start + self.energy_produced - self.energy_drawn).max(0.0)
    }

    /// Draw energy if enough is available. Draws nothing otherwise.
    pub fn try_draw_energy(&mut self, amount: f32) -> bool {
        if amount <= 0.0 {
            return true;
        }
        if amount > self.energy_available() {
            return false;
        }
        self.energy_drawn += amount;
        true
    }

    /// Record energy produced.
    pub fn produce_energy(&mut self, amount: f32) {
        self.energy_produced += amount.max(0.0);
    }

    /// Net energy change of the pass.
    #[must_use]
    pub fn energy_delta(&self) -> f32 {
        self.energy_produced - self.energy_drawn
    }

    /// Add heat. Negative amounts are ignored; cooling goes through
    /// [`dissipation`](Self::dissipation).
    pub fn add_heat(&mut self, amount: f32) {
        self.heat += amount.max(0.0);
    }

    /// Set or clear this slot's visibility source.
    pub fn set_visibility(&mut self, slot: SlotId, value: Option<f32>) {
        self.visibility.insert(slot, value);
    }

    /// Keep the strongest sensor.
    pub fn report_sensor(&mut self, sensitivity: f32, range: f32) {
        let better = self.sensor.map_or(true, |(s, _)| sensitivity > s);
        if better {
            self.sensor = Some((sensitivity, range));
        }
    }
}

/// What a behavior sees while updating.
pub struct BehaviorContext<'a> {
    /// Item database.
    pub items: &'a ItemDatabase,
    /// Entity being updated.
    pub entity: EntityId,
    /// Slot of the gear being updated.
    pub slot: SlotId,
    /// Tick length in seconds.
    pub delta: f32,
    /// Gear condition.
    pub item: ItemCondition,
    /// Entity condition at tick start.
    pub condition: EntityCondition,
    /// Whether the entity is docked.
    pub docked: bool,
    /// Throttle as `(x, y)` with length at most one.
    pub movement: (f32, f32),
    /// Entity mass.
    pub mass: f32,
    /// Current target.
    pub target: Option<TargetInfo>,
    /// Entity cargo.
    pub cargo: &'a mut [CargoBay],
    /// Aggregated contributions.
    pub tick: &'a mut TickAccumulator,
    /// Events raised.
    pub events: &'a mut Vec<EntityEvent>,
}

impl BehaviorContext<'_> {
    /// Evaluate a stat of the gear being updated.
    #[must_use]
    pub fn eval(&self, stat: &crate::stats::PerformanceStat) -> f32 {
        stat.evaluate(&self.item, &self.condition)
    }
}

/// A live behavior instance.
#[derive(Debug, Clone, PartialEq)]
pub enum Behavior {
    /// Projectile or missile weapon.
    ProjectileWeapon(ProjectileWeapon),
    /// Beam weapon.
    BeamWeapon(BeamWeapon),
    /// Shield.
    Shield(Shield),
    /// Thruster.
    Thruster(Thruster),
    /// Reactor.
    Reactor(Reactor),
    /// Radiator.
    Radiator(Radiator),
    /// Factory.
    Factory(Factory),
    /// Cockpit.
    Cockpit(Cockpit),
    /// Sensor.
    Sensor(Sensor),
}

impl Behavior {
    /// Instantiate a behavior from its definition.
    #[must_use]
    pub fn from_data(data: &BehaviorData) -> Self {
        match data {
            BehaviorData::ProjectileWeapon(d) => Self::ProjectileWeapon(ProjectileWeapon::new(d.clone())),
            BehaviorData::BeamWeapon(d) => Self::BeamWeapon(BeamWeapon::new(d.clone())),
            BehaviorData::Shield(d) => Self::Shield(Shield::new(d.clone())),
            BehaviorData::Thruster(d) => Self::Thruster(Thruster::new(d.clone())),
            BehaviorData::Reactor(d) => Self::Reactor(Reactor::new(d.clone())),
            BehaviorData::Radiator(d) => Self::Radiator(Radiator::new(d.clone())),
            BehaviorData::Factory(d) => Self::Factory(Factory::new(d.clone())),
            BehaviorData::Cockpit(d) => Self::Cockpit(Cockpit::new(d.clone())),
            BehaviorData::Sensor(d) => Self::Sensor(Sensor::new(d.clone())),
        }
    }

    /// Called once when the gear is equipped.
    pub fn initialize(&mut self, item: &ItemCondition, entity: &EntityCondition) {
        if let Self::Shield(shield) = self {
            shield.initialize(item, entity);
        }
    }

    /// Advance one tick.
    pub fn update(&mut self, ctx: &mut BehaviorContext<'_>) {
        if ctx.docked && !self.runs_while_docked() {
            return;
        }
        match self {
            Self::ProjectileWeapon(b) => b.update(ctx),
            Self::BeamWeapon(b) => b.update(ctx),
            Self::Shield(b) => b.update(ctx),
            Self::Thruster(b) => b.update(ctx),
            Self::Reactor(b) => b.update(ctx),
            Self::Radiator(b) => b.update(ctx),
            Self::Factory(b) => b.update(ctx),
            Self::Cockpit(b) => b.update(ctx),
            Self::Sensor(b) => b.update(ctx),
        }
    }

    /// Called once when the gear is unequipped. Returns anything the
    /// behavior was holding that belongs back in cargo.
    pub fn remove(self) -> Option<ItemInstance> {
        match self {
            Self::Factory(factory) => factory.remove(),
            _ => None,
        }
    }

    /// Passive behaviors keep running while docked.
    #[must_use]
    pub const fn runs_while_docked(&self) -> bool {
        matches!(
            self,
            Self::Shield(_) | Self::Reactor(_) | Self::Radiator(_) | Self::Factory(_) | Self::Cockpit(_)
        )
    }

    /// Activation capability, if this behavior has one.
    pub fn as_activatable(&self) -> Option<&dyn Activatable> {
        match self {
            Self::ProjectileWeapon(b) => Some(b),
            Self::BeamWeapon(b) => Some(b),
            Self::Shield(b) => Some(b),
            Self::Radiator(b) => Some(b),
            _ => None,
        }
    }

    /// Mutable activation capability, if this behavior has one.
    pub fn as_activatable_mut(&mut self) -> Option<&mut dyn Activatable> {
        match self {
            Self::ProjectileWeapon(b) => Some(b),
            Self::BeamWeapon(b) => Some(b),
            Self::Shield(b) => Some(b),
            Self::Radiator(b) => Some(b),
            _ => None,
        }
    }

    /// Named stats evaluated for display.
    #[must_use]
    pub fn inspect(&self, item: &ItemCondition, entity: &EntityCondition) -> Vec<(&'static str, f32)> {
        let stats = match self {
            Self::ProjectileWeapon(b) => b.data().stats(),
            Self::BeamWeapon(b) => b.data().stats(),
            Self::Shield(b) => b.data().stats(),
            Self::Thruster(b) => b.data().stats(),
            Self::Reactor(b) => b.data().stats(),
            Self::Radiator(b) => b.data().stats(),
            Self::Factory(b) => b.data().stats(),
            Self::Cockpit(b) => b.data().stats(),
            Self::Sensor(b) => b.data().stats(),
        };
        stats
            .into_iter()
            .map(|(name, stat)| (name, stat.evaluate(item, entity)))
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Owned state a [`BehaviorContext`] borrows from.
    pub struct Harness {
        pub items: ItemDatabase,
        pub cargo: Vec<CargoBay>,
        /// Accumulator of the most recent step.
        pub tick: TickAccumulator,
        pub events: Vec<EntityEvent>,
        pub energy: f32,
        pub heat: f32,
        pub condition: EntityCondition,
        pub item: ItemCondition,
        pub target: Option<TargetInfo>,
        pub movement: (f32, f32),
        pub docked: bool,
    }

    impl Harness {
        pub fn new(energy: f32) -> Self {
            Self {
                items: ItemDatabase::new(),
                cargo: vec![CargoBay::new(100.0)],
                tick: TickAccumulator::new(energy),
                events: Vec::new(),
                energy,
                heat: 0.0,
                condition: EntityCondition {
                    energy_fraction: 1.0,
                    reactor_capacitance: Some(energy),
                    ..EntityCondition::default()
                },
                item: ItemCondition::default(),
                target: None,
                movement: (0.0, 0.0),
                docked: false,
            }
        }

        /// Run one update with a fresh accumulator, then fold its energy
        /// and heat back in the way the entity loop does.
        pub fn step(&mut self, behavior: &mut Behavior, delta: f32) {
            self.tick = TickAccumulator::new(self.energy);
            let mut ctx = BehaviorContext {
                items: &self.items,
                entity: 1,
                slot: SlotId::new(0),
                delta,
                item: self.item,
                condition: self.condition,
                docked: self.docked,
                movement: self.movement,
                mass: 100.0,
                target: self.target,
                cargo: &mut self.cargo,
                tick: &mut self.tick,
                events: &mut self.events,
            };
            behavior.update(&mut ctx);
            self.energy = (self.energy + self.tick.energy_delta()).max(0.0);
            self.heat += self.tick.heat;
        }

        pub fn shots(&self) -> usize {
            self.events
                .iter()
                .filter(|e| matches!(e, EntityEvent::WeaponFired { .. }))
                .count()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ReactorData, ThrusterData};
    use crate::stats::PerformanceStat;

    #[test]
    fn test_energy_draw_is_all_or_nothing() {
        let mut acc = TickAccumulator::new(10.0);
        assert!(acc.try_draw_energy(6.0));
        assert!(!acc.try_draw_energy(6.0));
        assert_eq!(acc.energy_available(), 4.0);
        acc.produce_energy(5.0);
        assert!(acc.try_draw_energy(6.0));
        assert_eq!(acc.energy_delta(), -7.0);
    }

    #[test]
    fn test_negative_heat_ignored() {
        let mut acc = TickAccumulator::new(0.0);
        acc.add_heat(-5.0);
        acc.add_heat(2.0);
        assert_eq!(acc.heat, 2.0);
    }

    #[test]
    fn test_only_passive_behaviors_run_docked() {
        let reactor = Behavior::from_data(&BehaviorData::Reactor(ReactorData::default()));
        let thruster = Behavior::from_data(&BehaviorData::Thruster(ThrusterData::default()));
        assert!(reactor.runs_while_docked());
        assert!(!thruster.runs_while_docked());
        assert!(reactor.as_activatable().is_none());
    }

    #[test]
    fn test_inspect_evaluates_stats() {
        let reactor = Behavior::from_data(&BehaviorData::Reactor(ReactorData {
            capacitance: PerformanceStat::constant(500.0),
            charge: PerformanceStat::constant(25.0),
            heat: PerformanceStat::constant(0.5),
        }));
        let stats = reactor.inspect(&ItemCondition::default(), &EntityCondition::default());
        assert_eq!(stats[0], ("Capacitance", 500.0));
        assert_eq!(stats[1], ("Charge", 25.0));
    }
}
