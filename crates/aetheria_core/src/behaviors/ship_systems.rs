//! Shields, thrusters, reactors, radiators, cockpits and sensors.

use crate::data::{CockpitData, RadiatorData, ReactorData, SensorData, ShieldData, ThrusterData};
use crate::stats::{EntityCondition, ItemCondition};

use super::{Activatable, BehaviorContext};

/// Damage absorbing shield. Raised by default.
#[derive(Debug, Clone, PartialEq)]
pub struct Shield {
    data: ShieldData,
    raised: bool,
    charge: f32,
}

impl Shield {
    /// Create a raised, empty shield.
    #[must_use]
    pub fn new(data: ShieldData) -> Self {
        Self {
            data,
            raised: true,
            charge: 0.0,
        }
    }

    /// Shield definition.
    #[must_use]
    pub const fn data(&self) -> &ShieldData {
        &self.data
    }

    /// Stored charge.
    #[must_use]
    pub const fn charge(&self) -> f32 {
        self.charge
    }

    pub(super) fn initialize(&mut self, item: &ItemCondition, entity: &EntityCondition) {
        self.charge = self.data.capacity.evaluate(item, entity).max(0.0);
    }

    pub(super) fn update(&mut self, ctx: &mut BehaviorContext<'_>) {
        if !self.raised {
            return;
        }
        let capacity = ctx.eval(&self.data.capacity).max(0.0);
        if self.charge < capacity {
            let want = (ctx.eval(&self.data.recharge).max(0.0) * ctx.delta).min(capacity - self.charge);
            let energy = want * ctx.eval(&self.data.energy);
            if ctx.tick.try_draw_energy(energy) {
                let heat = want * ctx.eval(&self.data.heat);
                ctx.tick.add_heat(heat);
                self.charge += want;
            }
        }
        self.charge = self.charge.min(capacity);
    }

    /// Soak up damage. Returns what gets through.
    pub fn absorb(&mut self, damage: f32) -> f32 {
        if !self.raised || damage <= 0.0 {
            return damage.max(0.0);
        }
        let absorbed = self.charge.min(damage);
        self.charge -= absorbed;
        damage - absorbed
    }
}

impl Activatable for Shield {
    fn activate(&mut self) {
        self.raised = true;
    }

    fn deactivate(&mut self) {
        self.raised = false;
    }

    fn is_active(&self) -> bool {
        self.raised
    }
}

/// Main engine, driven by the entity's movement input.
#[derive(Debug, Clone, PartialEq)]
pub struct Thruster {
    data: ThrusterData,
    thrusting: bool,
}

impl Thruster {
    /// Create a thruster.
    #[must_use]
    pub fn new(data: ThrusterData) -> Self {
        Self {
            data,
            thrusting: false,
        }
    }

    /// Thruster definition.
    #[must_use]
    pub const fn data(&self) -> &ThrusterData {
        &self.data
    }

    pub(super) fn update(&mut self, ctx: &mut BehaviorContext<'_>) {
        let limit = ctx.eval(&self.data.speed_limit).max(0.0);
        ctx.tick.speed_limit = Some(ctx.tick.speed_limit.map_or(limit, |l| l.max(limit)));

        let (mut x, mut y) = ctx.movement;
        let throttle = (x * x + y * y).sqrt();
        if throttle > 1.0 {
            x /= throttle;
            y /= throttle;
        }
        let throttle = throttle.min(1.0);

        let energy = ctx.eval(&self.data.energy) * throttle * ctx.delta;
        let burning = throttle > 0.0 && ctx.tick.try_draw_energy(energy);
        if !burning {
            if self.thrusting {
                ctx.tick.set_visibility(ctx.slot, None);
            }
            self.thrusting = false;
            return;
        }

        let accel = ctx.eval(&self.data.thrust).max(0.0) / ctx.mass.max(1.0);
        ctx.tick.velocity.0 += x * accel * ctx.delta;
        ctx.tick.velocity.1 += y * accel * ctx.delta;

        let heat = ctx.eval(&self.data.heat) * throttle * ctx.delta;
        let visibility = ctx.eval(&self.data.visibility).max(0.0) * throttle;
        ctx.tick.add_heat(heat);
        ctx.tick.set_visibility(ctx.slot, Some(visibility));
        self.thrusting = true;
    }
}

/// Power plant. Fills the entity's energy store up to total capacitance.
#[derive(Debug, Clone, PartialEq)]
pub struct Reactor {
    data: ReactorData,
}

impl Reactor {
    /// Create a reactor.
    #[must_use]
    pub fn new(data: ReactorData) -> Self {
        Self { data }
    }

    /// Reactor definition.
    #[must_use]
    pub const fn data(&self) -> &ReactorData {
        &self.data
    }

    pub(super) fn update(&mut self, ctx: &mut BehaviorContext<'_>) {
        let capacitance = ctx.condition.reactor_capacitance.unwrap_or(0.0);
        let headroom = (capacitance - ctx.tick.energy_available()).max(0.0);
        let produced = (ctx.eval(&self.data.charge).max(0.0) * ctx.delta).min(headroom);
        if produced <= 0.0 {
            return;
        }
        let heat = produced * ctx.eval(&self.data.heat);
        ctx.tick.produce_energy(produced);
        ctx.tick.add_heat(heat);
    }
}

/// Heat sink. Deployed by default.
#[derive(Debug, Clone, PartialEq)]
pub struct Radiator {
    data: RadiatorData,
    deployed: bool,
    radiating: bool,
}

impl Radiator {
    /// Create a deployed radiator.
    #[must_use]
    pub fn new(data: RadiatorData) -> Self {
        Self {
            data,
            deployed: true,
            radiating: false,
        }
    }

    /// Radiator definition.
    #[must_use]
    pub const fn data(&self) -> &RadiatorData {
        &self.data
    }

    pub(super) fn update(&mut self, ctx: &mut BehaviorContext<'_>) {
        if !self.deployed {
            if self.radiating {
                ctx.tick.set_visibility(ctx.slot, None);
            }
            self.radiating = false;
            return;
        }
        let dissipation = ctx.eval(&self.data.dissipation).max(0.0);
        let visibility = ctx.eval(&self.data.visibility).max(0.0);
        ctx.tick.dissipation += dissipation;
        ctx.tick.set_visibility(ctx.slot, Some(visibility));
        self.radiating = true;
    }
}

impl Activatable for Radiator {
    fn activate(&mut self) {
        self.deployed = true;
    }

    fn deactivate(&mut self) {
        self.deployed = false;
    }

    fn is_active(&self) -> bool {
        self.deployed
    }
}

/// Crew compartment. Life support draws energy every tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Cockpit {
    data: CockpitData,
}

impl Cockpit {
    /// Create a cockpit.
    #[must_use]
    pub fn new(data: CockpitData) -> Self {
        Self { data }
    }

    /// Cockpit definition.
    #[must_use]
    pub const fn data(&self) -> &CockpitData {
        &self.data
    }

    pub(super) fn update(&mut self, ctx: &mut BehaviorContext<'_>) {
        let energy = ctx.eval(&self.data.life_support).max(0.0) * ctx.delta;
        let powered = ctx.tick.try_draw_energy(energy);
        let all_powered = ctx.tick.life_support.unwrap_or(true) && powered;
        ctx.tick.life_support = Some(all_powered);
    }
}

/// Passive sensor suite.
#[derive(Debug, Clone, PartialEq)]
pub struct Sensor {
    data: SensorData,
}

impl Sensor {
    /// Create a sensor.
    #[must_use]
    pub fn new(data: SensorData) -> Self {
        Self { data }
    }

    /// Sensor definition.
    #[must_use]
    pub const fn data(&self) -> &SensorData {
        &self.data
    }

    pub(super) fn update(&mut self, ctx: &mut BehaviorContext<'_>) {
        let energy = ctx.eval(&self.data.energy).max(0.0) * ctx.delta;
        if !ctx.tick.try_draw_energy(energy) {
            return;
        }
        let sensitivity = ctx.eval(&self.data.sensitivity).max(0.0);
        let range = ctx.eval(&self.data.range).max(0.0);
        ctx.tick.report_sensor(sensitivity, range);
    }
}
