//! Behavior definitions attached to gear.
//!
//! Each variant carries the stats of one behavior kind. Every kind exposes
//! its stats through a `stats()` list of `(name, stat)` pairs so that UI
//! code can inspect them without knowing the kind.

use serde::{Deserialize, Serialize};

use super::item_data::ItemId;
use crate::stats::PerformanceStat;

/// Kind of projectile a [`ProjectileWeaponData`] fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProjectileKind {
    /// Unguided kinetic rounds.
    #[default]
    Ballistic,
    /// Missiles. Each shot consumes one unit of ammunition from cargo.
    Launcher,
}

/// Cooldown and burst driven weapon.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProjectileWeaponData {
    /// Projectile kind.
    #[serde(default)]
    pub kind: ProjectileKind,
    /// Damage per projectile.
    pub damage: PerformanceStat,
    /// Maximum range.
    pub range: PerformanceStat,
    /// Heat added per shot.
    #[serde(default)]
    pub heat: PerformanceStat,
    /// Energy drawn per shot.
    #[serde(default)]
    pub energy: PerformanceStat,
    /// Signature added per shot.
    #[serde(default)]
    pub visibility: PerformanceStat,
    /// Fraction of firing signature left after one second.
    #[serde(default)]
    pub visibility_decay: PerformanceStat,
    /// Seconds between bursts.
    pub cooldown: PerformanceStat,
    /// Shots per burst.
    pub burst_count: PerformanceStat,
    /// Seconds a burst is spread over.
    #[serde(default)]
    pub burst_time: PerformanceStat,
    /// Projectile speed.
    #[serde(default)]
    pub velocity: PerformanceStat,
    /// Angular spread in degrees.
    #[serde(default)]
    pub spread: PerformanceStat,
    /// Fraction of the shooter's velocity inherited by projectiles.
    #[serde(default)]
    pub inherit: PerformanceStat,
    /// Ammunition commodity (launchers only).
    #[serde(default)]
    pub ammo: Option<ItemId>,
}

impl ProjectileWeaponData {
    /// Inspectable stats.
    #[must_use]
    pub fn stats(&self) -> Vec<(&'static str, &PerformanceStat)> {
        vec![
            ("Damage", &self.damage),
            ("Range", &self.range),
            ("Heat", &self.heat),
            ("Energy", &self.energy),
            ("Visibility", &self.visibility),
            ("Visibility Decay", &self.visibility_decay),
            ("Cooldown", &self.cooldown),
            ("Burst Count", &self.burst_count),
            ("Burst Time", &self.burst_time),
            ("Velocity", &self.velocity),
            ("Spread", &self.spread),
            ("Inherit", &self.inherit),
        ]
    }
}

/// Continuous beam weapon.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BeamWeaponData {
    /// Damage per second.
    pub damage: PerformanceStat,
    /// Maximum range.
    pub range: PerformanceStat,
    /// Energy per second while firing.
    #[serde(default)]
    pub energy: PerformanceStat,
    /// Heat per second while firing.
    #[serde(default)]
    pub heat: PerformanceStat,
    /// Signature while firing.
    #[serde(default)]
    pub visibility: PerformanceStat,
}

impl BeamWeaponData {
    /// Inspectable stats.
    #[must_use]
    pub fn stats(&self) -> Vec<(&'static str, &PerformanceStat)> {
        vec![
            ("Damage", &self.damage),
            ("Range", &self.range),
            ("Energy", &self.energy),
            ("Heat", &self.heat),
            ("Visibility", &self.visibility),
        ]
    }
}

/// Damage absorbing shield.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ShieldData {
    /// Maximum shield charge.
    pub capacity: PerformanceStat,
    /// Charge restored per second.
    pub recharge: PerformanceStat,
    /// Energy per point of charge restored.
    #[serde(default)]
    pub energy: PerformanceStat,
    /// Heat per point of charge restored.
    #[serde(default)]
    pub heat: PerformanceStat,
}

impl ShieldData {
    /// Inspectable stats.
    #[must_use]
    pub fn stats(&self) -> Vec<(&'static str, &PerformanceStat)> {
        vec![
            ("Capacity", &self.capacity),
            ("Recharge", &self.recharge),
            ("Energy", &self.energy),
            ("Heat", &self.heat),
        ]
    }
}

/// Main engine.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ThrusterData {
    /// Force at full throttle.
    pub thrust: PerformanceStat,
    /// Energy per second at full throttle.
    #[serde(default)]
    pub energy: PerformanceStat,
    /// Heat per second at full throttle.
    #[serde(default)]
    pub heat: PerformanceStat,
    /// Signature at full throttle.
    #[serde(default)]
    pub visibility: PerformanceStat,
    /// Highest speed this thruster can hold.
    pub speed_limit: PerformanceStat,
}

impl ThrusterData {
    /// Inspectable stats.
    #[must_use]
    pub fn stats(&self) -> Vec<(&'static str, &PerformanceStat)> {
        vec![
            ("Thrust", &self.thrust),
            ("Energy", &self.energy),
            ("Heat", &self.heat),
            ("Visibility", &self.visibility),
            ("Speed Limit", &self.speed_limit),
        ]
    }
}

/// Power plant.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReactorData {
    /// Energy storage.
    pub capacitance: PerformanceStat,
    /// Energy produced per second.
    pub charge: PerformanceStat,
    /// Heat per unit of energy produced.
    #[serde(default)]
    pub heat: PerformanceStat,
}

impl ReactorData {
    /// Inspectable stats.
    #[must_use]
    pub fn stats(&self) -> Vec<(&'static str, &PerformanceStat)> {
        vec![
            ("Capacitance", &self.capacitance),
            ("Charge", &self.charge),
            ("Heat", &self.heat),
        ]
    }
}

/// Heat sink.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RadiatorData {
    /// Heat removed per second while deployed.
    pub dissipation: PerformanceStat,
    /// Signature while deployed.
    #[serde(default)]
    pub visibility: PerformanceStat,
}

impl RadiatorData {
    /// Inspectable stats.
    #[must_use]
    pub fn stats(&self) -> Vec<(&'static str, &PerformanceStat)> {
        vec![
            ("Dissipation", &self.dissipation),
            ("Visibility", &self.visibility),
        ]
    }
}

/// Fabricator.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FactoryData {
    /// Seconds needed to retool for a new blueprint.
    pub tooling_time: PerformanceStat,
    /// Production speed multiplier.
    pub speed: PerformanceStat,
    /// Energy per second while producing.
    #[serde(default)]
    pub energy: PerformanceStat,
    /// Heat per second while producing.
    #[serde(default)]
    pub heat: PerformanceStat,
}

impl FactoryData {
    /// Inspectable stats.
    #[must_use]
    pub fn stats(&self) -> Vec<(&'static str, &PerformanceStat)> {
        vec![
            ("Tooling Time", &self.tooling_time),
            ("Speed", &self.speed),
            ("Energy", &self.energy),
            ("Heat", &self.heat),
        ]
    }
}

/// Crew compartment with life support.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CockpitData {
    /// Energy per second drawn by life support.
    #[serde(default)]
    pub life_support: PerformanceStat,
}

impl CockpitData {
    /// Inspectable stats.
    #[must_use]
    pub fn stats(&self) -> Vec<(&'static str, &PerformanceStat)> {
        vec![("Life Support", &self.life_support)]
    }
}

/// Passive sensor suite.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SensorData {
    /// Signal multiplier used for detection.
    pub sensitivity: PerformanceStat,
    /// Maximum detection range.
    pub range: PerformanceStat,
    /// Energy per second.
    #[serde(default)]
    pub energy: PerformanceStat,
}

impl SensorData {
    /// Inspectable stats.
    #[must_use]
    pub fn stats(&self) -> Vec<(&'static str, &PerformanceStat)> {
        vec![
            ("Sensitivity", &self.sensitivity),
            ("Range", &self.range),
            ("Energy", &self.energy),
        ]
    }
}

/// A behavior definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BehaviorData {
    /// Projectile or missile weapon.
    ProjectileWeapon(ProjectileWeaponData),
    /// Beam weapon.
    BeamWeapon(BeamWeaponData),
    /// Shield.
    Shield(ShieldData),
    /// Thruster.
    Thruster(ThrusterData),
    /// Reactor.
    Reactor(ReactorData),
    /// Radiator.
    Radiator(RadiatorData),
    /// Factory.
    Factory(FactoryData),
    /// Cockpit.
    Cockpit(CockpitData),
    /// Sensor.
    Sensor(SensorData),
}

impl BehaviorData {
    /// Human-readable kind name.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::ProjectileWeapon(d) => match d.kind {
                ProjectileKind::Ballistic => "Projectile Weapon",
                ProjectileKind::Launcher => "Launcher",
            },
            Self::BeamWeapon(_) => "Beam Weapon",
            Self::Shield(_) => "Shield",
            Self::Thruster(_) => "Thruster",
            Self::Reactor(_) => "Reactor",
            Self::Radiator(_) => "Radiator",
            Self::Factory(_) => "Factory",
            Self::Cockpit(_) => "Cockpit",
            Self::Sensor(_) => "Sensor",
        }
    }

    /// Inspectable stats of this behavior.
    #[must_use]
    pub fn stats(&self) -> Vec<(&'static str, &PerformanceStat)> {
        match self {
            Self::ProjectileWeapon(d) => d.stats(),
            Self::BeamWeapon(d) => d.stats(),
            Self::Shield(d) => d.stats(),
            Self::Thruster(d) => d.stats(),
            Self::Reactor(d) => d.stats(),
            Self::Radiator(d) => d.stats(),
            Self::Factory(d) => d.stats(),
            Self::Cockpit(d) => d.stats(),
            Self::Sensor(d) => d.stats(),
        }
    }
}
