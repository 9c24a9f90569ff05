//! Orbit tree, celestial bodies and asteroid belts.
//!
//! Every position here is a pure function of time: nothing is integrated,
//! so any client can compute where a body is at any instant without
//! replaying the ticks before it.

use std::collections::BTreeMap;
use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::data::{GlobalData, ItemId, PlanetClass};

/// Identifier of an orbit within a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrbitId(pub u32);

impl OrbitId {
    /// Create a new orbit id.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

/// Identifier of a celestial body within a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanetId(pub u32);

impl PlanetId {
    /// Create a new planet id.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

/// A circular orbit around a parent orbit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitData {
    /// Orbit id.
    pub id: OrbitId,
    /// Orbit this one circles. `None` for the zone's barycenter.
    pub parent: Option<OrbitId>,
    /// Radius.
    pub distance: f64,
    /// Starting angle as a fraction of a turn, `0..1`.
    pub phase: f64,
}

impl OrbitData {
    /// The zone's barycenter.
    #[must_use]
    pub const fn root(id: OrbitId) -> Self {
        Self {
            id,
            parent: None,
            distance: 0.0,
            phase: 0.0,
        }
    }

    /// Offset from the parent at `time`.
    ///
    /// Zero-radius orbits are stationary.
    #[must_use]
    pub fn local_position(&self, time: f64, global: &GlobalData) -> (f64, f64) {
        circular_position(self.distance, self.phase, time, global)
    }
}

/// Position on a circular orbit of radius `distance` at `time`.
///
/// `θ = 2π(phase − t / period)` with the period taken from
/// [`GlobalData::orbit_period`].
#[must_use]
pub fn circular_position(distance: f64, phase: f64, time: f64, global: &GlobalData) -> (f64, f64) {
    if distance <= 0.0 {
        return (0.0, 0.0);
    }
    let period = global.orbit_period(distance);
    if period <= 0.0 || !period.is_finite() {
        return (distance * (TAU * phase).cos(), distance * (TAU * phase).sin());
    }
    let theta = TAU * (phase - time / period);
    (distance * theta.cos(), distance * theta.sin())
}

/// All orbits of a zone, indexed by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrbitTree {
    orbits: BTreeMap<OrbitId, OrbitData>,
}

impl OrbitTree {
    /// Build from a list of orbits. Later duplicates replace earlier ones.
    #[must_use]
    pub fn new(orbits: impl IntoIterator<Item = OrbitData>) -> Self {
        Self {
            orbits: orbits.into_iter().map(|o| (o.id, o)).collect(),
        }
    }

    /// Look up an orbit.
    #[must_use]
    pub fn get(&self, id: OrbitId) -> Option<&OrbitData> {
        self.orbits.get(&id)
    }

    /// Orbits in id order.
    pub fn iter(&self) -> impl Iterator<Item = &OrbitData> {
        self.orbits.values()
    }

    /// Number of orbits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.orbits.len()
    }

    /// Whether there are no orbits.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orbits.is_empty()
    }

    /// Absolute position of an orbit at `time`, summed up the parent chain.
    ///
    /// Returns `None` for unknown ids or a broken chain.
    #[must_use]
    pub fn position(&self, id: OrbitId, time: f64, global: &GlobalData) -> Option<(f64, f64)> {
        let mut x = 0.0;
        let mut y = 0.0;
        let mut current = Some(id);
        let mut hops = 0;
        while let Some(orbit_id) = current {
            if hops > self.orbits.len() {
                return None;
            }
            let orbit = self.orbits.get(&orbit_id)?;
            let (dx, dy) = orbit.local_position(time, global);
            x += dx;
            y += dy;
            current = orbit.parent;
            hops += 1;
        }
        Some((x, y))
    }

    /// Check that parents exist and the parent graph is a tree with one root.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let roots = self.orbits.values().filter(|o| o.parent.is_none()).count();
        if !self.orbits.is_empty() && roots != 1 {
            errors.push(format!("expected one root orbit, found {roots}"));
        }
        for orbit in self.orbits.values() {
            if let Some(parent) = orbit.parent {
                if !self.orbits.contains_key(&parent) {
                    errors.push(format!("orbit {:?} has unknown parent {parent:?}", orbit.id));
                    continue;
                }
            }
            let mut current = orbit.parent;
            let mut hops = 0;
            while let Some(id) = current {
                hops += 1;
                if id == orbit.id || hops > self.orbits.len() {
                    errors.push(format!("orbit {:?} is part of a cycle", orbit.id));
                    break;
                }
                current = self.orbits.get(&id).and_then(|o| o.parent);
            }
        }
        errors
    }
}

/// One asteroid of a belt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Asteroid {
    /// Distance from the belt center.
    pub distance: f32,
    /// Starting angle as a fraction of a turn.
    pub phase: f32,
    /// Spin in degrees per second.
    pub rotation_rate: f32,
    /// Visual scale.
    pub scale: f32,
}

impl Asteroid {
    /// Pack as `[distance, phase, rotation_rate, scale]`.
    #[must_use]
    pub const fn to_array(self) -> [f32; 4] {
        [self.distance, self.phase, self.rotation_rate, self.scale]
    }

    /// Inverse of [`to_array`](Self::to_array).
    #[must_use]
    pub const fn from_array(values: [f32; 4]) -> Self {
        Self {
            distance: values[0],
            phase: values[1],
            rotation_rate: values[2],
            scale: values[3],
        }
    }

    /// Spin angle in degrees at `time`, in `0..360`.
    #[must_use]
    pub fn rotation(&self, time: f64) -> f32 {
        (f64::from(self.rotation_rate) * time).rem_euclid(360.0) as f32
    }

    /// Offset from the belt center at `time`.
    #[must_use]
    pub fn position(&self, time: f64, global: &GlobalData) -> (f64, f64) {
        circular_position(
            f64::from(self.distance),
            f64::from(self.phase),
            time,
            global,
        )
    }
}

/// Asteroids of a belt-type body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AsteroidBelt {
    /// Asteroids in generation order.
    pub asteroids: Vec<Asteroid>,
}

impl AsteroidBelt {
    /// Asteroids packed as `[distance, phase, rotation_rate, scale]`.
    #[must_use]
    pub fn to_arrays(&self) -> Vec<[f32; 4]> {
        self.asteroids.iter().map(|a| a.to_array()).collect()
    }

    /// Inner and outer radius, or `None` when empty.
    #[must_use]
    pub fn extent(&self) -> Option<(f32, f32)> {
        self.asteroids.iter().fold(None, |acc, a| match acc {
            None => Some((a.distance, a.distance)),
            Some((lo, hi)) => Some((lo.min(a.distance), hi.max(a.distance))),
        })
    }
}

/// A mineable deposit on a body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceDeposit {
    /// Commodity found.
    pub commodity: ItemId,
    /// Amount available.
    pub amount: f32,
}

/// A star, planet, moon or asteroid belt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanetData {
    /// Body id.
    pub id: PlanetId,
    /// Display name.
    pub name: String,
    /// Orbit the body sits on.
    pub orbit: OrbitId,
    /// Mass.
    pub mass: f32,
    /// Class derived from mass.
    pub class: PlanetClass,
    /// Asteroids, for belt-type bodies.
    pub belt: Option<AsteroidBelt>,
    /// Deposits.
    pub resources: Vec<ResourceDeposit>,
}

impl PlanetData {
    /// Whether this body is an asteroid belt.
    #[must_use]
    pub const fn is_belt(&self) -> bool {
        self.belt.is_some()
    }

    /// Radius of the body's gravity well.
    #[must_use]
    pub fn gravity_radius(&self, global: &GlobalData) -> f32 {
        global.gravity_radius(self.mass)
    }
}
