//! Zone generation settings and sector-level zone descriptions.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::item_data::ItemId;

/// Identifier of a zone in the sector map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(pub u32);

impl ZoneId {
    /// Create a new zone id.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

/// Inclusive range sampled uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloatRange {
    /// Lower bound.
    pub min: f32,
    /// Upper bound.
    pub max: f32,
}

impl FloatRange {
    /// Create a new range.
    #[must_use]
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Whether `min <= max` and both bounds are finite.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }

    /// Draw a value from the range.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> f32 {
        if self.max <= self.min {
            return self.min;
        }
        rng.gen_range(self.min..=self.max)
    }

    /// Draw a value and round it down to an integer count.
    pub fn sample_count<R: Rng>(&self, rng: &mut R) -> u32 {
        self.sample(rng).max(0.0).floor() as u32
    }
}

/// Mass class of a celestial body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlanetClass {
    /// Star.
    Sun,
    /// Gas giant.
    GasGiant,
    /// Rocky planet.
    Planet,
    /// Small body.
    Planetoid,
}

/// Where a resource can be found and how much of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDistribution {
    /// Commodity found.
    pub commodity: ItemId,
    /// Amount per unit of body mass at full zone density.
    pub density: f32,
    /// Body classes that carry it.
    pub classes: Vec<PlanetClass>,
    /// Whether asteroid belts carry it.
    #[serde(default)]
    pub belts: bool,
}

/// Tuning for procedural zone layouts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneSettings {
    /// Star mass before the zone's mass scale is applied.
    pub star_mass: FloatRange,
    /// Number of bodies orbiting the star.
    pub planet_count: FloatRange,
    /// Body mass before the zone's mass scale is applied.
    pub planet_mass: FloatRange,
    /// Orbit radius of the innermost body.
    pub first_orbit: f32,
    /// Ratio between consecutive orbit radii. Must exceed one.
    pub orbit_spacing: FloatRange,
    /// Chance that a non-giant body is an asteroid belt instead.
    pub belt_probability: f32,
    /// Half-width of a belt as a fraction of its radius.
    pub belt_width: f32,
    /// Asteroids per unit of belt mass.
    pub asteroids_per_mass: f32,
    /// Bounds on asteroids per belt.
    pub asteroid_count: FloatRange,
    /// Visual scale of asteroids.
    pub asteroid_size: FloatRange,
    /// Rotation rate of asteroids, degrees per second.
    pub asteroid_rotation: FloatRange,
    /// Chance per body to carry a moon, checked once per moon slot.
    pub moon_probability: f32,
    /// Moon slots per body.
    pub max_moons: u32,
    /// Moon mass as a fraction of its parent.
    pub moon_mass: FloatRange,
    /// Moon orbit radius as a multiple of the parent's gravity radius.
    pub moon_distance: FloatRange,
    /// Maximum depth of the orbit tree below the star.
    pub max_depth: u32,
    /// Hull used for orbital stations, if any are placed.
    pub station_hull: Option<ItemId>,
    /// Number of stations placed per zone.
    pub station_count: FloatRange,
    /// Resource deposits.
    pub resources: Vec<ResourceDistribution>,
    /// Deposits below this amount are dropped.
    pub min_resource_amount: f32,
}

impl Default for ZoneSettings {
    fn default() -> Self {
        Self {
            star_mass: FloatRange::new(20_000.0, 60_000.0),
            planet_count: FloatRange::new(3.0, 8.0),
            planet_mass: FloatRange::new(20.0, 4_000.0),
            first_orbit: 400.0,
            orbit_spacing: FloatRange::new(1.4, 2.0),
            belt_probability: 0.2,
            belt_width: 0.1,
            asteroids_per_mass: 0.5,
            asteroid_count: FloatRange::new(16.0, 256.0),
            asteroid_size: FloatRange::new(0.5, 3.0),
            asteroid_rotation: FloatRange::new(-30.0, 30.0),
            moon_probability: 0.3,
            max_moons: 3,
            moon_mass: FloatRange::new(0.01, 0.1),
            moon_distance: FloatRange::new(2.0, 5.0),
            max_depth: 2,
            station_hull: None,
            station_count: FloatRange::new(0.0, 0.0),
            resources: Vec::new(),
            min_resource_amount: 1.0,
        }
    }
}

impl ZoneSettings {
    /// Check the settings for values generation cannot use.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let ranges = [
            ("star_mass", self.star_mass),
            ("planet_count", self.planet_count),
            ("planet_mass", self.planet_mass),
            ("orbit_spacing", self.orbit_spacing),
            ("asteroid_count", self.asteroid_count),
            ("asteroid_size", self.asteroid_size),
            ("asteroid_rotation", self.asteroid_rotation),
            ("moon_mass", self.moon_mass),
            ("moon_distance", self.moon_distance),
            ("station_count", self.station_count),
        ];
        for (name, range) in ranges {
            if !range.is_valid() {
                errors.push(format!("{name}: min must not exceed max"));
            }
        }
        if self.star_mass.min <= 0.0 {
            errors.push("star_mass must be positive".to_string());
        }
        if self.planet_mass.min <= 0.0 {
            errors.push("planet_mass must be positive".to_string());
        }
        if self.first_orbit <= 0.0 {
            errors.push("first_orbit must be positive".to_string());
        }
        if self.orbit_spacing.min <= 1.0 {
            errors.push("orbit_spacing must exceed 1".to_string());
        }
        if !(0.0..=1.0).contains(&self.belt_probability)
            || !(0.0..=1.0).contains(&self.moon_probability)
        {
            errors.push("probabilities must lie in 0..=1".to_string());
        }
        if self.asteroid_count.min < 0.0 || self.asteroid_size.min <= 0.0 {
            errors.push("asteroid counts and sizes must be positive".to_string());
        }
        errors
    }
}

/// A zone as seen on the sector map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorZone {
    /// Zone id.
    pub id: ZoneId,
    /// Display name.
    pub name: String,
    /// Position on the sector map.
    pub position: (f32, f32),
    /// Radius of the playable region.
    pub radius: f32,
    /// Multiplier on every generated mass.
    #[serde(default = "default_one")]
    pub mass: f32,
    /// Multiplier on resource deposits, `0..=1`.
    #[serde(default = "default_one")]
    pub resource_density: f32,
    /// Zones linked by wormholes.
    #[serde(default)]
    pub wormholes: Vec<ZoneId>,
}

const fn default_one() -> f32 {
    1.0
}

impl SectorZone {
    /// Create a zone description with unit mass and density.
    #[must_use]
    pub fn new(id: ZoneId, name: impl Into<String>, position: (f32, f32), radius: f32) -> Self {
        Self {
            id,
            name: name.into(),
            position,
            radius,
            mass: 1.0,
            resource_density: 1.0,
            wormholes: Vec::new(),
        }
    }

    /// Where the wormhole leading to `other` sits inside this zone.
    ///
    /// Placed at the rim, facing the other zone on the sector map.
    #[must_use]
    pub fn wormhole_position(&self, other: &SectorZone) -> (f32, f32) {
        let dx = other.position.0 - self.position.0;
        let dy = other.position.1 - self.position.1;
        let len = (dx * dx + dy * dy).sqrt();
        if len <= f32::EPSILON {
            return (0.0, 0.0);
        }
        let reach = self.radius * 0.95;
        (dx / len * reach, dy / len * reach)
    }
}
