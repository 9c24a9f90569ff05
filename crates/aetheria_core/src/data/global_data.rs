//! Global tuning constants.

use serde::{Deserialize, Serialize};

use super::zone_settings::PlanetClass;

/// Game-wide tuning shared by every zone.
///
/// # Example RON
///
/// ```ron
/// GlobalData(
///     orbit_period_exponent: 1.5,
///     orbit_period_multiplier: 0.2,
///     docking_distance: 50.0,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalData {
    /// Exponent of the distance in the orbital period formula.
    pub orbit_period_exponent: f64,
    /// Multiplier in the orbital period formula.
    pub orbit_period_multiplier: f64,
    /// Global speed-up of every orbit.
    pub orbit_speed_multiplier: f64,
    /// Minimum mass of a star.
    pub sun_mass: f32,
    /// Minimum mass of a gas giant.
    pub gas_giant_mass: f32,
    /// Minimum mass of a planet. Lighter bodies are planetoids.
    pub planet_mass: f32,
    /// Exponent of the mass in the gravity radius formula.
    pub gravity_radius_exponent: f32,
    /// Multiplier in the gravity radius formula.
    pub gravity_radius_multiplier: f32,
    /// Maximum distance between a ship and the host it docks with.
    pub docking_distance: f32,
    /// Temperature above which heatstroke exposure builds up.
    pub heatstroke_temperature: f32,
    /// Exposure gained per degree above the limit per second.
    pub heatstroke_rate: f32,
    /// Hypothermia exposure gained per second of unpowered life support.
    pub hypothermia_rate: f32,
    /// Exposure lost per second while conditions are safe.
    pub exposure_recovery: f32,
    /// Minimum received signal for a hostile to become visible.
    pub detection_threshold: f32,
}

impl Default for GlobalData {
    fn default() -> Self {
        Self {
            orbit_period_exponent: 1.5,
            orbit_period_multiplier: 0.2,
            orbit_speed_multiplier: 1.0,
            sun_mass: 10_000.0,
            gas_giant_mass: 2_000.0,
            planet_mass: 100.0,
            gravity_radius_exponent: 0.5,
            gravity_radius_multiplier: 2.0,
            docking_distance: 50.0,
            heatstroke_temperature: 500.0,
            heatstroke_rate: 0.001,
            hypothermia_rate: 0.05,
            exposure_recovery: 0.1,
            detection_threshold: 0.01,
        }
    }
}

impl GlobalData {
    /// Classify a body by mass.
    #[must_use]
    pub fn planet_class(&self, mass: f32) -> PlanetClass {
        if mass >= self.sun_mass {
            PlanetClass::Sun
        } else if mass >= self.gas_giant_mass {
            PlanetClass::GasGiant
        } else if mass >= self.planet_mass {
            PlanetClass::Planet
        } else {
            PlanetClass::Planetoid
        }
    }

    /// Radius of a body's gravity well.
    #[must_use]
    pub fn gravity_radius(&self, mass: f32) -> f32 {
        mass.max(0.0).powf(self.gravity_radius_exponent) * self.gravity_radius_multiplier
    }

    /// Orbital period at `distance` from the parent body.
    ///
    /// Zero distance has no period; callers treat it as stationary.
    #[must_use]
    pub fn orbit_period(&self, distance: f64) -> f64 {
        distance.max(0.0).powf(self.orbit_period_exponent) * self.orbit_period_multiplier
            / self.orbit_speed_multiplier
    }

    /// Check the tables for values the simulation cannot use.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.orbit_period_multiplier <= 0.0 || self.orbit_speed_multiplier <= 0.0 {
            errors.push("orbit period and speed multipliers must be positive".to_string());
        }
        if !(self.sun_mass > self.gas_giant_mass && self.gas_giant_mass > self.planet_mass) {
            errors.push("mass thresholds must be strictly decreasing".to_string());
        }
        if self.docking_distance < 0.0 {
            errors.push("docking distance must not be negative".to_string());
        }
        if self.detection_threshold <= 0.0 {
            errors.push("detection threshold must be positive".to_string());
        }
        errors
    }
}
