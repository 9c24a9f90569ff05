//! Procedural zone generation.
//!
//! Produces the orbit tree and celestial bodies of one zone:
//! - A star on the zone's barycenter
//! - Planets on geometrically spaced orbits inside the zone radius
//! - Moons orbiting inside their parent's gravity well, down to a maximum depth
//! - Asteroid belts in place of some planets
//! - Resource deposits by body class
//!
//! Output is a pure function of the inputs. The RNG is seeded from
//! `seed ^ zone id`, so two zones of one sector never share a layout.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::{GlobalData, PlanetClass, ResourceDistribution, SectorZone, ZoneSettings};
use crate::orbit::{
    Asteroid, AsteroidBelt, OrbitData, OrbitId, PlanetData, PlanetId, ResourceDeposit,
};

/// Errors raised before anything is generated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationError {
    /// Zone settings failed validation.
    #[error("Invalid zone settings: {0:?}")]
    InvalidSettings(Vec<String>),

    /// Global data failed validation.
    #[error("Invalid global data: {0:?}")]
    InvalidGlobalData(Vec<String>),

    /// The zone has no room for bodies.
    #[error("Zone radius must be positive, got {0}")]
    InvalidRadius(f32),
}

/// Result of [`generate_zone`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedZone {
    /// Orbits in id order; the first is the root.
    pub orbits: Vec<OrbitData>,
    /// Bodies in id order; the first is the star.
    pub planets: Vec<PlanetData>,
}

impl GeneratedZone {
    /// Number of asteroids across every belt.
    #[must_use]
    pub fn asteroid_count(&self) -> usize {
        self.planets
            .iter()
            .filter_map(|p| p.belt.as_ref())
            .map(|b| b.asteroids.len())
            .sum()
    }
}

const NUMERALS: [&str; 12] = [
    "I", "II", "III", "IV", "V", "VI", "VII", "VIII", "IX", "X", "XI", "XII",
];

struct Builder<'a> {
    settings: &'a ZoneSettings,
    global: &'a GlobalData,
    sector: &'a SectorZone,
    resources: &'a [ResourceDistribution],
    rng: ChaCha8Rng,
    zone: GeneratedZone,
}

impl Builder<'_> {
    fn add_orbit(&mut self, parent: Option<OrbitId>, distance: f64, phase: f64) -> OrbitId {
        let id = OrbitId::new(self.zone.orbits.len() as u32);
        self.zone.orbits.push(OrbitData {
            id,
            parent,
            distance,
            phase,
        });
        id
    }

    fn add_body(
        &mut self,
        name: String,
        orbit: OrbitId,
        mass: f32,
        belt: Option<AsteroidBelt>,
    ) -> PlanetId {
        let id = PlanetId::new(self.zone.planets.len() as u32);
        let class = self.global.planet_class(mass);
        let resources = self.deposits(mass, class, belt.is_some());
        self.zone.planets.push(PlanetData {
            id,
            name,
            orbit,
            mass,
            class,
            belt,
            resources,
        });
        id
    }

    fn deposits(&self, mass: f32, class: PlanetClass, belt: bool) -> Vec<ResourceDeposit> {
        self.resources
            .iter()
            .filter(|r| if belt { r.belts } else { r.classes.contains(&class) })
            .map(|r| ResourceDeposit {
                commodity: r.commodity,
                amount: mass * r.density * self.sector.resource_density,
            })
            .filter(|d| d.amount >= self.settings.min_resource_amount)
            .collect()
    }

    fn phase(&mut self) -> f64 {
        self.rng.gen_range(0.0..1.0)
    }

    fn star(&mut self) -> OrbitId {
        let root = self.add_orbit(None, 0.0, 0.0);
        let mass = self.settings.star_mass.sample(&mut self.rng) * self.sector.mass;
        self.add_body(self.sector.name.clone(), root, mass, None);
        root
    }

    fn planets(&mut self, root: OrbitId) {
        let count = self.settings.planet_count.sample_count(&mut self.rng);
        let mut distance = self.settings.first_orbit;
        for index in 0..count as usize {
            if distance > self.sector.radius {
                break;
            }
            let name = format!(
                "{} {}",
                self.sector.name,
                NUMERALS.get(index).map_or_else(|| (index + 1).to_string(), ToString::to_string)
            );
            let mass = self.settings.planet_mass.sample(&mut self.rng) * self.sector.mass;
            let is_belt = self.global.planet_class(mass) != PlanetClass::GasGiant
                && self.rng.gen_bool(f64::from(self.settings.belt_probability));

            if is_belt {
                let belt = self.belt(distance, mass);
                let orbit = self.add_orbit(Some(root), 0.0, 0.0);
                self.add_body(format!("{name} Belt"), orbit, mass, Some(belt));
            } else {
                let phase = self.phase();
                let orbit = self.add_orbit(Some(root), f64::from(distance), phase);
                self.add_body(name.clone(), orbit, mass, None);
                self.moons(&name, orbit, mass, 1);
            }

            distance *= self.settings.orbit_spacing.sample(&mut self.rng);
        }
    }

    fn moons(&mut self, parent_name: &str, parent: OrbitId, parent_mass: f32, depth: u32) {
        if depth >= self.settings.max_depth {
            return;
        }
        let mut letter = b'a';
        for _ in 0..self.settings.max_moons {
            if !self
                .rng
                .gen_bool(f64::from(self.settings.moon_probability))
            {
                continue;
            }
            let mass = parent_mass * self.settings.moon_mass.sample(&mut self.rng);
            let distance = self.global.gravity_radius(parent_mass)
                * self.settings.moon_distance.sample(&mut self.rng);
            let phase = self.phase();
            let orbit = self.add_orbit(Some(parent), f64::from(distance), phase);
            let name = format!("{parent_name}{}", char::from(letter));
            letter = letter.saturating_add(1);
            self.add_body(name.clone(), orbit, mass, None);
            self.moons(&name, orbit, mass, depth + 1);
        }
    }

    fn belt(&mut self, radius: f32, mass: f32) -> AsteroidBelt {
        let range = self.settings.asteroid_count;
        let count = (mass * self.settings.asteroids_per_mass)
            .clamp(range.min.max(0.0), range.max.max(0.0))
            .floor() as usize;
        let width = self.settings.belt_width.abs();
        let asteroids = (0..count)
            .map(|_| {
                let spread = if width > 0.0 {
                    self.rng.gen_range(-width..=width)
                } else {
                    0.0
                };
                Asteroid {
                    distance: radius * (1.0 + spread),
                    phase: self.rng.gen_range(0.0..1.0),
                    rotation_rate: self.settings.asteroid_rotation.sample(&mut self.rng),
                    scale: self.settings.asteroid_size.sample(&mut self.rng),
                }
            })
            .collect();
        AsteroidBelt { asteroids }
    }
}

/// Generate the orbits and bodies of a zone.
///
/// # Errors
///
/// Returns a [`GenerationError`] if the settings, the global data or the
/// zone radius cannot produce a layout. Nothing is generated in that case.
///
/// # Example
///
/// ```
/// use aetheria_core::data::{GlobalData, SectorZone, ZoneId, ZoneSettings};
/// use aetheria_core::generation::generate_zone;
///
/// let settings = ZoneSettings::default();
/// let sector = SectorZone::new(ZoneId::new(1), "Kepler", (0.0, 0.0), 5000.0);
/// let zone = generate_zone(7, &settings, &GlobalData::default(), &sector, &settings.resources)?;
/// assert!(zone.orbits[0].parent.is_none());
/// # Ok::<(), aetheria_core::generation::GenerationError>(())
/// ```
pub fn generate_zone(
    seed: u64,
    settings: &ZoneSettings,
    global: &GlobalData,
    sector: &SectorZone,
    resources: &[ResourceDistribution],
) -> Result<GeneratedZone, GenerationError> {
    let errors = settings.validate();
    if !errors.is_empty() {
        return Err(GenerationError::InvalidSettings(errors));
    }
    let errors = global.validate();
    if !errors.is_empty() {
        return Err(GenerationError::InvalidGlobalData(errors));
    }
    if sector.radius.is_nan() || sector.radius <= 0.0 {
        return Err(GenerationError::InvalidRadius(sector.radius));
    }

    let mut builder = Builder {
        settings,
        global,
        sector,
        resources,
        rng: ChaCha8Rng::seed_from_u64(seed ^ u64::from(sector.id.0)),
        zone: GeneratedZone::default(),
    };
    let root = builder.star();
    builder.planets(root);

    let zone = builder.zone;
    tracing::info!(
        zone = sector.id.0,
        seed,
        orbits = zone.orbits.len(),
        planets = zone.planets.len(),
        asteroids = zone.asteroid_count(),
        "Generated zone"
    );
    Ok(zone)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{FloatRange, ItemId, ZoneId};
    use crate::orbit::OrbitTree;

    fn sector() -> SectorZone {
        SectorZone::new(ZoneId::new(3), "Tau", (0.0, 0.0), 20_000.0)
    }

    fn generate(seed: u64, settings: &ZoneSettings) -> GeneratedZone {
        generate_zone(
            seed,
            settings,
            &GlobalData::default(),
            &sector(),
            &settings.resources,
        )
        .expect("valid settings")
    }

    #[test]
    fn test_determinism() {
        let settings = ZoneSettings::default();
        assert_eq!(generate(42, &settings), generate(42, &settings));
    }

    #[test]
    fn test_different_seeds() {
        let settings = ZoneSettings::default();
        let a = generate(1, &settings);
        let b = generate(2, &settings);
        assert_ne!(a, b);
    }

    #[test]
    fn test_zone_id_changes_layout() {
        let settings = ZoneSettings::default();
        let global = GlobalData::default();
        let mut other = sector();
        other.id = ZoneId::new(4);
        let a = generate_zone(9, &settings, &global, &sector(), &[]).expect("valid");
        let b = generate_zone(9, &settings, &global, &other, &[]).expect("valid");
        assert_ne!(a, b);
    }

    #[test]
    fn test_orbits_form_a_tree() {
        for seed in 0..20 {
            let zone = generate(seed, &ZoneSettings::default());
            assert!(zone.orbits[0].parent.is_none());
            assert_eq!(zone.planets[0].orbit, zone.orbits[0].id);
            let tree = OrbitTree::new(zone.orbits.iter().copied());
            assert!(tree.validate().is_empty(), "seed {seed}");
            for orbit in &zone.orbits[1..] {
                let parent = orbit.parent.expect("only the root has no parent");
                assert!(parent < orbit.id, "parents precede children");
            }
        }
    }

    #[test]
    fn test_planets_stay_inside_zone() {
        let settings = ZoneSettings {
            planet_count: FloatRange::new(30.0, 30.0),
            ..ZoneSettings::default()
        };
        let mut small = sector();
        small.radius = 2_000.0;
        let zone = generate_zone(5, &settings, &GlobalData::default(), &small, &[])
            .expect("valid settings");
        for orbit in zone.orbits.iter().filter(|o| o.parent == Some(OrbitId::new(0))) {
            assert!(orbit.distance <= 2_000.0);
        }
    }

    #[test]
    fn test_moon_depth_is_bounded() {
        let settings = ZoneSettings {
            moon_probability: 1.0,
            belt_probability: 0.0,
            max_depth: 3,
            max_moons: 2,
            ..ZoneSettings::default()
        };
        let zone = generate(11, &settings);
        let tree = OrbitTree::new(zone.orbits.iter().copied());
        for orbit in tree.iter() {
            let mut depth = 0;
            let mut current = orbit.parent;
            while let Some(id) = current {
                depth += 1;
                current = tree.get(id).and_then(|o| o.parent);
            }
            assert!(depth <= 3);
        }
        // Planets at depth 1 each carry two moons, each with two more.
        assert!(zone.planets.len() > 1 + 3 * 6);
    }

    #[test]
    fn test_belts_respect_asteroid_bounds() {
        let settings = ZoneSettings {
            belt_probability: 1.0,
            planet_mass: FloatRange::new(20.0, 50.0),
            asteroid_count: FloatRange::new(16.0, 64.0),
            ..ZoneSettings::default()
        };
        let zone = generate(8, &settings);
        let belts: Vec<_> = zone.planets.iter().filter_map(|p| p.belt.as_ref()).collect();
        assert!(!belts.is_empty());
        for belt in belts {
            assert!((16..=64).contains(&belt.asteroids.len()));
            for asteroid in &belt.asteroids {
                assert!((0.5..=3.0).contains(&asteroid.scale));
                assert!((0.0..1.0).contains(&asteroid.phase));
            }
        }
    }

    #[test]
    fn test_resources_follow_classes() {
        let ore = ItemId::new(10);
        let ice = ItemId::new(11);
        let settings = ZoneSettings {
            belt_probability: 0.5,
            resources: vec![
                ResourceDistribution {
                    commodity: ore,
                    density: 0.1,
                    classes: Vec::new(),
                    belts: true,
                },
                ResourceDistribution {
                    commodity: ice,
                    density: 0.1,
                    classes: vec![PlanetClass::Planet, PlanetClass::GasGiant],
                    belts: false,
                },
            ],
            ..ZoneSettings::default()
        };
        let zone = generate(21, &settings);
        for planet in &zone.planets {
            for deposit in &planet.resources {
                if deposit.commodity == ore {
                    assert!(planet.is_belt());
                } else {
                    assert!(!planet.is_belt());
                    assert!(matches!(planet.class, PlanetClass::Planet | PlanetClass::GasGiant));
                }
                assert!(deposit.amount >= settings.min_resource_amount);
            }
        }
    }

    #[test]
    fn test_invalid_inputs_are_rejected() {
        let global = GlobalData::default();
        let bad = ZoneSettings {
            orbit_spacing: FloatRange::new(0.5, 0.9),
            ..ZoneSettings::default()
        };
        assert!(matches!(
            generate_zone(1, &bad, &global, &sector(), &[]),
            Err(GenerationError::InvalidSettings(_))
        ));

        let mut empty = sector();
        empty.radius = 0.0;
        assert_eq!(
            generate_zone(1, &ZoneSettings::default(), &global, &empty, &[]),
            Err(GenerationError::InvalidRadius(0.0))
        );
    }
}
