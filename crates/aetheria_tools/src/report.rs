//! JSON reports for generated zones and headless simulation runs.

use aetheria_core::context::SimulationContext;
use aetheria_core::data::SectorZone;
use aetheria_core::error::Result;
use aetheria_core::events::EntityEvent;
use aetheria_core::generation::generate_zone;
use aetheria_core::loadout::LoadoutGenerator;
use aetheria_core::prelude::{EntityKind, FactionId, SlotId, Vec2Fixed};
use aetheria_core::zone::Zone;
use serde::Serialize;

/// One celestial body.
#[derive(Debug, Clone, Serialize)]
pub struct BodyReport {
    /// Display name.
    pub name: String,
    /// Mass class.
    pub class: String,
    /// Mass.
    pub mass: f32,
    /// Distance from the parent body.
    pub orbit_distance: f64,
    /// Asteroids, zero unless the body is a belt.
    pub asteroids: usize,
    /// Deposits as `(commodity id, amount)`.
    pub resources: Vec<(u32, f32)>,
}

/// One placed entity.
#[derive(Debug, Clone, Serialize)]
pub struct EntityReport {
    /// Entity id.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Position at report time.
    pub position: (f32, f32),
}

/// A generated and populated zone.
#[derive(Debug, Clone, Serialize)]
pub struct ZoneReport {
    /// Sector name.
    pub sector: String,
    /// Generation seed.
    pub seed: u64,
    /// Orbits, including the root and station orbits.
    pub orbits: usize,
    /// Bodies in id order.
    pub bodies: Vec<BodyReport>,
    /// Asteroids across every belt.
    pub asteroids: usize,
    /// Stations placed by population.
    pub stations: Vec<EntityReport>,
    /// Wormhole exits as `(destination zone id, position)`.
    pub wormholes: Vec<(u32, (f32, f32))>,
}

/// Outcome of a headless run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SimulationReport {
    /// Ticks simulated.
    pub ticks: u64,
    /// Simulated seconds.
    pub time: f64,
    /// Final state hash.
    pub state_hash: u64,
    /// Entities at the start of the run.
    pub entities: usize,
    /// Entities alive at the end.
    pub survivors: usize,
    /// Deaths as `(entity id, cause)`.
    pub deaths: Vec<(u64, String)>,
    /// Projectile shots fired.
    pub shots: usize,
    /// Damage soaked by shields.
    pub shielded: f32,
    /// Damage that reached hulls.
    pub hull_damage: f32,
    /// Items produced by factories.
    pub produced: usize,
}

/// Generate a zone for `sector` and place its stations.
///
/// # Errors
///
/// Returns an error if generation or station placement fails.
pub fn generate(ctx: &SimulationContext, seed: u64, sector: SectorZone) -> Result<Zone> {
    let settings = &ctx.zone_settings;
    let generated = generate_zone(seed, settings, &ctx.global, &sector, &settings.resources)?;
    Zone::populate(ctx, seed, generated, sector)
}

/// Describe a zone.
#[must_use]
pub fn zone_report(zone: &Zone, seed: u64, neighbours: &[SectorZone]) -> ZoneReport {
    let bodies: Vec<BodyReport> = zone
        .planets()
        .iter()
        .map(|p| BodyReport {
            name: p.name.clone(),
            class: format!("{:?}", p.class),
            mass: p.mass,
            orbit_distance: zone.orbits().get(p.orbit).map_or(0.0, |o| o.distance),
            asteroids: p.belt.as_ref().map_or(0, |b| b.asteroids.len()),
            resources: p.resources.iter().map(|r| (r.commodity.0, r.amount)).collect(),
        })
        .collect();
    let stations = zone
        .entities()
        .iter()
        .filter(|(_, e)| e.kind() == EntityKind::Orbital)
        .map(|(&id, e)| EntityReport {
            id,
            name: e.name().to_string(),
            position: e.position().to_f32(),
        })
        .collect();
    let sector = zone.sector();
    let wormholes = neighbours
        .iter()
        .filter(|n| n.id != sector.id)
        .map(|n| (n.id.0, sector.wormhole_position(n)))
        .collect();

    ZoneReport {
        sector: sector.name.clone(),
        seed,
        orbits: zone.orbits().len(),
        asteroids: bodies.iter().map(|b| b.asteroids).sum(),
        bodies,
        stations,
        wormholes,
    }
}

/// Add two hostile squads of `ships` random ships each, facing each other
/// across the zone center, all weapons on and targeting the other
/// squad's first ship.
///
/// # Errors
///
/// Returns an error if a generated loadout fails to unpack.
pub fn add_skirmish(zone: &mut Zone, ctx: &SimulationContext, seed: u64, ships: usize) -> Result<()> {
    let mut squads: Vec<Vec<u64>> = Vec::with_capacity(2);
    for (side, x) in [(1u32, -300.0f32), (2, 300.0)] {
        let mut loadouts =
            LoadoutGenerator::new(&ctx.items, seed.wrapping_add(u64::from(side))).with_faction(FactionId::new(side));
        let mut squad = Vec::with_capacity(ships);
        for i in 0..ships {
            let Some(pack) = loadouts.ship(|_| true) else {
                tracing::warn!("Item database has no ship hulls");
                return Ok(());
            };
            let pack = pack.at(Vec2Fixed::from_f32(x, (i as f32 - ships as f32 / 2.0) * 40.0));
            squad.push(zone.spawn(ctx, &pack)?);
        }
        squads.push(squad);
    }

    for (squad, enemies) in [(&squads[0], &squads[1]), (&squads[1], &squads[0])] {
        for &id in squad {
            if let Some(&target) = enemies.first() {
                if let Err(e) = zone.set_target(id, Some(target)) {
                    tracing::debug!(entity = id, %e, "Target rejected");
                }
            }
            if let Some(entity) = zone.entity_mut(id) {
                for slot in 0..entity.slots().len() {
                    let _ = entity.activate_slot(SlotId::new(slot as u16));
                }
            }
        }
    }
    Ok(())
}

/// Run `ticks` ticks of `delta` seconds and summarize what happened.
pub fn simulate(zone: &mut Zone, ctx: &SimulationContext, ticks: u64, delta: f32) -> SimulationReport {
    let mut report = SimulationReport {
        entities: zone.entities().len(),
        ..SimulationReport::default()
    };
    for _ in 0..ticks {
        let events = zone.update(ctx, delta);
        for event in &events.events {
            match event {
                EntityEvent::WeaponFired { .. } => report.shots += 1,
                EntityEvent::ItemProduced { .. } => report.produced += 1,
                _ => {}
            }
        }
        for damage in &events.damage {
            report.shielded += damage.shielded;
            report.hull_damage += damage.hull;
        }
        report
            .deaths
            .extend(events.deaths.iter().map(|(id, cause)| (*id, cause.to_string())));
    }
    report.ticks = ticks;
    report.time = zone.time();
    report.state_hash = zone.state_hash();
    report.survivors = zone.entities().iter().filter(|(_, e)| e.is_alive()).count();
    tracing::info!(
        ticks,
        deaths = report.deaths.len(),
        state_hash = report.state_hash,
        "Simulation finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use aetheria_core::data::ZoneId;
    use aetheria_test_utils::fixtures;

    #[test]
    fn test_generated_report_is_stable() {
        let ctx = fixtures::context();
        let sector = fixtures::sector();
        let a = zone_report(&generate(&ctx, 11, sector.clone()).unwrap(), 11, &[]);
        let b = zone_report(&generate(&ctx, 11, sector).unwrap(), 11, &[]);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
        assert!(!a.bodies.is_empty());
        assert!(!a.stations.is_empty());
    }

    #[test]
    fn test_wormholes_skip_own_sector() {
        let ctx = fixtures::context();
        let sector = fixtures::sector();
        let east = SectorZone::new(ZoneId::new(2), "East", (100.0, 0.0), 3000.0);
        let zone = generate(&ctx, 3, sector.clone()).unwrap();
        let report = zone_report(&zone, 3, &[sector, east]);
        assert_eq!(report.wormholes.len(), 1);
        let (id, (x, y)) = report.wormholes[0];
        assert_eq!(id, 2);
        assert!(x > 4000.0 && y.abs() < 1e-3);
    }

    #[test]
    fn test_skirmish_run_fights() {
        let ctx = fixtures::context();
        let mut zone = Zone::new(fixtures::sector());
        add_skirmish(&mut zone, &ctx, 5, 3).unwrap();
        let report = simulate(&mut zone, &ctx, 100, 0.1);
        assert_eq!(report.entities, 6);
        assert_eq!(report.ticks, 100);
        assert!((report.time - 10.0).abs() < 1e-6);
        assert!(report.survivors + report.deaths.len() == report.entities);
    }
}
