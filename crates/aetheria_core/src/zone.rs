//! Zones: one star system and everything in it.
//!
//! A zone owns its entities, orbit tree and planets and advances them
//! with [`Zone::update`]. Every tick runs the same fixed pipeline so that
//! identical inputs always produce identical state:
//!
//! 1. Entity updates in ascending id order
//! 2. Deferred damage (beam hits and queued projectile hits)
//! 3. Death pass
//! 4. Detection pass
//! 5. Removal of dead entities
//!
//! Commands issued between ticks (docking, targeting, factory settings)
//! take effect immediately; the events they raise are reported with the
//! next tick's [`TickEvents`].

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::behaviors::TargetInfo;
use crate::components::{EntityId, EntityKind, FactionId, SlotId};
use crate::context::SimulationContext;
use crate::data::{BlueprintId, PlanetClass, SectorZone};
use crate::docking::{check_dock, check_undock, DockRejection};
use crate::entity::Entity;
use crate::error::{CommandRejection, Result, SimError};
use crate::events::{DamageEvent, EntityEvent, TickEvents};
use crate::generation::GeneratedZone;
use crate::loadout::LoadoutGenerator;
use crate::math::Vec2Fixed;
use crate::orbit::{OrbitData, OrbitId, OrbitTree, PlanetData};
use crate::pack::{EntityPack, ZonePack, PACK_VERSION};

/// Station orbit radius as a fraction of its planet's gravity radius.
pub const STATION_ORBIT_FRACTION: f64 = 0.5;

/// Entities of a zone keyed by id.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityStorage {
    entities: BTreeMap<EntityId, Entity>,
    next_id: EntityId,
}

impl Default for EntityStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityStorage {
    /// Create empty entity storage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entities: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Insert an entity and return its new id. Ids are never reused.
    pub fn insert(&mut self, mut entity: Entity) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        entity.set_id(id);
        self.entities.insert(id, entity);
        id
    }

    /// Remove an entity by id.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    /// Get an entity by id.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Get a mutable reference to an entity by id.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Check if an entity exists.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if storage is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Entity ids in ascending order.
    #[must_use]
    pub fn sorted_ids(&self) -> Vec<EntityId> {
        self.entities.keys().copied().collect()
    }

    /// Iterate in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, &Entity)> {
        self.entities.iter()
    }
}

/// Snapshot used by the detection pass.
struct Contact {
    id: EntityId,
    faction: FactionId,
    position: Vec2Fixed,
    visibility: f32,
}

/// One star system.
#[derive(Debug, Clone)]
pub struct Zone {
    sector: SectorZone,
    time: f64,
    tick: u64,
    orbits: OrbitTree,
    planets: Vec<PlanetData>,
    entities: EntityStorage,
    pending_events: Vec<EntityEvent>,
    pending_hits: Vec<(Option<EntityId>, EntityId, f32)>,
    pending_spawned: Vec<EntityId>,
    pending_removed: Vec<EntityId>,
}

impl Zone {
    /// An empty zone with a single root orbit.
    #[must_use]
    pub fn new(sector: SectorZone) -> Self {
        Self::from_layout(sector, vec![OrbitData::root(OrbitId::new(0))], Vec::new())
    }

    /// A zone with a generated layout and no entities.
    #[must_use]
    pub fn from_generated(sector: SectorZone, generated: GeneratedZone) -> Self {
        Self::from_layout(sector, generated.orbits, generated.planets)
    }

    fn from_layout(sector: SectorZone, orbits: Vec<OrbitData>, planets: Vec<PlanetData>) -> Self {
        Self {
            sector,
            time: 0.0,
            tick: 0,
            orbits: OrbitTree::new(orbits),
            planets,
            entities: EntityStorage::new(),
            pending_events: Vec::new(),
            pending_hits: Vec::new(),
            pending_spawned: Vec::new(),
            pending_removed: Vec::new(),
        }
    }

    /// Build a zone from a generated layout and place orbital stations
    /// around its planets.
    ///
    /// Station count and hull come from the context's zone settings. Each
    /// station gets its own orbit around a randomly chosen planet; stars
    /// and asteroid belts never host stations.
    ///
    /// # Errors
    ///
    /// Returns an error if the station hull is unknown or its loadout does
    /// not fit.
    pub fn populate(
        ctx: &SimulationContext,
        seed: u64,
        generated: GeneratedZone,
        sector: SectorZone,
    ) -> Result<Self> {
        let mut zone = Self::from_generated(sector, generated);
        let settings = &ctx.zone_settings;
        let Some(hull) = settings.station_hull else {
            return Ok(zone);
        };

        let mut rng = ChaCha8Rng::seed_from_u64(seed ^ u64::from(zone.sector.id.0).rotate_left(32));
        let mut hosts: Vec<&PlanetData> = zone
            .planets
            .iter()
            .filter(|p| p.class != PlanetClass::Sun && !p.is_belt())
            .collect();
        hosts.shuffle(&mut rng);
        let count = settings.station_count.sample_count(&mut rng) as usize;

        let mut next_orbit = zone.orbits.iter().map(|o| o.id.0 + 1).max().unwrap_or(0);
        let mut placements = Vec::new();
        for planet in hosts.into_iter().take(count) {
            let orbit = OrbitData {
                id: OrbitId::new(next_orbit),
                parent: Some(planet.orbit),
                distance: f64::from(planet.gravity_radius(&ctx.global)) * STATION_ORBIT_FRACTION,
                phase: rng.gen_range(0.0..1.0),
            };
            next_orbit += 1;
            placements.push((orbit, planet.name.clone()));
        }

        let orbits = zone.orbits.iter().copied().chain(placements.iter().map(|(o, _)| *o));
        zone.orbits = OrbitTree::new(orbits.collect::<Vec<_>>());

        let mut loadouts = LoadoutGenerator::new(&ctx.items, rng.gen());
        for (orbit, planet) in placements {
            let mut pack = loadouts.for_hull(hull)?;
            pack.name = format!("{planet} Station");
            pack.orbit = Some(orbit.id);
            pack.position = zone.orbit_position(orbit.id, 0.0, ctx).unwrap_or(Vec2Fixed::ZERO);
            zone.spawn(ctx, &pack)?;
        }

        tracing::info!(
            zone = zone.sector.id.0,
            stations = zone.entities.len(),
            "Zone populated"
        );
        Ok(zone)
    }

    /// Sector this zone belongs to.
    #[must_use]
    pub const fn sector(&self) -> &SectorZone {
        &self.sector
    }

    /// Simulation time in seconds.
    #[must_use]
    pub const fn time(&self) -> f64 {
        self.time
    }

    /// Ticks run so far.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Orbit tree.
    #[must_use]
    pub const fn orbits(&self) -> &OrbitTree {
        &self.orbits
    }

    /// Planets, stars and belts.
    #[must_use]
    pub fn planets(&self) -> &[PlanetData] {
        &self.planets
    }

    /// Entity storage.
    #[must_use]
    pub const fn entities(&self) -> &EntityStorage {
        &self.entities
    }

    /// Get an entity by id.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Get a mutable entity by id.
    ///
    /// Docking, targeting and removal go through the zone so that both
    /// sides of a relation stay in sync.
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    fn orbit_position(&self, orbit: OrbitId, time: f64, ctx: &SimulationContext) -> Option<Vec2Fixed> {
        self.orbits
            .position(orbit, time, &ctx.global)
            .map(|(x, y)| Vec2Fixed::from_f64(x, y))
    }

    /// Add an entity and everything docked with it. Returns the host id.
    ///
    /// All entities are built before any is inserted, so a pack that
    /// fails leaves the zone untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if any loadout is invalid or a host has fewer
    /// docking bays than docked children.
    pub fn spawn(&mut self, ctx: &SimulationContext, pack: &EntityPack) -> Result<EntityId> {
        let mut built = Vec::with_capacity(pack.count());
        build_tree(ctx, pack, None, &mut built)?;

        let mut ids: Vec<EntityId> = Vec::with_capacity(built.len());
        for (mut entity, host) in built {
            let id = self.entities.next_id;
            if let Some(host_index) = host {
                let host_id = ids[host_index];
                if let Some(host) = self.entities.get_mut(host_id) {
                    entity.set_position(host.position());
                    entity.set_velocity(Vec2Fixed::ZERO);
                    entity.set_parent(Some(host_id));
                    host.children_mut().push(id);
                    if let Some(bay) = host.docking_bays_mut().iter_mut().find(|b| b.is_free()) {
                        bay.set_occupant(Some(id));
                    }
                }
            }
            let inserted = self.entities.insert(entity);
            debug_assert_eq!(inserted, id);
            self.pending_spawned.push(inserted);
            ids.push(inserted);
        }
        tracing::debug!(entity = ids[0], count = ids.len(), "Entity spawned");
        Ok(ids[0])
    }

    /// Remove an entity now. Docked children are ejected in place.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let entity = self.entities.remove(id)?;
        self.detach(&entity);
        self.pending_removed.push(id);
        Some(entity)
    }

    fn detach(&mut self, entity: &Entity) {
        let id = entity.id();
        for child in entity.children() {
            if let Some(child) = self.entities.get_mut(*child) {
                child.set_parent(None);
            }
        }
        if let Some(host) = entity.parent().and_then(|h| self.entities.get_mut(h)) {
            host.children_mut().retain(|c| *c != id);
            for bay in host.docking_bays_mut() {
                if bay.occupant() == Some(id) {
                    bay.set_occupant(None);
                }
            }
        }
        for other in self.entities.entities.values_mut() {
            if other.target() == Some(id) {
                other.set_target(None);
                self.pending_events.push(EntityEvent::TargetChanged {
                    entity: other.id(),
                    target: None,
                });
            }
        }
    }

    /// Dock `ship` with `host`.
    ///
    /// # Errors
    ///
    /// Returns the rule the request breaks; nothing changes in that case.
    pub fn dock(
        &mut self,
        ctx: &SimulationContext,
        ship: EntityId,
        host: EntityId,
    ) -> std::result::Result<(), DockRejection> {
        let ship_entity = self.entities.get(ship).ok_or(DockRejection::NoSuchEntity)?;
        let host_entity = self.entities.get(host).ok_or(DockRejection::NoSuchEntity)?;
        let result = check_dock(ship_entity, host_entity, &ctx.global);
        tracing::debug!(ship, host, ?result, "Dock request");
        let bay = result?;
        let anchor = host_entity.position();

        if let Some(host_entity) = self.entities.get_mut(host) {
            host_entity.docking_bays_mut()[bay].set_occupant(Some(ship));
            host_entity.children_mut().push(ship);
        }
        if let Some(ship_entity) = self.entities.get_mut(ship) {
            ship_entity.set_parent(Some(host));
            ship_entity.set_position(anchor);
            ship_entity.set_velocity(Vec2Fixed::ZERO);
        }
        self.pending_events.push(EntityEvent::Docked { entity: ship, host });
        Ok(())
    }

    /// Undock `ship` from its host.
    ///
    /// # Errors
    ///
    /// Returns the rule the request breaks; nothing changes in that case.
    pub fn undock(&mut self, ship: EntityId) -> std::result::Result<(), DockRejection> {
        let ship_entity = self.entities.get(ship).ok_or(DockRejection::NoSuchEntity)?;
        let host = ship_entity.parent().ok_or(DockRejection::NotDocked)?;
        let host_entity = self.entities.get(host).ok_or(DockRejection::NoSuchEntity)?;
        let result = check_undock(ship_entity, host_entity);
        tracing::debug!(ship, host, ?result, "Undock request");
        let bay = result?;

        if let Some(host_entity) = self.entities.get_mut(host) {
            host_entity.docking_bays_mut()[bay].set_occupant(None);
            host_entity.children_mut().retain(|c| *c != ship);
        }
        if let Some(ship_entity) = self.entities.get_mut(ship) {
            ship_entity.set_parent(None);
        }
        self.pending_events.push(EntityEvent::Undocked { entity: ship, host });
        Ok(())
    }

    /// Set or clear an entity's target.
    ///
    /// # Errors
    ///
    /// Rejects missing or dead entities, missing targets and self targeting.
    pub fn set_target(
        &mut self,
        id: EntityId,
        target: Option<EntityId>,
    ) -> std::result::Result<(), CommandRejection> {
        if target == Some(id) {
            return Err(CommandRejection::SelfTarget);
        }
        if let Some(target) = target {
            if !self.entities.contains(target) {
                return Err(CommandRejection::NoSuchEntity);
            }
        }
        let entity = self.live_entity_mut(id)?;
        if entity.set_target(target) {
            self.pending_events.push(EntityEvent::TargetChanged { entity: id, target });
        }
        Ok(())
    }

    /// Select a factory blueprint. Returns whether it changed.
    ///
    /// # Errors
    ///
    /// Rejects missing or dead entities and anything
    /// [`Entity::set_blueprint`] rejects.
    pub fn set_blueprint(
        &mut self,
        ctx: &SimulationContext,
        id: EntityId,
        slot: SlotId,
        blueprint: Option<BlueprintId>,
    ) -> std::result::Result<bool, CommandRejection> {
        let changed = self.live_entity_mut(id)?.set_blueprint(&ctx.items, slot, blueprint)?;
        if changed {
            self.pending_events.push(EntityEvent::ToolingUpdated { entity: id, slot });
        }
        Ok(changed)
    }

    /// Queue damage from a projectile that reached `target`. Applied with
    /// the next tick's deferred damage.
    ///
    /// # Errors
    ///
    /// Rejects missing or dead targets.
    pub fn apply_hit(
        &mut self,
        source: Option<EntityId>,
        target: EntityId,
        damage: f32,
    ) -> std::result::Result<(), CommandRejection> {
        self.live_entity_mut(target)?;
        self.pending_hits.push((source, target, damage));
        Ok(())
    }

    fn live_entity_mut(&mut self, id: EntityId) -> std::result::Result<&mut Entity, CommandRejection> {
        let entity = self.entities.get_mut(id).ok_or(CommandRejection::NoSuchEntity)?;
        if !entity.is_alive() {
            return Err(CommandRejection::Dead);
        }
        Ok(entity)
    }

    /// Advance the zone by `delta` seconds.
    pub fn update(&mut self, ctx: &SimulationContext, delta: f32) -> TickEvents {
        let mut events = TickEvents {
            events: std::mem::take(&mut self.pending_events),
            ..TickEvents::default()
        };
        let mut hits = std::mem::take(&mut self.pending_hits);
        let end_time = self.time + f64::from(delta.max(0.0));
        let ids = self.entities.sorted_ids();

        // 1. Entities, hosts before what is docked with them
        for id in self.update_order() {
            let Some(entity) = self.entities.get(id) else {
                continue;
            };
            let target = entity
                .target()
                .and_then(|t| self.entities.get(t))
                .filter(|t| t.is_alive())
                .map(|t| TargetInfo {
                    id: t.id(),
                    distance: entity.position().distance(t.position()).to_num(),
                });
            let anchor = match (entity.parent(), entity.orbit()) {
                (Some(host), _) => self.entities.get(host).map(Entity::position),
                (None, Some(orbit)) if entity.kind() == EntityKind::Orbital => {
                    self.orbit_position(orbit, end_time, ctx)
                }
                _ => None,
            };
            if let Some(entity) = self.entities.get_mut(id) {
                let dealt = entity.update(ctx, delta, target, anchor, &mut events.events);
                hits.extend(dealt.into_iter().map(|(t, d)| (Some(id), t, d)));
            }
        }

        // 2. Deferred damage
        for (source, target, damage) in hits {
            if let Some(entity) = self.entities.get_mut(target) {
                if !entity.is_alive() {
                    continue;
                }
                let (shielded, hull) = entity.apply_damage(damage);
                events.damage.push(DamageEvent {
                    source,
                    target,
                    shielded,
                    hull,
                });
            }
        }

        // 3. Deaths
        let mut dead = Vec::new();
        for &id in &ids {
            let Some(entity) = self.entities.get_mut(id) else {
                continue;
            };
            if let Some(cause) = entity.lethal_condition() {
                if entity.kill() {
                    tracing::info!(entity = id, %cause, tick = self.tick, "Entity died");
                    events.deaths.push((id, cause));
                    events.events.push(EntityEvent::Death { entity: id, cause });
                    dead.push(id);
                }
            }
        }

        // 4. Detection
        self.detect(ctx, &mut events.events);

        // 5. Removals
        for id in dead {
            self.remove(id);
        }
        events.events.append(&mut self.pending_events);
        events.spawned = std::mem::take(&mut self.pending_spawned);
        events.removed = std::mem::take(&mut self.pending_removed);

        self.time = end_time;
        self.tick += 1;

        #[cfg(any(debug_assertions, feature = "debug-validation"))]
        {
            let hash = self.state_hash();
            tracing::debug!(tick = self.tick, state_hash = hash, "Zone state hash");
        }

        events
    }

    fn update_order(&self) -> Vec<EntityId> {
        let mut ids = self.entities.sorted_ids();
        ids.sort_by_cached_key(|&id| self.dock_depth(id));
        ids
    }

    /// Number of hosts above `id`.
    fn dock_depth(&self, id: EntityId) -> usize {
        let mut depth = 0;
        let mut host = self.entities.get(id).and_then(Entity::parent);
        while let Some(current) = host {
            depth += 1;
            if depth > self.entities.len() {
                break;
            }
            host = self.entities.get(current).and_then(Entity::parent);
        }
        depth
    }

    fn detect(&mut self, ctx: &SimulationContext, events: &mut Vec<EntityEvent>) {
        let contacts: Vec<Contact> = self
            .entities
            .iter()
            .filter(|(_, e)| e.is_alive() && e.parent().is_none())
            .map(|(&id, e)| Contact {
                id,
                faction: e.faction(),
                position: e.position(),
                visibility: e.visibility(),
            })
            .collect();
        let threshold = ctx.global.detection_threshold;

        for entity in self.entities.entities.values_mut() {
            let mut visible = BTreeSet::new();
            if let (true, Some((sensitivity, range))) = (entity.is_alive(), entity.sensor()) {
                for contact in &contacts {
                    if contact.id == entity.id() || !entity.faction().is_hostile_to(contact.faction) {
                        continue;
                    }
                    let distance: f32 = entity.position().distance(contact.position).to_num();
                    if distance > range {
                        continue;
                    }
                    let falloff = range / distance.max(1.0);
                    if contact.visibility * sensitivity * falloff * falloff >= threshold {
                        visible.insert(contact.id);
                    }
                }
            }
            let (added, removed) = entity.set_visible_hostiles(visible);
            let id = entity.id();
            events.extend(
                added
                    .into_iter()
                    .map(|hostile| EntityEvent::VisibleHostileAdded { entity: id, hostile }),
            );
            events.extend(
                removed
                    .into_iter()
                    .map(|hostile| EntityEvent::VisibleHostileRemoved { entity: id, hostile }),
            );
        }
    }

    /// Hash of the simulation state, for desync detection.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.tick.hash(&mut hasher);
        self.time.to_bits().hash(&mut hasher);
        self.entities.len().hash(&mut hasher);
        for (id, entity) in self.entities.iter() {
            id.hash(&mut hasher);
            entity.position().hash(&mut hasher);
            entity.velocity().hash(&mut hasher);
            entity.heat().to_bits().hash(&mut hasher);
            entity.energy().to_bits().hash(&mut hasher);
            entity.hull_durability().to_bits().hash(&mut hasher);
            entity.is_alive().hash(&mut hasher);
            entity.parent().hash(&mut hasher);
            entity.target().hash(&mut hasher);
            for bay in entity.cargo() {
                bay.contents().len().hash(&mut hasher);
                for item in bay.contents() {
                    item.item_id().hash(&mut hasher);
                    item.quantity().hash(&mut hasher);
                }
            }
        }
        hasher.finish()
    }

    /// Snapshot the whole zone.
    #[must_use]
    pub fn to_pack(&self) -> ZonePack {
        let entities = self
            .entities
            .iter()
            .filter(|(_, e)| e.parent().is_none())
            .map(|(_, e)| self.pack_tree(e))
            .collect();
        ZonePack {
            version: PACK_VERSION,
            sector: self.sector.clone(),
            time: self.time,
            tick: self.tick,
            orbits: self.orbits.iter().copied().collect(),
            planets: self.planets.clone(),
            entities,
        }
    }

    fn pack_tree(&self, entity: &Entity) -> EntityPack {
        let mut pack = entity.to_pack();
        pack.children = entity
            .children()
            .iter()
            .filter_map(|c| self.entities.get(*c))
            .map(|c| self.pack_tree(c))
            .collect();
        pack
    }

    /// Rebuild a zone from a snapshot. Entities get fresh ids.
    ///
    /// # Errors
    ///
    /// Returns an error if the orbit tree is malformed or any entity pack
    /// fails to unpack.
    pub fn from_pack(ctx: &SimulationContext, pack: &ZonePack) -> Result<Self> {
        let mut zone = Self::from_layout(pack.sector.clone(), pack.orbits.clone(), pack.planets.clone());
        let errors = zone.orbits.validate();
        if !errors.is_empty() {
            return Err(SimError::ValidationFailed(errors));
        }
        zone.time = pack.time;
        zone.tick = pack.tick;
        for entity in &pack.entities {
            zone.spawn(ctx, entity)?;
        }
        zone.pending_spawned.clear();
        Ok(zone)
    }
}

fn build_tree(
    ctx: &SimulationContext,
    pack: &EntityPack,
    host: Option<usize>,
    out: &mut Vec<(Entity, Option<usize>)>,
) -> Result<()> {
    let entity = Entity::from_pack(&ctx.items, pack)?;
    if pack.children.len() > entity.docking_bays().len() {
        return Err(SimError::InvalidLoadout(format!(
            "{} has {} docking bays but {} docked entities",
            pack.name,
            entity.docking_bays().len(),
            pack.children.len()
        )));
    }
    let index = out.len();
    out.push((entity, host));
    for child in &pack.children {
        build_tree(ctx, child, Some(index), out)?;
    }
    Ok(())
}
