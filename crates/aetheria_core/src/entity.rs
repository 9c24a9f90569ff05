//! Simulated entities: ships, turrets and orbital stations.
//!
//! An entity is a hull plus the gear equipped on its hardpoints. Gear
//! behaviors drive everything else: reactors fill the energy store,
//! thrusters change velocity, weapons and factories draw energy and add
//! heat. One [`Entity::update`] runs the whole pipeline for one tick:
//!
//! 1. Position: integrate velocity, or follow the anchor (orbit or host)
//! 2. Behaviors: every enabled gear in hardpoint order
//! 3. Apply the aggregated heat, energy, velocity and visibility at once
//! 4. Dissipate heat, clamp energy and speed
//! 5. Heatstroke and hypothermia exposure
//!
//! Deaths are decided by the zone after cross-entity damage is applied.

use std::collections::{BTreeMap, BTreeSet};

use crate::behaviors::{Behavior, BehaviorContext, Factory, TargetInfo, TickAccumulator};
use crate::components::{CauseOfDeath, EntityId, EntityKind, FactionId, SlotId};
use crate::context::SimulationContext;
use crate::data::{BlueprintId, GlobalData, HullData, ItemDatabase, ItemId};
use crate::docking::DockingBay;
use crate::error::{CommandRejection, Result, SimError};
use crate::events::EntityEvent;
use crate::items::{store_in, CargoBay, Gear};
use crate::math::{fixed_from_f32, Vec2Fixed};
use crate::orbit::OrbitId;
use crate::pack::{EntityPack, FactorySettings, GearPack};
use crate::stats::EntityCondition;

/// Tractor power change per second.
pub const TRACTOR_RAMP_RATE: f32 = 2.0;

/// Exposure at which heatstroke or hypothermia kills.
pub const LETHAL_EXPOSURE: f32 = 1.0;

/// Gear mounted on a hardpoint together with its live behaviors.
#[derive(Debug, Clone, PartialEq)]
pub struct EquippedGear {
    /// The item instance.
    pub gear: Gear,
    behaviors: Vec<Behavior>,
}

impl EquippedGear {
    /// Live behaviors in definition order.
    #[must_use]
    pub fn behaviors(&self) -> &[Behavior] {
        &self.behaviors
    }

    /// Mutable behaviors.
    pub fn behaviors_mut(&mut self) -> &mut [Behavior] {
        &mut self.behaviors
    }
}

/// A ship, turret or orbital station.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    id: EntityId,
    name: String,
    hull: HullData,
    faction: FactionId,
    position: Vec2Fixed,
    velocity: Vec2Fixed,
    direction: f32,
    movement: (f32, f32),
    heat: f32,
    energy: f32,
    hull_durability: f32,
    slots: Vec<Option<EquippedGear>>,
    cargo: Vec<CargoBay>,
    docking_bays: Vec<DockingBay>,
    parent: Option<EntityId>,
    children: Vec<EntityId>,
    target: Option<EntityId>,
    orbit: Option<OrbitId>,
    tractor_power: f32,
    tractor_request: f32,
    active: bool,
    alive: bool,
    heatstroke: f32,
    hypothermia: f32,
    visibility_sources: BTreeMap<SlotId, f32>,
    visible_hostiles: BTreeSet<EntityId>,
    sensor: Option<(f32, f32)>,
    speed_limit: Option<f32>,
    life_support: Option<bool>,
}

impl Entity {
    /// Create an entity with nothing equipped.
    ///
    /// The id is assigned when the entity is added to a zone.
    #[must_use]
    pub fn from_hull(hull: &HullData) -> Self {
        Self {
            id: 0,
            name: hull.name.clone(),
            hull: hull.clone(),
            faction: FactionId::default(),
            position: Vec2Fixed::ZERO,
            velocity: Vec2Fixed::ZERO,
            direction: 0.0,
            movement: (0.0, 0.0),
            heat: 0.0,
            energy: 0.0,
            hull_durability: hull.durability,
            slots: vec![None; hull.hardpoints.len()],
            cargo: hull.cargo_bays.iter().map(|&c| CargoBay::new(c)).collect(),
            docking_bays: (0..hull.docking_bays)
                .map(|_| DockingBay::new(hull.docking_bay_capacity))
                .collect(),
            parent: None,
            children: Vec::new(),
            target: None,
            orbit: None,
            tractor_power: 0.0,
            tractor_request: 0.0,
            active: true,
            alive: true,
            heatstroke: 0.0,
            hypothermia: 0.0,
            visibility_sources: BTreeMap::new(),
            visible_hostiles: BTreeSet::new(),
            sensor: None,
            speed_limit: None,
            life_support: None,
        }
    }

    /// Create an empty entity from a hull id.
    ///
    /// # Errors
    ///
    /// Returns an error if the id does not name a hull.
    pub fn new(items: &ItemDatabase, hull: ItemId) -> Result<Self> {
        Ok(Self::from_hull(items.require_hull(hull)?))
    }

    /// Rebuild an entity from a pack, without its docked children.
    ///
    /// Energy and hull durability default to full when the pack leaves
    /// them out.
    ///
    /// # Errors
    ///
    /// Returns an error if the hull or any gear is unknown, gear does not
    /// fit its hardpoint, or the cargo layout does not match the hull.
    pub fn from_pack(items: &ItemDatabase, pack: &EntityPack) -> Result<Self> {
        let mut entity = Self::new(items, pack.hull)?;
        entity.name.clone_from(&pack.name);
        entity.faction = pack.faction;
        entity.position = pack.position;
        entity.velocity = pack.velocity;
        entity.direction = pack.direction;
        entity.heat = pack.heat.max(0.0);
        entity.orbit = pack.orbit;
        entity.active = pack.active;

        for gear in &pack.gear {
            entity.equip(items, gear.slot, gear.gear.clone())?;
            if let Some(settings) = gear.factory {
                if let Some(factory) = entity.factory_mut(gear.slot) {
                    factory.restore(settings.blueprint, settings.quality);
                }
            }
        }

        if !pack.cargo.is_empty() {
            if pack.cargo.len() != entity.cargo.len() {
                return Err(SimError::InvalidLoadout(format!(
                    "{} has {} cargo bays, pack has {}",
                    entity.hull.name,
                    entity.cargo.len(),
                    pack.cargo.len()
                )));
            }
            entity.cargo.clone_from(&pack.cargo);
        }
        if !pack.docking_bays.is_empty() {
            if pack.docking_bays.len() != entity.docking_bays.len() {
                return Err(SimError::InvalidLoadout(format!(
                    "{} has {} docking bays, pack has {}",
                    entity.hull.name,
                    entity.docking_bays.len(),
                    pack.docking_bays.len()
                )));
            }
            for (bay, cargo) in entity.docking_bays.iter_mut().zip(&pack.docking_bays) {
                bay.cargo = cargo.clone();
            }
        }

        let capacitance = entity.capacitance().unwrap_or(0.0);
        entity.energy = pack.energy.unwrap_or(capacitance).clamp(0.0, capacitance);
        entity.hull_durability = pack
            .hull_durability
            .unwrap_or(entity.hull.durability)
            .clamp(0.0, entity.hull.durability);
        Ok(entity)
    }

    /// Snapshot this entity. Docked children are packed by the zone.
    #[must_use]
    pub fn to_pack(&self) -> EntityPack {
        let gear = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                let equipped = slot.as_ref()?;
                let slot = SlotId::new(index as u16);
                let factory = self.factory(slot).map(|f| FactorySettings {
                    blueprint: f.blueprint(),
                    quality: f.quality(),
                });
                Some(GearPack {
                    slot,
                    gear: equipped.gear.clone(),
                    factory,
                })
            })
            .collect();
        EntityPack {
            name: self.name.clone(),
            hull: self.hull.id,
            faction: self.faction,
            position: self.position,
            velocity: self.velocity,
            direction: self.direction,
            heat: self.heat,
            energy: Some(self.energy),
            hull_durability: Some(self.hull_durability),
            gear,
            cargo: self.cargo.clone(),
            docking_bays: self.docking_bays.iter().map(|b| b.cargo.clone()).collect(),
            orbit: self.orbit,
            active: self.active,
            children: Vec::new(),
        }
    }

    /// Entity id.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Hull definition.
    #[must_use]
    pub const fn hull(&self) -> &HullData {
        &self.hull
    }

    /// Ship, turret or orbital.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        self.hull.kind
    }

    /// Owning faction.
    #[must_use]
    pub const fn faction(&self) -> FactionId {
        self.faction
    }

    /// Change faction.
    pub fn set_faction(&mut self, faction: FactionId) {
        self.faction = faction;
    }

    /// Position.
    #[must_use]
    pub const fn position(&self) -> Vec2Fixed {
        self.position
    }

    /// Teleport.
    pub fn set_position(&mut self, position: Vec2Fixed) {
        self.position = position;
    }

    /// Velocity.
    #[must_use]
    pub const fn velocity(&self) -> Vec2Fixed {
        self.velocity
    }

    /// Overwrite velocity.
    pub fn set_velocity(&mut self, velocity: Vec2Fixed) {
        self.velocity = velocity;
    }

    /// Facing in radians.
    #[must_use]
    pub const fn direction(&self) -> f32 {
        self.direction
    }

    /// Throttle input.
    #[must_use]
    pub const fn movement(&self) -> (f32, f32) {
        self.movement
    }

    /// Set throttle input. Longer inputs are shortened to length one.
    pub fn set_movement(&mut self, x: f32, y: f32) {
        let length = (x * x + y * y).sqrt();
        self.movement = if length > 1.0 {
            (x / length, y / length)
        } else if length.is_finite() {
            (x, y)
        } else {
            (0.0, 0.0)
        };
    }

    /// Heat.
    #[must_use]
    pub const fn heat(&self) -> f32 {
        self.heat
    }

    /// Heat per unit of heat capacity.
    #[must_use]
    pub fn temperature(&self) -> f32 {
        self.heat / self.hull.heat_capacity.max(f32::EPSILON)
    }

    /// Stored energy.
    #[must_use]
    pub const fn energy(&self) -> f32 {
        self.energy
    }

    /// Remaining hull durability.
    #[must_use]
    pub const fn hull_durability(&self) -> f32 {
        self.hull_durability
    }

    /// Host this entity is docked with.
    #[must_use]
    pub const fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: Option<EntityId>) {
        self.parent = parent;
    }

    /// Entities docked here, in docking order.
    #[must_use]
    pub fn children(&self) -> &[EntityId] {
        &self.children
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<EntityId> {
        &mut self.children
    }

    /// Current target.
    #[must_use]
    pub const fn target(&self) -> Option<EntityId> {
        self.target
    }

    /// Set the target. Returns whether it changed.
    pub(crate) fn set_target(&mut self, target: Option<EntityId>) -> bool {
        let changed = self.target != target;
        self.target = target;
        changed
    }

    /// Orbit an orbital entity is bound to.
    #[must_use]
    pub const fn orbit(&self) -> Option<OrbitId> {
        self.orbit
    }

    /// Bind to an orbit. Bound entities follow it every tick.
    pub fn set_orbit(&mut self, orbit: Option<OrbitId>) {
        self.orbit = orbit;
    }

    /// Current tractor beam power, `0..=1`.
    #[must_use]
    pub const fn tractor_power(&self) -> f32 {
        self.tractor_power
    }

    /// Request a tractor power level. Power ramps toward it over time.
    pub fn set_tractor(&mut self, request: f32) {
        self.tractor_request = if request.is_nan() {
            0.0
        } else {
            request.clamp(0.0, 1.0)
        };
    }

    /// Whether the entity updates.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Pause or resume updates.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Whether the entity is alive.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.alive
    }

    /// Heatstroke exposure, lethal at [`LETHAL_EXPOSURE`].
    #[must_use]
    pub const fn heatstroke(&self) -> f32 {
        self.heatstroke
    }

    /// Hypothermia exposure, lethal at [`LETHAL_EXPOSURE`].
    #[must_use]
    pub const fn hypothermia(&self) -> f32 {
        self.hypothermia
    }

    /// Hostiles currently seen by this entity's sensors.
    #[must_use]
    pub const fn visible_hostiles(&self) -> &BTreeSet<EntityId> {
        &self.visible_hostiles
    }

    /// Best running sensor as `(sensitivity, range)`.
    #[must_use]
    pub const fn sensor(&self) -> Option<(f32, f32)> {
        self.sensor
    }

    /// Speed cap from the last tick's running thrusters.
    #[must_use]
    pub const fn speed_limit(&self) -> Option<f32> {
        self.speed_limit
    }

    /// Cargo bays.
    #[must_use]
    pub fn cargo(&self) -> &[CargoBay] {
        &self.cargo
    }

    /// Mutable cargo bays.
    pub fn cargo_mut(&mut self) -> &mut [CargoBay] {
        &mut self.cargo
    }

    /// Docking bays offered to other ships.
    #[must_use]
    pub fn docking_bays(&self) -> &[DockingBay] {
        &self.docking_bays
    }

    /// Mutable docking bays.
    pub fn docking_bays_mut(&mut self) -> &mut [DockingBay] {
        &mut self.docking_bays
    }

    /// Signature seen by other entities' sensors.
    #[must_use]
    pub fn visibility(&self) -> f32 {
        self.hull.visibility + self.visibility_sources.values().sum::<f32>()
    }

    /// Per-slot visibility sources.
    #[must_use]
    pub const fn visibility_sources(&self) -> &BTreeMap<SlotId, f32> {
        &self.visibility_sources
    }

    /// Equipped gear per hardpoint.
    #[must_use]
    pub fn slots(&self) -> &[Option<EquippedGear>] {
        &self.slots
    }

    /// Gear in a slot.
    #[must_use]
    pub fn gear(&self, slot: SlotId) -> Option<&EquippedGear> {
        self.slots.get(slot.index()).and_then(Option::as_ref)
    }

    /// First slot holding gear of the given definition.
    #[must_use]
    pub fn slot_of(&self, item: ItemId) -> Option<SlotId> {
        self.slots
            .iter()
            .position(|s| s.as_ref().is_some_and(|e| e.gear.data == item))
            .map(|i| SlotId::new(i as u16))
    }

    /// Whether any equipped gear has a matching behavior.
    pub fn has_behavior(&self, predicate: impl Fn(&Behavior) -> bool) -> bool {
        self.slots
            .iter()
            .flatten()
            .any(|e| e.behaviors.iter().any(&predicate))
    }

    /// Mount gear on a hardpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the gear is unknown, the slot does not exist or
    /// is occupied, or the hardpoint type does not match.
    pub fn equip(&mut self, items: &ItemDatabase, slot: SlotId, gear: Gear) -> Result<()> {
        let data = items.require_gear(gear.data)?;
        let Some(hardpoint) = self.hull.hardpoints.get(slot.index()) else {
            return Err(SimError::InvalidLoadout(format!(
                "{} has no slot {}",
                self.hull.name, slot.0
            )));
        };
        if hardpoint.kind != data.hardpoint {
            return Err(SimError::InvalidLoadout(format!(
                "{} does not fit a {} hardpoint",
                data.name, hardpoint.kind
            )));
        }
        if self.slots[slot.index()].is_some() {
            return Err(SimError::InvalidLoadout(format!(
                "slot {} of {} is occupied",
                slot.0, self.hull.name
            )));
        }

        let condition = self.condition();
        let item = gear.condition();
        let behaviors = data
            .behaviors
            .iter()
            .map(|b| {
                let mut behavior = Behavior::from_data(b);
                behavior.initialize(&item, &condition);
                behavior
            })
            .collect();
        self.slots[slot.index()] = Some(EquippedGear { gear, behaviors });
        Ok(())
    }

    /// Remove gear from a hardpoint.
    ///
    /// Anything a behavior was holding goes to cargo; what does not fit is
    /// lost.
    pub fn unequip(&mut self, items: &ItemDatabase, slot: SlotId) -> Option<Gear> {
        let equipped = self.slots.get_mut(slot.index())?.take()?;
        for behavior in equipped.behaviors {
            if let Some(held) = behavior.remove() {
                if let Err(lost) = store_in(&mut self.cargo, held, items) {
                    tracing::warn!(entity = self.id, item = lost.item_id().0, "No cargo room, item lost");
                }
            }
        }
        self.visibility_sources.remove(&slot);
        Some(equipped.gear)
    }

    /// Enable or disable gear. Disabled gear stays mounted but does not update.
    ///
    /// # Errors
    ///
    /// Returns [`CommandRejection::EmptySlot`] if nothing is mounted there.
    pub fn set_gear_enabled(&mut self, slot: SlotId, enabled: bool) -> std::result::Result<(), CommandRejection> {
        let equipped = self.equipped_mut(slot)?;
        equipped.gear.enabled = enabled;
        if !enabled {
            self.visibility_sources.remove(&slot);
        }
        Ok(())
    }

    /// Switch on every activatable behavior of a slot.
    ///
    /// Gear without one is left alone.
    ///
    /// # Errors
    ///
    /// Returns [`CommandRejection::EmptySlot`] if nothing is mounted there.
    pub fn activate_slot(&mut self, slot: SlotId) -> std::result::Result<(), CommandRejection> {
        for behavior in &mut self.equipped_mut(slot)?.behaviors {
            if let Some(toggle) = behavior.as_activatable_mut() {
                toggle.activate();
            }
        }
        Ok(())
    }

    /// Switch off every activatable behavior of a slot.
    ///
    /// # Errors
    ///
    /// Returns [`CommandRejection::EmptySlot`] if nothing is mounted there.
    pub fn deactivate_slot(&mut self, slot: SlotId) -> std::result::Result<(), CommandRejection> {
        for behavior in &mut self.equipped_mut(slot)?.behaviors {
            if let Some(toggle) = behavior.as_activatable_mut() {
                toggle.deactivate();
            }
        }
        Ok(())
    }

    /// Whether any activatable behavior of a slot is switched on.
    #[must_use]
    pub fn is_slot_active(&self, slot: SlotId) -> bool {
        self.gear(slot).is_some_and(|e| {
            e.behaviors
                .iter()
                .filter_map(Behavior::as_activatable)
                .any(|t| t.is_active())
        })
    }

    /// Factory mounted in a slot.
    #[must_use]
    pub fn factory(&self, slot: SlotId) -> Option<&Factory> {
        self.gear(slot)?.behaviors.iter().find_map(|b| match b {
            Behavior::Factory(f) => Some(f),
            _ => None,
        })
    }

    fn factory_mut(&mut self, slot: SlotId) -> Option<&mut Factory> {
        self.slots
            .get_mut(slot.index())?
            .as_mut()?
            .behaviors
            .iter_mut()
            .find_map(|b| match b {
                Behavior::Factory(f) => Some(f),
                _ => None,
            })
    }

    /// Select the blueprint of a slot's factory. Returns whether it changed.
    ///
    /// # Errors
    ///
    /// Rejects empty slots, gear without a factory, and blueprints made by
    /// other factory gear.
    pub fn set_blueprint(
        &mut self,
        items: &ItemDatabase,
        slot: SlotId,
        blueprint: Option<BlueprintId>,
    ) -> std::result::Result<bool, CommandRejection> {
        let gear = self.equipped_mut(slot)?.gear.data;
        if let Some(id) = blueprint {
            let data = items.blueprint(id).ok_or(CommandRejection::WrongFactory)?;
            if data.factory_item != gear {
                return Err(CommandRejection::WrongFactory);
            }
        }
        let factory = self
            .factory_mut(slot)
            .ok_or(CommandRejection::NotAFactory(slot))?;
        let changed = factory.set_blueprint(blueprint);
        if changed {
            tracing::debug!(entity = self.id, slot = slot.0, ?blueprint, "Factory retooling");
        }
        Ok(changed)
    }

    /// Set the production quality of a slot's factory.
    ///
    /// # Errors
    ///
    /// Rejects empty slots and gear without a factory.
    pub fn set_factory_quality(&mut self, slot: SlotId, quality: f32) -> std::result::Result<(), CommandRejection> {
        self.equipped_mut(slot)?;
        self.factory_mut(slot)
            .ok_or(CommandRejection::NotAFactory(slot))?
            .set_quality(quality);
        Ok(())
    }

    fn equipped_mut(&mut self, slot: SlotId) -> std::result::Result<&mut EquippedGear, CommandRejection> {
        self.slots
            .get_mut(slot.index())
            .and_then(Option::as_mut)
            .ok_or(CommandRejection::EmptySlot(slot))
    }

    /// Total capacitance of enabled reactors, `None` without one.
    ///
    /// Reactor stats see heat and temperature only; energy fraction and
    /// capacitance inputs are unavailable to them.
    #[must_use]
    pub fn capacitance(&self) -> Option<f32> {
        let base = EntityCondition {
            heat: self.heat,
            temperature: self.temperature(),
            ..EntityCondition::default()
        };
        let mut total = None;
        for equipped in self.slots.iter().flatten().filter(|e| e.gear.enabled) {
            let item = equipped.gear.condition();
            for behavior in &equipped.behaviors {
                if let Behavior::Reactor(reactor) = behavior {
                    let value = reactor.data().capacitance.evaluate(&item, &base).max(0.0);
                    *total.get_or_insert(0.0) += value;
                }
            }
        }
        total
    }

    /// Condition snapshot used to evaluate gear stats.
    #[must_use]
    pub fn condition(&self) -> EntityCondition {
        let capacitance = self.capacitance();
        let energy_fraction = match capacitance {
            Some(c) if c > 0.0 => (self.energy / c).clamp(0.0, 1.0),
            _ => 0.0,
        };
        EntityCondition {
            heat: self.heat,
            temperature: self.temperature(),
            energy_fraction,
            reactor_capacitance: capacitance,
        }
    }

    /// Hull, gear and cargo mass.
    #[must_use]
    pub fn mass(&self, items: &ItemDatabase) -> f32 {
        let gear: f32 = self
            .slots
            .iter()
            .flatten()
            .filter_map(|e| items.gear(e.gear.data))
            .map(|g| g.mass)
            .sum();
        let cargo: f32 = self.cargo.iter().map(|b| b.mass(items)).sum();
        self.hull.mass + gear + cargo
    }

    /// Advance one tick. Returns damage dealt to other entities, which the
    /// zone applies after every entity has updated.
    ///
    /// `anchor` is the position the entity is pinned to this tick: its
    /// host's position while docked, or its orbit's position.
    pub fn update(
        &mut self,
        ctx: &SimulationContext,
        delta: f32,
        target: Option<TargetInfo>,
        anchor: Option<Vec2Fixed>,
        events: &mut Vec<EntityEvent>,
    ) -> Vec<(EntityId, f32)> {
        if !self.active || !self.alive || !delta.is_finite() || delta <= 0.0 {
            return Vec::new();
        }
        let docked = self.parent.is_some();

        if let Some(anchor) = anchor {
            self.position = anchor;
            if docked {
                self.velocity = Vec2Fixed::ZERO;
            }
        } else if self.kind().is_mobile() {
            self.position += self.velocity.scale(fixed_from_f32(delta));
        }

        let condition = self.condition();
        let mass = self.mass(&ctx.items);
        let mut tick = TickAccumulator::new(self.energy);
        for (index, slot) in self.slots.iter_mut().enumerate() {
            let Some(equipped) = slot else {
                continue;
            };
            if !equipped.gear.enabled {
                continue;
            }
            let item = equipped.gear.condition();
            for behavior in &mut equipped.behaviors {
                let mut behavior_ctx = BehaviorContext {
                    items: &ctx.items,
                    entity: self.id,
                    slot: SlotId::new(index as u16),
                    delta,
                    item,
                    condition,
                    docked,
                    movement: self.movement,
                    mass,
                    target,
                    cargo: &mut self.cargo,
                    tick: &mut tick,
                    events: &mut *events,
                };
                behavior.update(&mut behavior_ctx);
            }
        }

        self.apply(&tick, condition, delta, events);
        self.update_exposure(&ctx.global, delta);
        self.tractor_power = approach(
            self.tractor_power,
            self.tractor_request,
            TRACTOR_RAMP_RATE * delta,
        );
        tick.hits
    }

    fn apply(
        &mut self,
        tick: &TickAccumulator,
        condition: EntityCondition,
        delta: f32,
        events: &mut Vec<EntityEvent>,
    ) {
        let capacitance = condition.reactor_capacitance.unwrap_or(0.0).max(0.0);
        self.energy = (self.energy + tick.energy_delta()).clamp(0.0, capacitance);
        self.heat += tick.heat;

        let (dx, dy) = tick.velocity;
        if dx != 0.0 || dy != 0.0 {
            self.velocity += Vec2Fixed::from_f32(dx, dy);
        }
        let (mx, my) = self.movement;
        if mx != 0.0 || my != 0.0 {
            self.direction = my.atan2(mx);
        }

        for (&slot, value) in &tick.visibility {
            match value {
                Some(v) => {
                    self.visibility_sources.insert(slot, *v);
                }
                None => {
                    self.visibility_sources.remove(&slot);
                }
            }
        }
        self.sensor = tick.sensor;
        self.life_support = tick.life_support;
        self.speed_limit = tick.speed_limit;
        if tick.inventory_changed {
            events.push(EntityEvent::InventoryUpdated { entity: self.id });
        }

        let dissipation = (self.hull.heat_dissipation + tick.dissipation).max(0.0);
        self.heat = (self.heat - dissipation * delta).max(0.0);
        if let Some(limit) = tick.speed_limit {
            self.velocity = self.velocity.clamp_length(fixed_from_f32(limit));
        }
    }

    fn update_exposure(&mut self, global: &GlobalData, delta: f32) {
        let recovery = global.exposure_recovery * delta;
        let temperature = self.temperature();
        if temperature > global.heatstroke_temperature {
            self.heatstroke +=
                (temperature - global.heatstroke_temperature) * global.heatstroke_rate * delta;
        } else {
            self.heatstroke = (self.heatstroke - recovery).max(0.0);
        }
        if self.life_support == Some(false) {
            self.hypothermia += global.hypothermia_rate * delta;
        } else {
            self.hypothermia = (self.hypothermia - recovery).max(0.0);
        }
    }

    /// Apply damage: raised shields soak it first in slot order, the rest
    /// hits the hull. Returns `(shielded, hull)`.
    pub fn apply_damage(&mut self, damage: f32) -> (f32, f32) {
        if !self.alive || damage <= 0.0 {
            return (0.0, 0.0);
        }
        let mut remaining = damage;
        for equipped in self.slots.iter_mut().flatten().filter(|e| e.gear.enabled) {
            for behavior in &mut equipped.behaviors {
                if let Behavior::Shield(shield) = behavior {
                    remaining = shield.absorb(remaining);
                }
            }
        }
        let hull = remaining.min(self.hull_durability);
        self.hull_durability -= hull;
        (damage - remaining, remaining)
    }

    /// What would kill this entity now, if anything.
    ///
    /// Combat wins over heatstroke, heatstroke over hypothermia.
    #[must_use]
    pub fn lethal_condition(&self) -> Option<CauseOfDeath> {
        if !self.alive {
            None
        } else if self.hull_durability <= 0.0 {
            Some(CauseOfDeath::Combat)
        } else if self.heatstroke >= LETHAL_EXPOSURE {
            Some(CauseOfDeath::Heatstroke)
        } else if self.hypothermia >= LETHAL_EXPOSURE {
            Some(CauseOfDeath::Hypothermia)
        } else {
            None
        }
    }

    #[cfg(test)]
    pub(crate) fn set_exposure(&mut self, heatstroke: f32, hypothermia: f32) {
        self.heatstroke = heatstroke;
        self.hypothermia = hypothermia;
    }

    /// Mark dead. Returns `false` if already dead.
    pub(crate) fn kill(&mut self) -> bool {
        if !self.alive {
            return false;
        }
        self.alive = false;
        self.active = false;
        self.movement = (0.0, 0.0);
        true
    }

    /// Replace the visible hostile set. Returns `(added, removed)`.
    pub(crate) fn set_visible_hostiles(
        &mut self,
        visible: BTreeSet<EntityId>,
    ) -> (Vec<EntityId>, Vec<EntityId>) {
        let added = visible.difference(&self.visible_hostiles).copied().collect();
        let removed = self.visible_hostiles.difference(&visible).copied().collect();
        self.visible_hostiles = visible;
        (added, removed)
    }
}

fn approach(current: f32, target: f32, step: f32) -> f32 {
    if current < target {
        (current + step).min(target)
    } else {
        (current - step).max(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::ItemInstance;
    use crate::test_fixtures::{self, ids};

    fn run(entity: &mut Entity, ctx: &SimulationContext, ticks: usize) -> Vec<EntityEvent> {
        let mut events = Vec::new();
        for _ in 0..ticks {
            entity.update(ctx, 0.1, None, None, &mut events);
        }
        events
    }

    #[test]
    fn test_spawns_with_full_energy() {
        let ctx = test_fixtures::context();
        let skiff = test_fixtures::skiff(&ctx);
        assert_eq!(skiff.capacitance(), Some(500.0));
        assert_eq!(skiff.energy(), 500.0);
        assert!(skiff.slots().iter().all(Option::is_some));
    }

    #[test]
    fn test_idle_ship_is_stable() {
        let ctx = test_fixtures::context();
        let mut skiff = test_fixtures::skiff(&ctx);
        let start = skiff.position();
        run(&mut skiff, &ctx, 10);
        assert_eq!(skiff.position(), start);
        assert!(skiff.heat() < 1e-3);
        assert!((skiff.energy() - 500.0).abs() < 1.0);
        assert!(skiff.lethal_condition().is_none());
    }

    #[test]
    fn test_thrust_is_capped_by_speed_limit() {
        let ctx = test_fixtures::context();
        let mut skiff = test_fixtures::skiff(&ctx);
        skiff.set_movement(3.0, 0.0);
        assert_eq!(skiff.movement(), (1.0, 0.0));
        run(&mut skiff, &ctx, 100);
        let speed = skiff.velocity().length().to_num::<f32>();
        assert!(speed <= 100.0 + 1e-3, "speed {speed}");
        assert!(speed > 90.0);
        assert!(skiff.position().x > crate::math::Fixed::ZERO);
        let thruster = skiff.slot_of(ids::THRUSTER).expect("thruster");
        assert!(skiff.visibility_sources().contains_key(&thruster));

        skiff.set_movement(0.0, 0.0);
        run(&mut skiff, &ctx, 1);
        assert!(!skiff.visibility_sources().contains_key(&thruster));
    }

    #[test]
    fn test_heat_never_negative() {
        let ctx = test_fixtures::context();
        let mut skiff = test_fixtures::skiff(&ctx);
        skiff.heat = 1.0;
        run(&mut skiff, &ctx, 5);
        assert!(skiff.heat() >= 0.0);
        assert!(skiff.heat() < 1.0);
    }

    #[test]
    fn test_non_finite_delta_is_ignored() {
        let ctx = test_fixtures::context();
        let mut skiff = test_fixtures::skiff(&ctx);
        skiff.heat = 10.0;
        let energy = skiff.energy();
        let mut events = Vec::new();
        for delta in [f32::NAN, f32::INFINITY, -1.0] {
            assert!(skiff.update(&ctx, delta, None, None, &mut events).is_empty());
        }
        assert_eq!(skiff.heat(), 10.0);
        assert_eq!(skiff.energy(), energy);
        assert!(events.is_empty());
    }

    #[test]
    fn test_shields_absorb_before_hull() {
        let ctx = test_fixtures::context();
        let mut skiff = test_fixtures::skiff(&ctx);
        assert_eq!(skiff.apply_damage(150.0), (100.0, 50.0));
        assert_eq!(skiff.hull_durability(), 350.0);
        assert_eq!(skiff.apply_damage(400.0), (0.0, 400.0));
        assert_eq!(skiff.hull_durability(), 0.0);
        assert_eq!(skiff.lethal_condition(), Some(CauseOfDeath::Combat));
    }

    #[test]
    fn test_unpowered_life_support_is_lethal() {
        let ctx = test_fixtures::context();
        let mut skiff = test_fixtures::skiff(&ctx);
        let reactor = skiff.slot_of(ids::REACTOR).expect("reactor");
        skiff.unequip(&ctx.items, reactor);
        skiff.energy = 0.0;
        run(&mut skiff, &ctx, 100);
        assert!(skiff.hypothermia() > 0.4);
        assert!(skiff.lethal_condition().is_none());
        run(&mut skiff, &ctx, 110);
        assert_eq!(skiff.lethal_condition(), Some(CauseOfDeath::Hypothermia));
    }

    #[test]
    fn test_overheating_is_lethal() {
        let ctx = test_fixtures::context();
        let mut skiff = test_fixtures::skiff(&ctx);
        skiff.heat = 50.0 * 600.0;
        run(&mut skiff, &ctx, 50);
        assert!(skiff.heatstroke() > 0.0);
        assert!(skiff.lethal_condition().is_none());
        run(&mut skiff, &ctx, 100);
        assert_eq!(skiff.lethal_condition(), Some(CauseOfDeath::Heatstroke));
    }

    #[test]
    fn test_equip_rules() {
        let ctx = test_fixtures::context();
        let mut skiff = test_fixtures::skiff(&ctx);
        let thruster = ctx.items.gear(ids::THRUSTER).expect("gear");
        let reactor_slot = skiff.slot_of(ids::REACTOR).expect("reactor");

        let occupied = skiff.equip(&ctx.items, SlotId::new(1), Gear::new(thruster));
        assert!(matches!(occupied, Err(SimError::InvalidLoadout(_))));

        skiff.unequip(&ctx.items, reactor_slot);
        let wrong_type = skiff.equip(&ctx.items, reactor_slot, Gear::new(thruster));
        assert!(matches!(wrong_type, Err(SimError::InvalidLoadout(_))));

        let missing = skiff.equip(&ctx.items, SlotId::new(40), Gear::new(thruster));
        assert!(matches!(missing, Err(SimError::InvalidLoadout(_))));
        assert_eq!(skiff.capacitance(), None);
    }

    #[test]
    fn test_slot_activation() {
        let ctx = test_fixtures::context();
        let mut skiff = test_fixtures::skiff(&ctx);
        let cannon = skiff.slot_of(ids::AUTOCANNON).expect("cannon");
        assert!(!skiff.is_slot_active(cannon));
        skiff.activate_slot(cannon).expect("equipped");
        skiff.activate_slot(cannon).expect("idempotent");
        assert!(skiff.is_slot_active(cannon));
        skiff.deactivate_slot(cannon).expect("equipped");
        assert!(!skiff.is_slot_active(cannon));

        let empty = SlotId::new(30);
        assert_eq!(skiff.activate_slot(empty), Err(CommandRejection::EmptySlot(empty)));
    }

    #[test]
    fn test_blueprint_commands() {
        let ctx = test_fixtures::context();
        let mut outpost = test_fixtures::outpost(&ctx);
        let fabricator = outpost.slot_of(ids::FABRICATOR).expect("fabricator");
        let reactor = outpost.slot_of(ids::REACTOR).expect("reactor");

        assert_eq!(outpost.set_blueprint(&ctx.items, fabricator, Some(ids::PLATES)), Ok(true));
        assert_eq!(outpost.set_blueprint(&ctx.items, fabricator, Some(ids::PLATES)), Ok(false));
        assert_eq!(
            outpost.set_blueprint(&ctx.items, reactor, Some(ids::PLATES)),
            Err(CommandRejection::WrongFactory)
        );
        assert_eq!(
            outpost.set_blueprint(&ctx.items, reactor, None),
            Err(CommandRejection::NotAFactory(reactor))
        );
    }

    #[test]
    fn test_unequip_returns_held_output_to_cargo() {
        let ctx = test_fixtures::context();
        let mut outpost = test_fixtures::outpost(&ctx);
        outpost.cargo_mut()[0]
            .try_store(
                ItemInstance::Commodity {
                    item: ids::ORE,
                    quantity: 10,
                },
                &ctx.items,
            )
            .expect("fits");
        let fabricator = outpost.slot_of(ids::FABRICATOR).expect("fabricator");
        let gear = outpost.unequip(&ctx.items, fabricator).expect("equipped");
        assert_eq!(gear.data, ids::FABRICATOR);
        assert!(outpost.factory(fabricator).is_none());
        assert_eq!(outpost.cargo()[0].count(ids::ORE), 10);
    }

    #[test]
    fn test_docked_entity_follows_anchor() {
        let ctx = test_fixtures::context();
        let mut skiff = test_fixtures::skiff(&ctx);
        skiff.set_parent(Some(7));
        skiff.set_velocity(Vec2Fixed::from_f32(10.0, 0.0));
        skiff.set_movement(1.0, 0.0);
        let anchor = Vec2Fixed::from_f32(250.0, -40.0);
        let mut events = Vec::new();
        skiff.update(&ctx, 0.1, None, Some(anchor), &mut events);
        assert_eq!(skiff.position(), anchor);
        assert_eq!(skiff.velocity(), Vec2Fixed::ZERO);
    }

    #[test]
    fn test_tractor_ramps() {
        let ctx = test_fixtures::context();
        let mut skiff = test_fixtures::skiff(&ctx);
        skiff.set_tractor(5.0);
        run(&mut skiff, &ctx, 1);
        assert!((skiff.tractor_power() - 0.2).abs() < 1e-5);
        run(&mut skiff, &ctx, 10);
        assert_eq!(skiff.tractor_power(), 1.0);
        skiff.set_tractor(0.0);
        run(&mut skiff, &ctx, 10);
        assert_eq!(skiff.tractor_power(), 0.0);
    }

    #[test]
    fn test_pack_round_trip() {
        let ctx = test_fixtures::context();
        let mut outpost = test_fixtures::outpost(&ctx);
        let fabricator = outpost.slot_of(ids::FABRICATOR).expect("fabricator");
        outpost.set_blueprint(&ctx.items, fabricator, Some(ids::PLATES)).expect("factory");
        outpost.set_factory_quality(fabricator, 0.8).expect("factory");
        outpost.set_position(Vec2Fixed::from_f32(12.5, -3.0));
        outpost.heat = 42.0;
        outpost.energy = 120.0;

        let restored = Entity::from_pack(&ctx.items, &outpost.to_pack()).expect("valid pack");
        assert_eq!(restored.position(), outpost.position());
        assert_eq!(restored.heat(), 42.0);
        assert_eq!(restored.energy(), 120.0);
        let factory = restored.factory(fabricator).expect("factory");
        assert_eq!(factory.blueprint(), Some(ids::PLATES));
        assert!((factory.quality() - 0.8).abs() < 1e-6);
        assert_eq!(restored.to_pack(), outpost.to_pack());
    }
}
