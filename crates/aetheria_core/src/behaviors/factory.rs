//! Factory behavior.
//!
//! ```text
//! Idle ──set blueprint──▶ Tooling ──tooling time──▶ Idle (tooled)
//!   ▲                                                   │ ingredients present,
//!   │                                                   ▼ consumed atomically
//!   └──── stored ◀── ItemComplete ◀── timer done ◀── Producing
//! ```
//!
//! A tooled factory starts a new cycle whenever the cargo holds every
//! ingredient. Missing ingredients leave it idle with nothing consumed. A
//! finished item that does not fit in cargo is held in `ItemComplete` until
//! room frees up.

use crate::data::{BlueprintData, BlueprintId, FactoryData, ItemData};
use crate::events::EntityEvent;
use crate::items::{consume_ingredients, store_in, Gear, ItemInstance};
use crate::stats::STAT_EPSILON;

use super::BehaviorContext;

/// Factory state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FactoryState {
    /// No cycle running. Tooled when a blueprint is selected.
    Idle,
    /// Retooling for a new blueprint.
    Tooling {
        /// Seconds spent retooling.
        elapsed: f32,
    },
    /// Producing one item.
    Producing {
        /// Work left, in seconds at unit speed.
        remaining: f32,
    },
    /// Finished item waiting for cargo space.
    ItemComplete,
}

/// Fabricator gear.
#[derive(Debug, Clone, PartialEq)]
pub struct Factory {
    data: FactoryData,
    blueprint: Option<BlueprintId>,
    quality: f32,
    state: FactoryState,
    output: Option<ItemInstance>,
}

impl Factory {
    /// Create an idle factory with no blueprint at medium quality.
    #[must_use]
    pub fn new(data: FactoryData) -> Self {
        Self {
            data,
            blueprint: None,
            quality: 0.5,
            state: FactoryState::Idle,
            output: None,
        }
    }

    /// Factory definition.
    #[must_use]
    pub const fn data(&self) -> &FactoryData {
        &self.data
    }

    /// Selected blueprint.
    #[must_use]
    pub const fn blueprint(&self) -> Option<BlueprintId> {
        self.blueprint
    }

    /// Production quality, `0..=1`.
    #[must_use]
    pub const fn quality(&self) -> f32 {
        self.quality
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> FactoryState {
        self.state
    }

    /// Finished item waiting for cargo space.
    #[must_use]
    pub const fn output(&self) -> Option<&ItemInstance> {
        self.output.as_ref()
    }

    /// Select a blueprint. Returns whether anything changed.
    ///
    /// A new blueprint restarts tooling and discards the running cycle.
    /// `None` stops production.
    pub fn set_blueprint(&mut self, blueprint: Option<BlueprintId>) -> bool {
        if self.blueprint == blueprint {
            return false;
        }
        self.blueprint = blueprint;
        self.state = match blueprint {
            Some(_) => FactoryState::Tooling { elapsed: 0.0 },
            None => FactoryState::Idle,
        };
        true
    }

    /// Set production quality, clamped to `0..=1`.
    ///
    /// Higher quality yields more durable gear and takes longer. Applies
    /// from the next cycle.
    pub fn set_quality(&mut self, quality: f32) {
        self.quality = quality.clamp(0.0, 1.0);
    }

    /// Restore saved settings, skipping retooling.
    pub(crate) fn restore(&mut self, blueprint: Option<BlueprintId>, quality: f32) {
        self.blueprint = blueprint;
        self.set_quality(quality);
        self.state = FactoryState::Idle;
    }

    pub(super) fn remove(mut self) -> Option<ItemInstance> {
        self.output.take()
    }

    pub(super) fn update(&mut self, ctx: &mut BehaviorContext<'_>) {
        if let Some(item) = self.output.take() {
            if !self.deliver(ctx, item) {
                return;
            }
        }

        let Some(id) = self.blueprint else {
            self.state = FactoryState::Idle;
            return;
        };
        let Some(blueprint) = ctx.items.blueprint(id) else {
            tracing::warn!(blueprint = id.0, "Factory blueprint missing from database");
            return;
        };

        match self.state {
            FactoryState::Tooling { elapsed } => {
                let elapsed = elapsed + ctx.delta;
                if elapsed >= ctx.eval(&self.data.tooling_time) {
                    self.state = FactoryState::Idle;
                    ctx.events.push(EntityEvent::ToolingUpdated {
                        entity: ctx.entity,
                        slot: ctx.slot,
                    });
                } else {
                    self.state = FactoryState::Tooling { elapsed };
                }
            }
            FactoryState::Idle | FactoryState::ItemComplete => {
                if consume_ingredients(ctx.cargo, &blueprint.ingredients) {
                    if !blueprint.ingredients.is_empty() {
                        ctx.tick.inventory_changed = true;
                    }
                    self.state = FactoryState::Producing {
                        remaining: blueprint.production_time * (1.0 + self.quality),
                    };
                } else {
                    self.state = FactoryState::Idle;
                }
            }
            FactoryState::Producing { remaining } => {
                let energy = ctx.eval(&self.data.energy).max(0.0) * ctx.delta;
                if !ctx.tick.try_draw_energy(energy) {
                    return;
                }
                let heat = ctx.eval(&self.data.heat) * ctx.delta;
                ctx.tick.add_heat(heat);

                let speed = ctx.eval(&self.data.speed).max(STAT_EPSILON);
                let remaining = remaining - ctx.delta * speed;
                if remaining > 0.0 {
                    self.state = FactoryState::Producing { remaining };
                    return;
                }

                match self.build(ctx, blueprint) {
                    Some(item) => {
                        self.deliver(ctx, item);
                    }
                    None => self.state = FactoryState::Idle,
                }
            }
        }
    }

    fn build(&self, ctx: &BehaviorContext<'_>, blueprint: &BlueprintData) -> Option<ItemInstance> {
        match ctx.items.get(blueprint.item) {
            Some(ItemData::Gear(gear)) => Some(ItemInstance::Gear(Gear::crafted(
                gear,
                blueprint.id,
                self.quality,
            ))),
            Some(ItemData::Commodity(commodity)) => Some(ItemInstance::Commodity {
                item: commodity.id,
                quantity: blueprint.quantity.max(1),
            }),
            Some(ItemData::Hull(_)) | None => {
                tracing::warn!(
                    blueprint = blueprint.id.0,
                    item = blueprint.item.0,
                    "Blueprint product cannot be built by a factory"
                );
                None
            }
        }
    }

    /// Try to put a finished item in cargo. Holds it on failure.
    fn deliver(&mut self, ctx: &mut BehaviorContext<'_>, item: ItemInstance) -> bool {
        let item_id = item.item_id();
        match store_in(ctx.cargo, item, ctx.items) {
            Ok(()) => {
                ctx.tick.inventory_changed = true;
                ctx.events.push(EntityEvent::ItemProduced {
                    entity: ctx.entity,
                    slot: ctx.slot,
                    item: item_id,
                });
                self.state = FactoryState::Idle;
                true
            }
            Err(item) => {
                self.output = Some(item);
                self.state = FactoryState::ItemComplete;
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behaviors::test_support::Harness;
    use crate::behaviors::Behavior;
    use crate::data::{CommodityData, GearData, HardpointType, Ingredient, ItemId};
    use crate::items::{count_in, CargoBay};
    use crate::stats::PerformanceStat;

    const ORE: ItemId = ItemId::new(1);
    const PLATE: ItemId = ItemId::new(2);
    const FABRICATOR: ItemId = ItemId::new(3);
    const PLATES: BlueprintId = BlueprintId::new(1);

    fn harness() -> Harness {
        let mut harness = Harness::new(100.0);
        for (id, name) in [(ORE, "Ore"), (PLATE, "Plate")] {
            harness
                .items
                .register_item(ItemData::Commodity(CommodityData {
                    id,
                    name: name.to_string(),
                    mass: 1.0,
                    size: 1.0,
                }))
                .expect("unique");
        }
        harness
            .items
            .register_item(ItemData::Gear(GearData {
                id: FABRICATOR,
                name: "Fabricator".to_string(),
                mass: 10.0,
                size: 2.0,
                durability: 100.0,
                hardpoint: HardpointType::Tool,
                behaviors: Vec::new(),
            }))
            .expect("unique");
        harness
            .items
            .register_blueprint(BlueprintData {
                id: PLATES,
                name: "Plates".to_string(),
                item: PLATE,
                quantity: 1,
                factory_item: FABRICATOR,
                ingredients: vec![Ingredient {
                    item: ORE,
                    quantity: 2,
                }],
                production_time: 1.0,
            })
            .expect("unique");
        harness
    }

    fn stock_ore(harness: &mut Harness, quantity: u32) {
        let ore = ItemInstance::Commodity {
            item: ORE,
            quantity,
        };
        harness.cargo[0].try_store(ore, &harness.items).expect("fits");
    }

    fn factory() -> Factory {
        let mut factory = Factory::new(FactoryData {
            tooling_time: PerformanceStat::constant(1.0),
            speed: PerformanceStat::constant(1.0),
            ..FactoryData::default()
        });
        factory.set_quality(0.0);
        factory
    }

    fn state(behavior: &Behavior) -> FactoryState {
        match behavior {
            Behavior::Factory(f) => f.state(),
            other => panic!("unexpected behavior {other:?}"),
        }
    }

    fn run(harness: &mut Harness, behavior: &mut Behavior, seconds: f32) {
        let steps = (seconds / 0.1).round() as usize;
        for _ in 0..steps {
            harness.step(behavior, 0.1);
        }
    }

    #[test]
    fn test_idle_without_blueprint() {
        let mut harness = harness();
        stock_ore(&mut harness, 4);
        let mut behavior = Behavior::Factory(factory());
        run(&mut harness, &mut behavior, 5.0);
        assert_eq!(state(&behavior), FactoryState::Idle);
        assert_eq!(count_in(&harness.cargo, ORE), 4);
    }

    #[test]
    fn test_full_cycle() {
        let mut harness = harness();
        stock_ore(&mut harness, 2);
        let mut f = factory();
        assert!(f.set_blueprint(Some(PLATES)));
        assert!(!f.set_blueprint(Some(PLATES)));
        let mut behavior = Behavior::Factory(f);

        run(&mut harness, &mut behavior, 0.5);
        assert!(matches!(state(&behavior), FactoryState::Tooling { .. }));
        assert_eq!(count_in(&harness.cargo, ORE), 2, "no production while tooling");

        run(&mut harness, &mut behavior, 0.7);
        assert!(matches!(state(&behavior), FactoryState::Producing { .. }));
        assert_eq!(count_in(&harness.cargo, ORE), 0);

        run(&mut harness, &mut behavior, 1.2);
        assert_eq!(count_in(&harness.cargo, PLATE), 1);
        assert!(harness
            .events
            .iter()
            .any(|e| matches!(e, EntityEvent::ItemProduced { item, .. } if *item == PLATE)));
        assert!(harness
            .events
            .iter()
            .any(|e| matches!(e, EntityEvent::ToolingUpdated { .. })));
    }

    #[test]
    fn test_insufficient_ingredients_consume_nothing() {
        let mut harness = harness();
        stock_ore(&mut harness, 1);
        let mut f = factory();
        f.set_blueprint(Some(PLATES));
        let mut behavior = Behavior::Factory(f);
        run(&mut harness, &mut behavior, 5.0);
        assert_eq!(state(&behavior), FactoryState::Idle);
        assert_eq!(count_in(&harness.cargo, ORE), 1);
        assert_eq!(count_in(&harness.cargo, PLATE), 0);
    }

    #[test]
    fn test_full_cargo_holds_output() {
        let mut harness = harness();
        harness.cargo = vec![CargoBay::new(2.0)];
        stock_ore(&mut harness, 2);
        let mut f = factory();
        f.set_blueprint(Some(PLATES));
        let mut behavior = Behavior::Factory(f);

        // Ingredients leave cargo, then a junk stack fills the space.
        run(&mut harness, &mut behavior, 1.2);
        let junk = ItemInstance::Commodity {
            item: ORE,
            quantity: 2,
        };
        harness.cargo[0].try_store(junk, &harness.items).expect("fits");
        run(&mut harness, &mut behavior, 1.5);
        assert_eq!(state(&behavior), FactoryState::ItemComplete);
        assert_eq!(count_in(&harness.cargo, PLATE), 0);

        harness.cargo[0].remove_commodity(ORE, 2);
        harness.step(&mut behavior, 0.1);
        assert_eq!(count_in(&harness.cargo, PLATE), 1);
        assert_ne!(state(&behavior), FactoryState::ItemComplete);
    }

    #[test]
    fn test_new_blueprint_restarts_tooling() {
        let mut f = factory();
        f.set_blueprint(Some(PLATES));
        f.state = FactoryState::Producing { remaining: 0.5 };
        assert!(f.set_blueprint(Some(BlueprintId::new(2))));
        assert_eq!(f.state(), FactoryState::Tooling { elapsed: 0.0 });
        assert!(f.set_blueprint(None));
        assert_eq!(f.state(), FactoryState::Idle);
    }

    #[test]
    fn test_quality_is_clamped() {
        let mut f = factory();
        f.set_quality(3.0);
        assert_eq!(f.quality(), 1.0);
        f.set_quality(-1.0);
        assert_eq!(f.quality(), 0.0);
    }
}
