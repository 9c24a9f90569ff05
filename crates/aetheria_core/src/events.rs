//! Simulation events and the observer registry.
//!
//! Every [`Zone::update`](crate::zone::Zone::update) returns the events of
//! that tick as [`TickEvents`]. Callers either poll those directly or hand
//! them to an [`EventDispatcher`], which routes each event to the observers
//! registered for its subject entity. Observers of removed entities are
//! dropped automatically, so no handler outlives its entity.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::components::{CauseOfDeath, EntityId, SlotId};
use crate::data::ItemId;

/// Something that happened to one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityEvent {
    /// The entity died. Fired once per entity.
    Death {
        /// Subject.
        entity: EntityId,
        /// Cause.
        cause: CauseOfDeath,
    },
    /// The entity's target changed.
    TargetChanged {
        /// Subject.
        entity: EntityId,
        /// New target.
        target: Option<EntityId>,
    },
    /// A hostile entered sensor coverage.
    VisibleHostileAdded {
        /// Subject.
        entity: EntityId,
        /// Hostile now visible.
        hostile: EntityId,
    },
    /// A hostile left sensor coverage.
    VisibleHostileRemoved {
        /// Subject.
        entity: EntityId,
        /// Hostile no longer visible.
        hostile: EntityId,
    },
    /// Cargo contents changed.
    InventoryUpdated {
        /// Subject.
        entity: EntityId,
    },
    /// A factory's blueprint or tooling state changed.
    ToolingUpdated {
        /// Subject.
        entity: EntityId,
        /// Factory slot.
        slot: SlotId,
    },
    /// A factory finished an item.
    ItemProduced {
        /// Subject.
        entity: EntityId,
        /// Factory slot.
        slot: SlotId,
        /// Item produced.
        item: ItemId,
    },
    /// A projectile weapon fired one shot.
    WeaponFired {
        /// Subject.
        entity: EntityId,
        /// Weapon slot.
        slot: SlotId,
        /// Target at the time of firing.
        target: Option<EntityId>,
        /// Damage carried by the projectile.
        damage: f32,
        /// Projectile speed.
        velocity: f32,
        /// Spread in degrees.
        spread: f32,
        /// Maximum range.
        range: f32,
    },
    /// The entity docked with a host.
    Docked {
        /// Subject.
        entity: EntityId,
        /// Host.
        host: EntityId,
    },
    /// The entity left its host.
    Undocked {
        /// Subject.
        entity: EntityId,
        /// Former host.
        host: EntityId,
    },
}

impl EntityEvent {
    /// Entity the event is about.
    #[must_use]
    pub const fn subject(&self) -> EntityId {
        match self {
            Self::Death { entity, .. }
            | Self::TargetChanged { entity, .. }
            | Self::VisibleHostileAdded { entity, .. }
            | Self::VisibleHostileRemoved { entity, .. }
            | Self::InventoryUpdated { entity }
            | Self::ToolingUpdated { entity, .. }
            | Self::ItemProduced { entity, .. }
            | Self::WeaponFired { entity, .. }
            | Self::Docked { entity, .. }
            | Self::Undocked { entity, .. } => *entity,
        }
    }
}

/// Damage dealt during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageEvent {
    /// Entity that dealt the damage, if any.
    pub source: Option<EntityId>,
    /// Entity hit.
    pub target: EntityId,
    /// Damage absorbed by shields.
    pub shielded: f32,
    /// Damage that reached the hull.
    pub hull: f32,
}

/// Everything that happened during one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickEvents {
    /// Entity events in the order they happened.
    pub events: Vec<EntityEvent>,
    /// Damage applied.
    pub damage: Vec<DamageEvent>,
    /// Entities that died.
    pub deaths: Vec<(EntityId, CauseOfDeath)>,
    /// Entities added at the end of the tick.
    pub spawned: Vec<EntityId>,
    /// Entities removed at the end of the tick.
    pub removed: Vec<EntityId>,
}

impl TickEvents {
    /// Events about one entity.
    pub fn for_entity(&self, entity: EntityId) -> impl Iterator<Item = &EntityEvent> {
        self.events.iter().filter(move |e| e.subject() == entity)
    }

    /// Whether nothing happened.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
            && self.damage.is_empty()
            && self.deaths.is_empty()
            && self.spawned.is_empty()
            && self.removed.is_empty()
    }
}

/// Handle returned by [`EventDispatcher::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObserverId(u64);

type Handler = Box<dyn FnMut(&EntityEvent) + Send>;

/// Routes tick events to observers registered per entity.
#[derive(Default)]
pub struct EventDispatcher {
    next_id: u64,
    observers: BTreeMap<EntityId, Vec<(ObserverId, Handler)>>,
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("observers", &self.observer_count())
            .finish()
    }
}

impl EventDispatcher {
    /// Create an empty dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe every event whose subject is `entity`.
    pub fn subscribe<F>(&mut self, entity: EntityId, handler: F) -> ObserverId
    where
        F: FnMut(&EntityEvent) + Send + 'static,
    {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.observers
            .entry(entity)
            .or_default()
            .push((id, Box::new(handler)));
        id
    }

    /// Remove an observer. Returns whether it was registered.
    pub fn unsubscribe(&mut self, observer: ObserverId) -> bool {
        let mut found = false;
        for handlers in self.observers.values_mut() {
            let before = handlers.len();
            handlers.retain(|(id, _)| *id != observer);
            found |= handlers.len() != before;
        }
        self.observers.retain(|_, handlers| !handlers.is_empty());
        found
    }

    /// Drop every observer of an entity.
    pub fn forget_entity(&mut self, entity: EntityId) {
        self.observers.remove(&entity);
    }

    /// Total registered observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers.values().map(Vec::len).sum()
    }

    /// Deliver a tick's events, then drop observers of removed entities.
    pub fn dispatch(&mut self, events: &TickEvents) {
        for event in &events.events {
            if let Some(handlers) = self.observers.get_mut(&event.subject()) {
                for (_, handler) in handlers.iter_mut() {
                    handler(event);
                }
            }
        }
        for removed in &events.removed {
            self.forget_entity(*removed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_dispatch_routes_by_subject() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = EventDispatcher::new();
        let sink = Arc::clone(&seen);
        dispatcher.subscribe(1, move |e| sink.lock().unwrap().push(e.clone()));

        let events = TickEvents {
            events: vec![
                EntityEvent::InventoryUpdated { entity: 1 },
                EntityEvent::InventoryUpdated { entity: 2 },
            ],
            ..TickEvents::default()
        };
        dispatcher.dispatch(&events);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].subject(), 1);
    }

    #[test]
    fn test_removed_entity_observers_are_dropped() {
        let count = Arc::new(Mutex::new(0));
        let mut dispatcher = EventDispatcher::new();
        let sink = Arc::clone(&count);
        dispatcher.subscribe(5, move |_| *sink.lock().unwrap() += 1);
        assert_eq!(dispatcher.observer_count(), 1);

        let death = TickEvents {
            events: vec![EntityEvent::Death {
                entity: 5,
                cause: CauseOfDeath::Combat,
            }],
            removed: vec![5],
            ..TickEvents::default()
        };
        dispatcher.dispatch(&death);
        assert_eq!(*count.lock().unwrap(), 1);
        assert_eq!(dispatcher.observer_count(), 0);

        // Late events for the dead entity reach nobody.
        dispatcher.dispatch(&TickEvents {
            events: vec![EntityEvent::InventoryUpdated { entity: 5 }],
            ..TickEvents::default()
        });
        assert_eq!(*count.lock().unwrap(), 1);
    }

    #[test]
    fn test_unsubscribe() {
        let mut dispatcher = EventDispatcher::new();
        let a = dispatcher.subscribe(1, |_| {});
        let _b = dispatcher.subscribe(1, |_| {});
        assert!(dispatcher.unsubscribe(a));
        assert!(!dispatcher.unsubscribe(a));
        assert_eq!(dispatcher.observer_count(), 1);
    }
}
