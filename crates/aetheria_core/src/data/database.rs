//! Indexed item and blueprint lookup.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::behavior_data::BehaviorData;
use super::item_data::{
    BlueprintData, BlueprintId, CommodityData, GearData, HullData, ItemData, ItemId,
};
use crate::error::{Result, SimError};

/// On-disk layout of an item database file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ItemDatabaseFile {
    #[serde(default)]
    items: Vec<ItemData>,
    #[serde(default)]
    blueprints: Vec<BlueprintData>,
}

/// Every item and blueprint definition, indexed by id.
///
/// # Example
///
/// ```
/// use aetheria_core::data::{ItemDatabase, ItemId};
///
/// let db = ItemDatabase::from_ron(r#"(
///     items: [
///         Commodity((id: 1, name: "Ore", mass: 1.0)),
///     ],
/// )"#).unwrap();
/// assert!(db.commodity(ItemId::new(1)).is_some());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemDatabase {
    items: BTreeMap<ItemId, ItemData>,
    blueprints: BTreeMap<BlueprintId, BlueprintData>,
}

impl ItemDatabase {
    /// Create an empty database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a database from RON text and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the text does not parse, ids collide, or
    /// references do not resolve.
    pub fn from_ron(text: &str) -> Result<Self> {
        let file: ItemDatabaseFile = ron::from_str(text).map_err(|e| SimError::DataParseError {
            path: "<item database>".to_string(),
            message: e.to_string(),
        })?;

        let mut db = Self::new();
        for item in file.items {
            db.register_item(item)?;
        }
        for blueprint in file.blueprints {
            db.register_blueprint(blueprint)?;
        }

        let errors = db.validate();
        if !errors.is_empty() {
            return Err(SimError::ValidationFailed(errors));
        }
        Ok(db)
    }

    /// Register an item definition.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is already taken.
    pub fn register_item(&mut self, item: ItemData) -> Result<()> {
        let id = item.id();
        if self.items.contains_key(&id) {
            return Err(SimError::InvalidState(format!("Duplicate item id {}", id.0)));
        }
        self.items.insert(id, item);
        Ok(())
    }

    /// Register a blueprint.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is already taken.
    pub fn register_blueprint(&mut self, blueprint: BlueprintData) -> Result<()> {
        let id = blueprint.id;
        if self.blueprints.contains_key(&id) {
            return Err(SimError::InvalidState(format!(
                "Duplicate blueprint id {}",
                id.0
            )));
        }
        self.blueprints.insert(id, blueprint);
        Ok(())
    }

    /// Look up any item.
    #[must_use]
    pub fn get(&self, id: ItemId) -> Option<&ItemData> {
        self.items.get(&id)
    }

    /// Look up a hull.
    #[must_use]
    pub fn hull(&self, id: ItemId) -> Option<&HullData> {
        match self.items.get(&id) {
            Some(ItemData::Hull(hull)) => Some(hull),
            _ => None,
        }
    }

    /// Look up gear.
    #[must_use]
    pub fn gear(&self, id: ItemId) -> Option<&GearData> {
        match self.items.get(&id) {
            Some(ItemData::Gear(gear)) => Some(gear),
            _ => None,
        }
    }

    /// Look up a commodity.
    #[must_use]
    pub fn commodity(&self, id: ItemId) -> Option<&CommodityData> {
        match self.items.get(&id) {
            Some(ItemData::Commodity(commodity)) => Some(commodity),
            _ => None,
        }
    }

    /// Look up a hull, failing with a typed error.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is unknown or not a hull.
    pub fn require_hull(&self, id: ItemId) -> Result<&HullData> {
        match self.items.get(&id) {
            Some(ItemData::Hull(hull)) => Ok(hull),
            Some(_) => Err(SimError::WrongItemKind {
                item: id,
                expected: "hull",
            }),
            None => Err(SimError::UnknownItem(id)),
        }
    }

    /// Look up gear, failing with a typed error.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is unknown or not gear.
    pub fn require_gear(&self, id: ItemId) -> Result<&GearData> {
        match self.items.get(&id) {
            Some(ItemData::Gear(gear)) => Ok(gear),
            Some(_) => Err(SimError::WrongItemKind {
                item: id,
                expected: "gear",
            }),
            None => Err(SimError::UnknownItem(id)),
        }
    }

    /// Look up a blueprint.
    #[must_use]
    pub fn blueprint(&self, id: BlueprintId) -> Option<&BlueprintData> {
        self.blueprints.get(&id)
    }

    /// Blueprints a given factory gear can produce, in id order.
    pub fn blueprints_for_factory(&self, factory: ItemId) -> impl Iterator<Item = &BlueprintData> {
        self.blueprints
            .values()
            .filter(move |bp| bp.factory_item == factory)
    }

    /// All items in id order.
    pub fn items(&self) -> impl Iterator<Item = &ItemData> {
        self.items.values()
    }

    /// All hulls in id order.
    pub fn hulls(&self) -> impl Iterator<Item = &HullData> {
        self.items.values().filter_map(|item| match item {
            ItemData::Hull(hull) => Some(hull),
            _ => None,
        })
    }

    /// All gear in id order.
    pub fn gears(&self) -> impl Iterator<Item = &GearData> {
        self.items.values().filter_map(|item| match item {
            ItemData::Gear(gear) => Some(gear),
            _ => None,
        })
    }

    /// Number of item definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether no items are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of blueprints.
    #[must_use]
    pub fn blueprint_count(&self) -> usize {
        self.blueprints.len()
    }

    /// Check cross references and value ranges.
    ///
    /// Returns one message per problem; empty means valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for item in self.items.values() {
            let name = item.name();
            if item.mass() < 0.0 {
                errors.push(format!("{name}: negative mass"));
            }
            match item {
                ItemData::Hull(hull) => {
                    if hull.durability <= 0.0 {
                        errors.push(format!("{name}: durability must be positive"));
                    }
                    if hull.heat_capacity <= 0.0 {
                        errors.push(format!("{name}: heat capacity must be positive"));
                    }
                    let mut coords: Vec<_> = hull.hardpoints.iter().map(|h| h.position).collect();
                    coords.sort_unstable();
                    if coords.windows(2).any(|w| w[0] == w[1]) {
                        errors.push(format!("{name}: duplicate hardpoint coordinate"));
                    }
                    if hull.hardpoints.len() > usize::from(u16::MAX) {
                        errors.push(format!("{name}: too many hardpoints"));
                    }
                }
                ItemData::Gear(gear) => {
                    if gear.durability <= 0.0 {
                        errors.push(format!("{name}: durability must be positive"));
                    }
                    for behavior in &gear.behaviors {
                        if let BehaviorData::ProjectileWeapon(weapon) = behavior {
                            if let Some(ammo) = weapon.ammo {
                                if self.commodity(ammo).is_none() {
                                    errors.push(format!(
                                        "{name}: ammunition {} is not a commodity",
                                        ammo.0
                                    ));
                                }
                            }
                        }
                    }
                }
                ItemData::Commodity(_) => {}
            }
        }

        for bp in self.blueprints.values() {
            if self.get(bp.item).is_none() {
                errors.push(format!("{}: unknown product {}", bp.name, bp.item.0));
            }
            let has_factory = self
                .gear(bp.factory_item)
                .is_some_and(|g| g.behaviors.iter().any(|b| matches!(b, BehaviorData::Factory(_))));
            if !has_factory {
                errors.push(format!(
                    "{}: factory item {} is not factory gear",
                    bp.name, bp.factory_item.0
                ));
            }
            for ingredient in &bp.ingredients {
                if self.commodity(ingredient.item).is_none() {
                    errors.push(format!(
                        "{}: ingredient {} is not a commodity",
                        bp.name, ingredient.item.0
                    ));
                }
            }
            if bp.production_time <= 0.0 {
                errors.push(format!("{}: production time must be positive", bp.name));
            }
        }

        errors
    }
}
