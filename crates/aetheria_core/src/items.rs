//! Item instances and cargo storage.
//!
//! An [`ItemInstance`] is either a stack of a commodity or one piece of
//! [`Gear`]. Cargo bays hold instances up to a volume capacity; gear leaves
//! cargo when it is equipped and returns when it is unequipped.

use serde::{Deserialize, Serialize};

use crate::data::{BlueprintId, GearData, Ingredient, ItemData, ItemDatabase, ItemId};
use crate::stats::ItemCondition;

/// Durability fraction of gear produced at zero quality.
pub const MIN_CRAFTED_DURABILITY: f32 = 0.5;

/// One piece of gear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gear {
    /// Gear definition.
    pub data: ItemId,
    /// Current durability.
    pub durability: f32,
    /// Durability when new.
    pub max_durability: f32,
    /// Production quality, `0..=1`. Loot and starting gear are 1.
    pub quality: f32,
    /// Blueprint this gear was produced from.
    pub blueprint: Option<BlueprintId>,
    /// Disabled gear is equipped but skipped by the update loop.
    pub enabled: bool,
}

impl Gear {
    /// Brand new gear at full durability.
    #[must_use]
    pub fn new(data: &GearData) -> Self {
        Self {
            data: data.id,
            durability: data.durability,
            max_durability: data.durability,
            quality: 1.0,
            blueprint: None,
            enabled: true,
        }
    }

    /// Gear produced by a factory.
    ///
    /// Quality scales starting durability between
    /// [`MIN_CRAFTED_DURABILITY`] and full.
    #[must_use]
    pub fn crafted(data: &GearData, blueprint: BlueprintId, quality: f32) -> Self {
        let quality = quality.clamp(0.0, 1.0);
        let fraction = MIN_CRAFTED_DURABILITY + (1.0 - MIN_CRAFTED_DURABILITY) * quality;
        Self {
            durability: data.durability * fraction,
            quality,
            blueprint: Some(blueprint),
            ..Self::new(data)
        }
    }

    /// Set durability, clamped to `0..=max`.
    #[must_use]
    pub fn with_durability(mut self, durability: f32) -> Self {
        self.durability = durability.clamp(0.0, self.max_durability);
        self
    }

    /// Durability as a fraction of its maximum.
    #[must_use]
    pub fn durability_fraction(&self) -> f32 {
        if self.max_durability <= 0.0 {
            return 0.0;
        }
        (self.durability / self.max_durability).clamp(0.0, 1.0)
    }

    /// Condition used for stat evaluation.
    #[must_use]
    pub fn condition(&self) -> ItemCondition {
        ItemCondition {
            durability: self.durability_fraction(),
            quality: self.quality,
        }
    }
}

/// Anything that can sit in a cargo bay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ItemInstance {
    /// A stack of a commodity.
    Commodity {
        /// Commodity definition.
        item: ItemId,
        /// Units in the stack.
        quantity: u32,
    },
    /// One piece of gear.
    Gear(Gear),
}

impl ItemInstance {
    /// Definition id.
    #[must_use]
    pub const fn item_id(&self) -> ItemId {
        match self {
            Self::Commodity { item, .. } => *item,
            Self::Gear(gear) => gear.data,
        }
    }

    /// Units represented by this instance.
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        match self {
            Self::Commodity { quantity, .. } => *quantity,
            Self::Gear(_) => 1,
        }
    }

    /// Cargo volume taken. Unknown items count as one unit of volume each.
    #[must_use]
    pub fn volume(&self, items: &ItemDatabase) -> f32 {
        let unit = items.get(self.item_id()).map_or(1.0, ItemData::size);
        unit * self.quantity() as f32
    }

    /// Total mass. Unknown items are weightless.
    #[must_use]
    pub fn mass(&self, items: &ItemDatabase) -> f32 {
        let unit = items.get(self.item_id()).map_or(0.0, ItemData::mass);
        unit * self.quantity() as f32
    }
}

/// A volume-limited container.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CargoBay {
    /// Maximum total volume.
    pub capacity: f32,
    contents: Vec<ItemInstance>,
}

impl CargoBay {
    /// Create an empty bay.
    #[must_use]
    pub const fn new(capacity: f32) -> Self {
        Self {
            capacity,
            contents: Vec::new(),
        }
    }

    /// Stored instances.
    #[must_use]
    pub fn contents(&self) -> &[ItemInstance] {
        &self.contents
    }

    /// Whether nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    /// Volume currently used.
    #[must_use]
    pub fn used(&self, items: &ItemDatabase) -> f32 {
        self.contents.iter().map(|i| i.volume(items)).sum()
    }

    /// Volume still free.
    #[must_use]
    pub fn free(&self, items: &ItemDatabase) -> f32 {
        (self.capacity - self.used(items)).max(0.0)
    }

    /// Total mass of the contents.
    #[must_use]
    pub fn mass(&self, items: &ItemDatabase) -> f32 {
        self.contents.iter().map(|i| i.mass(items)).sum()
    }

    /// Store an item if it fits entirely, merging commodity stacks.
    ///
    /// # Errors
    ///
    /// Returns the item unchanged if there is not enough room.
    pub fn try_store(
        &mut self,
        item: ItemInstance,
        items: &ItemDatabase,
    ) -> std::result::Result<(), ItemInstance> {
        if item.volume(items) > self.free(items) + f32::EPSILON {
            return Err(item);
        }
        match item {
            ItemInstance::Commodity { item: id, quantity } => {
                let stack = self.contents.iter_mut().find_map(|c| match c {
                    ItemInstance::Commodity { item, quantity } if *item == id => Some(quantity),
                    _ => None,
                });
                match stack {
                    Some(existing) => *existing += quantity,
                    None => self.contents.push(ItemInstance::Commodity { item: id, quantity }),
                }
            }
            gear @ ItemInstance::Gear(_) => self.contents.push(gear),
        }
        Ok(())
    }

    /// Units of a commodity stored.
    #[must_use]
    pub fn count(&self, item: ItemId) -> u32 {
        self.contents
            .iter()
            .filter(|c| matches!(c, ItemInstance::Commodity { item: id, .. } if *id == item))
            .map(ItemInstance::quantity)
            .sum()
    }

    /// Remove up to `quantity` units of a commodity. Returns units removed.
    pub fn remove_commodity(&mut self, item: ItemId, quantity: u32) -> u32 {
        let mut remaining = quantity;
        for instance in &mut self.contents {
            if remaining == 0 {
                break;
            }
            if let ItemInstance::Commodity { item: id, quantity } = instance {
                if *id == item {
                    let taken = remaining.min(*quantity);
                    *quantity -= taken;
                    remaining -= taken;
                }
            }
        }
        self.contents
            .retain(|c| !matches!(c, ItemInstance::Commodity { quantity: 0, .. }));
        quantity - remaining
    }

    /// Remove and return the instance at `index`.
    pub fn take(&mut self, index: usize) -> Option<ItemInstance> {
        if index < self.contents.len() {
            Some(self.contents.remove(index))
        } else {
            None
        }
    }
}

/// Units of a commodity across several bays.
#[must_use]
pub fn count_in(bays: &[CargoBay], item: ItemId) -> u32 {
    bays.iter().map(|bay| bay.count(item)).sum()
}

/// Whether the bays hold every ingredient in full.
#[must_use]
pub fn has_ingredients(bays: &[CargoBay], ingredients: &[Ingredient]) -> bool {
    ingredients
        .iter()
        .all(|ing| count_in(bays, ing.item) >= ing.quantity)
}

/// Consume every ingredient, or nothing at all.
///
/// Returns `false` without touching the bays if any ingredient is short.
pub fn consume_ingredients(bays: &mut [CargoBay], ingredients: &[Ingredient]) -> bool {
    if !has_ingredients(bays, ingredients) {
        return false;
    }
    for ingredient in ingredients {
        let mut remaining = ingredient.quantity;
        for bay in bays.iter_mut() {
            if remaining == 0 {
                break;
            }
            remaining -= bay.remove_commodity(ingredient.item, remaining);
        }
        debug_assert_eq!(remaining, 0, "ingredient availability was checked");
    }
    true
}

/// Store in the first bay with room.
///
/// # Errors
///
/// Returns the item if no bay can hold it.
pub fn store_in(
    bays: &mut [CargoBay],
    item: ItemInstance,
    items: &ItemDatabase,
) -> std::result::Result<(), ItemInstance> {
    let mut item = item;
    for bay in bays.iter_mut() {
        match bay.try_store(item, items) {
            Ok(()) => return Ok(()),
            Err(back) => item = back,
        }
    }
    Err(item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{CommodityData, HardpointType};

    fn db() -> ItemDatabase {
        let mut db = ItemDatabase::new();
        db.register_item(ItemData::Commodity(CommodityData {
            id: ItemId::new(1),
            name: "Ore".to_string(),
            mass: 2.0,
            size: 1.0,
        }))
        .expect("unique");
        db.register_item(ItemData::Gear(gear_data()))
            .expect("unique");
        db
    }

    fn gear_data() -> GearData {
        GearData {
            id: ItemId::new(2),
            name: "Cannon".to_string(),
            mass: 5.0,
            size: 4.0,
            durability: 200.0,
            hardpoint: HardpointType::Ballistic,
            behaviors: Vec::new(),
        }
    }

    fn ore(quantity: u32) -> ItemInstance {
        ItemInstance::Commodity {
            item: ItemId::new(1),
            quantity,
        }
    }

    #[test]
    fn test_store_merges_stacks() {
        let db = db();
        let mut bay = CargoBay::new(10.0);
        bay.try_store(ore(3), &db).expect("fits");
        bay.try_store(ore(4), &db).expect("fits");
        assert_eq!(bay.contents().len(), 1);
        assert_eq!(bay.count(ItemId::new(1)), 7);
        assert_eq!(bay.mass(&db), 14.0);
    }

    #[test]
    fn test_store_rejects_overflow() {
        let db = db();
        let mut bay = CargoBay::new(5.0);
        bay.try_store(ore(3), &db).expect("fits");
        let back = bay.try_store(ore(3), &db).expect_err("too big");
        assert_eq!(back, ore(3));
        assert_eq!(bay.count(ItemId::new(1)), 3);
    }

    #[test]
    fn test_consume_is_all_or_nothing() {
        let db = db();
        let mut bays = vec![CargoBay::new(5.0), CargoBay::new(5.0)];
        bays[0].try_store(ore(2), &db).expect("fits");
        bays[1].try_store(ore(2), &db).expect("fits");

        let want_five = [Ingredient {
            item: ItemId::new(1),
            quantity: 5,
        }];
        assert!(!consume_ingredients(&mut bays, &want_five));
        assert_eq!(count_in(&bays, ItemId::new(1)), 4);

        let want_three = [Ingredient {
            item: ItemId::new(1),
            quantity: 3,
        }];
        assert!(consume_ingredients(&mut bays, &want_three));
        assert_eq!(count_in(&bays, ItemId::new(1)), 1);
        assert!(bays[0].is_empty());
    }

    #[test]
    fn test_store_in_spills_to_next_bay() {
        let db = db();
        let mut bays = vec![CargoBay::new(2.0), CargoBay::new(8.0)];
        let cannon = ItemInstance::Gear(Gear::new(&gear_data()));
        store_in(&mut bays, cannon, &db).expect("second bay fits");
        assert!(bays[0].is_empty());
        assert_eq!(bays[1].contents().len(), 1);
    }

    #[test]
    fn test_crafted_gear_durability_scales_with_quality() {
        let data = gear_data();
        let low = Gear::crafted(&data, BlueprintId::new(1), 0.0);
        let high = Gear::crafted(&data, BlueprintId::new(1), 1.0);
        assert_eq!(low.durability, 100.0);
        assert_eq!(high.durability, 200.0);
        assert_eq!(low.condition().quality, 0.0);
        assert_eq!(high.durability_fraction(), 1.0);
    }
}
