//! Performance stats and their evaluation.
//!
//! Every tunable number on a piece of gear is a [`PerformanceStat`]: a base
//! value plus an ordered list of [`StatModifier`]s that bend it according to
//! the condition of the item (durability, quality) and of the entity carrying
//! it (heat, temperature, stored energy, reactor capacitance).
//!
//! # Evaluation order
//!
//! The value starts at `base`. Every [`ModifierOp::Add`] modifier is applied
//! first, in declaration order. Every [`ModifierOp::Multiply`] and
//! [`ModifierOp::Divide`] modifier is then applied, in declaration order.
//! Each modifier computes `term = input * scale + offset`.
//!
//! If any modifier reads an input the entity cannot provide (reactor
//! capacitance on an entity without a reactor), the base value is returned
//! unmodified.
//!
//! # Example
//!
//! ```
//! use aetheria_core::stats::{
//!     EntityCondition, ItemCondition, ModifierOp, PerformanceStat, StatInput, StatModifier,
//! };
//!
//! // Damage scales with durability.
//! let damage = PerformanceStat::constant(10.0)
//!     .with_modifier(StatModifier::new(ModifierOp::Multiply, StatInput::Durability));
//!
//! let worn = ItemCondition { durability: 0.5, quality: 1.0 };
//! assert_eq!(damage.evaluate(&worn, &EntityCondition::default()), 5.0);
//! ```

use serde::{Deserialize, Serialize};

/// Smallest denominator a [`ModifierOp::Divide`] modifier may divide by.
pub const STAT_EPSILON: f32 = 1e-4;

/// How a modifier combines with the running value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModifierOp {
    /// `value += term`
    Add,
    /// `value *= term`
    Multiply,
    /// `value /= max(term, STAT_EPSILON)`
    Divide,
}

/// Which condition a modifier reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatInput {
    /// Always 1; the term is `scale + offset`.
    Constant,
    /// Item durability as a fraction of its maximum, `0..=1`.
    Durability,
    /// Item production quality, `0..=1`.
    Quality,
    /// Entity heat.
    Heat,
    /// Entity temperature (heat per unit of heat capacity).
    Temperature,
    /// Stored energy as a fraction of capacitance, `0..=1`.
    EnergyFraction,
    /// Total reactor capacitance. Missing when the entity has no reactor.
    ReactorCapacitance,
}

/// One step of the modifier chain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatModifier {
    /// Combination operator.
    pub op: ModifierOp,
    /// Condition read by this modifier.
    pub input: StatInput,
    /// Input multiplier.
    #[serde(default = "default_scale")]
    pub scale: f32,
    /// Added to the scaled input.
    #[serde(default)]
    pub offset: f32,
}

const fn default_scale() -> f32 {
    1.0
}

impl StatModifier {
    /// Create a modifier with unit scale and zero offset.
    #[must_use]
    pub const fn new(op: ModifierOp, input: StatInput) -> Self {
        Self {
            op,
            input,
            scale: 1.0,
            offset: 0.0,
        }
    }

    /// Set the input scale.
    #[must_use]
    pub const fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Set the offset.
    #[must_use]
    pub const fn with_offset(mut self, offset: f32) -> Self {
        self.offset = offset;
        self
    }

    /// Term contributed by this modifier, or `None` if the input is missing.
    fn term(&self, item: &ItemCondition, entity: &EntityCondition) -> Option<f32> {
        let input = match self.input {
            StatInput::Constant => 1.0,
            StatInput::Durability => item.durability,
            StatInput::Quality => item.quality,
            StatInput::Heat => entity.heat,
            StatInput::Temperature => entity.temperature,
            StatInput::EnergyFraction => entity.energy_fraction,
            StatInput::ReactorCapacitance => entity.reactor_capacitance?,
        };
        Some(input * self.scale + self.offset)
    }
}

/// A tunable gear stat.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PerformanceStat {
    /// Unmodified value.
    pub base: f32,
    /// Modifier chain.
    #[serde(default)]
    pub modifiers: Vec<StatModifier>,
}

impl PerformanceStat {
    /// A stat with no modifiers.
    #[must_use]
    pub const fn constant(base: f32) -> Self {
        Self {
            base,
            modifiers: Vec::new(),
        }
    }

    /// Append a modifier.
    #[must_use]
    pub fn with_modifier(mut self, modifier: StatModifier) -> Self {
        self.modifiers.push(modifier);
        self
    }

    /// Evaluate this stat. See [`evaluate`].
    #[must_use]
    pub fn evaluate(&self, item: &ItemCondition, entity: &EntityCondition) -> f32 {
        evaluate(self, item, entity)
    }
}

/// Condition of the item a stat belongs to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemCondition {
    /// Durability fraction, `0..=1`.
    pub durability: f32,
    /// Production quality, `0..=1`.
    pub quality: f32,
}

impl Default for ItemCondition {
    fn default() -> Self {
        Self {
            durability: 1.0,
            quality: 1.0,
        }
    }
}

/// Condition of the entity carrying the item, snapshotted at tick start.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EntityCondition {
    /// Heat.
    pub heat: f32,
    /// Temperature.
    pub temperature: f32,
    /// Stored energy fraction, `0..=1`.
    pub energy_fraction: f32,
    /// Total reactor capacitance, `None` without a reactor.
    pub reactor_capacitance: Option<f32>,
}

/// Resolve a stat against item and entity condition.
///
/// Pure: the same inputs always produce the same output, and nothing is
/// mutated.
#[must_use]
pub fn evaluate(stat: &PerformanceStat, item: &ItemCondition, entity: &EntityCondition) -> f32 {
    let mut terms = Vec::with_capacity(stat.modifiers.len());
    for modifier in &stat.modifiers {
        match modifier.term(item, entity) {
            Some(term) => terms.push((modifier.op, term)),
            None => return stat.base,
        }
    }

    let mut value = stat.base;
    for (op, term) in &terms {
        if *op == ModifierOp::Add {
            value += term;
        }
    }
    for (op, term) in &terms {
        match op {
            ModifierOp::Add => {}
            ModifierOp::Multiply => value *= term,
            ModifierOp::Divide => value /= term.max(STAT_EPSILON),
        }
    }
    value
}
