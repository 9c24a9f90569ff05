//! Property-based testing strategies.

use aetheria_core::data::{SectorZone, ZoneId};
use aetheria_core::math::Vec2Fixed;
use aetheria_core::stats::{
    EntityCondition, ItemCondition, ModifierOp, PerformanceStat, StatInput, StatModifier,
};
use proptest::prelude::*;

/// Any modifier operation.
pub fn arb_modifier_op() -> impl Strategy<Value = ModifierOp> {
    prop_oneof![
        Just(ModifierOp::Add),
        Just(ModifierOp::Multiply),
        Just(ModifierOp::Divide),
    ]
}

/// Any stat input.
pub fn arb_stat_input() -> impl Strategy<Value = StatInput> {
    prop_oneof![
        Just(StatInput::Constant),
        Just(StatInput::Durability),
        Just(StatInput::Quality),
        Just(StatInput::Heat),
        Just(StatInput::Temperature),
        Just(StatInput::EnergyFraction),
        Just(StatInput::ReactorCapacitance),
    ]
}

/// A modifier with moderate scale and offset.
pub fn arb_modifier() -> impl Strategy<Value = StatModifier> {
    (arb_modifier_op(), arb_stat_input(), -4.0f32..4.0, -4.0f32..4.0).prop_map(
        |(op, input, scale, offset)| StatModifier::new(op, input).with_scale(scale).with_offset(offset),
    )
}

/// A stat with up to `max_modifiers` modifiers.
pub fn arb_stat(max_modifiers: usize) -> impl Strategy<Value = PerformanceStat> {
    (-1000.0f32..1000.0, proptest::collection::vec(arb_modifier(), 0..=max_modifiers))
        .prop_map(|(base, modifiers)| PerformanceStat { base, modifiers })
}

/// Item condition within its documented ranges.
pub fn arb_item_condition() -> impl Strategy<Value = ItemCondition> {
    (0.0f32..=1.0, 0.0f32..=1.0).prop_map(|(durability, quality)| ItemCondition {
        durability,
        quality,
    })
}

/// Entity condition, with or without a reactor.
pub fn arb_entity_condition() -> impl Strategy<Value = EntityCondition> {
    (
        0.0f32..10_000.0,
        0.0f32..100.0,
        0.0f32..=1.0,
        proptest::option::of(0.0f32..5_000.0),
    )
        .prop_map(|(heat, temperature, energy_fraction, reactor_capacitance)| EntityCondition {
            heat,
            temperature,
            energy_fraction,
            reactor_capacitance,
        })
}

/// Position within a few thousand units of the origin.
pub fn arb_position() -> impl Strategy<Value = Vec2Fixed> {
    (-3000i32..3000, -3000i32..3000).prop_map(|(x, y)| crate::fixtures::at(x, y))
}

/// Sector with a random id and radius.
pub fn arb_sector() -> impl Strategy<Value = SectorZone> {
    (0u32..1000, 500.0f32..20_000.0)
        .prop_map(|(id, radius)| SectorZone::new(ZoneId::new(id), "Sector", (0.0, 0.0), radius))
}
