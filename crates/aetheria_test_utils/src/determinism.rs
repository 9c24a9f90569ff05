//! Determinism testing utilities.
//!
//! Provides a harness for verifying that a zone produces identical state
//! given identical inputs.
//!
//! # Testing Strategy
//!
//! Sources of non-determinism the harness is meant to catch:
//!
//! - **Map iteration order**: entities, orbits and observers live in
//!   ordered maps and update in ascending id order.
//! - **Unseeded randomness**: zone and loadout generation take explicit
//!   seeds.
//! - **Order-dependent aggregation**: behaviors accumulate heat and energy
//!   and the entity applies the sum once per tick.
//! - **Pack drift**: unpacking a saved zone must resume from the same
//!   persisted state.

use std::thread;

use aetheria_core::context::SimulationContext;
use aetheria_core::pack::ZonePack;
use aetheria_core::zone::Zone;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic simulation).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the simulation was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the simulation produced different hashes across runs.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Simulation is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `ticks` - Number of ticks to simulate per run
/// * `setup` - Function to create initial simulation state
/// * `step` - Function to advance simulation by one tick
/// * `hash` - Function to compute state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();
        for _ in 0..ticks {
            step(&mut state);
        }
        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Run a zone twice from the same setup and compare final state hashes.
pub fn verify_zone_determinism<F>(ctx: &SimulationContext, setup_fn: F, ticks: u64, delta: f32) -> bool
where
    F: Fn() -> Zone,
{
    verify_determinism(
        2,
        ticks,
        &setup_fn,
        |zone| {
            zone.update(ctx, delta);
        },
        Zone::state_hash,
    )
    .is_deterministic
}

/// Run `num_zones` copies of a zone on scoped threads and collect their
/// final hashes.
///
/// # Panics
///
/// Panics if a simulation thread panics.
pub fn run_parallel_zones<F>(
    ctx: &SimulationContext,
    setup_fn: F,
    num_zones: usize,
    ticks: u64,
    delta: f32,
) -> DeterminismResult
where
    F: Fn() -> Zone + Sync,
{
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..num_zones)
            .map(|_| {
                s.spawn(|| {
                    let mut zone = setup_fn();
                    for _ in 0..ticks {
                        zone.update(ctx, delta);
                    }
                    zone.state_hash()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("simulation thread panicked"))
            .collect()
    });

    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        ticks,
    }
}

/// Compare two runs tick by tick.
///
/// # Returns
///
/// `None` if the runs never differ, `Some(tick)` for the first tick whose
/// state hash differs.
pub fn find_first_divergence<F>(ctx: &SimulationContext, setup_fn: F, ticks: u64, delta: f32) -> Option<u64>
where
    F: Fn() -> Zone,
{
    let mut a = setup_fn();
    let mut b = setup_fn();
    if a.state_hash() != b.state_hash() {
        return Some(0);
    }
    for tick in 1..=ticks {
        a.update(ctx, delta);
        b.update(ctx, delta);
        if a.state_hash() != b.state_hash() {
            return Some(tick);
        }
    }
    None
}

/// Run a zone, pack it to bytes, unpack it, and check the restored zone
/// packs identically.
///
/// Runtime-only state (cooldowns, shield charge, factory progress) is not
/// part of a pack, so the comparison is pack against pack rather than
/// state hash against state hash.
pub fn verify_pack_round_trip<F>(ctx: &SimulationContext, setup_fn: F, ticks: u64, delta: f32) -> bool
where
    F: Fn() -> Zone,
{
    let mut zone = setup_fn();
    for _ in 0..ticks {
        zone.update(ctx, delta);
    }
    let pack = zone.to_pack();
    let Ok(bytes) = pack.to_bytes() else {
        return false;
    };
    let Ok(decoded) = ZonePack::from_bytes(&bytes) else {
        return false;
    };
    Zone::from_pack(ctx, &decoded).is_ok_and(|restored| restored.to_pack() == pack)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn test_verify_determinism_simple() {
        let result = verify_determinism(3, 100, || 0u64, |n| *n += 1, |n| *n);
        assert!(result.is_deterministic);
        assert_eq!(result.hashes, vec![100, 100, 100]);
    }

    #[test]
    fn test_detects_divergence() {
        let counter = std::cell::Cell::new(0u64);
        let result = verify_determinism(
            2,
            1,
            || {
                counter.set(counter.get() + 1);
                counter.get()
            },
            |_| {},
            |n| *n,
        );
        assert!(!result.is_deterministic);
        assert_eq!(result.unique_hashes().len(), 2);
    }

    #[test]
    fn test_skirmish_is_deterministic() {
        let ctx = fixtures::context();
        assert!(verify_zone_determinism(&ctx, || fixtures::skirmish(&ctx), 200, 0.1));
        assert_eq!(find_first_divergence(&ctx, || fixtures::skirmish(&ctx), 50, 0.1), None);
    }

    #[test]
    fn test_parallel_skirmishes_match() {
        let ctx = fixtures::context();
        run_parallel_zones(&ctx, || fixtures::skirmish(&ctx), 4, 100, 0.1).assert_deterministic();
    }

    #[test]
    fn test_skirmish_pack_round_trip() {
        let ctx = fixtures::context();
        assert!(verify_pack_round_trip(&ctx, || fixtures::skirmish(&ctx), 30, 0.1));
    }
}
