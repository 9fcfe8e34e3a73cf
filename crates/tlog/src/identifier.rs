//! Identifier allocation: binds record names to stable `u32` ids.
//!
//! Reserved ids are honored exactly. Auto-allocated ids are drawn from a
//! deterministic, non-clustering sequence so tests can assert "looks
//! pseudo-random, never collides" without needing true randomness.

use std::collections::HashMap;

use crate::error::{Result, TlogError};

/// A stable numeric key for a named record series within one TLOG file.
///
/// Valid range is `[1, 2^31)`; `0` is reserved and never assignable.
pub type Identifier = u32;

const LCG_MULTIPLIER: u64 = 1_103_515_245;
const LCG_INCREMENT: u64 = 12345;
const LCG_MODULUS: u64 = 1 << 31;
const SEED_CONSTANT: u64 = 0x5bd1_e995;

/// Next candidate in the auto-allocation sequence for draw number `counter`.
///
/// A 31-bit linear congruential generator seeded from a fixed constant
/// XORed with the draw count, so the sequence is reproducible within a
/// process but doesn't simply count up from 1.
fn lcg_candidate(counter: u64) -> u32 {
    let seed = SEED_CONSTANT ^ counter;
    let value = LCG_MULTIPLIER.wrapping_mul(seed).wrapping_add(LCG_INCREMENT) % LCG_MODULUS;
    value as u32
}

/// Tracks the name→id bindings and the set of taken ids for one writer.
#[derive(Debug, Default)]
pub struct IdentifierTable {
    names: HashMap<String, Identifier>,
    taken: std::collections::HashSet<Identifier>,
    draws: u64,
}

impl IdentifierTable {
    /// An empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True if `id` has already been bound to some name.
    #[must_use]
    pub fn is_taken(&self, id: Identifier) -> bool {
        self.taken.contains(&id)
    }

    /// The id bound to `name`, if any.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Identifier> {
        self.names.get(name).copied()
    }

    /// `AllocateIdentifier`: idempotent lookup-or-create.
    ///
    /// Returns the existing id if `name` is already bound; otherwise draws a
    /// fresh id from the auto-allocation sequence, skipping any id already
    /// taken, and binds it.
    pub fn allocate(&mut self, name: &str) -> Identifier {
        if let Some(&id) = self.names.get(name) {
            return id;
        }
        let id = loop {
            let candidate = lcg_candidate(self.draws);
            self.draws += 1;
            if candidate != 0 && !self.taken.contains(&candidate) {
                break candidate;
            }
        };
        self.taken.insert(id);
        self.names.insert(name.to_string(), id);
        id
    }

    /// `ReserveIdentifier`: binds `name` to the explicit `id`.
    ///
    /// Returns `Ok(false)` without effect if `id` or `name` is already
    /// taken. Fails with [`TlogError::IdentifierReserved`] if `id` is `0`,
    /// which is never an assignable identifier.
    pub fn reserve(&mut self, name: &str, id: Identifier) -> Result<bool> {
        if id == 0 {
            return Err(TlogError::IdentifierReserved);
        }
        if self.taken.contains(&id) || self.names.contains_key(name) {
            return Ok(false);
        }
        self.taken.insert(id);
        self.names.insert(name.to_string(), id);
        Ok(true)
    }
}
