//! Sources of die values.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::Die;

/// Produces the value of a single die.
pub trait DiceRoller {
    /// Roll one die, returning a value in `1..=die.sides()`.
    fn roll_die(&mut self, die: Die) -> u32;
}

/// Rolls with a seedable [`StdRng`].
#[derive(Debug, Clone)]
pub struct RandomRoller {
    rng: StdRng,
}

impl RandomRoller {
    /// A roller seeded from the operating system.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// A deterministic roller.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomRoller {
    fn default() -> Self {
        Self::new()
    }
}

impl DiceRoller for RandomRoller {
    fn roll_die(&mut self, die: Die) -> u32 {
        self.rng.random_range(1..=die.sides())
    }
}

/// Replays a fixed sequence of values, wrapping around at the end.
///
/// Values are clamped into the die's range. An empty script always rolls 1.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRoller {
    values: Vec<u32>,
    next: usize,
    rolled: usize,
}

impl ScriptedRoller {
    /// A roller that yields `values` in order.
    pub fn new(values: impl Into<Vec<u32>>) -> Self {
        Self {
            values: values.into(),
            next: 0,
            rolled: 0,
        }
    }

    /// How many dice have been rolled so far.
    pub fn rolled(&self) -> usize {
        self.rolled
    }
}

impl DiceRoller for ScriptedRoller {
    fn roll_die(&mut self, die: Die) -> u32 {
        self.rolled += 1;
        let Some(&value) = self.values.get(self.next) else {
            return 1;
        };
        self.next = (self.next + 1) % self.values.len();
        value.clamp(1, die.sides())
    }
}
