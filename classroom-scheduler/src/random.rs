//! Injectable randomness
//!
//! All probability draws of the rule tree go through [`RandomSource`], so a
//! seeded generator replays a session exactly.

use rand::{Rng, RngCore};

pub trait RandomSource {
    /// Uniform draw in `[0, 1)`
    fn next_unit(&mut self) -> f64;

    /// Uniform index in `0..len`; `len` is never 0
    fn pick_index(&mut self, len: usize) -> usize;

    /// True with probability `p`
    fn chance(&mut self, p: f64) -> bool {
        self.next_unit() < p
    }

    /// Uniform pick from a slice
    fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T>
    where
        Self: Sized,
    {
        if items.is_empty() {
            None
        } else {
            Some(&items[self.pick_index(items.len())])
        }
    }
}

impl<R: RngCore + ?Sized> RandomSource for R {
    fn next_unit(&mut self) -> f64 {
        self.gen::<f64>()
    }

    fn pick_index(&mut self, len: usize) -> usize {
        self.gen_range(0..len)
    }
}

/// Uniform pick through a trait object
pub(crate) fn choose<'a, T>(rng: &mut dyn RandomSource, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        None
    } else {
        Some(&items[rng.pick_index(items.len())])
    }
}

/// Replays fixed draws, for pinning individual branches in tests
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct ScriptedRandom {
    units: std::collections::VecDeque<f64>,
    indices: std::collections::VecDeque<usize>,
}

#[cfg(test)]
impl ScriptedRandom {
    pub(crate) fn new(units: &[f64], indices: &[usize]) -> Self {
        Self {
            units: units.iter().copied().collect(),
            indices: indices.iter().copied().collect(),
        }
    }
}

#[cfg(test)]
impl RandomSource for ScriptedRandom {
    fn next_unit(&mut self) -> f64 {
        self.units.pop_front().expect("scripted unit draws exhausted")
    }

    fn pick_index(&mut self, len: usize) -> usize {
        self.indices.pop_front().expect("scripted index draws exhausted") % len
    }
}
