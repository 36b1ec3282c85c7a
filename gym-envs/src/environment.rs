use rand::{Rng, SeedableRng, rngs::SmallRng};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::error::{EnvError, Result};

/// Auxiliary diagnostics returned next to every observation
pub type Info = serde_json::Map<String, serde_json::Value>;

/// Seeded generator when `seed` is given, OS entropy otherwise
pub fn seeded_rng(seed: Option<u64>) -> SmallRng {
    match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_os_rng(),
    }
}

/// Actions numbered `0..n`
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Discrete {
    pub n: u32,
}

impl Discrete {
    /// # Panics
    ///
    /// Panics if `n` is zero, a space without actions cannot be sampled.
    pub const fn new(n: u32) -> Self {
        assert!(n > 0, "Discrete space needs at least one action");
        Self { n }
    }

    pub fn contains(&self, action: i64) -> bool {
        (0..i64::from(self.n)).contains(&action)
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> i64 {
        i64::from(rng.random_range(0..self.n))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step<Obs> {
    pub observation: Obs,
    pub reward: f32,
    pub terminated: bool,
    pub truncated: bool,
    pub info: Info,
}

impl<Obs> Step<Obs> {
    pub const fn done(&self) -> bool {
        self.terminated || self.truncated
    }
}

/// A turn-based environment driven by discrete actions
pub trait Env {
    type Obs;
    type Act: Copy + Debug;

    fn action_space(&self) -> Discrete;

    /// Maps an action number onto a typed action
    fn decode_action(&self, action: i64) -> Option<Self::Act>;

    /// Starts a new episode, reseeding the environment when `seed` is given
    fn reset(&mut self, seed: Option<u64>) -> (Self::Obs, Info);

    fn step(&mut self, action: Self::Act) -> Step<Self::Obs>;

    /// Like [`Env::step`], for callers holding a raw action number
    fn step_index(&mut self, action: i64) -> Result<Step<Self::Obs>> {
        let decoded = self
            .decode_action(action)
            .ok_or(EnvError::InvalidAction {
                action,
                n: self.action_space().n,
            })?;
        Ok(self.step(decoded))
    }
}
