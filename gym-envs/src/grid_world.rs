use log::debug;
use rand::{Rng, rngs::SmallRng};
use serde::{Deserialize, Serialize};

use crate::{
    environment::{Discrete, Env, Info, Step, seeded_rng},
    error::{EnvError, Result},
};

pub const DEFAULT_SIZE: i64 = 5;

#[repr(u8)]
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Right,
    Up,
    Left,
    Down,
}

impl Direction {
    pub const ALL: [Self; 4] = [Self::Right, Self::Up, Self::Left, Self::Down];

    pub fn from_index(index: i64) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
    }

    pub const fn delta(self) -> [i64; 2] {
        match self {
            Self::Right => [1, 0],
            Self::Up => [0, 1],
            Self::Left => [-1, 0],
            Self::Down => [0, -1],
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    pub agent: [i64; 2],
    pub target: [i64; 2],
}

impl Observation {
    pub const fn distance(&self) -> i64 {
        (self.agent[0] - self.target[0]).abs() + (self.agent[1] - self.target[1]).abs()
    }
}

/// Square grid where an agent walks towards a target
#[derive(Debug)]
pub struct GridWorldEnv {
    size: i64,
    agent: [i64; 2],
    target: [i64; 2],
    rng: SmallRng,
}

impl GridWorldEnv {
    pub fn new(size: i64, seed: Option<u64>) -> Result<Self> {
        if size < 2 {
            return Err(EnvError::GridTooSmall(size));
        }
        let mut new = Self {
            size,
            agent: [0, 0],
            target: [0, 0],
            rng: seeded_rng(seed),
        };
        new.place();
        Ok(new)
    }

    pub const fn size(&self) -> i64 {
        self.size
    }

    pub const fn observation(&self) -> Observation {
        Observation {
            agent: self.agent,
            target: self.target,
        }
    }

    fn info(&self) -> Info {
        let mut info = Info::new();
        info.insert("distance".into(), self.observation().distance().into());
        info
    }

    fn random_cell(&mut self) -> [i64; 2] {
        [
            self.rng.random_range(0..self.size),
            self.rng.random_range(0..self.size),
        ]
    }

    fn place(&mut self) {
        self.agent = self.random_cell();
        self.target = self.agent;
        while self.target == self.agent {
            self.target = self.random_cell();
        }
    }
}

impl Env for GridWorldEnv {
    type Obs = Observation;
    type Act = Direction;

    fn action_space(&self) -> Discrete {
        Discrete::new(Direction::ALL.len() as u32)
    }

    fn decode_action(&self, action: i64) -> Option<Direction> {
        Direction::from_index(action)
    }

    fn reset(&mut self, seed: Option<u64>) -> (Observation, Info) {
        if let Some(seed) = seed {
            self.rng = seeded_rng(Some(seed));
        }
        self.place();
        (self.observation(), self.info())
    }

    fn step(&mut self, action: Direction) -> Step<Observation> {
        let delta = action.delta();
        for (coord, step) in self.agent.iter_mut().zip(delta) {
            *coord = (*coord + step).clamp(0, self.size - 1);
        }
        let terminated = self.agent == self.target;
        debug!("{action:?}: agent at {:?}, target {:?}", self.agent, self.target);

        Step {
            observation: self.observation(),
            reward: if terminated { 1.0 } else { 0.0 },
            terminated,
            truncated: false,
            info: self.info(),
        }
    }
}
