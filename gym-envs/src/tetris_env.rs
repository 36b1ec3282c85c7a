use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use tetris_core::tetris::{Action, Event, Game, GameConfig, Grid, ROW_SCORE, Timing};

use crate::environment::{Discrete, Env, Info, Step};

/// Reward taken away when the stack tops out
pub const LOSS_PENALTY: f32 = 50.0;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct TetrisEnvConfig {
    /// Game time that passes on every step
    pub step_duration_ms: u64,
    /// Episodes are truncated after this many steps
    pub max_steps: Option<u32>,
    pub seed: Option<u64>,
    pub timing: Timing,
}

impl Default for TetrisEnvConfig {
    fn default() -> Self {
        Self {
            step_duration_ms: 100,
            max_steps: None,
            seed: None,
            timing: Timing::default(),
        }
    }
}

/// A simple wrapper around a tetris game
#[derive(Debug)]
pub struct TetrisEnv {
    pub game: Game,
    config: TetrisEnvConfig,
    steps: u32,
}

impl TetrisEnv {
    pub fn new(config: TetrisEnvConfig) -> Self {
        Self {
            game: Game::new(GameConfig {
                seed: config.seed,
                timing: config.timing,
            }),
            config,
            steps: 0,
        }
    }

    pub const fn state(&self) -> &Grid {
        &self.game.grid
    }

    pub const fn steps(&self) -> u32 {
        self.steps
    }

    fn info(&self) -> Info {
        let piece = &self.game.piece;
        let mut info = Info::new();
        info.insert("score".into(), self.game.score.into());
        info.insert("rows_cleared".into(), self.game.rows_cleared.into());
        info.insert("piece".into(), piece.kind.name().into());
        info.insert("x".into(), piece.x.into());
        info.insert("y".into(), piece.y.into());
        info.insert("rotation".into(), piece.rotation.into());
        info.insert(
            "fall_speed_ms".into(),
            (self.game.fall_speed().as_millis() as u64).into(),
        );
        info
    }
}

impl Default for TetrisEnv {
    fn default() -> Self {
        Self::new(TetrisEnvConfig::default())
    }
}

impl Env for TetrisEnv {
    type Obs = Grid;
    type Act = Action;

    fn action_space(&self) -> Discrete {
        Discrete::new(Action::ALL.len() as u32)
    }

    fn decode_action(&self, action: i64) -> Option<Action> {
        Action::from_index(action)
    }

    fn reset(&mut self, seed: Option<u64>) -> (Grid, Info) {
        self.game.reset(seed);
        self.steps = 0;
        (self.game.grid.clone(), self.info())
    }

    fn step(&mut self, action: Action) -> Step<Grid> {
        if self.game.done {
            warn!("Step called on a finished episode, reset first");
            return Step {
                observation: self.game.grid.clone(),
                reward: 0.0,
                terminated: true,
                truncated: false,
                info: self.info(),
            };
        }

        self.game
            .step(action, Duration::from_millis(self.config.step_duration_ms));
        self.steps += 1;

        let mut reward = 0.0;
        for event in &self.game.events {
            match event {
                Event::Completion(rows) => reward += f32::from(*rows) * ROW_SCORE as f32,
                Event::Gameover => reward -= LOSS_PENALTY,
            }
        }
        let terminated = self.game.done;
        let truncated = !terminated
            && self
                .config
                .max_steps
                .is_some_and(|max_steps| self.steps >= max_steps);
        debug!("Step {}: reward {reward}, terminated {terminated}", self.steps);

        Step {
            observation: self.game.grid.clone(),
            reward,
            terminated,
            truncated,
            info: self.info(),
        }
    }
}
