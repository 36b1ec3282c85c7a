pub mod environment;
pub mod error;
pub mod grid_world;
pub mod tetris_env;

pub use environment::{Discrete, Env, Info, Step, seeded_rng};
pub use error::{EnvError, Result};
pub use grid_world::GridWorldEnv;
pub use tetris_env::{TetrisEnv, TetrisEnvConfig};
