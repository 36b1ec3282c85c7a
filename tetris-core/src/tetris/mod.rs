mod board;
mod game;
mod shape;

pub use board::*;
pub use game::*;
pub use shape::*;
