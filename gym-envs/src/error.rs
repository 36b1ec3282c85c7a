#[derive(Debug, thiserror::Error)]
pub enum EnvError {
    #[error("Invalid action {action}, expected a value in 0..{n}")]
    InvalidAction { action: i64, n: u32 },
    #[error("Grid world needs at least 2 cells per side, got {0}")]
    GridTooSmall(i64),
}

pub type Result<T> = std::result::Result<T, EnvError>;
