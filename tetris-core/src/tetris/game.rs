use log::{debug, info};
use rand::{Rng, SeedableRng, rngs::SmallRng};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{Grid, Kind, LockedPositions, Piece};

/// Score for every cleared row
pub const ROW_SCORE: u32 = 10;

/// Gravity settings, all in milliseconds
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct Timing {
    pub initial_fall_ms: u64,
    pub min_fall_ms: u64,
    pub speedup_ms: u64,
    pub level_interval_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            initial_fall_ms: 270,
            min_fall_ms: 120,
            speedup_ms: 5,
            level_interval_ms: 5000,
        }
    }
}

impl Timing {
    pub const fn initial_fall_speed(&self) -> Duration {
        Duration::from_millis(self.initial_fall_ms)
    }

    /// Fall speed after one more level interval has passed
    pub fn next_fall_speed(&self, current: Duration) -> Duration {
        if current > Duration::from_millis(self.min_fall_ms) {
            current.saturating_sub(Duration::from_millis(self.speedup_ms))
        } else {
            current
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(default)]
pub struct GameConfig {
    pub seed: Option<u64>,
    pub timing: Timing,
}

impl GameConfig {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }
}

pub fn getrandom(seed: Option<u64>) -> SmallRng {
    match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_os_rng(),
    }
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum Event {
    /// A piece locked, clearing this many rows
    Completion(u8),
    Gameover,
}

#[repr(u8)]
#[derive(PartialEq, Eq, Debug, Clone, Copy, Serialize, Deserialize)]
pub enum Action {
    Left,
    Right,
    Rotate,
    SoftDrop,
}

impl Action {
    pub const ALL: [Self; 4] = [Self::Left, Self::Right, Self::Rotate, Self::SoftDrop];

    pub fn from_index(index: i64) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Phase {
    Falling,
    Landed,
}

#[derive(Debug)]
pub struct Game {
    pub locked: LockedPositions,
    /// Locked cells plus the falling piece, as of the last step
    pub grid: Grid,
    pub piece: Piece,
    pub next: Piece,
    pub score: u32,
    pub rows_cleared: u32,
    pub phase: Phase,
    fall_time: Duration,
    level_time: Duration,
    fall_speed: Duration,
    timing: Timing,
    rng: SmallRng,
    pub done: bool,
    pub events: Vec<Event>,
}

impl Game {
    pub fn new(config: GameConfig) -> Self {
        let mut rng = getrandom(config.seed);
        let piece = Self::random_piece(&mut rng);
        let next = Self::random_piece(&mut rng);
        let mut new = Self {
            locked: LockedPositions::new(),
            grid: Grid::default(),
            piece,
            next,
            score: 0,
            rows_cleared: 0,
            phase: Phase::Falling,
            fall_time: Duration::ZERO,
            level_time: Duration::ZERO,
            fall_speed: config.timing.initial_fall_speed(),
            timing: config.timing,
            rng,
            done: false,
            events: vec![],
        };
        new.refresh_grid();
        new
    }

    /// Starts a new game. The random generator is only reseeded when a seed is given.
    pub fn reset(&mut self, seed: Option<u64>) {
        if let Some(seed) = seed {
            self.rng = SmallRng::seed_from_u64(seed);
        }
        self.locked = LockedPositions::new();
        self.piece = Self::random_piece(&mut self.rng);
        self.next = Self::random_piece(&mut self.rng);
        self.score = 0;
        self.rows_cleared = 0;
        self.phase = Phase::Falling;
        self.fall_time = Duration::ZERO;
        self.level_time = Duration::ZERO;
        self.fall_speed = self.timing.initial_fall_speed();
        self.done = false;
        self.events.clear();
        self.refresh_grid();
    }

    /// Advances the game by `elapsed`, then applies `action`
    pub fn step(&mut self, action: Action, elapsed: Duration) {
        self.events.clear();
        if self.done {
            return;
        }
        self.grid = Grid::from_locked(&self.locked);

        self.gravity(elapsed);
        self.process_input(action);
        self.grid.paint(&self.piece);
        debug!(
            "{action:?}: {:?} at ({}, {}) rotation {}",
            self.piece.kind, self.piece.x, self.piece.y, self.piece.rotation
        );

        if self.phase == Phase::Landed {
            self.lock();
        }
        if self.locked.is_lost() {
            self.gameover();
        }
    }

    pub const fn fall_speed(&self) -> Duration {
        self.fall_speed
    }

    fn gravity(&mut self, elapsed: Duration) {
        self.fall_time += elapsed;
        self.level_time += elapsed;

        if self.level_time > Duration::from_millis(self.timing.level_interval_ms) {
            self.level_time = Duration::ZERO;
            self.fall_speed = self.timing.next_fall_speed(self.fall_speed);
        }

        if self.fall_time >= self.fall_speed {
            self.fall_time = Duration::ZERO;
            if !self.grid.move_down(&mut self.piece) && self.piece.y >= Piece::SPAWN_Y {
                self.phase = Phase::Landed;
            }
        }
    }

    fn process_input(&mut self, action: Action) {
        match action {
            Action::Left => self.grid.move_x(&mut self.piece, -1),
            Action::Right => self.grid.move_x(&mut self.piece, 1),
            Action::Rotate => self.grid.rotate(&mut self.piece),
            Action::SoftDrop => self.grid.move_down(&mut self.piece),
        };
    }

    fn lock(&mut self) {
        self.locked.lock(&self.piece);
        let next = Self::random_piece(&mut self.rng);
        let landed = std::mem::replace(&mut self.piece, std::mem::replace(&mut self.next, next));
        self.phase = Phase::Falling;

        // the grid still holds the landed piece, which may complete rows
        let rows = self.locked.clear_rows(&self.grid);
        debug!("{:?} locked at ({}, {})", landed.kind, landed.x, landed.y);
        if rows > 0 {
            info!("Cleared {rows} rows");
            self.score += u32::from(rows) * ROW_SCORE;
            self.rows_cleared += u32::from(rows);
        }
        self.events.push(Event::Completion(rows));
        self.refresh_grid();
    }

    fn refresh_grid(&mut self) {
        self.grid = Grid::from_locked(&self.locked);
        self.grid.paint(&self.piece);
    }

    fn random_piece(rng: &mut SmallRng) -> Piece {
        Piece::spawn(Kind::ALL[rng.random_range(0..Kind::ALL.len())])
    }

    fn gameover(&mut self) {
        info!("Game over with score {}", self.score);
        self.done = true;
        self.events.push(Event::Gameover);
    }
}
