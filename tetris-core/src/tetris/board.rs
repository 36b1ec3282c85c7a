use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{Kind, PATTERN_SIZE, Rgb};

pub const BOARD_WIDTH: usize = 10;
pub const BOARD_HEIGHT: usize = 20;

/// Column and row correction applied to decoded pattern cells
const CENTER_X: i32 = 2;
const CENTER_Y: i32 = 4;

/// A board coordinate. Rows grow downwards, negative rows are above the visible playfield.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub col: i32,
    pub row: i32,
}

impl Cell {
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    const fn index(self) -> Option<(usize, usize)> {
        if self.col < 0 || self.row < 0 {
            return None;
        }
        let (col, row) = (self.col as usize, self.row as usize);
        if col >= BOARD_WIDTH || row >= BOARD_HEIGHT {
            return None;
        }
        Some((row, col))
    }
}

/// The falling tetromino
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    pub kind: Kind,
    pub x: i32,
    pub y: i32,
    pub rotation: usize,
}

impl Piece {
    pub const SPAWN_X: i32 = 5;
    pub const SPAWN_Y: i32 = 0;

    pub const fn new(kind: Kind, x: i32, y: i32) -> Self {
        Self {
            kind,
            x,
            y,
            rotation: 0,
        }
    }

    pub const fn spawn(kind: Kind) -> Self {
        Self::new(kind, Self::SPAWN_X, Self::SPAWN_Y)
    }

    pub const fn color(&self) -> Rgb {
        self.kind.color()
    }

    /// Absolute cells covered by the current rotation, in row-major pattern order.
    pub fn cells(&self) -> Vec<Cell> {
        let mut cells = Vec::with_capacity(4);
        for (dy, line) in self.kind.pattern(self.rotation).iter().enumerate() {
            for (dx, marker) in line.bytes().take(PATTERN_SIZE).enumerate() {
                if marker == b'0' {
                    cells.push(Cell::new(
                        self.x + dx as i32 - CENTER_X,
                        self.y + dy as i32 - CENTER_Y,
                    ));
                }
            }
        }
        cells
    }

    const fn rotate_cw(&mut self) {
        self.rotation = (self.rotation + 1) % self.kind.rotations().len();
    }
}

/// Colors of every visible cell. Black means empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grid {
    pub buffer: [[Rgb; BOARD_WIDTH]; BOARD_HEIGHT],
}

impl Default for Grid {
    fn default() -> Self {
        Self {
            buffer: [[Rgb::BLACK; BOARD_WIDTH]; BOARD_HEIGHT],
        }
    }
}

impl Grid {
    /// Projects the locked cells that fall inside the playfield
    pub fn from_locked(locked: &LockedPositions) -> Self {
        let mut grid = Self::default();
        for (cell, color) in locked.iter() {
            if let Some((row, col)) = cell.index() {
                grid.buffer[row][col] = color;
            }
        }
        grid
    }

    pub fn get(&self, cell: Cell) -> Option<Rgb> {
        cell.index().map(|(row, col)| self.buffer[row][col])
    }

    pub fn is_empty_at(&self, cell: Cell) -> bool {
        self.get(cell) == Some(Rgb::BLACK)
    }

    /// Overlays the visible part of a piece
    pub fn paint(&mut self, piece: &Piece) {
        let color = piece.color();
        for cell in piece.cells() {
            if let Some((row, col)) = cell.index() {
                self.buffer[row][col] = color;
            }
        }
    }

    /// Cells above the playfield are always accepted, whatever their column.
    /// Everything else has to land on an empty cell inside the board.
    pub fn can_place(&self, piece: &Piece) -> bool {
        piece
            .cells()
            .into_iter()
            .all(|cell| cell.row < 0 || self.is_empty_at(cell))
    }

    /// Move along the x-axis. Returns if movement was a success
    pub fn move_x(&self, piece: &mut Piece, offset: i32) -> bool {
        piece.x += offset;
        if self.can_place(piece) {
            return true;
        }
        piece.x -= offset;
        false
    }

    /// Move along the y-axis. Returns if movement was a success
    pub fn move_down(&self, piece: &mut Piece) -> bool {
        piece.y += 1;
        if self.can_place(piece) {
            return true;
        }
        piece.y -= 1;
        false
    }

    /// Rotates clockwise without kicks. Returns if the rotation was successful.
    pub fn rotate(&self, piece: &mut Piece) -> bool {
        let before = piece.rotation;
        piece.rotate_cw();
        if self.can_place(piece) {
            return true;
        }
        piece.rotation = before;
        false
    }

    pub fn is_row_full(&self, row: usize) -> bool {
        self.buffer[row].iter().all(|color| *color != Rgb::BLACK)
    }

    /// Row-major RGB bytes, three per cell
    pub fn to_bytes(&self) -> Vec<u8> {
        self.buffer
            .iter()
            .flatten()
            .flat_map(|Rgb(r, g, b)| [*r, *g, *b])
            .collect()
    }
}

/// Cells of every piece that has landed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockedPositions {
    cells: HashMap<Cell, Rgb>,
}

impl LockedPositions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, cell: Cell) -> Option<Rgb> {
        self.cells.get(&cell).copied()
    }

    pub fn insert(&mut self, cell: Cell, color: Rgb) -> Option<Rgb> {
        self.cells.insert(cell, color)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Cell, Rgb)> + '_ {
        self.cells.iter().map(|(cell, color)| (*cell, *color))
    }

    /// Locks every cell of the piece, including those above the playfield
    pub fn lock(&mut self, piece: &Piece) {
        let color = piece.color();
        for cell in piece.cells() {
            self.cells.insert(cell, color);
        }
    }

    /// Removes every full row of `grid` and drops the cells above into the gaps.
    /// Returns the number of cleared rows.
    pub fn clear_rows(&mut self, grid: &Grid) -> u8 {
        let cleared: Vec<i32> = (0..BOARD_HEIGHT)
            .rev()
            .filter(|row| grid.is_row_full(*row))
            .map(|row| row as i32)
            .collect();
        let Some(&lowest) = cleared.first() else {
            return 0;
        };

        for &row in &cleared {
            for col in 0..BOARD_WIDTH as i32 {
                self.cells.remove(&Cell::new(col, row));
            }
        }

        // bottom-most first, so a cell never lands on one that has yet to move
        let mut above: Vec<Cell> = self
            .cells
            .keys()
            .filter(|cell| cell.row < lowest)
            .copied()
            .collect();
        above.sort_unstable_by(|a, b| b.row.cmp(&a.row));
        for cell in above {
            let shift = cleared.iter().filter(|row| **row > cell.row).count() as i32;
            if let Some(color) = self.cells.remove(&cell) {
                self.cells.insert(Cell::new(cell.col, cell.row + shift), color);
            }
        }

        cleared.len() as u8
    }

    /// True once the stack reaches the top row
    pub fn is_lost(&self) -> bool {
        self.cells.keys().any(|cell| cell.row < 1)
    }
}

#[cfg(test)]
mod test {
    use super::{BOARD_HEIGHT, BOARD_WIDTH, Cell, Grid, LockedPositions, Piece};
    use crate::tetris::{Kind, Rgb};

    const GREY: Rgb = Rgb(100, 100, 100);

    fn fill_row(locked: &mut LockedPositions, row: i32, except: &[i32]) {
        for col in 0..BOARD_WIDTH as i32 {
            if !except.contains(&col) {
                locked.insert(Cell::new(col, row), GREY);
            }
        }
    }

    fn assert_compact(locked: &LockedPositions) {
        for col in 0..BOARD_WIDTH as i32 {
            let mut rows: Vec<i32> = locked
                .iter()
                .filter(|(cell, _)| cell.col == col)
                .map(|(cell, _)| cell.row)
                .collect();
            rows.sort_unstable();
            let bottom = BOARD_HEIGHT as i32 - 1;
            for (i, row) in rows.iter().rev().enumerate() {
                assert_eq!(*row, bottom - i as i32, "gap in column {col}");
            }
        }
    }

    #[test]
    fn decode_applies_center_offset() {
        let piece = Piece::new(Kind::O, 5, 0);
        assert_eq!(
            piece.cells(),
            vec![
                Cell::new(4, -2),
                Cell::new(5, -2),
                Cell::new(4, -1),
                Cell::new(5, -1),
            ]
        );

        let mut piece = Piece::new(Kind::I, 5, 10);
        piece.rotation = 1;
        assert_eq!(
            piece.cells(),
            vec![
                Cell::new(3, 7),
                Cell::new(4, 7),
                Cell::new(5, 7),
                Cell::new(6, 7),
            ]
        );
    }

    #[test]
    fn decode_is_deterministic() {
        for kind in Kind::ALL {
            for rotation in 0..8 {
                let mut piece = Piece::new(kind, 3, 7);
                piece.rotation = rotation;
                let first = piece.cells();
                assert_eq!(first, piece.clone().cells());
                assert_eq!(first.len(), 4);
            }
        }
    }

    #[test]
    fn negative_rows_are_always_valid() {
        let grid = Grid::default();
        let mut piece = Piece::new(Kind::I, -20, 0);
        piece.rotation = 1;
        assert!(piece.cells().iter().all(|cell| cell.row < 0));
        assert!(grid.can_place(&piece));
    }

    #[test]
    fn rejects_walls_floor_and_blocks() {
        let mut locked = LockedPositions::new();
        locked.insert(Cell::new(5, 19), GREY);
        let grid = Grid::from_locked(&locked);

        // O at x=1 covers columns 0 and 1
        assert!(grid.can_place(&Piece::new(Kind::O, 1, 10)));
        assert!(!grid.can_place(&Piece::new(Kind::O, 0, 10)));
        assert!(!grid.can_place(&Piece::new(Kind::O, 10, 10)));
        // O at y=21 covers rows 19 and 20
        assert!(!grid.can_place(&Piece::new(Kind::O, 2, 21)));
        assert!(grid.can_place(&Piece::new(Kind::O, 2, 20)));
        // collides with the locked cell
        assert!(!grid.can_place(&Piece::new(Kind::O, 6, 20)));
    }

    #[test]
    fn failed_moves_leave_piece_untouched() {
        let grid = Grid::default();
        let mut piece = Piece::new(Kind::O, 1, 10);
        let before = piece.clone();
        assert!(!grid.move_x(&mut piece, -1));
        assert_eq!(piece, before);

        let mut piece = Piece::new(Kind::O, 5, 20);
        let before = piece.clone();
        assert!(!grid.move_down(&mut piece));
        assert_eq!(piece, before);
        assert!(grid.move_x(&mut piece, 1));
        assert_eq!(piece.x, 6);
    }

    #[test]
    fn rotation_reverts_on_collision() {
        // vertical I would occupy column 5, rows 7..=10
        let mut locked = LockedPositions::new();
        locked.insert(Cell::new(5, 10), GREY);
        let grid = Grid::from_locked(&locked);

        let mut piece = Piece::new(Kind::I, 5, 10);
        piece.rotation = 1;
        assert!(grid.can_place(&piece));
        assert!(!grid.rotate(&mut piece));
        assert_eq!(piece.rotation, 1);
        assert_eq!((piece.x, piece.y), (5, 10));

        let mut free = Piece::new(Kind::I, 2, 10);
        free.rotation = 1;
        assert!(grid.rotate(&mut free));
        assert_eq!(free.rotation, 0);
    }

    #[test]
    fn paint_skips_hidden_cells() {
        let mut grid = Grid::default();
        let piece = Piece::new(Kind::I, 5, 1);
        grid.paint(&piece);
        let painted = grid
            .buffer
            .iter()
            .flatten()
            .filter(|color| **color == Kind::I.color())
            .count();
        // vertical I spans rows -2..=1
        assert_eq!(painted, 2);
        assert_eq!(grid.get(Cell::new(5, 0)), Some(Kind::I.color()));
        assert_eq!(grid.get(Cell::new(5, 1)), Some(Kind::I.color()));
    }

    #[test]
    fn clears_single_row_and_shifts() {
        let mut locked = LockedPositions::new();
        fill_row(&mut locked, 19, &[9]);
        locked.insert(Cell::new(0, 18), Kind::T.color());
        locked.insert(Cell::new(3, 18), Kind::S.color());
        locked.insert(Cell::new(3, 17), Kind::Z.color());

        // a vertical I dropped into column 9 fills (9, 19)
        let piece = Piece::new(Kind::I, 9, 19);
        let mut grid = Grid::from_locked(&locked);
        assert!(grid.can_place(&piece));
        locked.lock(&piece);
        grid.paint(&piece);

        assert_eq!(locked.clear_rows(&grid), 1);
        assert_eq!(locked.get(Cell::new(0, 19)), Some(Kind::T.color()));
        assert_eq!(locked.get(Cell::new(3, 19)), Some(Kind::S.color()));
        assert_eq!(locked.get(Cell::new(3, 18)), Some(Kind::Z.color()));
        // the rest of the I moved down with everything else
        for row in 17..=19 {
            assert_eq!(locked.get(Cell::new(9, row)), Some(Kind::I.color()));
        }
        assert_eq!(locked.len(), 6);
        assert_compact(&locked);
    }

    #[test]
    fn clears_multiple_rows() {
        let mut locked = LockedPositions::new();
        fill_row(&mut locked, 19, &[]);
        fill_row(&mut locked, 18, &[]);
        locked.insert(Cell::new(4, 17), GREY);
        locked.insert(Cell::new(4, 16), Kind::L.color());
        let grid = Grid::from_locked(&locked);

        assert_eq!(locked.clear_rows(&grid), 2);
        assert_eq!(locked.len(), 2);
        assert_eq!(locked.get(Cell::new(4, 19)), Some(GREY));
        assert_eq!(locked.get(Cell::new(4, 18)), Some(Kind::L.color()));
        assert_compact(&locked);
    }

    #[test]
    fn clears_rows_split_by_a_gap() {
        let mut locked = LockedPositions::new();
        fill_row(&mut locked, 19, &[]);
        fill_row(&mut locked, 18, &[2]);
        fill_row(&mut locked, 17, &[]);
        locked.insert(Cell::new(2, 16), Kind::J.color());
        let grid = Grid::from_locked(&locked);

        assert_eq!(locked.clear_rows(&grid), 2);
        assert_eq!(locked.len(), 10);
        assert_eq!(locked.get(Cell::new(2, 19)), None);
        assert_eq!(locked.get(Cell::new(2, 18)), Some(Kind::J.color()));
        assert_eq!(locked.get(Cell::new(0, 19)), Some(GREY));
        assert!(locked.iter().all(|(cell, _)| cell.row >= 18));
    }

    #[test]
    fn no_full_rows_is_a_no_op() {
        let mut locked = LockedPositions::new();
        fill_row(&mut locked, 19, &[0]);
        let before = locked.clone();
        let grid = Grid::from_locked(&locked);
        assert_eq!(locked.clear_rows(&grid), 0);
        assert_eq!(locked, before);
    }

    #[test]
    fn loss_requires_row_below_one() {
        let mut locked = LockedPositions::new();
        assert!(!locked.is_lost());
        locked.insert(Cell::new(3, 1), GREY);
        assert!(!locked.is_lost());
        locked.insert(Cell::new(3, 0), GREY);
        assert!(locked.is_lost());

        let mut above = LockedPositions::new();
        above.insert(Cell::new(7, -2), GREY);
        assert!(above.is_lost());
    }

    #[test]
    fn grid_bytes_are_row_major() {
        let mut locked = LockedPositions::new();
        locked.insert(Cell::new(1, 0), Rgb(1, 2, 3));
        let bytes = Grid::from_locked(&locked).to_bytes();
        assert_eq!(bytes.len(), BOARD_WIDTH * BOARD_HEIGHT * 3);
        assert_eq!(&bytes[3..6], &[1, 2, 3]);
        assert!(bytes[..3].iter().all(|b| *b == 0));
    }
}
