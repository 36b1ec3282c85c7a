use serde::{Deserialize, Serialize};

/// One rotation state of a shape. `'0'` marks an occupied cell, anything else is padding.
pub type Pattern = [&'static str; 5];

/// Edge length of every [`Pattern`].
pub const PATTERN_SIZE: usize = 5;

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Self = Self(0, 0, 0);
}

#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    S,
    Z,
    I,
    O,
    J,
    L,
    T,
}

impl Kind {
    pub const ALL: [Self; 7] = [
        Self::S,
        Self::Z,
        Self::I,
        Self::O,
        Self::J,
        Self::L,
        Self::T,
    ];

    pub const fn color(self) -> Rgb {
        match self {
            Self::S => Rgb(0, 255, 0),
            Self::Z => Rgb(255, 0, 0),
            Self::I => Rgb(0, 255, 255),
            Self::O => Rgb(255, 255, 0),
            Self::J => Rgb(255, 165, 0),
            Self::L => Rgb(0, 0, 255),
            Self::T => Rgb(128, 0, 128),
        }
    }

    pub const fn rotations(self) -> &'static [Pattern] {
        match self {
            Self::S => S,
            Self::Z => Z,
            Self::I => I,
            Self::O => O,
            Self::J => J,
            Self::L => L,
            Self::T => T,
        }
    }

    /// Pattern for a rotation index, taken modulo the number of states.
    pub const fn pattern(self, rotation: usize) -> &'static Pattern {
        let rotations = self.rotations();
        &rotations[rotation % rotations.len()]
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::S => "S",
            Self::Z => "Z",
            Self::I => "I",
            Self::O => "O",
            Self::J => "J",
            Self::L => "L",
            Self::T => "T",
        }
    }
}

const S: &[Pattern] = &[
    [".....", ".....", "..00.", ".00..", "....."],
    [".....", "..0..", "..00.", "...0.", "....."],
];

const Z: &[Pattern] = &[
    [".....", ".....", ".00..", "..00.", "....."],
    [".....", "..0..", ".00..", ".0...", "....."],
];

const I: &[Pattern] = &[
    [".....", "..0..", "..0..", "..0..", "..0.."],
    [".....", "0000.", ".....", ".....", "....."],
];

const O: &[Pattern] = &[[".....", ".....", ".00..", ".00..", "....."]];

const J: &[Pattern] = &[
    [".....", ".0...", ".000.", ".....", "....."],
    [".....", "..00.", "..0..", "..0..", "....."],
    [".....", ".....", ".000.", "...0.", "....."],
    [".....", "..0..", "..0..", ".00..", "....."],
];

const L: &[Pattern] = &[
    [".....", "...0.", ".000.", ".....", "....."],
    [".....", "..0..", "..0..", "..00.", "....."],
    [".....", ".....", ".000.", ".0...", "....."],
    [".....", ".00..", "..0..", "..0..", "....."],
];

const T: &[Pattern] = &[
    [".....", "..0..", ".000.", ".....", "....."],
    [".....", "..0..", "..00.", "..0..", "....."],
    [".....", ".....", ".000.", "..0..", "....."],
    [".....", "..0..", ".00..", "..0..", "....."],
];
