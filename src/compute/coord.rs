//! Grid coordinates and compass directions.
//!
//! The Y axis points north: `Direction::North` has offset `(0, 1)`.

use std::ops::{Add, Neg, Sub};

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Integer cell coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Coord {
    pub x: i16,
    pub y: i16,
}

impl Coord {
    pub const fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }

    /// Euclidean length of this coordinate treated as a vector.
    #[inline]
    pub fn length(self) -> f32 {
        let x = self.x as f32;
        let y = self.y as f32;
        (x * x + y * y).sqrt()
    }

    /// Direction of this offset, quantized by the sign of each axis.
    pub fn as_direction(self) -> Direction {
        Direction::from_signs(self.x.signum(), self.y.signum())
    }
}

impl Add for Coord {
    type Output = Coord;

    fn add(self, rhs: Coord) -> Coord {
        Coord::new(self.x.wrapping_add(rhs.x), self.y.wrapping_add(rhs.y))
    }
}

impl Sub for Coord {
    type Output = Coord;

    fn sub(self, rhs: Coord) -> Coord {
        Coord::new(self.x.wrapping_sub(rhs.x), self.y.wrapping_sub(rhs.y))
    }
}

impl Add<Direction> for Coord {
    type Output = Coord;

    fn add(self, rhs: Direction) -> Coord {
        self + rhs.offset()
    }
}

impl Sub<Direction> for Coord {
    type Output = Coord;

    fn sub(self, rhs: Direction) -> Coord {
        self - rhs.offset()
    }
}

/// One of the eight compass directions, or no direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
    Center,
}

/// The eight real directions in clockwise order starting at north.
const CLOCKWISE: [Direction; 8] = [
    Direction::North,
    Direction::NorthEast,
    Direction::East,
    Direction::SouthEast,
    Direction::South,
    Direction::SouthWest,
    Direction::West,
    Direction::NorthWest,
];

impl Direction {
    /// All directions except `Center`.
    pub const ALL: [Direction; 8] = CLOCKWISE;

    /// Unit grid offset (diagonals are `(±1, ±1)`).
    pub fn offset(self) -> Coord {
        match self {
            Direction::North => Coord::new(0, 1),
            Direction::NorthEast => Coord::new(1, 1),
            Direction::East => Coord::new(1, 0),
            Direction::SouthEast => Coord::new(1, -1),
            Direction::South => Coord::new(0, -1),
            Direction::SouthWest => Coord::new(-1, -1),
            Direction::West => Coord::new(-1, 0),
            Direction::NorthWest => Coord::new(-1, 1),
            Direction::Center => Coord::new(0, 0),
        }
    }

    fn from_signs(x: i16, y: i16) -> Direction {
        match (x, y) {
            (0, 1) => Direction::North,
            (1, 1) => Direction::NorthEast,
            (1, 0) => Direction::East,
            (1, -1) => Direction::SouthEast,
            (0, -1) => Direction::South,
            (-1, -1) => Direction::SouthWest,
            (-1, 0) => Direction::West,
            (-1, 1) => Direction::NorthWest,
            _ => Direction::Center,
        }
    }

    fn rotate(self, eighths: usize) -> Direction {
        match CLOCKWISE.iter().position(|&d| d == self) {
            Some(i) => CLOCKWISE[(i + eighths) % 8],
            None => Direction::Center,
        }
    }

    /// Rotate a quarter turn clockwise (north becomes east).
    pub fn rotate_cw(self) -> Direction {
        self.rotate(2)
    }

    /// Rotate a quarter turn counter-clockwise (north becomes west).
    pub fn rotate_ccw(self) -> Direction {
        self.rotate(6)
    }

    /// Pick one of the eight real directions uniformly.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Direction {
        CLOCKWISE[rng.gen_range(0..CLOCKWISE.len())]
    }
}

impl Neg for Direction {
    type Output = Direction;

    fn neg(self) -> Direction {
        self.rotate(4)
    }
}
