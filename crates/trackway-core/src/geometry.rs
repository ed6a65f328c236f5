use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// A grid cell coordinate. The origin is the top-left of the board,
/// x grows rightward and y grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Cell) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        (dx * dx + dy * dy).sqrt()
    }
}

impl Add for Cell {
    type Output = Cell;

    fn add(self, rhs: Cell) -> Cell {
        Cell::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Cell {
    type Output = Cell;

    fn sub(self, rhs: Cell) -> Cell {
        Cell::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// A cardinal direction a pin can face. Codes: 0=Up, 1=Right, 2=Down, 3=Left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    pub fn code(self) -> u8 {
        match self {
            Direction::Up => 0,
            Direction::Right => 1,
            Direction::Down => 2,
            Direction::Left => 3,
        }
    }

    pub fn from_code(code: u8) -> Self {
        match code % 4 {
            0 => Direction::Up,
            1 => Direction::Right,
            2 => Direction::Down,
            _ => Direction::Left,
        }
    }

    /// The direction after applying a clockwise rotation.
    pub fn rotated(self, rotation: Rotation) -> Self {
        Self::from_code(self.code() + rotation.quarter_turns())
    }

    pub fn opposite(self) -> Self {
        self.rotated(Rotation::R180)
    }

    /// The unit cell step a pin takes to reach the cell it points into.
    pub fn step(self) -> Cell {
        match self {
            Direction::Up => Cell::new(0, -1),
            Direction::Right => Cell::new(1, 0),
            Direction::Down => Cell::new(0, 1),
            Direction::Left => Cell::new(-1, 0),
        }
    }
}

/// A clockwise placement rotation, restricted to quarter turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    R0,
    R90,
    R180,
    R270,
}

impl Rotation {
    pub fn quarter_turns(self) -> u8 {
        match self {
            Rotation::R0 => 0,
            Rotation::R90 => 1,
            Rotation::R180 => 2,
            Rotation::R270 => 3,
        }
    }

    pub fn degrees(self) -> u16 {
        self.quarter_turns() as u16 * 90
    }

    pub fn from_degrees(degrees: u16) -> Option<Self> {
        match degrees {
            0 => Some(Rotation::R0),
            90 => Some(Rotation::R90),
            180 => Some(Rotation::R180),
            270 => Some(Rotation::R270),
            _ => None,
        }
    }

    /// Footprint dimensions after rotation: width and height swap for
    /// quarter turns.
    pub fn rotated_size(self, width: u32, height: u32) -> (u32, u32) {
        match self {
            Rotation::R0 | Rotation::R180 => (width, height),
            Rotation::R90 | Rotation::R270 => (height, width),
        }
    }
}

/// Rotate a local cell offset about the piece's top-left anchor.
///
/// The result stays anchor-relative and 0-indexed inside the rotated
/// bounding box, so a `width` x `height` piece rotated 90 degrees maps
/// into a `height` x `width` box.
pub fn rotate_offset(offset: Cell, rotation: Rotation, width: u32, height: u32) -> Cell {
    let w = width as i32;
    let h = height as i32;
    match rotation {
        Rotation::R0 => offset,
        Rotation::R90 => Cell::new(h - 1 - offset.y, offset.x),
        Rotation::R180 => Cell::new(w - 1 - offset.x, h - 1 - offset.y),
        Rotation::R270 => Cell::new(offset.y, w - 1 - offset.x),
    }
}
