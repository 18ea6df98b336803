//! # Game Module
//!
//! The world-simulation core: grid and tile model, entities and combat,
//! levels, visibility, pathfinding, and turn resolution.

pub mod entities;
pub mod grid;
pub mod level;
pub mod pathfinding;
pub mod turn;
pub mod visibility;
pub mod world;

pub use entities::*;
pub use grid::*;
pub use level::*;
pub use pathfinding::*;
pub use turn::*;
pub use world::*;

use serde::{Deserialize, Serialize};

/// A 2D coordinate in a level's grid.
///
/// Positions key the monster, item, and portal maps, so they are `Hash` and
/// `Eq`; arithmetic is plain component-wise.
///
/// # Examples
///
/// ```
/// use warren::Position;
///
/// let pos = Position::new(10, 5);
/// assert_eq!(pos.x, 10);
/// assert_eq!(pos.cardinal_neighbors().len(), 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    /// Creates a new position with the given coordinates.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to another position. Admissible as the A*
    /// heuristic for 4-directional movement.
    ///
    /// # Examples
    ///
    /// ```
    /// use warren::Position;
    ///
    /// assert_eq!(Position::new(0, 0).manhattan_distance(Position::new(3, 4)), 7);
    /// ```
    pub fn manhattan_distance(self, other: Position) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Euclidean distance to another position, used for the circular sight
    /// radius filter.
    pub fn euclidean_distance(self, other: Position) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        (dx * dx + dy * dy).sqrt()
    }

    /// The 4 cardinal neighbors, in N/W/E/S order. Movement and pathfinding
    /// are strictly 4-directional.
    pub fn cardinal_neighbors(self) -> [Position; 4] {
        [
            Position::new(self.x, self.y - 1),
            Position::new(self.x - 1, self.y),
            Position::new(self.x + 1, self.y),
            Position::new(self.x, self.y + 1),
        ]
    }

    /// Offsets this position one step in the given direction.
    pub fn step(self, direction: Direction) -> Position {
        self + direction.delta()
    }
}

impl std::ops::Add for Position {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl std::ops::Sub for Position {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

/// The four movement directions the simulation accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    /// Converts a direction to a position delta. North is negative y.
    pub fn delta(self) -> Position {
        match self {
            Direction::North => Position::new(0, -1),
            Direction::South => Position::new(0, 1),
            Direction::East => Position::new(1, 0),
            Direction::West => Position::new(-1, 0),
        }
    }
}
