//! # Grid Module
//!
//! The authoritative per-cell state for one level: terrain, overlay, and the
//! two visibility flags.

use crate::Position;
use serde::{Deserialize, Serialize};

/// Primary terrain of a cell. Walls and blank void block both movement and
/// sight no matter what overlay sits on top of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Terrain {
    StoneWall,
    DirtFloor,
    /// Outside the authored footprint of the level (jagged-row padding)
    Blank,
}

impl Terrain {
    /// Whether this terrain can ever be occupied or seen through.
    pub fn is_passable(self) -> bool {
        matches!(self, Terrain::DirtFloor)
    }
}

/// Overlay sitting on top of a cell's terrain: doors, stairs, loose coins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Overlay {
    #[default]
    None,
    ClosedDoor,
    OpenDoor,
    StairsUp,
    StairsDown,
    Coin,
}

/// One cell of a level's grid.
///
/// `visible` is recomputed every time the observer moves or opens a door;
/// `seen` accumulates monotonically and drives the front-end's dimmed
/// "remembered" rendering. It is never cleared.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub terrain: Terrain,
    pub overlay: Overlay,
    pub visible: bool,
    pub seen: bool,
}

impl Tile {
    /// Creates a tile with the given terrain, no overlay, and both
    /// visibility flags cleared.
    pub fn new(terrain: Terrain) -> Self {
        Self {
            terrain,
            overlay: Overlay::None,
            visible: false,
            seen: false,
        }
    }

    /// A dirt floor tile.
    pub fn floor() -> Self {
        Self::new(Terrain::DirtFloor)
    }

    /// A stone wall tile.
    pub fn wall() -> Self {
        Self::new(Terrain::StoneWall)
    }

    /// A blank void tile.
    pub fn blank() -> Self {
        Self::new(Terrain::Blank)
    }

    /// Whether light passes through this cell. Closed doors occlude; open
    /// doors, stairs, and coins do not.
    pub fn is_transparent(&self) -> bool {
        self.terrain.is_passable() && self.overlay != Overlay::ClosedDoor
    }
}

/// A rectangular grid of tiles, `height` rows by `width` columns, fixed in
/// size after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
}

impl Grid {
    /// Creates a grid filled with the given tile.
    pub fn filled(width: u32, height: u32, tile: Tile) -> Self {
        Self {
            width,
            height,
            tiles: vec![tile; (width * height) as usize],
        }
    }

    /// Builds a grid from row-major tiles. Every row must be `width` long.
    pub fn from_rows(rows: Vec<Vec<Tile>>) -> Self {
        let height = rows.len() as u32;
        let width = rows.first().map_or(0, |r| r.len() as u32);
        debug_assert!(rows.iter().all(|r| r.len() as u32 == width));
        Self {
            width,
            height,
            tiles: rows.into_iter().flatten().collect(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether the position lies inside the grid rectangle.
    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    fn index(&self, pos: Position) -> usize {
        pos.y as usize * self.width as usize + pos.x as usize
    }

    /// The tile at `pos`, or `None` outside the grid.
    pub fn get(&self, pos: Position) -> Option<&Tile> {
        if self.in_bounds(pos) {
            Some(&self.tiles[self.index(pos)])
        } else {
            None
        }
    }

    /// Mutable access to the tile at `pos`, or `None` outside the grid.
    pub fn get_mut(&mut self, pos: Position) -> Option<&mut Tile> {
        if self.in_bounds(pos) {
            let idx = self.index(pos);
            Some(&mut self.tiles[idx])
        } else {
            None
        }
    }

    /// Clears the `visible` flag on every tile. `seen` flags are retained.
    pub fn clear_visible(&mut self) {
        for tile in &mut self.tiles {
            tile.visible = false;
        }
    }

    /// Iterates all positions in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        let width = self.width as i32;
        let height = self.height as i32;
        (0..height).flat_map(move |y| (0..width).map(move |x| Position::new(x, y)))
    }
}
