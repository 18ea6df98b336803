//! # Level Module
//!
//! One authored dungeon level: its grid, the monsters and items living on
//! it, its portals out, and the rolling log of what happened there.

use crate::game::{Grid, Item, Monster, Overlay, Position};
use crate::config;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::collections::VecDeque;

/// The category of the most recent turn outcome on a level, published with
/// every snapshot so front-ends can pick sounds and animations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnEvent {
    Move,
    OpenDoor,
    Portal,
    FailedPortal,
    Attack,
    MonsterDeath,
    PickUp,
    Drop,
    Equip,
}

/// Where a portal cell leads: a level by name plus a landing position.
///
/// Levels reference each other by name rather than by pointer so the world
/// table stays a plain map without interior shared ownership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalTarget {
    pub level: String,
    pub pos: Position,
}

/// Fixed-capacity FIFO of recent event lines. Oldest entry is evicted once
/// the capacity is reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
    entries: VecDeque<String>,
    capacity: usize,
}

impl EventLog {
    pub fn new() -> Self {
        Self::with_capacity(config::EVENT_LOG_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a line, evicting the oldest if the log is full.
    pub fn push(&mut self, line: String) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(line);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates lines oldest-first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

/// One level of the world: grid, inhabitants, loot, portals, and event log.
///
/// The player is deliberately absent: the [`World`](crate::World) owns the
/// single player record and attaches it to whichever level is current.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub name: String,
    pub grid: Grid,
    pub monsters: HashMap<Position, Monster>,
    pub items: HashMap<Position, Vec<Item>>,
    pub portals: HashMap<Position, PortalTarget>,
    pub events: EventLog,
    pub last_event: Option<TurnEvent>,
    /// Coins collected on this level, gating its portals
    pub coins: u32,
    /// Cells highlighted for search-frontier debugging, rendered by dev
    /// front-ends only
    pub debug_cells: HashSet<Position>,
    /// Where `@` was authored, if this level has a player start
    pub player_start: Option<Position>,
}

impl Level {
    pub fn new(name: impl Into<String>, grid: Grid) -> Self {
        Self {
            name: name.into(),
            grid,
            monsters: HashMap::new(),
            items: HashMap::new(),
            portals: HashMap::new(),
            events: EventLog::new(),
            last_event: None,
            coins: 0,
            debug_cells: HashSet::new(),
            player_start: None,
        }
    }

    /// Whether a character may stand on `pos`: inside the grid, on passable
    /// terrain, not behind a closed door, and not already holding a monster.
    pub fn can_walk(&self, pos: Position) -> bool {
        let Some(tile) = self.grid.get(pos) else {
            return false;
        };
        tile.terrain.is_passable()
            && tile.overlay != Overlay::ClosedDoor
            && !self.monsters.contains_key(&pos)
    }

    /// Whether `pos` holds a closed door.
    pub fn is_closed_door(&self, pos: Position) -> bool {
        self.grid
            .get(pos)
            .is_some_and(|tile| tile.overlay == Overlay::ClosedDoor)
    }

    /// Appends one ground item at `pos`. Multiple items may share a cell.
    pub fn drop_item_at(&mut self, pos: Position, mut item: Item) {
        item.entity.pos = pos;
        self.items.entry(pos).or_default().push(item);
    }

    /// Total number of ground items at `pos`.
    pub fn ground_item_count(&self, pos: Position) -> usize {
        self.items.get(&pos).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Grid, Tile};

    fn floor_level(width: u32, height: u32) -> Level {
        Level::new("test", Grid::filled(width, height, Tile::floor()))
    }

    #[test]
    fn test_event_log_evicts_oldest_fifo() {
        let mut log = EventLog::new();
        for i in 0..15 {
            log.push(format!("event {i}"));
        }
        assert_eq!(log.len(), config::EVENT_LOG_CAPACITY);
        let lines: Vec<&str> = log.iter().collect();
        assert_eq!(lines.first(), Some(&"event 3"));
        assert_eq!(lines.last(), Some(&"event 14"));
    }

    #[test]
    fn test_can_walk_rejects_walls_doors_monsters() {
        let mut level = floor_level(5, 5);
        assert!(level.can_walk(Position::new(2, 2)));
        assert!(!level.can_walk(Position::new(5, 2)));

        level.grid.get_mut(Position::new(1, 1)).unwrap().terrain =
            crate::game::Terrain::StoneWall;
        assert!(!level.can_walk(Position::new(1, 1)));

        level.grid.get_mut(Position::new(2, 1)).unwrap().overlay = Overlay::ClosedDoor;
        assert!(!level.can_walk(Position::new(2, 1)));

        level
            .monsters
            .insert(Position::new(3, 3), Monster::rat(Position::new(3, 3)));
        assert!(!level.can_walk(Position::new(3, 3)));
    }

    #[test]
    fn test_ground_items_stack() {
        let mut level = floor_level(3, 3);
        let pos = Position::new(1, 1);
        level.drop_item_at(pos, Item::sword(Position::new(0, 0)));
        level.drop_item_at(pos, Item::potion(Position::new(0, 0)));
        assert_eq!(level.ground_item_count(pos), 2);
        // dropped items are rehomed onto the drop cell
        assert!(level.items[&pos].iter().all(|item| item.entity.pos == pos));
    }
}
