//! # Loading Module
//!
//! Turns authored symbol grids and portal linkage rows into live levels and
//! a world. The interesting part is topology resolution: door, stair, spawn,
//! and coin symbols say nothing about the terrain underneath them, so each
//! such "pending" cell flood-fills outward until it finds an explicit floor
//! cell and adopts that terrain. Content errors here are fatal; a broken map
//! is a configuration problem, not something to limp past at runtime.

pub mod files;

pub use files::load_world_dir;

use crate::game::{Grid, Item, Level, Monster, Overlay, PortalTarget, Position, Terrain, Tile};
use crate::{WarrenError, WarrenResult, World};
use std::collections::{HashMap, HashSet, VecDeque};

/// One level's authored symbol grid. Rows may be jagged; shorter rows are
/// padded with blank void to the widest row.
#[derive(Debug, Clone)]
pub struct LevelSource {
    pub name: String,
    pub rows: Vec<String>,
}

impl LevelSource {
    pub fn new(name: impl Into<String>, rows: &[&str]) -> Self {
        Self {
            name: name.into(),
            rows: rows.iter().map(|row| row.to_string()).collect(),
        }
    }
}

/// One row of the world linkage table: a portal cell and where it leads.
#[derive(Debug, Clone)]
pub struct PortalLink {
    pub level: String,
    pub pos: Position,
    pub target_level: String,
    pub target_pos: Position,
}

/// Everything needed to assemble a world: level grids, portal links, and
/// the designated starting level.
#[derive(Debug, Clone)]
pub struct WorldSource {
    pub start_level: String,
    pub levels: Vec<LevelSource>,
    pub links: Vec<PortalLink>,
}

/// Terrain of a cell while the map is still being resolved. `None` marks a
/// pending cell whose symbol did not determine its floor-vs-wall terrain.
type RawTerrain = Option<Terrain>;

/// Builds one level from its symbol grid, resolving every pending cell.
pub fn build_level(source: &LevelSource) -> WarrenResult<Level> {
    let height = source.rows.len();
    let width = source
        .rows
        .iter()
        .map(|row| row.chars().count())
        .max()
        .unwrap_or(0);

    let mut terrain = vec![vec![Some(Terrain::Blank); width]; height];
    let mut overlays = vec![vec![Overlay::None; width]; height];
    let mut monsters = HashMap::new();
    let mut items: HashMap<Position, Vec<Item>> = HashMap::new();
    let mut player_start = None;

    for (y, row) in source.rows.iter().enumerate() {
        for (x, symbol) in row.chars().enumerate() {
            let pos = Position::new(x as i32, y as i32);
            let cell = match symbol {
                ' ' | '\t' | '\r' => Some(Terrain::Blank),
                '#' => Some(Terrain::StoneWall),
                '.' => Some(Terrain::DirtFloor),
                '|' => {
                    overlays[y][x] = Overlay::ClosedDoor;
                    None
                }
                '/' => {
                    overlays[y][x] = Overlay::OpenDoor;
                    None
                }
                'U' => {
                    overlays[y][x] = Overlay::StairsUp;
                    None
                }
                'D' => {
                    overlays[y][x] = Overlay::StairsDown;
                    None
                }
                '$' => {
                    overlays[y][x] = Overlay::Coin;
                    None
                }
                '@' => {
                    player_start = Some(pos);
                    None
                }
                'R' => {
                    monsters.insert(pos, Monster::rat(pos));
                    None
                }
                'S' => {
                    monsters.insert(pos, Monster::spider(pos));
                    None
                }
                's' => {
                    items.entry(pos).or_default().push(Item::sword(pos));
                    None
                }
                'h' => {
                    items.entry(pos).or_default().push(Item::helmet(pos));
                    None
                }
                'a' => {
                    items.entry(pos).or_default().push(Item::armor(pos));
                    None
                }
                'p' => {
                    items.entry(pos).or_default().push(Item::potion(pos));
                    None
                }
                other => {
                    return Err(WarrenError::Map(format!(
                        "unknown map symbol '{other}' at ({x}, {y}) in level '{}'",
                        source.name
                    )))
                }
            };
            terrain[y][x] = cell;
        }
    }

    resolve_pending(&mut terrain, &source.name)?;

    let tiles = terrain
        .into_iter()
        .zip(overlays)
        .map(|(trow, orow)| {
            trow.into_iter()
                .zip(orow)
                .map(|(t, overlay)| {
                    let mut tile = Tile::new(t.unwrap_or(Terrain::Blank));
                    tile.overlay = overlay;
                    tile
                })
                .collect()
        })
        .collect();

    let mut level = Level::new(source.name.clone(), Grid::from_rows(tiles));
    level.monsters = monsters;
    level.items = items;
    level.player_start = player_start;
    log::debug!(
        "built level '{}' ({}x{}, {} monster(s))",
        level.name,
        level.grid.width(),
        level.grid.height(),
        level.monsters.len()
    );
    Ok(level)
}

/// Resolves every pending cell to the terrain of the nearest explicit floor.
///
/// BFS over 4-way neighbors; during this phase any cell whose terrain is not
/// yet wall or blank counts as traversable, so chains of pending cells (a
/// door opening onto a stairwell) resolve through each other. A pending cell
/// that reaches no floor at all means the author stranded it: fatal.
fn resolve_pending(terrain: &mut [Vec<RawTerrain>], level_name: &str) -> WarrenResult<()> {
    let height = terrain.len() as i32;
    let width = terrain.first().map_or(0, |row| row.len() as i32);
    let traversable = |terrain: &[Vec<RawTerrain>], pos: Position| {
        pos.x >= 0
            && pos.y >= 0
            && pos.x < width
            && pos.y < height
            && !matches!(
                terrain[pos.y as usize][pos.x as usize],
                Some(Terrain::StoneWall) | Some(Terrain::Blank)
            )
    };

    let pending: Vec<Position> = (0..height)
        .flat_map(|y| (0..width).map(move |x| Position::new(x, y)))
        .filter(|pos| terrain[pos.y as usize][pos.x as usize].is_none())
        .collect();

    for start in pending {
        let mut queue = VecDeque::new();
        let mut visited = HashSet::new();
        queue.push_back(start);
        visited.insert(start);
        let mut resolved = None;

        while let Some(current) = queue.pop_front() {
            if terrain[current.y as usize][current.x as usize] == Some(Terrain::DirtFloor) {
                resolved = Some(Terrain::DirtFloor);
                break;
            }
            for next in current.cardinal_neighbors() {
                if traversable(terrain, next) && visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        match resolved {
            Some(t) => terrain[start.y as usize][start.x as usize] = Some(t),
            None => {
                return Err(WarrenError::Map(format!(
                    "pending cell at {start:?} in level '{level_name}' reaches no floor"
                )))
            }
        }
    }
    Ok(())
}

/// Builds every level, wires the portal links, and assembles the world.
pub fn load_world(source: WorldSource) -> WarrenResult<World> {
    let mut levels = HashMap::new();
    for level_source in &source.levels {
        let level = build_level(level_source)?;
        levels.insert(level.name.clone(), level);
    }

    for link in &source.links {
        let level = levels.get_mut(&link.level).ok_or_else(|| {
            WarrenError::Map(format!(
                "portal row names unknown level '{}'",
                link.level
            ))
        })?;
        level.portals.insert(
            link.pos,
            PortalTarget {
                level: link.target_level.clone(),
                pos: link.target_pos,
            },
        );
    }

    World::new(levels, source.start_level)
}
