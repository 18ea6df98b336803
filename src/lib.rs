//! # Warren
//!
//! A turn-based, tile-based dungeon crawl engine: a player and autonomous
//! monsters share a grid of authored levels linked by portals, see the world
//! through a computed field of vision, chase each other with A*, and trade
//! blows through an equipment-modified damage formula.
//!
//! ## Architecture Overview
//!
//! The crate is split along the simulation's natural seams:
//!
//! - **Game Model**: grids, tiles, entities, levels, and the world that owns
//!   the player and the level table
//! - **Visibility**: Bresenham ray casting with occlusion at walls and doors
//! - **Pathfinding**: A* over 4-way walkability, backed by a hand-rolled
//!   binary min-heap
//! - **Turn Resolution**: one intent in, one fully-resolved turn out,
//!   including every monster's AI step
//! - **Engine**: the async shell that owns the world, consumes intents from
//!   any number of front-ends, and fans out level snapshots after each turn
//!
//! Rendering, audio, and input devices are external collaborators: the engine
//! only ever hands out read-only [`Snapshot`]s and accepts [`Intent`]s back.

pub mod engine;
pub mod game;
pub mod loading;

pub use engine::{ClientId, Engine, Snapshot};
pub use game::{
    attack, find_path, Character, Direction, Entity, EventLog, Grid, Intent, Item, ItemId,
    ItemKind, Level, Monster, Overlay, Player, PortalTarget, Position, Terrain, Tile, TurnEvent,
    TurnOutcome, World,
};
pub use loading::{LevelSource, PortalLink, WorldSource};

/// Core error type for the warren engine.
#[derive(thiserror::Error, Debug)]
pub enum WarrenError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Map or world content is malformed (unknown symbol, dangling level
    /// name, unresolvable pending tile). Fatal at load time.
    #[error("Map error: {0}")]
    Map(String),

    /// An intent that can never be satisfied (e.g. equipping a potion)
    #[error("Invalid intent: {0}")]
    InvalidIntent(String),

    /// A caller handed the engine a stale reference (e.g. dropping an item
    /// the player does not hold). Indicates a front-end bug, fails loudly.
    #[error("Precondition violated: {0}")]
    PreconditionViolated(String),
}

/// Result type used throughout the warren codebase.
pub type WarrenResult<T> = Result<T, WarrenError>;

/// Version information for the engine.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine tuning constants.
pub mod config {
    /// Number of event lines a level remembers before evicting the oldest
    pub const EVENT_LOG_CAPACITY: usize = 12;

    /// Coins a level's purse must hold before its portals activate
    pub const PORTAL_COIN_COST: u32 = 5;

    /// Default player sight radius in tiles
    pub const DEFAULT_SIGHT_RANGE: i32 = 10;

    /// Default player starting hit points
    pub const DEFAULT_PLAYER_HP: i32 = 200;

    /// Default player strength
    pub const DEFAULT_PLAYER_STRENGTH: i32 = 5;
}
