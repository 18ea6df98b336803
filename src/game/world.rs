//! # World Module
//!
//! The full reachability graph of portal-linked levels, plus the single
//! player record shared by all of them.

use crate::game::{Level, Player, Position};
use crate::{WarrenError, WarrenResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// All loaded levels plus the one player.
///
/// The player is owned here, not by any level, so traversing a portal is
/// just retargeting `current`; the same record follows along. Levels are
/// created once at load time and live for the process lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    pub(crate) levels: HashMap<String, Level>,
    pub(crate) current: String,
    pub player: Player,
}

impl World {
    /// Assembles a world from fully-built levels and validates its linkage:
    /// the start level must exist and carry a player start, and every portal
    /// must target an existing level at an in-bounds landing cell. Any
    /// violation is a fatal load-time configuration error.
    ///
    /// The player spawns at the start level's authored `@` cell with an
    /// initial field of vision already computed.
    pub fn new(levels: HashMap<String, Level>, start: impl Into<String>) -> WarrenResult<Self> {
        let current = start.into();

        for level in levels.values() {
            for (pos, target) in &level.portals {
                let destination = levels.get(&target.level).ok_or_else(|| {
                    WarrenError::Map(format!(
                        "portal at {:?} in level '{}' targets unknown level '{}'",
                        pos, level.name, target.level
                    ))
                })?;
                if !destination.grid.in_bounds(target.pos) {
                    return Err(WarrenError::Map(format!(
                        "portal at {:?} in level '{}' lands out of bounds at {:?} in '{}'",
                        pos, level.name, target.pos, target.level
                    )));
                }
            }
        }

        let start_level = levels
            .get(&current)
            .ok_or_else(|| WarrenError::Map(format!("unknown starting level '{current}'")))?;
        let spawn = start_level.player_start.ok_or_else(|| {
            WarrenError::Map(format!("starting level '{current}' has no player start"))
        })?;

        let player = Player::new(spawn);
        let mut world = Self {
            levels,
            current,
            player,
        };

        let origin = world.player.pos();
        let radius = world.player.character.sight_range;
        world.current_level_mut().refresh_visibility(origin, radius);
        log::info!(
            "world assembled: {} level(s), starting on '{}' at {:?}",
            world.levels.len(),
            world.current,
            origin
        );
        Ok(world)
    }

    /// Name of the level the player currently occupies.
    pub fn current_level_name(&self) -> &str {
        &self.current
    }

    pub fn current_level(&self) -> &Level {
        &self.levels[&self.current]
    }

    pub fn current_level_mut(&mut self) -> &mut Level {
        self.levels
            .get_mut(&self.current)
            .expect("current always names a loaded level")
    }

    pub fn level(&self, name: &str) -> Option<&Level> {
        self.levels.get(name)
    }

    /// Moves the player to `pos` on the named level and recomputes its field
    /// of vision there. The target level must exist; [`World::new`] has
    /// already validated every portal endpoint.
    pub(crate) fn teleport_player(&mut self, level: &str, pos: Position) -> WarrenResult<()> {
        if !self.levels.contains_key(level) {
            return Err(WarrenError::Map(format!("teleport to unknown level '{level}'")));
        }
        self.current = level.to_string();
        self.player.character.entity.pos = pos;
        let radius = self.player.character.sight_range;
        self.current_level_mut().refresh_visibility(pos, radius);
        Ok(())
    }
}
