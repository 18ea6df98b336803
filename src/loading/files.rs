//! Thin disk front for the loader: reads `<dir>/*.map` level grids and the
//! `<dir>/world.txt` linkage table. Deliberately minimal; everything
//! interesting happens in [`super::build_level`] and friends.

use super::{LevelSource, PortalLink, WorldSource};
use crate::game::Position;
use crate::{WarrenError, WarrenResult, World};
use std::fs;
use std::path::Path;

/// Loads a complete world from a directory of `.map` files plus a
/// `world.txt` whose first line names the starting level and whose
/// remaining lines are `level, x, y, targetLevel, targetX, targetY` rows.
pub fn load_world_dir(dir: impl AsRef<Path>) -> WarrenResult<World> {
    let dir = dir.as_ref();
    let mut levels = Vec::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("map") {
            continue;
        }
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| WarrenError::Map(format!("unreadable map file name: {path:?}")))?
            .to_string();
        let text = fs::read_to_string(&path)?;
        levels.push(LevelSource {
            name,
            rows: text.lines().map(str::to_string).collect(),
        });
    }
    if levels.is_empty() {
        return Err(WarrenError::Map(format!(
            "no .map files found in {dir:?}"
        )));
    }
    log::info!("read {} map file(s) from {dir:?}", levels.len());

    let world_text = fs::read_to_string(dir.join("world.txt"))?;
    let mut lines = world_text.lines().filter(|line| !line.trim().is_empty());
    let start_level = lines
        .next()
        .ok_or_else(|| WarrenError::Map("world.txt is empty".to_string()))?
        .trim()
        .to_string();

    let mut links = Vec::new();
    for line in lines {
        links.push(parse_link_row(line)?);
    }

    super::load_world(WorldSource {
        start_level,
        levels,
        links,
    })
}

fn parse_link_row(line: &str) -> WarrenResult<PortalLink> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != 6 {
        return Err(WarrenError::Map(format!(
            "portal row needs 6 fields, got {}: '{line}'",
            fields.len()
        )));
    }
    let coord = |field: &str| -> WarrenResult<i32> {
        field
            .parse()
            .map_err(|_| WarrenError::Map(format!("bad coordinate '{field}' in '{line}'")))
    };
    Ok(PortalLink {
        level: fields[0].to_string(),
        pos: Position::new(coord(fields[1])?, coord(fields[2])?),
        target_level: fields[3].to_string(),
        target_pos: Position::new(coord(fields[4])?, coord(fields[5])?),
    })
}
