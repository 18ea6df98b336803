//! # Turn Resolution Module
//!
//! The state machine driving one full turn: the player's intent is resolved
//! first (movement, combat, doors, portals, item handling), then every
//! monster on the current level takes its AI step. One intent in, one
//! consistent world state out.

use crate::game::{
    attack, find_path, Direction, ItemId, ItemKind, Overlay, Position, TurnEvent, World,
};
use crate::{config, WarrenError, WarrenResult};
use serde::{Deserialize, Serialize};

/// One player intent, delivered by a front-end. Exactly one intent is
/// consumed per resolver step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    /// Step (or attack, or open a door) one cell in a direction
    Move(Direction),
    /// Pick up every item on the player's cell
    TakeAll,
    /// Pick up one specific ground item
    Take(ItemId),
    /// Drop one inventory item onto the player's cell
    Drop(ItemId),
    /// Move an inventory item into its matching equipment slot
    Equip(ItemId),
    /// Detach the sending front-end from the engine's fan-out
    CloseWindow,
    /// Terminate the simulation immediately
    Quit,
}

/// Terminal-state signal threaded through every resolver step, so that
/// front-ends can render a death screen instead of the process dying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnOutcome {
    Ongoing,
    PlayerDied,
}

impl World {
    /// Resolves one full turn: the player's intent, then the monster phase.
    ///
    /// `CloseWindow` and `Quit` are engine-level intents and resolve to a
    /// no-op here. Precondition violations (stale item references from the
    /// front-end) abort the turn with an error before any monster acts.
    pub fn apply_intent(&mut self, intent: &Intent) -> WarrenResult<TurnOutcome> {
        let outcome = match intent {
            Intent::Move(direction) => {
                let dest = self.player.pos().step(*direction);
                self.resolve_move(dest)?
            }
            Intent::TakeAll => {
                self.take_all();
                TurnOutcome::Ongoing
            }
            Intent::Take(id) => {
                self.take_item(*id)?;
                TurnOutcome::Ongoing
            }
            Intent::Drop(id) => {
                self.drop_item(*id)?;
                TurnOutcome::Ongoing
            }
            Intent::Equip(id) => {
                self.equip_item(*id)?;
                TurnOutcome::Ongoing
            }
            Intent::CloseWindow | Intent::Quit => return Ok(TurnOutcome::Ongoing),
        };

        if outcome == TurnOutcome::PlayerDied {
            return Ok(TurnOutcome::PlayerDied);
        }
        self.run_monster_phase()
    }

    /// Resolves the player's intended destination cell: combat if a monster
    /// holds it, movement (possibly through a portal) if walkable, opening
    /// if it is a closed door, nothing on a plain wall bump.
    fn resolve_move(&mut self, dest: Position) -> WarrenResult<TurnOutcome> {
        if let Some(outcome) = self.fight_monster_at(dest) {
            return Ok(outcome);
        }
        if self.current_level().can_walk(dest) {
            self.move_player(dest)?;
            return Ok(TurnOutcome::Ongoing);
        }
        if self.current_level().is_closed_door(dest) {
            self.open_door(dest);
        }
        Ok(TurnOutcome::Ongoing)
    }

    /// Player attacks the monster at `dest`, if one is there; `None` means
    /// the cell is monster-free and the move resolves some other way. The
    /// `remove` doubles as the occupancy check, so there is no separate
    /// predicate to fall out of sync with. A killed monster is removed from
    /// the level and its full inventory lands on its death cell.
    fn fight_monster_at(&mut self, dest: Position) -> Option<TurnOutcome> {
        let level = self
            .levels
            .get_mut(&self.current)
            .expect("current always names a loaded level");
        let mut monster = level.monsters.remove(&dest)?;

        attack(
            &mut self.player.character,
            &mut monster.character,
            &mut level.events,
        );
        level.last_event = Some(TurnEvent::Attack);

        if monster.character.hp <= 0 {
            let loot: Vec<_> = monster.character.inventory.drain(..).collect();
            for item in loot {
                level.drop_item_at(dest, item);
            }
            level.last_event = Some(TurnEvent::MonsterDeath);
            log::debug!("{} died at {:?}", monster.character.name(), dest);
        } else {
            level.monsters.insert(dest, monster);
        }

        if self.player.character.hp <= 0 {
            Some(TurnOutcome::PlayerDied)
        } else {
            Some(TurnOutcome::Ongoing)
        }
    }

    /// Moves the player onto a walkable cell, routing through a portal when
    /// one is mapped there and the level's coin purse meets the gate.
    fn move_player(&mut self, dest: Position) -> WarrenResult<()> {
        if let Some(target) = self.current_level().portals.get(&dest).cloned() {
            if self.current_level().coins >= config::PORTAL_COIN_COST {
                self.current_level_mut().last_event = Some(TurnEvent::Portal);
                self.teleport_player(&target.level, target.pos)?;
                self.current_level_mut().last_event = Some(TurnEvent::Portal);
                log::info!("player took portal to '{}' at {:?}", target.level, target.pos);
            } else {
                self.current_level_mut().last_event = Some(TurnEvent::FailedPortal);
            }
            return Ok(());
        }

        self.player.character.entity.pos = dest;
        let radius = self.player.character.sight_range;
        let level = self
            .levels
            .get_mut(&self.current)
            .expect("current always names a loaded level");
        level.last_event = Some(TurnEvent::Move);
        if let Some(tile) = level.grid.get_mut(dest) {
            if tile.overlay == Overlay::Coin {
                tile.overlay = Overlay::None;
                level.coins += 1;
                log::debug!("coin collected, purse now {}", level.coins);
            }
        }
        level.refresh_visibility(dest, radius);
        Ok(())
    }

    /// Flips a closed door open and recomputes visibility, which may reveal
    /// the cells behind it.
    fn open_door(&mut self, dest: Position) {
        let origin = self.player.pos();
        let radius = self.player.character.sight_range;
        let level = self
            .levels
            .get_mut(&self.current)
            .expect("current always names a loaded level");
        if let Some(tile) = level.grid.get_mut(dest) {
            tile.overlay = Overlay::OpenDoor;
        }
        level.last_event = Some(TurnEvent::OpenDoor);
        level.refresh_visibility(origin, radius);
    }

    /// Transfers every ground item on the player's cell into the inventory.
    fn take_all(&mut self) {
        let pos = self.player.pos();
        let level = self
            .levels
            .get_mut(&self.current)
            .expect("current always names a loaded level");
        let Some(ground) = level.items.remove(&pos) else {
            return;
        };
        for item in ground {
            level.events.push(format!("You picked up {}", item.name()));
            self.player.character.inventory.push(item);
        }
        level.last_event = Some(TurnEvent::PickUp);
    }

    /// Transfers one specific ground item into the inventory. The item must
    /// actually rest on the player's cell; anything else is a stale
    /// reference from the caller and fails loudly.
    fn take_item(&mut self, id: ItemId) -> WarrenResult<()> {
        let pos = self.player.pos();
        let level = self
            .levels
            .get_mut(&self.current)
            .expect("current always names a loaded level");

        let item = match level.items.get_mut(&pos) {
            Some(stack) => match stack.iter().position(|item| item.id == id) {
                Some(idx) => {
                    let item = stack.remove(idx);
                    if stack.is_empty() {
                        level.items.remove(&pos);
                    }
                    item
                }
                None => {
                    return Err(WarrenError::PreconditionViolated(format!(
                        "item {id} is not on the player's cell {pos:?}"
                    )))
                }
            },
            None => {
                return Err(WarrenError::PreconditionViolated(format!(
                    "no items on the player's cell {pos:?}"
                )))
            }
        };

        level.events.push(format!("You picked up {}", item.name()));
        level.last_event = Some(TurnEvent::PickUp);
        self.player.character.inventory.push(item);
        Ok(())
    }

    /// Drops one inventory item onto the player's cell. The inverse of
    /// [`World::take_item`], with the same loud failure on a stale id.
    fn drop_item(&mut self, id: ItemId) -> WarrenResult<()> {
        let pos = self.player.pos();
        let Some(item) = self.player.character.take_from_inventory(id) else {
            return Err(WarrenError::PreconditionViolated(format!(
                "item {id} is not in the player's inventory"
            )));
        };
        let level = self
            .levels
            .get_mut(&self.current)
            .expect("current always names a loaded level");
        level.events.push(format!("You dropped {}", item.name()));
        level.drop_item_at(pos, item);
        level.last_event = Some(TurnEvent::Drop);
        Ok(())
    }

    /// Moves an inventory item into the slot matching its kind.
    ///
    /// A previously equipped item is overwritten and lost, not returned to
    /// the inventory. That matches the behavior authored content was
    /// balanced against, so it is kept as-is rather than fixed.
    fn equip_item(&mut self, id: ItemId) -> WarrenResult<()> {
        let Some(item) = self.player.character.take_from_inventory(id) else {
            return Err(WarrenError::PreconditionViolated(format!(
                "item {id} is not in the player's inventory"
            )));
        };
        let name = item.entity.name.clone();
        match item.kind {
            ItemKind::Weapon => self.player.character.weapon = Some(item),
            ItemKind::BodyArmor => self.player.character.armor = Some(item),
            ItemKind::Helmet => self.player.character.helmet = Some(item),
            ItemKind::Potion => {
                self.player.character.inventory.push(item);
                return Err(WarrenError::InvalidIntent(
                    "potions have no equipment slot".to_string(),
                ));
            }
        }
        let level = self
            .levels
            .get_mut(&self.current)
            .expect("current always names a loaded level");
        level.events.push(format!("You equipped {name}"));
        level.last_event = Some(TurnEvent::Equip);
        Ok(())
    }

    /// Steps every monster on the current level once.
    ///
    /// The backing map is unordered, so monsters are iterated in sorted
    /// position order as an explicit determinism layer for replay and
    /// testing. Each monster banks `speed` AP, paths to the player, and
    /// spends one AP per path step: relocating into free cells, attacking
    /// when the next step is the player. Unreachable players cost the
    /// monster its whole turn.
    fn run_monster_phase(&mut self) -> WarrenResult<TurnOutcome> {
        let mut order: Vec<Position> = self.current_level().monsters.keys().copied().collect();
        order.sort();

        for pos in order {
            let level = self
                .levels
                .get_mut(&self.current)
                .expect("current always names a loaded level");
            let Some(mut monster) = level.monsters.remove(&pos) else {
                continue;
            };

            monster.character.ap += monster.character.speed;
            let player_pos = self.player.pos();
            let path = find_path(level, monster.pos(), player_pos);

            if path.len() < 2 {
                // No route (or already standing on the player start cell):
                // the turn's budget is forfeited.
                monster.character.ap -= monster.character.speed;
                level.monsters.insert(monster.pos(), monster);
                continue;
            }

            let budget = monster.character.ap as i64;
            let mut player_died = false;
            for step in 1..=budget {
                let step = step as usize;
                if step >= path.len() {
                    break;
                }
                let next = path[step];
                monster.character.ap -= 1.0;
                if next == player_pos {
                    // Appends to the event log only; `last_event` keeps
                    // describing the player's own action this turn.
                    attack(
                        &mut monster.character,
                        &mut self.player.character,
                        &mut level.events,
                    );
                    if self.player.character.hp <= 0 {
                        player_died = true;
                    }
                    break;
                } else if !level.monsters.contains_key(&next) {
                    monster.character.entity.pos = next;
                }
                // Occupied by another monster that moved since the path was
                // planned: the step is simply wasted.
            }

            let final_pos = monster.pos();
            level.monsters.insert(final_pos, monster);
            if player_died {
                return Ok(TurnOutcome::PlayerDied);
            }
        }

        Ok(TurnOutcome::Ongoing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Character, Entity, Grid, Item, Level, Monster, PortalTarget, Tile};
    use std::collections::HashMap;

    fn quiet_monster(pos: Position, hp: i32, strength: i32, speed: f64) -> Monster {
        Monster {
            character: Character::new(Entity::new(pos, 'M', "Goblin"), hp, strength, speed, 0.0, 10),
        }
    }

    fn open_world(size: u32, spawn: Position) -> World {
        let mut level = Level::new("main", Grid::filled(size, size, Tile::floor()));
        level.player_start = Some(spawn);
        let mut levels = HashMap::new();
        levels.insert("main".to_string(), level);
        World::new(levels, "main").unwrap()
    }

    #[test]
    fn test_move_intent_relocates_and_relights() {
        let mut world = open_world(8, Position::new(4, 4));
        let outcome = world
            .apply_intent(&Intent::Move(Direction::East))
            .unwrap();

        assert_eq!(outcome, TurnOutcome::Ongoing);
        assert_eq!(world.player.pos(), Position::new(5, 4));
        assert_eq!(world.current_level().last_event, Some(TurnEvent::Move));
        assert!(world
            .current_level()
            .grid
            .get(Position::new(5, 4))
            .unwrap()
            .visible);
    }

    #[test]
    fn test_wall_bump_is_a_no_op() {
        let mut world = open_world(8, Position::new(1, 1));
        world
            .current_level_mut()
            .grid
            .get_mut(Position::new(2, 1))
            .unwrap()
            .terrain = crate::game::Terrain::StoneWall;

        world.apply_intent(&Intent::Move(Direction::East)).unwrap();
        assert_eq!(world.player.pos(), Position::new(1, 1));
        assert_eq!(world.current_level().last_event, None);
    }

    #[test]
    fn test_closed_door_opens_instead_of_moving() {
        let mut world = open_world(8, Position::new(1, 1));
        let door = Position::new(2, 1);
        world
            .current_level_mut()
            .grid
            .get_mut(door)
            .unwrap()
            .overlay = Overlay::ClosedDoor;

        world.apply_intent(&Intent::Move(Direction::East)).unwrap();
        assert_eq!(world.player.pos(), Position::new(1, 1), "door does not move us");
        assert_eq!(
            world.current_level().grid.get(door).unwrap().overlay,
            Overlay::OpenDoor
        );
        assert_eq!(world.current_level().last_event, Some(TurnEvent::OpenDoor));
    }

    #[test]
    fn test_attack_and_kill_drops_monster_loot() {
        let mut world = open_world(8, Position::new(1, 1));
        let lair = Position::new(2, 1);
        let mut monster = quiet_monster(lair, 4, 0, 0.0);
        monster.character.inventory.push(Item::sword(lair));
        monster.character.inventory.push(Item::potion(lair));
        world.current_level_mut().monsters.insert(lair, monster);

        world.apply_intent(&Intent::Move(Direction::East)).unwrap();

        assert!(world.current_level().monsters.is_empty());
        assert_eq!(world.current_level().ground_item_count(lair), 2);
        assert_eq!(
            world.current_level().last_event,
            Some(TurnEvent::MonsterDeath)
        );
        assert_eq!(
            world.current_level().events.iter().last().unwrap(),
            "Player killed Goblin"
        );
    }

    #[test]
    fn test_surviving_monster_keeps_its_cell() {
        let mut world = open_world(8, Position::new(1, 1));
        let lair = Position::new(2, 1);
        world
            .current_level_mut()
            .monsters
            .insert(lair, quiet_monster(lair, 50, 0, 0.0));

        world.apply_intent(&Intent::Move(Direction::East)).unwrap();

        let survivor = &world.current_level().monsters[&lair];
        assert_eq!(survivor.character.hp, 45);
        assert_eq!(world.player.pos(), Position::new(1, 1));
    }

    #[test]
    fn test_player_death_is_reported_not_fatal() {
        let mut world = open_world(8, Position::new(1, 1));
        world.player.character.hp = 1;
        let lair = Position::new(2, 1);
        // strong enough to one-shot on the retaliation phase
        world
            .current_level_mut()
            .monsters
            .insert(lair, quiet_monster(lair, 500, 100, 1.0));

        let outcome = world.apply_intent(&Intent::Move(Direction::East)).unwrap();
        assert_eq!(outcome, TurnOutcome::PlayerDied);
    }

    #[test]
    fn test_portal_gate_failure_keeps_player_put() {
        let mut world = open_world(8, Position::new(1, 1));
        world.current_level_mut().portals.insert(
            Position::new(2, 1),
            PortalTarget {
                level: "main".to_string(),
                pos: Position::new(6, 6),
            },
        );

        world.apply_intent(&Intent::Move(Direction::East)).unwrap();
        assert_eq!(world.player.pos(), Position::new(1, 1));
        assert_eq!(
            world.current_level().last_event,
            Some(TurnEvent::FailedPortal)
        );
    }

    #[test]
    fn test_portal_with_coins_teleports() {
        let mut world = open_world(8, Position::new(1, 1));
        world.current_level_mut().coins = crate::config::PORTAL_COIN_COST;
        world.current_level_mut().portals.insert(
            Position::new(2, 1),
            PortalTarget {
                level: "main".to_string(),
                pos: Position::new(6, 6),
            },
        );

        world.apply_intent(&Intent::Move(Direction::East)).unwrap();
        assert_eq!(world.player.pos(), Position::new(6, 6));
        assert_eq!(world.current_level().last_event, Some(TurnEvent::Portal));
        assert!(world
            .current_level()
            .grid
            .get(Position::new(6, 6))
            .unwrap()
            .visible);
    }

    #[test]
    fn test_walking_over_coin_fills_purse() {
        let mut world = open_world(8, Position::new(1, 1));
        world
            .current_level_mut()
            .grid
            .get_mut(Position::new(2, 1))
            .unwrap()
            .overlay = Overlay::Coin;

        world.apply_intent(&Intent::Move(Direction::East)).unwrap();
        assert_eq!(world.current_level().coins, 1);
        assert_eq!(
            world
                .current_level()
                .grid
                .get(Position::new(2, 1))
                .unwrap()
                .overlay,
            Overlay::None
        );
    }

    #[test]
    fn test_take_all_then_drop_round_trip() {
        let mut world = open_world(8, Position::new(1, 1));
        let here = Position::new(1, 1);
        let sword = Item::sword(here);
        let sword_id = sword.id;
        world.current_level_mut().drop_item_at(here, sword);
        world
            .current_level_mut()
            .drop_item_at(here, Item::potion(here));

        world.apply_intent(&Intent::TakeAll).unwrap();
        assert_eq!(world.player.character.inventory.len(), 2);
        assert_eq!(world.current_level().ground_item_count(here), 0);
        assert_eq!(world.current_level().last_event, Some(TurnEvent::PickUp));

        world.apply_intent(&Intent::Drop(sword_id)).unwrap();
        assert_eq!(world.player.character.inventory.len(), 1);
        assert_eq!(world.current_level().ground_item_count(here), 1);
        assert_eq!(world.current_level().last_event, Some(TurnEvent::Drop));
    }

    #[test]
    fn test_take_stale_item_fails_loudly() {
        let mut world = open_world(8, Position::new(1, 1));
        let ghost = Item::sword(Position::new(5, 5));
        let result = world.apply_intent(&Intent::Take(ghost.id));
        assert!(matches!(
            result,
            Err(crate::WarrenError::PreconditionViolated(_))
        ));
    }

    #[test]
    fn test_equip_moves_item_out_of_inventory() {
        let mut world = open_world(8, Position::new(1, 1));
        let sword = Item::sword(Position::new(1, 1));
        let id = sword.id;
        world.player.character.inventory.push(sword);

        world.apply_intent(&Intent::Equip(id)).unwrap();
        assert!(world.player.character.inventory.is_empty());
        assert!(world.player.character.weapon.is_some());
        assert_eq!(world.current_level().last_event, Some(TurnEvent::Equip));
    }

    #[test]
    fn test_equip_overwrites_without_returning_previous() {
        let mut world = open_world(8, Position::new(1, 1));
        let first = Item::sword(Position::new(1, 1));
        let second = Item::sword(Position::new(1, 1));
        let (first_id, second_id) = (first.id, second.id);
        world.player.character.inventory.push(first);
        world.player.character.inventory.push(second);

        world.apply_intent(&Intent::Equip(first_id)).unwrap();
        world.apply_intent(&Intent::Equip(second_id)).unwrap();

        // the first sword is gone entirely: not in the slot, the inventory,
        // or on the ground
        assert_eq!(
            world.player.character.weapon.as_ref().map(|item| item.id),
            Some(second_id)
        );
        assert!(world.player.character.inventory.is_empty());
        assert_eq!(world.current_level().ground_item_count(Position::new(1, 1)), 0);
    }

    #[test]
    fn test_equip_potion_is_rejected_and_kept() {
        let mut world = open_world(8, Position::new(1, 1));
        let potion = Item::potion(Position::new(1, 1));
        let id = potion.id;
        world.player.character.inventory.push(potion);

        let result = world.apply_intent(&Intent::Equip(id));
        assert!(matches!(result, Err(crate::WarrenError::InvalidIntent(_))));
        assert_eq!(world.player.character.inventory.len(), 1);
    }

    #[test]
    fn test_monster_chases_player_across_open_floor() {
        let mut world = open_world(10, Position::new(1, 1));
        let start = Position::new(6, 1);
        world
            .current_level_mut()
            .monsters
            .insert(start, quiet_monster(start, 10, 1, 2.0));

        // player waits in place by bumping a wall
        world
            .current_level_mut()
            .grid
            .get_mut(Position::new(0, 1))
            .unwrap()
            .terrain = crate::game::Terrain::StoneWall;
        world.apply_intent(&Intent::Move(Direction::West)).unwrap();

        // two AP at speed 2.0: the monster closed two cells toward us
        assert!(world
            .current_level()
            .monsters
            .contains_key(&Position::new(4, 1)));
    }

    #[test]
    fn test_unreachable_monster_forfeits_turn() {
        let mut world = open_world(9, Position::new(1, 1));
        // box the monster in at the far corner
        for pos in [
            Position::new(7, 8),
            Position::new(8, 7),
            Position::new(7, 7),
        ] {
            world
                .current_level_mut()
                .grid
                .get_mut(pos)
                .unwrap()
                .terrain = crate::game::Terrain::StoneWall;
        }
        let cage = Position::new(8, 8);
        world
            .current_level_mut()
            .monsters
            .insert(cage, quiet_monster(cage, 10, 1, 3.0));

        world.apply_intent(&Intent::TakeAll).unwrap();

        let caged = &world.current_level().monsters[&cage];
        assert_eq!(caged.pos(), cage);
        assert_eq!(caged.character.ap, 0.0, "banked nothing");
    }

    #[test]
    fn test_monster_attack_keeps_player_event_category() {
        let mut world = open_world(8, Position::new(1, 1));
        let here = Position::new(1, 1);
        world
            .current_level_mut()
            .drop_item_at(here, Item::potion(here));
        let lair = Position::new(2, 1);
        world
            .current_level_mut()
            .monsters
            .insert(lair, quiet_monster(lair, 50, 3, 1.0));

        world.apply_intent(&Intent::TakeAll).unwrap();

        // the monster's retaliation lands in the log, but the turn's
        // category still describes the pickup
        assert_eq!(world.current_level().last_event, Some(TurnEvent::PickUp));
        assert_eq!(
            world.current_level().events.iter().last().unwrap(),
            "Goblin attacked Player"
        );
    }

    #[test]
    fn test_adjacent_monster_attacks_instead_of_moving() {
        let mut world = open_world(8, Position::new(1, 1));
        let lair = Position::new(2, 1);
        world
            .current_level_mut()
            .monsters
            .insert(lair, quiet_monster(lair, 50, 3, 1.0));

        let hp_before = world.player.character.hp;
        world.apply_intent(&Intent::TakeAll).unwrap();

        assert_eq!(world.player.character.hp, hp_before - 3);
        assert!(world.current_level().monsters.contains_key(&lair));
    }
}
