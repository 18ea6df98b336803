//! # Entities Module
//!
//! Player, monster, and item records, and the equipment-modified damage
//! formula shared by every combatant.

use crate::game::level::EventLog;
use crate::{config, Position};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for items, stable across pickup/drop/equip moves.
pub type ItemId = Uuid;

/// Symbolic identity plus position, the common base of players, monsters,
/// and items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub pos: Position,
    pub glyph: char,
    pub name: String,
}

impl Entity {
    pub fn new(pos: Position, glyph: char, name: impl Into<String>) -> Self {
        Self {
            pos,
            glyph,
            name: name.into(),
        }
    }
}

/// What an item does when carried or worn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    /// `power` is a damage multiplier
    Weapon,
    /// `power` is a damage-reduction fraction in [0, 1]
    BodyArmor,
    /// `power` is a damage-reduction fraction in [0, 1]
    Helmet,
    /// `power` is a healing amount
    Potion,
}

/// A carriable item. Lives either in a character's inventory/equipment or in
/// a level's ground-item map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub kind: ItemKind,
    pub entity: Entity,
    pub power: f32,
}

impl Item {
    pub fn new(kind: ItemKind, pos: Position, glyph: char, name: &str, power: f32) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            entity: Entity::new(pos, glyph, name),
            power,
        }
    }

    pub fn sword(pos: Position) -> Self {
        Self::new(ItemKind::Weapon, pos, 's', "Sword", 1.5)
    }

    pub fn helmet(pos: Position) -> Self {
        Self::new(ItemKind::Helmet, pos, 'h', "Helmet", 0.2)
    }

    pub fn armor(pos: Position) -> Self {
        Self::new(ItemKind::BodyArmor, pos, 'a', "Armor", 0.3)
    }

    pub fn potion(pos: Position) -> Self {
        Self::new(ItemKind::Potion, pos, 'p', "Potion", 50.0)
    }

    pub fn name(&self) -> &str {
        &self.entity.name
    }
}

/// A combat-capable entity: the player or a monster.
///
/// `ap` is the fractional action budget: replenished by `speed` once per
/// tick, spent one point per move or attack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub entity: Entity,
    pub hp: i32,
    pub strength: i32,
    pub speed: f64,
    pub ap: f64,
    pub sight_range: i32,
    pub inventory: Vec<Item>,
    pub weapon: Option<Item>,
    pub armor: Option<Item>,
    pub helmet: Option<Item>,
}

impl Character {
    pub fn new(
        entity: Entity,
        hp: i32,
        strength: i32,
        speed: f64,
        ap: f64,
        sight_range: i32,
    ) -> Self {
        Self {
            entity,
            hp,
            strength,
            speed,
            ap,
            sight_range,
            inventory: Vec::new(),
            weapon: None,
            armor: None,
            helmet: None,
        }
    }

    pub fn pos(&self) -> Position {
        self.entity.pos
    }

    pub fn name(&self) -> &str {
        &self.entity.name
    }

    /// Removes the item with the given id from the inventory, if held.
    pub fn take_from_inventory(&mut self, id: ItemId) -> Option<Item> {
        let idx = self.inventory.iter().position(|item| item.id == id)?;
        Some(self.inventory.remove(idx))
    }
}

/// The player. One record per world, shared across levels by the world
/// owner rather than duplicated per level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub character: Character,
}

impl Player {
    /// A fresh player with the stock starting stats, placed at `pos`.
    pub fn new(pos: Position) -> Self {
        Self {
            character: Character::new(
                Entity::new(pos, '@', "Player"),
                config::DEFAULT_PLAYER_HP,
                config::DEFAULT_PLAYER_STRENGTH,
                1.0,
                1.0,
                config::DEFAULT_SIGHT_RANGE,
            ),
        }
    }

    pub fn pos(&self) -> Position {
        self.character.pos()
    }
}

/// A monster: a character stepped by the engine's AI phase, owned by exactly
/// one level via that level's position-keyed monster map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Monster {
    pub character: Character,
}

impl Monster {
    /// A rat: weak and fast, with a coin-flip chance of carrying a sword.
    pub fn rat(pos: Position) -> Self {
        let mut character = Character::new(Entity::new(pos, 'R', "Rat"), 10, 2, 15.0, 0.0, 10);
        if rand::random::<bool>() {
            character.inventory.push(Item::sword(pos));
        }
        Self { character }
    }

    /// A spider: slow and strong, with a coin-flip chance of a helmet.
    pub fn spider(pos: Position) -> Self {
        let mut character = Character::new(Entity::new(pos, 'S', "Spider"), 15, 5, 2.0, 0.0, 10);
        if rand::random::<bool>() {
            character.inventory.push(Item::helmet(pos));
        }
        Self { character }
    }

    pub fn pos(&self) -> Position {
        self.character.pos()
    }
}

/// Resolves one attack and logs its outcome.
///
/// Damage starts at the attacker's strength, is multiplied by the equipped
/// weapon's power, then reduced by the defender's helmet and body armor in
/// that order. Every pass truncates to an integer before the next one is
/// applied; the order and the intermediate truncation are load-bearing for
/// compatibility with authored content and must not be reordered.
///
/// The attacker's AP drops by one whether or not it had any to spend; AP is
/// bookkeeping for the action economy, not a gate.
///
/// Killing the defender only logs the kill. Removing the corpse and dropping
/// its inventory is the caller's job, because only the caller knows which
/// map the defender lives in.
pub fn attack(attacker: &mut Character, defender: &mut Character, events: &mut EventLog) {
    attacker.ap -= 1.0;

    let mut damage = attacker.strength;
    if let Some(weapon) = &attacker.weapon {
        damage = (damage as f32 * weapon.power) as i32;
    }
    if let Some(helmet) = &defender.helmet {
        damage = (damage as f32 * (1.0 - helmet.power)) as i32;
    }
    if let Some(armor) = &defender.armor {
        damage = (damage as f32 * (1.0 - armor.power)) as i32;
    }
    defender.hp -= damage;

    if defender.hp > 0 {
        events.push(format!("{} attacked {}", attacker.name(), defender.name()));
    } else {
        events.push(format!("{} killed {}", attacker.name(), defender.name()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare(strength: i32, hp: i32) -> Character {
        Character::new(Entity::new(Position::new(0, 0), 'x', "Dummy"), hp, strength, 1.0, 1.0, 10)
    }

    #[test]
    fn test_attack_unarmed_unarmored() {
        let mut attacker = bare(5, 100);
        let mut defender = bare(1, 100);
        let mut events = EventLog::new();

        attack(&mut attacker, &mut defender, &mut events);

        assert_eq!(defender.hp, 95);
        assert_eq!(attacker.ap, 0.0);
        assert_eq!(events.iter().last().unwrap(), "Dummy attacked Dummy");
    }

    #[test]
    fn test_attack_weapon_doubles_damage() {
        let mut attacker = bare(5, 100);
        attacker.weapon = Some(Item::new(
            ItemKind::Weapon,
            Position::new(0, 0),
            's',
            "Greatsword",
            2.0,
        ));
        let mut defender = bare(1, 100);
        let mut events = EventLog::new();

        attack(&mut attacker, &mut defender, &mut events);

        assert_eq!(defender.hp, 90);
    }

    #[test]
    fn test_attack_helmet_halves_damage() {
        let mut attacker = bare(5, 100);
        attacker.weapon = Some(Item::new(
            ItemKind::Weapon,
            Position::new(0, 0),
            's',
            "Greatsword",
            2.0,
        ));
        let mut defender = bare(1, 100);
        defender.helmet = Some(Item::new(
            ItemKind::Helmet,
            Position::new(0, 0),
            'h',
            "Great Helm",
            0.5,
        ));
        let mut events = EventLog::new();

        attack(&mut attacker, &mut defender, &mut events);

        // 5 * 2.0 = 10, then 10 * 0.5 = 5
        assert_eq!(defender.hp, 95);
    }

    #[test]
    fn test_attack_truncates_between_reduction_passes() {
        let mut attacker = bare(5, 100);
        let mut defender = bare(1, 100);
        defender.helmet = Some(Item::helmet(Position::new(0, 0))); // 0.2
        defender.armor = Some(Item::armor(Position::new(0, 0))); // 0.3

        let mut events = EventLog::new();
        attack(&mut attacker, &mut defender, &mut events);

        // 5 -> trunc(5 * 0.8) = 4 -> trunc(4 * 0.7) = 2
        assert_eq!(defender.hp, 98);
    }

    #[test]
    fn test_attack_kill_logs_kill() {
        let mut attacker = bare(5, 100);
        let mut defender = bare(1, 3);
        let mut events = EventLog::new();

        attack(&mut attacker, &mut defender, &mut events);

        assert!(defender.hp <= 0);
        assert_eq!(events.iter().last().unwrap(), "Dummy killed Dummy");
    }

    #[test]
    fn test_take_from_inventory() {
        let mut character = bare(5, 100);
        let sword = Item::sword(Position::new(0, 0));
        let id = sword.id;
        character.inventory.push(sword);

        assert!(character.take_from_inventory(id).is_some());
        assert!(character.inventory.is_empty());
        assert!(character.take_from_inventory(id).is_none());
    }

    #[test]
    fn test_item_ids_unique() {
        let a = Item::sword(Position::new(0, 0));
        let b = Item::sword(Position::new(0, 0));
        assert_ne!(a.id, b.id);
    }
}
