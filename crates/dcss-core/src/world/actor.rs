//! Actors: the player and monsters
//!
//! Only the parts of the actor model that projectile movement reads or
//! writes live here.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::consts::{BASELINE_DELAY, BOULDER_BEETLE_SPEED, NORMAL_SPEED, ORB_SPEED};
use crate::math::Coord;
use crate::movement::{HandlerKind, ProjectileState};
use crate::rng::GameRng;

/// Unique identifier for actors on a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(pub u32);

/// Monster species the movement code distinguishes
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter,
)]
pub enum Species {
    OrbOfDestruction,
    BoulderBeetle,
    Orc,
    Ogre,
    Merfolk,
    Goblin,
}

impl Species {
    pub const fn name(&self) -> &'static str {
        match self {
            Species::OrbOfDestruction => "orb of destruction",
            Species::BoulderBeetle => "boulder beetle",
            Species::Orc => "orc",
            Species::Ogre => "ogre",
            Species::Merfolk => "merfolk",
            Species::Goblin => "goblin",
        }
    }

    pub const fn glyph(&self) -> char {
        match self {
            Species::OrbOfDestruction => '*',
            Species::BoulderBeetle => 'B',
            Species::Orc => 'o',
            Species::Ogre => 'O',
            Species::Merfolk => 'm',
            Species::Goblin => 'g',
        }
    }

    pub const fn from_glyph(c: char) -> Option<Species> {
        Some(match c {
            'B' => Species::BoulderBeetle,
            'o' => Species::Orc,
            'O' => Species::Ogre,
            'm' => Species::Merfolk,
            'g' => Species::Goblin,
            _ => return None,
        })
    }

    pub const fn speed(&self) -> i32 {
        match self {
            Species::OrbOfDestruction => ORB_SPEED,
            Species::BoulderBeetle => BOULDER_BEETLE_SPEED,
            _ => NORMAL_SPEED,
        }
    }

    /// (hit dice, hp, ac)
    pub const fn base_stats(&self) -> (i32, i32, i32) {
        match self {
            Species::OrbOfDestruction => (1, 1000, 0),
            Species::BoulderBeetle => (9, 45, 20),
            Species::Orc => (1, 6, 0),
            Species::Ogre => (5, 30, 1),
            Species::Merfolk => (5, 25, 4),
            Species::Goblin => (1, 4, 0),
        }
    }

    /// Self-propelled projectile that is simulated every step
    pub const fn is_projectile(&self) -> bool {
        matches!(self, Species::OrbOfDestruction)
    }

    /// Can curl up and roll
    pub const fn can_roll(&self) -> bool {
        matches!(self, Species::BoulderBeetle)
    }

    /// Lives in water and can hide beneath it
    pub const fn is_aquatic(&self) -> bool {
        matches!(self, Species::Merfolk)
    }
}

/// Player or monster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActorKind {
    Player,
    Monster(Species),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display)]
pub enum Attitude {
    #[default]
    Hostile,
    Neutral,
    Friendly,
}

/// Who a projectile's kills are credited to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display)]
pub enum KillCategory {
    You,
    Friendly,
    #[default]
    Other,
}

/// Player transformation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display)]
pub enum Form {
    #[default]
    Normal,
    Boulder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum Enchantment {
    Rolling,
    Confusion,
}

/// An enchantment with its remaining duration (0 = until removed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveEnchantment {
    pub kind: Enchantment,
    pub duration: i32,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ActorFlags: u16 {
        /// Hidden beneath water
        const SUBMERGED = 0x0001;
        /// Immune to confusion
        const CLARITY = 0x0002;
        /// Aims badly
        const INACCURATE = 0x0004;
        /// Paralysed, asleep or otherwise unable to block
        const INCAPACITATED = 0x0008;
    }
}

/// A worn shield
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shield {
    pub name: String,
    /// Block chance against the projectile's to-hit roll
    pub bonus: i32,
    pub reflects: bool,
}

impl Shield {
    pub fn new(name: &str, bonus: i32) -> Self {
        Self {
            name: name.to_string(),
            bonus,
            reflects: false,
        }
    }

    pub fn reflecting(name: &str, bonus: i32) -> Self {
        Self {
            reflects: true,
            ..Self::new(name, bonus)
        }
    }
}

/// A player or monster on the level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub kind: ActorKind,
    pub name: String,
    pub pos: Coord,
    pub hp: i32,
    pub hp_max: i32,
    pub ac: i32,
    /// Hit dice for monsters, experience level for the player
    pub hit_dice: i32,
    pub speed: i32,
    pub energy: i32,
    pub attitude: Attitude,
    pub flags: ActorFlags,
    pub shield: Option<Shield>,
    /// Blocks made this turn; each one makes the next harder
    pub shield_blocks: i32,
    pub enchantments: Vec<ActiveEnchantment>,
    pub form: Form,
    pub foe: Option<ActorId>,
    pub summoner: Option<ActorId>,
    /// Sub-tile movement state, present once the actor has been propelled
    pub projectile: Option<ProjectileState>,
    /// Cached handler selection; cleared whenever it may be stale
    #[serde(default)]
    pub movement: Option<HandlerKind>,
    pub alive: bool,
}

impl Actor {
    pub fn player(name: &str, pos: Coord) -> Self {
        Self {
            id: ActorId(0),
            kind: ActorKind::Player,
            name: name.to_string(),
            pos,
            hp: 30,
            hp_max: 30,
            ac: 2,
            hit_dice: 10,
            speed: NORMAL_SPEED,
            energy: 0,
            attitude: Attitude::Friendly,
            flags: ActorFlags::empty(),
            shield: None,
            shield_blocks: 0,
            enchantments: Vec::new(),
            form: Form::Normal,
            foe: None,
            summoner: None,
            projectile: None,
            movement: None,
            alive: true,
        }
    }

    pub fn monster(species: Species, pos: Coord) -> Self {
        let (hit_dice, hp, ac) = species.base_stats();
        Self {
            kind: ActorKind::Monster(species),
            name: species.name().to_string(),
            hp,
            hp_max: hp,
            ac,
            hit_dice,
            speed: species.speed(),
            attitude: Attitude::Hostile,
            ..Self::player("", pos)
        }
    }

    pub fn is_player(&self) -> bool {
        self.kind == ActorKind::Player
    }

    pub fn species(&self) -> Option<Species> {
        match self.kind {
            ActorKind::Monster(s) => Some(s),
            ActorKind::Player => None,
        }
    }

    pub fn is_projectile(&self) -> bool {
        self.species().is_some_and(|s| s.is_projectile())
    }

    /// A boulder beetle or a player in boulder form
    pub fn is_boulder(&self) -> bool {
        match self.kind {
            ActorKind::Monster(s) => s.can_roll(),
            ActorKind::Player => self.form == Form::Boulder,
        }
    }

    pub fn is_rolling(&self) -> bool {
        self.is_boulder() && self.has_ench(Enchantment::Rolling)
    }

    /// "you" or "the orc"
    pub fn the_name(&self) -> String {
        if self.is_player() {
            "you".to_string()
        } else {
            format!("the {}", self.name)
        }
    }

    /// "You" or "The orc"
    pub fn cap_the_name(&self) -> String {
        capitalise(&self.the_name())
    }

    /// Pick the verb form agreeing with this actor as subject
    pub fn conj<'a>(&self, second_person: &'a str, third_person: &'a str) -> &'a str {
        if self.is_player() {
            second_person
        } else {
            third_person
        }
    }

    pub fn glyph(&self) -> char {
        match self.kind {
            ActorKind::Player if self.form == Form::Boulder => '0',
            ActorKind::Player => '@',
            ActorKind::Monster(Species::BoulderBeetle) if self.is_rolling() => '0',
            ActorKind::Monster(s) => s.glyph(),
        }
    }

    pub fn has_ench(&self, kind: Enchantment) -> bool {
        self.enchantments.iter().any(|e| e.kind == kind)
    }

    pub fn add_ench(&mut self, kind: Enchantment, duration: i32) {
        self.movement = None;
        if let Some(e) = self.enchantments.iter_mut().find(|e| e.kind == kind) {
            e.duration = e.duration.max(duration);
            return;
        }
        self.enchantments.push(ActiveEnchantment { kind, duration });
    }

    /// Returns true if the enchantment was present
    pub fn del_ench(&mut self, kind: Enchantment) -> bool {
        self.movement = None;
        let before = self.enchantments.len();
        self.enchantments.retain(|e| e.kind != kind);
        self.enchantments.len() != before
    }

    pub fn set_form(&mut self, form: Form) {
        self.movement = None;
        self.form = form;
    }

    /// Count down timed enchantments, dropping the expired ones
    pub fn tick_enchantments(&mut self) {
        let before = self.enchantments.len();
        self.enchantments.retain_mut(|e| {
            if e.duration > 0 {
                e.duration -= 1;
                e.duration > 0
            } else {
                true
            }
        });
        if self.enchantments.len() != before {
            self.movement = None;
        }
    }

    pub fn submerged(&self) -> bool {
        self.flags.contains(ActorFlags::SUBMERGED)
    }

    pub fn incapacitated(&self) -> bool {
        self.flags.contains(ActorFlags::INCAPACITATED)
    }

    pub fn inaccurate(&self) -> bool {
        self.flags.contains(ActorFlags::INACCURATE)
    }

    pub fn has_clarity(&self) -> bool {
        self.flags.contains(ActorFlags::CLARITY)
    }

    /// Penalty added to an attacker's roll against this actor's shield
    pub fn shield_block_penalty(&self) -> i32 {
        5 * self.shield_blocks * self.shield_blocks
    }

    pub fn shield_block_succeeded(&mut self) {
        self.shield_blocks += 1;
    }

    /// Spend energy; one normal action is [`BASELINE_DELAY`]
    pub fn lose_energy(&mut self, amount: i32) {
        self.energy -= amount;
    }

    pub fn lose_move_energy(&mut self) {
        self.lose_energy(BASELINE_DELAY);
    }

    /// Armour soaks a random part of the damage
    pub fn apply_ac(&self, damage: i32, rng: &mut GameRng) -> i32 {
        if self.ac <= 0 {
            return damage;
        }
        (damage - rng.rn2(self.ac as u32 + 1) as i32).max(0)
    }
}

/// Upper-case the first letter of a message
pub fn capitalise(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monster_defaults() {
        let orb = Actor::monster(Species::OrbOfDestruction, Coord::new(3, 3));
        assert!(orb.is_projectile());
        assert!(!orb.is_boulder());
        assert_eq!(orb.the_name(), "the orb of destruction");
        assert_eq!(orb.cap_the_name(), "The orb of destruction");
        assert_eq!(orb.attitude, Attitude::Hostile);
    }

    #[test]
    fn test_rolling_requires_boulder() {
        let mut beetle = Actor::monster(Species::BoulderBeetle, Coord::new(1, 1));
        assert!(!beetle.is_rolling());
        beetle.add_ench(Enchantment::Rolling, 0);
        assert!(beetle.is_rolling());
        assert_eq!(beetle.glyph(), '0');

        let mut orc = Actor::monster(Species::Orc, Coord::new(1, 1));
        orc.add_ench(Enchantment::Rolling, 0);
        assert!(!orc.is_rolling());

        let mut you = Actor::player("You", Coord::new(2, 2));
        you.add_ench(Enchantment::Rolling, 0);
        assert!(!you.is_rolling());
        you.set_form(Form::Boulder);
        assert!(you.is_rolling());
    }

    #[test]
    fn test_enchantment_changes_clear_movement_cache() {
        let mut beetle = Actor::monster(Species::BoulderBeetle, Coord::new(1, 1));
        beetle.movement = Some(HandlerKind::Default);
        beetle.add_ench(Enchantment::Rolling, 0);
        assert_eq!(beetle.movement, None);
        beetle.movement = Some(HandlerKind::MonsterBoulder);
        assert!(beetle.del_ench(Enchantment::Rolling));
        assert_eq!(beetle.movement, None);
        assert!(!beetle.del_ench(Enchantment::Rolling));
    }

    #[test]
    fn test_timed_enchantments_expire() {
        let mut ogre = Actor::monster(Species::Ogre, Coord::new(1, 1));
        ogre.add_ench(Enchantment::Confusion, 2);
        ogre.tick_enchantments();
        assert!(ogre.has_ench(Enchantment::Confusion));
        ogre.tick_enchantments();
        assert!(!ogre.has_ench(Enchantment::Confusion));
    }

    #[test]
    fn test_shield_penalty_escalates() {
        let mut you = Actor::player("You", Coord::new(2, 2));
        assert_eq!(you.shield_block_penalty(), 0);
        you.shield_block_succeeded();
        you.shield_block_succeeded();
        assert_eq!(you.shield_block_penalty(), 20);
    }

    #[test]
    fn test_apply_ac_never_negative() {
        let mut rng = GameRng::new(3);
        let beetle = Actor::monster(Species::BoulderBeetle, Coord::new(1, 1));
        for _ in 0..100 {
            let d = beetle.apply_ac(5, &mut rng);
            assert!((0..=5).contains(&d));
        }
    }
}
