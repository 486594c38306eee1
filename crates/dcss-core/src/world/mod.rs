//! World state
//!
//! The level the movement core runs against: terrain, the actor table,
//! effects and the message log. A `World` is passed explicitly into every
//! movement call instead of being reached through globals.

mod actor;
pub mod effects;
mod grid;
mod messages;
pub mod options;

use serde::{Deserialize, Serialize};
use strum::Display;
use thiserror::Error;

pub use actor::{
    ActiveEnchantment, Actor, ActorFlags, ActorId, ActorKind, Attitude, Enchantment, Form,
    KillCategory, Shield, Species, capitalise,
};
pub use effects::{Cloud, CloudType, Dice, Explosion, Noise};
pub use grid::{AsciiMap, Feature, Grid, MapError};
pub use messages::MessageLog;
pub use options::{OptionsError, SimOptions};

use crate::math::Coord;
use crate::rng::GameRng;

/// How an actor came to leave the level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum KillMethod {
    /// Silently removed: dissipated orbs, detonated projectiles
    Dismissed,
    /// Crushed by a rolling boulder
    Rolling,
    /// Caught in an explosion
    Explosion,
}

/// Tables of a deserialized world that disagree with each other
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorldError {
    #[error("terrain does not match the map size")]
    Terrain,

    #[error("occupancy has {found} cells, expected {expected}")]
    Occupancy { expected: usize, found: usize },

    #[error("actor slot {slot} holds {id:?}")]
    Slot { slot: usize, id: ActorId },

    #[error("{id:?} stands off the map at {pos}")]
    OffMap { id: ActorId, pos: Coord },
}

/// The level: terrain, actors, effects, messages and the RNG
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    pub grid: Grid,
    /// Actor arena indexed by `ActorId`; ids are never reused
    actors: Vec<Option<Actor>>,
    /// Which actor stands on each cell
    occupancy: Vec<Option<ActorId>>,
    player: Option<ActorId>,
    /// False while the player is away from this level
    pub player_on_level: bool,
    pub clouds: Vec<Cloud>,
    pub noises: Vec<Noise>,
    pub explosions: Vec<Explosion>,
    pub messages: MessageLog,
    pub options: SimOptions,
    pub rng: GameRng,
    pub turn: u64,
    /// Actors whose step is on the call stack
    #[serde(skip)]
    moving: Vec<ActorId>,
    /// Dead actors whose slots are freed once their step unwinds
    #[serde(skip)]
    doomed: Vec<ActorId>,
}

impl World {
    pub fn new(grid: Grid, seed: u64) -> Self {
        Self::with_options(grid, seed, SimOptions::default())
    }

    pub fn with_options(grid: Grid, seed: u64, options: SimOptions) -> Self {
        let cells = grid.width() * grid.height();
        Self {
            grid,
            actors: Vec::new(),
            occupancy: vec![None; cells],
            player: None,
            player_on_level: false,
            clouds: Vec::new(),
            noises: Vec::new(),
            explosions: Vec::new(),
            messages: MessageLog::default(),
            options,
            rng: GameRng::new(seed),
            turn: 0,
            moving: Vec::new(),
            doomed: Vec::new(),
        }
    }

    fn insert(&mut self, mut actor: Actor) -> Option<ActorId> {
        if self.actors().count() >= self.options.max_actors {
            return None;
        }
        let id = ActorId(self.actors.len() as u32);
        actor.id = id;
        actor.alive = true;
        self.actors.push(Some(actor));
        Some(id)
    }

    /// Add an actor standing on its cell. Fails if the cell is out of
    /// bounds, solid, occupied, or the level is full.
    pub fn place_actor(&mut self, actor: Actor) -> Option<ActorId> {
        let pos = actor.pos;
        if !self.in_bounds(pos) || self.is_solid(pos) || self.actor_at(pos).is_some() {
            return None;
        }
        let id = self.insert(actor)?;
        self.set_occupant(pos, Some(id));
        Some(id)
    }

    /// Add an actor that shares its cell with someone else until it first
    /// moves (a projectile leaving its caster's square).
    pub fn spawn_unplaced(&mut self, actor: Actor) -> Option<ActorId> {
        if !self.in_bounds(actor.pos) {
            return None;
        }
        self.insert(actor)
    }

    pub fn add_player(&mut self, actor: Actor) -> Option<ActorId> {
        let id = self.place_actor(actor)?;
        self.player = Some(id);
        self.player_on_level = true;
        Some(id)
    }

    /// The living player, if any
    pub fn player(&self) -> Option<ActorId> {
        self.player.filter(|&id| self.is_alive(id))
    }

    pub fn player_actor(&self) -> Option<&Actor> {
        self.player.and_then(|id| self.actor(id))
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors
            .get(id.0 as usize)?
            .as_ref()
            .filter(|a| a.alive)
    }

    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors
            .get_mut(id.0 as usize)?
            .as_mut()
            .filter(|a| a.alive)
    }

    pub fn is_alive(&self, id: ActorId) -> bool {
        self.actor(id).is_some()
    }

    /// Check that a deserialized world is usable: the terrain and
    /// occupancy tables fit the map and every actor sits in its own slot
    /// on the map.
    pub fn validate(&self) -> Result<(), WorldError> {
        if !self.grid.is_consistent() {
            return Err(WorldError::Terrain);
        }
        let expected = self.grid.width() * self.grid.height();
        if self.occupancy.len() != expected {
            return Err(WorldError::Occupancy {
                expected,
                found: self.occupancy.len(),
            });
        }
        for (slot, actor) in self.actors.iter().enumerate() {
            let Some(actor) = actor else {
                continue;
            };
            if actor.id.0 as usize != slot {
                return Err(WorldError::Slot { slot, id: actor.id });
            }
            if actor.alive && !self.grid.in_map(actor.pos) {
                return Err(WorldError::OffMap {
                    id: actor.id,
                    pos: actor.pos,
                });
            }
        }
        Ok(())
    }

    /// Living actors, in id order
    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.actors.iter().flatten().filter(|a| a.alive)
    }

    pub fn actor_ids(&self) -> Vec<ActorId> {
        self.actors().map(|a| a.id).collect()
    }

    pub fn actor_at(&self, pos: Coord) -> Option<ActorId> {
        let i = self.grid.index(pos)?;
        self.occupancy[i].filter(|&id| self.is_alive(id))
    }

    fn set_occupant(&mut self, pos: Coord, id: Option<ActorId>) {
        if let Some(i) = self.grid.index(pos) {
            self.occupancy[i] = id;
        }
    }

    fn clear_occupant(&mut self, pos: Coord, id: ActorId) {
        if let Some(i) = self.grid.index(pos) {
            if self.occupancy[i] == Some(id) {
                self.occupancy[i] = None;
            }
        }
    }

    pub fn in_bounds(&self, pos: Coord) -> bool {
        self.grid.in_bounds(pos)
    }

    pub fn is_solid(&self, pos: Coord) -> bool {
        self.grid.is_solid(pos)
    }

    pub fn has_floor(&self, pos: Coord) -> bool {
        self.grid.has_floor(pos)
    }

    pub fn is_water(&self, pos: Coord) -> bool {
        self.grid.is_water(pos)
    }

    /// Whether an actor could live on a cell
    pub fn can_inhabit(&self, id: ActorId, pos: Coord) -> bool {
        let Some(actor) = self.actor(id) else {
            return false;
        };
        if !self.in_bounds(pos) || self.is_solid(pos) {
            return false;
        }
        match actor.species() {
            Some(s) if s.is_aquatic() => self.is_water(pos),
            _ => self.has_floor(pos),
        }
    }

    /// Move an actor to a cell. Fails if the cell is out of bounds or held
    /// by someone else.
    pub fn move_actor_to(&mut self, id: ActorId, pos: Coord) -> bool {
        if !self.in_bounds(pos) {
            return false;
        }
        if self.actor_at(pos).is_some_and(|other| other != id) {
            return false;
        }
        let Some(actor) = self.actor_mut(id) else {
            return false;
        };
        let old = actor.pos;
        actor.pos = pos;
        self.clear_occupant(old, id);
        self.set_occupant(pos, Some(id));
        true
    }

    /// Exchange the cells of two actors
    pub fn swap_actors(&mut self, a: ActorId, b: ActorId) -> bool {
        let (Some(pa), Some(pb)) = (self.actor(a).map(|x| x.pos), self.actor(b).map(|x| x.pos))
        else {
            return false;
        };
        if let Some(actor) = self.actor_mut(a) {
            actor.pos = pb;
        }
        if let Some(actor) = self.actor_mut(b) {
            actor.pos = pa;
        }
        self.set_occupant(pb, Some(a));
        self.set_occupant(pa, Some(b));
        true
    }

    /// Apply damage. Returns true if the actor died.
    pub fn hurt(&mut self, id: ActorId, damage: i32, method: KillMethod) -> bool {
        let Some(actor) = self.actor_mut(id) else {
            return false;
        };
        actor.hp -= damage;
        if actor.hp > 0 {
            return false;
        }
        self.remove_actor(id, method);
        true
    }

    /// Take an actor off the level. Every destruction goes through here.
    ///
    /// The occupancy grid forgets the actor at once. If the actor is in the
    /// middle of its own step, freeing its slot waits until that step
    /// finishes.
    pub fn remove_actor(&mut self, id: ActorId, method: KillMethod) {
        let Some(actor) = self.actor(id) else {
            return;
        };
        let pos = actor.pos;
        let is_player = actor.is_player();
        let name = actor.cap_the_name();

        if method != KillMethod::Dismissed {
            if is_player {
                self.mpr("You die...");
            } else if self.player_sees(pos) {
                self.mpr(format!("{name} dies!"));
            }
        }
        log::debug!("removing {name} ({id:?}) at {pos}: {method}");

        if let Some(actor) = self.actor_mut(id) {
            actor.alive = false;
        }
        self.clear_occupant(pos, id);
        if is_player {
            self.player_on_level = false;
        }

        if self.moving.contains(&id) {
            self.doomed.push(id);
        } else {
            self.actors[id.0 as usize] = None;
        }
    }

    /// Mark the start of an actor's step
    pub fn begin_move(&mut self, id: ActorId) {
        self.moving.push(id);
    }

    /// Mark the end of an actor's step and free it if it died meanwhile
    pub fn finish_move(&mut self, id: ActorId) {
        if let Some(i) = self.moving.iter().rposition(|&m| m == id) {
            self.moving.remove(i);
        }
        if !self.moving.contains(&id) {
            if let Some(i) = self.doomed.iter().position(|&d| d == id) {
                self.doomed.remove(i);
                self.actors[id.0 as usize] = None;
            }
        }
    }

    pub fn is_moving(&self, id: ActorId) -> bool {
        self.moving.contains(&id)
    }

    /// Whether a dead actor's slot is still held by an unfinished step
    pub fn is_pending_removal(&self, id: ActorId) -> bool {
        self.doomed.contains(&id)
    }

    /// Confuse an actor for `duration` turns unless it has clarity
    pub fn confuse(&mut self, id: ActorId, duration: i32) -> bool {
        let Some(actor) = self.actor_mut(id) else {
            return false;
        };
        if actor.has_clarity() {
            return false;
        }
        actor.add_ench(Enchantment::Confusion, duration);
        true
    }

    /// Whether the player can see a cell. Uses the sight radius only.
    pub fn player_sees(&self, pos: Coord) -> bool {
        if !self.player_on_level {
            return false;
        }
        self.player_actor()
            .is_some_and(|p| p.pos.distance_sq(pos) <= self.options.los_radius_sq())
    }

    pub fn mpr(&mut self, msg: impl Into<String>) {
        self.messages.push(msg);
    }

    /// Print a message only if the player can see `pos`
    pub fn mpr_if_seen(&mut self, pos: Coord, msg: impl Into<String>) {
        if self.player_sees(pos) {
            self.mpr(msg);
        }
    }

    /// "The <monster><suffix>", if the player can see it
    pub fn simple_monster_message(&mut self, id: ActorId, suffix: &str) {
        let Some(actor) = self.actor(id) else {
            return;
        };
        let pos = actor.pos;
        let msg = format!("{}{}", actor.cap_the_name(), suffix);
        self.mpr_if_seen(pos, msg);
    }

    /// Raise a noise. An unseen noise within earshot prints `msg`.
    pub fn noisy(&mut self, loudness: i32, pos: Coord, msg: Option<&str>) {
        self.noises.push(Noise {
            pos,
            loudness,
            message: msg.map(str::to_string),
        });
        let Some(msg) = msg else {
            return;
        };
        let heard = self.player_on_level
            && !self.player_sees(pos)
            && self
                .player_actor()
                .is_some_and(|p| p.pos.distance_sq(pos) <= loudness * loudness);
        if heard {
            self.mpr(msg);
        }
    }

    /// Place a cloud, replacing any cloud already on the cell
    pub fn place_cloud(&mut self, kind: CloudType, pos: Coord, duration: u32, source: Option<ActorId>) {
        if duration == 0 || self.is_solid(pos) {
            return;
        }
        self.clouds.retain(|c| c.pos != pos);
        self.clouds.push(Cloud::new(kind, pos, duration, source));
    }

    pub fn cloud_at(&self, pos: Coord) -> Option<&Cloud> {
        self.clouds.iter().find(|c| c.pos == pos)
    }

    /// Resolve an explosion: everyone within the radius takes a roll of
    /// the damage dice.
    pub fn detonate(&mut self, explosion: Explosion) {
        log::debug!(
            "detonate {} at {} for {} (radius {}, big: {})",
            explosion.name,
            explosion.pos,
            explosion.damage,
            explosion.radius,
            explosion.big
        );
        self.noisy(explosion.loudness, explosion.pos, None);
        if explosion.big {
            self.mpr_if_seen(
                explosion.pos,
                format!("The {} explodes!", explosion.name),
            );
        }

        let victims: Vec<ActorId> = self
            .actors()
            .filter(|a| a.pos.grid_distance(explosion.pos) <= explosion.radius)
            .map(|a| a.id)
            .collect();
        for id in victims {
            let Some(victim) = self.actor(id) else {
                continue;
            };
            let msg = format!(
                "The {} {} {}!",
                explosion.name,
                explosion.hit_verb,
                victim.the_name()
            );
            let pos = victim.pos;
            self.mpr_if_seen(pos, msg);
            let damage = explosion.damage.roll(&mut self.rng);
            self.hurt(id, damage, KillMethod::Explosion);
        }

        self.explosions.push(explosion);
    }

    /// Advance timed state by one turn. Noises and explosions only last
    /// for the turn they happen in.
    pub fn end_turn(&mut self) {
        self.noises.clear();
        self.explosions.clear();
        self.clouds.retain_mut(Cloud::tick);
        for actor in self.actors.iter_mut().flatten() {
            actor.tick_enchantments();
            actor.shield_blocks = 0;
        }
        self.turn += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_world() -> World {
        World::new(Grid::open(20, 20), 42)
    }

    #[test]
    fn test_place_and_query() {
        let mut world = test_world();
        let orc = world
            .place_actor(Actor::monster(Species::Orc, Coord::new(5, 5)))
            .unwrap();
        assert_eq!(world.actor_at(Coord::new(5, 5)), Some(orc));
        // occupied
        assert!(world
            .place_actor(Actor::monster(Species::Goblin, Coord::new(5, 5)))
            .is_none());
        // solid
        assert!(world
            .place_actor(Actor::monster(Species::Goblin, Coord::new(0, 5)))
            .is_none());
    }

    #[test]
    fn test_move_actor_to() {
        let mut world = test_world();
        let orc = world
            .place_actor(Actor::monster(Species::Orc, Coord::new(5, 5)))
            .unwrap();
        let ogre = world
            .place_actor(Actor::monster(Species::Ogre, Coord::new(6, 5)))
            .unwrap();
        assert!(!world.move_actor_to(orc, Coord::new(6, 5)));
        assert!(!world.move_actor_to(orc, Coord::new(19, 5)));
        assert!(world.move_actor_to(orc, Coord::new(5, 6)));
        assert_eq!(world.actor_at(Coord::new(5, 5)), None);
        assert_eq!(world.actor_at(Coord::new(5, 6)), Some(orc));
        assert!(world.swap_actors(orc, ogre));
        assert_eq!(world.actor_at(Coord::new(5, 6)), Some(ogre));
        assert_eq!(world.actor(orc).unwrap().pos, Coord::new(6, 5));
    }

    #[test]
    fn test_removal_deferred_while_moving() {
        let mut world = test_world();
        let orc = world
            .place_actor(Actor::monster(Species::Orc, Coord::new(5, 5)))
            .unwrap();
        world.begin_move(orc);
        world.remove_actor(orc, KillMethod::Dismissed);
        assert!(!world.is_alive(orc));
        assert!(world.is_pending_removal(orc));
        assert_eq!(world.actor_at(Coord::new(5, 5)), None);
        world.finish_move(orc);
        assert!(!world.is_pending_removal(orc));
    }

    #[test]
    fn test_hurt_kills() {
        let mut world = test_world();
        world.add_player(Actor::player("You", Coord::new(2, 2))).unwrap();
        let goblin = world
            .place_actor(Actor::monster(Species::Goblin, Coord::new(3, 2)))
            .unwrap();
        assert!(!world.hurt(goblin, 1, KillMethod::Rolling));
        assert!(world.hurt(goblin, 10, KillMethod::Rolling));
        assert!(!world.is_alive(goblin));
        assert_eq!(world.messages.last(), Some("The goblin dies!"));
        assert_eq!(world.actor_at(Coord::new(3, 2)), None);
    }

    #[test]
    fn test_player_sees_radius() {
        let mut world = test_world();
        world.add_player(Actor::player("You", Coord::new(2, 2))).unwrap();
        assert!(world.player_sees(Coord::new(9, 3)));
        assert!(!world.player_sees(Coord::new(10, 2)));
        world.player_on_level = false;
        assert!(!world.player_sees(Coord::new(2, 3)));
    }

    #[test]
    fn test_noise_heard_out_of_sight() {
        let mut world = World::new(Grid::open(40, 10), 1);
        world.add_player(Actor::player("You", Coord::new(2, 2))).unwrap();
        world.noisy(40, Coord::new(30, 2), Some("You hear a loud crash."));
        assert_eq!(world.messages.last(), Some("You hear a loud crash."));
        world.noisy(40, Coord::new(3, 2), Some("Unheard because seen."));
        assert!(!world.messages.contains("Unheard"));
        assert_eq!(world.noises.len(), 2);
    }

    #[test]
    fn test_end_turn_clears_events() {
        let mut world = test_world();
        world.add_player(Actor::player("You", Coord::new(2, 2))).unwrap();
        for _ in 0..(crate::consts::MESSAGE_HISTORY + 20) {
            world.noisy(5, Coord::new(3, 3), None);
            world.mpr("Boom.");
            world.end_turn();
            assert!(world.noises.is_empty());
            assert!(world.explosions.is_empty());
        }
        assert_eq!(world.messages.len(), crate::consts::MESSAGE_HISTORY);
    }

    #[test]
    fn test_validate() {
        let mut world = test_world();
        world
            .place_actor(Actor::monster(Species::Orc, Coord::new(5, 5)))
            .unwrap();
        assert_eq!(world.validate(), Ok(()));

        let mut short = world.clone();
        short.occupancy.truncate(10);
        assert_eq!(
            short.validate(),
            Err(WorldError::Occupancy {
                expected: 400,
                found: 10
            })
        );

        let mut stray = world.clone();
        if let Some(Some(orc)) = stray.actors.get_mut(0) {
            orc.pos = Coord::new(25, 5);
        }
        assert!(matches!(stray.validate(), Err(WorldError::OffMap { .. })));
    }

    #[test]
    fn test_clouds_replace_and_expire() {
        let mut world = test_world();
        world.place_cloud(CloudType::MagicTrail, Coord::new(4, 4), 2, None);
        world.place_cloud(CloudType::DustTrail, Coord::new(4, 4), 1, None);
        assert_eq!(world.clouds.len(), 1);
        assert_eq!(world.cloud_at(Coord::new(4, 4)).unwrap().kind, CloudType::DustTrail);
        world.end_turn();
        assert!(world.cloud_at(Coord::new(4, 4)).is_none());
    }

    #[test]
    fn test_detonate_hits_radius() {
        let mut world = test_world();
        let near = world
            .place_actor(Actor::monster(Species::Ogre, Coord::new(6, 6)))
            .unwrap();
        let far = world
            .place_actor(Actor::monster(Species::Ogre, Coord::new(9, 6)))
            .unwrap();
        world.detonate(Explosion {
            pos: Coord::new(5, 5),
            name: "orb of destruction".to_string(),
            hit_verb: "hits".to_string(),
            damage: Dice::new(1, 1),
            radius: 1,
            loudness: 7,
            big: false,
            agent: None,
            source_name: String::new(),
        });
        assert_eq!(world.actor(near).unwrap().hp, 29);
        assert_eq!(world.actor(far).unwrap().hp, 30);
        assert_eq!(world.explosions.len(), 1);
    }

    #[test]
    fn test_world_serde_round_trip() {
        let mut world = test_world();
        world.add_player(Actor::player("You", Coord::new(2, 2))).unwrap();
        let json = serde_json::to_string(&world).unwrap();
        let restored: World = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.player(), world.player());
        assert_eq!(restored.actor_at(Coord::new(2, 2)), world.player());
    }
}
