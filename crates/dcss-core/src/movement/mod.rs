//! Projectile-style movement
//!
//! Actors that propel themselves (orbs of destruction, rolling boulder
//! beetles, a player rolling in boulder form) move one discrete step at a
//! time through a [`MovementHandler`]. The handler is rebuilt for every call
//! by [`handler_for`]; everything that must survive between turns lives in
//! the actor's [`ProjectileState`].
//!
//! Concrete handlers share the sub-tile stepper in [`Projectile`] and differ
//! only in the [`ProjectileBehaviour`] hooks they override.

mod boulder;
mod orb;
mod projectile;
mod state;

use serde::{Deserialize, Serialize};
use strum::Display;

pub use boulder::{MonsterBoulderMovement, PlayerBoulderMovement, impulse, start_rolling};
pub use orb::OrbMovement;
pub use projectile::{Projectile, ProjectileBehaviour};
pub use state::ProjectileState;

use crate::world::{Actor, ActorId, Enchantment, Form, World};

/// Which movement policy applies to an actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum HandlerKind {
    /// Ordinary movement; nothing to simulate
    Default,
    Orb,
    MonsterBoulder,
    PlayerBoulder,
}

impl HandlerKind {
    /// Pick the policy for an actor's current kind and form
    pub fn select(actor: &Actor) -> HandlerKind {
        if actor.is_player() {
            if actor.form == Form::Boulder && actor.has_ench(Enchantment::Rolling) {
                return HandlerKind::PlayerBoulder;
            }
            return HandlerKind::Default;
        }
        if actor.is_projectile() {
            HandlerKind::Orb
        } else if actor.is_rolling() {
            HandlerKind::MonsterBoulder
        } else {
            HandlerKind::Default
        }
    }

    pub fn build(self, subject: ActorId) -> Box<dyn MovementHandler> {
        match self {
            HandlerKind::Default => Box::new(DefaultMovement::new(subject)),
            HandlerKind::Orb => Box::new(OrbMovement::new(subject)),
            HandlerKind::MonsterBoulder => Box::new(MonsterBoulderMovement::new(subject)),
            HandlerKind::PlayerBoulder => Box::new(PlayerBoulderMovement::new(subject)),
        }
    }
}

/// Result of a movement call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Not a simulated mover; the caller should use ordinary movement
    NotHandled,
    /// Still in motion after this call
    Moving,
    /// Came to rest and is still alive
    Stopped,
    /// Removed from the level
    Destroyed,
}

/// Per-call movement policy bound to one actor
pub trait MovementHandler {
    fn subject(&self) -> ActorId;

    fn kind(&self) -> HandlerKind;

    /// Perform one discrete simulation step (possibly several sub-steps)
    fn move_step(&mut self, world: &mut World) -> MoveOutcome;

    /// Resolve `turns` elapsed turns the actor spent away from the player
    fn catchup(&mut self, world: &mut World, turns: i32) -> MoveOutcome;

    /// The subject died. A step in progress winds down, and later calls
    /// report `Destroyed` without touching the world.
    fn killed(&mut self);
}

/// Select (or reuse the cached) handler for an actor
pub fn handler_for(world: &mut World, id: ActorId) -> Box<dyn MovementHandler> {
    let Some(actor) = world.actor_mut(id) else {
        return HandlerKind::Default.build(id);
    };
    let kind = match actor.movement {
        Some(kind) => kind,
        None => {
            let kind = HandlerKind::select(actor);
            actor.movement = Some(kind);
            kind
        }
    };
    kind.build(id)
}

/// Opts out of simulation
#[derive(Debug, Clone)]
pub struct DefaultMovement {
    subject: ActorId,
}

impl DefaultMovement {
    pub fn new(subject: ActorId) -> Self {
        Self { subject }
    }
}

impl MovementHandler for DefaultMovement {
    fn subject(&self) -> ActorId {
        self.subject
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::Default
    }

    fn move_step(&mut self, _world: &mut World) -> MoveOutcome {
        MoveOutcome::NotHandled
    }

    fn catchup(&mut self, _world: &mut World, _turns: i32) -> MoveOutcome {
        MoveOutcome::NotHandled
    }

    fn killed(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Coord;
    use crate::world::{Grid, Species};

    #[test]
    fn test_select_by_kind_and_form() {
        let mut beetle = Actor::monster(Species::BoulderBeetle, Coord::new(2, 2));
        assert_eq!(HandlerKind::select(&beetle), HandlerKind::Default);
        beetle.add_ench(Enchantment::Rolling, 0);
        assert_eq!(HandlerKind::select(&beetle), HandlerKind::MonsterBoulder);

        let orb = Actor::monster(Species::OrbOfDestruction, Coord::new(2, 2));
        assert_eq!(HandlerKind::select(&orb), HandlerKind::Orb);

        let mut you = Actor::player("You", Coord::new(3, 3));
        assert_eq!(HandlerKind::select(&you), HandlerKind::Default);
        you.set_form(Form::Boulder);
        you.add_ench(Enchantment::Rolling, 0);
        assert_eq!(HandlerKind::select(&you), HandlerKind::PlayerBoulder);
    }

    #[test]
    fn test_default_movement_declines() {
        let mut world = World::new(Grid::open(10, 10), 1);
        let orc = world
            .place_actor(Actor::monster(Species::Orc, Coord::new(4, 4)))
            .unwrap();
        let mut handler = handler_for(&mut world, orc);
        assert_eq!(handler.kind(), HandlerKind::Default);
        assert_eq!(handler.move_step(&mut world), MoveOutcome::NotHandled);
        assert_eq!(handler.catchup(&mut world, 20), MoveOutcome::NotHandled);
        assert_eq!(world.actor(orc).unwrap().pos, Coord::new(4, 4));
    }

    #[test]
    fn test_handler_selection_is_cached_until_stale() {
        let mut world = World::new(Grid::open(10, 10), 1);
        let beetle = world
            .place_actor(Actor::monster(Species::BoulderBeetle, Coord::new(4, 4)))
            .unwrap();
        assert_eq!(handler_for(&mut world, beetle).kind(), HandlerKind::Default);
        assert_eq!(
            world.actor(beetle).unwrap().movement,
            Some(HandlerKind::Default)
        );
        world
            .actor_mut(beetle)
            .unwrap()
            .add_ench(Enchantment::Rolling, 0);
        assert_eq!(
            handler_for(&mut world, beetle).kind(),
            HandlerKind::MonsterBoulder
        );
    }
}
